use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::rules::Rule;
use crate::rules::catalog::RuleId;

/// A rule that produced one or more diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Violation {
    pub rule_id: RuleId,
    pub code: String,
    pub description: String,
    pub messages: Vec<String>,
}

/// Runs `rule` and wraps its diagnostics. `None` means the rule passed.
pub fn evaluate(rule: &Rule<'_>) -> Result<Option<Violation>> {
    let messages = rule.validate()?;
    if messages.is_empty() {
        return Ok(None);
    }

    let id = rule.id();
    Ok(Some(Violation {
        rule_id: id,
        code: id.code(),
        description: rule.description(),
        messages,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passing_rule_has_no_violation() {
        let args = vec!["https://github.com/owner/repo".to_string()];
        assert_eq!(evaluate(&Rule::Args(&args)).unwrap(), None);
    }

    #[test]
    fn failing_rule_carries_code_and_messages() {
        let violation = evaluate(&Rule::Repo(None)).unwrap().unwrap();
        assert_eq!(violation.rule_id, RuleId::Repo);
        assert_eq!(violation.code, "PTRUN1001");
        assert_eq!(violation.description, "Repo should be valid");
        assert_eq!(violation.messages, vec!["Repository missing"]);
    }
}
