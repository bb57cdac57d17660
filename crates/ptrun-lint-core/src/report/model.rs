use serde::{Deserialize, Serialize};

use crate::rules::eval::Violation;

/// Result of one lint run, in the shape printed by `--format json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub tool: ToolInfo,
    /// The positional argument that was linted.
    pub target: Option<String>,
    /// Total number of diagnostic messages; also the process exit code.
    pub error_count: usize,
    pub violations: Vec<Violation>,
}

impl Report {
    pub fn new(tool: ToolInfo, target: Option<String>, violations: Vec<Violation>) -> Self {
        Self {
            tool,
            target,
            error_count: error_count(&violations),
            violations,
        }
    }
}

/// Tool metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    pub name: String,
    pub version: String,
}

/// Number of diagnostic messages across `violations`.
pub fn error_count(violations: &[Violation]) -> usize {
    violations.iter().map(|v| v.messages.len()).sum()
}
