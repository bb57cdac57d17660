use crate::report::model::Report;
use crate::rules::eval::Violation;

/// `CODE: description` followed by one indented line per message.
pub fn render_violation(violation: &Violation) -> String {
    let mut out = format!("{}: {}\n", violation.code, violation.description);
    for message in &violation.messages {
        out.push_str(&format!("  - {message}\n"));
    }
    out
}

pub fn render_summary(report: &Report) -> String {
    format!("Errors: {}\n", report.error_count)
}

pub fn render_text(report: &Report) -> String {
    let mut out = String::new();
    for violation in &report.violations {
        out.push_str(&render_violation(violation));
    }
    out.push_str(&render_summary(report));
    out
}
