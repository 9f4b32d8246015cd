//! Per-record validation reports, rendered as text or JSON.

use domain::Errors;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorReport {
    pub attribute: String,
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordReport {
    pub name: String,
    pub valid: bool,
    pub errors: Vec<ErrorReport>,
}

impl RecordReport {
    pub fn new(name: impl Into<String>, errors: &Errors) -> Self {
        Self {
            name: name.into(),
            valid: errors.is_empty(),
            errors: errors
                .iter()
                .map(|e| ErrorReport {
                    attribute: e.attribute.clone(),
                    code: e.kind.as_str(),
                    message: e.full_message(),
                })
                .collect(),
        }
    }
}

pub fn render_text(reports: &[RecordReport]) -> String {
    let mut out = String::new();
    for report in reports {
        let status = if report.valid { "ok" } else { "invalid" };
        out.push_str(&format!("{}: {}\n", report.name, status));
        for err in &report.errors {
            out.push_str(&format!("  - {} ({})\n", err.message, err.code));
        }
    }
    out
}

pub fn render_json(reports: &[RecordReport]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(reports)
}
