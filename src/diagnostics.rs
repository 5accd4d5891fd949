//! Display-facing error details.
//!
//! Raw compiler/runtime messages are classified into an [`ErrorDetails`]
//! (summary line, longer description, optional line number), then the
//! workspace maps the flat line number onto a section.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::document::SectionModel;

/// Transient display state for one compile/run error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorDetails {
    pub message: String,
    pub summary: String,
    pub description: String,
    pub line_number: Option<u32>,
    pub section: Option<String>,
}

impl ErrorDetails {
    /// Fill in `section` and the section-relative line from the flat line.
    pub fn map_to_section(mut self, model: &SectionModel) -> Self {
        if let Some(line) = self.line_number {
            let mapped = model.map_flat_line(line);
            self.section = mapped.section;
            self.line_number = Some(mapped.line_number);
        }
        self
    }

    /// `section N, line L` locator, when known.
    pub fn location(&self) -> Option<String> {
        match (&self.section, self.line_number) {
            (Some(section), Some(line)) => Some(format!("{section}, line {line}")),
            (None, Some(line)) => Some(format!("line {line}")),
            _ => None,
        }
    }
}

/// Trailing `(line)` or `(line:column)` suffix.
static LINE_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\((\d+)(?::\d+)?\)\s*$").unwrap());

/// Leading `Name:` of a JavaScript error.
static ERROR_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Z][A-Za-z]*Error):").unwrap());

/// Classify a raw message into display details.
pub fn classify(message: &str) -> ErrorDetails {
    let first_line = message.lines().next().unwrap_or("").trim();

    let line_number = LINE_SUFFIX
        .captures(first_line)
        .and_then(|c| c[1].parse().ok());
    let summary = LINE_SUFFIX.replace(first_line, "").into_owned();

    let mut description = message.trim().to_string();
    if let Some(hint) = ERROR_NAME
        .captures(first_line)
        .and_then(|c| hint_for(&c[1]))
    {
        description.push_str("\n\n");
        description.push_str(hint);
    }

    ErrorDetails {
        message: message.to_string(),
        summary,
        description,
        line_number,
        section: None,
    }
}

/// Classify, preferring an explicit line number over the parsed one.
pub fn classify_with_line(message: &str, line_number: Option<u32>) -> ErrorDetails {
    let mut details = classify(message);
    if line_number.is_some() {
        details.line_number = line_number;
    }
    details
}

fn hint_for(name: &str) -> Option<&'static str> {
    match name {
        "SyntaxError" => Some("The code could not be parsed. Check for a missing bracket, quote or comma near the reported line."),
        "ReferenceError" => Some("A name is used before it is defined. Check spelling and that it is imported or declared."),
        "TypeError" => Some("A value was used in a way its type does not allow, e.g. calling something that is not a function."),
        "RangeError" => Some("A value is outside the allowed range, often caused by runaway recursion."),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_line_suffix() {
        let details = classify("ReferenceError: foo is not defined (12)");
        assert_eq!(details.summary, "ReferenceError: foo is not defined");
        assert_eq!(details.line_number, Some(12));
        assert!(details.description.contains("used before it is defined"));
        assert_eq!(details.section, None);
    }

    #[test]
    fn test_classify_line_and_column() {
        let details = classify("SyntaxError: Unexpected token (3:14)\n> 3 | let = ;");
        assert_eq!(details.line_number, Some(3));
        assert_eq!(details.summary, "SyntaxError: Unexpected token");
        assert!(details.description.starts_with("SyntaxError: Unexpected token (3:14)"));
    }

    #[test]
    fn test_classify_without_line() {
        let details = classify("Warning: Each child in a list should have a unique key");
        assert_eq!(details.line_number, None);
        assert_eq!(
            details.summary,
            "Warning: Each child in a list should have a unique key"
        );
    }

    #[test]
    fn test_explicit_line_wins() {
        let details = classify_with_line("Unexpected token (3:1)", Some(9));
        assert_eq!(details.line_number, Some(9));

        let details = classify_with_line("Unexpected token (3:1)", None);
        assert_eq!(details.line_number, Some(3));
    }

    #[test]
    fn test_map_to_section() {
        let model =
            SectionModel::from_sections([("A", "1\n2"), ("B", "1\n2\n3"), ("C", "1")]).unwrap();
        let details = classify("TypeError: x is not a function (5)").map_to_section(&model);
        assert_eq!(details.section.as_deref(), Some("B"));
        assert_eq!(details.line_number, Some(3));
        assert_eq!(details.location().as_deref(), Some("B, line 3"));
    }

    #[test]
    fn test_json_shape() {
        let details = classify("Error: boom (2)");
        let json = serde_json::to_value(&details).unwrap();
        assert_eq!(json["lineNumber"], 2);
        assert!(json["section"].is_null());
    }
}
