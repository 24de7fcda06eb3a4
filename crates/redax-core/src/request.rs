//! Redaction request model

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::OutputFormat;

/// Rule key that turns on credential line suppression instead of a pattern
pub const LINE_SUPPRESSION_KEY: &str = "redact_credential_lines";

/// What to redact and how to render it, fixed for one batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedactionRequest {
    /// Selected pattern rule keys (line suppression key excluded)
    pub selected_rules: BTreeSet<String>,
    /// Literal keywords, applied in the order given
    pub custom_keywords: Vec<String>,
    pub line_suppression: bool,
    pub output_format: OutputFormat,
}

impl RedactionRequest {
    /// Build a request from raw selected keys.
    ///
    /// The line suppression key is lifted out of the key set into its own flag.
    pub fn new<I, S>(keys: I, custom_keywords: Vec<String>, output_format: OutputFormat) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut selected_rules: BTreeSet<String> = keys.into_iter().map(Into::into).collect();
        let line_suppression = selected_rules.remove(LINE_SUPPRESSION_KEY);

        Self {
            selected_rules,
            custom_keywords,
            line_suppression,
            output_format,
        }
    }

    /// True when there is nothing to redact at all
    pub fn is_empty(&self) -> bool {
        self.selected_rules.is_empty()
            && !self.line_suppression
            && self.custom_keywords.iter().all(|k| k.is_empty())
    }
}

/// Split a comma separated keyword list, trimming entries and dropping empties
pub fn parse_keywords(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_suppression_lifted_from_keys() {
        let request = RedactionRequest::new(
            ["redact_ips", LINE_SUPPRESSION_KEY, "redact_email_address"],
            vec![],
            OutputFormat::Md,
        );

        assert!(request.line_suppression);
        assert_eq!(request.selected_rules.len(), 2);
        assert!(!request.selected_rules.contains(LINE_SUPPRESSION_KEY));
    }

    #[test]
    fn test_empty_request() {
        let request =
            RedactionRequest::new(Vec::<String>::new(), vec![String::new()], OutputFormat::Md);
        assert!(request.is_empty());

        let request = RedactionRequest::new([LINE_SUPPRESSION_KEY], vec![], OutputFormat::Md);
        assert!(!request.is_empty());
    }

    #[test]
    fn test_parse_keywords() {
        assert_eq!(
            parse_keywords(" Acme Corp, Project X ,, ,a.b"),
            vec!["Acme Corp", "Project X", "a.b"]
        );
        assert!(parse_keywords("  ").is_empty());
    }
}
