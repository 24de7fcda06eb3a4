//! Text redaction engine

use redax_core::{LINE_MARKER, MARKER, RedactionRequest};
use regex::NoExpand;

use crate::catalog::{ActiveRule, PatternCatalog};

/// Lowercase terms that mark a line as credential-bearing
pub const CREDENTIAL_KEYWORDS: &[&str] = &[
    "password",
    "pwd",
    "secret",
    "username",
    "user name",
    "login",
    "user id",
    "credential",
    "credentials",
    "authorization",
    "bearer token",
    "api key",
    "client secret",
    "token",
    "auth key",
    "private key",
    "secret key",
    "access key",
];

/// Redaction engine configured for one batch
#[derive(Debug, Clone, Default)]
pub struct Redactor {
    rules: Vec<ActiveRule>,
    keywords: Vec<String>,
    line_suppression: bool,
}

impl Redactor {
    pub fn new(rules: Vec<ActiveRule>, keywords: Vec<String>, line_suppression: bool) -> Self {
        Self {
            rules,
            keywords,
            line_suppression,
        }
    }

    /// Resolve a request's rule keys against a catalog
    pub fn from_request(catalog: &PatternCatalog, request: &RedactionRequest) -> Self {
        Self::new(
            catalog.select(&request.selected_rules),
            request.custom_keywords.clone(),
            request.line_suppression,
        )
    }

    pub fn rules(&self) -> &[ActiveRule] {
        &self.rules
    }

    pub fn line_suppression(&self) -> bool {
        self.line_suppression
    }

    pub fn redact(&self, text: &str) -> String {
        redact(text, &self.rules, &self.keywords, self.line_suppression)
    }
}

/// Redact `text` in three stages, each working on the previous stage's output:
/// credential line suppression (if enabled), pattern rules in the given
/// order, then literal custom keywords in the given order.
///
/// Later stages see the markers written by earlier ones.
pub fn redact(
    text: &str,
    rules: &[ActiveRule],
    keywords: &[String],
    line_suppression: bool,
) -> String {
    let mut result = if line_suppression {
        suppress_credential_lines(text)
    } else {
        text.to_string()
    };

    for rule in rules {
        if rule.regex.is_match(&result) {
            result = rule.regex.replace_all(&result, NoExpand(MARKER)).into_owned();
        }
    }

    for keyword in keywords.iter().filter(|k| !k.is_empty()) {
        result = result.replace(keyword.as_str(), MARKER);
    }

    result
}

/// Lines are rejoined with `\n`; a final line terminator is not kept
fn suppress_credential_lines(text: &str) -> String {
    text.lines()
        .map(|line| {
            if is_credential_line(line) {
                LINE_MARKER
            } else {
                line
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn is_credential_line(line: &str) -> bool {
    let lower = line.to_lowercase();
    CREDENTIAL_KEYWORDS.iter().any(|k| lower.contains(k))
}
