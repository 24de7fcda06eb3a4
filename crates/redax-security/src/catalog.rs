//! Built-in detection rules
//!
//! Registration order is significant: the redactor applies selected rules in
//! catalog order, whatever order they were selected in.

use lazy_static::lazy_static;
use redax_core::LINE_SUPPRESSION_KEY;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// Upper-cased verbatim when deriving labels
const ACRONYMS: &[&str] = &["AU", "IP", "IPS", "TFN", "ABN", "BSB", "DOB"];

const BUILTIN_PATTERNS: &[(&str, &str)] = &[
    (
        "redact_credit_cards",
        r"\b(?:(?:\d[ -]*?){13,16}|(?:\d{4} ){3}\d{4}|\d{13,16})\b",
    ),
    (
        "redact_email_address",
        r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,7}\b",
    ),
    ("redact_ips", r"\b(?:[0-9]{1,3}\.){3}[0-9]{1,3}\b"),
    ("redact_au_tfn", r"\b\d{3}\s?\d{3}\s?\d{3}\b"),
    ("redact_au_medicare", r"\b[2-6]\d{3}\s?\d{5}\s?\d\b"),
    (
        "redact_dob",
        r"\b(?:\d{1,2}[-/.]\d{1,2}[-/.]\d{2,4}|\d{4}[-/.]\d{1,2}[-/.]\d{1,2})\b",
    ),
    ("redact_au_abn", r"\b\d{2}\s?\d{3}\s?\d{3}\s?\d{3}\b"),
    (
        "redact_au_tel",
        concat!(
            r"(?:\+?\b61\s?)?\(?\b0?[23478]\)?\s?\d{4}\s?\d{4}\b",
            r"|\b1[389]\s?\d{2}\s?\d{2}\s?\d{2}\b",
            r"|\b1300\s?\d{3}\s?\d{3}\b",
        ),
    ),
    (
        "redact_au_bsb",
        r"\b(?:BSB\s*[:\-]?\s*)?(?:\d{3}[-\s]?\d{3}|\d{6})\b",
    ),
    (
        "redact_au_account_number",
        r"\b(?:Acct\s*[:\-]?\s*|Account\s*No\s*[:\-]?\s*)?\d{5,9}\b",
    ),
    (
        "redact_au_mobile",
        r"(?:\b04|\+?\b61\s*4|\b0011\s*61\s*4)(?:\d{2}\s?\d{3}\s?\d{3}|\d{8})\b",
    ),
];

lazy_static! {
    static ref BUILTIN: PatternCatalog = PatternCatalog::from_patterns(
        BUILTIN_PATTERNS
            .iter()
            .map(|(key, pattern)| (key.to_string(), pattern.to_string())),
    );
}

/// Key and display label of a selectable rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleInfo {
    pub key: String,
    pub label: String,
}

/// A compiled pattern rule selected for a run
#[derive(Debug, Clone)]
pub struct ActiveRule {
    pub key: String,
    pub regex: Regex,
}

#[derive(Debug)]
struct CatalogEntry {
    key: String,
    pattern: String,
    compiled: Result<Regex, regex::Error>,
}

/// Registry of named pattern rules, plus the line suppression switch
#[derive(Debug)]
pub struct PatternCatalog {
    entries: Vec<CatalogEntry>,
}

impl PatternCatalog {
    /// The process-wide built-in catalog
    pub fn builtin() -> &'static PatternCatalog {
        &BUILTIN
    }

    /// Build a catalog from `(key, pattern)` pairs, keeping their order.
    ///
    /// Patterns that fail to compile are kept as entries so they can still be
    /// listed, but are never selected.
    pub fn from_patterns<I>(patterns: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let entries = patterns
            .into_iter()
            .map(|(key, pattern)| {
                let compiled = Regex::new(&pattern);
                CatalogEntry {
                    key,
                    pattern,
                    compiled,
                }
            })
            .collect();

        Self { entries }
    }

    /// All selectable rules in catalog order; line suppression is listed last
    pub fn list_rules(&self) -> Vec<RuleInfo> {
        self.entries
            .iter()
            .map(|e| e.key.as_str())
            .chain(std::iter::once(LINE_SUPPRESSION_KEY))
            .map(|key| RuleInfo {
                key: key.to_string(),
                label: rule_label(key),
            })
            .collect()
    }

    pub fn contains(&self, key: &str) -> bool {
        key == LINE_SUPPRESSION_KEY || self.entries.iter().any(|e| e.key == key)
    }

    /// Compiled rules for the selected keys, in catalog order.
    ///
    /// Unknown keys and rules whose pattern does not compile are logged and
    /// skipped; they narrow the active set instead of failing the run.
    pub fn select(&self, keys: &BTreeSet<String>) -> Vec<ActiveRule> {
        for key in keys {
            if !self.contains(key) {
                warn!(rule = %key, "Unknown redaction rule selected, ignoring");
            }
        }

        self.entries
            .iter()
            .filter(|e| keys.contains(&e.key))
            .filter_map(|e| match &e.compiled {
                Ok(regex) => {
                    debug!(rule = %e.key, "Rule activated");
                    Some(ActiveRule {
                        key: e.key.clone(),
                        regex: regex.clone(),
                    })
                }
                Err(err) => {
                    warn!(
                        rule = %e.key,
                        pattern = %e.pattern,
                        error = %err,
                        "Invalid rule pattern, skipping"
                    );
                    None
                }
            })
            .collect()
    }
}

/// Human readable label for a rule key.
///
/// `redact_au_tfn` becomes `Redact AU TFN`; a key without the `redact`
/// prefix still gets one.
pub fn rule_label(key: &str) -> String {
    let mut parts = key.split('_').peekable();
    if parts
        .peek()
        .is_some_and(|first| first.eq_ignore_ascii_case("redact"))
    {
        parts.next();
    }

    let mut label = vec!["Redact".to_string()];
    for part in parts {
        let upper = part.to_uppercase();
        if ACRONYMS.contains(&upper.as_str()) {
            label.push(upper);
        } else {
            label.push(capitalize(part));
        }
    }

    label.join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
