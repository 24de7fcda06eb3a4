//! Pattern catalog and redaction engine

pub mod catalog;
pub mod redactor;

pub use catalog::{ActiveRule, PatternCatalog, RuleInfo, rule_label};
pub use redactor::{CREDENTIAL_KEYWORDS, Redactor, redact};
