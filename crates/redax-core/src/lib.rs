//! Core domain models for redax
//!
//! This crate contains:
//! - Document models (DocumentFormat, OutputFormat, DocumentJob)
//! - The per-batch redaction request
//! - Per-document processing results and the shared error type

pub mod document;
pub mod error;
pub mod request;
pub mod result;

pub use document::{DocumentFormat, DocumentJob, OutputFormat};
pub use error::{Error, Result};
pub use request::{RedactionRequest, LINE_SUPPRESSION_KEY, parse_keywords};
pub use result::{BATCH_FAILURE_NAME, ErrorKind, ProcessingResult};

/// Placeholder substituted for every redacted span.
pub const MARKER: &str = "[REDACTED]";

/// Placeholder substituted for a whole suppressed line.
pub const LINE_MARKER: &str = "[REDACTED LINE]";
