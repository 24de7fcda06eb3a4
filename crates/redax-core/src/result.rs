//! Per-document processing results

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::{Error, OutputFormat};

/// Name reported on the single record returned for a batch-level failure
pub const BATCH_FAILURE_NAME: &str = "Processing Error";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Converter unusable for the whole batch
    Configuration,
    Unsupported,
    ConverterUnavailable,
    Conversion,
    Io,
    EmptyContent,
    Internal,
}

/// Outcome of one document; never raised, always returned
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProcessingResult {
    Success {
        original_name: String,
        output_path: PathBuf,
        output_format: OutputFormat,
    },
    Failure {
        original_name: String,
        error_kind: ErrorKind,
        message: String,
    },
}

impl ProcessingResult {
    pub fn failure(original_name: impl Into<String>, error: &Error) -> Self {
        ProcessingResult::Failure {
            original_name: original_name.into(),
            error_kind: error.kind(),
            message: error.to_string(),
        }
    }

    /// The record returned in place of per-file results when the converter is unusable
    pub fn batch_failure(message: impl Into<String>) -> Self {
        ProcessingResult::Failure {
            original_name: BATCH_FAILURE_NAME.to_string(),
            error_kind: ErrorKind::Configuration,
            message: message.into(),
        }
    }

    pub fn original_name(&self) -> &str {
        match self {
            ProcessingResult::Success { original_name, .. }
            | ProcessingResult::Failure { original_name, .. } => original_name,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ProcessingResult::Success { .. })
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            ProcessingResult::Failure { error_kind, .. } => Some(*error_kind),
            ProcessingResult::Success { .. } => None,
        }
    }
}
