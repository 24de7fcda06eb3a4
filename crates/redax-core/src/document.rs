//! Document models

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::Error;

/// Source document format, resolved once from the file extension
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "extension", rename_all = "snake_case")]
pub enum DocumentFormat {
    Docx,
    PlainText,
    Markdown,
    Rtf,
    /// Anything else; carries the lowercased extension (may be empty)
    Unsupported(String),
}

impl DocumentFormat {
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "docx" => DocumentFormat::Docx,
            "txt" => DocumentFormat::PlainText,
            "md" => DocumentFormat::Markdown,
            "rtf" => DocumentFormat::Rtf,
            _ => DocumentFormat::Unsupported(ext),
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, DocumentFormat::Unsupported(_))
    }

    /// Reader name understood by the converter
    pub fn converter_name(&self) -> Option<&'static str> {
        match self {
            DocumentFormat::Docx => Some("docx"),
            DocumentFormat::PlainText | DocumentFormat::Markdown => Some("markdown"),
            DocumentFormat::Rtf => Some("rtf"),
            DocumentFormat::Unsupported(_) => None,
        }
    }
}

/// Format the redacted output is rendered to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Md,
    Pdf,
    Docx,
    Html,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Md => "md",
            OutputFormat::Pdf => "pdf",
            OutputFormat::Docx => "docx",
            OutputFormat::Html => "html",
        }
    }

    /// Writer name passed to the converter.
    ///
    /// PDF has no writer of its own; the converter picks the PDF route from
    /// the output file extension.
    pub fn converter_name(&self) -> Option<&'static str> {
        match self {
            OutputFormat::Md => Some("markdown_strict"),
            OutputFormat::Pdf => None,
            OutputFormat::Docx => Some("docx"),
            OutputFormat::Html => Some("html"),
        }
    }

    pub fn all() -> &'static [OutputFormat] {
        &[
            OutputFormat::Md,
            OutputFormat::Pdf,
            OutputFormat::Docx,
            OutputFormat::Html,
        ]
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().trim_start_matches('.').to_ascii_lowercase().as_str() {
            "md" | "markdown" => Ok(OutputFormat::Md),
            "pdf" => Ok(OutputFormat::Pdf),
            "docx" => Ok(OutputFormat::Docx),
            "html" | "htm" => Ok(OutputFormat::Html),
            other => Err(Error::UnknownOutputFormat(other.to_string())),
        }
    }
}

/// One input file of a batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentJob {
    pub source_path: PathBuf,
    pub format: DocumentFormat,
}

impl DocumentJob {
    pub fn new(source_path: impl Into<PathBuf>) -> Self {
        let source_path = source_path.into();
        let format = DocumentFormat::from_path(&source_path);
        Self {
            source_path,
            format,
        }
    }

    /// File name including extension, as shown to the user
    pub fn original_name(&self) -> String {
        self.source_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.source_path.display().to_string())
    }

    /// File name without its final extension
    pub fn base_name(&self) -> String {
        self.source_path
            .file_stem()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.original_name())
    }

    /// Deterministic name of the final artifact: `<base>_redacted.<ext>`
    pub fn output_file_name(&self, format: OutputFormat) -> String {
        format!("{}_redacted.{}", self.base_name(), format.extension())
    }
}
