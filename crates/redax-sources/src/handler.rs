//! Document handler trait and per-format dispatch

use async_trait::async_trait;
use redax_core::{DocumentFormat, DocumentJob, Error, OutputFormat, ProcessingResult, Result};
use redax_security::Redactor;
use std::path::{Path, PathBuf};
use tracing::{error, info};

use crate::converter::{ConvertInput, Conversion, Converter};
use crate::docx::DocxHandler;
use crate::rtf::RtfHandler;
use crate::text::TextHandler;

/// Everything a handler needs for one document
pub struct HandlerContext<'a> {
    pub redactor: &'a Redactor,
    pub converter: &'a dyn Converter,
    pub staging_dir: &'a Path,
    pub output_format: OutputFormat,
}

impl HandlerContext<'_> {
    /// Final artifact location: `<staging>/<base>_redacted.<ext>`
    pub fn output_path(&self, job: &DocumentJob) -> PathBuf {
        self.staging_dir
            .join(job.output_file_name(self.output_format))
    }

    /// Render redacted Markdown to the requested output format
    pub async fn render_markdown(&self, markdown: &str, output: &Path) -> Result<()> {
        self.converter
            .convert(Conversion {
                input: ConvertInput::Text(markdown),
                from: "markdown",
                to: self.output_format.converter_name(),
                output: Some(output),
                extra_args: render_args(self.output_format),
            })
            .await?;
        Ok(())
    }
}

/// Arguments for the final conversion into `format`
pub fn render_args(format: OutputFormat) -> Vec<String> {
    let mut args = vec!["--standalone".to_string()];
    match format {
        OutputFormat::Pdf => args.push("--toc".to_string()),
        OutputFormat::Md => args.push("--wrap=none".to_string()),
        OutputFormat::Docx | OutputFormat::Html => {}
    }
    args
}

/// Per-format extraction and reassembly strategy
#[async_trait]
pub trait DocumentHandler: Send + Sync {
    /// Redact `job` and write the final artifact to `output`
    async fn process(
        &self,
        job: &DocumentJob,
        ctx: &HandlerContext<'_>,
        output: &Path,
    ) -> Result<()>;

    fn can_handle(&self, format: &DocumentFormat) -> bool;
}

/// Handler for a resolved format; `None` for unsupported formats
pub fn handler_for(format: &DocumentFormat) -> Option<&'static dyn DocumentHandler> {
    match format {
        DocumentFormat::Docx => Some(&DocxHandler),
        DocumentFormat::PlainText | DocumentFormat::Markdown => Some(&TextHandler),
        DocumentFormat::Rtf => Some(&RtfHandler),
        DocumentFormat::Unsupported(_) => None,
    }
}

/// Process one document into a result record; errors never escape
pub async fn process_document(job: &DocumentJob, ctx: &HandlerContext<'_>) -> ProcessingResult {
    let original_name = job.original_name();

    let Some(handler) = handler_for(&job.format) else {
        let err = Error::UnsupportedFormat(original_name.clone());
        error!(file = %original_name, "Unsupported file type");
        return ProcessingResult::failure(original_name, &err);
    };

    let output = ctx.output_path(job);
    match handler.process(job, ctx, &output).await {
        Ok(()) => {
            info!(
                file = %original_name,
                output = %output.display(),
                format = %ctx.output_format,
                "Document redacted"
            );
            ProcessingResult::Success {
                original_name,
                output_path: output,
                output_format: ctx.output_format,
            }
        }
        Err(e) => {
            error!(
                file = %original_name,
                kind = ?e.kind(),
                error = %e,
                "Error processing document"
            );
            ProcessingResult::failure(original_name, &e)
        }
    }
}
