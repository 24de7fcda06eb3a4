use async_trait::async_trait;
use redax_core::{DocumentFormat, DocumentJob, Error, Result};
use std::path::Path;
use tracing::debug;

use crate::converter::{ConvertInput, Conversion};
use crate::handler::{DocumentHandler, HandlerContext};

/// Rich text: extract Markdown with the converter, redact it, then render.
///
/// The extraction is lossy; only text survives.
pub struct RtfHandler;

#[async_trait]
impl DocumentHandler for RtfHandler {
    async fn process(
        &self,
        job: &DocumentJob,
        ctx: &HandlerContext<'_>,
        output: &Path,
    ) -> Result<()> {
        let markdown = ctx
            .converter
            .convert(Conversion {
                input: ConvertInput::File(&job.source_path),
                from: "rtf",
                to: Some("markdown_strict"),
                output: None,
                extra_args: vec!["--wrap=none".to_string()],
            })
            .await?;
        debug!(
            file = %job.source_path.display(),
            chars = markdown.len(),
            "Extracted Markdown from RTF"
        );

        let redacted = ctx.redactor.redact(&markdown);
        if redacted.is_empty() {
            return Err(Error::EmptyContent(job.original_name()));
        }

        ctx.render_markdown(&redacted, output).await
    }

    fn can_handle(&self, format: &DocumentFormat) -> bool {
        matches!(format, DocumentFormat::Rtf)
    }
}
