use async_trait::async_trait;
use redax_core::{DocumentFormat, DocumentJob, Error, Result};
use std::path::Path;
use tracing::debug;

use crate::handler::{DocumentHandler, HandlerContext};

/// Plain text and Markdown: redact the whole file in one pass, then render
pub struct TextHandler;

#[async_trait]
impl DocumentHandler for TextHandler {
    async fn process(
        &self,
        job: &DocumentJob,
        ctx: &HandlerContext<'_>,
        output: &Path,
    ) -> Result<()> {
        let bytes = tokio::fs::read(&job.source_path).await?;
        let content = decode_ignoring_invalid(&bytes);
        debug!(file = %job.source_path.display(), bytes = bytes.len(), "Loaded text document");

        let redacted = ctx.redactor.redact(&content);
        if redacted.is_empty() {
            return Err(Error::EmptyContent(job.original_name()));
        }

        ctx.render_markdown(&redacted, output).await
    }

    fn can_handle(&self, format: &DocumentFormat) -> bool {
        matches!(format, DocumentFormat::PlainText | DocumentFormat::Markdown)
    }
}

/// UTF-8 decode that drops undecodable bytes instead of failing
fn decode_ignoring_invalid(bytes: &[u8]) -> String {
    bytes.utf8_chunks().map(|chunk| chunk.valid()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{RecordingConverter, redactor};
    use redax_core::OutputFormat;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_text_is_redacted_before_render() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("notes.txt");
        std::fs::write(&source, "mail jane@example.com\n").unwrap();

        let converter = RecordingConverter::default();
        let redactor = redactor(&["redact_email_address"]);
        let ctx = HandlerContext {
            redactor: &redactor,
            converter: &converter,
            staging_dir: tmp.path(),
            output_format: OutputFormat::Html,
        };

        let job = DocumentJob::new(&source);
        let output = ctx.output_path(&job);
        TextHandler.process(&job, &ctx, &output).await.unwrap();

        assert_eq!(
            std::fs::read_to_string(&output).unwrap(),
            "mail [REDACTED]\n"
        );
        let calls = converter.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].from, "markdown");
        assert_eq!(calls[0].to.as_deref(), Some("html"));
    }

    #[tokio::test]
    async fn test_empty_file_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("empty.md");
        std::fs::write(&source, "").unwrap();

        let converter = RecordingConverter::default();
        let redactor = redactor(&[]);
        let ctx = HandlerContext {
            redactor: &redactor,
            converter: &converter,
            staging_dir: tmp.path(),
            output_format: OutputFormat::Md,
        };

        let job = DocumentJob::new(&source);
        let err = TextHandler
            .process(&job, &ctx, &ctx.output_path(&job))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::EmptyContent(_)));
        assert!(converter.calls().is_empty());
    }

    #[test]
    fn test_invalid_bytes_are_dropped() {
        assert_eq!(decode_ignoring_invalid(b"caf\xc3\xa9 ok"), "caf\u{e9} ok");
        assert_eq!(decode_ignoring_invalid(b"ab\xff\xfecd"), "abcd");
        assert_eq!(decode_ignoring_invalid(b"\xe2\x82 tail"), " tail");
    }
}
