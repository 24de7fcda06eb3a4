//! Word-processor documents (OOXML packages)
//!
//! Each paragraph's text is gathered from its own `<w:t>` runs, with `<w:br/>`
//! and `<w:tab/>` read as `\n` and `\t`, and redacted as one string.
//! Paragraphs nested in text boxes are separate paragraphs and never
//! contribute to the one enclosing them.
//!
//! A changed line (the text between two breaks) is written back into its
//! first run with the remaining runs emptied, so run formatting inside a
//! changed line collapses onto the first run. If redaction removed or added a
//! break, the whole paragraph collapses onto its first run instead. Parts
//! without text are copied byte for byte.

use async_trait::async_trait;
use lazy_static::lazy_static;
use redax_core::{DocumentFormat, DocumentJob, Error, OutputFormat, Result};
use redax_security::Redactor;
use regex::{Captures, Regex};
use std::fs::File;
use std::io::{Read, Write};
use std::ops::Range;
use std::path::Path;
use tracing::{debug, warn};
use zip::write::{FileOptions, ZipWriter};
use zip::{CompressionMethod, ZipArchive};

use crate::converter::{ConvertInput, Conversion};
use crate::handler::{DocumentHandler, HandlerContext, render_args};

const MAIN_PART: &str = "word/document.xml";

const EMPTY_TEXT: &str = "<w:t></w:t>";

lazy_static! {
    // Paragraph open tags must not be self-closing; `<w:pPr>` never matches
    static ref TOKEN: Regex = Regex::new(concat!(
        r"(?P<open><w:p(?:>|\s[^>]*[^/]>))",
        r"|(?P<close></w:p>)",
        r"|<w:t(?:>|\s[^>]*[^/]>)(?P<text>[^<]*)</w:t>",
        r"|(?P<tab><w:tab/>)",
        r"|<w:(?:br|cr)(?P<break_attrs>\s[^>]*)?/>",
    ))
    .unwrap();
    static ref ENTITY: Regex = Regex::new(r"&(#x[0-9a-fA-F]+|#[0-9]+|[a-zA-Z]+);").unwrap();
}

pub struct DocxHandler;

#[async_trait]
impl DocumentHandler for DocxHandler {
    async fn process(
        &self,
        job: &DocumentJob,
        ctx: &HandlerContext<'_>,
        output: &Path,
    ) -> Result<()> {
        let staged = ctx.staging_dir.join(format!("temp_{}", job.original_name()));
        let paragraphs = redact_package(&job.source_path, &staged, ctx.redactor)?;
        debug!(file = %job.source_path.display(), paragraphs, "Redacted document paragraphs");

        if ctx.output_format == OutputFormat::Docx {
            // Passthrough: the redacted package is the output
            tokio::fs::rename(&staged, output).await?;
            return Ok(());
        }

        ctx.converter
            .convert(Conversion {
                input: ConvertInput::File(&staged),
                from: "docx",
                to: ctx.output_format.converter_name(),
                output: Some(output),
                extra_args: render_args(ctx.output_format),
            })
            .await?;

        // Left in place when conversion fails; the staging purge removes it
        tokio::fs::remove_file(&staged).await?;
        Ok(())
    }

    fn can_handle(&self, format: &DocumentFormat) -> bool {
        matches!(format, DocumentFormat::Docx)
    }
}

fn package_error(err: zip::result::ZipError) -> Error {
    Error::Package(err.to_string())
}

/// Parts whose paragraphs carry document text
fn is_text_part(name: &str) -> bool {
    if name == MAIN_PART || name == "word/footnotes.xml" || name == "word/endnotes.xml" {
        return true;
    }
    name.ends_with(".xml") && (name.starts_with("word/header") || name.starts_with("word/footer"))
}

/// Write a redacted copy of the package at `source` to `dest`.
///
/// Returns the number of paragraphs that changed.
pub fn redact_package(source: &Path, dest: &Path, redactor: &Redactor) -> Result<usize> {
    let mut archive = ZipArchive::new(File::open(source)?).map_err(package_error)?;
    if archive.index_for_name(MAIN_PART).is_none() {
        return Err(Error::Package(format!(
            "{} is not a word-processor document (missing {})",
            source.display(),
            MAIN_PART
        )));
    }

    let mut writer = ZipWriter::new(File::create(dest)?);
    let options: FileOptions<'_, ()> =
        FileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut changed = 0;

    for i in 0..archive.len() {
        let name = archive.by_index_raw(i).map_err(package_error)?.name().to_string();

        if is_text_part(&name) {
            let mut xml = String::new();
            archive
                .by_index(i)
                .map_err(package_error)?
                .read_to_string(&mut xml)?;

            let (redacted, count) = redact_part(&xml, redactor);
            changed += count;

            writer.start_file(name.as_str(), options).map_err(package_error)?;
            writer.write_all(redacted.as_bytes())?;
        } else {
            let entry = archive.by_index_raw(i).map_err(package_error)?;
            writer.raw_copy_file(entry).map_err(package_error)?;
        }
    }

    writer.finish().map_err(package_error)?;
    Ok(changed)
}

/// Text-bearing element of a paragraph, with its byte span in the part
#[derive(Debug)]
enum Segment {
    Text { span: Range<usize>, text: String },
    Break { span: Range<usize>, ch: char },
}

type Edit = (Range<usize>, String);

/// Redact every paragraph of one XML part
fn redact_part(xml: &str, redactor: &Redactor) -> (String, usize) {
    // One entry per paragraph currently open, innermost last
    let mut open: Vec<Vec<Segment>> = Vec::new();
    let mut edits: Vec<Edit> = Vec::new();
    let mut changed = 0;

    for caps in TOKEN.captures_iter(xml) {
        let Some(whole) = caps.get(0) else {
            continue;
        };

        if caps.name("open").is_some() {
            open.push(Vec::new());
        } else if caps.name("close").is_some() {
            if let Some(segments) = open.pop()
                && let Some(paragraph_edits) = redact_paragraph(&segments, redactor)
            {
                changed += 1;
                edits.extend(paragraph_edits);
            }
        } else if let Some(segments) = open.last_mut() {
            let span = whole.range();
            if let Some(text) = caps.name("text") {
                segments.push(Segment::Text {
                    span,
                    text: unescape(text.as_str()),
                });
            } else if caps.name("tab").is_some() {
                segments.push(Segment::Break { span, ch: '\t' });
            } else if is_line_break(caps.name("break_attrs").map_or("", |m| m.as_str())) {
                segments.push(Segment::Break { span, ch: '\n' });
            }
        }
    }

    if edits.is_empty() {
        return (xml.to_string(), 0);
    }

    edits.sort_by_key(|(span, _)| span.start);
    let mut result = String::with_capacity(xml.len());
    let mut pos = 0;
    for (span, replacement) in edits {
        result.push_str(&xml[pos..span.start]);
        result.push_str(&replacement);
        pos = span.end;
    }
    result.push_str(&xml[pos..]);

    (result, changed)
}

/// Page and column breaks carry no text
fn is_line_break(attrs: &str) -> bool {
    !attrs.contains("w:type=") || attrs.contains("textWrapping")
}

/// Edits for a changed paragraph, or `None` when its text is unchanged
fn redact_paragraph(segments: &[Segment], redactor: &Redactor) -> Option<Vec<Edit>> {
    if !segments.iter().any(|s| matches!(s, Segment::Text { .. })) {
        return None;
    }

    let mut text = String::new();
    for segment in segments {
        match segment {
            Segment::Text { text: run, .. } => text.push_str(run),
            Segment::Break { ch, .. } => text.push(*ch),
        }
    }

    let redacted = redactor.redact(&text);
    if redacted == text {
        return None;
    }

    Some(rewrite_lines(segments, &redacted).unwrap_or_else(|| collapse(segments, &redacted)))
}

/// Rewrite only the lines that changed, keeping every break element.
///
/// `None` when the redacted text no longer has the same breaks.
fn rewrite_lines(segments: &[Segment], redacted: &str) -> Option<Vec<Edit>> {
    let mut lines: Vec<Vec<(&Range<usize>, &str)>> = vec![Vec::new()];
    let mut breaks = Vec::new();
    for segment in segments {
        match segment {
            Segment::Text { span, text } => lines.last_mut()?.push((span, text.as_str())),
            Segment::Break { ch, .. } => {
                breaks.push(*ch);
                lines.push(Vec::new());
            }
        }
    }

    let redacted_breaks: Vec<char> =
        redacted.chars().filter(|c| matches!(c, '\n' | '\t')).collect();
    if redacted_breaks != breaks {
        return None;
    }

    let mut edits = Vec::new();
    for (runs, line) in lines.iter().zip(redacted.split(['\n', '\t'])) {
        let original: String = runs.iter().map(|(_, text)| *text).collect();
        if original == line {
            continue;
        }

        let ((first, _), rest) = runs.split_first()?;
        edits.push(((*first).clone(), text_markup(line)));
        edits.extend(rest.iter().map(|(span, _)| ((*span).clone(), EMPTY_TEXT.to_string())));
    }
    Some(edits)
}

/// Put the whole redacted paragraph into its first run and drop the rest
fn collapse(segments: &[Segment], redacted: &str) -> Vec<Edit> {
    let mut first = true;
    segments
        .iter()
        .map(|segment| match segment {
            Segment::Text { span, .. } => {
                if std::mem::take(&mut first) {
                    (span.clone(), text_markup(redacted))
                } else {
                    (span.clone(), EMPTY_TEXT.to_string())
                }
            }
            Segment::Break { span, .. } => (span.clone(), String::new()),
        })
        .collect()
}

/// `<w:t>` markup for `text`, turning `\n` and `\t` into break elements
fn text_markup(text: &str) -> String {
    const OPEN: &str = r#"<w:t xml:space="preserve">"#;

    let mut xml = String::from(OPEN);
    for ch in escape(text).chars() {
        match ch {
            '\n' => {
                xml.push_str("</w:t><w:br/>");
                xml.push_str(OPEN);
            }
            '\t' => {
                xml.push_str("</w:t><w:tab/>");
                xml.push_str(OPEN);
            }
            c => xml.push(c),
        }
    }
    xml.push_str("</w:t>");
    xml
}

fn unescape(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }

    ENTITY
        .replace_all(text, |caps: &Captures| {
            let entity = &caps[1];
            let decoded = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                _ => entity
                    .strip_prefix("#x")
                    .map(|hex| u32::from_str_radix(hex, 16))
                    .or_else(|| entity.strip_prefix('#').map(|dec| dec.parse::<u32>()))
                    .and_then(|n| n.ok())
                    .and_then(char::from_u32),
            };
            match decoded {
                Some(c) => c.to_string(),
                None => {
                    warn!(entity = %entity, "Unknown XML entity left as is");
                    caps[0].to_string()
                }
            }
        })
        .into_owned()
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converter::ConvertError;
    use crate::handler::process_document;
    use crate::testing::{RecordingConverter, redactor};
    use redax_core::ErrorKind;
    use tempfile::TempDir;

    /// Paragraph with a text box between its first and last runs
    fn text_box_paragraph(box_text: &str, tail: &str) -> String {
        format!(
            concat!(
                "<w:p><w:r><w:t>Intro</w:t></w:r>",
                "<w:r><w:drawing><wps:txbx><w:txbxContent>",
                "<w:p><w:r><w:t>{}</w:t></w:r></w:p>",
                "</w:txbxContent></wps:txbx></w:drawing></w:r>",
                "<w:r><w:t>{}</w:t></w:r></w:p>"
            ),
            box_text, tail
        )
    }

    const DOCUMENT: &str = concat!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
        r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">"#,
        r#"<w:body>"#,
        r#"<w:p w:rsidR="00A1"><w:pPr><w:pStyle w:val="Title"/></w:pPr>"#,
        r#"<w:r><w:t>Quarterly report</w:t></w:r></w:p>"#,
        r#"<w:p><w:r><w:rPr><w:b/></w:rPr><w:t xml:space="preserve">Mail jane@</w:t></w:r>"#,
        r#"<w:r><w:t>example.com &amp; co</w:t></w:r></w:p>"#,
        r#"<w:p/>"#,
        r#"<w:tbl><w:tr><w:tc>"#,
        r#"<w:p><w:r><w:t>Host 10.0.0.7</w:t></w:r><w:r><w:tab/></w:r></w:p>"#,
        r#"</w:tc></w:tr></w:tbl>"#,
        r#"</w:body></w:document>"#
    );

    const HEADER: &str =
        r#"<w:hdr xmlns:w="x"><w:p><w:r><w:t>Owner ops@example.org</w:t></w:r></w:p></w:hdr>"#;

    const MEDIA: &[u8] = &[0x89, b'P', b'N', b'G', 0, 1, 2, 3];

    fn write_docx(path: &Path) {
        let mut zip = ZipWriter::new(File::create(path).unwrap());
        let options: FileOptions<'_, ()> = FileOptions::default();
        for (name, data) in [
            ("[Content_Types].xml", b"<Types/>".as_slice()),
            (MAIN_PART, DOCUMENT.as_bytes()),
            ("word/header1.xml", HEADER.as_bytes()),
            ("word/media/image1.png", MEDIA),
        ] {
            zip.start_file(name, options).unwrap();
            zip.write_all(data).unwrap();
        }
        zip.finish().unwrap();
    }

    fn read_entry(path: &Path, name: &str) -> Vec<u8> {
        let mut archive = ZipArchive::new(File::open(path).unwrap()).unwrap();
        let mut data = Vec::new();
        archive.by_name(name).unwrap().read_to_end(&mut data).unwrap();
        data
    }

    #[test]
    fn test_redact_package() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("report.docx");
        let dest = tmp.path().join("staged.docx");
        write_docx(&source);

        let redactor = redactor(&["redact_email_address", "redact_ips"]);
        let changed = redact_package(&source, &dest, &redactor).unwrap();
        assert_eq!(changed, 3);

        let xml = String::from_utf8(read_entry(&dest, MAIN_PART)).unwrap();
        // Untouched paragraph keeps its markup
        assert!(xml.contains(concat!(
            r#"<w:p w:rsidR="00A1"><w:pPr><w:pStyle w:val="Title"/></w:pPr>"#,
            r#"<w:r><w:t>Quarterly report</w:t></w:r></w:p>"#
        )));
        // Split runs collapse onto the first one, entities survive
        assert!(xml.contains(concat!(
            r#"<w:t xml:space="preserve">Mail [REDACTED] &amp; co</w:t></w:r>"#,
            r#"<w:r><w:t></w:t>"#
        )));
        assert!(xml.contains(
            r#"<w:t xml:space="preserve">Host [REDACTED]</w:t></w:r><w:r><w:tab/>"#
        ));
        assert!(xml.contains("<w:p/>"));

        let header = String::from_utf8(read_entry(&dest, "word/header1.xml")).unwrap();
        assert!(header.contains("Owner [REDACTED]"));

        assert_eq!(read_entry(&dest, "word/media/image1.png"), MEDIA);
    }

    #[test]
    fn test_not_a_document() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("fake.docx");
        std::fs::write(&source, "plain text, not a zip").unwrap();

        let dest = tmp.path().join("out.docx");
        let err = redact_package(&source, &dest, &redactor(&[])).unwrap_err();
        assert!(matches!(err, Error::Package(_)));
    }

    #[test]
    fn test_entities() {
        assert_eq!(unescape("a &lt;b&gt; &#65;&#x42; &amp;amp;"), "a <b> AB &amp;");
        assert_eq!(unescape("&bogus;"), "&bogus;");
        assert_eq!(escape("<a & b>"), "&lt;a &amp; b&gt;");
    }

    #[tokio::test]
    async fn test_docx_passthrough() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("report.docx");
        write_docx(&source);

        let converter = RecordingConverter::default();
        let redactor = redactor(&["redact_ips"]);
        let ctx = HandlerContext {
            redactor: &redactor,
            converter: &converter,
            staging_dir: tmp.path(),
            output_format: OutputFormat::Docx,
        };

        let job = DocumentJob::new(&source);
        let output = ctx.output_path(&job);
        DocxHandler.process(&job, &ctx, &output).await.unwrap();

        assert!(converter.calls().is_empty());
        assert!(!tmp.path().join("temp_report.docx").exists());
        let xml = String::from_utf8(read_entry(&output, MAIN_PART)).unwrap();
        assert!(xml.contains("Host [REDACTED]"));
    }

    #[tokio::test]
    async fn test_docx_converted_and_intermediate_removed() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("report.docx");
        write_docx(&source);

        let converter = RecordingConverter::default();
        let redactor = redactor(&[]);
        let ctx = HandlerContext {
            redactor: &redactor,
            converter: &converter,
            staging_dir: tmp.path(),
            output_format: OutputFormat::Pdf,
        };

        let job = DocumentJob::new(&source);
        let output = ctx.output_path(&job);
        DocxHandler.process(&job, &ctx, &output).await.unwrap();

        let calls = converter.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].from, "docx");
        assert_eq!(calls[0].to, None);
        assert_eq!(calls[0].extra_args, vec!["--standalone", "--toc"]);
        assert_eq!(
            calls[0].input_file.as_deref(),
            Some(tmp.path().join("temp_report.docx").as_path())
        );
        assert!(output.exists());
        assert!(!tmp.path().join("temp_report.docx").exists());
    }

    #[test]
    fn test_runs_after_text_box_are_redacted() {
        let xml = text_box_paragraph("Box", "mail jane@example.com");
        let (redacted, changed) = redact_part(&xml, &redactor(&["redact_email_address"]));

        assert_eq!(changed, 1);
        assert!(!redacted.contains("jane@example.com"));
        assert!(redacted.contains(r#"<w:t xml:space="preserve">Intromail [REDACTED]</w:t>"#));
        // The text box paragraph is left alone and its text is not pulled out
        assert!(redacted.contains("<w:txbxContent><w:p><w:r><w:t>Box</w:t></w:r></w:p>"));
    }

    #[test]
    fn test_text_box_redacted_as_own_paragraph() {
        let xml = text_box_paragraph("ops@example.org", " tail");
        let (redacted, changed) = redact_part(&xml, &redactor(&["redact_email_address"]));

        let expected = text_box_paragraph("[REDACTED]", " tail")
            .replace("<w:t>[REDACTED]</w:t>", r#"<w:t xml:space="preserve">[REDACTED]</w:t>"#);
        assert_eq!(changed, 1);
        assert_eq!(redacted, expected);
    }

    #[test]
    fn test_line_breaks_split_suppressed_lines() {
        let xml = concat!(
            "<w:p><w:r><w:t>Project notes</w:t><w:br/>",
            "<w:t>password: hunter2</w:t><w:br/>",
            r#"<w:t xml:space="preserve">end</w:t></w:r></w:p>"#
        );
        let (redacted, changed) = redact_part(xml, &Redactor::new(Vec::new(), Vec::new(), true));

        assert_eq!(changed, 1);
        assert_eq!(
            redacted,
            concat!(
                "<w:p><w:r><w:t>Project notes</w:t><w:br/>",
                r#"<w:t xml:space="preserve">[REDACTED LINE]</w:t><w:br/>"#,
                r#"<w:t xml:space="preserve">end</w:t></w:r></w:p>"#
            )
        );
    }

    #[test]
    fn test_tabs_separate_words() {
        let xml = concat!(
            "<w:p><w:r><w:t>Name</w:t></w:r><w:r><w:tab/></w:r>",
            "<w:r><w:t>Falcon</w:t></w:r></w:p>"
        );

        let joined = Redactor::new(Vec::new(), vec!["NameFalcon".to_string()], false);
        assert_eq!(redact_part(xml, &joined), (xml.to_string(), 0));

        let single = Redactor::new(Vec::new(), vec!["Falcon".to_string()], false);
        let (redacted, changed) = redact_part(xml, &single);
        assert_eq!(changed, 1);
        assert_eq!(
            redacted,
            concat!(
                "<w:p><w:r><w:t>Name</w:t></w:r><w:r><w:tab/></w:r>",
                r#"<w:r><w:t xml:space="preserve">[REDACTED]</w:t></w:r></w:p>"#
            )
        );
    }

    #[test]
    fn test_match_across_tab_collapses_paragraph() {
        let xml = "<w:p><w:r><w:t>TFN 123</w:t><w:tab/><w:t>456 789</w:t></w:r></w:p>";
        let (redacted, changed) = redact_part(xml, &redactor(&["redact_au_tfn"]));

        assert_eq!(changed, 1);
        assert_eq!(
            redacted,
            r#"<w:p><w:r><w:t xml:space="preserve">TFN [REDACTED]</w:t><w:t></w:t></w:r></w:p>"#
        );
    }

    #[test]
    fn test_page_break_is_not_a_line() {
        let xml = r#"<w:p><w:r><w:t>secret</w:t><w:br w:type="page"/><w:t> plan</w:t></w:r></w:p>"#;
        let (redacted, _) = redact_part(xml, &Redactor::new(Vec::new(), Vec::new(), true));

        assert!(redacted.contains(r#"<w:t xml:space="preserve">[REDACTED LINE]</w:t>"#));
        assert!(redacted.contains(r#"<w:br w:type="page"/><w:t></w:t>"#));
    }

    #[tokio::test]
    async fn test_failed_conversion_keeps_intermediate() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("report.docx");
        write_docx(&source);
        let redactor = redactor(&["redact_ips"]);

        for (err, kind) in [
            (
                ConvertError::Failed("Pandoc exited with 64: bad input".to_string()),
                ErrorKind::Conversion,
            ),
            (
                ConvertError::Unavailable("pandoc: permission denied".to_string()),
                ErrorKind::ConverterUnavailable,
            ),
        ] {
            let converter = RecordingConverter::failing(err);
            let ctx = HandlerContext {
                redactor: &redactor,
                converter: &converter,
                staging_dir: tmp.path(),
                output_format: OutputFormat::Html,
            };

            let job = DocumentJob::new(&source);
            let result = process_document(&job, &ctx).await;

            assert_eq!(result.error_kind(), Some(kind));
            assert_eq!(converter.calls().len(), 1);
            assert!(tmp.path().join("temp_report.docx").exists());
            assert!(!ctx.output_path(&job).exists());
        }
    }
}
