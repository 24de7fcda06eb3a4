use std::path::PathBuf;
use std::sync::Arc;

use redax_config::Config;
use redax_core::{DocumentJob, ProcessingResult, RedactionRequest};
use redax_security::{PatternCatalog, Redactor, RuleInfo};
use redax_sources::{Converter, ConverterStatus, HandlerContext, PandocConverter, process_document};
use redax_storage::StagingArea;
use tracing::{debug, error, info, warn};

/// Runs redaction batches; one per process at a time
pub struct BatchProcessor {
    converter: Arc<dyn Converter>,
    status: ConverterStatus,
    staging: StagingArea,
    catalog: &'static PatternCatalog,
}

impl BatchProcessor {
    pub fn new(
        converter: Arc<dyn Converter>,
        status: ConverterStatus,
        staging: StagingArea,
    ) -> Self {
        Self {
            converter,
            status,
            staging,
            catalog: PatternCatalog::builtin(),
        }
    }

    /// Discover the converter and staging directory from configuration
    pub async fn from_config(config: &Config) -> Self {
        let (converter, status) = PandocConverter::discover(
            config.converter.path.as_deref(),
            &config.converter.program,
        )
        .await;

        let staging = config
            .staging
            .dir
            .clone()
            .map(StagingArea::new)
            .unwrap_or_default();

        Self::new(Arc::new(converter), status, staging)
    }

    pub fn status(&self) -> &ConverterStatus {
        &self.status
    }

    pub fn staging(&self) -> &StagingArea {
        &self.staging
    }

    pub fn list_rules(&self) -> Vec<RuleInfo> {
        self.catalog.list_rules()
    }

    /// Redact every path in order, one result per non-empty path.
    ///
    /// Failures are captured per document. If the converter is unusable, a
    /// single batch-level failure is returned and no document is touched.
    pub async fn process_batch(
        &self,
        paths: &[PathBuf],
        request: &RedactionRequest,
    ) -> Vec<ProcessingResult> {
        if !self.status.ready {
            let message = format!(
                "Pandoc setup failed or incomplete ({}). Cannot process files.",
                self.status.message
            );
            error!(%message, "Batch rejected");
            return vec![ProcessingResult::batch_failure(message)];
        }

        let staging_dir = match self.staging.ensure() {
            Ok(dir) => dir,
            Err(e) => {
                error!(error = %e, "Staging directory unavailable");
                return vec![ProcessingResult::batch_failure(format!(
                    "Could not prepare staging directory {}: {}",
                    self.staging.root().display(),
                    e
                ))];
            }
        };

        let redactor = Redactor::from_request(self.catalog, request);
        if redactor.rules().len() < request.selected_rules.len() {
            warn!(
                selected = request.selected_rules.len(),
                active = redactor.rules().len(),
                "Some selected rules are inactive"
            );
        }

        let ctx = HandlerContext {
            redactor: &redactor,
            converter: self.converter.as_ref(),
            staging_dir,
            output_format: request.output_format,
        };

        info!(
            files = paths.len(),
            rules = redactor.rules().len(),
            keywords = request.custom_keywords.len(),
            line_suppression = request.line_suppression,
            format = %request.output_format,
            "Processing batch"
        );

        let mut results = Vec::with_capacity(paths.len());
        for path in paths {
            if path.as_os_str().is_empty() {
                debug!("Skipping empty path entry");
                continue;
            }

            let job = DocumentJob::new(path);
            results.push(process_document(&job, &ctx).await);
        }

        let succeeded = results.iter().filter(|r| r.is_success()).count();
        info!(succeeded, failed = results.len() - succeeded, "Batch complete");

        results
    }
}
