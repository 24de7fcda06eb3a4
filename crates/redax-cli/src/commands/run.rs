use anyhow::{Context, Result};
use redax_config::Config;
use redax_core::{DocumentFormat, ProcessingResult, RedactionRequest, parse_keywords};
use redax_engine::BatchProcessor;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::cli::RunArgs;
use crate::commands::with_overrides;

pub async fn handle(args: RunArgs, config: &Config) -> Result<()> {
    let paths = collect_inputs(&args.paths, args.recursive)?;
    if paths.is_empty() {
        anyhow::bail!("No supported documents found in the given paths");
    }
    if !config.allows_batch_of(paths.len()) {
        anyhow::bail!(
            "Too many files: {} selected, limit is {} (see batch.max_files)",
            paths.len(),
            config.batch.max_files
        );
    }

    let request = build_request(&args, config);
    if request.is_empty() {
        anyhow::bail!("Select at least one rule (--rule) or keyword (--keywords)");
    }

    let out_dir = match &args.out_dir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir()?,
    };
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("Failed to create output directory {}", out_dir.display()))?;

    let config = with_overrides(config, args.converter.clone(), args.staging_dir.clone());
    let processor = BatchProcessor::from_config(&config).await;
    let _cleanup = processor.staging().guard();

    let results = processor.process_batch(&paths, &request).await;
    let reports: Vec<Report> = results
        .into_iter()
        .map(|result| save(&processor, result, &out_dir))
        .collect();

    if args.json {
        let values: Vec<_> = reports.iter().map(Report::to_json).collect();
        println!("{}", serde_json::to_string_pretty(&values)?);
    } else {
        print_reports(&reports);
    }

    let failed = reports.iter().filter(|r| r.saved_to.is_none()).count();
    if failed > 0 {
        anyhow::bail!("{} of {} document(s) failed", failed, reports.len());
    }

    Ok(())
}

/// Processing outcome plus where the output was saved, if anywhere
struct Report {
    result: ProcessingResult,
    saved_to: Option<PathBuf>,
    save_error: Option<String>,
}

impl Report {
    fn to_json(&self) -> serde_json::Value {
        let mut value = serde_json::to_value(&self.result).unwrap_or_default();
        if let Some(obj) = value.as_object_mut() {
            if let Some(path) = &self.saved_to {
                obj.insert("saved_to".into(), path.display().to_string().into());
            }
            if let Some(err) = &self.save_error {
                obj.insert("save_error".into(), err.clone().into());
            }
        }
        value
    }
}

fn save(processor: &BatchProcessor, result: ProcessingResult, out_dir: &Path) -> Report {
    let ProcessingResult::Success {
        original_name,
        output_path,
        output_format,
    } = &result
    else {
        return Report {
            result,
            saved_to: None,
            save_error: None,
        };
    };

    match processor
        .staging()
        .save(output_path, original_name, *output_format, out_dir)
    {
        Ok(dest) => Report {
            result,
            saved_to: Some(dest),
            save_error: None,
        },
        Err(e) => {
            warn!(file = %original_name, error = %e, "Failed to save output");
            Report {
                save_error: Some(e.to_string()),
                result,
                saved_to: None,
            }
        }
    }
}

fn print_reports(reports: &[Report]) {
    for report in reports {
        match (&report.result, &report.saved_to) {
            (ProcessingResult::Success { original_name, .. }, Some(dest)) => {
                println!("✓ {} -> {}", original_name, dest.display());
            }
            (ProcessingResult::Success { original_name, .. }, None) => {
                println!(
                    "✗ {}: {}",
                    original_name,
                    report.save_error.as_deref().unwrap_or("not saved")
                );
            }
            (ProcessingResult::Failure { original_name, message, .. }, _) => {
                println!("✗ {}: {}", original_name, message);
            }
        }
    }
}

fn build_request(args: &RunArgs, config: &Config) -> RedactionRequest {
    let rules = if args.rules.is_empty() {
        &config.batch.default_rules
    } else {
        &args.rules
    };
    let keywords = args.keywords.as_deref().map(parse_keywords).unwrap_or_default();
    let format = args.format.unwrap_or(config.batch.default_format);

    RedactionRequest::new(rules.iter().map(String::as_str), keywords, format)
}

/// Expand directory arguments into supported documents; file arguments pass through
fn collect_inputs(paths: &[PathBuf], recursive: bool) -> Result<Vec<PathBuf>> {
    let mut inputs = Vec::new();

    for path in paths {
        if !path.is_dir() {
            inputs.push(path.clone());
            continue;
        }

        let walker = WalkDir::new(path)
            .min_depth(1)
            .max_depth(if recursive { usize::MAX } else { 1 })
            .sort_by_file_name();

        let mut found = 0;
        for entry in walker {
            let entry = entry.with_context(|| format!("Failed to read {}", path.display()))?;
            if entry.file_type().is_file()
                && DocumentFormat::from_path(entry.path()).is_supported()
            {
                inputs.push(entry.into_path());
                found += 1;
            }
        }
        debug!(dir = %path.display(), found, "Expanded directory");
    }

    Ok(inputs)
}
