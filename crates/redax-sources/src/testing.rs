//! In-process converter used by handler tests

use async_trait::async_trait;
use redax_security::{PatternCatalog, Redactor};
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::converter::{ConvertError, ConvertInput, ConvertResult, Conversion, Converter};

#[derive(Debug, Clone)]
pub struct Call {
    pub input_file: Option<PathBuf>,
    pub from: String,
    pub to: Option<String>,
    pub output: Option<PathBuf>,
    pub extra_args: Vec<String>,
}

/// Copies its input through unchanged and records every call
#[derive(Default)]
pub struct RecordingConverter {
    calls: Mutex<Vec<Call>>,
    fail_with: Option<ConvertError>,
}

impl RecordingConverter {
    pub fn failing(err: ConvertError) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail_with: Some(err),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Converter for RecordingConverter {
    async fn convert(&self, conversion: Conversion<'_>) -> ConvertResult<String> {
        self.calls.lock().unwrap().push(Call {
            input_file: match conversion.input {
                ConvertInput::File(p) => Some(p.to_path_buf()),
                ConvertInput::Text(_) => None,
            },
            from: conversion.from.to_string(),
            to: conversion.to.map(String::from),
            output: conversion.output.map(|p| p.to_path_buf()),
            extra_args: conversion.extra_args.clone(),
        });

        if let Some(err) = &self.fail_with {
            return Err(err.clone());
        }

        let bytes = match conversion.input {
            ConvertInput::File(p) => {
                std::fs::read(p).map_err(|e| ConvertError::Failed(e.to_string()))?
            }
            ConvertInput::Text(t) => t.as_bytes().to_vec(),
        };

        match conversion.output {
            Some(out) => {
                std::fs::write(out, bytes).map_err(|e| ConvertError::Failed(e.to_string()))?;
                Ok(String::new())
            }
            None => Ok(String::from_utf8_lossy(&bytes).into_owned()),
        }
    }
}

pub fn redactor(keys: &[&str]) -> Redactor {
    let keys: BTreeSet<String> = keys.iter().map(|s| s.to_string()).collect();
    Redactor::new(PatternCatalog::builtin().select(&keys), Vec::new(), false)
}
