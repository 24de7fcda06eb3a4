//! Document format converter boundary
//!
//! The converter is an external program (pandoc). Raw process errors are
//! mapped into [`ConvertError`] here so callers never inspect messages.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info, warn};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConvertError {
    /// The converter cannot be run at all
    #[error("{0}")]
    Unavailable(String),

    /// The converter ran and failed, or its output was unusable
    #[error("{0}")]
    Failed(String),
}

impl From<ConvertError> for redax_core::Error {
    fn from(err: ConvertError) -> Self {
        match err {
            ConvertError::Unavailable(msg) => redax_core::Error::ConverterUnavailable(msg),
            ConvertError::Failed(msg) => redax_core::Error::Conversion(msg),
        }
    }
}

pub type ConvertResult<T> = std::result::Result<T, ConvertError>;

/// What to feed the converter
#[derive(Debug, Clone, Copy)]
pub enum ConvertInput<'a> {
    File(&'a Path),
    Text(&'a str),
}

/// One converter invocation
#[derive(Debug, Clone)]
pub struct Conversion<'a> {
    pub input: ConvertInput<'a>,
    pub from: &'a str,
    /// Writer name; `None` lets the converter infer it from `output`
    pub to: Option<&'a str>,
    /// Output file; `None` returns the converted text
    pub output: Option<&'a Path>,
    pub extra_args: Vec<String>,
}

#[async_trait]
pub trait Converter: Send + Sync {
    /// Run one conversion. Returns the converted text when no output file is
    /// given, otherwise an empty string.
    async fn convert(&self, conversion: Conversion<'_>) -> ConvertResult<String>;
}

/// Converter readiness, computed once at startup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConverterStatus {
    pub ready: bool,
    pub program: Option<PathBuf>,
    pub version: Option<String>,
    pub message: String,
}

impl ConverterStatus {
    pub fn ready(program: PathBuf, version: Option<String>, message: impl Into<String>) -> Self {
        Self {
            ready: true,
            program: Some(program),
            version,
            message: message.into(),
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            ready: false,
            program: None,
            version: None,
            message: message.into(),
        }
    }
}

/// Pandoc run as a subprocess
#[derive(Debug, Clone)]
pub struct PandocConverter {
    program: PathBuf,
}

impl PandocConverter {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Locate a usable pandoc.
    ///
    /// An explicitly configured binary is tried first; if it is missing or
    /// does not run, `program_name` is looked up on `PATH`.
    pub async fn discover(explicit: Option<&Path>, program_name: &str) -> (Self, ConverterStatus) {
        if let Some(path) = explicit {
            let converter = Self::new(path);
            match converter.version().await {
                Ok(version) => {
                    let status = ConverterStatus::ready(
                        path.to_path_buf(),
                        Some(version),
                        format!("Using configured Pandoc: {}", path.display()),
                    );
                    info!(program = %path.display(), "Pandoc ready (configured)");
                    return (converter, status);
                }
                Err(e) => {
                    warn!(
                        program = %path.display(),
                        error = %e,
                        "Configured Pandoc unusable, trying system PATH"
                    );
                }
            }
        }

        let resolved = match which::which(program_name) {
            Ok(path) => path,
            Err(e) => {
                let status = ConverterStatus::unavailable(format!(
                    "Pandoc not found or unusable on system PATH: {}",
                    e
                ));
                warn!(program = %program_name, "Pandoc not found on PATH");
                return (Self::new(program_name), status);
            }
        };

        let converter = Self::new(&resolved);
        match converter.version().await {
            Ok(version) => {
                info!(
                    program = %resolved.display(),
                    version = %version,
                    "Pandoc ready (system PATH)"
                );
                let status =
                    ConverterStatus::ready(resolved, Some(version), "Pandoc ready (system PATH).");
                (converter, status)
            }
            Err(e) => {
                let status = ConverterStatus::unavailable(format!(
                    "Pandoc not found or unusable on system PATH: {}",
                    e
                ));
                (converter, status)
            }
        }
    }

    /// First line of `pandoc --version`
    pub async fn version(&self) -> ConvertResult<String> {
        let output = Command::new(&self.program)
            .arg("--version")
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| classify_spawn_error(&self.program, e))?;

        if !output.status.success() {
            return Err(ConvertError::Unavailable(format!(
                "{} --version exited with {}",
                self.program.display(),
                output.status
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(stdout.lines().next().unwrap_or_default().trim().to_string())
    }

    fn command(&self, conversion: &Conversion<'_>) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg("--from").arg(conversion.from);

        if let Some(to) = conversion.to {
            cmd.arg("--to").arg(to);
        }
        if let Some(output) = conversion.output {
            cmd.arg("--output").arg(output);
        }
        cmd.args(&conversion.extra_args);

        if let ConvertInput::File(path) = conversion.input {
            cmd.arg(path);
        }

        cmd
    }
}

#[async_trait]
impl Converter for PandocConverter {
    async fn convert(&self, conversion: Conversion<'_>) -> ConvertResult<String> {
        let mut cmd = self.command(&conversion);
        debug!(
            program = %self.program.display(),
            from = conversion.from,
            to = ?conversion.to,
            "Running converter"
        );

        let stdin = match conversion.input {
            ConvertInput::Text(_) => Stdio::piped(),
            ConvertInput::File(_) => Stdio::null(),
        };

        let mut child = cmd
            .stdin(stdin)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| classify_spawn_error(&self.program, e))?;

        if let ConvertInput::Text(text) = conversion.input
            && let Some(mut stdin) = child.stdin.take()
        {
            stdin
                .write_all(text.as_bytes())
                .await
                .map_err(|e| {
                    ConvertError::Failed(format!("Failed to write converter input: {}", e))
                })?;
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| ConvertError::Failed(format!("Converter did not finish: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ConvertError::Failed(format!(
                "Pandoc exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        if conversion.output.is_some() {
            return Ok(String::new());
        }

        String::from_utf8(output.stdout)
            .map_err(|e| ConvertError::Failed(format!("Invalid UTF-8 in converter output: {}", e)))
    }
}

/// Map a spawn failure onto the structured error.
///
/// `NotFound` and `PermissionDenied` mean the converter is unusable. Other
/// kinds fall back to inspecting the message for the same conditions.
fn classify_spawn_error(program: &Path, err: io::Error) -> ConvertError {
    let message = format!("{}: {}", program.display(), err);
    match err.kind() {
        io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied => {
            ConvertError::Unavailable(message)
        }
        _ if looks_unavailable(&message) => ConvertError::Unavailable(message),
        _ => ConvertError::Failed(message),
    }
}

fn looks_unavailable(message: &str) -> bool {
    let lower = message.to_lowercase();
    ["not found", "no such file", "permission denied", "isn't executable", "not executable"]
        .iter()
        .any(|needle| lower.contains(needle))
}
