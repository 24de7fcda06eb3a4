//! Shared staging directory
//!
//! One directory per process. Batches are not isolated from each other: two
//! batches running at once would collide on file names.

use redax_core::OutputFormat;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

use crate::{Result, StagingError};

pub const STAGING_DIR_NAME: &str = "redax_processing";

#[derive(Debug, Clone)]
pub struct StagingArea {
    root: PathBuf,
}

impl StagingArea {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// `<system temp>/redax_processing`
    pub fn default_root() -> PathBuf {
        std::env::temp_dir().join(STAGING_DIR_NAME)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the directory if absent
    pub fn ensure(&self) -> Result<&Path> {
        if !self.root.is_dir() {
            std::fs::create_dir_all(&self.root)?;
            debug!(dir = %self.root.display(), "Created staging directory");
        }
        Ok(&self.root)
    }

    /// Remove the directory and everything in it; an absent directory is fine
    pub fn purge(&self) -> Result<()> {
        match std::fs::remove_dir_all(&self.root) {
            Ok(()) => {
                info!(dir = %self.root.display(), "Cleaned up staging directory");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn path_for(&self, file_name: &str) -> PathBuf {
        self.root.join(file_name)
    }

    /// Copy a staged artifact to `dest_dir` as `<base>_redacted.<ext>`
    pub fn save(
        &self,
        staged: &Path,
        original_name: &str,
        format: OutputFormat,
        dest_dir: &Path,
    ) -> Result<PathBuf> {
        if !staged.is_file() {
            return Err(StagingError::NotFound(staged.to_path_buf()));
        }
        if !dest_dir.is_dir() {
            return Err(StagingError::InvalidDestination(dest_dir.to_path_buf()));
        }

        let dest = dest_dir.join(suggested_file_name(original_name, format));
        std::fs::copy(staged, &dest)?;
        info!(file = %original_name, dest = %dest.display(), "Saved redacted file");

        Ok(dest)
    }

    /// Purge the directory when the returned guard is dropped
    pub fn guard(&self) -> StagingGuard {
        StagingGuard {
            area: self.clone(),
        }
    }
}

impl Default for StagingArea {
    fn default() -> Self {
        Self::new(Self::default_root())
    }
}

/// Purges the staging directory at teardown
#[derive(Debug)]
pub struct StagingGuard {
    area: StagingArea,
}

impl Drop for StagingGuard {
    fn drop(&mut self) {
        if let Err(e) = self.area.purge() {
            error!(
                dir = %self.area.root().display(),
                error = %e,
                "Could not remove staging directory"
            );
        }
    }
}

fn suggested_file_name(original_name: &str, format: OutputFormat) -> String {
    let stem = Path::new(original_name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| original_name.to_string());
    format!("{}_redacted.{}", stem, format.extension())
}
