//! Error types for redax-storage

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, StagingError>;

#[derive(Error, Debug)]
pub enum StagingError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Processed file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Destination is not a directory: {}", .0.display())]
    InvalidDestination(PathBuf),
}
