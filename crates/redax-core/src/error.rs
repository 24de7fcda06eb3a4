use thiserror::Error;

use crate::result::ErrorKind;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Unsupported file type: {0}")]
    UnsupportedFormat(String),

    #[error("Unknown output format: {0}")]
    UnknownOutputFormat(String),

    #[error("No content to process for {0}")]
    EmptyContent(String),

    #[error("Converter not found/executable: {0}")]
    ConverterUnavailable(String),

    #[error("Conversion failed: {0}")]
    Conversion(String),

    #[error("Document package error: {0}")]
    Package(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Failure category reported on a per-document result
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::UnsupportedFormat(_) => ErrorKind::Unsupported,
            Error::UnknownOutputFormat(_) => ErrorKind::Configuration,
            Error::EmptyContent(_) => ErrorKind::EmptyContent,
            Error::ConverterUnavailable(_) => ErrorKind::ConverterUnavailable,
            Error::Conversion(_) | Error::Package(_) => ErrorKind::Conversion,
            Error::Io(_) => ErrorKind::Io,
            Error::Other(_) => ErrorKind::Internal,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
