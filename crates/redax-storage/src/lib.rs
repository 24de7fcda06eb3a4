//! Staging storage for redax
//!
//! This crate provides:
//! - The process-scoped staging directory for intermediate and final artifacts
//! - Hand-off of staged outputs to their destination

pub mod error;
pub mod staging;

pub use error::{Result, StagingError};
pub use staging::{STAGING_DIR_NAME, StagingArea, StagingGuard};
