//! Output handler traits and types
//!
//! This module defines the trait interface for dataset writers and the
//! errors they can raise.

use crate::metrics::YearRecord;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Trait for dataset writers
///
/// Each handler serializes the whole record list into one file. Column order
/// is the field order of [`YearRecord`].
pub trait OutputHandler {
    /// File extension (without the dot) for this format
    fn extension(&self) -> &'static str;

    /// Writes `records` to `path`, replacing any existing file
    ///
    /// # Arguments
    ///
    /// * `records` - The collected records
    /// * `path` - Destination file
    fn write_records(&self, records: &[YearRecord], path: &Path) -> OutputResult<()>;
}
