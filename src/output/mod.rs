//! Output module for persisting and summarizing collected records
//!
//! This module handles:
//! - Writing the dataset as timestamped CSV and JSON files
//! - Computing run statistics
//! - Printing the end-of-run preview and report

mod csv_output;
mod json_output;
pub mod stats;
mod traits;

pub use csv_output::CsvOutput;
pub use json_output::JsonOutput;
pub use stats::{print_preview, print_statistics, RunStatistics};
pub use traits::{OutputError, OutputHandler, OutputResult};

use crate::config::OutputConfig;
use crate::metrics::YearRecord;
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};

/// Timestamp format embedded in output file names
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Builds `<dir>/<prefix>_<timestamp>` without an extension
pub fn output_stem(directory: &Path, prefix: &str, at: DateTime<Local>) -> PathBuf {
    directory.join(format!("{}_{}", prefix, at.format(TIMESTAMP_FORMAT)))
}

/// Appends `.ext` to a stem, keeping any dots already in the prefix
fn with_suffix(stem: &Path, extension: &str) -> PathBuf {
    let mut name = stem.as_os_str().to_owned();
    name.push(".");
    name.push(extension);
    PathBuf::from(name)
}

/// Writes `records` as CSV and JSON under the configured directory
///
/// Both files share one timestamped stem. An empty record list writes
/// nothing and returns no paths. The directory is created if missing.
///
/// # Arguments
///
/// * `records` - The collected records
/// * `config` - Output directory and file prefixes
/// * `sample` - Whether this was a sample run (selects the prefix)
///
/// # Returns
///
/// * `Ok(Vec<PathBuf>)` - Paths of the files written
/// * `Err(OutputError)` - Failed to create the directory or write a file
pub fn export_records(
    records: &[YearRecord],
    config: &OutputConfig,
    sample: bool,
) -> OutputResult<Vec<PathBuf>> {
    if records.is_empty() {
        tracing::warn!("No records collected, nothing to save");
        return Ok(Vec::new());
    }

    let directory = Path::new(&config.directory);
    std::fs::create_dir_all(directory)?;

    let prefix = if sample {
        &config.sample_prefix
    } else {
        &config.full_prefix
    };
    let stem = output_stem(directory, prefix, Local::now());

    let handlers: [&dyn OutputHandler; 2] = [&CsvOutput, &JsonOutput];
    let mut written = Vec::with_capacity(handlers.len());
    for handler in handlers {
        let path = with_suffix(&stem, handler.extension());
        handler.write_records(records, &path)?;
        tracing::info!("Saved {} records to {}", records.len(), path.display());
        written.push(path);
    }

    Ok(written)
}
