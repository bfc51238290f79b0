//! JSON export

use crate::metrics::YearRecord;
use crate::output::traits::{OutputHandler, OutputResult};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Writes an indented array of record objects
///
/// Absent metrics are `null`; stated "n/a" values are the string `"n/a"`.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonOutput;

impl OutputHandler for JsonOutput {
    fn extension(&self) -> &'static str {
        "json"
    }

    fn write_records(&self, records: &[YearRecord], path: &Path) -> OutputResult<()> {
        let mut file = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut file, records)?;
        file.write_all(b"\n")?;
        file.flush()?;
        Ok(())
    }
}
