//! CSV export
//!
//! Writes UTF-8 with a leading byte-order mark so spreadsheet tools pick up
//! the encoding of non-ASCII entity names.

use crate::metrics::YearRecord;
use crate::output::traits::{OutputHandler, OutputResult};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// CSV writer with a header row in record column order
///
/// Absent metrics become empty cells, stated "n/a" values stay literal.
#[derive(Debug, Default, Clone, Copy)]
pub struct CsvOutput;

impl OutputHandler for CsvOutput {
    fn extension(&self) -> &'static str {
        "csv"
    }

    fn write_records(&self, records: &[YearRecord], path: &Path) -> OutputResult<()> {
        let mut file = BufWriter::new(File::create(path)?);
        file.write_all(UTF8_BOM)?;

        let mut writer = csv::Writer::from_writer(file);
        for record in records {
            writer.serialize(record)?;
        }
        writer.flush()?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{Category, Entity, Metric, MetricField, MetricSet};
    use tempfile::tempdir;
    use url::Url;

    fn record(name: &str, generated: Option<Metric>) -> YearRecord {
        let entity = Entity {
            category: Category::Region,
            name: name.to_string(),
            url: Url::parse("https://globalewaste.org/r").unwrap(),
        };
        let mut metrics = MetricSet::default();
        metrics.set(MetricField::Population, Some(Metric::Value(31_000_000.0)));
        metrics.set(MetricField::GeneratedKt, generated);
        metrics.set(MetricField::ImportedKt, Some(Metric::NotAvailable));
        let url = Url::parse("https://globalewaste.org/r/2022").unwrap();
        YearRecord::from_metrics(&entity, "2022", &url, metrics).unwrap()
    }

    #[test]
    fn test_writes_bom_header_and_rows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.csv");

        CsvOutput
            .write_records(
                &[
                    record("Australia and New Zealand", Some(Metric::Value(1_100.5))),
                    record("Côte d'Ivoire", None),
                ],
                &path,
            )
            .unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(UTF8_BOM));

        let text = String::from_utf8(bytes[UTF8_BOM.len()..].to_vec()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            "Category,Name,Year,Population,E-waste Generated (kt),EEE Put on Market (kt),\
             E-waste Formally Collected (kt),E-waste Collection Rate (%),\
             E-waste Generated (kg/capita),EEE Put on Market (kg/capita),\
             E-waste Imported (kt),E-waste Exported (kt),Source URL"
        );
        assert_eq!(
            lines[1],
            "Region,Australia and New Zealand,2022,31000000.0,1100.5,,,,,,n/a,,\
             https://globalewaste.org/r/2022"
        );
        // Absent stays empty, distinct from the literal n/a
        assert!(lines[2].starts_with("Region,Côte d'Ivoire,2022,31000000.0,,"));
    }

    #[test]
    fn test_empty_record_list_writes_empty_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.csv");
        CsvOutput.write_records(&[], &path).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), UTF8_BOM);
    }
}
