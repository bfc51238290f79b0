//! Statistics over a collected dataset
//!
//! This module summarizes the records of one run and prints the end-of-run
//! report.

use crate::metrics::{Category, Metric, MetricField, YearRecord};
use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

/// Number of records shown by [`print_preview`]
pub const PREVIEW_ROWS: usize = 5;

/// Run statistics summary
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunStatistics {
    /// Total number of records
    pub total_records: usize,

    /// Count of records by category
    pub records_by_category: BTreeMap<Category, usize>,

    /// Number of distinct entities with at least one record
    pub entities: usize,

    /// Distinct years seen across all records
    pub years: BTreeSet<String>,

    /// Metric cells stated as "n/a" on the site
    pub not_available_cells: usize,

    /// Metric cells the site did not show at all
    pub absent_cells: usize,
}

impl RunStatistics {
    /// Computes statistics from a record list
    ///
    /// # Arguments
    ///
    /// * `records` - The records collected by a run
    pub fn from_records(records: &[YearRecord]) -> Self {
        let mut stats = Self {
            total_records: records.len(),
            ..Self::default()
        };

        let mut entities = BTreeSet::new();
        for record in records {
            *stats.records_by_category.entry(record.category).or_insert(0) += 1;
            entities.insert((record.category, record.name.as_str()));
            stats.years.insert(record.year.clone());

            let metrics = record.metrics();
            for field in MetricField::ALL {
                match metrics.get(field) {
                    Some(Metric::NotAvailable) => stats.not_available_cells += 1,
                    None => stats.absent_cells += 1,
                    Some(Metric::Value(_)) => {}
                }
            }
        }
        stats.entities = entities.len();

        stats
    }

    /// Record count for one category, zero if none were collected
    pub fn count(&self, category: Category) -> usize {
        self.records_by_category.get(&category).copied().unwrap_or(0)
    }
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
/// * `elapsed` - Wall time of the run
pub fn print_statistics(stats: &RunStatistics, elapsed: Duration) {
    println!("=== Collection Statistics ===\n");

    println!("Overview:");
    println!("  Total records: {}", stats.total_records);
    println!("  Entities with data: {}", stats.entities);
    if !stats.years.is_empty() {
        let years: Vec<&str> = stats.years.iter().map(String::as_str).collect();
        println!("  Years: {}", years.join(", "));
    }
    println!();

    println!("Records by Category:");
    for category in Category::ALL {
        let count = stats.count(category);
        let percentage = if stats.total_records > 0 {
            (count as f64 / stats.total_records as f64) * 100.0
        } else {
            0.0
        };
        println!("  {}: {} ({:.1}%)", category, count, percentage);
    }
    println!();

    println!("Metric Cells:");
    println!("  Stated n/a: {}", stats.not_available_cells);
    println!("  Not shown: {}", stats.absent_cells);
    println!();

    println!("Duration: {:.1}s", elapsed.as_secs_f64());
}

/// Prints the first few records as a compact table
pub fn print_preview(records: &[YearRecord]) {
    println!("=== Preview (first {} of {}) ===\n", PREVIEW_ROWS.min(records.len()), records.len());

    for record in records.iter().take(PREVIEW_ROWS) {
        println!(
            "  {:<9} {:<32} {}  pop={}  generated={}  collected={}  rate={}",
            record.category.as_str(),
            record.name,
            record.year,
            cell(record.population),
            cell(record.generated_kt),
            cell(record.formally_collected_kt),
            cell(record.collection_rate),
        );
    }
    println!();
}

fn cell(metric: Option<Metric>) -> String {
    metric.map(|m| m.to_string()).unwrap_or_else(|| "-".to_string())
}
