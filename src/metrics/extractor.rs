//! Metric extraction from year pages
//!
//! A year page carries two block regions built from the same markup:
//!
//! - the upper region (`div.upper-part`) with absolute totals in kilotons and
//!   the collection-rate gauge
//! - the bottom region (`div.bottom-part.upper-part.row`) with the per-capita
//!   variants of "generated" and "put on market"
//!
//! Each block is a `div.single-data` with an `<h3>` title and a value
//! paragraph. Blocks are matched to fields by lower-cased substring search
//! against ordered keyword tables; the first keyword that matches wins.
//! Population lives in its own `p.pop-number` element outside both regions.

use crate::metrics::number::{parse_number, Metric};
use crate::metrics::record::{MetricField, MetricSet};
use crate::{HarvestError, Result};
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;

/// Upper-region keywords, in priority order
///
/// The collection rate is read from the gauge text, not the value paragraph.
pub const UPPER_KEYWORDS: &[(&str, MetricField)] = &[
    ("e-waste collection rate", MetricField::CollectionRate),
    ("e-waste generated", MetricField::GeneratedKt),
    ("eee put on market", MetricField::PutOnMarketKt),
    ("e-waste formally collected", MetricField::FormallyCollectedKt),
    ("e-waste imported", MetricField::ImportedKt),
    ("e-waste exported", MetricField::ExportedKt),
];

/// Bottom-region (per-capita) keywords, in priority order
pub const BOTTOM_KEYWORDS: &[(&str, MetricField)] = &[
    ("e-waste generated", MetricField::GeneratedPerCapita),
    ("eee put on market", MetricField::PutOnMarketPerCapita),
];

const POPULATION: &str = "p.pop-number";
const UPPER_REGION: &str = "div.upper-part:not(.bottom-part)";
const BOTTOM_REGION: &str = "div.bottom-part.upper-part.row";
const DATA_BLOCK: &str = "div.single-data";
const BLOCK_TITLE: &str = "h3";
const BLOCK_VALUE: &str = "p.num.bignum, p.num.middlenum";
const RATE_GAUGE: &str = "text.circle-chart__percent";

/// Finds the field a block title belongs to
///
/// The title is lower-cased and checked against each keyword in table order;
/// the first contained keyword decides the field.
///
/// # Example
///
/// ```
/// use ewaste_harvest::metrics::{match_keyword, MetricField, UPPER_KEYWORDS};
///
/// assert_eq!(
///     match_keyword("E-waste Generated", UPPER_KEYWORDS),
///     Some(MetricField::GeneratedKt)
/// );
/// assert_eq!(match_keyword("Population", UPPER_KEYWORDS), None);
/// ```
pub fn match_keyword(title: &str, table: &[(&str, MetricField)]) -> Option<MetricField> {
    let lowered = title.to_lowercase();
    table
        .iter()
        .find(|(keyword, _)| lowered.contains(keyword))
        .map(|(_, field)| *field)
}

/// Compiled selectors for year-page extraction
///
/// Built once per crawl and reused for every year page.
#[derive(Debug)]
pub struct MetricExtractor {
    population: Selector,
    upper_region: Selector,
    bottom_region: Selector,
    block: Selector,
    title: Selector,
    value: Selector,
    gauge: Selector,
}

impl MetricExtractor {
    /// Compiles the extractor's selectors
    pub fn new() -> Result<Self> {
        Ok(Self {
            population: compile(POPULATION)?,
            upper_region: compile(UPPER_REGION)?,
            bottom_region: compile(BOTTOM_REGION)?,
            block: compile(DATA_BLOCK)?,
            title: compile(BLOCK_TITLE)?,
            value: compile(BLOCK_VALUE)?,
            gauge: compile(RATE_GAUGE)?,
        })
    }

    /// Extracts every known metric from a parsed year page
    ///
    /// Missing regions, blocks or elements leave the corresponding fields
    /// absent. The result depends only on the document, so extracting the
    /// same page twice gives the same set.
    pub fn extract(&self, document: &Html) -> MetricSet {
        let mut metrics = MetricSet::default();

        if let Some(pop) = document.select(&self.population).next() {
            metrics.population = parse_number(&element_text(pop));
        }

        match document.select(&self.upper_region).next() {
            Some(upper) => self.extract_upper(upper, &mut metrics),
            None => tracing::debug!("No upper-part region on page"),
        }

        match document.select(&self.bottom_region).next() {
            Some(bottom) => self.extract_bottom(bottom, &mut metrics),
            None => tracing::debug!("No bottom-part region on page"),
        }

        metrics
    }

    fn extract_upper(&self, region: ElementRef<'_>, metrics: &mut MetricSet) {
        // Raw titles already written to a field; repeats are near-duplicate blocks
        let mut consumed: HashSet<String> = HashSet::new();

        for block in region.select(&self.block) {
            let Some(title) = self.block_title(block) else {
                continue;
            };

            let Some(field) = match_keyword(&title, UPPER_KEYWORDS) else {
                tracing::trace!("Ignoring unknown block '{}'", title);
                continue;
            };

            if consumed.contains(&title) {
                tracing::debug!("Skipping repeated block '{}'", title);
                continue;
            }

            let value = if field == MetricField::CollectionRate {
                block.select(&self.gauge).next()
            } else {
                block.select(&self.value).next()
            };

            let Some(value) = value else {
                tracing::debug!("Block '{}' has no value element", title);
                continue;
            };

            let metric = parse_number(&element_text(value));
            tracing::trace!("{} = {:?}", field.column(), metric);
            metrics.set(field, metric);
            consumed.insert(title);
        }
    }

    fn extract_bottom(&self, region: ElementRef<'_>, metrics: &mut MetricSet) {
        for block in region.select(&self.block) {
            let Some(title) = self.block_title(block) else {
                continue;
            };

            let Some(field) = match_keyword(&title, BOTTOM_KEYWORDS) else {
                continue;
            };

            let Some(value) = block.select(&self.value).next() else {
                tracing::debug!("Per-capita block '{}' has no value element", title);
                continue;
            };

            let metric: Option<Metric> = parse_number(&element_text(value));
            tracing::trace!("{} = {:?}", field.column(), metric);
            metrics.set(field, metric);
        }
    }

    fn block_title(&self, block: ElementRef<'_>) -> Option<String> {
        block.select(&self.title).next().map(element_text)
    }
}

/// Extracts metrics from a year page with a freshly compiled extractor
pub fn extract_metrics(document: &Html) -> Result<MetricSet> {
    Ok(MetricExtractor::new()?.extract(document))
}

fn compile(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| HarvestError::Selector(format!("{}: {}", css, e)))
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}
