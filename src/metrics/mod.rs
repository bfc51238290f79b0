//! Metric model and extraction
//!
//! This module holds everything that turns a year page into data:
//! - the three-valued [`Metric`] domain and its text normalizer
//! - the [`Entity`] and [`YearRecord`] output model
//! - the keyword-driven [`MetricExtractor`]

mod extractor;
mod number;
mod record;

pub use extractor::{
    extract_metrics, match_keyword, MetricExtractor, BOTTOM_KEYWORDS, UPPER_KEYWORDS,
};
pub use number::{parse_number, Metric, NOT_AVAILABLE};
pub use record::{Category, Entity, MetricField, MetricSet, YearRecord};
