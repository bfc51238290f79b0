//! E-waste Harvest: a polite collector for Global E-waste Monitor statistics
//!
//! This crate crawls the country-sheet pages of the Global E-waste Monitor,
//! walking every continent, region and country across the years the site
//! publishes, and extracts a fixed schema of e-waste metrics into flat
//! per-year records ready for CSV/JSON export.

pub mod config;
pub mod crawler;
pub mod metrics;
pub mod output;

use thiserror::Error;

/// Main error type for E-waste Harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Unresolvable link '{href}' on {page}")]
    BadLink { href: String, page: String },

    #[error("Invalid CSS selector: {0}")]
    Selector(String),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for E-waste Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Coordinator, CrawlScope, Fetcher, RetryPolicy, YearFilter};
pub use metrics::{parse_number, Category, Entity, Metric, MetricSet, YearRecord};
