//! Configuration module for E-waste Harvest
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every key is optional; `Config::default()` describes a full, polite crawl of
//! the public site.
//!
//! # Example
//!
//! ```no_run
//! use ewaste_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! println!("Pausing {}ms between year pages", config.crawl.year_delay_ms);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CrawlConfig, FetchConfig, OutputConfig, SampleConfig, SiteConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::{validate, validate_year};
