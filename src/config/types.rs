use serde::Deserialize;

/// Main configuration structure for E-waste Harvest
///
/// Every section has defaults, so an empty file (or no file) describes a
/// full crawl of the public site.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub site: SiteConfig,
    pub fetch: FetchConfig,
    pub crawl: CrawlConfig,
    pub output: OutputConfig,
    pub sample: SampleConfig,
}

/// Where the data lives
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Listing page holding the continent, region and country lists
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Root that relative entity and year links are resolved against
    #[serde(rename = "site-root")]
    pub site_root: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://globalewaste.org/country-sheets/".to_string(),
            site_root: "https://globalewaste.org".to_string(),
        }
    }
}

/// HTTP timeout and retry policy
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Per-request timeout (seconds); timeouts are never retried
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,

    /// Total attempts per URL, including the first
    #[serde(rename = "max-attempts")]
    pub max_attempts: u32,

    /// Wait before the first retry (milliseconds); doubles on every retry
    #[serde(rename = "backoff-base-ms")]
    pub backoff_base_ms: u64,

    /// Response statuses that trigger a retry
    #[serde(rename = "retry-statuses")]
    pub retry_statuses: Vec<u16>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 20,
            max_attempts: 5,
            backoff_base_ms: 1000,
            retry_statuses: vec![429, 500, 502, 503, 504],
        }
    }
}

/// Politeness delays between page loads
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlConfig {
    /// Pause after every year page (milliseconds)
    #[serde(rename = "year-delay-ms")]
    pub year_delay_ms: u64,

    /// Pause after every entity's full year walk (milliseconds)
    #[serde(rename = "entity-delay-ms")]
    pub entity_delay_ms: u64,

    /// Entity pause used by sample runs (milliseconds)
    #[serde(rename = "sample-entity-delay-ms")]
    pub sample_entity_delay_ms: u64,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            year_delay_ms: 1000,
            entity_delay_ms: 1500,
            sample_entity_delay_ms: 1000,
        }
    }
}

/// Output file configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory receiving the CSV and JSON exports
    pub directory: String,

    /// File name prefix for full runs
    #[serde(rename = "full-prefix")]
    pub full_prefix: String,

    /// File name prefix for sample runs
    #[serde(rename = "sample-prefix")]
    pub sample_prefix: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: "output_data".to_string(),
            full_prefix: "ewaste_data_full".to_string(),
            sample_prefix: "ewaste_data_test".to_string(),
        }
    }
}

/// Bounded entity/year subset crawled by `--test` runs
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SampleConfig {
    pub years: Vec<String>,
    pub continents: Vec<String>,
    pub regions: Vec<String>,
    pub countries: Vec<String>,
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self {
            years: vec!["2022".to_string(), "2018".to_string()],
            continents: vec!["Europe".to_string()],
            regions: vec![
                "Australia and New Zealand".to_string(),
                "South-Eastern Asia".to_string(),
            ],
            countries: vec![
                "China".to_string(),
                "Germany".to_string(),
                "Japan".to_string(),
                "United States of America".to_string(),
            ],
        }
    }
}
