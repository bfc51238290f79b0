use crate::config::types::{
    Config, CrawlConfig, FetchConfig, OutputConfig, SampleConfig, SiteConfig,
};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_site_config(&config.site)?;
    validate_fetch_config(&config.fetch)?;
    validate_crawl_config(&config.crawl)?;
    validate_output_config(&config.output)?;
    validate_sample_config(&config.sample)?;
    Ok(())
}

/// Validates site addresses
fn validate_site_config(config: &SiteConfig) -> Result<(), ConfigError> {
    validate_http_url("base-url", &config.base_url)?;
    validate_http_url("site-root", &config.site_root)?;
    Ok(())
}

/// Validates timeout and retry policy
fn validate_fetch_config(config: &FetchConfig) -> Result<(), ConfigError> {
    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "timeout-secs must be >= 1, got {}",
            config.timeout_secs
        )));
    }

    if config.max_attempts < 1 || config.max_attempts > 10 {
        return Err(ConfigError::Validation(format!(
            "max-attempts must be between 1 and 10, got {}",
            config.max_attempts
        )));
    }

    for status in &config.retry_statuses {
        if !(400..=599).contains(status) {
            return Err(ConfigError::Validation(format!(
                "retry-statuses must be HTTP error codes (400-599), got {}",
                status
            )));
        }
    }

    Ok(())
}

/// Validates politeness delays
fn validate_crawl_config(config: &CrawlConfig) -> Result<(), ConfigError> {
    // Delays are plain u64 milliseconds; zero is allowed for local mirrors
    const MAX_DELAY_MS: u64 = 60_000;

    for (name, value) in [
        ("year-delay-ms", config.year_delay_ms),
        ("entity-delay-ms", config.entity_delay_ms),
        ("sample-entity-delay-ms", config.sample_entity_delay_ms),
    ] {
        if value > MAX_DELAY_MS {
            return Err(ConfigError::Validation(format!(
                "{} must be <= {}ms, got {}ms",
                name, MAX_DELAY_MS, value
            )));
        }
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.directory.is_empty() {
        return Err(ConfigError::Validation(
            "output directory cannot be empty".to_string(),
        ));
    }

    for (name, prefix) in [
        ("full-prefix", &config.full_prefix),
        ("sample-prefix", &config.sample_prefix),
    ] {
        if prefix.is_empty() {
            return Err(ConfigError::Validation(format!("{} cannot be empty", name)));
        }

        if prefix.contains(['/', '\\']) {
            return Err(ConfigError::Validation(format!(
                "{} must be a file name prefix, got '{}'",
                name, prefix
            )));
        }
    }

    Ok(())
}

/// Validates the sample-run target lists
fn validate_sample_config(config: &SampleConfig) -> Result<(), ConfigError> {
    for year in &config.years {
        validate_year(year)?;
    }
    Ok(())
}

/// Checks that a year label is four ASCII digits
pub fn validate_year(year: &str) -> Result<(), ConfigError> {
    if year.len() != 4 || !year.chars().all(|c| c.is_ascii_digit()) {
        return Err(ConfigError::Validation(format!(
            "Year must be four digits, got '{}'",
            year
        )));
    }
    Ok(())
}

/// Checks that a URL parses and uses HTTP(S)
fn validate_http_url(name: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", name, value, e)))?;

    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' must use HTTP or HTTPS",
            name, value
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_year() {
        assert!(validate_year("2022").is_ok());
        assert!(validate_year("1999").is_ok());

        assert!(validate_year("").is_err());
        assert!(validate_year("22").is_err());
        assert!(validate_year("20x2").is_err());
        assert!(validate_year("20222").is_err());
    }

    #[test]
    fn test_validate_http_url() {
        assert!(validate_http_url("base-url", "https://globalewaste.org/").is_ok());
        assert!(validate_http_url("base-url", "http://127.0.0.1:8080").is_ok());

        assert!(validate_http_url("base-url", "ftp://globalewaste.org/").is_err());
        assert!(validate_http_url("base-url", "not a url").is_err());
    }

    #[test]
    fn test_rejects_bad_retry_policy() {
        let mut config = Config::default();
        config.fetch.max_attempts = 0;
        assert!(validate(&config).is_err());

        let mut config = Config::default();
        config.fetch.retry_statuses = vec![200];
        assert!(validate(&config).is_err());

        let mut config = Config::default();
        config.fetch.timeout_secs = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_rejects_prefix_with_path() {
        let mut config = Config::default();
        config.output.full_prefix = "../escape".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_rejects_excessive_delay() {
        let mut config = Config::default();
        config.crawl.entity_delay_ms = 120_000;
        assert!(validate(&config).is_err());
    }
}
