//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building one long-lived client with browser-like headers
//! - Retrying transient failures with exponential backoff
//! - Resolving the response text encoding
//! - Parsing the body into an HTML document
//! - Error classification

use crate::config::FetchConfig;
use crate::crawler::walker::polite_pause;
use encoding_rs::{Encoding, UTF_8};
use reqwest::header::{
    HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE, RETRY_AFTER,
    UPGRADE_INSECURE_REQUESTS,
};
use reqwest::{Client, Response, StatusCode};
use scraper::Html;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Desktop Chrome identification; the site blocks obvious bots
pub const BROWSER_USER_AGENT: &str = concat!(
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) ",
    "AppleWebKit/537.36 (KHTML, like Gecko) ",
    "Chrome/58.0.3029.110 Safari/537.3"
);

const BROWSER_ACCEPT: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8";
const BROWSER_ACCEPT_LANGUAGE: &str = "en-US,en;q=0.5";

/// How far into the body to look for a `<meta charset>` declaration
const SNIFF_WINDOW: usize = 1024;

/// Longest server-requested wait honoured before a retry
pub const MAX_RETRY_AFTER: Duration = Duration::from_secs(60);

/// Reasons a page could not be fetched
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Gave up on {url} after {attempts} attempts: {last}")]
    Exhausted {
        url: String,
        attempts: u32,
        last: String,
    },

    #[error("Interrupted while waiting to retry {url}")]
    Cancelled { url: String },

    #[error("Network error for {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

impl FetchError {
    /// The URL the failed request was for
    pub fn url(&self) -> &str {
        match self {
            Self::Timeout { url }
            | Self::Status { url, .. }
            | Self::Exhausted { url, .. }
            | Self::Cancelled { url }
            | Self::Network { url, .. } => url,
        }
    }
}

/// Retry policy for transient failures
///
/// A request is retried when the server answers with one of
/// `retry_statuses` or the connection itself fails. The wait before retry
/// `n` (1-based) is `backoff_base * 2^(n-1)`. Timeouts are never retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    /// Wait before the first retry
    pub backoff_base: Duration,
    /// Statuses worth another attempt
    pub retry_statuses: Vec<u16>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&FetchConfig::default())
    }
}

impl RetryPolicy {
    pub fn from_config(config: &FetchConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            backoff_base: Duration::from_millis(config.backoff_base_ms),
            retry_statuses: config.retry_statuses.clone(),
        }
    }

    /// Returns true if a response with this status should be retried
    pub fn is_retryable(&self, status: StatusCode) -> bool {
        self.retry_statuses.contains(&status.as_u16())
    }

    /// Wait before the given retry (1 = first retry)
    pub fn backoff(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(16);
        self.backoff_base.saturating_mul(1u32 << exponent)
    }
}

/// Builds the shared HTTP client
///
/// # Arguments
///
/// * `config` - Fetch settings (only the timeout is used here)
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &FetchConfig) -> Result<Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(BROWSER_ACCEPT));
    headers.insert(
        ACCEPT_LANGUAGE,
        HeaderValue::from_static(BROWSER_ACCEPT_LANGUAGE),
    );
    headers.insert(UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));

    Client::builder()
        .user_agent(BROWSER_USER_AGENT)
        .default_headers(headers)
        .timeout(Duration::from_secs(config.timeout_secs))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Rate-limited, retrying page fetcher
///
/// Holds the one client (and its connection pool) used for the whole run.
/// Backoff waits end early when the cancellation token fires.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    policy: RetryPolicy,
    cancel: CancellationToken,
}

impl Fetcher {
    /// Creates a fetcher from configuration
    pub fn new(config: &FetchConfig) -> Result<Self, reqwest::Error> {
        Ok(Self::with_client(
            build_http_client(config)?,
            RetryPolicy::from_config(config),
        ))
    }

    /// Creates a fetcher around an existing client
    pub fn with_client(client: Client, policy: RetryPolicy) -> Self {
        Self {
            client,
            policy,
            cancel: CancellationToken::new(),
        }
    }

    /// Ties retry waits to the crawl's cancellation token
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Fetches a URL and parses it as an HTML document
    ///
    /// Failures are logged here; callers treat them as "no data from this
    /// URL" and carry on.
    pub async fn fetch_document(&self, url: &str) -> Result<Html, FetchError> {
        match self.fetch_text(url).await {
            Ok(body) => Ok(Html::parse_document(&body)),
            Err(e) => {
                tracing::error!("Failed to fetch page: {}", e);
                Err(e)
            }
        }
    }

    /// Fetches a URL and returns its decoded body
    ///
    /// # Retry Logic
    ///
    /// | Condition | Action |
    /// |-----------|--------|
    /// | 2xx | Decode and return |
    /// | Status in retry set | Retry with backoff (or `Retry-After`) |
    /// | Other non-2xx | Fail immediately |
    /// | Connection or transport error | Retry with backoff |
    /// | Timeout | Fail immediately |
    /// | Cancelled during a wait | Fail with `Cancelled` |
    pub async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        let mut attempt = 1;

        loop {
            let wait = match self.client.get(url).send().await {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        return read_body(response, url).await;
                    }

                    if !self.policy.is_retryable(status) {
                        return Err(FetchError::Status {
                            url: url.to_string(),
                            status: status.as_u16(),
                        });
                    }

                    if attempt >= self.policy.max_attempts {
                        return Err(FetchError::Exhausted {
                            url: url.to_string(),
                            attempts: attempt,
                            last: format!("HTTP {}", status.as_u16()),
                        });
                    }

                    tracing::warn!(
                        "HTTP {} for {} (attempt {}/{}), retrying",
                        status.as_u16(),
                        url,
                        attempt,
                        self.policy.max_attempts
                    );
                    retry_after(&response).unwrap_or_else(|| self.policy.backoff(attempt))
                }
                Err(e) if e.is_timeout() => {
                    return Err(FetchError::Timeout {
                        url: url.to_string(),
                    });
                }
                Err(e) if e.is_connect() || e.is_request() => {
                    if attempt >= self.policy.max_attempts {
                        return Err(FetchError::Exhausted {
                            url: url.to_string(),
                            attempts: attempt,
                            last: e.to_string(),
                        });
                    }

                    tracing::warn!(
                        "Connection error for {} (attempt {}/{}): {}",
                        url,
                        attempt,
                        self.policy.max_attempts,
                        e
                    );
                    self.policy.backoff(attempt)
                }
                Err(e) => {
                    return Err(FetchError::Network {
                        url: url.to_string(),
                        source: e,
                    });
                }
            };

            if !polite_pause(&self.cancel, wait).await {
                return Err(FetchError::Cancelled {
                    url: url.to_string(),
                });
            }
            attempt += 1;
        }
    }
}

/// Reads a successful response body, resolving its text encoding
async fn read_body(response: Response, url: &str) -> Result<String, FetchError> {
    let declared = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(charset_from_content_type);

    let bytes = response.bytes().await.map_err(|e| {
        if e.is_timeout() {
            FetchError::Timeout {
                url: url.to_string(),
            }
        } else {
            FetchError::Network {
                url: url.to_string(),
                source: e,
            }
        }
    })?;

    Ok(decode_body(&bytes, declared.as_deref()))
}

/// Decodes a body with the declared charset, a sniffed `<meta>` charset, or UTF-8
///
/// A byte-order mark overrides both. Malformed sequences are replaced rather
/// than rejected.
pub fn decode_body(bytes: &[u8], declared: Option<&str>) -> String {
    let encoding = declared
        .and_then(|label| Encoding::for_label(label.as_bytes()))
        .or_else(|| sniff_meta_charset(bytes))
        .unwrap_or(UTF_8);

    let (text, used, had_errors) = encoding.decode(bytes);
    if had_errors {
        tracing::debug!("Replaced malformed {} sequences in body", used.name());
    }
    text.into_owned()
}

/// Extracts the `charset` parameter from a Content-Type value
fn charset_from_content_type(content_type: &str) -> Option<String> {
    content_type.split(';').skip(1).find_map(|param| {
        let (key, value) = param.split_once('=')?;
        if key.trim().eq_ignore_ascii_case("charset") {
            let value = value.trim().trim_matches(|c| c == '"' || c == '\'');
            (!value.is_empty()).then(|| value.to_string())
        } else {
            None
        }
    })
}

/// Looks for `charset=` in the head of the document
fn sniff_meta_charset(bytes: &[u8]) -> Option<&'static Encoding> {
    let window = &bytes[..bytes.len().min(SNIFF_WINDOW)];
    let head = String::from_utf8_lossy(window).to_ascii_lowercase();
    let start = head.find("charset=")? + "charset=".len();
    let label: String = head[start..]
        .trim_start_matches(|c| c == '"' || c == '\'')
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':' | '.'))
        .collect();
    Encoding::for_label(label.as_bytes())
}

/// Reads the `Retry-After` header of a response
fn retry_after(response: &Response) -> Option<Duration> {
    parse_retry_after(response.headers().get(RETRY_AFTER)?.to_str().ok()?)
}

/// Parses integer seconds, capped at [`MAX_RETRY_AFTER`]
fn parse_retry_after(value: &str) -> Option<Duration> {
    let secs = value.trim().parse::<u64>().ok()?;
    Some(Duration::from_secs(secs).min(MAX_RETRY_AFTER))
}
