//! Year-page walker
//!
//! Given one entity, loads its detail page, discovers the year-selector
//! links, and extracts one [`YearRecord`] per year page. Any failure below the
//! entity (a bad link, an unreachable year page) costs only that year.

use crate::crawler::fetcher::Fetcher;
use crate::crawler::parser::{resolve_href, year_links, PageLink};
use crate::metrics::{Entity, MetricExtractor, YearRecord};
use crate::{HarvestError, Result};
use std::collections::BTreeSet;
use std::fmt;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Set of year labels a crawl is restricted to
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct YearFilter(BTreeSet<String>);

impl YearFilter {
    /// Returns true if `year` (trimmed) is requested
    pub fn contains(&self, year: &str) -> bool {
        self.0.contains(year.trim())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for YearFilter {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(|s| s.into().trim().to_string()).collect())
    }
}

impl fmt::Display for YearFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let years: Vec<&str> = self.iter().collect();
        write!(f, "[{}]", years.join(", "))
    }
}

/// Sleeps for `delay` unless the crawl is cancelled first
///
/// Returns false if cancellation cut the pause short.
pub(crate) async fn polite_pause(cancel: &CancellationToken, delay: Duration) -> bool {
    if delay.is_zero() {
        return !cancel.is_cancelled();
    }

    tokio::select! {
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(delay) => true,
    }
}

/// Walks the year pages of single entities
///
/// Borrowed from the coordinator for the duration of a crawl.
pub struct YearWalker<'a> {
    pub(crate) fetcher: &'a Fetcher,
    pub(crate) extractor: &'a MetricExtractor,
    pub(crate) site_root: &'a Url,
    pub(crate) year_delay: Duration,
    pub(crate) cancel: &'a CancellationToken,
}

impl<'a> YearWalker<'a> {
    pub fn new(
        fetcher: &'a Fetcher,
        extractor: &'a MetricExtractor,
        site_root: &'a Url,
        year_delay: Duration,
        cancel: &'a CancellationToken,
    ) -> Self {
        Self {
            fetcher,
            extractor,
            site_root,
            year_delay,
            cancel,
        }
    }

    /// Collects the records of every (optionally filtered) year of `entity`
    ///
    /// Returns an empty vector if the detail page cannot be fetched, has no
    /// year links, or has none matching `years`. On cancellation, the
    /// records gathered so far are returned.
    pub async fn walk(&self, entity: &Entity, years: Option<&YearFilter>) -> Vec<YearRecord> {
        let mut records = Vec::new();

        let all_links = match self.fetcher.fetch_document(entity.url.as_str()).await {
            Ok(document) => year_links(&document),
            Err(_) => {
                tracing::warn!("Skipping {}: detail page unavailable", entity);
                return records;
            }
        };

        if all_links.is_empty() {
            tracing::debug!("No year links on {} ({})", entity, entity.url);
            return records;
        }

        let links = match years.filter(|filter| !filter.is_empty()) {
            Some(filter) => {
                let kept = select_years(&all_links, filter);
                if kept.is_empty() {
                    tracing::info!("No links for years {} on {}", filter, entity);
                    return records;
                }
                kept
            }
            None => all_links,
        };

        tracing::debug!("{}: {} year pages to visit", entity, links.len());

        for link in &links {
            if self.cancel.is_cancelled() {
                tracing::info!("Interrupted while walking {}", entity);
                return records;
            }

            let (year, Some(href)) = (link.text.as_str(), link.href.as_deref()) else {
                continue;
            };
            if year.is_empty() {
                continue;
            }

            match self.process_year(entity, year, href).await {
                Ok(Some(record)) => records.push(record),
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!("Skipping year link {:?} of {}: {}", link, entity, e);
                    continue;
                }
            }

            if !polite_pause(self.cancel, self.year_delay).await {
                tracing::info!("Interrupted while walking {}", entity);
                return records;
            }
        }

        records
    }

    /// Fetches and extracts one year page
    ///
    /// `Ok(None)` covers unreachable year pages and pages that yielded no data.
    async fn process_year(
        &self,
        entity: &Entity,
        year: &str,
        href: &str,
    ) -> Result<Option<YearRecord>> {
        let year_url = resolve_href(self.site_root, href).ok_or_else(|| HarvestError::BadLink {
            href: href.to_string(),
            page: entity.url.to_string(),
        })?;

        let metrics = match self.fetcher.fetch_document(year_url.as_str()).await {
            Ok(document) => self.extractor.extract(&document),
            Err(_) => return Ok(None),
        };

        let record = YearRecord::from_metrics(entity, year, &year_url, metrics);
        if record.is_none() {
            tracing::debug!("{} {}: page had no usable data", entity, year);
        }
        Ok(record)
    }
}

/// Keeps the links whose text is one of the requested years
fn select_years(links: &[PageLink], filter: &YearFilter) -> Vec<PageLink> {
    let kept: Vec<PageLink> = links
        .iter()
        .filter(|link| filter.contains(&link.text))
        .cloned()
        .collect();

    let missing: Vec<&str> = filter
        .iter()
        .filter(|year| !kept.iter().any(|link| link.text == *year))
        .collect();
    if !missing.is_empty() && !kept.is_empty() {
        tracing::debug!("Years not offered: {}", missing.join(", "));
    }

    kept
}
