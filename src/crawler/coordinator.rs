//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the main crawl loop that coordinates all aspects of
//! the collection run, including:
//! - Fetching the listing page and discovering entities per category
//! - Narrowing the crawl to a sample scope when requested
//! - Driving the year walker for each entity with polite pauses
//! - Handling interrupts by returning partial results

use crate::config::{validate, Config, SampleConfig};
use crate::crawler::fetcher::Fetcher;
use crate::crawler::parser::{entity_links, resolve_href, PageLink};
use crate::crawler::walker::{polite_pause, YearFilter, YearWalker};
use crate::metrics::{Category, Entity, MetricExtractor, YearRecord};
use crate::{HarvestError, Result};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Entities and years a collection run covers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrawlScope {
    /// Every listed entity, optionally restricted to some years
    Full { years: Option<YearFilter> },

    /// A bounded validation crawl over named entities and years
    Sample(SampleTargets),
}

impl CrawlScope {
    /// Year restriction handed to the walker
    ///
    /// An empty filter means every year.
    pub fn years(&self) -> Option<&YearFilter> {
        let years = match self {
            Self::Full { years } => years.as_ref(),
            Self::Sample(targets) => Some(&targets.years),
        };
        years.filter(|filter| !filter.is_empty())
    }

    /// Returns true if the named entity is part of this scope
    pub fn includes(&self, category: Category, name: &str) -> bool {
        match self {
            Self::Full { .. } => true,
            Self::Sample(targets) => targets.includes(category, name),
        }
    }

    pub fn is_sample(&self) -> bool {
        matches!(self, Self::Sample(_))
    }
}

/// Named entities and years of a sample run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleTargets {
    pub years: YearFilter,
    pub continents: Vec<String>,
    pub regions: Vec<String>,
    pub countries: Vec<String>,
}

impl SampleTargets {
    pub fn from_config(config: &SampleConfig) -> Self {
        Self {
            years: config.years.iter().cloned().collect(),
            continents: config.continents.clone(),
            regions: config.regions.clone(),
            countries: config.countries.clone(),
        }
    }

    /// Target names for one category
    pub fn names(&self, category: Category) -> &[String] {
        match category {
            Category::Continent => &self.continents,
            Category::Region => &self.regions,
            Category::Country => &self.countries,
        }
    }

    pub fn includes(&self, category: Category, name: &str) -> bool {
        self.names(category).iter().any(|n| n == name)
    }

    /// Total number of named entities
    pub fn len(&self) -> usize {
        Category::ALL.iter().map(|c| self.names(*c).len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Main crawler coordinator structure
///
/// Owns the fetcher, compiled selectors and the cancellation token for a
/// collection run. The run's record accumulator lives inside [`collect`]
/// and is returned whole.
///
/// [`collect`]: Coordinator::collect
pub struct Coordinator {
    config: Config,
    fetcher: Fetcher,
    extractor: MetricExtractor,
    site_root: Url,
    cancel: CancellationToken,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `config` - The harvester configuration
    /// * `cancel` - Token that interrupts the crawl when cancelled
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(HarvestError)` - Invalid configuration, or failed to build the client
    pub fn new(config: Config, cancel: CancellationToken) -> Result<Self> {
        let fetcher = Fetcher::new(&config.fetch)?;
        Self::with_fetcher(config, fetcher, cancel)
    }

    /// Creates a coordinator around an existing fetcher
    ///
    /// The configuration is validated first, so settings changed after
    /// loading (such as a CLI output override) are checked too. The
    /// fetcher's retry waits are tied to `cancel`.
    pub fn with_fetcher(
        config: Config,
        fetcher: Fetcher,
        cancel: CancellationToken,
    ) -> Result<Self> {
        validate(&config)?;
        let site_root = Url::parse(&config.site.site_root)?;
        let extractor = MetricExtractor::new()?;

        Ok(Self {
            config,
            fetcher: fetcher.with_cancellation(cancel.clone()),
            extractor,
            site_root,
            cancel,
        })
    }

    /// Builds the scope for this run
    ///
    /// `sample` selects the configured sample targets; otherwise `years`
    /// (possibly empty) restricts a full crawl.
    pub fn scope(&self, sample: bool, years: Vec<String>) -> CrawlScope {
        if sample {
            CrawlScope::Sample(SampleTargets::from_config(&self.config.sample))
        } else if years.is_empty() {
            CrawlScope::Full { years: None }
        } else {
            CrawlScope::Full {
                years: Some(years.into_iter().collect()),
            }
        }
    }

    /// Collects records from the configured listing page
    pub async fn collect(&self, scope: &CrawlScope) -> Vec<YearRecord> {
        let base_url = self.config.site.base_url.clone();
        self.collect_from(&base_url, scope).await
    }

    /// Collects every record reachable from `base_url` within `scope`
    ///
    /// Only a failure to fetch the listing page ends the run early; every
    /// lower-level failure costs at most one entity. On interrupt, the
    /// records accumulated so far are returned.
    pub async fn collect_from(&self, base_url: &str, scope: &CrawlScope) -> Vec<YearRecord> {
        let mut records = Vec::new();

        tracing::info!("Collecting from {}", base_url);
        if let Some(years) = scope.years() {
            tracing::info!("Restricted to years {}", years);
        }

        let entities = match self.fetcher.fetch_document(base_url).await {
            Ok(document) => self.discover_entities(&document, scope),
            Err(_) => {
                tracing::error!("Could not fetch the listing page, stopping");
                return records;
            }
        };

        let total = entities.len();
        tracing::info!("{} entities to process", total);

        let walker = YearWalker::new(
            &self.fetcher,
            &self.extractor,
            &self.site_root,
            Duration::from_millis(self.config.crawl.year_delay_ms),
            &self.cancel,
        );
        let entity_delay = Duration::from_millis(if scope.is_sample() {
            self.config.crawl.sample_entity_delay_ms
        } else {
            self.config.crawl.entity_delay_ms
        });

        for (i, (category, link)) in entities.iter().enumerate() {
            if self.cancel.is_cancelled() {
                tracing::warn!("Interrupted, returning {} records", records.len());
                return records;
            }

            tracing::info!("({}/{}) Fetching {}-{}", i + 1, total, category, link.text);

            match self.process_entity(&walker, *category, link, scope).await {
                Ok(mut found) => {
                    if found.is_empty() && scope.is_sample() {
                        tracing::info!("No data for {}-{}", category, link.text);
                    }
                    records.append(&mut found);
                }
                Err(e) => {
                    tracing::error!(
                        "Error processing {}-{} ({:?}): {}",
                        category,
                        link.text,
                        link.href,
                        e
                    );
                    continue;
                }
            }

            if !polite_pause(&self.cancel, entity_delay).await {
                tracing::warn!("Interrupted, returning {} records", records.len());
                return records;
            }
        }

        tracing::info!("Collection finished with {} records", records.len());
        records
    }

    /// Lists the in-scope entity links of every category, in crawl order
    fn discover_entities(
        &self,
        document: &scraper::Html,
        scope: &CrawlScope,
    ) -> Vec<(Category, PageLink)> {
        let mut entities = Vec::new();

        for category in Category::ALL {
            let Some(links) = entity_links(document, category) else {
                tracing::warn!("No {} list on the listing page", category);
                continue;
            };

            let in_scope: Vec<PageLink> = links
                .into_iter()
                .filter(|link| scope.includes(category, &link.text))
                .collect();

            if let CrawlScope::Sample(targets) = scope {
                tracing::info!(
                    "{}: targets {:?}, {} matching links",
                    category,
                    targets.names(category),
                    in_scope.len()
                );
            } else {
                tracing::info!("{}: {} entities", category, in_scope.len());
            }

            entities.extend(in_scope.into_iter().map(|link| (category, link)));
        }

        entities
    }

    /// Resolves one entity and walks its years
    async fn process_entity(
        &self,
        walker: &YearWalker<'_>,
        category: Category,
        link: &PageLink,
        scope: &CrawlScope,
    ) -> Result<Vec<YearRecord>> {
        let href = link.href.as_deref().ok_or_else(|| HarvestError::BadLink {
            href: String::new(),
            page: format!("{}-{}", category, link.text),
        })?;

        let url = resolve_href(&self.site_root, href).ok_or_else(|| HarvestError::BadLink {
            href: href.to_string(),
            page: format!("{}-{}", category, link.text),
        })?;

        let entity = Entity {
            category,
            name: link.text.clone(),
            url,
        };

        Ok(walker.walk(&entity, scope.years()).await)
    }
}

/// Runs a complete collection with a fresh coordinator
///
/// # Example
///
/// ```no_run
/// use ewaste_harvest::config::Config;
/// use ewaste_harvest::crawler::{run_collection, CrawlScope};
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let scope = CrawlScope::Full { years: None };
/// let records = run_collection(Config::default(), &scope, CancellationToken::new()).await?;
/// println!("{} records", records.len());
/// # Ok(())
/// # }
/// ```
pub async fn run_collection(
    config: Config,
    scope: &CrawlScope,
    cancel: CancellationToken,
) -> Result<Vec<YearRecord>> {
    let coordinator = Coordinator::new(config, cancel)?;
    Ok(coordinator.collect(scope).await)
}
