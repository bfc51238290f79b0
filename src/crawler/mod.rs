//! Crawler module for the country-sheet site
//!
//! This module contains the collection pipeline, including:
//! - HTTP fetching with retry logic and encoding resolution
//! - Navigation markup parsing (entity lists, year links)
//! - Per-entity year walking with polite delays
//! - Overall crawl coordination and interrupt handling

mod coordinator;
mod fetcher;
mod parser;
mod walker;

pub use coordinator::{run_collection, Coordinator, CrawlScope, SampleTargets};
pub use fetcher::{
    build_http_client, decode_body, FetchError, Fetcher, RetryPolicy, BROWSER_USER_AGENT,
    MAX_RETRY_AFTER,
};
pub use parser::{entity_links, resolve_href, year_links, PageLink};
pub use walker::{YearFilter, YearWalker};
