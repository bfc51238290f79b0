//! HTML helpers for the listing and detail pages
//!
//! This module handles the navigation markup of the site:
//! - The three entity lists on the listing page (`ul#continent-list`, ...)
//! - Year-selector links on an entity's detail page (`a.yclick`)
//! - Resolving relative links against the site root

use crate::metrics::Category;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// An `<a>` element reduced to its trimmed text and raw `href`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLink {
    pub text: String,
    pub href: Option<String>,
}

impl PageLink {
    fn from_element(element: ElementRef<'_>) -> Self {
        Self {
            text: element.text().collect::<String>().trim().to_string(),
            href: element
                .value()
                .attr("href")
                .map(|h| h.trim().to_string())
                .filter(|h| !h.is_empty()),
        }
    }
}

/// Extracts the entity links of one category from the listing page
///
/// # Returns
///
/// * `Some(links)` - The category's list exists (it may be empty)
/// * `None` - The page has no list for this category
///
/// # Example
///
/// ```
/// use ewaste_harvest::crawler::entity_links;
/// use ewaste_harvest::Category;
/// use scraper::Html;
///
/// let html = r#"<ul id="continent-list"><li><a href="/europe">Europe</a></li></ul>"#;
/// let document = Html::parse_document(html);
/// let links = entity_links(&document, Category::Continent).unwrap();
/// assert_eq!(links[0].text, "Europe");
/// assert!(entity_links(&document, Category::Country).is_none());
/// ```
pub fn entity_links(document: &Html, category: Category) -> Option<Vec<PageLink>> {
    let list_selector = Selector::parse(&format!("ul#{}", category.list_id())).ok()?;
    let anchor_selector = Selector::parse("a").ok()?;

    let list = document.select(&list_selector).next()?;
    Some(
        list.select(&anchor_selector)
            .map(PageLink::from_element)
            .collect(),
    )
}

/// Extracts every year-selector link from an entity detail page
pub fn year_links(document: &Html) -> Vec<PageLink> {
    let Ok(selector) = Selector::parse("a.yclick") else {
        return Vec::new();
    };

    document.select(&selector).map(PageLink::from_element).collect()
}

/// Resolves a link `href` to an absolute URL on the site
///
/// Hrefs that already start with `http` are used as-is. Anything else is
/// treated as a path from the site root, gaining a leading `/` if missing.
///
/// Returns None for empty hrefs, non-HTTP schemes and unparseable URLs.
pub fn resolve_href(site_root: &Url, href: &str) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() {
        return None;
    }

    let resolved = if href.starts_with("http") {
        Url::parse(href).ok()?
    } else if href.starts_with('/') {
        site_root.join(href).ok()?
    } else {
        site_root.join(&format!("/{}", href)).ok()?
    };

    // Only accept HTTP and HTTPS URLs
    match resolved.scheme() {
        "http" | "https" => Some(resolved),
        _ => None,
    }
}
