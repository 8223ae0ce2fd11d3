//! Listing page parsing.
//!
//! A listing page is a grid of cards, each wrapping a link whose heading holds
//! the article title:
//!
//! ```html
//! <div class="card h-100 box1">
//!     <a href="https://example.org/post/">
//!         <h5 class="card-title">Title</h5>
//!     </a>
//! </div>
//! ```

use std::collections::HashSet;

use url::Url;

use crate::Result;
use crate::parse::Document;

/// One card from a listing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    pub title: String,
    pub url: String,
}

impl IndexEntry {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self { title: title.into(), url: url.into() }
    }
}

/// Selectors used to find cards on a listing page.
#[derive(Debug, Clone)]
pub struct IndexConfig {
    /// Links nested inside card containers.
    pub card_link_selector: String,
    /// Heading inside the link carrying the card title.
    pub title_selector: String,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self { card_link_selector: "div.card.h-100.box1 a[href]".to_string(), title_selector: ".card-title".to_string() }
    }
}

/// Parses one listing page into index entries, in document order.
///
/// Cards without a non-empty url or title are dropped. When `base` is given,
/// relative hrefs are resolved against it; absolute hrefs are kept as-is.
///
/// # Example
///
/// ```rust
/// use gleaner_core::{IndexConfig, parse_index_page};
///
/// let html = r#"<div class="card h-100 box1"><a href="/p/1"><h5 class="card-title"> One </h5></a></div>"#;
/// let entries = parse_index_page(html, None, &IndexConfig::default()).unwrap();
/// assert_eq!(entries[0].title, "One");
/// assert_eq!(entries[0].url, "/p/1");
/// ```
pub fn parse_index_page(html: &str, base: Option<&Url>, config: &IndexConfig) -> Result<Vec<IndexEntry>> {
    let doc = Document::parse(html)?;
    let mut entries = Vec::new();

    for link in doc.select(&config.card_link_selector)? {
        let href = link.attr("href").unwrap_or("").trim();
        let title = match link.select_first(&config.title_selector)? {
            Some(heading) => heading.flattened_text(),
            None => String::new(),
        };

        if href.is_empty() || title.is_empty() {
            continue;
        }

        entries.push(IndexEntry { title, url: resolve_href(href, base) });
    }

    Ok(entries)
}

fn resolve_href(href: &str, base: Option<&Url>) -> String {
    if Url::parse(href).is_ok() {
        return href.to_string();
    }

    match base.and_then(|b| b.join(href).ok()) {
        Some(joined) => joined.to_string(),
        None => href.to_string(),
    }
}

/// URL of listing page `page` (1-based).
///
/// Page 1 is the listing root itself; later pages live under `/page/N/`.
pub fn listing_page_url(root: &str, page: usize) -> String {
    if page <= 1 {
        root.to_string()
    } else {
        format!("{}/page/{}/", root.trim_end_matches('/'), page)
    }
}

/// Appends `entries` to `out`, skipping urls already in `seen`. First occurrence wins.
///
/// Returns how many entries were appended.
pub fn push_unique(out: &mut Vec<IndexEntry>, seen: &mut HashSet<String>, entries: Vec<IndexEntry>) -> usize {
    let before = out.len();
    for entry in entries {
        if seen.insert(entry.url.clone()) {
            out.push(entry);
        }
    }
    out.len() - before
}
