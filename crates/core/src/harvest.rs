//! Index crawling and body filling.
//!
//! Both loops are strictly sequential: one request at a time, a short pause
//! after each successful fetch, and failures logged and skipped rather than
//! aborting the run. Page retrieval goes through a [`PageSource`], so the HTTP
//! client (or a test double) is always passed in explicitly.

use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use indicatif::ProgressBar;
use tracing::{debug, info, warn};
use url::Url;

use crate::extract::{ExtractConfig, extract_article};
use crate::fetch::PageSource;
use crate::index::{IndexConfig, IndexEntry, listing_page_url, parse_index_page, push_unique};
use crate::table::Table;

/// Settings for one harvest run.
#[derive(Debug, Clone)]
pub struct HarvestConfig {
    /// Listing root; page N lives at `<root>/page/N/`.
    pub list_root: String,
    /// Number of listing pages to scan, starting at 1.
    pub pages: usize,
    /// Fill at most this many empty-body rows.
    pub limit: Option<usize>,
    /// Save the table after this many processed rows.
    pub checkpoint_every: Option<usize>,
    /// Pause after each successful fetch.
    pub delay: Duration,
    pub index: IndexConfig,
    pub extract: ExtractConfig,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            list_root: "https://aps-repo.bvs.br/aps".to_string(),
            pages: 117,
            limit: None,
            checkpoint_every: None,
            delay: Duration::from_millis(200),
            index: IndexConfig::default(),
            extract: ExtractConfig::default(),
        }
    }
}

/// Counters from [`fill_bodies`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FillStats {
    /// Rows for which a fetch was attempted.
    pub attempted: usize,
    /// Rows that ended up with a non-empty body.
    pub filled: usize,
    /// Rows whose page was fetched but yielded no body.
    pub empty: usize,
    /// Rows skipped because the page could not be fetched or parsed.
    pub failed: usize,
    /// Checkpoint saves that succeeded.
    pub checkpoints: usize,
}

/// Crawls listing pages `1..=config.pages` and returns their entries,
/// deduplicated by url with the first occurrence kept. The listing root is
/// always fetched, even when `config.pages` is zero.
///
/// Pages that cannot be fetched or parsed are logged and skipped.
pub async fn crawl_index<S: PageSource>(source: &S, config: &HarvestConfig, progress: &ProgressBar) -> Vec<IndexEntry> {
    let pages = config.pages.max(1);
    let mut entries = Vec::new();
    let mut seen = HashSet::new();

    progress.set_length(pages as u64);
    progress.set_message("Collecting index");

    for page in 1..=pages {
        let page_url = listing_page_url(&config.list_root, page);
        progress.inc(1);

        let html = match source.fetch(&page_url).await {
            Ok(html) => html,
            Err(e) => {
                warn!(url = %page_url, error = %e, "skipping listing page");
                continue;
            }
        };

        let base = Url::parse(&page_url).ok();
        match parse_index_page(&html, base.as_ref(), &config.index) {
            Ok(found) => {
                let total = found.len();
                let added = push_unique(&mut entries, &mut seen, found);
                debug!(page, total, added, "listing page parsed");
            }
            Err(e) => warn!(url = %page_url, error = %e, "failed to parse listing page"),
        }

        if page > 1 {
            tokio::time::sleep(config.delay).await;
        }
    }

    progress.finish_and_clear();
    info!(pages, entries = entries.len(), "index collected");
    entries
}

/// Fetches and extracts the body of every row whose body is empty.
///
/// Rows that already have a body are never touched, so running this twice is
/// harmless. For each processed row a blank title is filled from the page
/// heading and the url is replaced by the page's canonical url when they
/// differ. When both `config.checkpoint_every` and `checkpoint` are set, the
/// table is saved to `checkpoint` every N processed rows; a failed checkpoint
/// is logged and the run continues.
pub async fn fill_bodies<S: PageSource>(
    source: &S, table: &mut Table, config: &HarvestConfig, checkpoint: Option<&Path>, progress: &ProgressBar,
) -> FillStats {
    let mut pending = table.pending();
    if let Some(limit) = config.limit {
        pending.truncate(limit);
    }

    let mut stats = FillStats::default();
    let mut since_checkpoint = 0usize;

    progress.set_length(pending.len() as u64);
    progress.set_message("Filling bodies");

    for idx in pending {
        progress.inc(1);

        let url = match table.get(idx) {
            Some(record) => record.url.trim().to_string(),
            None => continue,
        };
        if url.is_empty() {
            continue;
        }

        stats.attempted += 1;
        let html = match source.fetch(&url).await {
            Ok(html) => html,
            Err(e) => {
                warn!(url = %url, error = %e, "leaving row unfilled");
                stats.failed += 1;
                continue;
            }
        };

        let article = match extract_article(&html, &url, &config.extract) {
            Ok(article) => article,
            Err(e) => {
                warn!(url = %url, error = %e, "extraction failed");
                stats.failed += 1;
                continue;
            }
        };

        if let Some(record) = table.get_mut(idx) {
            if !article.title.is_empty() && !record.has_title() {
                record.title = article.title;
            }
            if !article.url.is_empty() && article.url != url {
                debug!(from = %url, to = %article.url, "using canonical url");
                record.url = article.url;
            }
            record.body = article.body;

            if record.has_body() {
                stats.filled += 1;
            } else {
                debug!(url = %url, "no body found");
                stats.empty += 1;
            }
        }

        since_checkpoint += 1;
        if let (Some(every), Some(path)) = (config.checkpoint_every, checkpoint)
            && every > 0
            && since_checkpoint >= every
        {
            match table.save(path) {
                Ok(rows) => {
                    info!(path = %path.display(), rows, "checkpoint saved");
                    stats.checkpoints += 1;
                }
                Err(e) => warn!(path = %path.display(), error = %e, "checkpoint failed"),
            }
            since_checkpoint = 0;
        }

        tokio::time::sleep(config.delay).await;
    }

    progress.finish_and_clear();
    info!(
        attempted = stats.attempted,
        filled = stats.filled,
        empty = stats.empty,
        failed = stats.failed,
        "body fill finished"
    );
    stats
}
