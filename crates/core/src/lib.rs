pub mod article;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod harvest;
pub mod index;
pub mod metadata;
pub mod parse;
pub mod table;

pub use article::ArticleRecord;
pub use error::{GleanerError, Result};
pub use extract::{
    BlockKind, ExtractConfig, ExtractionWindow, extract_article, extract_body, extract_body_from_html, find_window,
    locate_container, normalize_whitespace, render_block,
};
#[cfg(feature = "fetch")]
pub use fetch::Fetcher;
pub use fetch::{FetchConfig, PageSource, fetch_file, fetch_stdin};
pub use harvest::{FillStats, HarvestConfig, crawl_index, fill_bodies};
pub use index::{IndexConfig, IndexEntry, listing_page_url, parse_index_page};
pub use metadata::PageMeta;
pub use parse::{Document, Element};
pub use table::{MergeStats, Table};
