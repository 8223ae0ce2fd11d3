//! The persisted unit of a harvest.
//!
//! An [`ArticleRecord`] is one row of the article table: the title and url
//! discovered on a listing page plus the body extracted from the article page.
//! The body stays empty until extraction succeeds.

use serde::Serialize;

use crate::index::IndexEntry;
use crate::{GleanerError, Result};

/// One article row, uniquely identified by its url.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ArticleRecord {
    pub title: String,
    pub url: String,
    pub body: String,
}

impl ArticleRecord {
    pub fn new(title: impl Into<String>, url: impl Into<String>, body: impl Into<String>) -> Self {
        Self { title: title.into(), url: url.into(), body: body.into() }
    }

    /// Whether the body has been filled; whitespace-only counts as empty.
    pub fn has_body(&self) -> bool {
        !self.body.trim().is_empty()
    }

    pub fn has_title(&self) -> bool {
        !self.title.trim().is_empty()
    }

    /// Gets the record as structured JSON.
    pub fn to_json(&self) -> Result<serde_json::Value> {
        serde_json::to_value(self).map_err(|e| GleanerError::SerializeError(e.to_string()))
    }
}

impl From<IndexEntry> for ArticleRecord {
    fn from(entry: IndexEntry) -> Self {
        Self { title: entry.title, url: entry.url, body: String::new() }
    }
}
