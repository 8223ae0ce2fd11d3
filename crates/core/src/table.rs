//! The article table and its CSV persistence.
//!
//! The table lives in memory for the whole run and is written out wholesale:
//! at checkpoints and once more at the end. On disk it is a CSV file with a
//! `title,url,body` header, every field quoted, `\n` row terminators, and no
//! null markers (a missing value is the empty string).

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use csv::{QuoteStyle, ReaderBuilder, Terminator, WriterBuilder};
use tracing::debug;

use crate::Result;
use crate::article::ArticleRecord;
use crate::index::IndexEntry;

/// Column names, in file order.
pub const COLUMNS: [&str; 3] = ["title", "url", "body"];

/// Outcome of merging index entries into a table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    /// Rows appended for urls not yet in the table.
    pub added: usize,
    /// Existing rows whose blank title was filled from the index.
    pub titles_filled: usize,
}

/// Ordered collection of article rows.
///
/// Rows are unique by url once normalized; duplicates can exist in memory
/// between a merge and the next save.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    records: Vec<ArticleRecord>,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: Vec<ArticleRecord>) -> Self {
        Self { records }
    }

    /// Loads a table from `path`, or returns an empty one when the file does not exist.
    ///
    /// Columns are matched by header name; missing columns read as empty
    /// strings and unknown columns are ignored.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!(path = %path.display(), "table file not found, starting empty");
            return Ok(Self::new());
        }

        let mut reader = ReaderBuilder::new().has_headers(true).flexible(true).from_path(path)?;
        let headers = reader.headers()?.clone();
        let column = |name: &str| headers.iter().position(|h| h.trim() == name);
        let (title_idx, url_idx, body_idx) = (column("title"), column("url"), column("body"));

        let mut records = Vec::new();
        for row in reader.records() {
            let row = row?;
            let field = |idx: Option<usize>| idx.and_then(|i| row.get(i)).unwrap_or("").to_string();
            records.push(ArticleRecord { title: field(title_idx), url: field(url_idx), body: field(body_idx) });
        }

        debug!(path = %path.display(), rows = records.len(), "table loaded");
        Ok(Self { records })
    }

    /// Merges index entries into the table.
    ///
    /// Entries whose url is not yet present are appended with an empty body.
    /// Existing rows with a blank title take the title of the entry with the
    /// same url. Nothing else about an existing row changes.
    pub fn merge(&mut self, entries: &[IndexEntry]) -> MergeStats {
        let mut stats = MergeStats::default();
        let mut known: HashSet<String> = self.records.iter().map(|r| r.url.clone()).collect();

        for entry in entries {
            if known.insert(entry.url.clone()) {
                self.records.push(ArticleRecord::from(entry.clone()));
                stats.added += 1;
            }
        }

        let title_by_url: HashMap<&str, &str> = entries.iter().map(|e| (e.url.as_str(), e.title.as_str())).collect();
        for record in self.records.iter_mut().filter(|r| !r.has_title()) {
            if let Some(title) = title_by_url.get(record.url.as_str()) {
                record.title = (*title).to_string();
                stats.titles_filled += 1;
            }
        }

        stats
    }

    /// Indices of rows whose body is still empty, in table order.
    pub fn pending(&self) -> Vec<usize> {
        self.records
            .iter()
            .enumerate()
            .filter(|(_, r)| !r.has_body())
            .map(|(i, _)| i)
            .collect()
    }

    /// Rows as they will be persisted: empty urls dropped, first occurrence of
    /// each url kept, stable-sorted by title.
    pub fn normalized(&self) -> Vec<&ArticleRecord> {
        let mut seen = HashSet::new();
        let mut rows: Vec<&ArticleRecord> = self
            .records
            .iter()
            .filter(|r| !r.url.trim().is_empty())
            .filter(|r| seen.insert(r.url.as_str()))
            .collect();

        rows.sort_by(|a, b| a.title.cmp(&b.title));
        rows
    }

    /// Replaces the in-memory rows with their normalized form.
    pub fn normalize(&mut self) {
        let rows = self.normalized().into_iter().cloned().collect();
        self.records = rows;
    }

    /// Writes the normalized table to `path`.
    ///
    /// The file is written next to `path` first and then renamed over it, so a
    /// crash mid-write leaves the previous version intact. Returns the number of
    /// rows written.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<usize> {
        let path = path.as_ref();
        let tmp = temp_path(path);
        let rows = self.normalized();

        let mut writer = WriterBuilder::new()
            .quote_style(QuoteStyle::Always)
            .terminator(Terminator::Any(b'\n'))
            .from_path(&tmp)?;

        writer.write_record(COLUMNS)?;
        for row in &rows {
            writer.write_record([row.title.as_str(), row.url.as_str(), row.body.as_str()])?;
        }
        writer.flush()?;
        drop(writer);

        fs::rename(&tmp, path)?;
        debug!(path = %path.display(), rows = rows.len(), "table saved");
        Ok(rows.len())
    }

    pub fn records(&self) -> &[ArticleRecord] {
        &self.records
    }

    pub fn get(&self, idx: usize) -> Option<&ArticleRecord> {
        self.records.get(idx)
    }

    pub fn get_mut(&mut self, idx: usize) -> Option<&mut ArticleRecord> {
        self.records.get_mut(idx)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
