//! Error types for Gleaner operations.
//!
//! This module defines the main error type [`GleanerError`] which represents
//! all possible errors that can occur while fetching pages, parsing markup,
//! and reading or writing the article table.
//!
//! Most of these are not fatal to a harvest run: fetch failures and block
//! rendering failures are logged and the run moves on to the next row.
//!
//! # Example
//!
//! ```rust
//! use gleaner_core::{GleanerError, Result};
//!
//! fn require_url(url: &str) -> Result<&str> {
//!     if url.trim().is_empty() {
//!         return Err(GleanerError::InvalidUrl("empty url".to_string()));
//!     }
//!     Ok(url)
//! }
//! # assert!(require_url("").is_err());
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for harvesting and extraction operations.
#[derive(Error, Debug)]
pub enum GleanerError {
    /// HTTP request errors from reqwest.
    ///
    /// This variant wraps network errors, DNS failures, connection issues,
    /// and other transport-level problems.
    #[cfg(feature = "fetch")]
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Request timeout.
    ///
    /// Returned when an HTTP request exceeds the configured socket timeout.
    #[error("Request timed out after {timeout} seconds")]
    Timeout { timeout: u64 },

    /// Invalid URL provided.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The server answered with something other than `200 OK`.
    #[error("Unexpected HTTP status {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    /// The server answered `200 OK` with an empty body.
    #[error("Empty response body from {0}")]
    EmptyResponse(String),

    /// Every attempt in the retry budget failed.
    ///
    /// The row that needed this page is left unfilled; a later run picks it up again.
    #[error("Fetching {url} failed after {attempts} attempts")]
    FetchFailed { url: String, attempts: u32 },

    /// HTML parsing errors.
    ///
    /// Returned for invalid CSS selectors and for content blocks that could not
    /// be rendered to text.
    #[error("Failed to parse HTML: {0}")]
    HtmlParseError(String),

    /// File not found.
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// File read/write errors.
    #[error("Failed to write to file: {0}")]
    WriteError(#[from] std::io::Error),

    /// Errors reading or writing the article table.
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    /// Errors serializing a record for output.
    #[error("Serialization error: {0}")]
    SerializeError(String),
}

/// Result type alias for GleanerError.
///
/// This is a convenience alias for `std::result::Result<T, GleanerError>`.
pub type Result<T> = std::result::Result<T, GleanerError>;
