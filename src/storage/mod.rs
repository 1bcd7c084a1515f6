//! Storage module for fetched pages and the run log
//!
//! # Components
//!
//! - `ContentStore`: raw response bodies under `<root>/<sha1(url)>.<ext>`
//! - `RunLogger`: append-only CSV audit log, one row per terminal outcome
//! - `LogSink`: a single writer task that owns the `RunLogger` and serializes appends

mod content;
mod run_log;
mod sink;

pub use content::{ContentStore, StoredPage};
pub use run_log::{LogEntry, RunLogger, LOG_HEADER};
pub use sink::LogSink;

use sha1::{Digest, Sha1};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error at {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Log sink is closed")]
    SinkClosed,
}

impl StorageError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Hex SHA-1 of a URL's serialized form
///
/// This is the identity every per-URL file is keyed by: raw pages and
/// extracted records alike. Callers pass `Url::as_str`, so the key is the
/// normalized URL rather than the input text: a cell reading
/// `https://example.com` is stored under `sha1("https://example.com/")`.
/// Files keyed by the raw input text will not line up with these names.
///
/// # Examples
///
/// ```
/// use scrape_batch::storage::url_digest;
///
/// let digest = url_digest("http://a.test/ok");
/// assert_eq!(digest.len(), 40);
/// assert_eq!(digest, url_digest("http://a.test/ok"));
/// ```
pub fn url_digest(url: &str) -> String {
    hex::encode(Sha1::digest(url.as_bytes()))
}
