use crate::storage::{StorageError, StorageResult};
use chrono::{DateTime, SecondsFormat, Utc};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Column order of the run log
pub const LOG_HEADER: [&str; 7] = [
    "timestamp",
    "url",
    "status_code",
    "latency_s",
    "retries",
    "filename",
    "error",
];

/// One row of the run log: the terminal outcome of one URL
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub url: String,
    pub status_code: Option<u16>,
    pub latency: Option<Duration>,
    /// Attempt index at termination (`max_retries` when exhausted)
    pub retries: u32,
    /// Stored page path; empty on failure
    pub filename: Option<String>,
    /// Terminal error; empty on success
    pub error: Option<String>,
}

impl LogEntry {
    /// Creates an entry stamped with the current time
    pub fn now(url: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            url: url.into(),
            status_code: None,
            latency: None,
            retries: 0,
            filename: None,
            error: None,
        }
    }

    /// The CSV cells for this entry, in [`LOG_HEADER`] order
    pub fn to_record(&self) -> [String; 7] {
        [
            self.timestamp.to_rfc3339_opts(SecondsFormat::Micros, true),
            self.url.clone(),
            self.status_code.map(|s| s.to_string()).unwrap_or_default(),
            self.latency
                .map(|l| format!("{:.3}", l.as_secs_f64()))
                .unwrap_or_default(),
            self.retries.to_string(),
            self.filename.clone().unwrap_or_default(),
            self.error.clone().unwrap_or_default(),
        ]
    }
}

/// Append-only CSV audit log
///
/// The file is opened in append mode for every entry and the header is
/// written once, when the file is absent or empty. There is no coordination
/// between writers; share a logger through a [`crate::storage::LogSink`].
#[derive(Debug)]
pub struct RunLogger {
    path: PathBuf,
}

impl RunLogger {
    /// Prepares a logger at `path`, creating parent directories
    pub fn open(path: impl Into<PathBuf>) -> StorageResult<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| StorageError::io(parent, e))?;
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one row, writing the header first if the log is empty
    pub fn append(&mut self, entry: &LogEntry) -> StorageResult<()> {
        let needs_header = std::fs::metadata(&self.path)
            .map(|meta| meta.len() == 0)
            .unwrap_or(true);

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| StorageError::io(&self.path, e))?;

        let mut writer = csv::Writer::from_writer(file);
        if needs_header {
            writer.write_record(LOG_HEADER)?;
        }
        writer.write_record(entry.to_record())?;
        writer.flush().map_err(|e| StorageError::io(&self.path, e))?;

        Ok(())
    }
}
