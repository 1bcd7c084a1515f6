//! Target list loading
//!
//! The input is a CSV file with a `url` column. Other columns are ignored,
//! blank cells are skipped, and cells that are not absolute HTTP(S) URLs are
//! reported back to the caller instead of failing the load.

use crate::url::{dedup_preserving_order, parse_target};
use crate::{ScrapeError, UrlError};
use std::io::Read;
use std::path::Path;
use url::Url;

/// Name of the required input column
pub const URL_COLUMN: &str = "url";

/// A cell that could not be used as a target
#[derive(Debug)]
pub struct RejectedRow {
    /// 1-based data row number (the header is row 0)
    pub row: usize,
    pub value: String,
    pub error: UrlError,
}

/// Targets read from an input file
#[derive(Debug, Default)]
pub struct TargetList {
    /// Valid URLs, deduplicated, first occurrence order
    pub urls: Vec<Url>,
    /// Valid URLs dropped as repeats
    pub duplicates: usize,
    pub rejected: Vec<RejectedRow>,
}

/// Loads targets from a CSV file
pub fn load_urls(path: &Path) -> Result<TargetList, ScrapeError> {
    let file = std::fs::File::open(path)?;
    read_urls(file)
}

/// Loads targets from any CSV source
pub fn read_urls<R: Read>(source: R) -> Result<TargetList, ScrapeError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(source);

    let column = reader
        .headers()?
        .iter()
        .position(|h| h.eq_ignore_ascii_case(URL_COLUMN))
        .ok_or_else(|| ScrapeError::Input(format!("missing '{}' column", URL_COLUMN)))?;

    let mut accepted = Vec::new();
    let mut rejected = Vec::new();

    for (index, record) in reader.records().enumerate() {
        let record = record?;
        let value = match record.get(column) {
            Some(value) if !value.is_empty() => value,
            _ => continue,
        };

        match parse_target(value) {
            Ok(url) => accepted.push(url),
            Err(error) => {
                tracing::warn!("Skipping row {}: {} ({})", index + 1, value, error);
                rejected.push(RejectedRow {
                    row: index + 1,
                    value: value.to_string(),
                    error,
                });
            }
        }
    }

    let total = accepted.len();
    let urls = dedup_preserving_order(accepted);

    Ok(TargetList {
        duplicates: total - urls.len(),
        urls,
        rejected,
    })
}
