//! Extraction of company records from fetched pages
//!
//! # Components
//!
//! - `PageParser`: turns one raw page into a [`CompanyRecord`]
//! - `GenericParser`: heuristics that work on any HTML page
//! - `SelectorParser`: per-site CSS selectors for name and description
//! - `ParserRegistry`: hostname pattern → parser, with a default fallback
//! - `normalize`: pure clean-up functions over record fields
//! - `RecordStore`: JSON files under `<dir>/<sha1(source_url)>.json`

mod generic;
pub mod normalize;
mod record_store;
mod registry;
mod selectors;

pub use generic::GenericParser;
pub use record_store::RecordStore;
pub use registry::ParserRegistry;
pub use selectors::SelectorParser;

use crate::storage::StorageError;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;
use url::Url;

/// Errors that can occur while extracting or saving records
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Invalid CSS selector '{selector}': {message}")]
    InvalidSelector { selector: String, message: String },

    #[error("Invalid host pattern: {0}")]
    InvalidPattern(String),

    #[error("Page body is empty")]
    EmptyDocument,

    #[error("Failed to save record: {0}")]
    Storage(#[from] StorageError),
}

/// Result type for extraction operations
pub type ExtractResult<T> = Result<T, ExtractError>;

/// Business-directory fields pulled from one page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyRecord {
    pub company_name: Option<String>,
    pub description: Option<String>,
    pub email: Vec<String>,
    pub phone: Vec<String>,
    pub social_links: Vec<String>,
    pub website: Option<String>,
    pub address: Option<String>,
    pub category: Option<String>,
    pub source_url: String,
}

impl CompanyRecord {
    /// An empty record for `source_url`
    pub fn for_source(source_url: &Url) -> Self {
        Self {
            website: Some(source_url.to_string()),
            source_url: source_url.to_string(),
            ..Self::default()
        }
    }
}

/// Extracts a [`CompanyRecord`] from a raw page
///
/// Implementations are synchronous and must not keep the parsed document
/// beyond the call.
pub trait PageParser: Send + Sync {
    /// Short label for logs
    fn name(&self) -> &str;

    fn parse(&self, raw: &[u8], source_url: &Url) -> ExtractResult<CompanyRecord>;
}

static EMAIL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\w.-]+@[\w.-]+\.\w+").expect("Invalid email regex"));

static PHONE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\+?\d{1,3}?[-.\s]?\(?\d{1,4}?\)?[-.\s]?\d{2,4}[-.\s]?\d{2,4}")
        .expect("Invalid phone regex")
});

static SOCIAL_REGEXES: Lazy<[Regex; 3]> = Lazy::new(|| {
    ["linkedin", "facebook", "twitter"].map(|site| {
        Regex::new(&format!(r"(?i)https?://(?:www\.)?{}\.com/[\w/-]+", site))
            .expect("Invalid social link regex")
    })
});

/// Decodes a raw body as text, replacing invalid UTF-8
fn decode(raw: &[u8]) -> ExtractResult<std::borrow::Cow<'_, str>> {
    if raw.is_empty() {
        return Err(ExtractError::EmptyDocument);
    }
    Ok(String::from_utf8_lossy(raw))
}

/// Distinct email-like strings in `text`, sorted
fn find_emails(text: &str) -> Vec<String> {
    distinct(EMAIL_REGEX.find_iter(text).map(|m| m.as_str()))
}

/// Distinct phone-like strings in `text`, sorted
fn find_phones(text: &str) -> Vec<String> {
    distinct(PHONE_REGEX.find_iter(text).map(|m| m.as_str().trim()))
}

/// Linkedin, facebook and twitter URLs in `text`, first occurrence kept
fn find_social_links(text: &str) -> Vec<String> {
    let mut seen = BTreeSet::new();
    SOCIAL_REGEXES
        .iter()
        .flat_map(|regex| regex.find_iter(text))
        .map(|m| m.as_str().to_string())
        .filter(|link| seen.insert(link.clone()))
        .collect()
}

fn distinct<'a>(items: impl Iterator<Item = &'a str>) -> Vec<String> {
    items
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Parses a selector, mapping the error to [`ExtractError::InvalidSelector`]
fn parse_selector(selector: &str) -> ExtractResult<Selector> {
    Selector::parse(selector).map_err(|e| ExtractError::InvalidSelector {
        selector: selector.to_string(),
        message: format!("{:?}", e),
    })
}

/// Text content of an element with whitespace runs collapsed
fn element_text(element: ElementRef<'_>) -> Option<String> {
    let text = element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ");
    (!text.is_empty()).then_some(text)
}

/// Text of the first element matching `selector`
fn select_text(document: &Html, selector: &Selector) -> Option<String> {
    document.select(selector).next().and_then(element_text)
}

/// Trimmed attribute of the first element matching `selector`
fn select_attr(document: &Html, selector: &Selector, attr: &str) -> Option<String> {
    document
        .select(selector)
        .next()
        .and_then(|el| el.value().attr(attr))
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
