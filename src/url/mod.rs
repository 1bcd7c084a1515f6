//! URL handling for scrape-batch
//!
//! Target validation, origin derivation, host pattern matching and the
//! order-preserving helpers the orchestrator uses to shape its work list.

mod matcher;
mod origin;

pub use matcher::{matches_host_pattern, normalize_host};
pub use origin::Origin;

use crate::UrlError;
use std::collections::HashSet;
use url::Url;

/// Parses and validates a target URL
///
/// Targets must be absolute `http` or `https` URLs with a host. Surrounding
/// whitespace is ignored; nothing else about the URL is rewritten, so the
/// serialized form stays stable for content addressing.
///
/// # Examples
///
/// ```
/// use scrape_batch::url::parse_target;
///
/// let url = parse_target("  https://example.com/about ").unwrap();
/// assert_eq!(url.as_str(), "https://example.com/about");
///
/// assert!(parse_target("ftp://example.com/file").is_err());
/// assert!(parse_target("/relative/path").is_err());
/// ```
pub fn parse_target(raw: &str) -> Result<Url, UrlError> {
    let url = Url::parse(raw.trim()).map_err(|e| UrlError::Parse(format!("{raw}: {e}")))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingHost);
    }

    Ok(url)
}

/// Removes duplicate URLs, keeping the first occurrence of each
pub fn dedup_preserving_order<I>(urls: I) -> Vec<Url>
where
    I: IntoIterator<Item = Url>,
{
    let mut seen = HashSet::new();
    urls.into_iter()
        .filter(|url| seen.insert(url.as_str().to_string()))
        .collect()
}

/// Groups URLs by origin
///
/// Groups appear in order of their origin's first occurrence, and URLs keep
/// their relative input order inside each group. URLs without a tuple origin
/// are dropped; [`parse_target`] never produces such URLs.
pub fn group_by_origin(urls: &[Url]) -> Vec<(Origin, Vec<Url>)> {
    let mut groups: Vec<(Origin, Vec<Url>)> = Vec::new();

    for url in urls {
        let Ok(origin) = Origin::of(url) else {
            tracing::warn!("Skipping URL without origin: {}", url);
            continue;
        };

        match groups.iter_mut().find(|(o, _)| *o == origin) {
            Some((_, members)) => members.push(url.clone()),
            None => groups.push((origin, vec![url.clone()])),
        }
    }

    groups
}
