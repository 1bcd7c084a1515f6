//! Crawler module for polite page fetching
//!
//! This module contains the core fetch pipeline, including:
//! - HTTP fetching behind the [`PageFetcher`] seam
//! - Minimum-delay pacing
//! - The per-URL retry state machine
//! - Whole-run orchestration

mod coordinator;
mod fetcher;
mod rate_limiter;
mod scheduler;
mod types;

pub use coordinator::{Extraction, Orchestrator, RunReport, UrlReport};
pub use fetcher::{build_http_client, HttpFetcher, PageFetcher, RawResponse};
pub use rate_limiter::RateLimiter;
pub use scheduler::{Backoff, Fetched, RetryScheduler};
pub use types::{FailureKind, FetchAttempt, FetchOutcome, FetchRequest, BLOCKED_BY_ROBOTS};

use crate::config::Config;
use crate::ScrapeError;
use url::Url;

/// Runs a complete batch over HTTP
///
/// This is the main entry point for a run. It will:
/// 1. Validate the configuration
/// 2. Build the HTTP client and parser registry
/// 3. Fetch every URL once, in input order
/// 4. Return the run totals
///
/// # Example
///
/// ```no_run
/// use scrape_batch::config::Config;
/// use scrape_batch::crawler::run_batch;
/// use url::Url;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let urls = vec![Url::parse("https://example.com/")?];
/// let report = run_batch(Config::default(), &urls).await?;
/// println!("{} succeeded", report.succeeded);
/// # Ok(())
/// # }
/// ```
pub async fn run_batch(config: Config, urls: &[Url]) -> Result<RunReport, ScrapeError> {
    Orchestrator::new(config)?.run(urls).await
}
