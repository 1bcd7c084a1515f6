//! Values exchanged between the scheduler and its callers

use crate::state::FetchState;
use crate::storage::StoredPage;
use crate::url::{parse_target, Origin};
use crate::ScrapeError;
use std::time::Duration;
use url::Url;

/// Terminal error recorded for URLs the robots policy forbids
pub const BLOCKED_BY_ROBOTS: &str = "blocked_by_robots";

/// One URL to fetch, with its retry and pacing parameters
///
/// Immutable once built; the constructor validates every field.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    url: Url,
    origin: Origin,
    max_retries: u32,
    backoff_base: f64,
    min_delay: Duration,
}

impl FetchRequest {
    /// Builds a request
    ///
    /// # Errors
    ///
    /// `ScrapeError::UrlError` for non-HTTP(S) URLs or URLs without a host,
    /// `ScrapeError::InvalidRequest` for a non-positive or non-finite backoff base.
    pub fn new(
        url: Url,
        max_retries: u32,
        backoff_base: f64,
        min_delay: Duration,
    ) -> Result<Self, ScrapeError> {
        let url = parse_target(url.as_str())?;
        let origin = Origin::of(&url)?;

        if !backoff_base.is_finite() || backoff_base <= 0.0 {
            return Err(ScrapeError::InvalidRequest(format!(
                "backoff_base must be a positive number, got {}",
                backoff_base
            )));
        }

        Ok(Self {
            url,
            origin,
            max_retries,
            backoff_base,
            min_delay,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn backoff_base(&self) -> f64 {
        self.backoff_base
    }

    pub fn min_delay(&self) -> Duration {
        self.min_delay
    }
}

/// Record of one network attempt
#[derive(Debug, Clone, PartialEq)]
pub struct FetchAttempt {
    /// Zero-based attempt index
    pub sequence_number: u32,

    /// Status code, absent on transport failure
    pub status_code: Option<u16>,

    pub latency: Duration,

    /// Why the attempt was rejected; `None` for the successful attempt
    pub error: Option<String>,
}

impl FetchAttempt {
    pub fn latency_seconds(&self) -> f64 {
        self.latency.as_secs_f64()
    }
}

/// Why a URL ended without a stored page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    /// Robots policy disallowed the URL; no attempt was made
    PolicyBlocked,
    /// Every attempt failed
    Exhausted,
    /// A good response could not be written to the content store
    StoreFailed,
}

/// Terminal result of one [`FetchRequest`]
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub url: Url,

    /// Always a terminal state
    pub state: FetchState,

    /// Set if and only if the fetch succeeded
    pub stored: Option<StoredPage>,

    /// Attempts in sequence order, starting at 0
    pub attempts: Vec<FetchAttempt>,

    pub terminal_error: Option<String>,
}

impl FetchOutcome {
    pub fn success(&self) -> bool {
        self.state.is_success()
    }

    pub fn failure(&self) -> Option<FailureKind> {
        match self.state {
            FetchState::Blocked => Some(FailureKind::PolicyBlocked),
            FetchState::Exhausted => Some(FailureKind::Exhausted),
            FetchState::StoreFailed => Some(FailureKind::StoreFailed),
            _ => None,
        }
    }

    pub fn last_attempt(&self) -> Option<&FetchAttempt> {
        self.attempts.last()
    }

    /// Short human-readable summary for status lines
    pub fn summary(&self) -> String {
        match (&self.stored, &self.terminal_error) {
            (Some(stored), _) => format!(
                "ok ({} bytes, {} attempt{}) -> {}",
                stored.bytes_written,
                self.attempts.len(),
                if self.attempts.len() == 1 { "" } else { "s" },
                stored.path.display()
            ),
            (None, Some(error)) => format!("{}: {}", self.state, error),
            (None, None) => self.state.to_string(),
        }
    }
}
