//! Retry scheduler: the per-URL fetch state machine
//!
//! This module handles:
//! - Robots policy enforcement before any network traffic
//! - Rate-limit waits before every attempt
//! - Bounded retries with exponential backoff
//! - Persisting successful bodies and logging exactly one row per URL
//!
//! Per-attempt failures never escape [`RetryScheduler::fetch`]; it always
//! returns a terminal [`FetchOutcome`].

use crate::crawler::fetcher::{PageFetcher, RawResponse};
use crate::crawler::rate_limiter::RateLimiter;
use crate::crawler::types::{FetchAttempt, FetchOutcome, FetchRequest, BLOCKED_BY_ROBOTS};
use crate::robots::RobotsGate;
use crate::state::FetchState;
use crate::storage::{ContentStore, LogEntry, LogSink, StoredPage};
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Backoff shaping applied on top of `backoff_base^(k-1)`
///
/// The default is pure exponential growth: no ceiling, no jitter.
#[derive(Debug, Clone, Copy, Default)]
pub struct Backoff {
    /// Ceiling for a single backoff sleep
    pub max_delay: Option<Duration>,

    /// Randomize each sleep uniformly between half and the full delay
    pub jitter: bool,
}

impl Backoff {
    /// Delay before retry `retry` (1-based); zero for the first attempt
    pub fn delay(&self, backoff_base: f64, retry: u32) -> Duration {
        if retry == 0 {
            return Duration::ZERO;
        }

        let exponent = i32::try_from(retry - 1).unwrap_or(i32::MAX);
        let seconds = backoff_base.powi(exponent);
        let mut delay = Duration::try_from_secs_f64(seconds).unwrap_or(Duration::MAX);

        if let Some(max_delay) = self.max_delay {
            delay = delay.min(max_delay);
        }

        if self.jitter && !delay.is_zero() && delay != Duration::MAX {
            let factor = rand::thread_rng().gen_range(0.5..=1.0);
            delay = delay.mul_f64(factor);
        }

        delay
    }
}

/// A terminal outcome plus the body that produced it, if any
#[derive(Debug)]
pub struct Fetched {
    pub outcome: FetchOutcome,

    /// The successful response body; `None` unless the outcome succeeded
    pub body: Option<Vec<u8>>,
}

/// Drives one URL from robots check to a terminal outcome
pub struct RetryScheduler {
    fetcher: Arc<dyn PageFetcher>,
    robots: RobotsGate,
    limiter: RateLimiter,
    store: ContentStore,
    log: LogSink,
    user_agent: String,
    backoff: Backoff,
}

impl RetryScheduler {
    /// Creates a scheduler
    ///
    /// # Arguments
    ///
    /// * `fetcher` - Performs the page requests
    /// * `robots` - Per-origin robots policy cache
    /// * `limiter` - Minimum-delay pacing
    /// * `store` - Destination for successful bodies
    /// * `log` - Run log writer
    /// * `user_agent` - Agent evaluated against robots policies
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        robots: RobotsGate,
        limiter: RateLimiter,
        store: ContentStore,
        log: LogSink,
        user_agent: impl Into<String>,
    ) -> Self {
        Self {
            fetcher,
            robots,
            limiter,
            store,
            log,
            user_agent: user_agent.into(),
            backoff: Backoff::default(),
        }
    }

    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn robots(&self) -> &RobotsGate {
        &self.robots
    }

    pub fn store(&self) -> &ContentStore {
        &self.store
    }

    /// Fetches one URL to a terminal outcome
    pub async fn fetch(&self, request: &FetchRequest) -> FetchOutcome {
        self.fetch_with_body(request).await.outcome
    }

    /// Like [`RetryScheduler::fetch`], also returning the successful body
    pub async fn fetch_with_body(&self, request: &FetchRequest) -> Fetched {
        let url = request.url();
        let mut run = Progress::new(url);

        run.enter(FetchState::RobotsCheck);
        if !self.robots.is_allowed(url, &self.user_agent).await {
            run.enter(FetchState::Blocked);
            tracing::info!("Blocked by robots.txt: {}", url);

            let mut entry = LogEntry::now(url.as_str());
            entry.latency = Some(Duration::ZERO);
            entry.error = Some(BLOCKED_BY_ROBOTS.to_string());
            self.write_log(entry).await;

            return run.finish(None, Some(BLOCKED_BY_ROBOTS.to_string()), None);
        }

        let mut last_error: Option<String> = None;

        for k in 0..=request.max_retries() {
            run.enter(FetchState::Attempting);

            if k > 0 {
                let delay = self.backoff.delay(request.backoff_base(), k);
                tracing::debug!("Backing off {:?} before retry {} of {}", delay, k, url);
                tokio::time::sleep(delay).await;
            }

            self.limiter
                .wait_for_slot(request.origin(), request.min_delay())
                .await;

            let response = self.fetcher.get(url).await;
            let rejection = response.rejection();
            run.record(k, &response, rejection.clone());

            match rejection {
                None => return self.finish_success(run, k, response).await,
                Some(error) => {
                    tracing::debug!("Attempt {} for {} failed: {}", k, url, error);
                    last_error = Some(error);
                }
            }
        }

        run.enter(FetchState::Exhausted);
        tracing::warn!(
            "Giving up on {} after {} attempts: {}",
            url,
            run.attempts.len(),
            last_error.as_deref().unwrap_or("unknown error")
        );

        let last = run.attempts.last();
        let mut entry = LogEntry::now(url.as_str());
        entry.status_code = last.and_then(|a| a.status_code);
        entry.latency = last.map(|a| a.latency);
        entry.retries = request.max_retries();
        entry.error = last_error.clone();
        self.write_log(entry).await;

        run.finish(None, last_error, None)
    }

    async fn finish_success(&self, mut run: Progress<'_>, k: u32, response: RawResponse) -> Fetched {
        let url = run.url;
        let mut entry = LogEntry::now(url.as_str());
        entry.status_code = response.status;
        entry.latency = Some(response.latency);
        entry.retries = k;

        match self.store.put(url, &response.body).await {
            Ok(stored) => {
                run.enter(FetchState::Succeeded);
                entry.filename = Some(stored.path.display().to_string());
                self.write_log(entry).await;
                run.finish(Some(stored), None, Some(response.body))
            }
            Err(e) => {
                run.enter(FetchState::StoreFailed);
                let error = format!("store_failed: {}", e);
                tracing::error!("Fetched {} but could not store it: {}", url, e);
                entry.error = Some(error.clone());
                self.write_log(entry).await;
                run.finish(None, Some(error), None)
            }
        }
    }

    async fn write_log(&self, entry: LogEntry) {
        let url = entry.url.clone();
        if let Err(e) = self.log.append(entry).await {
            tracing::error!("Run log entry for {} was not written: {}", url, e);
        }
    }
}

/// Mutable bookkeeping for one fetch sequence
struct Progress<'a> {
    url: &'a Url,
    state: FetchState,
    attempts: Vec<FetchAttempt>,
}

impl<'a> Progress<'a> {
    fn new(url: &'a Url) -> Self {
        Self {
            url,
            state: FetchState::Start,
            attempts: Vec::new(),
        }
    }

    fn enter(&mut self, next: FetchState) {
        match self.state.transition(next) {
            Ok(state) => self.state = state,
            Err(e) => {
                tracing::error!("{} for {}", e, self.url);
                self.state = next;
            }
        }
    }

    fn record(&mut self, sequence_number: u32, response: &RawResponse, error: Option<String>) {
        self.attempts.push(FetchAttempt {
            sequence_number,
            status_code: response.status,
            latency: response.latency,
            error,
        });
    }

    fn finish(
        self,
        stored: Option<StoredPage>,
        terminal_error: Option<String>,
        body: Option<Vec<u8>>,
    ) -> Fetched {
        Fetched {
            outcome: FetchOutcome {
                url: self.url.clone(),
                state: self.state,
                stored,
                attempts: self.attempts,
                terminal_error,
            },
            body,
        }
    }
}
