//! Run orchestration
//!
//! This module drives a whole batch:
//! - Deduplicating the target list
//! - Building the per-run scheduler, robots cache, rate limiter and log writer
//! - Running URLs sequentially or across a bounded pool of origin groups
//! - Handing successful pages to the extraction collaborators
//! - Stopping early when the cancellation flag is raised

use crate::config::{validate, Config};
use crate::crawler::fetcher::{HttpFetcher, PageFetcher};
use crate::crawler::rate_limiter::RateLimiter;
use crate::crawler::scheduler::{Backoff, RetryScheduler};
use crate::crawler::types::{FetchOutcome, FetchRequest};
use crate::extract::{normalize::normalize_record, ParserRegistry, RecordStore};
use crate::robots::RobotsGate;
use crate::state::FetchState;
use crate::storage::{ContentStore, LogSink, RunLogger};
use crate::url::{dedup_preserving_order, group_by_origin};
use crate::ScrapeError;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use url::Url;

/// What happened to a successful page after it was stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    /// Extraction is disabled or the fetch did not succeed
    Skipped,
    /// The normalized record was written here
    Saved(PathBuf),
    Failed(String),
}

/// Terminal result of one URL within a run
#[derive(Debug, Clone)]
pub struct UrlReport {
    pub outcome: FetchOutcome,
    pub extraction: Extraction,
}

/// Totals for one [`Orchestrator::run`]
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    /// Distinct URLs after deduplication
    pub total: usize,
    pub succeeded: usize,
    pub blocked: usize,
    pub exhausted: usize,
    pub store_failed: usize,
    pub extracted: usize,
    pub extract_failed: usize,
    /// URLs never started because the run was cancelled
    pub skipped: usize,
    /// Per-URL results in input order; skipped URLs are absent
    pub urls: Vec<UrlReport>,
}

impl RunReport {
    fn from_reports(total: usize, urls: Vec<UrlReport>) -> Self {
        let mut report = Self {
            total,
            skipped: total - urls.len(),
            ..Self::default()
        };

        for url in &urls {
            match url.outcome.state {
                FetchState::Succeeded => report.succeeded += 1,
                FetchState::Blocked => report.blocked += 1,
                FetchState::Exhausted => report.exhausted += 1,
                FetchState::StoreFailed => report.store_failed += 1,
                other => tracing::error!("Non-terminal outcome {} for {}", other, url.outcome.url),
            }
            match url.extraction {
                Extraction::Saved(_) => report.extracted += 1,
                Extraction::Failed(_) => report.extract_failed += 1,
                Extraction::Skipped => {}
            }
        }

        report.urls = urls;
        report
    }

    pub fn outcomes(&self) -> impl Iterator<Item = &FetchOutcome> {
        self.urls.iter().map(|u| &u.outcome)
    }

    pub fn failed(&self) -> usize {
        self.blocked + self.exhausted + self.store_failed
    }
}

/// Runs batches of URLs through the fetch pipeline
pub struct Orchestrator {
    config: Arc<Config>,
    fetcher: Arc<dyn PageFetcher>,
    parsers: Option<ParserRegistry>,
    cancel: Arc<AtomicBool>,
}

impl Orchestrator {
    /// Creates an orchestrator that fetches over HTTP
    ///
    /// # Errors
    ///
    /// Fails if the configuration is invalid or the HTTP client cannot be built.
    pub fn new(config: Config) -> Result<Self, ScrapeError> {
        validate(&config)?;
        let fetcher = HttpFetcher::new(&config.user_agent, config.fetcher.timeout())?;
        Self::assemble(config, Arc::new(fetcher))
    }

    /// Creates an orchestrator around any [`PageFetcher`]
    pub fn with_fetcher(config: Config, fetcher: Arc<dyn PageFetcher>) -> Result<Self, ScrapeError> {
        validate(&config)?;
        Self::assemble(config, fetcher)
    }

    /// Builds the orchestrator from an already validated config
    fn assemble(config: Config, fetcher: Arc<dyn PageFetcher>) -> Result<Self, ScrapeError> {
        let parsers = ParserRegistry::from_config(&config.site_parsers)?;

        Ok(Self {
            config: Arc::new(config),
            fetcher,
            parsers: Some(parsers),
            cancel: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Replaces the parser registry built from the configuration
    pub fn with_parsers(mut self, parsers: ParserRegistry) -> Self {
        self.parsers = Some(parsers);
        self
    }

    /// Stores pages without extracting records
    pub fn without_extraction(mut self) -> Self {
        self.parsers = None;
        self
    }

    /// Uses `flag` to stop scheduling new URLs once it is set
    pub fn with_cancellation(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = flag;
        self
    }

    pub fn cancellation(&self) -> Arc<AtomicBool> {
        self.cancel.clone()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Fetches every URL once and returns the run totals
    ///
    /// Duplicates are dropped (first occurrence kept). With one worker URLs
    /// run strictly in input order, each finished before the next starts.
    /// With more, URLs are grouped by origin and up to `workers` groups run
    /// at once, each group still in input order.
    ///
    /// # Errors
    ///
    /// Only setup failures are returned: output directories or the run log
    /// cannot be created, or a URL is not a valid target.
    pub async fn run(&self, urls: &[Url]) -> Result<RunReport, ScrapeError> {
        let fetcher_config = &self.config.fetcher;
        let output = &self.config.output;

        let requests = dedup_preserving_order(urls.iter().cloned())
            .into_iter()
            .map(|url| {
                FetchRequest::new(
                    url,
                    fetcher_config.max_retries,
                    fetcher_config.backoff_base,
                    fetcher_config.min_delay(),
                )
            })
            .collect::<Result<Vec<_>, _>>()?;
        let total = requests.len();

        let store = ContentStore::open(&output.raw_dir, &output.raw_extension)?;
        let records = match self.parsers {
            Some(_) => Some(RecordStore::open(&output.extracted_dir)?),
            None => None,
        };
        let (log, log_task) = LogSink::spawn(RunLogger::open(&output.log_path)?);

        let scheduler = RetryScheduler::new(
            self.fetcher.clone(),
            RobotsGate::new(self.fetcher.clone(), fetcher_config.on_policy_fetch_failure),
            RateLimiter::new(fetcher_config.rate_limit_scope),
            store,
            log,
            self.config.user_agent.header_value(),
        )
        .with_backoff(Backoff {
            max_delay: fetcher_config.max_backoff(),
            jitter: fetcher_config.jitter,
        });

        let worker = Arc::new(Worker {
            scheduler,
            parsers: self.parsers.clone(),
            records,
            cancel: self.cancel.clone(),
            total,
            started: AtomicUsize::new(0),
        });

        tracing::info!(
            "Starting run: {} URLs, {} worker(s), {} retries, backoff base {}",
            total,
            fetcher_config.workers,
            fetcher_config.max_retries,
            fetcher_config.backoff_base
        );

        let results = if fetcher_config.workers <= 1 {
            Self::run_sequential(&worker, requests).await
        } else {
            Self::run_pooled(&worker, requests, fetcher_config.workers).await
        };

        // Every sink handle lives in the scheduler; dropping the last worker
        // reference lets the writer drain and stop.
        drop(worker);
        log_task.await?;

        let report = RunReport::from_reports(total, results?);
        if report.skipped > 0 {
            tracing::warn!("Run cancelled: {} URLs not started", report.skipped);
        }
        tracing::info!(
            "Run finished: {} succeeded, {} exhausted, {} blocked, {} store failures, {} extracted",
            report.succeeded,
            report.exhausted,
            report.blocked,
            report.store_failed,
            report.extracted
        );

        Ok(report)
    }

    async fn run_sequential(
        worker: &Worker,
        requests: Vec<FetchRequest>,
    ) -> Result<Vec<UrlReport>, ScrapeError> {
        let mut reports = Vec::with_capacity(requests.len());
        for request in requests {
            match worker.process(&request).await {
                Some(report) => reports.push(report),
                None => break,
            }
        }
        Ok(reports)
    }

    async fn run_pooled(
        worker: &Arc<Worker>,
        requests: Vec<FetchRequest>,
        workers: usize,
    ) -> Result<Vec<UrlReport>, ScrapeError> {
        let urls: Vec<Url> = requests.iter().map(|r| r.url().clone()).collect();
        let mut indexed: Vec<Option<FetchRequest>> = requests.into_iter().map(Some).collect();

        let semaphore = Arc::new(Semaphore::new(workers));
        let mut tasks = JoinSet::new();

        for (origin, members) in group_by_origin(&urls) {
            // Member order is input order; map each back to its request
            let group: Vec<(usize, FetchRequest)> = members
                .iter()
                .filter_map(|url| {
                    let index = urls.iter().position(|u| u == url)?;
                    indexed[index].take().map(|request| (index, request))
                })
                .collect();

            let worker = worker.clone();
            let semaphore = semaphore.clone();
            tasks.spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return Vec::new();
                };
                tracing::debug!("Worker picked up {} ({} URLs)", origin, group.len());

                let mut done = Vec::with_capacity(group.len());
                for (index, request) in group {
                    match worker.process(&request).await {
                        Some(report) => done.push((index, report)),
                        None => break,
                    }
                }
                done
            });
        }

        let mut finished = Vec::new();
        while let Some(result) = tasks.join_next().await {
            finished.extend(result?);
        }
        finished.sort_by_key(|(index, _)| *index);

        Ok(finished.into_iter().map(|(_, report)| report).collect())
    }
}

/// Shared per-run state handed to every task
struct Worker {
    scheduler: RetryScheduler,
    parsers: Option<ParserRegistry>,
    records: Option<RecordStore>,
    cancel: Arc<AtomicBool>,
    total: usize,
    started: AtomicUsize,
}

impl Worker {
    /// Runs one URL to completion; `None` once the run is cancelled
    async fn process(&self, request: &FetchRequest) -> Option<UrlReport> {
        if self.cancel.load(Ordering::SeqCst) {
            return None;
        }

        let position = self.started.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::info!("[{}/{}] Fetching: {}", position, self.total, request.url());

        let fetched = self.scheduler.fetch_with_body(request).await;
        let outcome = fetched.outcome;

        if outcome.success() {
            tracing::info!("[{}/{}] {}", position, self.total, outcome.summary());
        } else {
            tracing::warn!("[{}/{}] {} {}", position, self.total, request.url(), outcome.summary());
        }

        let extraction = match fetched.body {
            Some(body) => self.extract(&outcome.url, &body).await,
            None => Extraction::Skipped,
        };

        Some(UrlReport {
            outcome,
            extraction,
        })
    }

    async fn extract(&self, url: &Url, body: &[u8]) -> Extraction {
        let (Some(parsers), Some(records)) = (&self.parsers, &self.records) else {
            return Extraction::Skipped;
        };

        let parsed = {
            let parser = parsers.resolve_url(url);
            parser
                .parse(body, url)
                .map(|record| (parser.name().to_string(), normalize_record(record)))
        };

        let (parser_name, record) = match parsed {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Extraction failed for {}: {}", url, e);
                return Extraction::Failed(e.to_string());
            }
        };

        match records.save(&record).await {
            Ok(path) => {
                tracing::debug!("Extracted {} with {} -> {}", url, parser_name, path.display());
                Extraction::Saved(path)
            }
            Err(e) => {
                tracing::warn!("Could not save extracted record for {}: {}", url, e);
                Extraction::Failed(e.to_string())
            }
        }
    }
}
