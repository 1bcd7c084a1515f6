//! scrape-batch main entry point
//!
//! This is the command-line interface for the polite batch page fetcher.

use anyhow::{Context, Result};
use clap::Parser;
use scrape_batch::config::{load_config_with_hash, validate, Config};
use scrape_batch::crawler::{Orchestrator, RunReport};
use scrape_batch::input::{load_urls, TargetList};
use std::future::Future;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// scrape-batch: a polite batch page fetcher
///
/// Fetches every URL listed in a CSV file while respecting robots.txt and a
/// minimum delay between requests, retries failures with exponential backoff,
/// stores raw pages, logs one row per URL and extracts company records.
#[derive(Parser, Debug)]
#[command(name = "scrape-batch")]
#[command(version = "1.0.0")]
#[command(about = "A polite batch page fetcher", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (defaults are used when omitted)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// CSV file with a 'url' column
    #[arg(short, long, value_name = "CSV", default_value = "company_urls.csv")]
    input: PathBuf,

    /// Retries after the first attempt
    #[arg(long, value_name = "N")]
    retries: Option<u32>,

    /// Exponential backoff base in seconds
    #[arg(long, value_name = "BASE")]
    backoff: Option<f64>,

    /// Seconds to wait before every request
    #[arg(long, value_name = "SECS")]
    rate: Option<f64>,

    /// Origins fetched concurrently (1 = strictly sequential)
    #[arg(long, value_name = "N")]
    workers: Option<usize>,

    /// Store raw pages without extracting records
    #[arg(long)]
    no_extract: bool,

    /// Validate config and input and show what would be fetched
    #[arg(long)]
    dry_run: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = build_config(&cli)?;

    tracing::info!("Reading targets from: {}", cli.input.display());
    let targets = load_urls(&cli.input)
        .with_context(|| format!("Failed to read input {}", cli.input.display()))?;
    tracing::info!(
        "Found {} unique URLs ({} duplicates, {} rejected)",
        targets.urls.len(),
        targets.duplicates,
        targets.rejected.len()
    );

    if cli.dry_run {
        handle_dry_run(&config, &targets);
        return Ok(());
    }

    handle_run(config, &targets, cli.no_extract).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("scrape_batch=info,warn"),
            1 => EnvFilter::new("scrape_batch=debug,info"),
            2 => EnvFilter::new("scrape_batch=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Loads the config file (if any) and applies command-line overrides
fn build_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => {
            tracing::debug!("No configuration file given, using defaults");
            Config::default()
        }
    };

    if let Some(retries) = cli.retries {
        config.fetcher.max_retries = retries;
    }
    if let Some(backoff) = cli.backoff {
        config.fetcher.backoff_base = backoff;
    }
    if let Some(rate) = cli.rate {
        config.fetcher.min_delay_secs = rate;
    }
    if let Some(workers) = cli.workers {
        config.fetcher.workers = workers;
    }

    validate(&config).context("Invalid settings")?;
    Ok(config)
}

/// Handles the --dry-run mode: shows the effective settings and targets
fn handle_dry_run(config: &Config, targets: &TargetList) {
    println!("=== scrape-batch Dry Run ===\n");

    println!("Fetcher:");
    println!("  Max retries: {}", config.fetcher.max_retries);
    println!("  Backoff base: {}s", config.fetcher.backoff_base);
    println!("  Min delay: {}s", config.fetcher.min_delay_secs);
    println!("  Timeout: {}s", config.fetcher.timeout_secs);
    println!("  Workers: {}", config.fetcher.workers);
    println!("  Rate limit scope: {:?}", config.fetcher.rate_limit_scope);
    println!(
        "  On robots.txt failure: {:?}",
        config.fetcher.on_policy_fetch_failure
    );

    println!("\nUser Agent: {}", config.user_agent.header_value());

    println!("\nOutput:");
    println!("  Raw pages: {}", config.output.raw_dir.display());
    println!("  Run log: {}", config.output.log_path.display());
    println!("  Extracted: {}", config.output.extracted_dir.display());

    println!("\nSite Parsers ({}):", config.site_parsers.len());
    for site in &config.site_parsers {
        println!("  - {} ({:?})", site.host, site.kind);
    }

    println!("\nTargets ({}):", targets.urls.len());
    for url in &targets.urls {
        println!("  * {}", url);
    }

    if !targets.rejected.is_empty() {
        println!("\nRejected rows ({}):", targets.rejected.len());
        for row in &targets.rejected {
            println!("  row {}: {} ({})", row.row, row.value, row.error);
        }
    }

    println!("\n✓ Configuration is valid");
    println!("✓ Would fetch {} URLs", targets.urls.len());
}

/// Handles the main run
///
/// Ctrl-C is handled in two stages: the first press stops new URLs from
/// starting while in-flight URLs finish and log; a second press exits
/// immediately with status 130.
async fn handle_run(config: Config, targets: &TargetList, no_extract: bool) -> Result<()> {
    let cancel = Arc::new(AtomicBool::new(false));
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if watch_interrupts(tokio::signal::ctrl_c, cancel).await {
                tracing::error!("Second interrupt received; exiting now");
                std::process::exit(130);
            }
        });
    }

    let mut orchestrator = Orchestrator::new(config)
        .context("Failed to set up the fetch pipeline")?
        .with_cancellation(cancel);
    if no_extract {
        orchestrator = orchestrator.without_extraction();
    }

    let report = orchestrator.run(&targets.urls).await.context("Run failed")?;
    print_summary(&report);

    Ok(())
}

/// Raises `cancel` on the first interrupt
///
/// Returns `true` once a second interrupt arrives, `false` if the signal
/// source fails.
async fn watch_interrupts<F, Fut>(mut interrupt: F, cancel: Arc<AtomicBool>) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::io::Result<()>>,
{
    if interrupt().await.is_err() {
        return false;
    }
    tracing::warn!("Interrupt received; finishing in-flight URLs (press Ctrl-C again to exit)");
    cancel.store(true, Ordering::SeqCst);

    interrupt().await.is_ok()
}

fn print_summary(report: &RunReport) {
    println!("\n=== Run Summary ===");
    println!("  URLs:          {}", report.total);
    println!("  Succeeded:     {}", report.succeeded);
    println!("  Exhausted:     {}", report.exhausted);
    println!("  Blocked:       {}", report.blocked);
    println!("  Store failed:  {}", report.store_failed);
    println!("  Extracted:     {}", report.extracted);
    if report.extract_failed > 0 {
        println!("  Extract failed: {}", report.extract_failed);
    }
    if report.skipped > 0 {
        println!("  Not started:   {} (interrupted)", report.skipped);
    }
}
