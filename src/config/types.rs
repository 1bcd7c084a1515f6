use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure for scrape-batch
///
/// Every section has defaults, so an empty file (or no file at all) yields a
/// usable configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub fetcher: FetcherConfig,

    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,

    #[serde(default)]
    pub output: OutputConfig,

    /// Per-site parser overrides, resolved by hostname
    #[serde(rename = "site-parser", default)]
    pub site_parsers: Vec<SiteParserConfig>,
}

/// What the robots gate decides when an origin's policy cannot be loaded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyFetchFailure {
    /// Fail open: treat the origin as unrestricted
    #[default]
    Allow,
    /// Fail closed: treat every URL on the origin as disallowed
    Deny,
}

/// How the minimum request delay is shared between destinations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RateLimitScope {
    /// One cadence across every destination
    #[default]
    Global,
    /// One cadence per origin; different origins wait independently
    PerOrigin,
}

/// Fetch pipeline behavior
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct FetcherConfig {
    /// Retries after the first attempt (total attempts = max_retries + 1)
    pub max_retries: u32,

    /// Base of the exponential backoff; retry k waits `backoff_base^(k-1)` seconds
    pub backoff_base: f64,

    /// Delay before every outbound attempt (seconds)
    pub min_delay_secs: f64,

    /// Hard timeout for a single request (seconds)
    pub timeout_secs: u64,

    /// Optional ceiling for a single backoff sleep (seconds)
    pub max_backoff_secs: Option<f64>,

    /// Randomize each backoff sleep between half and the full delay
    pub jitter: bool,

    /// Number of origins processed concurrently (1 = strictly sequential)
    pub workers: usize,

    pub rate_limit_scope: RateLimitScope,

    pub on_policy_fetch_failure: PolicyFetchFailure,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_base: 2.0,
            min_delay_secs: 1.0,
            timeout_secs: 15,
            max_backoff_secs: None,
            jitter: false,
            workers: 1,
            rate_limit_scope: RateLimitScope::Global,
            on_policy_fetch_failure: PolicyFetchFailure::Allow,
        }
    }
}

impl FetcherConfig {
    pub fn min_delay(&self) -> Duration {
        Duration::from_secs_f64(self.min_delay_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn max_backoff(&self) -> Option<Duration> {
        self.max_backoff_secs.map(Duration::from_secs_f64)
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct UserAgentConfig {
    /// Product token; also the name matched against robots.txt groups
    pub crawler_name: String,

    pub crawler_version: String,

    /// URL with information about the crawler
    pub contact_url: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "web-scraper-batch".to_string(),
            crawler_version: "1.0".to_string(),
            contact_url: "https://example.com/contact".to_string(),
        }
    }
}

impl UserAgentConfig {
    /// Full User-Agent header value: `Name/Version (+ContactURL)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{})",
            self.crawler_name, self.crawler_version, self.contact_url
        )
    }
}

/// Output locations
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Directory for raw response bodies
    pub raw_dir: PathBuf,

    /// File extension for raw bodies
    pub raw_extension: String,

    /// CSV run log
    pub log_path: PathBuf,

    /// Directory for extracted JSON records
    pub extracted_dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            raw_dir: PathBuf::from("raw_pages"),
            raw_extension: "html".to_string(),
            log_path: PathBuf::from("logs").join("run_log.csv"),
            extracted_dir: PathBuf::from("extracted"),
        }
    }
}

/// Which parser implementation a site override uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParserKind {
    /// The generic extractor, useful to pin a host away from a wildcard rule
    Generic,
    /// CSS selectors for name and description
    #[default]
    Selectors,
}

/// Site-specific parser override
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct SiteParserConfig {
    /// Host pattern (e.g. "example.com" or "*.example.com")
    pub host: String,

    #[serde(default)]
    pub kind: ParserKind,

    pub name_selector: Option<String>,

    pub description_selector: Option<String>,
}
