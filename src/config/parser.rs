use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use scrape_batch::config::load_config;
///
/// let config = load_config(Path::new("scrape.toml")).unwrap();
/// println!("Max retries: {}", config.fetcher.max_retries);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parses and validates configuration from TOML text
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Logged at startup so run logs can be tied to the exact settings used.
///
/// # Returns
///
/// * `Ok(String)` - Hex-encoded SHA-256 hash of the file content
/// * `Err(ConfigError)` - Failed to read the file
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read(path)?;
    Ok(hex::encode(Sha256::digest(&content)))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ParserKind, PolicyFetchFailure, RateLimitScope};
    use std::io::Write;
    use std::time::Duration;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_full_config() {
        let config_content = r#"
[fetcher]
max-retries = 5
backoff-base = 1.5
min-delay-secs = 0.25
timeout-secs = 20
max-backoff-secs = 30
jitter = true
workers = 4
rate-limit-scope = "per-origin"
on-policy-fetch-failure = "deny"

[user-agent]
crawler-name = "TestCrawler"
crawler-version = "2.1"
contact-url = "https://example.com/about"

[output]
raw-dir = "out/raw"
raw-extension = "htm"
log-path = "out/log.csv"
extracted-dir = "out/records"

[[site-parser]]
host = "*.example.com"
kind = "selectors"
name-selector = "h1.company-title"
description-selector = "div.company-description"
"#;

        let file = create_temp_config(config_content);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.fetcher.max_retries, 5);
        assert_eq!(config.fetcher.min_delay(), Duration::from_millis(250));
        assert_eq!(config.fetcher.max_backoff(), Some(Duration::from_secs(30)));
        assert!(config.fetcher.jitter);
        assert_eq!(config.fetcher.workers, 4);
        assert_eq!(config.fetcher.rate_limit_scope, RateLimitScope::PerOrigin);
        assert_eq!(
            config.fetcher.on_policy_fetch_failure,
            PolicyFetchFailure::Deny
        );
        assert_eq!(config.user_agent.crawler_name, "TestCrawler");
        assert_eq!(config.output.raw_extension, "htm");
        assert_eq!(config.site_parsers.len(), 1);
        assert_eq!(config.site_parsers[0].kind, ParserKind::Selectors);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = parse_config("").unwrap();

        assert_eq!(config.fetcher.max_retries, 3);
        assert_eq!(config.fetcher.backoff_base, 2.0);
        assert_eq!(config.fetcher.min_delay(), Duration::from_secs(1));
        assert_eq!(config.fetcher.timeout(), Duration::from_secs(15));
        assert_eq!(config.fetcher.workers, 1);
        assert_eq!(
            config.fetcher.on_policy_fetch_failure,
            PolicyFetchFailure::Allow
        );
        assert_eq!(
            config.user_agent.header_value(),
            "web-scraper-batch/1.0 (+https://example.com/contact)"
        );
        assert!(config.site_parsers.is_empty());
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let config = parse_config("[fetcher]\nmax-retries = 0\n").unwrap();
        assert_eq!(config.fetcher.max_retries, 0);
        assert_eq!(config.fetcher.backoff_base, 2.0);
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_config(Path::new("/nonexistent/scrape.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_config_with_invalid_toml() {
        let file = create_temp_config("this is not valid TOML {{{");
        assert!(matches!(
            load_config(file.path()),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_unknown_key_rejected() {
        let result = parse_config("[fetcher]\nmax-retires = 3\n");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_config_with_validation_error() {
        let result = parse_config("[fetcher]\nbackoff-base = -2.0\n");
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_compute_config_hash() {
        let file = create_temp_config("test content");

        let hash1 = compute_config_hash(file.path()).unwrap();
        let hash2 = compute_config_hash(file.path()).unwrap();

        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64);
    }

    #[test]
    fn test_different_content_different_hash() {
        let file1 = create_temp_config("content 1");
        let file2 = create_temp_config("content 2");

        assert_ne!(
            compute_config_hash(file1.path()).unwrap(),
            compute_config_hash(file2.path()).unwrap()
        );
    }
}
