use crate::config::types::{
    Config, FetcherConfig, OutputConfig, ParserKind, SiteParserConfig, UserAgentConfig,
};
use crate::ConfigError;
use scraper::Selector;
use url::Url;

/// Upper bound on concurrently processed origins
pub const MAX_WORKERS: usize = 64;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_fetcher_config(&config.fetcher)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    validate_site_parsers(&config.site_parsers)?;
    Ok(())
}

/// Validates fetch pipeline configuration
fn validate_fetcher_config(config: &FetcherConfig) -> Result<(), ConfigError> {
    if !config.backoff_base.is_finite() || config.backoff_base <= 0.0 {
        return Err(ConfigError::Validation(format!(
            "backoff_base must be a positive number, got {}",
            config.backoff_base
        )));
    }

    validate_seconds("min_delay_secs", config.min_delay_secs)?;

    if let Some(max_backoff) = config.max_backoff_secs {
        validate_seconds("max_backoff_secs", max_backoff)?;
    }

    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "timeout_secs must be >= 1, got {}",
            config.timeout_secs
        )));
    }

    if config.workers < 1 || config.workers > MAX_WORKERS {
        return Err(ConfigError::Validation(format!(
            "workers must be between 1 and {}, got {}",
            MAX_WORKERS, config.workers
        )));
    }

    Ok(())
}

/// Validates a non-negative, finite, representable number of seconds
fn validate_seconds(field: &str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() || value < 0.0 || value > u32::MAX as f64 {
        return Err(ConfigError::Validation(format!(
            "{} must be a non-negative number of seconds, got {}",
            field, value
        )));
    }
    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    // robots.txt groups are matched on this token, so it must stay a token
    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only ASCII letters, digits, '-', '_' or '.', got '{}'",
            config.crawler_name
        )));
    }

    if config.crawler_version.trim().is_empty() {
        return Err(ConfigError::Validation(
            "crawler_version cannot be empty".to_string(),
        ));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.raw_dir.as_os_str().is_empty() {
        return Err(ConfigError::Validation("raw_dir cannot be empty".to_string()));
    }

    if config.log_path.as_os_str().is_empty() {
        return Err(ConfigError::Validation("log_path cannot be empty".to_string()));
    }

    if config.extracted_dir.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "extracted_dir cannot be empty".to_string(),
        ));
    }

    if config.raw_extension.is_empty()
        || !config.raw_extension.chars().all(|c| c.is_ascii_alphanumeric())
    {
        return Err(ConfigError::Validation(format!(
            "raw_extension must be non-empty and alphanumeric, got '{}'",
            config.raw_extension
        )));
    }

    Ok(())
}

/// Validates site parser overrides
fn validate_site_parsers(parsers: &[SiteParserConfig]) -> Result<(), ConfigError> {
    for entry in parsers {
        validate_host_pattern(&entry.host)?;

        if entry.kind == ParserKind::Selectors
            && entry.name_selector.is_none()
            && entry.description_selector.is_none()
        {
            return Err(ConfigError::Validation(format!(
                "Site parser for '{}' uses selectors but defines none",
                entry.host
            )));
        }

        for selector in [&entry.name_selector, &entry.description_selector]
            .into_iter()
            .flatten()
        {
            Selector::parse(selector).map_err(|e| ConfigError::InvalidSelector {
                selector: selector.clone(),
                message: format!("{:?}", e),
            })?;
        }
    }

    Ok(())
}

/// Validates a host pattern (supports a leading `*.` wildcard)
fn validate_host_pattern(pattern: &str) -> Result<(), ConfigError> {
    if pattern.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Host pattern cannot be empty".to_string(),
        ));
    }

    let host = pattern.strip_prefix("*.").unwrap_or(pattern);
    validate_host_string(host)
}

/// Validates a host string (without wildcard prefix)
fn validate_host_string(host: &str) -> Result<(), ConfigError> {
    if host.is_empty() {
        return Err(ConfigError::InvalidPattern("Host cannot be empty".to_string()));
    }

    if !host
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Host '{}' contains invalid characters",
            host
        )));
    }

    if host.starts_with('.') || host.ends_with('.') || host.starts_with('-') || host.ends_with('-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Host '{}' cannot start or end with '.' or '-'",
            host
        )));
    }

    if host.contains("..") {
        return Err(ConfigError::InvalidPattern(format!(
            "Host '{}' cannot contain consecutive dots",
            host
        )));
    }

    Ok(())
}
