//! Per-origin robots policy
//!
//! A policy is created once per origin from the result of a single
//! robots.txt fetch and is never refreshed within a run.

use crate::config::PolicyFetchFailure;
use crate::crawler::RawResponse;
use crate::robots::ParsedRobots;
use chrono::{DateTime, Utc};

/// What an origin's robots.txt fetch resolved to
#[derive(Debug, Clone)]
pub enum RobotsRules {
    /// No restrictions (e.g. robots.txt answered 404)
    AllowAll,
    /// Everything forbidden (robots.txt answered 401, 403 or 5xx)
    DisallowAll,
    /// A downloaded ruleset
    Parsed(ParsedRobots),
    /// The document could not be loaded; the caller's failure mode decides
    Unknown,
}

/// Cached robots policy for one origin
#[derive(Debug, Clone)]
pub struct RobotsPolicy {
    pub rules: RobotsRules,

    /// When the robots.txt fetch finished
    pub fetched_at: DateTime<Utc>,

    /// True when the document was unreachable or undecodable
    pub load_failed: bool,
}

impl RobotsPolicy {
    fn new(rules: RobotsRules) -> Self {
        let load_failed = matches!(rules, RobotsRules::Unknown);
        Self {
            rules,
            fetched_at: Utc::now(),
            load_failed,
        }
    }

    pub fn parsed(content: &str) -> Self {
        Self::new(RobotsRules::Parsed(ParsedRobots::from_content(content)))
    }

    pub fn allow_all() -> Self {
        Self::new(RobotsRules::AllowAll)
    }

    pub fn disallow_all() -> Self {
        Self::new(RobotsRules::DisallowAll)
    }

    pub fn unknown() -> Self {
        Self::new(RobotsRules::Unknown)
    }

    /// Classifies the response to a robots.txt request
    ///
    /// | Response | Policy |
    /// |----------|--------|
    /// | 2xx/3xx with UTF-8 body | Parsed |
    /// | 401, 403 | DisallowAll |
    /// | other 4xx | AllowAll |
    /// | 5xx | DisallowAll |
    /// | transport error, non-UTF-8 body | Unknown |
    pub fn from_response(response: &RawResponse) -> Self {
        if response.error.is_some() {
            return Self::unknown();
        }

        match response.status {
            Some(status) if (200..400).contains(&status) => {
                match std::str::from_utf8(&response.body) {
                    Ok(text) => Self::parsed(text),
                    Err(_) => Self::unknown(),
                }
            }
            Some(401) | Some(403) => Self::disallow_all(),
            Some(status) if (400..500).contains(&status) => Self::allow_all(),
            Some(status) if status >= 500 => Self::disallow_all(),
            _ => Self::unknown(),
        }
    }

    /// Evaluates a URL against this policy
    ///
    /// `on_failure` only matters when the policy could not be loaded.
    pub fn is_allowed(&self, url: &str, user_agent: &str, on_failure: PolicyFetchFailure) -> bool {
        match &self.rules {
            RobotsRules::AllowAll => true,
            RobotsRules::DisallowAll => false,
            RobotsRules::Parsed(robots) => robots.is_allowed(url, user_agent),
            RobotsRules::Unknown => on_failure == PolicyFetchFailure::Allow,
        }
    }
}
