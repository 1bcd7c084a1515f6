//! Robots.txt handling module
//!
//! [`RobotsGate`] answers "may this agent fetch this URL?" by fetching each
//! origin's robots.txt once, on first use, and caching the resulting
//! [`RobotsPolicy`] for the lifetime of the gate.

mod parser;
mod policy;

pub use parser::{product_token, ParsedRobots};
pub use policy::{RobotsPolicy, RobotsRules};

use crate::config::PolicyFetchFailure;
use crate::crawler::PageFetcher;
use crate::url::Origin;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::OnceCell;
use url::Url;

type PolicySlot = Arc<OnceCell<Arc<RobotsPolicy>>>;

/// Per-origin robots policy cache and evaluator
///
/// The robots.txt request is best effort: one attempt, no rate-limit wait,
/// no retry. Concurrent first queries for the same origin share that single
/// request. Entries never expire.
pub struct RobotsGate {
    fetcher: Arc<dyn PageFetcher>,
    on_failure: PolicyFetchFailure,
    policies: Mutex<HashMap<Origin, PolicySlot>>,
}

impl RobotsGate {
    /// Creates an empty gate
    ///
    /// # Arguments
    ///
    /// * `fetcher` - Used for robots.txt requests
    /// * `on_failure` - Decision applied to origins whose robots.txt could not be loaded
    pub fn new(fetcher: Arc<dyn PageFetcher>, on_failure: PolicyFetchFailure) -> Self {
        Self {
            fetcher,
            on_failure,
            policies: Mutex::new(HashMap::new()),
        }
    }

    /// Checks if `user_agent` may fetch `url`
    pub async fn is_allowed(&self, url: &Url, user_agent: &str) -> bool {
        let origin = match Origin::of(url) {
            Ok(origin) => origin,
            Err(e) => {
                tracing::warn!("No robots origin for {}: {}", url, e);
                return self.on_failure == PolicyFetchFailure::Allow;
            }
        };

        let policy = self.policy_for(&origin).await;
        let allowed = policy.is_allowed(url.as_str(), user_agent, self.on_failure);

        tracing::debug!(
            "robots: {} {} for {}",
            url,
            if allowed { "allowed" } else { "disallowed" },
            product_token(user_agent)
        );

        allowed
    }

    /// Returns the cached policy for an origin, loading it on first use
    pub async fn policy_for(&self, origin: &Origin) -> Arc<RobotsPolicy> {
        let slot = {
            let mut policies = self.policies.lock().unwrap_or_else(PoisonError::into_inner);
            policies
                .entry(origin.clone())
                .or_insert_with(|| Arc::new(OnceCell::new()))
                .clone()
        };

        slot.get_or_init(|| async { Arc::new(self.load(origin).await) })
            .await
            .clone()
    }

    /// Number of origins with a cached (or loading) policy
    pub fn cached_origins(&self) -> usize {
        self.policies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    async fn load(&self, origin: &Origin) -> RobotsPolicy {
        let robots_url = match origin.robots_url() {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!("Cannot build robots.txt URL for {}: {}", origin, e);
                return RobotsPolicy::unknown();
            }
        };

        let response = self.fetcher.get(&robots_url).await;
        let policy = RobotsPolicy::from_response(&response);

        if policy.load_failed {
            tracing::warn!(
                "robots.txt unavailable for {} ({}); defaulting to {:?}",
                origin,
                response
                    .error
                    .clone()
                    .or_else(|| response.status.map(|s| format!("status {}", s)))
                    .unwrap_or_else(|| "undecodable body".to_string()),
                self.on_failure
            );
        } else {
            tracing::debug!("Loaded robots.txt for {}", origin);
        }

        policy
    }
}
