//! Minimum-delay pacing for outbound requests
//!
//! Every attempt sleeps the configured delay first. Sleeps run under a lane
//! lock, so callers sharing a lane take turns and never overlap their waits:
//! - `Global` scope: one lane for every destination (the sequential cadence)
//! - `PerOrigin` scope: one lane per origin, so origins pace independently

use crate::config::RateLimitScope;
use crate::url::Origin;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::Mutex as AsyncMutex;

type Lane = Arc<AsyncMutex<()>>;

/// Enforces a minimum delay before each outbound request
pub struct RateLimiter {
    scope: RateLimitScope,
    global: Lane,
    lanes: Mutex<HashMap<Origin, Lane>>,
}

impl RateLimiter {
    pub fn new(scope: RateLimitScope) -> Self {
        Self {
            scope,
            global: Arc::new(AsyncMutex::new(())),
            lanes: Mutex::new(HashMap::new()),
        }
    }

    pub fn scope(&self) -> RateLimitScope {
        self.scope
    }

    /// Blocks the caller for `min_delay` before an attempt to `origin`
    ///
    /// A zero delay returns immediately without touching any lane.
    pub async fn wait_for_slot(&self, origin: &Origin, min_delay: Duration) {
        if min_delay.is_zero() {
            return;
        }

        let lane = self.lane(origin);
        let _turn = lane.lock().await;
        tracing::trace!("rate limit: waiting {:?} before {}", min_delay, origin);
        tokio::time::sleep(min_delay).await;
    }

    fn lane(&self, origin: &Origin) -> Lane {
        match self.scope {
            RateLimitScope::Global => self.global.clone(),
            RateLimitScope::PerOrigin => self
                .lanes
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .entry(origin.clone())
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone(),
        }
    }
}
