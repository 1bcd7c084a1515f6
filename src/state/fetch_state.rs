/// Fetch state definitions for the per-URL retry state machine
///
/// Every URL handed to the retry scheduler walks this machine exactly once:
///
/// ```text
/// Start -> RobotsCheck -> Blocked                          [terminal]
///                      -> Attempting -> Succeeded          [terminal]
///                                    -> StoreFailed        [terminal]
///                                    -> Attempting (retry)
///                                    -> Exhausted          [terminal]
/// ```
use crate::ScrapeError;
use std::fmt;

/// Represents the current state of one URL's fetch sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchState {
    // ===== Active States =====
    /// Request accepted, nothing done yet
    Start,

    /// Consulting the origin's robots policy
    RobotsCheck,

    /// Inside the attempt loop (waiting, backing off or on the wire)
    Attempting,

    // ===== Terminal States =====
    /// Robots policy disallows the URL; no network attempt was made
    Blocked,

    /// A response passed the success predicate and was persisted
    Succeeded,

    /// A response passed the success predicate but could not be persisted
    StoreFailed,

    /// Every allowed attempt failed
    Exhausted,
}

impl FetchState {
    /// Returns true if no further attempts will happen from this state
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Blocked | Self::Succeeded | Self::StoreFailed | Self::Exhausted
        )
    }

    /// Returns true if this represents a successful completion
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded)
    }

    /// Checks whether the machine may move from `self` to `next`
    pub fn can_transition_to(&self, next: FetchState) -> bool {
        use FetchState::*;

        matches!(
            (self, next),
            (Start, RobotsCheck)
                | (RobotsCheck, Blocked)
                | (RobotsCheck, Attempting)
                | (Attempting, Attempting)
                | (Attempting, Succeeded)
                | (Attempting, StoreFailed)
                | (Attempting, Exhausted)
        )
    }

    /// Moves to `next`, rejecting transitions the machine does not allow
    pub fn transition(self, next: FetchState) -> Result<FetchState, ScrapeError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(ScrapeError::InvalidTransition {
                from: self,
                to: next,
            })
        }
    }

    /// Short label used in status lines and logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::RobotsCheck => "robots_check",
            Self::Attempting => "attempting",
            Self::Blocked => "blocked",
            Self::Succeeded => "succeeded",
            Self::StoreFailed => "store_failed",
            Self::Exhausted => "exhausted",
        }
    }
}

impl fmt::Display for FetchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
