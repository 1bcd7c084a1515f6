//! State module for tracking fetch progress
//!
//! `FetchState` is the per-URL state machine driven by the retry scheduler.

mod fetch_state;

pub use fetch_state::FetchState;
