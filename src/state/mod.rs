//! State module for tracking traversal progress
//!
//! # Components
//!
//! - `FetchStatus`: lifecycle of a single URL (pending, fetching, fetched, failed, skipped)
//! - `FetchFailure`: why a fetch failed
//! - `SkipReason`: why a discovered URL was never fetched
//! - `HostState`: per-host request spacing used by the politeness scheduler

mod fetch_status;
mod host_state;

// Re-export main types
pub use fetch_status::{FetchFailure, FetchStatus, SkipReason};
pub use host_state::{HostState, MAX_HOST_DELAY};
