//! Per-host politeness scheduling
//!
//! This module handles:
//! - Spacing request starts to the same host by the configured delay
//! - Integrating robots.txt crawl delays
//!
//! Workers call [`Politeness::wait_turn`] before each request. The slot is
//! reserved under the lock and the sleep happens outside it, so concurrent
//! workers for one host queue up at distinct instants.

use crate::state::HostState;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Politeness scheduler shared by all fetch workers
#[derive(Debug)]
pub struct Politeness {
    /// Configured minimum spacing between request starts per host
    delay: Duration,

    /// Per-host state tracking
    hosts: Mutex<HashMap<String, HostState>>,
}

impl Politeness {
    /// Creates a new scheduler
    ///
    /// # Arguments
    ///
    /// * `delay` - The configured per-host delay
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            hosts: Mutex::new(HashMap::new()),
        }
    }

    /// Records a robots.txt Crawl-delay for a host
    pub async fn set_crawl_delay(&self, host: &str, crawl_delay: Duration) {
        let mut hosts = self.hosts.lock().await;
        hosts.entry(host.to_string()).or_default().crawl_delay = Some(crawl_delay);
    }

    /// Waits until a request to `host` may start
    ///
    /// # Returns
    ///
    /// The time spent waiting
    pub async fn wait_turn(&self, host: &str) -> Duration {
        let now = Instant::now();
        let slot = {
            let mut hosts = self.hosts.lock().await;
            let state = hosts.entry(host.to_string()).or_default();
            Instant::from_std(state.reserve_slot(now.into_std(), self.delay))
        };

        if slot > now {
            tracing::trace!("Waiting {:?} for {}", slot - now, host);
            tokio::time::sleep_until(slot).await;
        }
        slot.saturating_duration_since(now)
    }
}
