use std::time::{Duration, Instant};

/// Longest spacing ever applied between two requests to one host
pub const MAX_HOST_DELAY: Duration = Duration::from_secs(3600);

/// Tracks the state of a host during traversal
///
/// Used by the politeness scheduler to space request starts to the same
/// host. Slots are reserved rather than checked, so concurrent workers never
/// pick the same instant.
#[derive(Debug, Clone, Default)]
pub struct HostState {
    /// Start time reserved by the most recent request
    pub last_slot: Option<Instant>,

    /// Crawl-delay advertised by robots.txt
    pub crawl_delay: Option<Duration>,
}

impl HostState {
    pub fn new() -> Self {
        Self::default()
    }

    /// The spacing to use for this host
    ///
    /// This takes the maximum of the configured delay and the robots.txt
    /// crawl delay, if any.
    pub fn effective_delay(&self, configured: Duration) -> Duration {
        let delay = match self.crawl_delay {
            Some(robots_delay) => configured.max(robots_delay),
            None => configured,
        };
        delay.min(MAX_HOST_DELAY)
    }

    /// Reserves the next request slot and returns when it starts
    ///
    /// The slot is `now` if the host is idle long enough, otherwise the
    /// previous slot plus the effective delay.
    pub fn reserve_slot(&mut self, now: Instant, configured: Duration) -> Instant {
        let delay = self.effective_delay(configured);
        let slot = match self.last_slot {
            Some(last) => std::cmp::max(now, last.checked_add(delay).unwrap_or(last)),
            None => now,
        };
        self.last_slot = Some(slot);
        slot
    }
}
