//! Robots.txt cache keyed by host

use crate::robots::ParsedRobots;
use std::collections::HashMap;

/// Parsed robots.txt per host key (`host:port`)
///
/// A traversal fetches each host's robots.txt at most once; the cache lives
/// as long as the traversal.
#[derive(Debug, Default)]
pub struct RobotsCache {
    entries: HashMap<String, ParsedRobots>,
}

impl RobotsCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the host's robots.txt has been fetched
    pub fn contains(&self, host: &str) -> bool {
        self.entries.contains_key(host)
    }

    pub fn insert(&mut self, host: String, robots: ParsedRobots) {
        self.entries.insert(host, robots);
    }

    /// Checks a URL against the cached rules for its host
    ///
    /// Hosts without a cached entry are allowed.
    pub fn is_allowed(&self, host: &str, url: &str, user_agent: &str) -> bool {
        self.entries
            .get(host)
            .map_or(true, |robots| robots.is_allowed(url, user_agent))
    }
}
