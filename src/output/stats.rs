//! Crawl statistics
//!
//! This module summarizes a finished sitemap: pages by state, skips by
//! reason, visited pages per depth, and failures by kind.

use crate::sitemap::Sitemap;
use crate::state::{FetchFailure, FetchStatus, SkipReason};
use std::collections::{BTreeMap, HashMap};

/// Crawl statistics summary
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CrawlStatistics {
    /// Total number of URLs discovered
    pub total_urls: u64,

    /// Pages fetched successfully
    pub fetched: u64,

    /// Pages whose fetch failed
    pub failed: u64,

    /// URLs never fetched, by reason
    pub skipped: HashMap<SkipReason, u64>,

    /// URLs still pending (the crawl was cancelled)
    pub pending: u64,

    /// Visited pages per depth
    pub pages_by_depth: BTreeMap<u32, u64>,

    /// Failures by kind (`timeout`, `network`, `http_404`, ...)
    pub failures: BTreeMap<String, u64>,

    /// Total number of link-graph edges
    pub total_links: u64,
}

impl CrawlStatistics {
    /// Computes statistics for a sitemap
    pub fn from_sitemap(sitemap: &Sitemap) -> Self {
        let mut stats = Self {
            total_urls: sitemap.len() as u64,
            total_links: sitemap.edge_count() as u64,
            ..Self::default()
        };

        for record in sitemap.pages() {
            match &record.status {
                FetchStatus::Pending | FetchStatus::Fetching => stats.pending += 1,
                FetchStatus::Fetched => stats.fetched += 1,
                FetchStatus::Failed(failure) => {
                    stats.failed += 1;
                    *stats.failures.entry(failure_kind(failure)).or_insert(0) += 1;
                }
                FetchStatus::Skipped(reason) => *stats.skipped.entry(*reason).or_insert(0) += 1,
            }

            if record.status.was_visited() {
                *stats.pages_by_depth.entry(record.depth).or_insert(0) += 1;
            }
        }

        stats
    }

    /// Number of pages a request was made for
    pub fn visited(&self) -> u64 {
        self.fetched + self.failed
    }

    /// Percentage of visited pages that were fetched successfully
    pub fn success_rate(&self) -> f64 {
        let visited = self.visited();
        if visited == 0 {
            0.0
        } else {
            (self.fetched as f64 / visited as f64) * 100.0
        }
    }

    pub fn skipped_for(&self, reason: SkipReason) -> u64 {
        self.skipped.get(&reason).copied().unwrap_or(0)
    }

    /// Logs the statistics at info level
    pub fn log(&self) {
        tracing::info!(
            "Crawl statistics: {} URLs, {} fetched, {} failed, {} pending, {} links",
            self.total_urls,
            self.fetched,
            self.failed,
            self.pending,
            self.total_links
        );
        tracing::info!(
            "Skipped: {} beyond max depth, {} off-site, {} disallowed by robots.txt",
            self.skipped_for(SkipReason::DepthExceeded),
            self.skipped_for(SkipReason::OutOfScope),
            self.skipped_for(SkipReason::RobotsDisallowed)
        );
        for (depth, count) in &self.pages_by_depth {
            tracing::info!("  depth {}: {} pages", depth, count);
        }
        for (kind, count) in &self.failures {
            tracing::info!("  {}: {} failures", kind, count);
        }
        tracing::info!("Success rate: {:.1}%", self.success_rate());
    }
}

fn failure_kind(failure: &FetchFailure) -> String {
    match failure {
        FetchFailure::Network(_) => "network".to_string(),
        FetchFailure::Timeout => "timeout".to_string(),
        FetchFailure::HttpStatus(code) => format!("http_{}", code),
        FetchFailure::NotHtml { .. } => "not_html".to_string(),
    }
}
