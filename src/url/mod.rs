//! URL handling module for Sitemapper
//!
//! This module provides URL normalization, the canonical [`NormalizedUrl`]
//! key, host extraction for per-host bookkeeping, and the crawl scope test.

mod domain;
mod normalize;
mod scope;

// Re-export main functions
pub use domain::host_key;
pub use normalize::{normalize_url, NormalizedUrl, Normalizer};
pub use scope::CrawlScope;
