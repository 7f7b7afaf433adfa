//! Sitemapper: a breadth-first site mapper
//!
//! This crate starts from a root URL, follows hyperlinks within the site,
//! records the link graph together with per-page titles and summaries, and
//! renders the result as a nested list, a collapsible tree, plain text, or an
//! XML link graph.

pub mod config;
pub mod crawler;
pub mod output;
pub mod robots;
pub mod sitemap;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Sitemapper operations
///
/// Only conditions that abort the whole run end up here. Failures of
/// individual pages are recorded on the sitemap instead.
#[derive(Debug, Error)]
pub enum SitemapError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid root URL {url}: {source}")]
    InvalidRoot { url: String, source: UrlError },

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Invalid state transition for {url}: {from} -> {to}")]
    InvalidTransition {
        url: String,
        from: &'static str,
        to: &'static str,
    },

    #[error("Unknown page id {0}")]
    UnknownPage(usize),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
///
/// Both variants cause a discovered link to be skipped; neither is fatal
/// unless it concerns the root URL.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UrlError {
    #[error("Malformed URL: {0}")]
    Malformed(String),

    #[error("Unsupported URL scheme: {0}")]
    UnsupportedScheme(String),

    #[error("Missing host in URL")]
    MissingHost,
}

// Re-export commonly used types
pub use config::{Config, OutputFormat};
pub use crawler::{crawl, Crawler};
pub use sitemap::{PageId, PageRecord, Sitemap, TreeEvent};
pub use state::{FetchFailure, FetchStatus, SkipReason};
pub use url::{normalize_url, NormalizedUrl, Normalizer};
