//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with content-type filtering
//! - HTML parsing and link extraction
//! - Per-host politeness scheduling
//! - The breadth-first traversal engine

mod engine;
mod fetcher;
mod parser;
mod scheduler;

pub use engine::{crawl, Crawler};
pub use fetcher::{build_http_client, fetch_url, is_html_content_type, Credentials, FetchResult};
pub use parser::{extract, truncate_summary, ExtractedPage};
pub use scheduler::Politeness;
