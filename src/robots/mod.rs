//! Robots.txt handling module
//!
//! This module fetches, parses, and caches robots.txt files so the traversal
//! can skip disallowed URLs and honor Crawl-delay.

mod cache;
mod parser;

pub use cache::RobotsCache;
pub use parser::{ParsedRobots, MAX_CRAWL_DELAY};

use reqwest::{Client, StatusCode};
use url::Url;

/// Fetches robots.txt for the host of `url`
///
/// Any failure (network error, non-success status, unreadable body) yields an
/// allow-all result: a missing robots.txt means no restrictions.
///
/// # Arguments
///
/// * `client` - The HTTP client to use
/// * `url` - Any URL on the host
pub async fn fetch_robots(client: &Client, url: &Url) -> ParsedRobots {
    let mut robots_url = url.clone();
    robots_url.set_path("/robots.txt");
    robots_url.set_query(None);
    robots_url.set_fragment(None);

    tracing::debug!("Fetching {}", robots_url);

    match client.get(robots_url.as_str()).send().await {
        Ok(response) if response.status() == StatusCode::OK => match response.text().await {
            Ok(body) => ParsedRobots::from_content(&body),
            Err(e) => {
                tracing::debug!("Unreadable robots.txt at {}: {}", robots_url, e);
                ParsedRobots::allow_all()
            }
        },
        Ok(response) => {
            tracing::debug!("No robots.txt at {} (HTTP {})", robots_url, response.status());
            ParsedRobots::allow_all()
        }
        Err(e) => {
            tracing::debug!("Failed to fetch {}: {}", robots_url, e);
            ParsedRobots::allow_all()
        }
    }
}
