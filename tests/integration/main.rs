//! Integration tests for Sitemapper
//!
//! These tests use wiremock to create mock HTTP servers and test the full
//! crawl cycle end-to-end.

mod crawl_tests;
mod render_tests;

use sitemapper::config::Config;
use sitemapper::{normalize_url, NormalizedUrl, PageRecord, Sitemap};
use wiremock::ResponseTemplate;

/// Creates a test configuration rooted at the given URL
///
/// Retries back off quickly and the depth is unlimited.
pub fn test_config(root: &str) -> Config {
    let mut config = Config::default();
    config.crawler.root_url = Some(root.to_string());
    config.crawler.retry_backoff_ms = 10;
    config.http.user_agent = "TestBot/1.0".to_string();
    config.http.timeout_ms = 5_000;
    config
}

/// An HTML response with a title, a description and links
pub fn html_page(title: &str, links: &[&str]) -> ResponseTemplate {
    let anchors: String = links
        .iter()
        .map(|href| format!("<a href=\"{}\">link</a>\n", href))
        .collect();
    ResponseTemplate::new(200).set_body_raw(
        format!(
            "<html><head><title>{}</title><meta name=\"description\" content=\"About {}\">\
             </head><body>\n{}</body></html>",
            title, title, anchors
        ),
        "text/html; charset=utf-8",
    )
}

pub fn url(base: &str, path: &str) -> NormalizedUrl {
    normalize_url(&format!("{}{}", base, path), None).unwrap()
}

pub fn record<'a>(sitemap: &'a Sitemap, base: &str, path: &str) -> &'a PageRecord {
    sitemap
        .get(&url(base, path))
        .unwrap_or_else(|| panic!("{} not in sitemap", path))
}
