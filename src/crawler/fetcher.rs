//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with proxy, timeout, and redirect settings
//! - GET requests with optional basic authentication
//! - Content-Type filtering (HTML only)
//! - Error classification into [`FetchFailure`] values
//!
//! One call is one request. Retries belong to the traversal engine.

use crate::config::HttpConfig;
use crate::state::FetchFailure;
use reqwest::{header::CONTENT_TYPE, redirect::Policy, Client, Proxy};
use std::time::Duration;

/// Result of a fetch operation
#[derive(Debug)]
pub enum FetchResult {
    /// Successfully fetched an HTML page
    Success {
        /// Final URL after redirects
        final_url: String,
        /// HTTP status code
        status_code: u16,
        /// Content-Type header value (None if the server sent none)
        content_type: Option<String>,
        /// Raw page body
        body: Vec<u8>,
    },

    /// The request did not produce an HTML page
    ///
    /// `NotHtml` carries the final URL and status so the caller can record
    /// the page as a leaf.
    Failed {
        failure: FetchFailure,
        final_url: Option<String>,
        status_code: Option<u16>,
    },
}

impl FetchResult {
    fn failed(failure: FetchFailure) -> Self {
        FetchResult::Failed {
            failure,
            final_url: None,
            status_code: None,
        }
    }
}

/// Credentials sent with every page request
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: Option<String>,
}

impl Credentials {
    /// Builds credentials from the HTTP config, if a username is set
    pub fn from_config(config: &HttpConfig) -> Option<Self> {
        config.username.as_ref().map(|username| Self {
            username: username.clone(),
            password: config.password.clone(),
        })
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The HTTP configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client (e.g. invalid proxy)
///
/// # Example
///
/// ```no_run
/// use sitemapper::config::HttpConfig;
/// use sitemapper::crawler::build_http_client;
///
/// let client = build_http_client(&HttpConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &HttpConfig) -> Result<Client, reqwest::Error> {
    let mut builder = Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(Duration::from_millis(config.timeout_ms))
        .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
        .redirect(Policy::limited(config.max_redirects))
        .gzip(true)
        .brotli(true);

    if config.no_proxy {
        builder = builder.no_proxy();
    } else if let Some(proxy) = &config.proxy {
        builder = builder.proxy(Proxy::all(proxy.as_str())?);
    }

    builder.build()
}

/// Returns true if a Content-Type denotes an HTML document
///
/// A missing Content-Type is treated as HTML.
pub fn is_html_content_type(content_type: Option<&str>) -> bool {
    let Some(content_type) = content_type else {
        return true;
    };
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    mime == "text/html" || mime == "application/xhtml+xml"
}

/// Fetches a URL once
///
/// # Request Flow
///
/// 1. Send GET request (redirects followed by the client)
/// 2. Non-success status → `HttpStatus`
/// 3. Non-HTML Content-Type → `NotHtml`
/// 4. Read the body, keeping at most `max_body_bytes`
///
/// | Condition | Result |
/// |-----------|--------|
/// | HTTP 2xx, HTML | Success |
/// | HTTP 2xx, other type | Failed(NotHtml) |
/// | HTTP 4xx/5xx | Failed(HttpStatus) |
/// | Timeout | Failed(Timeout) |
/// | Connection / TLS / redirect error | Failed(Network) |
///
/// # Arguments
///
/// * `client` - The HTTP client to use
/// * `url` - The URL to fetch
/// * `credentials` - Optional basic-auth credentials
/// * `max_body_bytes` - Body size cap; the rest of a longer body is dropped
pub async fn fetch_url(
    client: &Client,
    url: &str,
    credentials: Option<&Credentials>,
    max_body_bytes: usize,
) -> FetchResult {
    let mut request = client.get(url);
    if let Some(credentials) = credentials {
        request = request.basic_auth(&credentials.username, credentials.password.as_ref());
    }

    let mut response = match request.send().await {
        Ok(response) => response,
        Err(e) => return FetchResult::failed(classify_error(&e)),
    };

    let status = response.status();
    let final_url = response.url().to_string();

    if !status.is_success() {
        return FetchResult::Failed {
            failure: FetchFailure::HttpStatus(status.as_u16()),
            final_url: Some(final_url),
            status_code: Some(status.as_u16()),
        };
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    if !is_html_content_type(content_type.as_deref()) {
        return FetchResult::Failed {
            failure: FetchFailure::NotHtml {
                content_type: content_type.unwrap_or_default(),
            },
            final_url: Some(final_url),
            status_code: Some(status.as_u16()),
        };
    }

    let mut body = Vec::new();
    loop {
        match response.chunk().await {
            Ok(Some(chunk)) => {
                let room = max_body_bytes.saturating_sub(body.len());
                if chunk.len() > room {
                    body.extend_from_slice(&chunk[..room]);
                    tracing::debug!("Body of {} truncated at {} bytes", final_url, max_body_bytes);
                    break;
                }
                body.extend_from_slice(&chunk);
            }
            Ok(None) => break,
            Err(e) => return FetchResult::failed(classify_error(&e)),
        }
    }

    FetchResult::Success {
        final_url,
        status_code: status.as_u16(),
        content_type,
        body,
    }
}

/// Maps a reqwest error onto the failure taxonomy
fn classify_error(e: &reqwest::Error) -> FetchFailure {
    if e.is_timeout() {
        FetchFailure::Timeout
    } else if e.is_connect() {
        FetchFailure::Network(format!("connection failed: {}", e))
    } else if e.is_redirect() {
        FetchFailure::Network(format!("redirect error: {}", e))
    } else {
        FetchFailure::Network(e.to_string())
    }
}
