use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// Default character budget for page summaries
pub const DEFAULT_SUMMARY_LENGTH: usize = 200;

/// Main configuration structure for Sitemapper
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    pub http: HttpConfig,
    pub output: OutputConfig,
}

/// Traversal behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CrawlerConfig {
    /// URL the traversal starts from
    pub root_url: Option<String>,

    /// Maximum discovery depth to fetch (None means unlimited)
    pub max_depth: Option<u32>,

    /// Maximum number of characters in a page summary
    pub summary_length: usize,

    /// Maximum number of simultaneous in-flight fetches
    pub max_concurrent_fetches: u32,

    /// Minimum time between request starts to the same host (milliseconds)
    pub politeness_delay_ms: u64,

    /// Retries for transient failures before a page is marked failed
    pub max_retries: u32,

    /// Base backoff between retries, doubled per attempt (milliseconds)
    pub retry_backoff_ms: u64,

    /// Whether robots.txt is fetched and obeyed
    pub respect_robots: bool,

    /// Stop issuing new fetches after this many seconds
    pub deadline_secs: Option<u64>,

    /// Treat `/dir/` and `/dir` as the same page
    pub strip_trailing_slash: bool,

    /// Drop utm_* and similar tracking parameters from query strings
    pub strip_tracking_params: bool,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            root_url: None,
            max_depth: None,
            summary_length: DEFAULT_SUMMARY_LENGTH,
            max_concurrent_fetches: 4,
            politeness_delay_ms: 0,
            max_retries: 2,
            retry_backoff_ms: 500,
            respect_robots: true,
            deadline_secs: None,
            strip_trailing_slash: false,
            strip_tracking_params: false,
        }
    }
}

/// HTTP client configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct HttpConfig {
    /// User-Agent header sent with every request
    pub user_agent: String,

    /// Per-request timeout (milliseconds)
    pub timeout_ms: u64,

    /// Connection establishment timeout (milliseconds)
    pub connect_timeout_ms: u64,

    /// Maximum redirect hops followed per request
    pub max_redirects: usize,

    /// Proxy URL used for all requests
    pub proxy: Option<String>,

    /// Ignore proxies from the environment
    pub no_proxy: bool,

    /// Basic-auth user name for the crawled site
    pub username: Option<String>,

    /// Basic-auth password for the crawled site
    pub password: Option<String>,

    /// Largest page body read; longer bodies are truncated
    pub max_body_bytes: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: format!("sitemapper/{}", env!("CARGO_PKG_VERSION")),
            timeout_ms: 30_000,
            connect_timeout_ms: 10_000,
            max_redirects: 10,
            proxy: None,
            no_proxy: false,
            username: None,
            password: None,
            max_body_bytes: 10 * 1024 * 1024,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Rendering format
    pub format: OutputFormat,

    /// Output file (None writes to stdout)
    pub path: Option<String>,

    /// SQLite file the finished sitemap is stored in
    pub database_path: Option<String>,
}

/// Output format selector
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Nested HTML list
    #[default]
    Html,
    /// Indented plain text
    Text,
    /// Collapsible HTML tree with inline script
    Js,
    /// Link graph as XML nodes and edges
    Xml,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::Text => "text",
            Self::Js => "js",
            Self::Xml => "xml",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "html" => Ok(Self::Html),
            "text" => Ok(Self::Text),
            "js" => Ok(Self::Js),
            "xml" => Ok(Self::Xml),
            other => Err(format!(
                "unknown format '{}', expected one of: html, text, js, xml",
                other
            )),
        }
    }
}
