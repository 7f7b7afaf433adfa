/// Fetch status definitions for tracking traversal progress
///
/// A URL moves through `Pending -> Fetching -> {Fetched, Failed}`. URLs that
/// are discovered but must not be fetched go straight from `Pending` to
/// `Skipped`. Terminal states never change again.
use std::fmt;

/// Why a fetch did not produce a usable page
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FetchFailure {
    /// Connection refused, DNS failure, TLS error, body read error, ...
    Network(String),

    /// The request exceeded the configured timeout
    Timeout,

    /// The server answered with a 4xx or 5xx status
    HttpStatus(u16),

    /// The response was not HTML; the engine treats this as a leaf page
    NotHtml { content_type: String },
}

impl FetchFailure {
    /// Returns true if retrying the request may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network(_) | Self::Timeout => true,
            Self::HttpStatus(code) => *code == 429 || (500..600).contains(code),
            Self::NotHtml { .. } => false,
        }
    }

    /// Converts the failure to a database string representation
    pub fn to_db_string(&self) -> String {
        match self {
            Self::Network(message) => format!("network:{}", message),
            Self::Timeout => "timeout".to_string(),
            Self::HttpStatus(code) => format!("http_status:{}", code),
            Self::NotHtml { content_type } => format!("not_html:{}", content_type),
        }
    }

    /// Parses a failure from its database string representation
    pub fn from_db_string(s: &str) -> Option<Self> {
        if s == "timeout" {
            return Some(Self::Timeout);
        }
        let (kind, detail) = s.split_once(':')?;
        match kind {
            "network" => Some(Self::Network(detail.to_string())),
            "http_status" => detail.parse().ok().map(Self::HttpStatus),
            "not_html" => Some(Self::NotHtml {
                content_type: detail.to_string(),
            }),
            _ => None,
        }
    }
}

impl fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network(message) => write!(f, "network error: {}", message),
            Self::Timeout => f.write_str("request timeout"),
            Self::HttpStatus(code) => write!(f, "HTTP {}", code),
            Self::NotHtml { content_type } => write!(f, "not HTML ({})", content_type),
        }
    }
}

/// Why a discovered URL was never fetched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipReason {
    /// Discovered beyond the configured maximum depth
    DepthExceeded,

    /// Lives outside the root's host
    OutOfScope,

    /// Disallowed by the host's robots.txt
    RobotsDisallowed,
}

impl SkipReason {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::DepthExceeded => "depth_exceeded",
            Self::OutOfScope => "out_of_scope",
            Self::RobotsDisallowed => "robots_disallowed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "depth_exceeded" => Some(Self::DepthExceeded),
            "out_of_scope" => Some(Self::OutOfScope),
            "robots_disallowed" => Some(Self::RobotsDisallowed),
            _ => None,
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_string())
    }
}

/// Represents the current state of a URL in the traversal
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FetchStatus {
    // ===== Active States =====
    /// Discovered and waiting in the frontier
    Pending,

    /// Request in flight
    Fetching,

    // ===== Terminal States =====
    /// Fetched successfully (HTML or a non-HTML leaf)
    Fetched,

    /// Fetch failed; the page contributes no outbound edges
    Failed(FetchFailure),

    /// Never fetched
    Skipped(SkipReason),
}

impl FetchStatus {
    /// Returns true if this is a terminal state
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending | Self::Fetching)
    }

    /// Returns true if the URL reached `Fetching` at some point
    ///
    /// Exactly the URLs in `Fetched` or `Failed` were visited.
    pub fn was_visited(&self) -> bool {
        matches!(self, Self::Fetched | Self::Failed(_))
    }

    /// Checks whether moving to `next` is a legal transition
    pub fn can_transition_to(&self, next: &FetchStatus) -> bool {
        match (self, next) {
            (Self::Pending, Self::Fetching) | (Self::Pending, Self::Skipped(_)) => true,
            (Self::Fetching, Self::Fetched) | (Self::Fetching, Self::Failed(_)) => true,
            _ => false,
        }
    }

    /// Short state name, as stored in the database
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Fetching => "fetching",
            Self::Fetched => "fetched",
            Self::Failed(_) => "failed",
            Self::Skipped(_) => "skipped",
        }
    }

    /// Splits the status into a state name and an optional detail string
    pub fn to_db_parts(&self) -> (&'static str, Option<String>) {
        let detail = match self {
            Self::Failed(failure) => Some(failure.to_db_string()),
            Self::Skipped(reason) => Some(reason.to_db_string().to_string()),
            _ => None,
        };
        (self.kind(), detail)
    }

    /// Rebuilds a status from its database parts
    ///
    /// Returns None if the parts don't describe a known state.
    pub fn from_db_parts(kind: &str, detail: Option<&str>) -> Option<Self> {
        match kind {
            "pending" => Some(Self::Pending),
            "fetching" => Some(Self::Fetching),
            "fetched" => Some(Self::Fetched),
            "failed" => detail.and_then(FetchFailure::from_db_string).map(Self::Failed),
            "skipped" => detail.and_then(SkipReason::from_db_string).map(Self::Skipped),
            _ => None,
        }
    }
}

impl fmt::Display for FetchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Failed(failure) => write!(f, "failed ({})", failure),
            Self::Skipped(reason) => write!(f, "skipped ({})", reason),
            other => f.write_str(other.kind()),
        }
    }
}
