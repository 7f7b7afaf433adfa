use crate::url::NormalizedUrl;

/// The set of URLs the traversal is allowed to fetch
///
/// A URL is in scope when it lives on the root's host. The scheme may differ
/// (an http root may link to https pages of the same site), but an explicit
/// non-default port on either side must match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlScope {
    host: String,
    port: Option<u16>,
}

impl CrawlScope {
    /// Creates the scope rooted at the given URL
    pub fn new(root: &NormalizedUrl) -> Self {
        Self {
            host: root.host().to_string(),
            port: root.as_url().port(),
        }
    }

    /// Returns true if the URL may be fetched
    pub fn contains(&self, url: &NormalizedUrl) -> bool {
        url.host() == self.host && url.as_url().port() == self.port
    }

    /// The host this scope is bound to
    pub fn host(&self) -> &str {
        &self.host
    }
}
