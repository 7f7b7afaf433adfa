use crate::config::CrawlerConfig;
use crate::UrlError;
use std::fmt;
use url::Url;

/// List of tracking query parameters removed when tracking stripping is on
const TRACKING_PARAMS: &[&str] = &[
    "fbclid", "gclid", "mc_eid", "mc_cid", "msclkid", "_hsenc", "_hsmi",
];

/// A canonical URL key
///
/// Two raw URLs that are network-equivalent normalize to the same key. The
/// wrapped URL is always http or https, has a host, has no fragment, no
/// default port, and no empty query.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NormalizedUrl(Url);

impl NormalizedUrl {
    /// The canonical string form
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// The underlying parsed URL
    pub fn as_url(&self) -> &Url {
        &self.0
    }

    /// The lowercase host
    pub fn host(&self) -> &str {
        // Construction guarantees a host
        self.0.host_str().unwrap_or_default()
    }

    pub fn into_url(self) -> Url {
        self.0
    }
}

impl fmt::Display for NormalizedUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

impl AsRef<str> for NormalizedUrl {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

/// URL normalization policy
///
/// The default policy applies only rules that never merge two URLs a server
/// could answer differently. The two opt-in rules trade that guarantee for
/// fewer duplicates on sites known to ignore them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Normalizer {
    /// Remove a trailing `/` from non-root paths
    pub strip_trailing_slash: bool,

    /// Remove `utm_*` and similar tracking parameters
    pub strip_tracking_params: bool,
}

impl Normalizer {
    /// Builds the policy selected by the crawler configuration
    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self {
            strip_trailing_slash: config.strip_trailing_slash,
            strip_tracking_params: config.strip_tracking_params,
        }
    }

    /// Normalizes a raw URL, resolving it against `base` when relative
    ///
    /// # Normalization Steps
    ///
    /// 1. Resolve against the base (or parse as absolute); reject if malformed.
    ///    Parsing lowercases scheme and host, drops default ports (80/443),
    ///    and collapses `.`/`..` path segments.
    /// 2. Reject anything but http and https
    /// 3. Require a host
    /// 4. Remove the fragment
    /// 5. Optionally remove tracking query parameters
    /// 6. Remove an empty query (trailing `?`)
    /// 7. Optionally remove a trailing slash (except for root `/`)
    ///
    /// The result is idempotent: normalizing a normalized URL returns it
    /// unchanged.
    ///
    /// # Examples
    ///
    /// ```
    /// use sitemapper::url::Normalizer;
    ///
    /// let url = Normalizer::default()
    ///     .normalize("HTTP://Example.COM:80/a/./b/../c?#top", None)
    ///     .unwrap();
    /// assert_eq!(url.as_str(), "http://example.com/a/c");
    /// ```
    pub fn normalize(&self, raw: &str, base: Option<&NormalizedUrl>) -> Result<NormalizedUrl, UrlError> {
        self.normalize_against(raw, base.map(NormalizedUrl::as_url))
    }

    /// Normalizes a link found on a page, resolving it against any base URL
    ///
    /// The base is used as-is, so a page's final URL or `<base href>` keeps
    /// its exact path for relative resolution.
    pub fn resolve(&self, raw: &str, base: &Url) -> Result<NormalizedUrl, UrlError> {
        self.normalize_against(raw, Some(base))
    }

    fn normalize_against(&self, raw: &str, base: Option<&Url>) -> Result<NormalizedUrl, UrlError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(UrlError::Malformed("empty URL".to_string()));
        }

        // Step 1: Parse or resolve
        let parsed = match base {
            Some(base) => base.join(raw),
            None => Url::parse(raw),
        };
        let mut url = parsed.map_err(|e| UrlError::Malformed(format!("{}: {}", raw, e)))?;

        // Step 2: Validate scheme
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(UrlError::UnsupportedScheme(url.scheme().to_string()));
        }

        // Step 3: Require a host
        match url.host_str() {
            Some(host) if !host.is_empty() => {}
            _ => return Err(UrlError::MissingHost),
        }

        // Step 4: Remove fragment
        url.set_fragment(None);

        // Step 5: Filter tracking parameters
        if self.strip_tracking_params && url.query().is_some() {
            strip_tracking_params(&mut url);
        }

        // Step 6: Remove empty query
        if matches!(url.query(), Some("")) {
            url.set_query(None);
        }

        // Step 7: Trailing slash policy
        if self.strip_trailing_slash {
            let path = url.path();
            if path.len() > 1 && path.ends_with('/') {
                let trimmed = path.trim_end_matches('/');
                let trimmed = if trimmed.is_empty() { "/" } else { trimmed };
                let trimmed = trimmed.to_string();
                url.set_path(&trimmed);
            }
        }

        Ok(NormalizedUrl(url))
    }
}

/// Normalizes a URL with the default policy
///
/// # Examples
///
/// ```
/// use sitemapper::url::normalize_url;
///
/// let root = normalize_url("https://example.com/docs/", None).unwrap();
/// let link = normalize_url("../about#team", Some(&root)).unwrap();
/// assert_eq!(link.as_str(), "https://example.com/about");
/// ```
pub fn normalize_url(raw: &str, base: Option<&NormalizedUrl>) -> Result<NormalizedUrl, UrlError> {
    Normalizer::default().normalize(raw, base)
}

/// Removes tracking parameters, keeping the order of the remaining ones
fn strip_tracking_params(url: &mut Url) {
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    if !pairs.iter().any(|(key, _)| is_tracking_param(key)) {
        return;
    }

    let kept: Vec<&(String, String)> = pairs.iter().filter(|(key, _)| !is_tracking_param(key)).collect();
    if kept.is_empty() {
        url.set_query(None);
        return;
    }

    url.query_pairs_mut()
        .clear()
        .extend_pairs(kept.iter().map(|(k, v)| (k.as_str(), v.as_str())));
}

/// Checks if a query parameter is a tracking parameter
fn is_tracking_param(key: &str) -> bool {
    TRACKING_PARAMS.contains(&key) || key.starts_with("utm_")
}
