use crate::state::FetchStatus;
use crate::url::NormalizedUrl;

/// Dense index of a page in the sitemap arena, assigned at first discovery
pub type PageId = usize;

/// Everything known about one URL
///
/// Created when the URL is first discovered. The fetch outcome is written
/// exactly once, when the record reaches a terminal state.
#[derive(Debug, Clone, PartialEq)]
pub struct PageRecord {
    /// Arena index (also the discovery rank)
    pub id: PageId,

    /// Canonical URL
    pub url: NormalizedUrl,

    /// Discovery distance from the root
    pub depth: u32,

    /// Page this URL was first discovered on (None for the root)
    pub discovered_from: Option<PageId>,

    /// Current lifecycle state
    pub status: FetchStatus,

    /// Text of the first `<title>` element
    pub title: Option<String>,

    /// Meta description or leading body text
    pub summary: Option<String>,

    /// HTTP status of the final response
    pub status_code: Option<u16>,

    /// Content-Type advertised by the server
    pub content_type: Option<String>,

    /// URL after redirects, when different from `url`
    pub final_url: Option<String>,

    pub(crate) outbound: Vec<PageId>,
    pub(crate) children: Vec<PageId>,
}

impl PageRecord {
    pub(crate) fn new(id: PageId, url: NormalizedUrl, depth: u32, discovered_from: Option<PageId>) -> Self {
        Self {
            id,
            url,
            depth,
            discovered_from,
            status: FetchStatus::Pending,
            title: None,
            summary: None,
            status_code: None,
            content_type: None,
            final_url: None,
            outbound: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Outbound link targets, in first-seen order
    pub fn outbound(&self) -> &[PageId] {
        &self.outbound
    }

    /// Returns true if the page has no outbound links
    pub fn is_leaf(&self) -> bool {
        self.outbound.is_empty()
    }
}

/// Metadata written when a fetch finishes
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageMetadata {
    pub title: Option<String>,
    pub summary: Option<String>,
    pub status_code: Option<u16>,
    pub content_type: Option<String>,
    pub final_url: Option<String>,
}
