//! Sitemap store
//!
//! The sitemap is an arena of [`PageRecord`]s indexed by [`PageId`], with a
//! map from [`NormalizedUrl`] to id. Outbound links and BFS tree children are
//! stored as id lists, so the cyclic link graph never needs pointer cycles.
//!
//! The traversal engine is the only writer. Readers (renderers, statistics,
//! storage) work on a finished sitemap.

mod record;
mod traverse;

pub use record::{PageId, PageMetadata, PageRecord};
pub use traverse::{TreeEvent, TreeEvents};

use crate::state::FetchStatus;
use crate::url::NormalizedUrl;
use crate::SitemapError;
use std::collections::HashMap;

/// Aggregate of all page records and link edges of one traversal
#[derive(Debug, Clone)]
pub struct Sitemap {
    max_depth: Option<u32>,
    records: Vec<PageRecord>,
    index: HashMap<NormalizedUrl, PageId>,
    visit_order: Vec<PageId>,
    edge_count: usize,
}

impl Sitemap {
    /// Creates a sitemap holding only the root, pending at depth 0
    pub fn new(root: NormalizedUrl, max_depth: Option<u32>) -> Self {
        let mut index = HashMap::new();
        index.insert(root.clone(), 0);
        Self {
            max_depth,
            records: vec![PageRecord::new(0, root, 0, None)],
            index,
            visit_order: Vec::new(),
            edge_count: 0,
        }
    }

    /// The root record
    pub fn root(&self) -> &PageRecord {
        &self.records[0]
    }

    pub fn root_id(&self) -> PageId {
        0
    }

    /// Configured depth limit (None means unlimited)
    pub fn max_depth(&self) -> Option<u32> {
        self.max_depth
    }

    /// Number of known URLs
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Registers a URL discovered on `parent`
    ///
    /// The first discovery wins: a URL already known keeps its depth and
    /// parent, and the call returns its existing id with `false`. A new URL
    /// gets the next id, depth `parent.depth + 1`, and becomes the parent's
    /// next BFS tree child.
    pub fn discover(&mut self, url: NormalizedUrl, parent: PageId) -> Result<(PageId, bool), SitemapError> {
        if let Some(&id) = self.index.get(&url) {
            return Ok((id, false));
        }

        let parent_depth = self
            .records
            .get(parent)
            .map(|record| record.depth)
            .ok_or(SitemapError::UnknownPage(parent))?;

        let id = self.records.len();
        self.records
            .push(PageRecord::new(id, url.clone(), parent_depth + 1, Some(parent)));
        self.index.insert(url, id);
        self.records[parent].children.push(id);
        Ok((id, true))
    }

    /// Moves a record to a new state, enforcing the lifecycle
    pub fn transition(&mut self, id: PageId, next: FetchStatus) -> Result<(), SitemapError> {
        let record = self.records.get_mut(id).ok_or(SitemapError::UnknownPage(id))?;
        if !record.status.can_transition_to(&next) {
            return Err(SitemapError::InvalidTransition {
                url: record.url.to_string(),
                from: record.status.kind(),
                to: next.kind(),
            });
        }
        if next == FetchStatus::Fetching {
            self.visit_order.push(id);
        }
        record.status = next;
        Ok(())
    }

    /// Records the outcome of a fetch
    ///
    /// The record must be `Fetching`; it moves to the given terminal status
    /// and its metadata is written once.
    pub fn record(&mut self, id: PageId, status: FetchStatus, metadata: PageMetadata) -> Result<(), SitemapError> {
        self.transition(id, status)?;
        let record = &mut self.records[id];
        record.title = metadata.title;
        record.summary = metadata.summary;
        record.status_code = metadata.status_code;
        record.content_type = metadata.content_type;
        record.final_url = metadata.final_url;
        Ok(())
    }

    /// Adds link-graph edges from one page, ignoring duplicates
    pub fn add_edges(&mut self, from: PageId, to: &[PageId]) -> Result<(), SitemapError> {
        if let Some(&bad) = to.iter().find(|&&id| id >= self.records.len()) {
            return Err(SitemapError::UnknownPage(bad));
        }
        let record = self.records.get_mut(from).ok_or(SitemapError::UnknownPage(from))?;
        for &target in to {
            if !record.outbound.contains(&target) {
                record.outbound.push(target);
                self.edge_count += 1;
            }
        }
        Ok(())
    }

    /// Looks up a record by URL
    pub fn get(&self, url: &NormalizedUrl) -> Option<&PageRecord> {
        self.index.get(url).map(|&id| &self.records[id])
    }

    /// Looks up a record by id
    pub fn get_by_id(&self, id: PageId) -> Option<&PageRecord> {
        self.records.get(id)
    }

    pub fn id_of(&self, url: &NormalizedUrl) -> Option<PageId> {
        self.index.get(url).copied()
    }

    /// All known URLs, in discovery order
    pub fn all_urls(&self) -> impl Iterator<Item = &NormalizedUrl> {
        self.records.iter().map(|record| &record.url)
    }

    /// All records, in discovery order
    pub fn pages(&self) -> impl Iterator<Item = &PageRecord> {
        self.records.iter()
    }

    /// Outbound link targets of a URL, in first-seen order
    pub fn links_from(&self, url: &NormalizedUrl) -> Vec<&NormalizedUrl> {
        self.get(url)
            .map(|record| {
                record
                    .outbound
                    .iter()
                    .map(|&target| &self.records[target].url)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Every link-graph edge as `(from, to)` ids
    pub fn edges(&self) -> impl Iterator<Item = (PageId, PageId)> + '_ {
        self.records
            .iter()
            .flat_map(|record| record.outbound.iter().map(move |&to| (record.id, to)))
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// Ids in the order they entered `Fetching`
    pub fn visit_order(&self) -> &[PageId] {
        &self.visit_order
    }

    /// BFS tree children that belong in the tree view
    ///
    /// Only children that were actually visited (fetched or failed) are
    /// included, so depth-limited, off-site, and unfetched URLs stay out.
    pub fn tree_children(&self, id: PageId) -> impl Iterator<Item = &PageRecord> + '_ {
        self.records
            .get(id)
            .map(|record| record.children.as_slice())
            .unwrap_or_default()
            .iter()
            .map(|&child| &self.records[child])
            .filter(|child| child.status.was_visited())
    }

    /// Lazy pre-order event stream over the BFS tree
    pub fn events(&self) -> TreeEvents<'_> {
        TreeEvents::new(self)
    }

    /// Drives a visitor with the tree events, stopping at its first error
    pub fn traverse<F, E>(&self, mut visit: F) -> Result<(), E>
    where
        F: FnMut(TreeEvent<'_>) -> Result<(), E>,
    {
        for event in self.events() {
            visit(event)?;
        }
        Ok(())
    }

    /// Rebuilds a sitemap from stored records and edges
    ///
    /// Records must be ordered by id with ids `0..n`; children lists are
    /// derived from `discovered_from` in id order.
    pub(crate) fn restore(
        max_depth: Option<u32>,
        mut records: Vec<PageRecord>,
        edges: &[(PageId, PageId)],
        visit_order: Vec<PageId>,
    ) -> Result<Self, SitemapError> {
        if records.is_empty() {
            return Err(SitemapError::UnknownPage(0));
        }
        let mut index = HashMap::with_capacity(records.len());
        for (position, record) in records.iter_mut().enumerate() {
            if record.id != position {
                return Err(SitemapError::UnknownPage(record.id));
            }
            record.outbound.clear();
            record.children.clear();
            index.insert(record.url.clone(), position);
        }
        for id in 0..records.len() {
            if let Some(parent) = records[id].discovered_from {
                if parent >= records.len() {
                    return Err(SitemapError::UnknownPage(parent));
                }
                records[parent].children.push(id);
            }
        }

        let mut sitemap = Self {
            max_depth,
            records,
            index,
            visit_order,
            edge_count: 0,
        };
        for &(from, to) in edges {
            sitemap.add_edges(from, &[to])?;
        }
        Ok(sitemap)
    }
}
