//! Visitor protocol over the BFS tree
//!
//! The stream starts with `Visit(root)`. Every node with tree children is
//! followed by `StartChildren(node)`, the children's own streams in discovery
//! order, and `EndChildren(node)`. Nodes without tree children produce no
//! Start/End pair. The result is a stack-balanced pre-order walk.

use crate::sitemap::{PageId, PageRecord, Sitemap};

/// One event of the tree walk
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TreeEvent<'a> {
    /// The children of this page follow
    StartChildren(&'a PageRecord),

    /// A page in the tree; its depth, title and summary live on the record
    Visit(&'a PageRecord),

    /// The children of this page are done
    EndChildren(&'a PageRecord),
}

#[derive(Debug, Clone, Copy)]
enum Step {
    Visit(PageId),
    Open(PageId),
    Close(PageId),
}

/// Lazy iterator over [`TreeEvent`]s
///
/// Holds only a stack of pending steps, never the full event list.
pub struct TreeEvents<'a> {
    sitemap: &'a Sitemap,
    stack: Vec<Step>,
}

impl<'a> TreeEvents<'a> {
    pub(crate) fn new(sitemap: &'a Sitemap) -> Self {
        Self {
            sitemap,
            stack: vec![Step::Visit(sitemap.root_id())],
        }
    }
}

impl<'a> Iterator for TreeEvents<'a> {
    type Item = TreeEvent<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let sitemap = self.sitemap;
        let step = self.stack.pop()?;
        match step {
            Step::Visit(id) => {
                let record = sitemap.get_by_id(id)?;
                let children: Vec<PageId> = sitemap.tree_children(id).map(|child| child.id).collect();
                if !children.is_empty() {
                    // Popped in reverse: Open, children in order, Close
                    self.stack.push(Step::Close(id));
                    self.stack
                        .extend(children.iter().rev().map(|&child| Step::Visit(child)));
                    self.stack.push(Step::Open(id));
                }
                Some(TreeEvent::Visit(record))
            }
            Step::Open(id) => sitemap.get_by_id(id).map(TreeEvent::StartChildren),
            Step::Close(id) => sitemap.get_by_id(id).map(TreeEvent::EndChildren),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sitemap::PageMetadata;
    use crate::state::{FetchFailure, FetchStatus, SkipReason};
    use crate::url::{normalize_url, NormalizedUrl};

    fn url(path: &str) -> NormalizedUrl {
        normalize_url(&format!("https://example.com{}", path), None).unwrap()
    }

    fn visit(sitemap: &mut Sitemap, id: PageId) {
        sitemap.transition(id, FetchStatus::Fetching).unwrap();
        sitemap
            .record(id, FetchStatus::Fetched, PageMetadata::default())
            .unwrap();
    }

    fn describe(sitemap: &Sitemap) -> Vec<String> {
        sitemap
            .events()
            .map(|event| match event {
                TreeEvent::StartChildren(r) => format!("start {}", r.url.as_url().path()),
                TreeEvent::Visit(r) => format!("visit {} {}", r.url.as_url().path(), r.depth),
                TreeEvent::EndChildren(r) => format!("end {}", r.url.as_url().path()),
            })
            .collect()
    }

    #[test]
    fn test_single_root() {
        let mut sitemap = Sitemap::new(url("/"), None);
        visit(&mut sitemap, 0);
        assert_eq!(describe(&sitemap), vec!["visit / 0"]);
    }

    #[test]
    fn test_preorder_nesting() {
        // A -> B, C ; B -> D
        let mut sitemap = Sitemap::new(url("/"), None);
        visit(&mut sitemap, 0);
        let (b, _) = sitemap.discover(url("/b"), 0).unwrap();
        let (c, _) = sitemap.discover(url("/c"), 0).unwrap();
        visit(&mut sitemap, b);
        visit(&mut sitemap, c);
        let (d, _) = sitemap.discover(url("/d"), b).unwrap();
        visit(&mut sitemap, d);

        assert_eq!(
            describe(&sitemap),
            vec![
                "visit / 0",
                "start /",
                "visit /b 1",
                "start /b",
                "visit /d 2",
                "end /b",
                "visit /c 1",
                "end /",
            ]
        );
    }

    #[test]
    fn test_unvisited_children_hidden() {
        let mut sitemap = Sitemap::new(url("/"), Some(0));
        visit(&mut sitemap, 0);
        let (a, _) = sitemap.discover(url("/a"), 0).unwrap();
        sitemap
            .transition(a, FetchStatus::Skipped(SkipReason::DepthExceeded))
            .unwrap();

        assert_eq!(describe(&sitemap), vec!["visit / 0"]);
    }

    #[test]
    fn test_failed_child_is_a_leaf() {
        let mut sitemap = Sitemap::new(url("/"), None);
        visit(&mut sitemap, 0);
        let (a, _) = sitemap.discover(url("/a"), 0).unwrap();
        sitemap.transition(a, FetchStatus::Fetching).unwrap();
        sitemap
            .record(a, FetchStatus::Failed(FetchFailure::Timeout), PageMetadata::default())
            .unwrap();

        assert_eq!(describe(&sitemap), vec!["visit / 0", "start /", "visit /a 1", "end /"]);
    }

    #[test]
    fn test_well_nested_and_depth_ordered() {
        // Deterministic pseudo-random graph: each page links to a few others
        let mut sitemap = Sitemap::new(url("/"), None);
        let mut frontier = vec![0];
        let mut seed: u64 = 0x9e37_79b9;
        while let Some(id) = frontier.pop() {
            if sitemap.get_by_id(id).unwrap().status != FetchStatus::Pending {
                continue;
            }
            visit(&mut sitemap, id);
            for _ in 0..3 {
                seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                let target = (seed >> 33) % 40;
                let (child, is_new) = sitemap.discover(url(&format!("/p{}", target)), id).unwrap();
                sitemap.add_edges(id, &[child]).unwrap();
                if is_new {
                    frontier.insert(0, child);
                }
            }
        }

        let mut stack: Vec<PageId> = Vec::new();
        let mut last_visit: Option<&PageRecord> = None;
        for event in sitemap.events() {
            match event {
                TreeEvent::StartChildren(parent) => {
                    assert_eq!(last_visit.map(|r| r.id), Some(parent.id));
                    stack.push(parent.id);
                }
                TreeEvent::Visit(record) => {
                    match stack.last() {
                        Some(&parent) => {
                            assert_eq!(record.discovered_from, Some(parent));
                            let parent_depth = sitemap.get_by_id(parent).unwrap().depth;
                            assert_eq!(record.depth, parent_depth + 1);
                        }
                        None => assert_eq!(record.id, 0),
                    }
                    last_visit = Some(record);
                }
                TreeEvent::EndChildren(parent) => {
                    assert_eq!(stack.pop(), Some(parent.id));
                }
            }
        }
        assert!(stack.is_empty());
    }
}
