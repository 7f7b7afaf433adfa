//! Output module for rendering sitemaps
//!
//! This module handles:
//! - The [`Renderer`] abstraction, selected once per run from the format
//! - Nested tree documents (HTML list, plain text, collapsible JS tree)
//! - The XML link graph
//! - Crawl statistics

mod escape;
mod graph;
pub mod stats;
mod tree;

pub use escape::{escape_html, escape_xml};
pub use graph::GraphRenderer;
pub use stats::CrawlStatistics;
pub use tree::{TreeRenderer, TreeStyle};

use crate::config::OutputFormat;
use crate::sitemap::{PageRecord, Sitemap};
use std::io::Write;
use thiserror::Error;

/// Placeholder for pages without a title
pub const UNTITLED: &str = "(untitled)";

/// Placeholder for pages without a summary
pub const NO_SUMMARY: &str = "(no summary)";

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to format output: {0}")]
    Format(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Turns a finished sitemap into a document
pub trait Renderer {
    /// Writes the complete document to `out`
    fn render(&self, sitemap: &Sitemap, out: &mut dyn Write) -> OutputResult<()>;

    /// Renders into a string
    fn render_to_string(&self, sitemap: &Sitemap) -> OutputResult<String> {
        let mut buffer = Vec::new();
        self.render(sitemap, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| OutputError::Format(e.to_string()))
    }
}

/// Selects the renderer for an output format
///
/// # Example
///
/// ```
/// use sitemapper::output::renderer_for;
/// use sitemapper::OutputFormat;
///
/// let renderer = renderer_for(OutputFormat::Xml);
/// ```
pub fn renderer_for(format: OutputFormat) -> Box<dyn Renderer> {
    match format {
        OutputFormat::Html => Box::new(TreeRenderer::new(TreeStyle::Html)),
        OutputFormat::Text => Box::new(TreeRenderer::new(TreeStyle::Text)),
        OutputFormat::Js => Box::new(TreeRenderer::new(TreeStyle::Js)),
        OutputFormat::Xml => Box::new(GraphRenderer),
    }
}

/// Title to display for a page
pub(crate) fn display_title(record: &PageRecord) -> &str {
    record.title.as_deref().unwrap_or(UNTITLED)
}

/// Summary to display for a page
pub(crate) fn display_summary(record: &PageRecord) -> &str {
    record.summary.as_deref().unwrap_or(NO_SUMMARY)
}
