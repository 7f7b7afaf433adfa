//! XML link graph renderer
//!
//! Unlike the tree renderers this ignores the BFS tree. Every known URL
//! becomes a `<page>` and every link-graph edge a `<link>`, including links to
//! off-site, depth-limited, and unfetched pages.

use crate::output::{display_summary, display_title, escape_xml, OutputResult, Renderer};
use crate::sitemap::Sitemap;
use std::io::Write;

/// Renders the full link graph as XML
#[derive(Debug, Clone, Copy, Default)]
pub struct GraphRenderer;

impl Renderer for GraphRenderer {
    fn render(&self, sitemap: &Sitemap, out: &mut dyn Write) -> OutputResult<()> {
        writeln!(out, "<?xml version=\"1.0\" encoding=\"UTF-8\"?>")?;
        write!(out, "<sitemap root=\"{}\"", escape_xml(sitemap.root().url.as_str()))?;
        if let Some(max_depth) = sitemap.max_depth() {
            write!(out, " max-depth=\"{}\"", max_depth)?;
        }
        writeln!(out, ">")?;

        writeln!(out, "  <pages>")?;
        for url in sitemap.all_urls() {
            let Some(record) = sitemap.get(url) else {
                continue;
            };
            let (status, detail) = record.status.to_db_parts();

            write!(
                out,
                "    <page id=\"{}\" url=\"{}\" depth=\"{}\" status=\"{}\"",
                record.id,
                escape_xml(url.as_str()),
                record.depth,
                status
            )?;
            if let Some(detail) = detail {
                write!(out, " reason=\"{}\"", escape_xml(&detail))?;
            }
            if let Some(code) = record.status_code {
                write!(out, " status-code=\"{}\"", code)?;
            }
            writeln!(out, ">")?;
            writeln!(out, "      <title>{}</title>", escape_xml(display_title(record)))?;
            writeln!(out, "      <summary>{}</summary>", escape_xml(display_summary(record)))?;
            writeln!(out, "    </page>")?;
        }
        writeln!(out, "  </pages>")?;

        writeln!(out, "  <links>")?;
        for url in sitemap.all_urls() {
            let from = escape_xml(url.as_str());
            for target in sitemap.links_from(url) {
                writeln!(out, "    <link from=\"{}\" to=\"{}\"/>", from, escape_xml(target.as_str()))?;
            }
        }
        writeln!(out, "  </links>")?;

        writeln!(out, "</sitemap>")?;
        out.flush()?;
        Ok(())
    }
}
