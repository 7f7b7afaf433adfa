//! Tree renderers
//!
//! All three styles consume the sitemap's [`TreeEvent`] stream and write as
//! they go, so the document is never assembled in memory.

use crate::output::{display_summary, display_title, escape_html, OutputResult, Renderer};
use crate::sitemap::{PageRecord, Sitemap, TreeEvent};
use crate::state::FetchStatus;
use std::io::{self, Write};

/// Layout of a tree document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeStyle {
    /// Nested `<ul>` lists in an HTML page
    Html,

    /// Indented plain text
    Text,

    /// HTML page with a collapsible tree built by an embedded script
    Js,
}

/// Renders the BFS tree of a sitemap
#[derive(Debug, Clone, Copy)]
pub struct TreeRenderer {
    style: TreeStyle,
}

impl TreeRenderer {
    pub fn new(style: TreeStyle) -> Self {
        Self { style }
    }

    pub fn style(&self) -> TreeStyle {
        self.style
    }
}

impl Renderer for TreeRenderer {
    fn render(&self, sitemap: &Sitemap, out: &mut dyn Write) -> OutputResult<()> {
        match self.style {
            TreeStyle::Html => render_html(sitemap, out)?,
            TreeStyle::Text => render_text(sitemap, out)?,
            TreeStyle::Js => render_js(sitemap, out)?,
        }
        out.flush()?;
        Ok(())
    }
}

fn has_tree_children(sitemap: &Sitemap, record: &PageRecord) -> bool {
    sitemap.tree_children(record.id).next().is_some()
}

/// Failure text shown next to a page, if any
fn failure_note(record: &PageRecord) -> Option<String> {
    match &record.status {
        FetchStatus::Failed(failure) => Some(failure.to_string()),
        FetchStatus::Pending => Some("not fetched".to_string()),
        FetchStatus::Skipped(reason) => Some(format!("skipped: {}", reason)),
        _ => None,
    }
}

fn indent(depth: u32) -> String {
    "  ".repeat(depth as usize)
}

fn render_html(sitemap: &Sitemap, out: &mut dyn Write) -> io::Result<()> {
    let root = escape_html(sitemap.root().url.as_str());

    writeln!(out, "<!DOCTYPE html>")?;
    writeln!(out, "<html>")?;
    writeln!(out, "<head>")?;
    writeln!(out, "<meta charset=\"utf-8\">")?;
    writeln!(out, "<title>Sitemap of {}</title>", root)?;
    writeln!(out, "</head>")?;
    writeln!(out, "<body>")?;
    writeln!(out, "<h1>Sitemap of {}</h1>", root)?;
    writeln!(out, "<ul class=\"sitemap\">")?;

    sitemap.traverse(|event| match event {
        TreeEvent::Visit(record) => {
            let pad = indent(record.depth * 2 + 1);
            write!(
                out,
                "{}<li><a href=\"{}\">{}</a>",
                pad,
                escape_html(record.url.as_str()),
                escape_html(display_title(record))
            )?;
            if let Some(note) = failure_note(record) {
                write!(out, " <em class=\"status\">{}</em>", escape_html(&note))?;
            }
            write!(
                out,
                " <span class=\"summary\">{}</span>",
                escape_html(display_summary(record))
            )?;
            if has_tree_children(sitemap, record) {
                writeln!(out)
            } else {
                writeln!(out, "</li>")
            }
        }
        TreeEvent::StartChildren(record) => writeln!(out, "{}<ul>", indent(record.depth * 2 + 2)),
        TreeEvent::EndChildren(record) => {
            writeln!(out, "{}</ul>", indent(record.depth * 2 + 2))?;
            writeln!(out, "{}</li>", indent(record.depth * 2 + 1))
        }
    })?;

    writeln!(out, "</ul>")?;
    writeln!(out, "</body>")?;
    writeln!(out, "</html>")
}

fn render_text(sitemap: &Sitemap, out: &mut dyn Write) -> io::Result<()> {
    sitemap.traverse(|event| {
        let TreeEvent::Visit(record) = event else {
            return Ok(());
        };
        let pad = indent(record.depth);
        write!(out, "{}{} <{}>", pad, display_title(record), record.url)?;
        if let Some(note) = failure_note(record) {
            write!(out, " [{}]", note)?;
        }
        writeln!(out)?;
        writeln!(out, "{}  {}", pad, display_summary(record))
    })
}

const JS_STYLE: &str = r#"<style>
body { font-family: sans-serif; }
#sitemap ul { list-style: none; padding-left: 1.2em; }
#sitemap .toggle { cursor: pointer; display: inline-block; width: 1em; }
#sitemap .collapsed > ul { display: none; }
#sitemap .summary { color: #666; font-size: 0.9em; margin-left: 0.5em; }
#sitemap .status { color: #b00; margin-left: 0.5em; }
</style>"#;

const JS_SCRIPT: &str = r#"(function () {
  function build(node) {
    var li = document.createElement("li");
    var toggle = document.createElement("span");
    toggle.className = "toggle";
    li.appendChild(toggle);
    var link = document.createElement("a");
    link.href = node.url;
    link.textContent = node.title;
    li.appendChild(link);
    if (node.status) {
      var status = document.createElement("span");
      status.className = "status";
      status.textContent = node.status;
      li.appendChild(status);
    }
    var summary = document.createElement("span");
    summary.className = "summary";
    summary.textContent = node.summary;
    li.appendChild(summary);
    if (node.children && node.children.length) {
      toggle.textContent = "\u25be";
      toggle.onclick = function () {
        var collapsed = li.classList.toggle("collapsed");
        toggle.textContent = collapsed ? "\u25b8" : "\u25be";
      };
      var list = document.createElement("ul");
      node.children.forEach(function (child) { list.appendChild(build(child)); });
      li.appendChild(list);
    }
    return li;
  }
  var root = document.createElement("ul");
  root.appendChild(build(sitemap));
  document.getElementById("sitemap").appendChild(root);
})();"#;

/// A JSON string literal that is safe inside `<script>`
fn script_string(text: &str) -> io::Result<String> {
    let json = serde_json::to_string(text)?;
    Ok(json.replace('<', "\\u003c"))
}

fn render_js(sitemap: &Sitemap, out: &mut dyn Write) -> io::Result<()> {
    let root = escape_html(sitemap.root().url.as_str());

    writeln!(out, "<!DOCTYPE html>")?;
    writeln!(out, "<html>")?;
    writeln!(out, "<head>")?;
    writeln!(out, "<meta charset=\"utf-8\">")?;
    writeln!(out, "<title>Sitemap of {}</title>", root)?;
    writeln!(out, "{}", JS_STYLE)?;
    writeln!(out, "</head>")?;
    writeln!(out, "<body>")?;
    writeln!(out, "<h1>Sitemap of {}</h1>", root)?;
    writeln!(out, "<div id=\"sitemap\"></div>")?;
    writeln!(out, "<script>")?;
    write!(out, "var sitemap = ")?;

    // One flag per open children array: has it received an element yet
    let mut siblings: Vec<bool> = Vec::new();
    sitemap.traverse(|event| match event {
        TreeEvent::Visit(record) => {
            if let Some(seen) = siblings.last_mut() {
                if *seen {
                    writeln!(out, ",")?;
                }
                *seen = true;
            }
            write!(
                out,
                "{}{{\"url\": {}, \"title\": {}, \"summary\": {}, \"depth\": {}",
                indent(record.depth),
                script_string(record.url.as_str())?,
                script_string(display_title(record))?,
                script_string(display_summary(record))?,
                record.depth
            )?;
            if let Some(note) = failure_note(record) {
                write!(out, ", \"status\": {}", script_string(&note)?)?;
            }
            if has_tree_children(sitemap, record) {
                Ok(())
            } else {
                write!(out, "}}")
            }
        }
        TreeEvent::StartChildren(_) => {
            siblings.push(false);
            writeln!(out, ", \"children\": [")
        }
        TreeEvent::EndChildren(record) => {
            siblings.pop();
            write!(out, "\n{}]}}", indent(record.depth))
        }
    })?;

    writeln!(out, ";")?;
    writeln!(out, "{}", JS_SCRIPT)?;
    writeln!(out, "</script>")?;
    writeln!(out, "</body>")?;
    writeln!(out, "</html>")
}
