//! HTML parser for extracting links and metadata
//!
//! This module handles parsing HTML content to extract:
//! - Links to follow (from `<a>`, `<area>`, `<frame>` and `<iframe>` tags)
//! - Page title
//! - A bounded text summary
//!
//! Parsing never fails: html5ever recovers from malformed markup, so a broken
//! page yields whatever could be extracted.

use scraper::{Html, Node, Selector};
use url::Url;

/// Elements whose text is never part of the summary
const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "noscript", "template", "head", "title"];

/// Extracted information from an HTML page
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedPage {
    /// The page title (from the first `<title>` tag)
    pub title: Option<String>,

    /// Meta description, or the leading visible body text
    pub summary: Option<String>,

    /// Raw link targets in document order
    pub links: Vec<String>,

    /// Base for resolving `links` (`<base href>` if present)
    pub base: Url,
}

/// Parses HTML content and extracts links and metadata
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` and `<area href="...">`
/// - `<frame src="...">` and `<iframe src="...">`
///
/// **Exclude:**
/// - `<a href="..." download>`
/// - Empty and fragment-only targets
///
/// Scheme filtering and resolution are left to the URL normalizer.
///
/// # Arguments
///
/// * `html` - The raw response body (decoded as UTF-8, lossy)
/// * `page_url` - The URL the page was served from
/// * `summary_length` - Maximum summary length in characters
///
/// # Example
///
/// ```
/// use sitemapper::crawler::extract;
/// use url::Url;
///
/// let html = br#"<html><head><title>Test</title></head><body><a href="/page">Link</a></body></html>"#;
/// let page_url = Url::parse("https://example.com/").unwrap();
/// let page = extract(html, &page_url, 200);
/// assert_eq!(page.title, Some("Test".to_string()));
/// assert_eq!(page.links, vec!["/page".to_string()]);
/// ```
pub fn extract(html: &[u8], page_url: &Url, summary_length: usize) -> ExtractedPage {
    let text = String::from_utf8_lossy(html);
    let document = Html::parse_document(&text);

    let base = extract_base(&document, page_url);
    let title = extract_title(&document);
    let summary = extract_description(&document)
        .or_else(|| extract_visible_text(&document))
        .and_then(|text| truncate_summary(&text, summary_length));
    let links = extract_links(&document);

    ExtractedPage {
        title,
        summary,
        links,
        base,
    }
}

/// Extracts the page title from the HTML document
fn extract_title(document: &Html) -> Option<String> {
    let title_selector = Selector::parse("title").ok()?;

    document
        .select(&title_selector)
        .next()
        .map(|element| collapse_whitespace(&element.text().collect::<String>()))
        .filter(|s| !s.is_empty())
}

/// Resolves `<base href>` against the page URL
fn extract_base(document: &Html, page_url: &Url) -> Url {
    let Ok(base_selector) = Selector::parse("base[href]") else {
        return page_url.clone();
    };

    document
        .select(&base_selector)
        .next()
        .and_then(|element| element.value().attr("href"))
        .and_then(|href| page_url.join(href.trim()).ok())
        .filter(|base| matches!(base.scheme(), "http" | "https"))
        .unwrap_or_else(|| page_url.clone())
}

/// `<meta name="description" content="...">`, if non-empty
fn extract_description(document: &Html) -> Option<String> {
    let meta_selector = Selector::parse("meta[name][content]").ok()?;

    document
        .select(&meta_selector)
        .find(|element| {
            element
                .value()
                .attr("name")
                .is_some_and(|name| name.eq_ignore_ascii_case("description"))
        })
        .and_then(|element| element.value().attr("content"))
        .map(collapse_whitespace)
        .filter(|s| !s.is_empty())
}

/// Visible text of the body with markup removed
fn extract_visible_text(document: &Html) -> Option<String> {
    let body_selector = Selector::parse("body").ok()?;
    let body = document.select(&body_selector).next()?;

    let mut parts: Vec<&str> = Vec::new();
    for node in body.descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        let hidden = node.ancestors().any(|ancestor| match ancestor.value() {
            Node::Element(element) => HIDDEN_ELEMENTS.contains(&element.name()),
            _ => false,
        });
        if !hidden {
            parts.push(&**text);
        }
    }

    let text = collapse_whitespace(&parts.join(" "));
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Extracts all link targets from the HTML document
fn extract_links(document: &Html) -> Vec<String> {
    let Ok(link_selector) = Selector::parse("a[href], area[href], frame[src], iframe[src]") else {
        return Vec::new();
    };

    let mut links = Vec::new();
    for element in document.select(&link_selector) {
        let element = element.value();

        // Skip if it has the download attribute
        if element.name() == "a" && element.attr("download").is_some() {
            continue;
        }

        let target = match element.name() {
            "a" | "area" => element.attr("href"),
            _ => element.attr("src"),
        };

        if let Some(target) = target.map(str::trim) {
            if !target.is_empty() && !target.starts_with('#') {
                links.push(target.to_string());
            }
        }
    }

    links
}

/// Replaces every whitespace run with one space and trims the ends
fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Truncates text to at most `limit` characters at a word boundary
///
/// A single word longer than the limit is cut at the limit. Returns None for
/// empty text or a zero limit.
pub fn truncate_summary(text: &str, limit: usize) -> Option<String> {
    let text = text.trim();
    if text.is_empty() || limit == 0 {
        return None;
    }
    if text.chars().count() <= limit {
        return Some(text.to_string());
    }

    // Byte offset of the first character past the limit
    let cut = text
        .char_indices()
        .nth(limit)
        .map(|(offset, _)| offset)
        .unwrap_or(text.len());
    let prefix = &text[..cut];

    let ends_on_boundary = text[cut..].starts_with(char::is_whitespace);
    let truncated = if ends_on_boundary {
        prefix
    } else {
        match prefix.rfind(char::is_whitespace) {
            Some(space) => &prefix[..space],
            None => prefix,
        }
    };

    let truncated = truncated.trim_end();
    if truncated.is_empty() {
        None
    } else {
        Some(truncated.to_string())
    }
}
