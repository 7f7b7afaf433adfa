//! Rendering and persistence of crawled sitemaps

use crate::{html_page, test_config, url};
use sitemapper::output::{renderer_for, CrawlStatistics, Renderer, TreeRenderer, TreeStyle};
use sitemapper::storage::{open_storage, Storage};
use sitemapper::{crawl, OutputFormat, Sitemap, SkipReason};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer};

/// Crawls a small site: / -> /guide, /broken, off-site ; /guide -> /guide/a
async fn crawl_site(server: &MockServer) -> Sitemap {
    let routes = [
        ("/", html_page("Home & Index", &["/guide", "/broken", "http://other.invalid/"])),
        ("/guide", html_page("Guide", &["/guide/a", "/"])),
        ("/guide/a", html_page("Chapter <A>", &[])),
    ];
    for (route, response) in routes {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(response)
            .mount(server)
            .await;
    }

    crawl(test_config(&server.uri())).await.unwrap()
}

#[tokio::test]
async fn test_text_output() {
    let server = MockServer::start().await;
    let base = server.uri();
    let sitemap = crawl_site(&server).await;

    let text = renderer_for(OutputFormat::Text)
        .render_to_string(&sitemap)
        .unwrap();

    let expected = format!(
        "Home & Index <{root}>\n  About Home & Index\n  \
         Guide <{guide}>\n    About Guide\n    \
         Chapter <A> <{a}>\n      About Chapter <A>\n  \
         (untitled) <{broken}> [HTTP 404]\n    (no summary)\n",
        root = url(&base, "/"),
        guide = url(&base, "/guide"),
        a = url(&base, "/guide/a"),
        broken = url(&base, "/broken"),
    );
    assert_eq!(text, expected);
}

#[tokio::test]
async fn test_html_output_escapes_and_nests() {
    let server = MockServer::start().await;
    let sitemap = crawl_site(&server).await;

    let html = renderer_for(OutputFormat::Html)
        .render_to_string(&sitemap)
        .unwrap();

    assert!(html.contains("Home &amp; Index"));
    assert!(html.contains("Chapter &lt;A&gt;"));
    assert!(!html.contains("Chapter <A>"));
    assert_eq!(html.matches("<li").count(), 4);
    assert_eq!(html.matches("<ul").count(), html.matches("</ul>").count());
    assert!(!html.contains("other.invalid"));

    // Pre-order: the chapter comes before the broken sibling of its parent
    let chapter = html.find("Chapter").unwrap();
    let broken = html.find("/broken").unwrap();
    assert!(chapter < broken);
}

#[tokio::test]
async fn test_js_output_is_self_contained() {
    let server = MockServer::start().await;
    let sitemap = crawl_site(&server).await;

    let page = TreeRenderer::new(TreeStyle::Js)
        .render_to_string(&sitemap)
        .unwrap();

    assert!(page.contains("<script"));
    assert!(page.contains("var sitemap = {"));
    // Titles are escaped for the script context
    assert!(page.contains("Chapter \\u003cA>"));
    assert!(!page.contains("src=\"http"));
}

#[tokio::test]
async fn test_xml_output_lists_graph() {
    let server = MockServer::start().await;
    let base = server.uri();
    let sitemap = crawl_site(&server).await;

    let xml = renderer_for(OutputFormat::Xml)
        .render_to_string(&sitemap)
        .unwrap();

    assert!(xml.starts_with("<?xml"));
    assert_eq!(xml.matches("<page ").count(), sitemap.len());
    assert_eq!(xml.matches("<link ").count(), sitemap.edge_count());
    assert!(xml.contains("Home &amp; Index"));
    assert!(xml.contains(&format!("url=\"{}\"", url(&base, "/broken"))));
    assert!(xml.contains("http://other.invalid/"));
}

#[tokio::test]
async fn test_statistics() {
    let server = MockServer::start().await;
    let sitemap = crawl_site(&server).await;

    let stats = CrawlStatistics::from_sitemap(&sitemap);

    assert_eq!(stats.total_urls, 5);
    assert_eq!(stats.fetched, 3);
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.skipped_for(SkipReason::OutOfScope), 1);
    assert_eq!(stats.failures.get("http_404"), Some(&1));
    assert_eq!(stats.total_links, 5);
}

#[tokio::test]
async fn test_saved_sitemap_renders_identically() {
    let server = MockServer::start().await;
    let sitemap = crawl_site(&server).await;
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("sitemap.db");

    let run_id = {
        let mut storage = open_storage(&db_path).unwrap();
        storage.save_sitemap(&sitemap, "abc123").unwrap()
    };

    let storage = open_storage(&db_path).unwrap();
    let loaded = storage.load_sitemap(run_id).unwrap();
    assert_eq!(storage.get_run(run_id).unwrap().config_hash, "abc123");

    for format in [OutputFormat::Html, OutputFormat::Text, OutputFormat::Js, OutputFormat::Xml] {
        let renderer = renderer_for(format);
        assert_eq!(
            renderer.render_to_string(&loaded).unwrap(),
            renderer.render_to_string(&sitemap).unwrap(),
            "{} output differs after reload",
            format
        );
    }
    assert_eq!(loaded.visit_order(), sitemap.visit_order());
}
