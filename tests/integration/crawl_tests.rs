//! End-to-end traversal tests

use crate::{html_page, record, test_config, url};
use sitemapper::output::{renderer_for, Renderer};
use sitemapper::{
    crawl, Crawler, FetchFailure, FetchStatus, OutputFormat, SitemapError, SkipReason, TreeEvent,
};
use std::time::{Duration, Instant};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount(server: &MockServer, route: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(response)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_bfs_tree_and_cross_links() {
    // A -> B, C ; B -> D, A
    let server = MockServer::start().await;
    let base = server.uri();
    mount(&server, "/", html_page("A", &["/b", "/c"])).await;
    mount(&server, "/b", html_page("B", &["/d", "/"])).await;
    mount(&server, "/c", html_page("C", &[])).await;
    mount(&server, "/d", html_page("D", &[])).await;

    let mut config = test_config(&base);
    config.crawler.max_depth = Some(2);
    let sitemap = crawl(config).await.unwrap();

    let events: Vec<String> = sitemap
        .events()
        .map(|event| match event {
            TreeEvent::StartChildren(r) => format!("start {}", r.title.as_deref().unwrap()),
            TreeEvent::Visit(r) => format!("visit {} {}", r.title.as_deref().unwrap(), r.depth),
            TreeEvent::EndChildren(r) => format!("end {}", r.title.as_deref().unwrap()),
        })
        .collect();
    assert_eq!(
        events,
        vec![
            "visit A 0", "start A", "visit B 1", "start B", "visit D 2", "end B", "visit C 1",
            "end A",
        ]
    );

    // The back link B -> A lives only in the graph
    let from_b: Vec<String> = sitemap
        .links_from(&url(&base, "/b"))
        .iter()
        .map(|u| u.to_string())
        .collect();
    assert_eq!(from_b, vec![url(&base, "/d").to_string(), url(&base, "/").to_string()]);
    assert_eq!(record(&sitemap, &base, "/").depth, 0);

    // Breadth-first fetch order
    let order: Vec<&str> = sitemap
        .visit_order()
        .iter()
        .map(|&id| sitemap.get_by_id(id).unwrap().title.as_deref().unwrap())
        .collect();
    assert_eq!(order, vec!["A", "B", "C", "D"]);
}

#[tokio::test]
async fn test_each_url_fetched_once() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount(&server, "/", html_page("Home", &["/a", "/a#top", "/./a", "/b?", "/b"])).await;
    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(html_page("A", &["/", "/b"]))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/b"))
        .respond_with(html_page("B", &["/a"]))
        .expect(1)
        .mount(&server)
        .await;

    let sitemap = crawl(test_config(&base)).await.unwrap();

    assert_eq!(sitemap.len(), 3);
    assert_eq!(sitemap.visit_order().len(), 3);
    assert!(sitemap.pages().all(|r| r.status == FetchStatus::Fetched));
}

#[tokio::test]
async fn test_depth_cutoff() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount(&server, "/", html_page("Root", &["/one"])).await;
    mount(&server, "/one", html_page("One", &["/two"])).await;
    Mock::given(method("GET"))
        .and(path("/two"))
        .respond_with(html_page("Two", &["/three"]))
        .expect(0)
        .mount(&server)
        .await;

    let mut config = test_config(&base);
    config.crawler.max_depth = Some(1);
    let sitemap = crawl(config).await.unwrap();

    let two = record(&sitemap, &base, "/two");
    assert_eq!(two.depth, 2);
    assert_eq!(two.status, FetchStatus::Skipped(SkipReason::DepthExceeded));
    assert!(sitemap.get(&url(&base, "/three")).is_none());

    // The edge to the cut-off page is still in the graph
    assert_eq!(sitemap.links_from(&url(&base, "/one")).len(), 1);
    assert_eq!(sitemap.events().filter(|e| matches!(e, TreeEvent::Visit(_))).count(), 2);
}

#[tokio::test]
async fn test_depth_zero_fetches_only_root() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount(&server, "/", html_page("Root", &["/child"])).await;
    Mock::given(method("GET"))
        .and(path("/child"))
        .respond_with(html_page("Child", &[]))
        .expect(0)
        .mount(&server)
        .await;

    let mut config = test_config(&base);
    config.crawler.max_depth = Some(0);
    let sitemap = crawl(config).await.unwrap();

    assert_eq!(sitemap.visit_order(), &[0]);
    assert_eq!(
        record(&sitemap, &base, "/child").status,
        FetchStatus::Skipped(SkipReason::DepthExceeded)
    );
}

#[tokio::test]
async fn test_timeout_is_not_fatal() {
    // A -> B, C ; B -> D, and B times out
    let server = MockServer::start().await;
    let base = server.uri();
    mount(&server, "/", html_page("Root", &["/slow", "/fast"])).await;
    mount(
        &server,
        "/slow",
        html_page("Slow", &["/d"]).set_delay(Duration::from_secs(3)),
    )
    .await;
    mount(&server, "/fast", html_page("Fast", &[])).await;
    Mock::given(method("GET"))
        .and(path("/d"))
        .respond_with(html_page("D", &[]))
        .expect(0)
        .mount(&server)
        .await;

    let mut config = test_config(&base);
    config.http.timeout_ms = 300;
    config.crawler.max_retries = 0;
    let sitemap = crawl(config).await.unwrap();

    let slow = record(&sitemap, &base, "/slow");
    assert_eq!(slow.status, FetchStatus::Failed(FetchFailure::Timeout));
    assert!(slow.outbound().is_empty());
    assert!(sitemap.get(&url(&base, "/d")).is_none());
    assert_eq!(record(&sitemap, &base, "/fast").status, FetchStatus::Fetched);

    let text = renderer_for(OutputFormat::Text)
        .render_to_string(&sitemap)
        .unwrap();
    assert!(text.starts_with(&format!("Root <{}>\n  About Root\n", url(&base, "/"))));
    assert!(text.contains(&format!("  (untitled) <{}> [request timeout]\n", url(&base, "/slow"))));
    assert!(text.contains(&format!("  Fast <{}>\n    About Fast\n", url(&base, "/fast"))));
}

#[tokio::test]
async fn test_huge_crawl_delay_does_not_abort() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount(
        &server,
        "/robots.txt",
        ResponseTemplate::new(200).set_body_string("User-agent: *\nCrawl-delay: 1e30\n"),
    )
    .await;
    mount(&server, "/", html_page("Root", &[])).await;

    let sitemap = crawl(test_config(&base)).await.unwrap();

    assert_eq!(sitemap.root().status, FetchStatus::Fetched);
}

#[tokio::test]
async fn test_http_error_recorded() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount(&server, "/", html_page("Root", &["/missing"])).await;

    let sitemap = crawl(test_config(&base)).await.unwrap();

    // Unmatched wiremock routes answer 404
    let missing = record(&sitemap, &base, "/missing");
    assert_eq!(missing.status, FetchStatus::Failed(FetchFailure::HttpStatus(404)));
    assert_eq!(missing.status_code, Some(404));
    assert!(missing.outbound().is_empty());
}

#[tokio::test]
async fn test_non_html_is_leaf() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount(&server, "/", html_page("Root", &["/report.pdf"])).await;
    mount(
        &server,
        "/report.pdf",
        ResponseTemplate::new(200)
            .set_body_raw(b"%PDF-1.4 <a href=\"/hidden\">".to_vec(), "application/pdf"),
    )
    .await;

    let sitemap = crawl(test_config(&base)).await.unwrap();

    let pdf = record(&sitemap, &base, "/report.pdf");
    assert_eq!(pdf.status, FetchStatus::Fetched);
    assert_eq!(pdf.content_type.as_deref(), Some("application/pdf"));
    assert!(pdf.is_leaf());
    assert!(pdf.title.is_none());
    assert!(sitemap.get(&url(&base, "/hidden")).is_none());
}

#[tokio::test]
async fn test_retry_then_success() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount(&server, "/", html_page("Root", &["/flaky"])).await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    mount(&server, "/flaky", html_page("Flaky", &[])).await;

    let mut config = test_config(&base);
    config.crawler.max_retries = 2;
    let sitemap = crawl(config).await.unwrap();

    let flaky = record(&sitemap, &base, "/flaky");
    assert_eq!(flaky.status, FetchStatus::Fetched);
    assert_eq!(flaky.title.as_deref(), Some("Flaky"));
}

#[tokio::test]
async fn test_retries_exhausted() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount(&server, "/", html_page("Root", &["/down"])).await;
    Mock::given(method("GET"))
        .and(path("/down"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;

    let mut config = test_config(&base);
    config.crawler.max_retries = 2;
    let sitemap = crawl(config).await.unwrap();

    assert_eq!(
        record(&sitemap, &base, "/down").status,
        FetchStatus::Failed(FetchFailure::HttpStatus(500))
    );
}

#[tokio::test]
async fn test_client_errors_not_retried() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount(&server, "/", html_page("Root", &["/gone"])).await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(410))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = test_config(&base);
    config.crawler.max_retries = 3;
    let sitemap = crawl(config).await.unwrap();

    assert_eq!(
        record(&sitemap, &base, "/gone").status,
        FetchStatus::Failed(FetchFailure::HttpStatus(410))
    );
}

#[tokio::test]
async fn test_robots_disallow() {
    let server = MockServer::start().await;
    let base = server.uri();
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /private\n"),
        )
        .expect(1)
        .mount(&server)
        .await;
    mount(&server, "/", html_page("Root", &["/private", "/public"])).await;
    mount(&server, "/public", html_page("Public", &["/private"])).await;
    Mock::given(method("GET"))
        .and(path("/private"))
        .respond_with(html_page("Private", &[]))
        .expect(0)
        .mount(&server)
        .await;

    let sitemap = crawl(test_config(&base)).await.unwrap();

    assert_eq!(
        record(&sitemap, &base, "/private").status,
        FetchStatus::Skipped(SkipReason::RobotsDisallowed)
    );
    assert_eq!(record(&sitemap, &base, "/public").status, FetchStatus::Fetched);
}

#[tokio::test]
async fn test_robots_ignored_when_disabled() {
    let server = MockServer::start().await;
    let base = server.uri();
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /\n"))
        .expect(0)
        .mount(&server)
        .await;
    mount(&server, "/", html_page("Root", &[])).await;

    let mut config = test_config(&base);
    config.crawler.respect_robots = false;
    let sitemap = crawl(config).await.unwrap();

    assert_eq!(sitemap.root().status, FetchStatus::Fetched);
}

#[tokio::test]
async fn test_off_site_links_recorded_not_fetched() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount(
        &server,
        "/",
        html_page("Root", &["http://elsewhere.invalid/page", "/local"]),
    )
    .await;
    mount(&server, "/local", html_page("Local", &[])).await;

    let sitemap = crawl(test_config(&base)).await.unwrap();

    let off_site = sitemap
        .get(&sitemapper::normalize_url("http://elsewhere.invalid/page", None).unwrap())
        .unwrap();
    assert_eq!(off_site.status, FetchStatus::Skipped(SkipReason::OutOfScope));
    assert_eq!(sitemap.links_from(&url(&base, "/")).len(), 2);
    assert_eq!(sitemap.visit_order().len(), 2);
}

#[tokio::test]
async fn test_bad_links_skipped() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount(
        &server,
        "/",
        html_page(
            "Root",
            &["mailto:me@example.com", "javascript:void(0)", "http://[::1", "ftp://files/x", "/ok"],
        ),
    )
    .await;
    mount(&server, "/ok", html_page("Ok", &[])).await;

    let sitemap = crawl(test_config(&base)).await.unwrap();

    assert_eq!(sitemap.len(), 2);
    assert_eq!(record(&sitemap, &base, "/ok").status, FetchStatus::Fetched);
}

#[tokio::test]
async fn test_redirect_final_url_is_link_base() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount(&server, "/", html_page("Root", &["/old"])).await;
    mount(
        &server,
        "/old",
        ResponseTemplate::new(301).insert_header("location", "/docs/"),
    )
    .await;
    mount(&server, "/docs/", html_page("Docs", &["intro"])).await;
    mount(&server, "/docs/intro", html_page("Intro", &[])).await;

    let sitemap = crawl(test_config(&base)).await.unwrap();

    let old = record(&sitemap, &base, "/old");
    assert_eq!(old.status, FetchStatus::Fetched);
    assert_eq!(old.final_url, Some(format!("{}/docs/", base)));
    assert_eq!(record(&sitemap, &base, "/docs/intro").title.as_deref(), Some("Intro"));
}

#[tokio::test]
async fn test_basic_auth_sent() {
    let server = MockServer::start().await;
    let base = server.uri();
    Mock::given(method("GET"))
        .and(path("/"))
        .and(header("authorization", "Basic YWxpY2U6c2VjcmV0"))
        .respond_with(html_page("Secret", &[]))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = test_config(&base);
    config.http.username = Some("alice".to_string());
    config.http.password = Some("secret".to_string());
    let sitemap = crawl(config).await.unwrap();

    assert_eq!(sitemap.root().title.as_deref(), Some("Secret"));
}

#[tokio::test]
async fn test_summary_truncated() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount(
        &server,
        "/",
        ResponseTemplate::new(200).set_body_raw(
            "<html><body><p>The quick brown fox jumps over the lazy dog &amp; friends</p></body></html>",
            "text/html",
        ),
    )
    .await;

    let mut config = test_config(&base);
    config.crawler.summary_length = 22;
    let sitemap = crawl(config).await.unwrap();

    assert_eq!(sitemap.root().summary.as_deref(), Some("The quick brown fox"));
    assert!(sitemap.root().title.is_none());
}

#[tokio::test]
async fn test_levels_complete_in_order_under_concurrency() {
    let server = MockServer::start().await;
    let base = server.uri();
    let children: Vec<String> = (0..6).map(|i| format!("/c{}", i)).collect();
    let child_refs: Vec<&str> = children.iter().map(String::as_str).collect();
    mount(&server, "/", html_page("Root", &child_refs)).await;
    for i in 0..6 {
        let grandchild = format!("/g{}", i);
        // Earlier children answer slower, so completion order is reversed
        mount(
            &server,
            &format!("/c{}", i),
            html_page(&format!("C{}", i), &[grandchild.as_str()])
                .set_delay(Duration::from_millis(60 * (6 - i as u64))),
        )
        .await;
        mount(&server, &grandchild, html_page(&format!("G{}", i), &[])).await;
    }

    let mut config = test_config(&base);
    config.crawler.max_concurrent_fetches = 4;
    let sitemap = crawl(config).await.unwrap();

    let order: Vec<&str> = sitemap
        .visit_order()
        .iter()
        .map(|&id| sitemap.get_by_id(id).unwrap().title.as_deref().unwrap())
        .collect();
    assert_eq!(
        order,
        vec!["Root", "C0", "C1", "C2", "C3", "C4", "C5", "G0", "G1", "G2", "G3", "G4", "G5"]
    );

    let depths: Vec<u32> = sitemap
        .visit_order()
        .iter()
        .map(|&id| sitemap.get_by_id(id).unwrap().depth)
        .collect();
    assert!(depths.windows(2).all(|pair| pair[0] <= pair[1]));
}

#[tokio::test]
async fn test_slow_page_does_not_hold_free_slots() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount(&server, "/", html_page("Root", &["/c0", "/c1", "/c2", "/c3", "/c4"])).await;
    mount(
        &server,
        "/c0",
        html_page("C0", &[]).set_delay(Duration::from_millis(1000)),
    )
    .await;
    for i in 1..5 {
        mount(
            &server,
            &format!("/c{}", i),
            html_page(&format!("C{}", i), &[]).set_delay(Duration::from_millis(200)),
        )
        .await;
    }

    let mut config = test_config(&base);
    config.crawler.max_concurrent_fetches = 2;
    let started = Instant::now();
    let sitemap = crawl(config).await.unwrap();
    let elapsed = started.elapsed();

    // C1..C4 share one slot while C0 holds the other
    assert!(elapsed < Duration::from_millis(1300), "level took {:?}", elapsed);
    let order: Vec<&str> = sitemap
        .visit_order()
        .iter()
        .map(|&id| sitemap.get_by_id(id).unwrap().title.as_deref().unwrap())
        .collect();
    assert_eq!(order, vec!["Root", "C0", "C1", "C2", "C3", "C4"]);
}

#[tokio::test]
async fn test_cancelled_before_start() {
    let server = MockServer::start().await;
    let base = server.uri();
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_page("Root", &[]))
        .expect(0)
        .mount(&server)
        .await;

    let mut crawler = Crawler::new(test_config(&base)).unwrap();
    crawler.cancellation_token().cancel();
    let sitemap = crawler.run().await.unwrap();

    assert_eq!(sitemap.root().status, FetchStatus::Pending);
}

#[tokio::test]
async fn test_deadline_returns_partial_sitemap() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount(&server, "/", html_page("Root", &["/slow"])).await;
    mount(
        &server,
        "/slow",
        html_page("Slow", &["/next"]).set_delay(Duration::from_millis(1500)),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/next"))
        .respond_with(html_page("Next", &[]))
        .expect(0)
        .mount(&server)
        .await;

    let mut config = test_config(&base);
    config.crawler.deadline_secs = Some(1);
    let sitemap = crawl(config).await.unwrap();

    // In-flight requests finish; nothing new starts
    assert_eq!(record(&sitemap, &base, "/slow").status, FetchStatus::Fetched);
    assert_eq!(record(&sitemap, &base, "/next").status, FetchStatus::Pending);
}

#[tokio::test]
async fn test_invalid_root_is_fatal() {
    let result = crawl(crate::test_config("ftp://example.com/")).await;
    assert!(matches!(result, Err(SitemapError::InvalidRoot { .. })));
}
