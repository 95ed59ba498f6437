//! End-to-end archive runs against a mock site

use crate::support::{create_test_config, create_writer, dir_entries, key, page, MemoryStore};
use site_archiver::config::RelativeLinkPolicy;
use site_archiver::{ArchiverError, Crawler};
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_page(server: &MockServer, route: &str, body: String, expected: u64) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .expect(expected)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_cyclic_site_stores_each_page_once() {
    let server = MockServer::start().await;
    let base = server.uri();
    let scratch = tempfile::tempdir().unwrap();

    // R -> A, B; A -> B, R; B -> A
    let a = format!("{}/a", base);
    let b = format!("{}/b", base);
    let root = format!("{}/", base);
    mount_page(&server, "/", page(&[], &[&a, &b]), 1).await;
    mount_page(&server, "/a", page(&[], &[&b, &root]), 1).await;
    mount_page(&server, "/b", page(&[], &[&a]), 1).await;

    let config = create_test_config(&base, scratch.path());
    let store = Arc::new(MemoryStore::default());
    let crawler = Crawler::new(&config, create_writer(&config, store.clone())).unwrap();

    let summary = crawler.crawl(&base).await.unwrap();

    assert_eq!(
        store.keys(),
        vec![key("a.html"), key("b.html"), key("main.html")]
    );
    assert_eq!(store.uploads().len(), 3);
    assert_eq!(summary.pages_stored, 3);
    assert_eq!(summary.pages_visited, 3);
    assert_eq!(summary.already_visited, 3);
    assert_eq!(summary.total_failures(), 0);
}

#[tokio::test]
async fn test_depth_first_preorder() {
    let server = MockServer::start().await;
    let base = server.uri();
    let scratch = tempfile::tempdir().unwrap();

    // R -> A, C; A -> B
    let a = format!("{}/a", base);
    let b = format!("{}/b", base);
    let c = format!("{}/c", base);
    mount_page(&server, "/", page(&[], &[&a, &c]), 1).await;
    mount_page(&server, "/a", page(&[], &[&b]), 1).await;
    mount_page(&server, "/b", page(&[], &[]), 1).await;
    mount_page(&server, "/c", page(&[], &[]), 1).await;

    let config = create_test_config(&base, scratch.path());
    let store = Arc::new(MemoryStore::default());
    let crawler = Crawler::new(&config, create_writer(&config, store.clone())).unwrap();

    crawler.crawl(&base).await.unwrap();

    assert_eq!(
        store.uploads(),
        vec![key("main.html"), key("a.html"), key("b.html"), key("c.html")]
    );
}

#[tokio::test]
async fn test_feeds_and_off_domain_links_are_never_fetched() {
    let server = MockServer::start().await;
    let base = server.uri();
    let scratch = tempfile::tempdir().unwrap();

    let feed = format!("{}/feed.xml", base);
    let about = format!("{}/about", base);
    mount_page(
        &server,
        "/",
        page(
            &[],
            &[
                &feed,
                "https://elsewhere.example.org/page",
                "mailto:someone@example.com",
                "#top",
                &about,
            ],
        ),
        1,
    )
    .await;
    mount_page(&server, "/feed.xml", "<rss/>".to_string(), 0).await;
    mount_page(&server, "/about", page(&[], &[]), 1).await;

    let config = create_test_config(&base, scratch.path());
    let store = Arc::new(MemoryStore::default());
    let crawler = Crawler::new(&config, create_writer(&config, store.clone())).unwrap();

    crawler.crawl(&base).await.unwrap();

    assert_eq!(store.keys(), vec![key("about.html"), key("main.html")]);
}

#[tokio::test]
async fn test_relative_links_resolved_against_page() {
    let server = MockServer::start().await;
    let base = server.uri();
    let scratch = tempfile::tempdir().unwrap();

    mount_page(&server, "/", page(&[], &["posts/first"]), 1).await;
    mount_page(&server, "/posts/first", page(&[], &["second"]), 1).await;
    mount_page(&server, "/posts/second", page(&[], &[]), 1).await;

    let config = create_test_config(&base, scratch.path());
    let store = Arc::new(MemoryStore::default());
    let crawler = Crawler::new(&config, create_writer(&config, store.clone())).unwrap();

    crawler.crawl(&base).await.unwrap();

    assert_eq!(
        store.keys(),
        vec![
            key("main.html"),
            key("posts/first.html"),
            key("posts/second.html")
        ]
    );
}

#[tokio::test]
async fn test_relative_links_rejected_by_policy() {
    let server = MockServer::start().await;
    let base = server.uri();
    let scratch = tempfile::tempdir().unwrap();

    mount_page(&server, "/", page(&[], &["posts/first"]), 1).await;
    mount_page(&server, "/posts/first", page(&[], &[]), 0).await;

    let mut config = create_test_config(&base, scratch.path());
    config.site.relative_links = RelativeLinkPolicy::Reject;
    let store = Arc::new(MemoryStore::default());
    let crawler = Crawler::new(&config, create_writer(&config, store.clone())).unwrap();

    crawler.crawl(&base).await.unwrap();

    assert_eq!(store.keys(), vec![key("main.html")]);
}

#[tokio::test]
async fn test_root_fetch_failure_aborts() {
    let server = MockServer::start().await;
    let base = server.uri();
    let scratch = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let config = create_test_config(&base, scratch.path());
    let store = Arc::new(MemoryStore::default());
    let crawler = Crawler::new(&config, create_writer(&config, store.clone())).unwrap();

    let result = crawler.crawl(&base).await;

    assert!(matches!(result, Err(ArchiverError::Fetch(_))));
    assert!(store.uploads().is_empty());
}

#[tokio::test]
async fn test_failed_page_abandons_only_its_branch() {
    let server = MockServer::start().await;
    let base = server.uri();
    let scratch = tempfile::tempdir().unwrap();

    let broken = format!("{}/broken", base);
    let fine = format!("{}/fine", base);
    mount_page(&server, "/", page(&[], &[&broken, &fine]), 1).await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;
    mount_page(&server, "/fine", page(&[], &[]), 1).await;

    let config = create_test_config(&base, scratch.path());
    let store = Arc::new(MemoryStore::default());
    let crawler = Crawler::new(&config, create_writer(&config, store.clone())).unwrap();

    let summary = crawler.crawl(&base).await.unwrap();

    assert_eq!(store.keys(), vec![key("fine.html"), key("main.html")]);
    assert_eq!(summary.fetch_failures, 1);
    assert_eq!(summary.pages_stored, 2);
}

#[tokio::test]
async fn test_stylesheets_stored_by_file_name() {
    let server = MockServer::start().await;
    let base = server.uri();
    let scratch = tempfile::tempdir().unwrap();

    let css = b"body { margin: 0; }\n".to_vec();
    mount_page(&server, "/", page(&["/assets/css/site.css?v=3"], &[]), 1).await;
    Mock::given(method("GET"))
        .and(path("/assets/css/site.css"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(css.clone()))
        .expect(1)
        .mount(&server)
        .await;

    let config = create_test_config(&base, scratch.path());
    let store = Arc::new(MemoryStore::default());
    let crawler = Crawler::new(&config, create_writer(&config, store.clone())).unwrap();

    let summary = crawler.crawl(&base).await.unwrap();

    assert_eq!(store.get(&key("site.css")), Some(css));
    assert_eq!(store.uploads(), vec![key("site.css"), key("main.html")]);
    assert_eq!(summary.stylesheets_stored, 1);
    assert_eq!(summary.pages_stored, 1);
}

#[tokio::test]
async fn test_stored_page_matches_fetched_body() {
    let server = MockServer::start().await;
    let base = server.uri();
    let scratch = tempfile::tempdir().unwrap();

    let body = page(&[], &[]);
    mount_page(&server, "/", body.clone(), 1).await;

    let config = create_test_config(&base, scratch.path());
    let store = Arc::new(MemoryStore::default());
    let crawler = Crawler::new(&config, create_writer(&config, store.clone())).unwrap();

    crawler.crawl(&base).await.unwrap();

    assert_eq!(store.get(&key("main.html")), Some(body.into_bytes()));
}

#[tokio::test]
async fn test_scratch_files_removed_after_run() {
    let server = MockServer::start().await;
    let base = server.uri();
    let scratch = tempfile::tempdir().unwrap();

    let a = format!("{}/a", base);
    let b = format!("{}/b", base);
    mount_page(&server, "/", page(&[], &[&a, &b]), 1).await;
    mount_page(&server, "/a", page(&[], &[]), 1).await;
    mount_page(&server, "/b", page(&[], &[]), 1).await;

    let config = create_test_config(&base, scratch.path());
    let store = Arc::new(MemoryStore::failing_on(&[&key("a.html")]));
    let crawler = Crawler::new(&config, create_writer(&config, store.clone())).unwrap();

    let summary = crawler.crawl(&base).await.unwrap();

    assert_eq!(summary.persist_failures, 1);
    assert_eq!(store.staged_paths().len(), 3);
    for staged in store.staged_paths() {
        assert!(staged.starts_with(scratch.path()));
        assert!(!staged.exists());
    }
    assert!(dir_entries(scratch.path()).is_empty());
}

#[tokio::test]
async fn test_persist_failure_aborts_when_configured() {
    let server = MockServer::start().await;
    let base = server.uri();
    let scratch = tempfile::tempdir().unwrap();

    let a = format!("{}/a", base);
    mount_page(&server, "/", page(&[], &[&a]), 1).await;
    mount_page(&server, "/a", page(&[], &[]), 0).await;

    let mut config = create_test_config(&base, scratch.path());
    config.crawler.continue_on_persist_error = false;
    let store = Arc::new(MemoryStore::failing_on(&[&key("main.html")]));
    let crawler = Crawler::new(&config, create_writer(&config, store.clone())).unwrap();

    let result = crawler.crawl(&base).await;

    assert!(matches!(result, Err(ArchiverError::Persist(_))));
    assert!(dir_entries(scratch.path()).is_empty());
}

#[tokio::test]
async fn test_concurrent_crawl_visits_each_page_once() {
    let server = MockServer::start().await;
    let base = server.uri();
    let scratch = tempfile::tempdir().unwrap();

    let pages: Vec<String> = (0..6).map(|i| format!("{}/p{}", base, i)).collect();
    let refs: Vec<&str> = pages.iter().map(String::as_str).collect();
    mount_page(&server, "/", page(&[], &refs), 1).await;
    for i in 0..6 {
        // every page links back to all the others
        mount_page(&server, &format!("/p{}", i), page(&[], &refs), 1).await;
    }

    let mut config = create_test_config(&base, scratch.path());
    config.crawler.max_concurrent_requests = 4;
    let store = Arc::new(MemoryStore::default());
    let crawler = Crawler::new(&config, create_writer(&config, store.clone())).unwrap();

    let summary = crawler.crawl(&base).await.unwrap();

    assert_eq!(summary.pages_stored, 7);
    assert_eq!(store.uploads().len(), 7);
    assert_eq!(summary.pages_visited, 7);
}

#[tokio::test]
async fn test_linked_binary_stored_byte_for_byte() {
    let server = MockServer::start().await;
    let base = server.uri();
    let scratch = tempfile::tempdir().unwrap();

    let payload = vec![0x25, 0x50, 0x44, 0x46, 0xFF, 0xD8, 0x00, 0x80, 0xE9];
    let guide = format!("{}/docs/guide.pdf", base);
    mount_page(&server, "/", page(&[], &[&guide]), 1).await;
    Mock::given(method("GET"))
        .and(path("/docs/guide.pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(payload.clone()))
        .expect(1)
        .mount(&server)
        .await;

    let config = create_test_config(&base, scratch.path());
    let store = Arc::new(MemoryStore::default());
    let crawler = Crawler::new(&config, create_writer(&config, store.clone())).unwrap();

    crawler.crawl(&base).await.unwrap();

    assert_eq!(store.get(&key("docs/guide.pdf")), Some(payload));
}

#[tokio::test]
async fn test_latin1_page_stored_unchanged_and_followed() {
    let server = MockServer::start().await;
    let base = server.uri();
    let scratch = tempfile::tempdir().unwrap();

    let mut body = b"<html><body><p>caf".to_vec();
    body.push(0xE9);
    body.extend_from_slice(format!(r#"</p><a href="{}/next">next</a></body></html>"#, base).as_bytes());

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html; charset=iso-8859-1")
                .set_body_bytes(body.clone()),
        )
        .expect(1)
        .mount(&server)
        .await;
    mount_page(&server, "/next", page(&[], &[]), 1).await;

    let config = create_test_config(&base, scratch.path());
    let store = Arc::new(MemoryStore::default());
    let crawler = Crawler::new(&config, create_writer(&config, store.clone())).unwrap();

    crawler.crawl(&base).await.unwrap();

    assert_eq!(store.get(&key("main.html")), Some(body));
    assert!(store.get(&key("next.html")).is_some());
}

#[tokio::test]
async fn test_page_with_very_long_address_is_archived() {
    let server = MockServer::start().await;
    let base = server.uri();
    let scratch = tempfile::tempdir().unwrap();

    let slug = "a".repeat(260);
    let long = format!("{}/posts/{}", base, slug);
    mount_page(&server, "/", page(&[], &[&long]), 1).await;
    mount_page(&server, &format!("/posts/{}", slug), page(&[], &[]), 1).await;

    let config = create_test_config(&base, scratch.path());
    let store = Arc::new(MemoryStore::default());
    let crawler = Crawler::new(&config, create_writer(&config, store.clone())).unwrap();

    let summary = crawler.crawl(&base).await.unwrap();

    assert_eq!(summary.pages_stored, 2);
    assert_eq!(summary.persist_failures, 0);
    assert!(store.get(&key(&format!("posts/{}.html", slug))).is_some());
    assert!(dir_entries(scratch.path()).is_empty());
}
