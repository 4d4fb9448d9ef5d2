//! End-to-end crawl tests through the coordinator
//!
//! These tests script a catalog site in memory and check the whole pipeline:
//! discovery, the worker pool, extraction, and export.

use crate::support::{
    detail_html, json_response, listing_html, test_config, MemorySink, MockBrowser, BASE,
};
use course_ripple::crawler::Coordinator;
use course_ripple::{RippleError, UrlState};
use serde_json::json;
use std::sync::Arc;

fn listing(page: u32) -> String {
    if page <= 1 {
        format!("{}/subject", BASE)
    } else {
        format!("{}/subject?page={}", BASE, page)
    }
}

fn course(slug: &str) -> String {
    format!("{}/course/{}", BASE, slug)
}

fn with_details(mut browser: MockBrowser, slugs: &[&str]) -> MockBrowser {
    for slug in slugs {
        browser = browser.page(&course(slug), detail_html(&format!("Course-{}", slug)));
    }
    browser
}

#[tokio::test]
async fn test_full_crawl_paged_listing() {
    let first = ["a1", "a2", "a3", "a4", "a5"];
    let second = ["b1", "b2", "b3", "b4", "b5"];

    let browser = MockBrowser::new()
        .page(&listing(1), listing_html(&first))
        .page(&listing(2), listing_html(&second))
        // Page 3 only repeats known courses
        .page(&listing(3), listing_html(&["a1", "b1"]))
        .page(&listing(4), listing_html(&["c1"]));
    // b5 has no detail page and will fail with 404
    let browser = Arc::new(with_details(
        browser,
        &["a1", "a2", "a3", "a4", "a5", "b1", "b2", "b3", "b4"],
    ));

    let coordinator = Coordinator::new(test_config(1), browser.clone()).unwrap();
    let sink = MemorySink::default();
    let summary = coordinator.run(&sink).await.unwrap();

    // Paged probing stops after the first page without growth
    assert_eq!(browser.navigations_to(&listing(4)), 0);
    assert_eq!(summary.pages_visited, 3);
    assert_eq!(summary.pages_reachable, 3);

    let frontier = coordinator.frontier();
    assert_eq!(frontier.len(), 10);
    assert!(frontier
        .snapshot()
        .iter()
        .all(|entry| matches!(entry.state, UrlState::Done | UrlState::Failed)));

    let counts = frontier.counts();
    assert_eq!(counts.done, 9);
    assert_eq!(counts.failed, 1);

    let records = sink.records();
    assert_eq!(sink.calls(), 1);
    assert_eq!(records.len(), 9);
    assert!(records.len() <= 10);
    assert!(records.iter().any(|r| r.title == "Course-a1"));
    assert!(records.windows(2).all(|w| w[0].url <= w[1].url));

    assert_eq!(summary.urls_discovered, 10);
    assert_eq!(summary.records_exported, 9);
    assert_eq!(summary.failed_urls.len(), 1);
    assert_eq!(summary.failed_urls[0].url, course("b5"));
    assert!(summary.failed_urls[0].reason.contains("404"));
}

#[tokio::test]
async fn test_transient_detail_failure_is_retried() {
    let browser = MockBrowser::new()
        .page(&listing(1), listing_html(&["rust"]))
        .flaky(&course("rust"), 2);
    let browser = Arc::new(with_details(browser, &["rust"]));

    let coordinator = Coordinator::new(test_config(1), browser.clone()).unwrap();
    let sink = MemorySink::default();
    let summary = coordinator.run(&sink).await.unwrap();

    assert_eq!(browser.navigations_to(&course("rust")), 3);
    assert_eq!(sink.records().len(), 1);
    assert!(summary.retries >= 2);
    assert!(summary.failed_urls.is_empty());
}

#[tokio::test]
async fn test_unreachable_listing_aborts_run() {
    let browser = Arc::new(MockBrowser::new().failing(&listing(1), 503));

    let coordinator = Coordinator::new(test_config(1), browser.clone()).unwrap();
    let sink = MemorySink::default();
    let result = coordinator.run(&sink).await;

    assert!(matches!(result, Err(RippleError::NoListingReachable { .. })));
    // Every attempt of the retry policy was spent on the first page
    assert_eq!(browser.navigations_to(&listing(1)), 4);
    assert_eq!(browser.navigations_to(&listing(2)), 0);
    assert!(coordinator.frontier().is_closed());
    assert_eq!(sink.calls(), 0);
}

#[tokio::test]
async fn test_api_listing_discovery() {
    let search = "https://api.example.com/search";
    let browser = MockBrowser::new()
        .page(&listing(1), listing_html(&[]))
        .observing(
            &listing(1),
            vec![json_response(
                &format!("{}?q=rust&page=1", search),
                json!({"hits": [{"slug": "a"}, {"slug": "b"}]}),
            )],
        )
        .json(
            &format!("{}?q=rust&page=1", search),
            json!({"hits": [{"slug": "a"}, {"slug": "b"}]}),
        )
        .json(
            &format!("{}?q=rust&page=2", search),
            json!({"hits": [{"slug": "c"}, {"url": "/course/d"}]}),
        );
    let browser = Arc::new(with_details(browser, &["a", "b", "c", "d"]));

    let coordinator = Coordinator::new(test_config(2), browser.clone()).unwrap();
    let sink = MemorySink::default();
    let summary = coordinator.run(&sink).await.unwrap();

    assert_eq!(coordinator.frontier().len(), 4);
    assert_eq!(sink.records().len(), 4);

    // Pages 1 and 2 of the API, then two empty pages end the streak
    assert_eq!(summary.api_pages, 4);
    assert_eq!(summary.pages_visited, 1 + 2 + 4);
    assert_eq!(summary.responses_inspected, 1);
    assert!(browser
        .json_requests()
        .contains(&format!("{}?q=rust&page=2", search)));

    assert_eq!(summary.candidates.len(), 1);
    assert_eq!(summary.candidates[0].kind, "listing");
    assert_eq!(summary.candidates[0].url_pattern, format!("{}?q=rust", search));
}

#[tokio::test]
async fn test_detail_api_takes_precedence() {
    let api = format!("{}/api/courses/rust-101", BASE);
    let browser = MockBrowser::new()
        .page(&listing(1), listing_html(&[]))
        .observing(
            &listing(1),
            vec![json_response(
                &api,
                json!({"course": {"slug": "rust-101", "title": "Rust from the API"}}),
            )],
        )
        .json(
            &api,
            json!({"course": {"slug": "rust-101", "title": "Rust from the API", "level": "Advanced"}}),
        );
    let browser = Arc::new(with_details(browser, &["rust-101"]));

    let coordinator = Coordinator::new(test_config(1), browser.clone()).unwrap();
    let sink = MemorySink::default();
    let summary = coordinator.run(&sink).await.unwrap();

    let records = sink.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].title, "Rust from the API");
    assert_eq!(records[0].level.as_deref(), Some("Advanced"));
    // Fields the API lacks still come from the page
    assert!(records[0].enrollment_link.ends_with("/redirect/Course-rust-101"));
    assert!(records[0].raw_json_ld.is_some());

    assert_eq!(summary.api_documents, 1);
    assert!(browser.json_requests().contains(&api));
    assert_eq!(summary.candidates[0].kind, "detail");
}

#[tokio::test]
async fn test_detail_without_required_fields_fails() {
    let browser = Arc::new(
        MockBrowser::new()
            .page(&listing(1), listing_html(&["empty"]))
            .page(&course("empty"), "<html><body><p>Nothing here</p></body></html>".to_string()),
    );

    let coordinator = Coordinator::new(test_config(1), browser).unwrap();
    let sink = MemorySink::default();
    let summary = coordinator.run(&sink).await.unwrap();

    assert!(sink.records().is_empty());
    assert_eq!(summary.urls_failed, 1);
    assert!(summary.failed_urls[0].reason.contains("title"));
    assert_eq!(
        coordinator.frontier().get(&course("empty")).unwrap().state,
        UrlState::Failed
    );
}
