//! HTTP browser tests against a wiremock server

use course_ripple::browser::{Browser, HttpBrowser};
use course_ripple::config::SiteConfig;
use course_ripple::FetchError;
use serde_json::json;
use std::time::Duration;
use url::Url;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn browser_with_timeout(timeout_seconds: u64) -> HttpBrowser {
    let site = SiteConfig {
        timeout_seconds,
        user_agent: "course-ripple-test/1.0".to_string(),
        ..SiteConfig::default()
    };
    HttpBrowser::new(&site, false).expect("Failed to build browser")
}

fn browser() -> HttpBrowser {
    browser_with_timeout(5)
}

fn url(server: &MockServer, path: &str) -> Url {
    Url::parse(&format!("{}{}", server.uri(), path)).expect("Failed to parse mock URL")
}

#[tokio::test]
async fn test_navigate_returns_html() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/subject"))
        .and(header("user-agent", "course-ripple-test/1.0"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<html><body><a href=\"/course/x\">X</a></body></html>")
                .insert_header("content-type", "text/html"),
        )
        .mount(&server)
        .await;

    let snapshot = browser().navigate(&url(&server, "/subject")).await.unwrap();

    assert!(snapshot.html.contains("/course/x"));
    assert_eq!(snapshot.final_url, url(&server, "/subject"));
    assert!(snapshot.observed.is_empty());
}

#[tokio::test]
async fn test_redirects_are_followed() {
    let server = MockServer::start().await;
    let target = format!("{}/new", server.uri());
    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", target.as_str()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/new"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>moved</html>"))
        .mount(&server)
        .await;

    let snapshot = browser().navigate(&url(&server, "/old")).await.unwrap();

    assert_eq!(snapshot.final_url.path(), "/new");
    assert!(snapshot.html.contains("moved"));
}

#[tokio::test]
async fn test_status_classification() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/busy"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/slow-down"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let browser = browser();

    let missing = browser.navigate(&url(&server, "/missing")).await.unwrap_err();
    assert!(matches!(missing, FetchError::Status { status: 404, .. }));
    assert!(!missing.is_transient());

    let busy = browser.navigate(&url(&server, "/busy")).await.unwrap_err();
    assert!(matches!(busy, FetchError::Status { status: 503, .. }));
    assert!(busy.is_transient());

    let limited = browser.navigate(&url(&server, "/slow-down")).await.unwrap_err();
    assert!(limited.is_transient());
}

#[tokio::test]
async fn test_bot_challenge_detected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/course/x"))
        .respond_with(ResponseTemplate::new(403).set_body_string(
            "<html><head><title>Just a moment...</title></head><body>cf-chl-widget</body></html>",
        ))
        .mount(&server)
        .await;

    let error = browser().navigate(&url(&server, "/course/x")).await.unwrap_err();

    assert!(matches!(error, FetchError::BotChallenge { .. }));
    assert!(error.is_transient());
    assert!(error.url().ends_with("/course/x"));
}

#[tokio::test]
async fn test_fetch_json() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/courses/rust"))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"title": "Rust"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/broken"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&server)
        .await;

    let browser = browser();

    let document = browser
        .fetch_json(&url(&server, "/api/courses/rust"))
        .await
        .unwrap();
    assert_eq!(document["title"], "Rust");

    let error = browser
        .fetch_json(&url(&server, "/api/broken"))
        .await
        .unwrap_err();
    assert!(matches!(error, FetchError::Malformed { .. }));
    assert!(!error.is_transient());
}

#[tokio::test]
async fn test_timeout_is_transient() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<html>late</html>")
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let error = browser_with_timeout(1)
        .navigate(&url(&server, "/slow"))
        .await
        .unwrap_err();

    assert!(matches!(error, FetchError::Timeout { .. }));
    assert!(error.is_transient());
}
