//! Exporter tests and a live-HTTP crawl writing real files

use course_ripple::config::Config;
use course_ripple::crawler::run_crawl;
use course_ripple::output::{
    CsvExporter, ExportSink, JsonExporter, SinkSet, CSV_FILE_NAME, JSON_FILE_NAME,
    SUMMARY_FILE_NAME,
};
use course_ripple::CourseRecord;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn sample_records() -> Vec<CourseRecord> {
    vec![
        CourseRecord {
            url: "https://www.example.com/course/rust".to_string(),
            title: "Rust Fundamentals".to_string(),
            provider_platform: Some("Coursera".to_string()),
            university: Some("Duke University".to_string()),
            instructors: vec!["Ada Lovelace".to_string(), "Alan Turing".to_string()],
            description: Some("Learn Rust, \"safely\".".to_string()),
            rating: Some(4.7),
            review_count: Some(1024),
            language: Some("English".to_string()),
            level: Some("Beginner".to_string()),
            duration: Some("6 weeks".to_string()),
            price: Some(0.0),
            price_currency: None,
            certificate_availability: Some("Paid Certificate Available".to_string()),
            enrollment_link: "https://www.example.com/redirect/course/rust".to_string(),
            image_url: None,
            raw_json_ld: Some(json!({"@type": "Course", "name": "Rust Fundamentals"})),
        },
        CourseRecord {
            url: "https://www.example.com/course/go".to_string(),
            title: "Go".to_string(),
            provider_platform: None,
            university: None,
            instructors: vec![],
            description: None,
            rating: None,
            review_count: None,
            language: None,
            level: None,
            duration: None,
            price: Some(49.0),
            price_currency: Some("USD".to_string()),
            certificate_availability: None,
            enrollment_link: "https://provider.example/go".to_string(),
            image_url: None,
            raw_json_ld: None,
        },
    ]
}

#[test]
fn test_json_export_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let exporter = JsonExporter::new(dir.path());
    let records = sample_records();

    exporter.export(&records).unwrap();

    let written = std::fs::read_to_string(dir.path().join(JSON_FILE_NAME)).unwrap();
    let parsed: Vec<CourseRecord> = serde_json::from_str(&written).unwrap();
    assert_eq!(parsed, records);
    // Pretty-printed
    assert!(written.contains("\n  {"));
}

#[test]
fn test_csv_export_columns() {
    let dir = tempfile::tempdir().unwrap();
    let exporter = CsvExporter::new(dir.path());

    exporter.export(&sample_records()).unwrap();

    let mut reader = csv::Reader::from_path(dir.path().join(CSV_FILE_NAME)).unwrap();
    let headers = reader.headers().unwrap().clone();
    assert_eq!(headers.len(), 17);
    assert_eq!(&headers[0], "url");
    assert_eq!(&headers[4], "instructors");
    assert_eq!(&headers[16], "raw_json_ld");

    let rows: Vec<csv::StringRecord> = reader.records().map(Result::unwrap).collect();
    assert_eq!(rows.len(), 2);

    assert_eq!(&rows[0][1], "Rust Fundamentals");
    assert_eq!(&rows[0][4], "Ada Lovelace; Alan Turing");
    assert_eq!(&rows[0][5], "Learn Rust, \"safely\".");
    assert_eq!(&rows[0][6], "4.7");
    let json_ld: serde_json::Value = serde_json::from_str(&rows[0][16]).unwrap();
    assert_eq!(json_ld["name"], "Rust Fundamentals");

    // Absent values are empty cells
    assert_eq!(&rows[1][2], "");
    assert_eq!(&rows[1][4], "");
    assert_eq!(&rows[1][16], "");
}

#[test]
fn test_csv_export_without_records_writes_header() {
    let dir = tempfile::tempdir().unwrap();
    CsvExporter::new(dir.path()).export(&[]).unwrap();

    let written = std::fs::read_to_string(dir.path().join(CSV_FILE_NAME)).unwrap();
    assert!(written.starts_with("url,title,"));
    assert_eq!(written.lines().count(), 1);
}

#[test]
fn test_exporters_create_missing_directory() {
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("runs").join("latest");

    SinkSet::standard(&nested).export(&sample_records()).unwrap();

    assert!(nested.join(JSON_FILE_NAME).exists());
    assert!(nested.join(CSV_FILE_NAME).exists());
}

#[tokio::test]
async fn test_run_crawl_over_http_writes_outputs() {
    let server = MockServer::start().await;
    let base = server.uri();

    // Every listing page serves the same two courses, so page 2 ends discovery
    Mock::given(method("GET"))
        .and(path("/subject"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html><body>
                 <a href="/course/rust">Rust</a>
                 <a href="/course/go?utm_source=list">Go</a>
               </body></html>"#,
        ))
        .mount(&server)
        .await;
    for (slug, title) in [("rust", "Rust Fundamentals"), ("go", "Go in Practice")] {
        Mock::given(method("GET"))
            .and(path(format!("/course/{}", slug)))
            .respond_with(ResponseTemplate::new(200).set_body_string(format!(
                r#"<html><head>
                     <script type="application/ld+json">{{"@type": "Course", "name": "{title}"}}</script>
                   </head><body>
                     <h1>{title}</h1>
                     <a data-name="go-to-class" href="/redirect/course/{slug}">Go to class</a>
                   </body></html>"#,
                title = title,
                slug = slug
            )))
            .mount(&server)
            .await;
    }

    let dir = tempfile::tempdir().unwrap();
    let mut config = Config::default();
    config.site.base_url = base.clone();
    config.site.timeout_seconds = 5;
    config.crawler.rate = 100.0;
    config.crawler.burst = 5;
    config.crawler.no_growth_streak = 1;
    config.retry.base_delay_ms = 1;
    config.retry.max_delay_ms = 2;
    config.output.directory = dir.path().display().to_string();

    let summary = run_crawl(config, "test-hash").await.unwrap();

    assert_eq!(summary.records_exported, 2);
    assert_eq!(summary.urls_discovered, 2);
    assert_eq!(summary.pages_visited, 2);
    assert_eq!(summary.browser, "http");
    assert_eq!(summary.config_hash, "test-hash");

    let json = std::fs::read_to_string(dir.path().join(JSON_FILE_NAME)).unwrap();
    let records: Vec<CourseRecord> = serde_json::from_str(&json).unwrap();
    let titles: Vec<&str> = records.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, vec!["Go in Practice", "Rust Fundamentals"]);
    assert_eq!(
        records[1].enrollment_link,
        format!("{}/redirect/course/rust", base)
    );

    assert!(dir.path().join(CSV_FILE_NAME).exists());
    let summary_md = std::fs::read_to_string(dir.path().join(SUMMARY_FILE_NAME)).unwrap();
    assert!(summary_md.contains("# Course-Ripple Crawl Summary"));
    assert!(summary_md.contains("test-hash"));
}
