//! Shared fixtures: a scripted in-memory browser and test configuration

use async_trait::async_trait;
use course_ripple::browser::{Browser, Interaction, ObservedResponse, PageSnapshot, ResourceType};
use course_ripple::config::Config;
use course_ripple::output::{ExportResult, ExportSink};
use course_ripple::{CourseRecord, FetchError};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;
use url::Url;

pub const BASE: &str = "https://www.example.com";

/// Configuration for tests: fast limiter, tiny backoff, small budgets
pub fn test_config(no_growth_streak: u32) -> Config {
    let mut config = Config::default();
    config.site.base_url = BASE.to_string();
    config.crawler.rate = 1000.0;
    config.crawler.burst = 10;
    config.crawler.concurrency = 3;
    config.crawler.max_pages = 50;
    config.crawler.no_growth_streak = no_growth_streak;
    config.retry.base_delay_ms = 1;
    config.retry.max_delay_ms = 4;
    config
}

pub fn listing_html(slugs: &[&str]) -> String {
    let links: String = slugs
        .iter()
        .map(|slug| format!(r#"<li><a href="/course/{}">{}</a></li>"#, slug, slug))
        .collect();
    format!("<html><body><ul>{}</ul></body></html>", links)
}

pub fn detail_html(title: &str) -> String {
    format!(
        r#"<html><head>
             <script type="application/ld+json">
               {{"@type": "Course", "name": "{title}", "provider": {{"name": "Example U"}}}}
             </script>
           </head><body>
             <h1>{title}</h1>
             <a data-name="go-to-class" href="/redirect/{title}">Go to class</a>
           </body></html>"#,
        title = title
    )
}

pub fn json_response(url: &str, body: Value) -> ObservedResponse {
    ObservedResponse {
        url: Url::parse(url).unwrap(),
        resource_type: ResourceType::Fetch,
        status: 200,
        content_type: "application/json".to_string(),
        body: body.to_string(),
    }
}

/// Browser serving canned pages from memory
///
/// Unknown URLs answer 404. A URL registered as flaky answers 503 the given
/// number of times before serving its page.
#[derive(Default)]
pub struct MockBrowser {
    pages: HashMap<String, String>,
    observed: HashMap<String, Vec<ObservedResponse>>,
    json: HashMap<String, Value>,
    failures: Mutex<HashMap<String, u32>>,
    always_fail: HashMap<String, u16>,
    navigations: Mutex<Vec<String>>,
    json_requests: Mutex<Vec<String>>,
}

impl MockBrowser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: &str, html: String) -> Self {
        self.pages.insert(url.to_string(), html);
        self
    }

    pub fn observing(mut self, url: &str, responses: Vec<ObservedResponse>) -> Self {
        self.observed.insert(url.to_string(), responses);
        self
    }

    pub fn json(mut self, url: &str, document: Value) -> Self {
        self.json.insert(url.to_string(), document);
        self
    }

    pub fn flaky(self, url: &str, failures: u32) -> Self {
        self.failures.lock().unwrap().insert(url.to_string(), failures);
        self
    }

    pub fn failing(mut self, url: &str, status: u16) -> Self {
        self.always_fail.insert(url.to_string(), status);
        self
    }

    pub fn navigations_to(&self, url: &str) -> usize {
        self.navigations
            .lock()
            .unwrap()
            .iter()
            .filter(|u| u.as_str() == url)
            .count()
    }

    pub fn json_requests(&self) -> Vec<String> {
        self.json_requests.lock().unwrap().clone()
    }

    fn injected_failure(&self, url: &Url) -> Option<FetchError> {
        if let Some(status) = self.always_fail.get(url.as_str()) {
            return Some(FetchError::Status {
                url: url.to_string(),
                status: *status,
            });
        }
        let mut failures = self.failures.lock().unwrap();
        match failures.get_mut(url.as_str()) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                Some(FetchError::Status {
                    url: url.to_string(),
                    status: 503,
                })
            }
            _ => None,
        }
    }
}

#[async_trait]
impl Browser for MockBrowser {
    async fn navigate(&self, url: &Url) -> Result<PageSnapshot, FetchError> {
        self.navigations.lock().unwrap().push(url.to_string());
        if let Some(error) = self.injected_failure(url) {
            return Err(error);
        }

        match self.pages.get(url.as_str()) {
            Some(html) => Ok(PageSnapshot {
                final_url: url.clone(),
                html: html.clone(),
                observed: self.observed.get(url.as_str()).cloned().unwrap_or_default(),
            }),
            None => Err(FetchError::Status {
                url: url.to_string(),
                status: 404,
            }),
        }
    }

    async fn interact(
        &self,
        _page: &Url,
        _interaction: Interaction,
    ) -> Result<Option<PageSnapshot>, FetchError> {
        Ok(None)
    }

    async fn fetch_json(&self, url: &Url) -> Result<Value, FetchError> {
        self.json_requests.lock().unwrap().push(url.to_string());
        self.json.get(url.as_str()).cloned().ok_or(FetchError::Status {
            url: url.to_string(),
            status: 404,
        })
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

/// Sink keeping the exported records in memory
#[derive(Default)]
pub struct MemorySink {
    records: Mutex<Vec<CourseRecord>>,
    calls: Mutex<usize>,
}

impl MemorySink {
    pub fn records(&self) -> Vec<CourseRecord> {
        self.records.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

impl ExportSink for MemorySink {
    fn export(&self, records: &[CourseRecord]) -> ExportResult<()> {
        *self.calls.lock().unwrap() += 1;
        self.records.lock().unwrap().extend_from_slice(records);
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
