use serde::{Deserialize, Serialize};

/// Main configuration structure for Course-Ripple
///
/// Every section is optional in the TOML file; missing sections fall back to
/// the defaults below.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Maximum number of listing page loads (pages, load-more rounds, API pages)
    #[serde(rename = "max-pages")]
    pub max_pages: u32,

    /// Number of concurrent detail workers
    pub concurrency: u32,

    /// Sustained request rate (requests per second)
    pub rate: f64,

    /// Token bucket capacity (requests that may be issued back to back)
    pub burst: u32,

    /// Whether a scripted browser should show its window
    pub headed: bool,

    /// Consecutive discovery steps without new URLs before a strategy stops
    #[serde(rename = "no-growth-streak")]
    pub no_growth_streak: u32,

    /// Upper bound on load-more/scroll rounds on the first listing page
    #[serde(rename = "max-load-more-rounds")]
    pub max_load_more_rounds: u32,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_pages: 200,
            concurrency: 5,
            rate: 1.5,
            burst: 1,
            headed: false,
            no_growth_streak: 3,
            max_load_more_rounds: 30,
        }
    }
}

/// Retry policy configuration for the fetch executor
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts per operation, first attempt included
    #[serde(rename = "max-attempts")]
    pub max_attempts: u32,

    /// Backoff before the second attempt (milliseconds)
    #[serde(rename = "base-delay-ms")]
    pub base_delay_ms: u64,

    /// Upper bound on a single backoff (milliseconds)
    #[serde(rename = "max-delay-ms")]
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_delay_ms: 1000,
            max_delay_ms: 8000,
        }
    }
}

/// Target site configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Site root, e.g. `https://www.classcentral.com`
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Path of the first listing page
    #[serde(rename = "listing-path")]
    pub listing_path: String,

    /// Query parameter carrying the listing page index
    #[serde(rename = "page-param")]
    pub page_param: String,

    /// Path marker identifying course detail pages
    #[serde(rename = "course-path")]
    pub course_path: String,

    /// Per-request timeout (seconds)
    #[serde(rename = "timeout-seconds")]
    pub timeout_seconds: u64,

    /// User agent sent with every request
    #[serde(rename = "user-agent")]
    pub user_agent: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.classcentral.com".to_string(),
            listing_path: "/subject".to_string(),
            page_param: "page".to_string(),
            course_path: "/course/".to_string(),
            timeout_seconds: 35,
            user_agent: format!("course-ripple/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory receiving courses.json, courses.csv and summary.md
    pub directory: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: "output".to_string(),
        }
    }
}
