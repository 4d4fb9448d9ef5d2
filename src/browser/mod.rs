//! Browser capability consumed by discovery and the detail workers
//!
//! The crawl core never drives a browser directly. It talks to a [`Browser`],
//! which navigates to pages, performs the two listing interactions, fetches
//! JSON endpoints, and reports the network responses it observed while doing
//! so. [`HttpBrowser`] is the plain-HTTP implementation; a script-capable
//! engine plugs in behind the same trait.

mod http;

use crate::FetchError;
use async_trait::async_trait;
use url::Url;

pub use http::{build_http_client, HttpBrowser};

/// Kind of resource an observed response belonged to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceType {
    Document,
    Xhr,
    Fetch,
    Script,
    Other,
}

impl ResourceType {
    /// Returns true for responses issued by page scripts
    pub fn is_api_call(&self) -> bool {
        matches!(self, Self::Xhr | Self::Fetch)
    }
}

/// A network response observed while a page was loading or reacting to an interaction
#[derive(Debug, Clone)]
pub struct ObservedResponse {
    pub url: Url,
    pub resource_type: ResourceType,
    pub status: u16,
    pub content_type: String,
    pub body: String,
}

impl ObservedResponse {
    /// Returns true if the response advertises a JSON body
    pub fn is_json(&self) -> bool {
        let content_type = self.content_type.to_ascii_lowercase();
        content_type.contains("application/json") || content_type.contains("+json")
    }
}

/// State of a page after navigation or an interaction
#[derive(Debug, Clone)]
pub struct PageSnapshot {
    /// URL after redirects
    pub final_url: Url,

    /// Rendered HTML
    pub html: String,

    /// Responses observed since the previous snapshot of this page
    pub observed: Vec<ObservedResponse>,
}

/// Listing page interactions used by incremental discovery
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interaction {
    /// Click the page's "load more" control
    LoadMore,

    /// Scroll to the bottom to trigger infinite scroll
    ScrollToBottom,
}

impl Interaction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LoadMore => "load-more",
            Self::ScrollToBottom => "scroll",
        }
    }
}

/// Rendering and network primitive
///
/// Implementations must be shareable across the discovery task and every
/// detail worker.
#[async_trait]
pub trait Browser: Send + Sync {
    /// Loads a page and returns its final HTML with the traffic it caused
    async fn navigate(&self, url: &Url) -> Result<PageSnapshot, FetchError>;

    /// Performs an interaction on the page last loaded from `page`
    ///
    /// Returns `Ok(None)` when the page offers no such interaction.
    async fn interact(
        &self,
        page: &Url,
        interaction: Interaction,
    ) -> Result<Option<PageSnapshot>, FetchError>;

    /// Fetches a JSON document
    async fn fetch_json(&self, url: &Url) -> Result<serde_json::Value, FetchError>;

    /// Engine name for logs and the run summary
    fn name(&self) -> &'static str;
}

const CHALLENGE_MARKERS: &[&str] = &[
    "cf-chl-",
    "challenge-platform",
    "<title>just a moment",
    "attention required! | cloudflare",
    "captcha-delivery.com",
    "px-captcha",
    "verify you are human",
];

/// Returns true if a response body is a bot-challenge interstitial
///
/// Challenge pages are served with 200, 403, 429 or 503 depending on the
/// vendor; other statuses are never treated as challenges.
pub fn looks_like_bot_challenge(status: u16, body: &str) -> bool {
    if !matches!(status, 200 | 403 | 429 | 503) {
        return false;
    }
    let lower = body.to_ascii_lowercase();
    CHALLENGE_MARKERS.iter().any(|marker| lower.contains(marker))
}
