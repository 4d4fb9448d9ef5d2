//! API endpoint candidates detected from observed network traffic
//!
//! A JSON response observed on a listing page that yields course links is
//! promoted to an [`ApiEndpointCandidate`]:
//!
//! - **Detail**: one of the response URL's path segments equals the slug of
//!   a course it yielded, e.g. `/api/courses/rust-101`. The segment becomes a
//!   `{slug}` placeholder so the endpoint can be built for any detail page.
//! - **Listing**: anything else, e.g. `/api/search?q=rust&page=2`. The page
//!   parameter is dropped from the pattern so discovery can page through it.
//!
//! Candidates live in a [`CandidateRegistry`] shared between discovery and the
//! detail workers for the duration of one run.

use crate::browser::ObservedResponse;
use crate::crawler::links::course_links_from_json;
use crate::url::{with_query_param, SiteProfile};
use std::sync::Arc;
use tokio::sync::RwLock;
use url::Url;

/// Placeholder standing for a course slug in a detail pattern
pub const SLUG_PLACEHOLDER: &str = "{slug}";

/// Role of a detected endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CandidateKind {
    Listing,
    Detail,
}

impl CandidateKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Listing => "listing",
            Self::Detail => "detail",
        }
    }
}

/// A structured endpoint worth using instead of (or next to) HTML scraping
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiEndpointCandidate {
    pub url_pattern: String,
    pub content_type: String,
    /// Number of course links the endpoint yielded so far
    pub confidence: u32,
    pub kind: CandidateKind,
}

impl ApiEndpointCandidate {
    /// Classifies a response that yielded `links`
    ///
    /// Returns None when nothing was yielded.
    pub fn classify(
        response_url: &Url,
        content_type: &str,
        links: &[Url],
        site: &SiteProfile,
        page_param: &str,
    ) -> Option<Self> {
        if links.is_empty() {
            return None;
        }
        let confidence = u32::try_from(links.len()).unwrap_or(u32::MAX);
        let slugs: Vec<String> = links.iter().filter_map(|url| site.course_slug(url)).collect();

        // A detail endpoint describes exactly one course
        let detail = match slugs.as_slice() {
            [slug] => detail_pattern(response_url, slug),
            _ => None,
        };
        if let Some(pattern) = detail {
            return Some(Self {
                url_pattern: pattern,
                content_type: content_type.to_string(),
                confidence,
                kind: CandidateKind::Detail,
            });
        }

        let mut listing = response_url.clone();
        let kept: Vec<(String, String)> = listing
            .query_pairs()
            .filter(|(key, _)| key != page_param)
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        listing.set_fragment(None);
        if kept.is_empty() {
            listing.set_query(None);
        } else {
            listing.query_pairs_mut().clear().extend_pairs(kept);
        }

        Some(Self {
            url_pattern: listing.to_string(),
            content_type: content_type.to_string(),
            confidence,
            kind: CandidateKind::Listing,
        })
    }

    /// Builds the detail endpoint for a slug
    pub fn endpoint_for(&self, slug: &str) -> Option<Url> {
        if self.kind != CandidateKind::Detail || slug.is_empty() {
            return None;
        }
        Url::parse(&self.url_pattern.replace(SLUG_PLACEHOLDER, slug)).ok()
    }

    /// Builds the given page of a listing endpoint
    pub fn listing_page(&self, page_param: &str, page: u32) -> Option<Url> {
        if self.kind != CandidateKind::Listing {
            return None;
        }
        let base = Url::parse(&self.url_pattern).ok()?;
        Some(with_query_param(&base, page_param, &page.to_string()))
    }
}

fn detail_pattern(url: &Url, slug: &str) -> Option<String> {
    let mut segments: Vec<&str> = url.path_segments()?.collect();
    let index = segments.iter().position(|segment| *segment == slug)?;
    segments[index] = SLUG_PLACEHOLDER;

    let mut pattern = format!("{}/{}", url.origin().ascii_serialization(), segments.join("/"));
    if let Some(query) = url.query() {
        pattern.push('?');
        pattern.push_str(query);
    }
    Some(pattern)
}

/// Outcome of inspecting one observed response
#[derive(Debug, Clone, Default)]
pub struct Inspection {
    pub links: Vec<Url>,
    pub candidate: Option<ApiEndpointCandidate>,
}

/// Inspects an observed response for course links
///
/// Only successful `xhr`/`fetch` responses with a JSON body are considered.
pub fn inspect_response(
    response: &ObservedResponse,
    site: &SiteProfile,
    page_param: &str,
) -> Inspection {
    if !response.resource_type.is_api_call() || !(200..300).contains(&response.status) {
        return Inspection::default();
    }

    let body = response.body.trim_start();
    if !response.is_json() && !body.starts_with('{') && !body.starts_with('[') {
        return Inspection::default();
    }

    let document: serde_json::Value = match serde_json::from_str(body) {
        Ok(document) => document,
        Err(e) => {
            tracing::trace!("Observed response {} is not JSON: {}", response.url, e);
            return Inspection::default();
        }
    };

    let links = course_links_from_json(&document, site);
    let candidate = ApiEndpointCandidate::classify(
        &response.url,
        &response.content_type,
        &links,
        site,
        page_param,
    );
    Inspection { links, candidate }
}

/// Candidates detected during the run
#[derive(Debug, Default)]
pub struct CandidateRegistry {
    candidates: Vec<ApiEndpointCandidate>,
}

/// Registry shared between discovery and the detail workers
pub type SharedCandidates = Arc<RwLock<CandidateRegistry>>;

impl CandidateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps a new registry for sharing
    pub fn shared() -> SharedCandidates {
        Arc::new(RwLock::new(Self::new()))
    }

    /// Records a candidate, adding its confidence to an existing one with the same pattern
    ///
    /// # Returns
    ///
    /// * `true` - The pattern was not known before
    /// * `false` - An existing candidate was reinforced
    pub fn record(&mut self, candidate: ApiEndpointCandidate) -> bool {
        if let Some(existing) = self
            .candidates
            .iter_mut()
            .find(|c| c.kind == candidate.kind && c.url_pattern == candidate.url_pattern)
        {
            existing.confidence = existing.confidence.saturating_add(candidate.confidence);
            return false;
        }
        self.candidates.push(candidate);
        true
    }

    /// Highest-confidence detail candidate; earliest wins ties
    pub fn best_detail(&self) -> Option<&ApiEndpointCandidate> {
        self.candidates
            .iter()
            .filter(|c| c.kind == CandidateKind::Detail)
            .fold(None, |best: Option<&ApiEndpointCandidate>, c| match best {
                Some(b) if b.confidence >= c.confidence => Some(b),
                _ => Some(c),
            })
    }

    /// Listing candidates, most confident first
    pub fn listings(&self) -> Vec<ApiEndpointCandidate> {
        let mut listings: Vec<ApiEndpointCandidate> = self
            .candidates
            .iter()
            .filter(|c| c.kind == CandidateKind::Listing)
            .cloned()
            .collect();
        listings.sort_by(|a, b| b.confidence.cmp(&a.confidence));
        listings
    }

    /// Every candidate in detection order
    pub fn all(&self) -> &[ApiEndpointCandidate] {
        &self.candidates
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}
