//! URL handling module for Course-Ripple
//!
//! This module provides canonicalization (the frontier's dedup key), site
//! identity, and [`SiteProfile`], which knows what listing and course detail
//! URLs look like on the target site.

mod domain;
mod normalize;

use crate::config::SiteConfig;
use crate::UrlError;
use url::Url;

pub use domain::extract_domain;
pub use normalize::canonicalize_url;

/// Shape of the target site's URLs
///
/// Built once from the validated [`SiteConfig`]; every component that needs
/// to recognize or build a course URL goes through it.
#[derive(Debug, Clone)]
pub struct SiteProfile {
    base: Url,
    listing: Url,
    page_param: String,
    course_marker: String,
    domain: String,
}

impl SiteProfile {
    /// Builds a profile from the site configuration
    pub fn from_config(site: &SiteConfig) -> Result<Self, UrlError> {
        let base = Url::parse(&site.base_url).map_err(|e| UrlError::Parse(e.to_string()))?;
        let domain = extract_domain(&base).ok_or(UrlError::MissingDomain)?;
        let listing = base
            .join(&site.listing_path)
            .map_err(|e| UrlError::Parse(e.to_string()))?;

        Ok(Self {
            base,
            listing,
            page_param: site.page_param.clone(),
            course_marker: format!("/{}/", site.course_path.trim_matches('/')),
            domain,
        })
    }

    /// The site root
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// The first listing page
    pub fn listing_url(&self) -> &Url {
        &self.listing
    }

    /// The path marker of course detail pages, always `/<segment>/`
    pub fn course_marker(&self) -> &str {
        &self.course_marker
    }

    /// URL of the given 1-based listing page
    ///
    /// Page 1 is the bare listing URL; later pages carry the page parameter.
    pub fn listing_page_url(&self, page: u32) -> Url {
        if page <= 1 {
            return self.listing.clone();
        }
        with_query_param(&self.listing, &self.page_param, &page.to_string())
    }

    /// Resolves an href found in HTML or JSON into a canonical course URL
    ///
    /// Returns None for anything that is not a course detail page on this site.
    pub fn resolve_course_link(&self, href: &str) -> Option<Url> {
        let href = href.trim();
        if href.is_empty()
            || href.starts_with("javascript:")
            || href.starts_with("mailto:")
            || href.starts_with("data:")
        {
            return None;
        }

        let joined = self.base.join(href).ok()?;
        let canonical = canonicalize_url(joined.as_str()).ok()?;
        if !self.is_course_url(&canonical) {
            return None;
        }
        self.on_base_host(canonical)
    }

    /// Moves a same-site URL onto the base URL's scheme, host and port
    ///
    /// `www.` and bare host variants of one page share a frontier key this way.
    fn on_base_host(&self, mut url: Url) -> Option<Url> {
        if url.host_str() != self.base.host_str() {
            url.set_host(self.base.host_str()).ok()?;
        }
        if url.scheme() != self.base.scheme() {
            url.set_scheme(self.base.scheme()).ok()?;
        }
        url.set_port(self.base.port()).ok()?;
        Some(url)
    }

    /// Builds the course URL for a slug taken from API traffic
    pub fn course_url_for_slug(&self, slug: &str) -> Option<Url> {
        let slug = slug.trim().trim_matches('/');
        if slug.is_empty() || slug.contains('/') || slug.chars().any(char::is_whitespace) {
            return None;
        }
        self.resolve_course_link(&format!("{}{}", self.course_marker, slug))
    }

    /// Returns true if the URL is a course detail page on this site
    ///
    /// A detail page has exactly one non-empty path segment after the course
    /// marker, so review or syllabus sub-pages are not mistaken for courses.
    pub fn is_course_url(&self, url: &Url) -> bool {
        extract_domain(url).as_deref() == Some(self.domain.as_str()) && self.course_slug(url).is_some()
    }

    /// Extracts the course slug from a detail URL
    pub fn course_slug(&self, url: &Url) -> Option<String> {
        let path = url.path();
        let start = path.find(&self.course_marker)? + self.course_marker.len();
        let slug = path[start..].trim_end_matches('/');
        if slug.is_empty() || slug.contains('/') {
            return None;
        }
        Some(slug.to_string())
    }
}

/// Returns a copy of `url` with `key` set to `value`, replacing any previous value
pub fn with_query_param(url: &Url, key: &str, value: &str) -> Url {
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != key)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    let mut result = url.clone();
    {
        let mut pairs = result.query_pairs_mut();
        pairs.clear();
        for (k, v) in &kept {
            pairs.append_pair(k, v);
        }
        pairs.append_pair(key, value);
    }
    result
}
