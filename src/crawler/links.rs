//! Course link harvesting from listing HTML and JSON payloads
//!
//! This module handles:
//! - Collecting course detail links from `<a href>` tags of a listing page
//! - Walking arbitrary JSON documents for course paths and slugs
//!
//! Results are canonical, deduplicated, and keep first-seen order.

use crate::url::SiteProfile;
use scraper::{Html, Selector};
use serde_json::Value;
use std::collections::HashSet;
use url::Url;

/// Keys whose string value is a bare course slug
const SLUG_KEYS: &[&str] = &["slug", "course_slug"];

/// Extracts course detail links from a listing page
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` tags pointing at a course detail page on the site
///
/// **Exclude:**
/// - `<a href="..." download>`
/// - `javascript:`, `mailto:` and data URIs
/// - Course sub-pages (reviews, syllabus) and other sites
///
/// # Arguments
///
/// * `html` - The listing page HTML
/// * `site` - The site profile used to resolve and recognize course links
///
/// # Returns
///
/// Canonical course URLs in document order, without duplicates
pub fn extract_course_links(html: &str, site: &SiteProfile) -> Vec<Url> {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    document
        .select(&selector)
        .filter(|element| element.value().attr("download").is_none())
        .filter_map(|element| element.value().attr("href"))
        .filter_map(|href| site.resolve_course_link(href))
        .filter(|url| seen.insert(url.to_string()))
        .collect()
}

/// Walks a JSON document for course links
///
/// Every string value containing the course path marker and every string
/// under a `slug` / `course_slug` key becomes a course URL. The walk uses an
/// explicit stack, so arbitrarily deep documents cannot overflow.
pub fn course_links_from_json(document: &Value, site: &SiteProfile) -> Vec<Url> {
    let mut seen = HashSet::new();
    let mut links = Vec::new();
    let mut push = |url: Option<Url>| {
        if let Some(url) = url {
            if seen.insert(url.to_string()) {
                links.push(url);
            }
        }
    };

    let mut stack = vec![document];
    while let Some(value) = stack.pop() {
        match value {
            Value::Object(map) => {
                for (key, child) in map {
                    match child {
                        Value::String(s) if SLUG_KEYS.contains(&key.as_str()) => {
                            push(
                                site.course_url_for_slug(s)
                                    .or_else(|| site.resolve_course_link(s)),
                            );
                        }
                        Value::String(s) if s.contains(site.course_marker()) => {
                            push(site.resolve_course_link(s));
                        }
                        Value::Object(_) | Value::Array(_) => stack.push(child),
                        _ => {}
                    }
                }
            }
            Value::Array(items) => {
                // Reversed so items are visited in document order
                stack.extend(items.iter().rev());
            }
            Value::String(s) if s.contains(site.course_marker()) => {
                push(site.resolve_course_link(s));
            }
            _ => {}
        }
    }

    links
}
