//! Extraction sources for course detail pages
//!
//! Three sources, in strict priority order:
//!
//! 1. [`api`]: the JSON document returned by a detected detail API endpoint
//! 2. [`jsonld`]: `application/ld+json` blocks embedded in the page
//! 3. [`dom`]: selectors and label heuristics over the rendered HTML
//!
//! Each produces [`RawFields`]; [`extract_course`] merges them field by field
//! so a higher-priority source wins every field it actually has.

pub mod api;
pub mod dom;
pub mod jsonld;

use crate::record::{merge_sources, CourseRecord, RawFields};
use crate::ExtractionError;
use serde_json::Value;
use std::fmt;
use url::Url;

/// Where a set of fields came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ExtractionSource {
    Api,
    JsonLd,
    Dom,
}

impl fmt::Display for ExtractionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Api => "api",
            Self::JsonLd => "json-ld",
            Self::Dom => "dom",
        };
        write!(f, "{}", name)
    }
}

/// Runs every available source over a detail page, highest priority first
///
/// Sources that found nothing are left out.
pub fn collect_sources(html: &str, api_document: Option<&Value>) -> Vec<(ExtractionSource, RawFields)> {
    let mut sources = Vec::with_capacity(3);

    if let Some(document) = api_document {
        sources.push((ExtractionSource::Api, api::extract(document)));
    }
    sources.push((ExtractionSource::JsonLd, jsonld::extract(html)));
    sources.push((ExtractionSource::Dom, dom::extract(html)));

    sources.retain(|(_, fields)| !fields.is_empty());
    sources
}

/// Extracts one normalized record from a detail page
///
/// # Arguments
///
/// * `page` - The detail URL, used to resolve relative links
/// * `html` - The rendered detail page
/// * `api_document` - The detail API response, when one was fetched
///
/// # Returns
///
/// * `Ok(CourseRecord)` - All required fields were found in some source
/// * `Err(ExtractionError)` - Title or enrollment link missing everywhere
pub fn extract_course(
    page: &Url,
    html: &str,
    api_document: Option<&Value>,
) -> Result<CourseRecord, ExtractionError> {
    let sources = collect_sources(html, api_document);
    tracing::debug!(
        "{}: sources with data: {}",
        page,
        sources
            .iter()
            .map(|(source, _)| source.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    );
    merge_sources(page, sources.iter().map(|(_, fields)| fields))
}

/// Renders a scalar-ish JSON value as text
///
/// Objects contribute their `name`, `title` or `value`; arrays their first
/// renderable element.
pub(crate) fn json_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(true) => Some("Yes".to_string()),
        Value::Bool(false) => Some("No".to_string()),
        Value::Object(map) => ["name", "title", "value"]
            .iter()
            .find_map(|key| map.get(*key).and_then(json_text)),
        Value::Array(items) => items.iter().find_map(json_text),
        Value::Null => None,
    }
}

/// Renders a JSON value as a list of names
pub(crate) fn json_names(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().filter_map(json_text).collect(),
        other => json_text(other).into_iter().collect(),
    }
}
