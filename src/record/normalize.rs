//! Field normalizers
//!
//! Pure functions turning scraped text into the typed values of a
//! [`CourseRecord`](super::CourseRecord). None of them touch the network.

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;
use url::Url;

static NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d[\d,]*(?:\.\d+)?").unwrap());

static COUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d[\d,]*(?:\.\d+)?)\s*([kKmM])?\b").unwrap());

static CURRENCY_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(USD|EUR|GBP|INR|CAD|AUD|JPY|CNY|BRL|MXN)\b").unwrap());

/// Trims and collapses internal whitespace; blank text becomes `None`
pub fn clean_text(value: &str) -> Option<String> {
    let collapsed = value.split_whitespace().collect::<Vec<_>>().join(" ");
    (!collapsed.is_empty()).then_some(collapsed)
}

/// [`clean_text`] over an optional value
pub fn clean_opt(value: Option<&str>) -> Option<String> {
    value.and_then(clean_text)
}

fn parse_number(text: &str) -> Option<f64> {
    let found = NUMBER.find(text)?;
    found.as_str().replace(',', "").parse().ok()
}

/// Parses a rating such as `4.7`, `4.7 out of 5` or `4.7/5`
pub fn parse_rating(text: &str) -> Option<f64> {
    parse_number(text).filter(|rating| rating.is_finite())
}

/// Parses a review count such as `1,234 reviews` or `1.2k`
pub fn parse_count(text: &str) -> Option<u64> {
    let caps = COUNT.captures(text)?;
    let number: f64 = caps.get(1)?.as_str().replace(',', "").parse().ok()?;
    let multiplier = match caps.get(2).map(|m| m.as_str()) {
        Some("k") | Some("K") => 1_000.0,
        Some("m") | Some("M") => 1_000_000.0,
        _ => 1.0,
    };
    let count = (number * multiplier).round();
    (count.is_finite() && count >= 0.0).then_some(count as u64)
}

/// Parses a price; text advertised as free with no amount is `0`
///
/// An amount wins over the word "free", so "Free trial, then $49/month" is 49.
pub fn parse_price(text: &str) -> Option<f64> {
    parse_number(text).or_else(|| text.to_lowercase().contains("free").then_some(0.0))
}

/// Infers an ISO 4217 code from a price string
pub fn detect_currency(text: &str) -> Option<String> {
    if let Some(code) = CURRENCY_CODE.find(text) {
        return Some(code.as_str().to_string());
    }
    let code = if text.contains('$') {
        "USD"
    } else if text.contains('€') {
        "EUR"
    } else if text.contains('£') {
        "GBP"
    } else if text.contains('₹') {
        "INR"
    } else {
        return None;
    };
    Some(code.to_string())
}

/// Resolves a possibly relative link against the page it was found on
///
/// Only http(s) results are kept.
pub fn resolve_link(base: &Url, link: &str) -> Option<String> {
    let link = clean_text(link)?;
    let resolved = base.join(&link).ok()?;
    matches!(resolved.scheme(), "http" | "https").then(|| resolved.to_string())
}

/// Cleans instructor names and removes duplicates, keeping first-seen order
pub fn dedup_instructors<I, S>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    names
        .into_iter()
        .filter_map(|name| clean_text(name.as_ref()))
        .filter(|name| seen.insert(name.to_lowercase()))
        .collect()
}
