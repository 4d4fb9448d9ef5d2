//! DOM extraction: selectors and label heuristics over the rendered page
//!
//! This is the source of last resort. Selectors cover the detail page
//! layout; facts without stable markup (Language, Level, Duration, Price,
//! Certificate) are found by their visible label.

use crate::record::RawFields;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

const TITLE: &str = "h1";
const INSTRUCTORS: &str = "[data-name='instructors'] a, .instructor a, .course-instructors a";
const PROVIDER: &str = "[data-name='provider'] a, .course-provider a, a[data-track*='provider']";
const UNIVERSITY: &str = "[data-name='institution'] a, .course-institution a";
const RATING: &str = "[itemprop='ratingValue'], .rating .value";
const REVIEWS: &str = "[itemprop='reviewCount'], .rating .count";
const ENROLLMENT: &[&str] = &[
    "a[data-name='go-to-class']",
    "a.btn-go-to-class",
    "a[href*='/redirect']",
];

/// Longest text accepted as a labelled fact
const MAX_FACT_LEN: usize = 200;

/// Elements whose text never holds a visible fact
const NON_VISIBLE: &[&str] = &["script", "style", "noscript", "title", "head"];

/// Extracts raw fields from a detail page
pub fn extract(html: &str) -> RawFields {
    let document = Html::parse_document(html);

    RawFields {
        title: select_text(&document, TITLE).or_else(|| meta_content(&document, "meta[property='og:title']")),
        provider_platform: select_text(&document, PROVIDER),
        university: select_text(&document, UNIVERSITY),
        instructors: select_all_text(&document, INSTRUCTORS),
        description: meta_content(&document, "meta[name='description']")
            .or_else(|| meta_content(&document, "meta[property='og:description']")),
        rating: select_value(&document, RATING),
        review_count: select_value(&document, REVIEWS),
        language: grab_fact(&document, "Language"),
        level: grab_fact(&document, "Level"),
        duration: grab_fact(&document, "Duration"),
        price: grab_fact(&document, "Price"),
        price_currency: None,
        certificate_availability: grab_fact(&document, "Certificate"),
        enrollment_link: ENROLLMENT
            .iter()
            .find_map(|selector| select_attr(&document, selector, "href")),
        image_url: meta_content(&document, "meta[property='og:image']"),
        raw_json_ld: None,
    }
}

fn element_text(element: ElementRef<'_>) -> Option<String> {
    let text = element.text().collect::<Vec<_>>().join(" ");
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    (!text.is_empty()).then_some(text)
}

fn select_text(document: &Html, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    document.select(&selector).find_map(element_text)
}

fn select_all_text(document: &Html, selector: &str) -> Vec<String> {
    match Selector::parse(selector) {
        Ok(selector) => document.select(&selector).filter_map(element_text).collect(),
        Err(_) => Vec::new(),
    }
}

fn select_attr(document: &Html, selector: &str, attr: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    document
        .select(&selector)
        .filter_map(|element| element.value().attr(attr))
        .map(str::trim)
        .find(|value| !value.is_empty())
        .map(str::to_string)
}

fn meta_content(document: &Html, selector: &str) -> Option<String> {
    select_attr(document, selector, "content")
}

/// Text of the first match, falling back to its `content` attribute (microdata `<meta>`)
fn select_value(document: &Html, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    document.select(&selector).find_map(|element| {
        element_text(element).or_else(|| {
            element
                .value()
                .attr("content")
                .map(str::trim)
                .filter(|content| !content.is_empty())
                .map(str::to_string)
        })
    })
}

/// Finds a fact by its visible label
///
/// The first visible text node mentioning the label is located. With inline
/// markup (`<li>Language: English</li>`) the fact is the parent's text minus
/// the label; with split markup (`<dt>Language</dt><dd>English</dd>`) it is
/// the text of the next sibling element.
fn grab_fact(document: &Html, label: &str) -> Option<String> {
    let pattern = Regex::new(&format!("(?i){}", regex::escape(label))).ok()?;

    for node in document.root_element().descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        if !pattern.is_match(text) {
            continue;
        }

        let Some(parent) = node.parent().and_then(ElementRef::wrap) else {
            continue;
        };
        if NON_VISIBLE.contains(&parent.value().name()) {
            continue;
        }

        let parent_text = element_text(parent).unwrap_or_default();
        let stripped = pattern.replace(&parent_text, "");
        let fact = stripped.trim_matches(|c: char| c == ' ' || c == ':' || c == '-');

        let fact = if fact.is_empty() {
            parent
                .next_siblings()
                .find_map(ElementRef::wrap)
                .and_then(element_text)
                .unwrap_or_default()
        } else {
            fact.to_string()
        };

        if !fact.is_empty() && fact.len() < MAX_FACT_LEN {
            return Some(fact);
        }
    }
    None
}
