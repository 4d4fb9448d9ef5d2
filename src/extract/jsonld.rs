//! JSON-LD extraction
//!
//! Every `application/ld+json` block is parsed; blocks may hold a single
//! node, an array of nodes, or an `@graph` container. The first node typed
//! as a course is mapped from the schema.org vocabulary.

use super::{json_names, json_text};
use crate::record::RawFields;
use scraper::{Html, Selector};
use serde_json::Value;

const COURSE_TYPES: &[&str] = &["Course", "EducationalOccupationalProgram", "Product"];

/// Extracts raw fields from the first course node on the page
pub fn extract(html: &str) -> RawFields {
    match find_course_node(html) {
        Some(node) => fields_from_node(&node),
        None => RawFields::default(),
    }
}

/// Returns the first course-typed JSON-LD node of the page
pub fn find_course_node(html: &str) -> Option<Value> {
    let document = Html::parse_document(html);
    let selector = Selector::parse(r#"script[type="application/ld+json"]"#).ok()?;

    for script in document.select(&selector) {
        let text: String = script.text().collect();
        let text = text.trim();
        if text.is_empty() {
            continue;
        }

        let parsed: Value = match serde_json::from_str(text) {
            Ok(value) => value,
            Err(e) => {
                tracing::debug!("Skipping malformed JSON-LD block: {}", e);
                continue;
            }
        };

        if let Some(node) = course_node_in(&parsed) {
            return Some(node.clone());
        }
    }
    None
}

fn course_node_in(value: &Value) -> Option<&Value> {
    match value {
        Value::Array(items) => items.iter().find_map(course_node_in),
        Value::Object(map) => {
            if map.get("@type").map_or(false, type_is_course) {
                return Some(value);
            }
            map.get("@graph").and_then(course_node_in)
        }
        _ => None,
    }
}

fn type_is_course(t: &Value) -> bool {
    match t {
        Value::String(s) => COURSE_TYPES.contains(&s.as_str()),
        Value::Array(items) => items.iter().any(type_is_course),
        _ => false,
    }
}

fn is_person(value: &Value) -> bool {
    value
        .get("@type")
        .and_then(Value::as_str)
        .map_or(false, |t| t == "Person")
}

/// Maps a schema.org course node to raw fields
pub fn fields_from_node(node: &Value) -> RawFields {
    let text = |key: &str| node.get(key).and_then(json_text);

    let rating = node.get("aggregateRating");
    let offers = node.get("offers").map(|offers| match offers {
        Value::Array(items) => items.first().unwrap_or(offers),
        other => other,
    });
    let instance = node.get("hasCourseInstance").map(|instances| match instances {
        Value::Array(items) => items.first().unwrap_or(instances),
        other => other,
    });

    let mut instructors = node.get("instructor").map(json_names).unwrap_or_default();
    let mut university = None;
    match node.get("creator") {
        Some(Value::Array(creators)) => {
            for creator in creators {
                if is_person(creator) {
                    instructors.extend(json_text(creator));
                } else if university.is_none() {
                    university = json_text(creator);
                }
            }
        }
        Some(creator) if is_person(creator) => instructors.extend(json_text(creator)),
        Some(creator) => university = json_text(creator),
        None => {}
    }
    if let Some(instance) = instance {
        if instructors.is_empty() {
            instructors = instance.get("instructor").map(json_names).unwrap_or_default();
        }
    }

    RawFields {
        title: text("name"),
        provider_platform: text("provider"),
        university,
        instructors,
        description: text("description"),
        rating: rating.and_then(|r| r.get("ratingValue")).and_then(json_text),
        review_count: rating
            .and_then(|r| r.get("reviewCount").or_else(|| r.get("ratingCount")))
            .and_then(json_text),
        language: text("inLanguage"),
        level: text("educationalLevel"),
        duration: text("timeRequired").or_else(|| {
            instance
                .and_then(|i| i.get("courseWorkload"))
                .and_then(json_text)
        }),
        price: offers
            .and_then(|o| o.get("price").or_else(|| o.get("category")))
            .and_then(json_text),
        price_currency: offers.and_then(|o| o.get("priceCurrency")).and_then(json_text),
        certificate_availability: text("educationalCredentialAwarded"),
        enrollment_link: offers.and_then(|o| o.get("url")).and_then(json_text),
        image_url: node.get("image").and_then(image_url),
        raw_json_ld: Some(node.clone()),
    }
}

fn image_url(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Object(map) => map.get("url").and_then(Value::as_str).map(str::to_string),
        Value::Array(items) => items.iter().find_map(image_url),
        _ => None,
    }
}
