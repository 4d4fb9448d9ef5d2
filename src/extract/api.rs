//! Field mapping for detail API responses
//!
//! Catalog APIs nest the course under varying envelopes (`data`, `course`,
//! `result`, ...). The course object is located with an explicit-stack walk
//! and its keys are mapped through alias lists.

use super::{json_names, json_text};
use crate::record::RawFields;
use serde_json::{Map, Value};

const TITLE: &[&str] = &["title", "name"];
const PROVIDER: &[&str] = &["provider", "platform", "provider_name", "providerName"];
const UNIVERSITY: &[&str] = &["university", "institution", "institution_name", "school"];
const INSTRUCTORS: &[&str] = &["instructors", "instructor", "teachers", "teacher"];
const DESCRIPTION: &[&str] = &["description", "summary", "short_description", "overview"];
const RATING: &[&str] = &["rating", "avg_rating", "average_rating", "rating_value", "ratingValue"];
const REVIEWS: &[&str] = &["review_count", "reviewCount", "reviews_count", "num_reviews", "rating_count"];
const LANGUAGE: &[&str] = &["language", "lang", "inLanguage"];
const LEVEL: &[&str] = &["level", "difficulty", "educationalLevel"];
const DURATION: &[&str] = &["duration", "workload", "effort", "timeRequired"];
const PRICE: &[&str] = &["price", "cost", "pricing"];
const CURRENCY: &[&str] = &["currency", "price_currency", "priceCurrency"];
const CERTIFICATE: &[&str] = &["certificate", "certificate_availability", "has_certificate", "certificate_type"];
const ENROLLMENT: &[&str] = &[
    "enrollment_link",
    "enrollment_url",
    "enroll_url",
    "go_to_class_url",
    "redirect_url",
];
const IMAGE: &[&str] = &["image", "image_url", "thumbnail", "thumbnail_url"];

/// Maps an API document to raw fields
pub fn extract(document: &Value) -> RawFields {
    let Some(course) = find_course_object(document) else {
        return RawFields::default();
    };

    RawFields {
        title: first_text(course, TITLE),
        provider_platform: first_text(course, PROVIDER),
        university: first_text(course, UNIVERSITY),
        instructors: INSTRUCTORS
            .iter()
            .find_map(|key| course.get(*key).map(json_names).filter(|names| !names.is_empty()))
            .unwrap_or_default(),
        description: first_text(course, DESCRIPTION),
        rating: first_text(course, RATING),
        review_count: first_text(course, REVIEWS),
        language: first_text(course, LANGUAGE),
        level: first_text(course, LEVEL),
        duration: first_text(course, DURATION),
        price: first_text(course, PRICE),
        price_currency: first_text(course, CURRENCY),
        certificate_availability: first_text(course, CERTIFICATE),
        enrollment_link: first_text(course, ENROLLMENT),
        image_url: first_text(course, IMAGE),
        raw_json_ld: None,
    }
}

fn first_text(object: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|key| object.get(*key).and_then(json_text))
}

/// Finds the first object, breadth first, that carries a textual title or name
fn find_course_object(document: &Value) -> Option<&Map<String, Value>> {
    let mut queue = std::collections::VecDeque::from([document]);

    while let Some(value) = queue.pop_front() {
        match value {
            Value::Object(map) => {
                if TITLE
                    .iter()
                    .any(|key| map.get(*key).map_or(false, Value::is_string))
                {
                    return Some(map);
                }
                queue.extend(map.values());
            }
            Value::Array(items) => queue.extend(items.iter()),
            _ => {}
        }
    }
    None
}
