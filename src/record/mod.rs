//! Course records and the multi-source merge
//!
//! Each extraction source produces [`RawFields`]: untrimmed strings exactly as
//! they were found. [`CourseFields::from_raw`] normalizes one source into typed
//! values, [`CourseFields::fill_from`] merges a lower-priority source into a
//! higher-priority one field by field, and [`CourseFields::into_record`]
//! enforces the required fields.

pub mod normalize;

use crate::ExtractionError;
use normalize::{
    clean_opt, dedup_instructors, detect_currency, parse_count, parse_price, parse_rating,
    resolve_link,
};
use serde::{Deserialize, Serialize};
use url::Url;

/// Fields as scraped by one extraction source
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawFields {
    pub title: Option<String>,
    pub provider_platform: Option<String>,
    pub university: Option<String>,
    pub instructors: Vec<String>,
    pub description: Option<String>,
    pub rating: Option<String>,
    pub review_count: Option<String>,
    pub language: Option<String>,
    pub level: Option<String>,
    pub duration: Option<String>,
    pub price: Option<String>,
    pub price_currency: Option<String>,
    pub certificate_availability: Option<String>,
    pub enrollment_link: Option<String>,
    pub image_url: Option<String>,
    pub raw_json_ld: Option<serde_json::Value>,
}

impl RawFields {
    /// Returns true if the source found nothing at all
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Normalized, typed fields of one source or of a merge of several
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CourseFields {
    pub title: Option<String>,
    pub provider_platform: Option<String>,
    pub university: Option<String>,
    pub instructors: Vec<String>,
    pub description: Option<String>,
    pub rating: Option<f64>,
    pub review_count: Option<u64>,
    pub language: Option<String>,
    pub level: Option<String>,
    pub duration: Option<String>,
    pub price: Option<f64>,
    pub price_currency: Option<String>,
    pub certificate_availability: Option<String>,
    pub enrollment_link: Option<String>,
    pub image_url: Option<String>,
    pub raw_json_ld: Option<serde_json::Value>,
}

impl CourseFields {
    /// Normalizes one source's raw fields
    ///
    /// Relative links are resolved against `page`, the detail URL.
    pub fn from_raw(raw: &RawFields, page: &Url) -> Self {
        let price_text = raw.price.as_deref();
        let price_currency = clean_opt(raw.price_currency.as_deref())
            .map(|c| c.to_uppercase())
            .or_else(|| price_text.and_then(detect_currency));

        Self {
            title: clean_opt(raw.title.as_deref()),
            provider_platform: clean_opt(raw.provider_platform.as_deref()),
            university: clean_opt(raw.university.as_deref()),
            instructors: dedup_instructors(&raw.instructors),
            description: clean_opt(raw.description.as_deref()),
            rating: raw.rating.as_deref().and_then(parse_rating),
            review_count: raw.review_count.as_deref().and_then(parse_count),
            language: clean_opt(raw.language.as_deref()),
            level: clean_opt(raw.level.as_deref()),
            duration: clean_opt(raw.duration.as_deref()),
            price: price_text.and_then(parse_price),
            price_currency,
            certificate_availability: clean_opt(raw.certificate_availability.as_deref()),
            enrollment_link: raw
                .enrollment_link
                .as_deref()
                .and_then(|link| resolve_link(page, link)),
            image_url: raw
                .image_url
                .as_deref()
                .and_then(|link| resolve_link(page, link)),
            raw_json_ld: raw.raw_json_ld.clone(),
        }
    }

    /// Fills every field still empty from a lower-priority source
    ///
    /// Instructors are taken as a whole list, never interleaved.
    pub fn fill_from(&mut self, other: CourseFields) {
        fn fill<T>(slot: &mut Option<T>, value: Option<T>) {
            if slot.is_none() {
                *slot = value;
            }
        }

        fill(&mut self.title, other.title);
        fill(&mut self.provider_platform, other.provider_platform);
        fill(&mut self.university, other.university);
        if self.instructors.is_empty() {
            self.instructors = other.instructors;
        }
        fill(&mut self.description, other.description);
        fill(&mut self.rating, other.rating);
        fill(&mut self.review_count, other.review_count);
        fill(&mut self.language, other.language);
        fill(&mut self.level, other.level);
        fill(&mut self.duration, other.duration);
        fill(&mut self.price, other.price);
        fill(&mut self.price_currency, other.price_currency);
        fill(&mut self.certificate_availability, other.certificate_availability);
        fill(&mut self.enrollment_link, other.enrollment_link);
        fill(&mut self.image_url, other.image_url);
        fill(&mut self.raw_json_ld, other.raw_json_ld);
    }

    /// Produces the final record, failing if a required field is absent
    pub fn into_record(self, page: &Url) -> Result<CourseRecord, ExtractionError> {
        let missing: Vec<&str> = [
            ("title", self.title.is_none()),
            ("enrollment_link", self.enrollment_link.is_none()),
        ]
        .into_iter()
        .filter_map(|(name, absent)| absent.then_some(name))
        .collect();

        match (self.title, self.enrollment_link) {
            (Some(title), Some(enrollment_link)) => Ok(CourseRecord {
                url: page.to_string(),
                title,
                provider_platform: self.provider_platform,
                university: self.university,
                instructors: self.instructors,
                description: self.description,
                rating: self.rating,
                review_count: self.review_count,
                language: self.language,
                level: self.level,
                duration: self.duration,
                price: self.price,
                price_currency: self.price_currency,
                certificate_availability: self.certificate_availability,
                enrollment_link,
                image_url: self.image_url,
                raw_json_ld: self.raw_json_ld,
            }),
            _ => Err(ExtractionError::MissingRequired {
                url: page.to_string(),
                missing: missing.join(", "),
            }),
        }
    }
}

/// Merges sources given in priority order into one record
///
/// For every field the first source with a usable value wins.
pub fn merge_sources<'a, I>(page: &Url, sources: I) -> Result<CourseRecord, ExtractionError>
where
    I: IntoIterator<Item = &'a RawFields>,
{
    let mut merged = CourseFields::default();
    for raw in sources {
        merged.fill_from(CourseFields::from_raw(raw, page));
    }
    merged.into_record(page)
}

/// One exported course
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseRecord {
    pub url: String,
    pub title: String,
    pub provider_platform: Option<String>,
    pub university: Option<String>,
    pub instructors: Vec<String>,
    pub description: Option<String>,
    pub rating: Option<f64>,
    pub review_count: Option<u64>,
    pub language: Option<String>,
    pub level: Option<String>,
    pub duration: Option<String>,
    pub price: Option<f64>,
    pub price_currency: Option<String>,
    pub certificate_availability: Option<String>,
    pub enrollment_link: String,
    pub image_url: Option<String>,
    pub raw_json_ld: Option<serde_json::Value>,
}
