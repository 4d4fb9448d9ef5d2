//! Course-Ripple: a rate-limited course catalog harvester
//!
//! This crate discovers course detail pages on a JavaScript-rendered catalog
//! site and extracts one normalized record per course, merging structured API
//! data, JSON-LD blocks, and DOM heuristics.

pub mod browser;
pub mod config;
pub mod crawler;
pub mod extract;
pub mod output;
pub mod record;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for Course-Ripple operations
#[derive(Debug, Error)]
pub enum RippleError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("Export error: {0}")]
    Export(#[from] output::ExportError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("No listing page was reachable starting from {listing_url}")]
    NoListingReachable { listing_url: String },

    #[error("Invalid state transition for {url}: {from:?} -> {to:?}")]
    InvalidTransition {
        url: String,
        from: state::UrlState,
        to: state::UrlState,
    },

    #[error("Unknown frontier URL: {0}")]
    UnknownUrl(String),

    #[error("Worker task failed: {0}")]
    Worker(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,
}

/// Errors produced by a single network or navigation attempt
///
/// Whether an error is worth retrying is decided by [`FetchError::is_transient`];
/// the fetch executor is the only component that acts on it.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Connection error for {url}: {message}")]
    Connection { url: String, message: String },

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Bot challenge served at {url}")]
    BotChallenge { url: String },

    #[error("Malformed response from {url}: {message}")]
    Malformed { url: String, message: String },
}

impl FetchError {
    /// Returns true for failures that may succeed on a later attempt
    ///
    /// Timeouts, dropped connections, 5xx, 429 and bot challenges are
    /// transient. Every other status and malformed payloads are permanent.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout { .. } | Self::Connection { .. } | Self::BotChallenge { .. } => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            Self::Malformed { .. } => false,
        }
    }

    /// The URL the failed attempt targeted
    pub fn url(&self) -> &str {
        match self {
            Self::Timeout { url }
            | Self::Connection { url, .. }
            | Self::Status { url, .. }
            | Self::BotChallenge { url }
            | Self::Malformed { url, .. } => url,
        }
    }
}

/// Raised when no extraction source produced the fields a record needs
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("No extraction source yielded {missing} for {url}")]
    MissingRequired { url: String, missing: String },
}

/// Result type alias for Course-Ripple operations
pub type Result<T> = std::result::Result<T, RippleError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use record::CourseRecord;
pub use state::{UrlEntry, UrlState};
pub use url::{canonicalize_url, SiteProfile};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        let url = "https://example.com/course/x".to_string();

        assert!(FetchError::Timeout { url: url.clone() }.is_transient());
        assert!(FetchError::BotChallenge { url: url.clone() }.is_transient());
        assert!(FetchError::Connection {
            url: url.clone(),
            message: "reset".to_string()
        }
        .is_transient());
        assert!(FetchError::Status {
            url: url.clone(),
            status: 503
        }
        .is_transient());
        assert!(FetchError::Status {
            url: url.clone(),
            status: 429
        }
        .is_transient());
    }

    #[test]
    fn test_permanent_classification() {
        let url = "https://example.com/course/x".to_string();

        assert!(!FetchError::Status {
            url: url.clone(),
            status: 404
        }
        .is_transient());
        assert!(!FetchError::Status {
            url: url.clone(),
            status: 403
        }
        .is_transient());
        assert!(!FetchError::Malformed {
            url: url.clone(),
            message: "not json".to_string()
        }
        .is_transient());
    }

    #[test]
    fn test_fetch_error_url() {
        let err = FetchError::Status {
            url: "https://example.com/a".to_string(),
            status: 500,
        };
        assert_eq!(err.url(), "https://example.com/a");
    }
}
