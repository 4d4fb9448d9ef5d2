//! State module for tracking crawl progress
//!
//! This module provides the per-URL lifecycle used by the frontier.
//!
//! # Components
//!
//! - `UrlState`: Discovered, Queued, Fetching, Done, Failed
//! - `UrlEntry`: a canonical URL with its state, attempt count and last error

mod url_state;

pub use url_state::{UrlEntry, UrlState};
