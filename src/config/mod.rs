//! Configuration module for Course-Ripple
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! A validated [`Config`] is the crawl session: built once at startup and shared
//! immutably for the rest of the run.
//!
//! # Example
//!
//! ```no_run
//! use course_ripple::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("ripple.toml")).unwrap();
//! println!("Crawler will use {} workers", config.crawler.concurrency);
//! ```

mod parser;
mod types;
mod validation;

pub use types::{Config, CrawlerConfig, OutputConfig, RetryConfig, SiteConfig};

pub use parser::{compute_config_hash, load_config, parse_config, read_config_with_hash};
pub use validation::validate;
