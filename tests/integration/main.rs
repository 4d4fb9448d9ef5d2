//! Integration tests for Course-Ripple
//!
//! Crawl tests drive the coordinator through an in-memory scripted browser;
//! browser and export tests use wiremock and temporary directories.

mod browser_tests;
mod crawl_tests;
mod export_tests;
mod support;
