//! Crawler module: the concurrent pipeline from listing page to course record
//!
//! This module contains the core crawling logic, including:
//! - Token-bucket rate limiting shared by every outbound request
//! - Retry with exponential backoff and jitter
//! - The deduplicating URL frontier
//! - Listing discovery (incremental loading, paging, API traffic)
//! - The detail worker pool
//! - Overall crawl coordination

mod candidates;
mod coordinator;
mod discovery;
mod fetcher;
mod frontier;
mod links;
mod rate_limiter;
mod workers;

pub use candidates::{
    inspect_response, ApiEndpointCandidate, CandidateKind, CandidateRegistry, Inspection,
    SharedCandidates, SLUG_PLACEHOLDER,
};
pub use coordinator::{run_crawl, Coordinator};
pub use discovery::{DiscoveryReport, DiscoverySettings, ListingDiscovery};
pub use fetcher::{ExecutorStats, FetchExecutor, RetryPolicy};
pub use frontier::{Frontier, FrontierCounts};
pub use links::{course_links_from_json, extract_course_links};
pub use rate_limiter::RateLimiter;
pub use workers::{DetailWorkerPool, PoolHandle, PoolReport};
