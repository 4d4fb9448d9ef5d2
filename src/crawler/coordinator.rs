//! Crawler coordinator - main crawl orchestration logic
//!
//! This module wires the crawl together:
//! - Building the shared rate limiter, fetch executor, frontier and candidate registry
//! - Starting the detail worker pool before discovery, so detail work overlaps it
//! - Running listing discovery, then closing the frontier
//! - Handing the finished record set to the export sinks
//! - Assembling the run summary

use crate::browser::{Browser, HttpBrowser};
use crate::config::{validate, Config};
use crate::crawler::{
    CandidateRegistry, DetailWorkerPool, DiscoveryReport, DiscoverySettings, FetchExecutor,
    Frontier, ListingDiscovery, PoolReport, RateLimiter, RetryPolicy, SharedCandidates,
};
use crate::output::{
    generate_markdown_summary, CandidateSummary, CrawlSummary, ExportSink, FailedUrl, SinkSet,
    SUMMARY_FILE_NAME,
};
use crate::url::SiteProfile;
use crate::RippleError;
use chrono::{DateTime, Utc};
use std::path::Path;
use std::sync::Arc;

/// Main crawler coordinator structure
///
/// A coordinator owns the state of exactly one run; build a new one for
/// every crawl.
pub struct Coordinator {
    config: Arc<Config>,
    browser: Arc<dyn Browser>,
    site: Arc<SiteProfile>,
    executor: Arc<FetchExecutor>,
    frontier: Arc<Frontier>,
    candidates: SharedCandidates,
    config_hash: String,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration, validated here
    /// * `browser` - The page loading capability used for every request
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(RippleError)` - The configuration is invalid
    pub fn new(config: Config, browser: Arc<dyn Browser>) -> Result<Self, RippleError> {
        validate(&config)?;

        let site = SiteProfile::from_config(&config.site)?;
        let limiter = RateLimiter::new(config.crawler.burst, config.crawler.rate)?;
        let executor = FetchExecutor::new(Arc::new(limiter), RetryPolicy::from_config(&config.retry));

        Ok(Self {
            config: Arc::new(config),
            browser,
            site: Arc::new(site),
            executor: Arc::new(executor),
            frontier: Arc::new(Frontier::new()),
            candidates: CandidateRegistry::shared(),
            config_hash: String::new(),
        })
    }

    /// Sets the configuration file hash reported in the summary
    pub fn with_config_hash(mut self, hash: impl Into<String>) -> Self {
        self.config_hash = hash.into();
        self
    }

    /// The frontier of this run
    pub fn frontier(&self) -> &Arc<Frontier> {
        &self.frontier
    }

    /// Runs discovery and the detail workers, then exports the records
    ///
    /// The worker pool is started first and waits on the frontier. Once
    /// discovery finishes (successfully or not) the frontier is closed, the
    /// pool drains what is left, and every record is handed to `sink` once.
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlSummary)` - The run finished and the records were exported
    /// * `Err(RippleError::NoListingReachable)` - No listing page could be loaded
    /// * `Err(RippleError)` - A worker task panicked or an export failed
    pub async fn run(&self, sink: &dyn ExportSink) -> Result<CrawlSummary, RippleError> {
        let started_at = Utc::now();
        tracing::info!(
            "Starting crawl of {} with {} ({} workers, {} req/s)",
            self.site.listing_url(),
            self.browser.name(),
            self.config.crawler.concurrency,
            self.config.crawler.rate
        );

        let pool = DetailWorkerPool::new(
            self.config.crawler.concurrency as usize,
            self.browser.clone(),
            self.executor.clone(),
            self.frontier.clone(),
            self.candidates.clone(),
            self.site.clone(),
        )
        .spawn();

        let discovery = ListingDiscovery::new(
            self.browser.clone(),
            self.executor.clone(),
            self.frontier.clone(),
            self.candidates.clone(),
            self.site.clone(),
            DiscoverySettings::from_config(&self.config),
        );
        let discovered = discovery.run().await;

        // Workers exit once the closed frontier is drained
        self.frontier.close();
        let mut pool_report = pool.join().await?;
        let discovery_report = discovered?;

        pool_report.records.sort_by(|a, b| a.url.cmp(&b.url));
        sink.export(&pool_report.records)?;

        let summary = self
            .build_summary(started_at, &discovery_report, &pool_report)
            .await;

        tracing::info!(
            "Crawl completed: {} records from {} course pages in {}s",
            summary.records_exported,
            summary.urls_discovered,
            summary.duration_seconds.unwrap_or_default()
        );

        Ok(summary)
    }

    async fn build_summary(
        &self,
        started_at: DateTime<Utc>,
        discovery: &DiscoveryReport,
        pool: &PoolReport,
    ) -> CrawlSummary {
        let finished_at = Utc::now();
        let counts = self.frontier.counts();
        let stats = self.executor.stats();

        let candidates = self
            .candidates
            .read()
            .await
            .all()
            .iter()
            .map(|c| CandidateSummary {
                kind: c.kind.as_str().to_string(),
                url_pattern: c.url_pattern.clone(),
                confidence: c.confidence,
            })
            .collect();

        let failed_urls = self
            .frontier
            .failed_entries()
            .into_iter()
            .map(|entry| FailedUrl {
                reason: entry.last_error.unwrap_or_default(),
                url: entry.url,
            })
            .collect();

        CrawlSummary {
            started_at: started_at.to_rfc3339(),
            finished_at: Some(finished_at.to_rfc3339()),
            duration_seconds: u64::try_from((finished_at - started_at).num_seconds()).ok(),
            status: "completed".to_string(),
            config_hash: self.config_hash.clone(),
            browser: self.browser.name().to_string(),
            listing_url: self.site.listing_url().to_string(),
            pages_visited: discovery.pages_visited,
            pages_reachable: discovery.pages_reachable,
            load_more_rounds: discovery.load_more_rounds,
            api_pages: discovery.api_pages,
            responses_inspected: discovery.responses_inspected,
            urls_discovered: counts.total(),
            urls_done: counts.done,
            urls_failed: counts.failed,
            records_exported: pool.records.len(),
            api_documents: pool.api_documents,
            requests: stats.requests,
            retries: stats.retries,
            candidates,
            failed_urls,
        }
    }
}

/// Runs the main crawl operation against the live site
///
/// This function orchestrates the entire crawl process:
///
/// 1. Build the HTTP browser from the site configuration
/// 2. Run discovery and the detail workers
/// 3. Export `courses.json` and `courses.csv` into the output directory
/// 4. Write `summary.md` next to them
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `config_hash` - Hash of the configuration file, reported in the summary
///
/// # Returns
///
/// * `Ok(CrawlSummary)` - Crawl completed successfully
/// * `Err(RippleError)` - Crawl failed with an error
///
/// # Example
///
/// ```no_run
/// use course_ripple::config::load_config;
/// use course_ripple::crawler::run_crawl;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("ripple.toml"))?;
/// let summary = run_crawl(config, "").await?;
/// println!("Scraped {} courses", summary.records_exported);
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(config: Config, config_hash: &str) -> Result<CrawlSummary, RippleError> {
    let browser = HttpBrowser::new(&config.site, config.crawler.headed)?;
    let output_dir = Path::new(&config.output.directory).to_path_buf();
    let sinks = SinkSet::standard(&output_dir);

    let coordinator = Coordinator::new(config, Arc::new(browser))?.with_config_hash(config_hash);
    let summary = coordinator.run(&sinks).await?;

    let summary_path = output_dir.join(SUMMARY_FILE_NAME);
    generate_markdown_summary(&summary, &summary_path)?;
    tracing::info!("Summary written to {}", summary_path.display());

    Ok(summary)
}
