//! Listing discovery: enumerates course detail URLs into the frontier
//!
//! Three strategies share one page budget (`max-pages`); every navigation,
//! interaction round and API page counts against it, failed ones included.
//!
//! 1. **Incremental load**: on the first listing page, trigger "load more"
//!    (falling back to scrolling) until a no-growth streak, until the page
//!    offers neither interaction, or until the round limit.
//! 2. **Paged probing**: request `?page=N` from page 2 upward until a
//!    no-growth streak.
//! 3. **API listing probing**: page through every listing endpoint detected
//!    in the observed traffic, under the same no-growth rule.
//!
//! Observed responses travel over a bounded channel to the traffic inspector
//! task, which walks JSON bodies for course links and records API endpoint
//! candidates. After each step discovery flushes the inspector so the step's
//! growth includes links found in its traffic.

use crate::browser::{Browser, Interaction, ObservedResponse, PageSnapshot};
use crate::config::Config;
use crate::crawler::candidates::{inspect_response, SharedCandidates};
use crate::crawler::links::{course_links_from_json, extract_course_links};
use crate::crawler::{FetchExecutor, Frontier};
use crate::url::SiteProfile;
use crate::RippleError;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use url::Url;

/// Capacity of the observed-traffic channel
const TRAFFIC_CHANNEL_CAPACITY: usize = 64;

/// Discovery limits taken from the configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoverySettings {
    pub max_pages: u32,
    pub no_growth_streak: u32,
    pub max_load_more_rounds: u32,
    pub page_param: String,
}

impl DiscoverySettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_pages: config.crawler.max_pages,
            no_growth_streak: config.crawler.no_growth_streak.max(1),
            max_load_more_rounds: config.crawler.max_load_more_rounds,
            page_param: config.site.page_param.clone(),
        }
    }
}

/// What discovery did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoveryReport {
    /// Page loads attempted: navigations, interaction rounds and API pages
    pub pages_visited: u32,

    /// HTML listing loads that succeeded
    pub pages_reachable: u32,

    /// Load-more or scroll rounds performed
    pub load_more_rounds: u32,

    /// API listing pages requested
    pub api_pages: u32,

    /// New URLs added to the frontier
    pub urls_added: usize,

    /// Observed responses handed to the inspector
    pub responses_inspected: usize,

    /// API endpoint candidates known at the end of discovery
    pub candidates: usize,
}

/// Counts consecutive zero-yield steps
#[derive(Debug, Default)]
struct NoGrowth {
    streak: u32,
    threshold: u32,
}

impl NoGrowth {
    fn new(threshold: u32) -> Self {
        Self {
            streak: 0,
            threshold,
        }
    }

    /// Records a step; returns true once the streak reaches the threshold
    fn record(&mut self, new_urls: usize) -> bool {
        if new_urls == 0 {
            self.streak += 1;
        } else {
            self.streak = 0;
        }
        self.streak >= self.threshold
    }
}

enum InspectorMessage {
    Observed(Box<ObservedResponse>),
    Flush(oneshot::Sender<usize>),
}

/// Consumer side of the observed-traffic channel
struct TrafficInspector {
    frontier: Arc<Frontier>,
    candidates: SharedCandidates,
    site: Arc<SiteProfile>,
    page_param: String,
}

impl TrafficInspector {
    fn spawn(self) -> (mpsc::Sender<InspectorMessage>, JoinHandle<usize>) {
        let (tx, rx) = mpsc::channel(TRAFFIC_CHANNEL_CAPACITY);
        let handle = tokio::spawn(self.run(rx));
        (tx, handle)
    }

    async fn run(self, mut rx: mpsc::Receiver<InspectorMessage>) -> usize {
        let mut inspected = 0;
        let mut added_since_flush = 0;

        while let Some(message) = rx.recv().await {
            match message {
                InspectorMessage::Observed(response) => {
                    inspected += 1;
                    let inspection = inspect_response(&response, &self.site, &self.page_param);
                    if inspection.links.is_empty() {
                        continue;
                    }

                    // The candidate must be visible before workers can claim its links
                    if let Some(candidate) = inspection.candidate {
                        let pattern = candidate.url_pattern.clone();
                        let kind = candidate.kind;
                        if self.candidates.write().await.record(candidate) {
                            tracing::info!("Detected {} API endpoint: {}", kind.as_str(), pattern);
                        }
                    }

                    let added = self
                        .frontier
                        .add_all(inspection.links.iter().map(Url::as_str));
                    added_since_flush += added;
                    tracing::debug!(
                        "{} yielded {} course links ({} new)",
                        response.url,
                        inspection.links.len(),
                        added
                    );
                }
                InspectorMessage::Flush(reply) => {
                    let _ = reply.send(added_since_flush);
                    added_since_flush = 0;
                }
            }
        }

        inspected
    }
}

/// Listing discovery engine
pub struct ListingDiscovery {
    browser: Arc<dyn Browser>,
    executor: Arc<FetchExecutor>,
    frontier: Arc<Frontier>,
    candidates: SharedCandidates,
    site: Arc<SiteProfile>,
    settings: DiscoverySettings,
}

/// Per-run mutable state of one `run` call
struct Run {
    report: DiscoveryReport,
    traffic: mpsc::Sender<InspectorMessage>,
}

impl ListingDiscovery {
    pub fn new(
        browser: Arc<dyn Browser>,
        executor: Arc<FetchExecutor>,
        frontier: Arc<Frontier>,
        candidates: SharedCandidates,
        site: Arc<SiteProfile>,
        settings: DiscoverySettings,
    ) -> Self {
        Self {
            browser,
            executor,
            frontier,
            candidates,
            site,
            settings,
        }
    }

    /// Runs every strategy until exhausted or until the page budget is spent
    ///
    /// # Returns
    ///
    /// * `Ok(DiscoveryReport)` - At least one listing page was reachable
    /// * `Err(RippleError::NoListingReachable)` - Every listing load failed
    pub async fn run(&self) -> Result<DiscoveryReport, RippleError> {
        let inspector = TrafficInspector {
            frontier: self.frontier.clone(),
            candidates: self.candidates.clone(),
            site: self.site.clone(),
            page_param: self.settings.page_param.clone(),
        };
        let (traffic, inspector_handle) = inspector.spawn();
        let mut run = Run {
            report: DiscoveryReport::default(),
            traffic,
        };

        tracing::info!(
            "Starting listing discovery at {} (budget {} pages)",
            self.site.listing_url(),
            self.settings.max_pages
        );

        let first_page_loaded = self.incremental_load(&mut run).await;
        self.paged_probing(&mut run, first_page_loaded).await;

        // The inspector must see all traffic before API listings are read
        self.flush(&run).await;
        self.api_listing_probing(&mut run).await;

        let Run { mut report, traffic } = run;
        drop(traffic);
        report.responses_inspected = inspector_handle
            .await
            .map_err(|e| RippleError::Worker(format!("traffic inspector failed: {}", e)))?;
        report.candidates = self.candidates.read().await.len();

        tracing::info!(
            "Discovery finished: {} pages visited, {} reachable, {} URLs, {} API candidates",
            report.pages_visited,
            report.pages_reachable,
            self.frontier.len(),
            report.candidates
        );

        if report.pages_reachable == 0 {
            return Err(RippleError::NoListingReachable {
                listing_url: self.site.listing_url().to_string(),
            });
        }
        Ok(report)
    }

    fn budget_left(&self, run: &Run) -> bool {
        run.report.pages_visited < self.settings.max_pages
    }

    /// Strategy 1; returns whether the first listing page loaded
    async fn incremental_load(&self, run: &mut Run) -> bool {
        if !self.budget_left(run) {
            return false;
        }

        let listing = self.site.listing_url().clone();
        run.report.pages_visited += 1;
        let first = self
            .executor
            .execute("listing page 1", || self.browser.navigate(&listing))
            .await;

        let snapshot = match first {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!("Listing page 1 failed: {}", e);
                return false;
            }
        };
        run.report.pages_reachable += 1;
        let new_urls = self.observe(run, snapshot).await;
        tracing::info!("Listing page 1 yielded {} new URLs", new_urls);

        let mut interaction = Interaction::LoadMore;
        let mut growth = NoGrowth::new(self.settings.no_growth_streak);
        let mut round = 0;

        while round < self.settings.max_load_more_rounds && self.budget_left(run) {
            let label = format!("{} round {}", interaction.as_str(), round + 1);
            let result = self
                .executor
                .execute(&label, || self.browser.interact(&listing, interaction))
                .await;

            let new_urls = match result {
                Ok(Some(snapshot)) => {
                    round += 1;
                    run.report.pages_visited += 1;
                    run.report.pages_reachable += 1;
                    run.report.load_more_rounds += 1;
                    self.observe(run, snapshot).await
                }
                Ok(None) if interaction == Interaction::LoadMore => {
                    tracing::debug!("No load-more control, falling back to scrolling");
                    interaction = Interaction::ScrollToBottom;
                    continue;
                }
                Ok(None) => {
                    tracing::debug!("Listing page offers no incremental loading");
                    break;
                }
                Err(e) => {
                    round += 1;
                    run.report.pages_visited += 1;
                    tracing::warn!("{} failed: {}", label, e);
                    0
                }
            };

            tracing::debug!("{} yielded {} new URLs", label, new_urls);
            if growth.record(new_urls) {
                tracing::debug!("Incremental loading stopped after {} rounds", round);
                break;
            }
        }

        true
    }

    /// Strategy 2
    async fn paged_probing(&self, run: &mut Run, first_page_loaded: bool) {
        let mut growth = NoGrowth::new(self.settings.no_growth_streak);
        // A failed first page is the first zero-yield step
        if !first_page_loaded && growth.record(0) {
            return;
        }

        let mut page = 2;
        while self.budget_left(run) {
            let url = self.site.listing_page_url(page);
            let label = format!("listing page {}", page);
            run.report.pages_visited += 1;

            let new_urls = match self
                .executor
                .execute(&label, || self.browser.navigate(&url))
                .await
            {
                Ok(snapshot) => {
                    run.report.pages_reachable += 1;
                    self.observe(run, snapshot).await
                }
                Err(e) => {
                    tracing::warn!("{} failed: {}", label, e);
                    0
                }
            };

            if page % 10 == 0 {
                tracing::info!(
                    "Probed {} listing pages, {} URLs known",
                    page,
                    self.frontier.len()
                );
            }
            tracing::debug!("{} yielded {} new URLs", label, new_urls);

            if growth.record(new_urls) {
                tracing::info!("Paged probing stopped at page {}", page);
                break;
            }
            page += 1;
        }
    }

    /// Strategy 3
    async fn api_listing_probing(&self, run: &mut Run) {
        let listings = self.candidates.read().await.listings();

        for candidate in listings {
            let mut growth = NoGrowth::new(self.settings.no_growth_streak);
            let mut page = 1;

            while self.budget_left(run) {
                let Some(url) = candidate.listing_page(&self.settings.page_param, page) else {
                    break;
                };
                let label = format!("API listing {} page {}", candidate.url_pattern, page);
                run.report.pages_visited += 1;
                run.report.api_pages += 1;

                let new_urls = match self
                    .executor
                    .execute(&label, || self.browser.fetch_json(&url))
                    .await
                {
                    Ok(document) => {
                        let links = course_links_from_json(&document, &self.site);
                        self.frontier.add_all(links.iter().map(Url::as_str))
                    }
                    Err(e) => {
                        tracing::warn!("{} failed: {}", label, e);
                        0
                    }
                };

                run.report.urls_added += new_urls;
                tracing::debug!("{} yielded {} new URLs", label, new_urls);
                if growth.record(new_urls) {
                    break;
                }
                page += 1;
            }
        }
    }

    /// Feeds one loaded page to the frontier and the inspector
    ///
    /// Returns the number of new URLs the step produced.
    async fn observe(&self, run: &mut Run, snapshot: PageSnapshot) -> usize {
        let links = extract_course_links(&snapshot.html, &self.site);
        let from_html = self.frontier.add_all(links.iter().map(Url::as_str));

        for response in snapshot.observed {
            if run
                .traffic
                .send(InspectorMessage::Observed(Box::new(response)))
                .await
                .is_err()
            {
                tracing::warn!("Traffic inspector stopped; dropping observed responses");
                break;
            }
        }
        let from_traffic = self.flush(run).await;

        let added = from_html + from_traffic;
        run.report.urls_added += added;
        added
    }

    /// Waits until the inspector has processed everything sent so far
    async fn flush(&self, run: &Run) -> usize {
        let (reply, ack) = oneshot::channel();
        if run.traffic.send(InspectorMessage::Flush(reply)).await.is_err() {
            return 0;
        }
        ack.await.unwrap_or(0)
    }
}
