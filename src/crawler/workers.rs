//! Detail worker pool
//!
//! A fixed number of Tokio tasks drain the frontier concurrently. Each
//! worker loops claim -> fetch -> extract -> normalize -> mark done/failed
//! until the frontier is closed and empty. A single URL's failure is recorded
//! against that URL and never stops the other workers.

use crate::browser::Browser;
use crate::crawler::candidates::SharedCandidates;
use crate::crawler::{FetchExecutor, Frontier};
use crate::extract::extract_course;
use crate::record::CourseRecord;
use crate::state::UrlEntry;
use crate::url::SiteProfile;
use crate::RippleError;
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::task::JoinSet;
use url::Url;

/// Everything a worker needs, shared by all workers
#[derive(Clone)]
struct WorkerContext {
    browser: Arc<dyn Browser>,
    executor: Arc<FetchExecutor>,
    frontier: Arc<Frontier>,
    candidates: SharedCandidates,
    site: Arc<SiteProfile>,
    completed: Arc<AtomicUsize>,
    failed: Arc<AtomicUsize>,
}

/// What one worker produced
#[derive(Debug, Default)]
struct WorkerOutput {
    records: Vec<CourseRecord>,
    api_documents: usize,
}

/// Results of the whole pool
#[derive(Debug, Default)]
pub struct PoolReport {
    /// Records of every URL marked Done
    pub records: Vec<CourseRecord>,

    /// URLs processed, successful or not
    pub processed: usize,

    /// URLs marked Failed
    pub failed: usize,

    /// Detail pages for which the API source returned a document
    pub api_documents: usize,
}

/// Fixed-size pool of detail workers
pub struct DetailWorkerPool {
    concurrency: usize,
    context: WorkerContext,
}

/// Running pool; join it once the frontier has been closed
pub struct PoolHandle {
    tasks: JoinSet<WorkerOutput>,
    context: WorkerContext,
}

impl DetailWorkerPool {
    pub fn new(
        concurrency: usize,
        browser: Arc<dyn Browser>,
        executor: Arc<FetchExecutor>,
        frontier: Arc<Frontier>,
        candidates: SharedCandidates,
        site: Arc<SiteProfile>,
    ) -> Self {
        Self {
            concurrency: concurrency.max(1),
            context: WorkerContext {
                browser,
                executor,
                frontier,
                candidates,
                site,
                completed: Arc::new(AtomicUsize::new(0)),
                failed: Arc::new(AtomicUsize::new(0)),
            },
        }
    }

    /// Starts the workers
    ///
    /// They wait on the frontier for work, so the pool can be started before
    /// discovery has found anything.
    pub fn spawn(&self) -> PoolHandle {
        let mut tasks = JoinSet::new();
        for id in 0..self.concurrency {
            let context = self.context.clone();
            tasks.spawn(async move { worker_loop(id, context).await });
        }
        tracing::info!("Started {} detail workers", self.concurrency);

        PoolHandle {
            tasks,
            context: self.context.clone(),
        }
    }
}

impl PoolHandle {
    /// Waits for every worker to finish
    ///
    /// Returns once the frontier has been closed and fully drained.
    pub async fn join(mut self) -> Result<PoolReport, RippleError> {
        let mut report = PoolReport::default();

        while let Some(result) = self.tasks.join_next().await {
            let output = result.map_err(|e| RippleError::Worker(e.to_string()))?;
            report.records.extend(output.records);
            report.api_documents += output.api_documents;
        }

        report.processed = self.context.completed.load(Ordering::Relaxed);
        report.failed = self.context.failed.load(Ordering::Relaxed);
        Ok(report)
    }
}

async fn worker_loop(id: usize, context: WorkerContext) -> WorkerOutput {
    let mut output = WorkerOutput::default();

    while let Some(entry) = context.frontier.claim().await {
        tracing::debug!("Worker {} claimed {}", id, entry.url);

        match process(&context, &entry, &mut output).await {
            Ok(record) => match context.frontier.mark_done(&entry.url) {
                Ok(()) => output.records.push(record),
                Err(e) => tracing::error!("Worker {}: {}", id, e),
            },
            Err(reason) => {
                context.failed.fetch_add(1, Ordering::Relaxed);
                tracing::warn!("Failed {}: {}", entry.url, reason);
                if let Err(e) = context.frontier.mark_failed(&entry.url, reason) {
                    tracing::error!("Worker {}: {}", id, e);
                }
            }
        }

        let completed = context.completed.fetch_add(1, Ordering::Relaxed) + 1;
        if completed % 10 == 0 {
            let counts = context.frontier.counts();
            tracing::info!(
                "Progress: {} detail pages processed ({} done, {} failed, {} pending)",
                completed,
                counts.done,
                counts.failed,
                counts.discovered + counts.queued
            );
        }
    }

    tracing::debug!("Worker {} finished", id);
    output
}

/// Fetches and extracts one detail page
///
/// The error is the reason recorded on the frontier entry.
async fn process(
    context: &WorkerContext,
    entry: &UrlEntry,
    output: &mut WorkerOutput,
) -> Result<CourseRecord, String> {
    let url = Url::parse(&entry.url).map_err(|e| format!("invalid URL: {}", e))?;

    let snapshot = context
        .executor
        .execute(&format!("detail {}", url), || context.browser.navigate(&url))
        .await
        .map_err(|e| e.to_string())?;

    let api_document = api_document(context, &url).await;
    if api_document.is_some() {
        output.api_documents += 1;
    }

    extract_course(&url, &snapshot.html, api_document.as_ref()).map_err(|e| e.to_string())
}

/// Fetches the detail API document for a page, if an endpoint is known
///
/// Failures are logged and yield `None`; the page is still extracted from
/// its JSON-LD and DOM.
async fn api_document(context: &WorkerContext, url: &Url) -> Option<Value> {
    let candidate = context.candidates.read().await.best_detail().cloned()?;
    let slug = context.site.course_slug(url)?;
    let endpoint = candidate.endpoint_for(&slug)?;

    match context
        .executor
        .execute(&format!("detail API {}", endpoint), || {
            context.browser.fetch_json(&endpoint)
        })
        .await
    {
        Ok(document) => Some(document),
        Err(e) => {
            tracing::warn!("Detail API for {} unavailable: {}", url, e);
            None
        }
    }
}
