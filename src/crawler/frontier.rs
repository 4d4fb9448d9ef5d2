//! URL frontier: the deduplicated worklist of course detail pages
//!
//! This module handles:
//! - Canonicalizing and deduplicating discovered URLs
//! - Handing each pending URL to exactly one worker
//! - Enforcing the Discovered -> Queued -> Fetching -> Done|Failed lifecycle
//! - Waking idle workers when new work arrives or discovery finishes
//!
//! Every mutation happens under one lock, so two workers can never claim the
//! same entry and finished entries are never handed out again.

use crate::state::{UrlEntry, UrlState};
use crate::url::canonicalize_url;
use crate::RippleError;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::Notify;

/// Number of entries in each state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrontierCounts {
    pub discovered: usize,
    pub queued: usize,
    pub fetching: usize,
    pub done: usize,
    pub failed: usize,
}

impl FrontierCounts {
    /// Total number of known URLs
    pub fn total(&self) -> usize {
        self.discovered + self.queued + self.fetching + self.done + self.failed
    }

    /// Number of URLs that still need work
    pub fn outstanding(&self) -> usize {
        self.discovered + self.queued + self.fetching
    }
}

#[derive(Debug, Default)]
struct FrontierInner {
    entries: HashMap<String, UrlEntry>,
    pending: VecDeque<String>,
    closed: bool,
}

impl FrontierInner {
    fn claim_next(&mut self) -> Option<UrlEntry> {
        while let Some(key) = self.pending.pop_front() {
            if let Some(entry) = self.entries.get_mut(&key) {
                if entry.state.is_claimable() {
                    entry.state = UrlState::Fetching;
                    entry.attempts += 1;
                    return Some(entry.clone());
                }
            }
        }
        None
    }

    fn transition(
        &mut self,
        url: &str,
        next: UrlState,
        error: Option<String>,
    ) -> Result<(), RippleError> {
        let key = self.resolve_key(url)?;
        let entry = self
            .entries
            .get_mut(&key)
            .ok_or_else(|| RippleError::UnknownUrl(url.to_string()))?;

        if !entry.state.can_transition_to(next) {
            return Err(RippleError::InvalidTransition {
                url: key,
                from: entry.state,
                to: next,
            });
        }

        entry.state = next;
        if error.is_some() {
            entry.last_error = error;
        }
        Ok(())
    }

    fn resolve_key(&self, url: &str) -> Result<String, RippleError> {
        if self.entries.contains_key(url) {
            return Ok(url.to_string());
        }
        let canonical = canonicalize_url(url).map_err(|_| RippleError::UnknownUrl(url.to_string()))?;
        Ok(canonical.to_string())
    }
}

/// Shared frontier of detail-page URLs
///
/// Listing discovery adds to it while detail workers drain it. Once
/// discovery is finished it calls [`Frontier::close`], after which
/// [`Frontier::claim`] returns `None` as soon as nothing is left to claim.
#[derive(Debug, Default)]
pub struct Frontier {
    inner: Mutex<FrontierInner>,
    notify: Notify,
}

impl Frontier {
    /// Creates an empty, open frontier
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, FrontierInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Adds a URL if its canonical form is not known yet
    ///
    /// The entry is created as Discovered and moved to Queued in the same
    /// critical section.
    ///
    /// # Returns
    ///
    /// * `true` - The URL is new and is now queued
    /// * `false` - Already known, not a valid URL, or the frontier is closed
    pub fn add(&self, url: &str) -> bool {
        let canonical = match canonicalize_url(url) {
            Ok(canonical) => canonical,
            Err(e) => {
                tracing::debug!("Ignoring invalid URL {}: {}", url, e);
                return false;
            }
        };
        let key = canonical.to_string();

        {
            let mut inner = self.lock();
            if inner.closed || inner.entries.contains_key(&key) {
                return false;
            }

            let mut entry = UrlEntry::discovered(key.clone());
            if entry.state.can_transition_to(UrlState::Queued) {
                entry.state = UrlState::Queued;
            }
            inner.entries.insert(key.clone(), entry);
            inner.pending.push_back(key);
        }

        self.notify.notify_waiters();
        true
    }

    /// Adds every URL, returning how many were new
    pub fn add_all<I, S>(&self, urls: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        urls.into_iter().filter(|url| self.add(url.as_ref())).count()
    }

    /// Claims the next pending entry without waiting
    ///
    /// The claimed entry is Fetching and its attempt count has been bumped.
    pub fn next_pending(&self) -> Option<UrlEntry> {
        self.lock().claim_next()
    }

    /// Claims the next pending entry, waiting for discovery if necessary
    ///
    /// Returns `None` once the frontier is closed and nothing is claimable.
    pub async fn claim(&self) -> Option<UrlEntry> {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let mut inner = self.lock();
                if let Some(entry) = inner.claim_next() {
                    return Some(entry);
                }
                if inner.closed {
                    return None;
                }
            }

            notified.await;
        }
    }

    /// Marks a Fetching entry as Done
    pub fn mark_done(&self, url: &str) -> Result<(), RippleError> {
        self.lock().transition(url, UrlState::Done, None)
    }

    /// Marks a Fetching entry as Failed, recording the reason
    pub fn mark_failed(&self, url: &str, error: impl Into<String>) -> Result<(), RippleError> {
        self.lock()
            .transition(url, UrlState::Failed, Some(error.into()))
    }

    /// Signals that no more URLs will be added and wakes idle workers
    pub fn close(&self) {
        self.lock().closed = true;
        self.notify.notify_waiters();
    }

    /// Returns true once [`Frontier::close`] has been called
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Returns true if the canonical form of `url` is known
    pub fn contains(&self, url: &str) -> bool {
        let inner = self.lock();
        inner
            .resolve_key(url)
            .map(|key| inner.entries.contains_key(&key))
            .unwrap_or(false)
    }

    /// Looks up an entry by URL
    pub fn get(&self, url: &str) -> Option<UrlEntry> {
        let inner = self.lock();
        let key = inner.resolve_key(url).ok()?;
        inner.entries.get(&key).cloned()
    }

    /// Number of known URLs
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    /// Returns true if no URL is known
    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    /// Per-state entry counts
    pub fn counts(&self) -> FrontierCounts {
        let inner = self.lock();
        let mut counts = FrontierCounts::default();
        for entry in inner.entries.values() {
            match entry.state {
                UrlState::Discovered => counts.discovered += 1,
                UrlState::Queued => counts.queued += 1,
                UrlState::Fetching => counts.fetching += 1,
                UrlState::Done => counts.done += 1,
                UrlState::Failed => counts.failed += 1,
            }
        }
        counts
    }

    /// All entries, sorted by URL
    pub fn snapshot(&self) -> Vec<UrlEntry> {
        let mut entries: Vec<UrlEntry> = self.lock().entries.values().cloned().collect();
        entries.sort_by(|a, b| a.url.cmp(&b.url));
        entries
    }

    /// Failed entries, sorted by URL
    pub fn failed_entries(&self) -> Vec<UrlEntry> {
        self.snapshot()
            .into_iter()
            .filter(|entry| entry.state == UrlState::Failed)
            .collect()
    }
}
