//! Fetch executor: rate limiting plus retry for every network operation
//!
//! This module handles:
//! - Debiting one rate limiter token before every attempt, retries included
//! - Retrying transient failures with capped exponential backoff and jitter
//! - Failing fast on permanent errors
//! - Counting attempts and retries for the run summary

use crate::config::RetryConfig;
use crate::crawler::RateLimiter;
use crate::FetchError;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Retry policy applied by the executor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, first attempt included
    pub max_attempts: u32,

    /// Backoff after the first failed attempt
    pub base_delay: Duration,

    /// Upper bound on any single backoff
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// Builds the policy from the `[retry]` config section
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay: Duration::from_millis(config.base_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
        }
    }

    /// Deterministic part of the backoff after the given failed attempt
    ///
    /// `base_delay * 2^(attempt-1)`, capped at `max_delay`.
    pub fn capped_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        self.base_delay
            .checked_mul(1u32 << exponent)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    /// Backoff to sleep after the given failed attempt
    ///
    /// Half of the capped delay is fixed and the other half is random, so the
    /// result always lies in `[capped / 2, capped]`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let capped = self.capped_delay(attempt).as_millis() as u64;
        let half = capped / 2;
        Duration::from_millis(capped - half + fastrand::u64(0..=half))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

/// Request counters reported in the run summary
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecutorStats {
    /// Attempts made, retries included
    pub requests: u64,

    /// Attempts that were retries of a failed attempt
    pub retries: u64,

    /// Operations that failed after their last attempt
    pub failures: u64,
}

/// Wraps network operations with rate limiting and retries
#[derive(Debug)]
pub struct FetchExecutor {
    limiter: Arc<RateLimiter>,
    policy: RetryPolicy,
    requests: AtomicU64,
    retries: AtomicU64,
    failures: AtomicU64,
}

impl FetchExecutor {
    /// Creates an executor sharing the given limiter
    pub fn new(limiter: Arc<RateLimiter>, policy: RetryPolicy) -> Self {
        Self {
            limiter,
            policy,
            requests: AtomicU64::new(0),
            retries: AtomicU64::new(0),
            failures: AtomicU64::new(0),
        }
    }

    /// Runs `operation` until it succeeds, fails permanently, or runs out of attempts
    ///
    /// # Arguments
    ///
    /// * `label` - Short description used in log lines
    /// * `operation` - Produces one attempt; called again for each retry
    ///
    /// # Returns
    ///
    /// * `Ok(T)` - The first successful attempt's value
    /// * `Err(FetchError)` - The permanent error, or the last transient one
    pub async fn execute<T, F, Fut>(&self, label: &str, mut operation: F) -> Result<T, FetchError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, FetchError>>,
    {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            self.limiter.acquire().await;
            self.requests.fetch_add(1, Ordering::Relaxed);

            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt < self.policy.max_attempts => {
                    let delay = self.policy.backoff(attempt);
                    self.retries.fetch_add(1, Ordering::Relaxed);
                    tracing::debug!(
                        "{} failed (attempt {}/{}): {}; retrying in {:?}",
                        label,
                        attempt,
                        self.policy.max_attempts,
                        e,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    self.failures.fetch_add(1, Ordering::Relaxed);
                    if e.is_transient() {
                        tracing::warn!("{} gave up after {} attempts: {}", label, attempt, e);
                    } else {
                        tracing::debug!("{} failed permanently: {}", label, e);
                    }
                    return Err(e);
                }
            }
        }
    }

    /// Snapshot of the request counters
    pub fn stats(&self) -> ExecutorStats {
        ExecutorStats {
            requests: self.requests.load(Ordering::Relaxed),
            retries: self.retries.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
        }
    }

    /// The policy this executor applies
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }
}
