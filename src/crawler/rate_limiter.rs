//! Token bucket rate limiter shared by every outbound request
//!
//! Refill is lazy: the bucket is topped up from the elapsed time whenever a
//! caller asks for a token. The internal lock is a `tokio::sync::Mutex`, which
//! hands the lock out in FIFO order, and it is held while a caller sleeps for
//! its token so later callers queue behind it instead of racing.

use crate::ConfigError;
use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};

/// Shortest sleep taken while waiting for a token
const MIN_WAIT: Duration = Duration::from_millis(1);

#[derive(Debug)]
struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

impl BucketState {
    fn refill(&mut self, capacity: f64, rate: f64) {
        let now = Instant::now();
        let elapsed = now.saturating_duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * rate).min(capacity);
        self.last_refill = now;
    }
}

/// Global token bucket
///
/// At any observation point `0 <= tokens <= capacity`, and over any window
/// of length `W` at most `capacity + rate * W` callers get through.
#[derive(Debug)]
pub struct RateLimiter {
    capacity: f64,
    rate: f64,
    state: Mutex<BucketState>,
}

impl RateLimiter {
    /// Creates a full bucket
    ///
    /// # Arguments
    ///
    /// * `capacity` - Maximum number of tokens (burst size), at least 1
    /// * `rate` - Refill rate in tokens per second, finite and positive
    ///
    /// # Returns
    ///
    /// * `Ok(RateLimiter)` - A bucket holding `capacity` tokens
    /// * `Err(ConfigError)` - The capacity or rate is unusable
    pub fn new(capacity: u32, rate: f64) -> Result<Self, ConfigError> {
        if capacity < 1 {
            return Err(ConfigError::Validation(
                "rate limiter capacity must be at least 1".to_string(),
            ));
        }
        if !rate.is_finite() || rate <= 0.0 {
            return Err(ConfigError::Validation(format!(
                "rate limiter rate must be a positive number, got {}",
                rate
            )));
        }

        let capacity = f64::from(capacity);
        Ok(Self {
            capacity,
            rate,
            state: Mutex::new(BucketState {
                tokens: capacity,
                last_refill: Instant::now(),
            }),
        })
    }

    /// Waits until a token is available and debits it
    pub async fn acquire(&self) {
        let mut state = self.state.lock().await;
        loop {
            state.refill(self.capacity, self.rate);
            if state.tokens >= 1.0 {
                state.tokens -= 1.0;
                return;
            }

            let wait = Duration::from_secs_f64((1.0 - state.tokens) / self.rate).max(MIN_WAIT);
            tracing::trace!("Rate limiter empty, waiting {:?}", wait);
            tokio::time::sleep(wait).await;
        }
    }

    /// Current token count after a refill
    pub async fn available(&self) -> f64 {
        let mut state = self.state.lock().await;
        state.refill(self.capacity, self.rate);
        state.tokens
    }

    /// Bucket capacity
    pub fn capacity(&self) -> f64 {
        self.capacity
    }

    /// Refill rate in tokens per second
    pub fn rate(&self) -> f64 {
        self.rate
    }
}
