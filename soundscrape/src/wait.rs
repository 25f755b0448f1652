//! Polling helpers and randomized pacing.

use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// Poll `check` every `interval` until it returns true or `total`
/// elapses. Returns whether the condition was met.
pub async fn poll_until<F, Fut>(total: Duration, interval: Duration, mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = Instant::now() + total;

    loop {
        if check().await {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(interval).await;
    }
}

/// Poll `check` every `interval` until it yields a value or `total`
/// elapses.
pub async fn poll_for<T, F, Fut>(total: Duration, interval: Duration, mut check: F) -> Option<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Option<T>>,
{
    let deadline = Instant::now() + total;

    loop {
        if let Some(value) = check().await {
            return Some(value);
        }
        if Instant::now() >= deadline {
            return None;
        }
        tokio::time::sleep(interval).await;
    }
}

/// A randomized delay window in milliseconds. Human-ish pacing between
/// page interactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    /// Minimum delay in milliseconds.
    pub min_ms: u64,
    /// Maximum delay in milliseconds.
    pub max_ms: u64,
}

impl Pacing {
    /// Create a pacing window. The bounds are normalized so min <= max.
    pub fn new(min_ms: u64, max_ms: u64) -> Self {
        Self {
            min_ms: min_ms.min(max_ms),
            max_ms: min_ms.max(max_ms),
        }
    }

    /// A pacing window that never pauses.
    pub fn none() -> Self {
        Self { min_ms: 0, max_ms: 0 }
    }

    /// Sleep for a uniformly random duration within the window.
    pub async fn pause(&self) {
        if self.max_ms == 0 {
            return;
        }
        let ms = rand::rng().random_range(self.min_ms..=self.max_ms);
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
}
