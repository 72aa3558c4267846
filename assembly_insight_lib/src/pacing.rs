//! Request pacing for upstream fetches.
//!
//! Upstream sources get a fixed minimum gap between consecutive calls. A
//! rate-limit response is never retried: it is recorded and handed back so
//! the caller can abort the rest of the run. Each pacer counts the outcomes
//! of the calls it paced so the stage can report them.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::Mutex;
use tokio::time::{sleep_until, Instant};

use crate::error::FetchError;

/// Enforces a minimum interval between consecutive calls.
///
/// The instant of the last call sits behind a tokio Mutex; `acquire()` sleeps
/// until the interval since that call has elapsed, then records the new call.
pub struct Pacer {
    last_call: Mutex<Option<Instant>>,
    min_interval: Duration,
    counter: RequestCounter,
}

impl Pacer {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            last_call: Mutex::new(None),
            min_interval,
            counter: RequestCounter::default(),
        }
    }

    pub async fn acquire(&self) {
        let mut last = self.last_call.lock().await;
        if let Some(previous) = *last {
            let ready_at = previous + self.min_interval;
            if ready_at > Instant::now() {
                sleep_until(ready_at).await;
            }
        }
        *last = Some(Instant::now());
    }

    /// Outcome counts of every call made through this pacer so far.
    pub fn counts(&self) -> RequestCounts {
        self.counter.snapshot()
    }
}

#[derive(Default)]
struct RequestCounter {
    made: AtomicU64,
    succeeded: AtomicU64,
    rate_limited: AtomicU64,
    failed: AtomicU64,
}

impl RequestCounter {
    fn record(&self, outcome: &AtomicU64) {
        self.made.fetch_add(1, Ordering::Relaxed);
        outcome.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> RequestCounts {
        RequestCounts {
            made: self.made.load(Ordering::Relaxed),
            succeeded: self.succeeded.load(Ordering::Relaxed),
            rate_limited: self.rate_limited.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

/// Upstream request outcomes of one stage run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RequestCounts {
    pub made: u64,
    pub succeeded: u64,
    pub rate_limited: u64,
    pub failed: u64,
}

/// Run one upstream call after waiting for the pacer, recording its outcome.
pub async fn paced<F, Fut, T>(pacer: &Pacer, operation: F) -> Result<T, FetchError>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
{
    pacer.acquire().await;
    let counter = &pacer.counter;
    let result = operation().await;
    match &result {
        Ok(_) => counter.record(&counter.succeeded),
        Err(e) if e.is_rate_limited() => counter.record(&counter.rate_limited),
        Err(_) => counter.record(&counter.failed),
    }
    result
}
