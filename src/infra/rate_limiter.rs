use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, Semaphore};
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::app::ports::{RateLimiterPort, RatePermit};
use crate::config::HttpConfig;

#[derive(Clone, Debug, Default)]
pub struct Limits {
    pub requests_per_min: Option<u32>,
    pub concurrency: Option<usize>,
}

impl From<&HttpConfig> for Limits {
    fn from(http: &HttpConfig) -> Self {
        Self {
            requests_per_min: (http.requests_per_min > 0).then_some(http.requests_per_min),
            concurrency: (http.concurrency > 0).then_some(http.concurrency),
        }
    }
}

/// Per-provider request limiter: a requests-per-minute token bucket plus an
/// optional cap on in-flight requests.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    limits: Limits,
    // (tokens, last refill)
    rpm_tokens: Mutex<(f64, Instant)>,
    sem: Option<Arc<Semaphore>>,
}

impl RateLimiter {
    pub fn new(limits: Limits) -> Self {
        let capacity = limits.requests_per_min.unwrap_or(0) as f64;
        let sem = limits.concurrency.map(|c| Arc::new(Semaphore::new(c.max(1))));
        Self {
            inner: Arc::new(Inner {
                limits,
                rpm_tokens: Mutex::new((capacity, Instant::now())),
                sem,
            }),
        }
    }

    /// Wait for a concurrency slot and a request token. The slot is held
    /// until the returned permit is dropped.
    pub async fn acquire(&self) -> RatePermit {
        let permit = match &self.inner.sem {
            Some(sem) => match sem.clone().acquire_owned().await {
                Ok(permit) => Some(permit),
                Err(_) => {
                    warn!("Rate limiter semaphore closed, continuing without a slot");
                    None
                }
            },
            None => None,
        };

        if let Some(rpm) = self.inner.limits.requests_per_min {
            if rpm > 0 {
                self.consume_token(rpm as f64).await;
            }
        }

        permit
    }

    async fn consume_token(&self, capacity: f64) {
        let refill_rate = capacity / 60.0;
        loop {
            let mut guard = self.inner.rpm_tokens.lock().await;
            let (ref mut tokens, ref mut last) = *guard;
            let now = Instant::now();
            let elapsed = now.duration_since(*last).as_secs_f64();
            *tokens = (*tokens + elapsed * refill_rate).min(capacity);
            *last = now;
            if *tokens >= 1.0 {
                *tokens -= 1.0;
                break;
            }
            let wait = (1.0 - *tokens) / refill_rate;
            drop(guard);
            debug!(wait_secs = wait, "Rate limited, waiting for token");
            tokio::time::sleep(Duration::from_secs_f64(wait.max(0.001))).await;
        }
    }
}

#[async_trait]
impl RateLimiterPort for RateLimiter {
    async fn acquire(&self) -> RatePermit {
        RateLimiter::acquire(self).await
    }
}
