use crate::config::ScrapeConfig;
use crate::error::{Result, ScraperError};
use crate::metrics::ScrapeMetrics;
use async_trait::async_trait;
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// Bounded attempt count plus the wait schedule between attempts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    delays: Vec<u64>,
}

impl RetryPolicy {
    /// `delays` are seconds; past the end of the list the last entry doubles per extra attempt.
    pub fn new(max_attempts: u32, delays: Vec<u64>) -> Result<Self> {
        if max_attempts == 0 {
            return Err(ScraperError::InvalidRetryConfig(
                "max_attempts must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            max_attempts,
            delays,
        })
    }

    pub fn from_config(config: &ScrapeConfig) -> Result<Self> {
        Self::new(config.max_retries, config.retry_delays.clone())
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Seconds to wait after the failed attempt with zero-based index `attempt`.
    pub fn delay_for(&self, attempt: usize) -> u64 {
        if let Some(delay) = self.delays.get(attempt) {
            return *delay;
        }
        match self.delays.last() {
            Some(last) => {
                let overflow = (attempt + 1 - self.delays.len()) as u32;
                last.saturating_mul(2u64.saturating_pow(overflow))
            }
            None => 0,
        }
    }
}

/// Timed waits, injectable so tests do not actually sleep.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Records requested waits and returns immediately.
#[derive(Default)]
pub struct RecordingSleeper {
    slept: tokio::sync::Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn recorded(&self) -> Vec<Duration> {
        self.slept.lock().await.clone()
    }

    pub async fn recorded_secs(&self) -> Vec<u64> {
        self.slept.lock().await.iter().map(|d| d.as_secs()).collect()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.slept.lock().await.push(duration);
    }
}

/// Run `operation` until it succeeds, a non-retryable error occurs, or the
/// policy's attempts are used up.
///
/// Exhaustion returns `RetryExhausted` wrapping the last error unchanged.
/// Non-retryable errors are returned as-is without consuming further attempts.
pub async fn retry_with_backoff<T, F, Fut>(
    policy: &RetryPolicy,
    sleeper: &dyn Sleeper,
    url: &str,
    mut operation: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let max_attempts = policy.max_attempts();
    let mut attempt: u32 = 0;

    loop {
        attempt += 1;
        let started = Instant::now();

        let err = match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    info!(url = %url, attempt, max_attempts, "Succeeded after retry");
                }
                return Ok(value);
            }
            Err(e) => e,
        };

        let duration_secs = started.elapsed().as_secs_f64();
        warn!(
            url = %url,
            attempt,
            max_attempts,
            duration_secs,
            error_type = err.kind(),
            error = %err,
            "Attempt failed"
        );

        if !err.is_retryable() {
            return Err(err);
        }

        if attempt >= max_attempts {
            error!(
                url = %url,
                attempts = attempt,
                error_type = err.kind(),
                "All attempts failed"
            );
            return Err(ScraperError::RetryExhausted {
                url: url.to_string(),
                attempts: attempt,
                source: Box::new(err),
            });
        }

        let delay = policy.delay_for((attempt - 1) as usize);
        info!(
            url = %url,
            retry_delay_secs = delay,
            next_attempt = attempt + 1,
            "Backing off before retry"
        );
        ScrapeMetrics::record_retry();
        sleeper.sleep(Duration::from_secs(delay)).await;
    }
}
