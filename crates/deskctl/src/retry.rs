//! Bounded retry with single-flight and per-attempt timeouts.
//!
//! Retry counts are small (two by default), so backoff is linear
//! rather than exponential. The single-flight guard rejects a second
//! call while one is pending instead of queueing it — overlapping page
//! fetches would race each other into the accumulated list state.

use desk_common::config::RetryConfig;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Fetch failure classification
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("Request timed out")]
    Timeout,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Server returned status {0}")]
    Status(u16),

    #[error("A request is already in progress")]
    AlreadyInFlight,

    #[error("Request failed after {attempts} attempts: {message}")]
    Exhausted { attempts: u32, message: String },
}

impl FetchError {
    /// Timeouts, network failures, and 5xx responses are transient;
    /// 4xx means the request itself is wrong and a retry would repeat it.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Timeout | Self::Network(_) | Self::Status(500..=599)
        )
    }

    /// User-presentable message; the raw error goes to the log instead.
    fn sanitized(&self) -> String {
        match self {
            Self::Timeout => "the server took too long to respond".to_string(),
            Self::Network(_) => "could not reach the server".to_string(),
            Self::Status(code) => format!("the server answered with status {code}"),
            other => other.to_string(),
        }
    }
}

/// Retry budget and timing
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub retry_delay: Duration,
    pub timeout: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            retry_delay: Duration::from_millis(config.retry_delay_ms),
            timeout: Duration::from_millis(config.timeout_ms),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

/// At-most-one-in-flight guard.
///
/// The flag is released by an RAII guard so every exit path — success,
/// short-circuit, exhaustion, panic unwind — clears it.
#[derive(Debug, Default)]
pub struct SingleFlight {
    in_flight: AtomicBool,
}

impl SingleFlight {
    pub fn new() -> Self {
        Self::default()
    }

    fn acquire(&self) -> Result<FlightGuard<'_>, FetchError> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(FetchError::AlreadyInFlight);
        }
        Ok(FlightGuard {
            flag: &self.in_flight,
        })
    }
}

struct FlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Run `op` with retries. Delegates to [`fetch_with_retry_observed`]
/// with a no-op retry observer.
pub async fn fetch_with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    flight: &SingleFlight,
    op: F,
) -> Result<T, FetchError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
{
    fetch_with_retry_observed(policy, flight, |_, _| {}, op).await
}

/// Run `op(attempt)` under the single-flight guard, retrying transient
/// failures up to the policy budget with linear backoff. Each attempt
/// is bounded by `policy.timeout`; a timed-out attempt counts toward
/// the budget. `on_retry` fires before each re-attempt sleep.
pub async fn fetch_with_retry_observed<T, F, Fut, O>(
    policy: &RetryPolicy,
    flight: &SingleFlight,
    mut on_retry: O,
    mut op: F,
) -> Result<T, FetchError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
    O: FnMut(u32, &FetchError),
{
    let _guard = flight.acquire()?;

    let mut last_error: Option<FetchError> = None;

    for attempt in 0..=policy.max_retries {
        if attempt > 0 {
            let error = last_error.as_ref().expect("retry without a prior failure");
            on_retry(attempt, error);
            // Linear backoff: delay * attempt number
            let delay = policy.retry_delay * attempt;
            debug!("Retrying in {delay:?} (attempt {} of {})", attempt + 1, policy.max_retries + 1);
            tokio::time::sleep(delay).await;
        }

        match tokio::time::timeout(policy.timeout, op(attempt)).await {
            Ok(Ok(value)) => return Ok(value),
            Ok(Err(error)) if error.is_retryable() => {
                warn!("Attempt {} failed: {error}", attempt + 1);
                last_error = Some(error);
            }
            Ok(Err(error)) => return Err(error),
            Err(_) => {
                warn!("Attempt {} timed out after {:?}", attempt + 1, policy.timeout);
                last_error = Some(FetchError::Timeout);
            }
        }
    }

    let raw = last_error.expect("exhausted without recording a failure");
    warn!("Retry budget exhausted: {raw}");
    Err(FetchError::Exhausted {
        attempts: policy.max_retries + 1,
        message: raw.sanitized(),
    })
}
