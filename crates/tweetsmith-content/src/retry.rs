//! Retry with exponential back-off and jitter for provider calls.
//!
//! [`retry_with_backoff`] wraps any fallible async operation and retries on
//! transient errors: timeouts, connection failures, HTTP 429 and 5xx.
//! Everything else is returned immediately.

use std::future::Future;
use std::time::Duration;

use crate::error::{ContentError, ImageError};

/// Errors that may succeed when the same request is sent again.
pub(crate) trait Transient {
    fn is_transient(&self) -> bool;
}

fn is_transient_http(e: &reqwest::Error) -> bool {
    e.is_timeout()
        || e.is_connect()
        || e.status().is_some_and(|s| {
            s.is_server_error() || s == reqwest::StatusCode::TOO_MANY_REQUESTS
        })
}

impl Transient for ContentError {
    fn is_transient(&self) -> bool {
        match self {
            ContentError::Http(e) => is_transient_http(e),
            ContentError::Deserialize { .. }
            | ContentError::EmptyResponse(_)
            | ContentError::InvalidConfig(_) => false,
        }
    }
}

impl Transient for ImageError {
    fn is_transient(&self) -> bool {
        match self {
            ImageError::Http(e) => is_transient_http(e),
            ImageError::Deserialize { .. }
            | ImageError::MissingUrl
            | ImageError::Io { .. }
            | ImageError::Encode(_)
            | ImageError::Font(_) => false,
        }
    }
}

/// Retry policy shared by the HTTP clients in this crate.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff_base_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            backoff_base_ms: 1_000,
        }
    }
}

/// Runs `operation` with up to `max_retries` additional attempts on transient errors.
///
/// The delay before retry *n* is `backoff_base_ms × 2ⁿ⁻¹` with ±25 % jitter,
/// capped at 60 s.
pub(crate) async fn retry_with_backoff<T, E, F, Fut>(
    policy: RetryPolicy,
    what: &str,
    mut operation: F,
) -> Result<T, E>
where
    E: Transient + std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    const MAX_DELAY_MS: u64 = 60_000;
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !err.is_transient() || attempt >= policy.max_retries {
                    return Err(err);
                }
                attempt += 1;
                let computed = policy
                    .backoff_base_ms
                    .saturating_mul(1u64 << (attempt - 1).min(10));
                let capped = computed.min(MAX_DELAY_MS);
                #[allow(
                    clippy::cast_possible_truncation,
                    clippy::cast_sign_loss,
                    clippy::cast_precision_loss
                )]
                let delay_ms = (capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
                tracing::warn!(
                    what,
                    attempt,
                    max_retries = policy.max_retries,
                    delay_ms,
                    error = %err,
                    "transient provider error; retrying after back-off"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}
