//! Retry utilities for HTTP operations with exponential backoff.
//!
//! Retries transient failures (timeouts, connection errors, 5xx, 408, 429).
//! 4xx client errors are returned immediately.

use std::future::Future;
use std::time::Duration;

use lemon_core::RetrySettings;
use reqwest::{Response, StatusCode};

#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts
    pub max_retries: u32,
    /// Initial delay between retries (doubles each attempt)
    pub initial_delay: Duration,
    /// Maximum delay between retries
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::from(&RetrySettings::default())
    }
}

impl From<&RetrySettings> for RetryConfig {
    fn from(settings: &RetrySettings) -> Self {
        Self::new(
            settings.max_retries,
            settings.initial_delay_ms,
            settings.max_delay_ms,
        )
    }
}

impl RetryConfig {
    pub fn new(max_retries: u32, initial_delay_ms: u64, max_delay_ms: u64) -> Self {
        Self {
            max_retries,
            initial_delay: Duration::from_millis(initial_delay_ms),
            max_delay: Duration::from_millis(max_delay_ms),
        }
    }

    /// No retries at all
    pub fn none() -> Self {
        Self::new(0, 0, 0)
    }

    /// Calculate the delay for a given attempt number
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        // Exponential backoff: initial_delay * 2^attempt
        let factor = 2u64.saturating_pow(attempt);
        let delay_ms = (self.initial_delay.as_millis() as u64).saturating_mul(factor);
        let capped = delay_ms.min(self.max_delay.as_millis() as u64);
        Duration::from_millis(capped)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    Retry,
    NoRetry,
}

pub fn is_retryable_error(error: &reqwest::Error) -> RetryDecision {
    if error.is_timeout() || error.is_connect() {
        return RetryDecision::Retry;
    }

    if error.is_request() {
        return RetryDecision::NoRetry;
    }

    match error.status() {
        Some(status) => is_retryable_status(status),
        None => RetryDecision::NoRetry,
    }
}

pub fn is_retryable_status(status: StatusCode) -> RetryDecision {
    if status.is_server_error()
        || status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::REQUEST_TIMEOUT
    {
        tracing::debug!("Status {} is retryable", status);
        return RetryDecision::Retry;
    }

    RetryDecision::NoRetry
}

/// Execute an HTTP request with retry logic.
///
/// Returns the first non-retryable response, or the last response/error once
/// all attempts are used.
pub async fn with_retry<F, Fut>(config: &RetryConfig, operation: F) -> Result<Response, reqwest::Error>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<Response, reqwest::Error>>,
{
    let mut attempt = 0;

    loop {
        let exhausted = attempt >= config.max_retries;

        match operation().await {
            Ok(response) => {
                let status = response.status();
                if exhausted || is_retryable_status(status) == RetryDecision::NoRetry {
                    if attempt > 0 {
                        tracing::info!("Request finished with {} after {} retries", status, attempt);
                    }
                    return Ok(response);
                }
                tracing::warn!(
                    "Request returned retryable status {}, attempt {} of {}",
                    status,
                    attempt + 1,
                    config.max_retries + 1
                );
            }
            Err(e) => {
                if exhausted || is_retryable_error(&e) == RetryDecision::NoRetry {
                    return Err(e);
                }
                tracing::warn!(
                    "Retryable error on attempt {} of {}: {}",
                    attempt + 1,
                    config.max_retries + 1,
                    e
                );
            }
        }

        let delay = config.delay_for_attempt(attempt);
        attempt += 1;
        tokio::time::sleep(delay).await;
    }
}
