//! Rate-limit retries around any grid store
//!
//! Only [`SheetfillError::QuotaExceeded`] is retried; every other error is
//! returned immediately.

use super::traits::{GridRequest, GridStore, SheetMetadata, ValueInputMode, ValueRange};
use crate::config::RetryConfig;
use crate::domain::{DocumentId, Result, SheetName};
use async_trait::async_trait;
use rand::Rng;
use std::future::Future;
use std::time::Duration;

/// Capped exponential backoff with optional full jitter
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_retries: usize,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: f64,
    pub jitter: bool,
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (1-based)
    ///
    /// Without jitter this is `initial * multiplier^(attempt-1)` capped at
    /// `max_delay`; with jitter a uniform value in `[0, that]`.
    pub fn delay_for(&self, attempt: usize) -> Duration {
        let exponent = attempt.saturating_sub(1).min(63) as i32;
        let base_ms = self.initial_delay.as_millis() as f64 * self.multiplier.powi(exponent);
        let capped_ms = base_ms.min(self.max_delay.as_millis() as f64).max(0.0) as u64;

        if self.jitter && capped_ms > 0 {
            Duration::from_millis(rand::thread_rng().gen_range(0..=capped_ms))
        } else {
            Duration::from_millis(capped_ms)
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            initial_delay: Duration::from_millis(config.initial_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
            multiplier: config.backoff_multiplier,
            jitter: config.jitter,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

/// Runs `operation` until it succeeds, fails with a non-retryable error, or
/// the retry budget is spent
pub async fn retry_on_quota<F, T, Fut>(policy: &RetryPolicy, label: &str, operation: F) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0;

    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) if e.is_retryable() && attempt < policy.max_retries => {
                attempt += 1;
                let delay = policy.delay_for(attempt);
                crate::log_retry_attempt!(
                    attempt,
                    policy.max_retries,
                    delay.as_millis() as u64,
                    format!("{label}: {e}")
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Decorator adding quota retries to every call of the wrapped store
pub struct RetryingGridStore<S> {
    inner: S,
    policy: RetryPolicy,
}

impl<S: GridStore> RetryingGridStore<S> {
    pub fn new(inner: S, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }
}

#[async_trait]
impl<S: GridStore> GridStore for RetryingGridStore<S> {
    async fn sheet_metadata(
        &self,
        document: &DocumentId,
        sheet: Option<&SheetName>,
    ) -> Result<SheetMetadata> {
        retry_on_quota(&self.policy, "sheet_metadata", || {
            self.inner.sheet_metadata(document, sheet)
        })
        .await
    }

    async fn get_values(&self, document: &DocumentId, range: &str) -> Result<Vec<Vec<String>>> {
        retry_on_quota(&self.policy, "get_values", || {
            self.inner.get_values(document, range)
        })
        .await
    }

    async fn batch_update_values(
        &self,
        document: &DocumentId,
        updates: &[ValueRange],
        mode: ValueInputMode,
    ) -> Result<usize> {
        retry_on_quota(&self.policy, "batch_update_values", || {
            self.inner.batch_update_values(document, updates, mode)
        })
        .await
    }

    async fn batch_update(&self, document: &DocumentId, requests: &[GridRequest]) -> Result<()> {
        retry_on_quota(&self.policy, "batch_update", || {
            self.inner.batch_update(document, requests)
        })
        .await
    }
}
