//! Retry coordinator.
//!
//! Attempts are strictly sequential: the next one starts only after the
//! previous attempt settled and its backoff elapsed. Only errors tagged
//! retryable at their origin are retried.

use std::future::Future;
use std::time::Duration;

use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use lumen_core::error::{BridgeError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetryPolicy {
    #[serde(default = "default_attempts")]
    pub attempts: u32,
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: default_attempts(),
            base_delay_ms: default_base_delay_ms(),
        }
    }
}

fn default_attempts() -> u32 {
    3
}
fn default_base_delay_ms() -> u64 {
    150
}

impl RetryPolicy {
    pub fn new(attempts: u32, base_delay_ms: u64) -> Self {
        Self {
            attempts: attempts.max(1),
            base_delay_ms,
        }
    }

    /// Single attempt, no backoff.
    pub fn once() -> Self {
        Self::new(1, 0)
    }

    /// Wait inserted after failed attempt `failed` (1-based): `base * 2^(failed-1)`.
    pub fn delay_after(&self, failed: u32) -> Duration {
        let factor = 1u64
            .checked_shl(failed.saturating_sub(1))
            .unwrap_or(u64::MAX);
        Duration::from_millis(self.base_delay_ms.saturating_mul(factor))
    }
}

/// Run `op` until it succeeds, fails terminally, or the attempts run out.
///
/// `channel` tags logs and the `Cancelled` error. Cancellation is observed
/// before every attempt and during backoff; an attempt already in flight is
/// left to settle.
pub async fn with_retry<T, F, Fut>(
    policy: RetryPolicy,
    channel: &str,
    cancel: &CancellationToken,
    mut op: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let attempts = policy.attempts.max(1);
    let mut attempt = 1;

    loop {
        if cancel.is_cancelled() {
            return Err(BridgeError::cancelled(channel));
        }

        let err = match op().await {
            Ok(v) => return Ok(v),
            Err(e) => e,
        };

        if !err.is_retryable() {
            tracing::debug!(channel, attempt, error = %err, "terminal failure, not retrying");
            return Err(err);
        }
        if attempt >= attempts {
            tracing::warn!(channel, attempts, error = %err, "retries exhausted");
            return Err(err);
        }

        let delay = policy.delay_after(attempt);
        tracing::warn!(
            channel,
            attempt,
            delay_ms = delay.as_millis() as u64,
            error = %err,
            "attempt failed, backing off"
        );

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(BridgeError::cancelled(channel)),
            _ = tokio::time::sleep(delay) => {}
        }
        attempt += 1;
    }
}
