//! Channel invoker: exactly one round trip per call, never retries.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio_util::sync::CancellationToken;

use lumen_core::error::{BridgeError, Result};

use crate::transport::Channel;

/// Bound on one round trip.
///
/// The wait lasts `timeout_ms + grace_ms` so the remote side can report its
/// own timeout first; errors report `timeout_ms`, the value the caller asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline {
    pub timeout_ms: u64,
    pub grace_ms: u64,
}

impl Deadline {
    pub fn new(timeout_ms: u64, grace_ms: u64) -> Self {
        Self {
            timeout_ms,
            grace_ms,
        }
    }

    pub fn limit(&self) -> Duration {
        Duration::from_millis(self.timeout_ms.saturating_add(self.grace_ms))
    }
}

#[derive(Clone)]
pub struct Invoker {
    transport: Arc<dyn Channel>,
}

impl Invoker {
    pub fn new(transport: Arc<dyn Channel>) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &Arc<dyn Channel> {
        &self.transport
    }

    /// Send `payload` on `channel` and wait for the raw reply.
    ///
    /// With a `deadline` the wait is bounded and a lapse becomes a retryable
    /// `Timeout`; without it the transport's own default applies. A fired
    /// `cancel` token stops the call before dispatch but never interrupts a
    /// dispatched one.
    pub async fn invoke(
        &self,
        channel: &str,
        payload: Value,
        deadline: Option<Deadline>,
        cancel: &CancellationToken,
    ) -> Result<Value> {
        if cancel.is_cancelled() {
            return Err(BridgeError::cancelled(channel));
        }

        tracing::debug!(channel, timeout_ms = deadline.map(|d| d.timeout_ms), "invoke");

        let call = self.transport.invoke(channel, payload);
        match deadline {
            Some(d) => tokio::time::timeout(d.limit(), call)
                .await
                .map_err(|_| BridgeError::Timeout {
                    channel: channel.to_owned(),
                    timeout_ms: d.timeout_ms,
                })?,
            None => call.await,
        }
    }
}
