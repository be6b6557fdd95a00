//! The privileged channel seam.
//!
//! A `Channel` is the only primitive the bridge needs from the process that
//! hosts it: one request/response round trip per call, plus a listener table
//! for push events. Implementations decide how bytes actually cross the
//! boundary (in-process, pipe, socket).

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use lumen_core::error::Result;

/// Identity of one registered listener, allocated by the channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl ListenerId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener#{}", self.0)
    }
}

/// Push event as delivered by the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct IpcEvent {
    pub channel: String,
    pub payload: Value,
}

/// Raw listener callback.
pub type Listener = Arc<dyn Fn(&IpcEvent) + Send + Sync>;

#[async_trait]
pub trait Channel: Send + Sync {
    /// One round trip. Failures of the transport itself surface as
    /// `BridgeError::Ipc` tagged with `channel`.
    async fn invoke(&self, channel: &str, payload: Value) -> Result<Value>;

    fn listen(&self, channel: &str, listener: Listener) -> ListenerId;

    /// Remove exactly one listener. Returns whether it was registered.
    fn unlisten(&self, channel: &str, id: ListenerId) -> bool;

    /// Remove every listener on `channel`. Returns how many were removed.
    fn unlisten_all(&self, channel: &str) -> usize;

    fn listener_count(&self, channel: &str) -> usize;
}
