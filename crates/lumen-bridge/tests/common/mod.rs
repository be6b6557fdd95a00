//! Shared test transport: a loopback host that counts traffic.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use lumen_bridge::transport::{Channel, Listener, ListenerId, LoopbackHost};
use lumen_core::Result;

#[derive(Default)]
pub struct CountingChannel {
    pub host: LoopbackHost,
    invokes: AtomicUsize,
    removals: AtomicUsize,
}

impl CountingChannel {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn invokes(&self) -> usize {
        self.invokes.load(Ordering::SeqCst)
    }

    /// Number of `unlisten` calls that actually removed a listener.
    pub fn removals(&self) -> usize {
        self.removals.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Channel for CountingChannel {
    async fn invoke(&self, channel: &str, payload: Value) -> Result<Value> {
        self.invokes.fetch_add(1, Ordering::SeqCst);
        self.host.invoke(channel, payload).await
    }

    fn listen(&self, channel: &str, listener: Listener) -> ListenerId {
        self.host.listen(channel, listener)
    }

    fn unlisten(&self, channel: &str, id: ListenerId) -> bool {
        let removed = self.host.unlisten(channel, id);
        if removed {
            self.removals.fetch_add(1, Ordering::SeqCst);
        }
        removed
    }

    fn unlisten_all(&self, channel: &str) -> usize {
        self.host.unlisten_all(channel)
    }

    fn listener_count(&self, channel: &str) -> usize {
        self.host.listener_count(channel)
    }
}

/// Shared hit counter for handlers and listeners.
pub fn counter() -> Arc<AtomicUsize> {
    Arc::new(AtomicUsize::new(0))
}

pub fn hits(c: &AtomicUsize) -> usize {
    c.load(Ordering::SeqCst)
}
