//! In-process privileged host.
//!
//! `LoopbackHost` plays the backend side of the boundary inside one process:
//! request handlers are registered per channel name, and `emit` fans push
//! events out to the listeners the bridge registered. Used by the demo binary
//! and by tests; a real deployment swaps in a pipe or socket `Channel`.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use serde_json::Value;

use lumen_core::error::{BridgeError, Result};

use crate::transport::channel::{Channel, IpcEvent, Listener, ListenerId};

/// Backend handler for one request channel.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn handle(&self, payload: Value) -> Result<Value>;
}

type HandlerFn = dyn Fn(Value) -> BoxFuture<'static, Result<Value>> + Send + Sync;

struct FnHandler(Box<HandlerFn>);

#[async_trait]
impl Handler for FnHandler {
    async fn handle(&self, payload: Value) -> Result<Value> {
        (self.0)(payload).await
    }
}

pub struct LoopbackHost {
    handlers: DashMap<String, Arc<dyn Handler>>,
    listeners: DashMap<String, Vec<(ListenerId, Listener)>>,
    next_id: AtomicU64,
}

impl Default for LoopbackHost {
    fn default() -> Self {
        Self::new()
    }
}

impl LoopbackHost {
    pub fn new() -> Self {
        Self {
            handlers: DashMap::new(),
            listeners: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn register(&self, channel: impl Into<String>, handler: Arc<dyn Handler>) {
        self.handlers.insert(channel.into(), handler);
    }

    /// Register an async closure as the handler for `channel`.
    pub fn register_fn<F, Fut>(&self, channel: impl Into<String>, f: F)
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value>> + Send + 'static,
    {
        let boxed: Box<HandlerFn> = Box::new(move |payload| f(payload).boxed());
        self.register(channel, Arc::new(FnHandler(boxed)));
    }

    pub fn unregister(&self, channel: &str) -> bool {
        self.handlers.remove(channel).is_some()
    }

    pub fn registered_channels(&self) -> Vec<String> {
        self.handlers.iter().map(|e| e.key().clone()).collect()
    }

    /// Push `payload` to every listener on `channel`. Returns the number reached.
    pub fn emit(&self, channel: &str, payload: Value) -> usize {
        // Snapshot first: a listener may unsubscribe itself while running.
        let targets: Vec<Listener> = match self.listeners.get(channel) {
            Some(list) => list.iter().map(|(_, l)| Arc::clone(l)).collect(),
            None => return 0,
        };

        let event = IpcEvent {
            channel: channel.to_owned(),
            payload,
        };
        for listener in &targets {
            listener(&event);
        }
        tracing::trace!(channel, delivered = targets.len(), "emitted push event");
        targets.len()
    }
}

#[async_trait]
impl Channel for LoopbackHost {
    async fn invoke(&self, channel: &str, payload: Value) -> Result<Value> {
        let handler = self
            .handlers
            .get(channel)
            .ok_or_else(|| {
                BridgeError::ipc(channel, format!("no handler registered for {channel}"))
            })?
            .value()
            .clone();

        // Handler errors keep their variant, so a terminal failure stays terminal.
        handler.handle(payload).await
    }

    fn listen(&self, channel: &str, listener: Listener) -> ListenerId {
        let id = ListenerId::new(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners
            .entry(channel.to_owned())
            .or_default()
            .push((id, listener));
        id
    }

    fn unlisten(&self, channel: &str, id: ListenerId) -> bool {
        let Some(mut list) = self.listeners.get_mut(channel) else {
            return false;
        };
        let before = list.len();
        list.retain(|(lid, _)| *lid != id);
        let removed = list.len() != before;
        if list.is_empty() {
            drop(list);
            self.listeners.remove_if(channel, |_, l| l.is_empty());
        }
        removed
    }

    fn unlisten_all(&self, channel: &str) -> usize {
        self.listeners
            .remove(channel)
            .map(|(_, list)| list.len())
            .unwrap_or(0)
    }

    fn listener_count(&self, channel: &str) -> usize {
        self.listeners.get(channel).map(|l| l.len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;

    #[tokio::test]
    async fn unknown_channel_is_ipc_failure() {
        let host = LoopbackHost::new();
        let err = host.invoke("engine:nope", Value::Null).await.unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(err.channel(), Some("engine:nope"));
    }

    #[tokio::test]
    async fn closure_handler_round_trip() {
        let host = LoopbackHost::new();
        host.register_fn("engine:echo", |p| async move { Ok(json!({"echo": p})) });
        let out = host.invoke("engine:echo", json!(5)).await.unwrap();
        assert_eq!(out, json!({"echo": 5}));
    }

    #[tokio::test]
    async fn handler_errors_keep_their_variant() {
        let host = LoopbackHost::new();
        host.register_fn("engine:request", |_| async {
            Err(BridgeError::BadRequest("unknown sort key".into()))
        });
        let err = host.invoke("engine:request", Value::Null).await.unwrap_err();
        assert!(matches!(err, BridgeError::BadRequest(ref m) if m == "unknown sort key"));
        assert!(!err.is_retryable());
    }

    #[test]
    fn unlisten_removes_only_the_given_listener() {
        let host = LoopbackHost::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let h1 = Arc::clone(&hits);
        let a = host.listen("engine:log", Arc::new(move |_: &IpcEvent| {
            h1.fetch_add(1, Ordering::SeqCst);
        }));
        let h2 = Arc::clone(&hits);
        let _b = host.listen("engine:log", Arc::new(move |_: &IpcEvent| {
            h2.fetch_add(10, Ordering::SeqCst);
        }));

        assert!(host.unlisten("engine:log", a));
        assert!(!host.unlisten("engine:log", a));
        assert_eq!(host.emit("engine:log", json!({})), 1);
        assert_eq!(hits.load(Ordering::SeqCst), 10);
    }
}
