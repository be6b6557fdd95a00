//! Subscription registry.
//!
//! Each subscription is an explicit handle: it remembers the listener id the
//! transport handed out, so teardown never depends on recovering the adapter
//! closure. Disposal is idempotent and also happens on drop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::transport::{Channel, IpcEvent, Listener, ListenerId};

struct RegistryInner {
    transport: Arc<dyn Channel>,
    /// listener id -> channel, for every subscription not yet disposed.
    live: DashMap<ListenerId, String>,
}

impl RegistryInner {
    /// Unregister once; later calls for the same id are no-ops.
    fn release(&self, id: ListenerId) -> bool {
        match self.live.remove(&id) {
            Some((_, channel)) => {
                self.transport.unlisten(&channel, id);
                tracing::debug!(channel = %channel, listener = id.get(), "subscription disposed");
                true
            }
            None => false,
        }
    }
}

#[derive(Clone)]
pub struct SubscriptionRegistry {
    inner: Arc<RegistryInner>,
}

impl SubscriptionRegistry {
    pub fn new(transport: Arc<dyn Channel>) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                transport,
                live: DashMap::new(),
            }),
        }
    }

    /// Register `handler` for the payloads pushed on `channel`.
    pub fn subscribe<F>(&self, channel: &str, handler: F) -> Subscription
    where
        F: Fn(Value) + Send + Sync + 'static,
    {
        let adapter: Listener = Arc::new(move |event: &IpcEvent| handler(event.payload.clone()));
        let id = self.inner.transport.listen(channel, adapter);
        self.inner.live.insert(id, channel.to_owned());
        tracing::debug!(channel, listener = id.get(), "subscribed");

        Subscription {
            channel: channel.to_owned(),
            id,
            registry: Arc::clone(&self.inner),
            disposed: AtomicBool::new(false),
        }
    }

    /// Like `subscribe`, decoding each payload into `T`. Payloads that do not
    /// decode are logged and dropped.
    pub fn subscribe_typed<T, F>(&self, channel: &str, handler: F) -> Subscription
    where
        T: DeserializeOwned,
        F: Fn(T) + Send + Sync + 'static,
    {
        let name = channel.to_owned();
        self.subscribe(channel, move |payload| {
            match serde_json::from_value::<T>(payload) {
                Ok(v) => handler(v),
                Err(e) => {
                    tracing::warn!(channel = %name, error = %e, "dropping malformed push payload")
                }
            }
        })
    }

    pub fn len(&self) -> usize {
        self.inner.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.live.is_empty()
    }

    /// Dispose every live subscription. Returns how many were torn down.
    pub fn dispose_all(&self) -> usize {
        let ids: Vec<ListenerId> = self.inner.live.iter().map(|e| *e.key()).collect();
        ids.into_iter().filter(|id| self.inner.release(*id)).count()
    }
}

/// Handle owning one registered listener.
#[must_use = "dropping a Subscription disposes it"]
pub struct Subscription {
    channel: String,
    id: ListenerId,
    registry: Arc<RegistryInner>,
    disposed: AtomicBool,
}

impl Subscription {
    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn id(&self) -> ListenerId {
        self.id
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire) || !self.registry.live.contains_key(&self.id)
    }

    /// Remove this subscription's listener. Safe to call any number of times.
    pub fn dispose(&self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.registry.release(self.id);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("channel", &self.channel)
            .field("id", &self.id)
            .field("disposed", &self.is_disposed())
            .finish()
    }
}
