//! Lumen bridge runtime.
//!
//! Wires the channel transport, invoker, retry coordinator and subscription
//! registry into the `Bridge` facade handed to the untrusted front end. The
//! binary (`main.rs`) runs the facade against an in-process loopback host.

pub mod bridge;
pub mod config;
pub mod invoker;
pub mod retry;
pub mod subscriptions;
pub mod transport;

pub use bridge::{Bridge, Logs, Queue, RequestOptions};
pub use config::{BridgeConfig, ConfigError};
pub use retry::{with_retry, RetryPolicy};
pub use subscriptions::{Subscription, SubscriptionRegistry};
pub use transport::{Channel, IpcEvent, ListenerId, LoopbackHost};
