//! Transport layer.
//!
//! Exposes the `Channel` seam the bridge talks through and the in-process
//! loopback host that implements the privileged side of it.

pub mod channel;
pub mod loopback;

pub use channel::{Channel, IpcEvent, Listener, ListenerId};
pub use loopback::{Handler, LoopbackHost};
