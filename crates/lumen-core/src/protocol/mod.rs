//! Bridge protocol modules.
//!
//! - `body`: converts untrusted request payloads into wire-safe shapes.
//! - `envelope`: request/response envelopes and path validation.
//! - `normalize`: the single place raw replies become values or errors.
//! - `events`: payloads carried by the push channels.
//!
//! Nothing here touches a channel; every function is a pure transformation so
//! it can run on either side of the trust boundary.

pub mod body;
pub mod envelope;
pub mod events;
pub mod normalize;

pub use body::{
    serialize, FormEntry, FormValue, Headers, RequestBody, SerializedBody, WireFormEntry,
};
pub use envelope::{validate_path, Reply, RequestEnvelope, ResponseEnvelope};
pub use events::{HealthStatus, LogEntry, QueueProgress};
pub use normalize::normalize;
