//! Lumen core: transport-agnostic bridge protocol primitives and error types.
//!
//! This crate defines the wire-level contracts shared by the bridge runtime and
//! the privileged host: request/response envelopes, the body serializer, the
//! reply normalizer and the push event payloads. It carries no runtime
//! dependencies so both sides of the trust boundary can link it.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! Hostile or malformed payloads from the untrusted side surface as
//! `BridgeError`/`Result` values.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod protocol;

/// Shared result type.
pub use error::{BridgeError, ErrorCode, Result};
