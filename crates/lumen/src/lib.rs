//! Top-level facade crate for the Lumen request bridge.
//!
//! Re-exports the protocol core and the bridge runtime so users can depend on a single crate.

pub mod core {
    pub use lumen_core::*;
}

pub mod bridge {
    pub use lumen_bridge::*;
}
