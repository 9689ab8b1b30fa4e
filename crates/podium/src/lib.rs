//! Top-level facade crate for Podium.
//!
//! Re-exports core types and the gateway library so users can depend on a
//! single crate.

pub mod core {
    pub use podium_core::*;
}

pub mod gateway {
    pub use podium_gateway::*;
}
