//! Podium gateway library entry.
//!
//! This crate wires the transport, protocol dispatcher, session registry,
//! broadcast router, presentation store, and operational endpoints into a
//! cohesive gateway stack. It is intended to be consumed by the binary
//! (`main.rs`) and by integration tests.

pub mod app_state;
pub mod config;
pub mod dispatch;
pub mod obs;
pub mod ops;
pub mod router;
pub mod session;
pub mod store;
pub mod transport;
