//! Wire protocol: JSON frame envelope and the presentation message set.
//!
//! All parsing is panic-free: malformed input is reported as `PodiumError`
//! instead of panicking, keeping the gateway resilient to hostile traffic.

pub mod envelope;
pub mod messages;
