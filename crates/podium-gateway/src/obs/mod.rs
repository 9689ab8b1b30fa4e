//! Observability: dependency-free metrics registry.

pub mod metrics;

pub use metrics::GatewayMetrics;
