pub mod headers;
pub mod metrics;
pub mod tracing;
