//! Observability setup for Sequor: tracing subscriber initialization with
//! optional OpenTelemetry span export.

pub mod tracing_setup;
