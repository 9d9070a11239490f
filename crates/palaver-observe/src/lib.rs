//! Observability helpers for Palaver.

pub mod tracing_setup;
