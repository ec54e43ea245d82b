//! Metric names for the regnum command client.
//!
//! This crate provides a unified metrics interface using the `metrics` crate facade.
//! Nothing is recorded until the host application installs a recorder
//! (Prometheus exporter, statsd, ...).
//!
//! # Usage
//!
//! ```rust,ignore
//! use regnum_metrics::{commands, counter};
//!
//! counter!(commands::DISPATCHED_TOTAL).increment(1);
//! ```

mod definitions;

pub use definitions::*;

// Re-export metrics macros for convenience
pub use metrics::{counter, gauge, histogram};
