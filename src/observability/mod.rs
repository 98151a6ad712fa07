//! Observability module
//!
//! Logging setup and log hygiene helpers.

pub mod telemetry;
