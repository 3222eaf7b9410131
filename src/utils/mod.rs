//! # Utility Modules
//!
//! - **Logging**: subscriber setup from [`crate::config::LoggingConfig`]
//! - **Metrics**: thread-safe codec counters

pub mod logging;
pub mod metrics;
