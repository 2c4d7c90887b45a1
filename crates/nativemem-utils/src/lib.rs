//! # nativemem Utilities
//!
//! Shared utilities and logging for nativemem.
//!
//! This crate provides common functionality used across the nativemem workspace,
//! including logging infrastructure built on `tracing`.

pub mod logging;

// Re-export commonly used logging functions for convenience
pub use logging::{LogFormat, LogLevel, LoggingError, LoggingGuard, init_logging, init_logging_with_level};
pub use tracing::{debug, error, info, trace, warn};
