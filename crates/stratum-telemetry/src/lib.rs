//! Structured logging for Stratum.
//!
//! Stratum's dispatchers emit `tracing` events: composition and strict
//! invocations at `debug`, every layer entered and left at `trace`, and
//! structural violations at `warn`. Fast dispatchers emit nothing per call.
//! This crate installs a subscriber that renders those events.
//!
//! # Example
//!
//! ```rust,ignore
//! use stratum_telemetry::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::development())?;
//!
//! tracing::info!(chain = "api", "Stack ready");
//! ```

#![doc(html_root_url = "https://docs.rs/stratum-telemetry/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod logging;

pub use error::TelemetryError;
pub use logging::{create_env_filter, init_logging, LogConfig};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
