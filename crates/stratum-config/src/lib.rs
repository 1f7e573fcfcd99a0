//! Typed configuration for Stratum.
//!
//! This crate provides a strongly-typed configuration for middleware stacks
//! with support for:
//! - TOML and JSON configuration files
//! - Environment variable overrides for logging
//! - Strict validation (fails on unknown fields)
//! - Layered configuration (defaults → file → env)
//!
//! # Overview
//!
//! The configuration is built around the [`StratumConfig`] struct:
//!
//! - [`DispatchConfig`] - which dispatcher chains are composed with
//! - [`LoggingConfig`] - log level and output format
//! - `chains` - named, ordered lists of registered layer names
//!
//! # Configuration File Format
//!
//! ```toml
//! [dispatch]
//! mode = "strict"
//!
//! [logging]
//! enabled = true
//! level = "info"
//! format = "json"
//! include_location = false
//!
//! [chains]
//! api = ["request_log", "auth", "timing"]
//! jobs = ["timing"]
//! ```
//!
//! # Environment Variable Overrides
//!
//! Logging can be overridden with `PREFIX__LOGGING__KEY` variables, for
//! example `STRATUM__LOGGING__LEVEL=debug`. The dispatch mode is never read
//! from the environment.

#![warn(missing_docs)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::*;
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::*;
