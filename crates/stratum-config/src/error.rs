//! Configuration error types.

use std::path::PathBuf;
use thiserror::Error;

use crate::LOG_LEVELS;

/// Errors raised while loading or validating a Stratum configuration.
///
/// Malformed `[chains]` declarations are not reported here. They stay raw
/// until composition, which reports them as `ComposeError`s.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file does not exist.
    #[error("stratum configuration not found: {path}")]
    NotFound {
        /// Path that was looked up.
        path: PathBuf,
    },

    /// The configuration file exists but cannot be read.
    #[error("cannot read stratum configuration {path}")]
    Read {
        /// Path to the file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Configuration content is not a `.toml` or `.json` document.
    #[error("unsupported configuration format '{format}', expected toml or json")]
    UnsupportedFormat {
        /// The rejected format or file name.
        format: String,
    },

    /// Malformed TOML, or a TOML document with unknown sections or keys.
    #[error("malformed TOML configuration: {0}")]
    Toml(#[from] toml::de::Error),

    /// Malformed JSON, or a JSON document with unknown sections or keys.
    #[error("malformed JSON configuration: {0}")]
    Json(#[from] serde_json::Error),

    /// A `[chains]` entry has an empty or blank name.
    #[error("[chains] declares a chain with an empty name")]
    EmptyChainName,

    /// `[logging] level` is not a known level.
    #[error("[logging] level '{level}' is not one of {}", LOG_LEVELS.join(", "))]
    UnknownLogLevel {
        /// The rejected level.
        level: String,
    },

    /// A `PREFIX__LOGGING__*` override has an unusable value.
    #[error("environment override {var}: expected {expected}")]
    EnvOverride {
        /// The environment variable name.
        var: String,
        /// What the variable should hold.
        expected: &'static str,
    },
}

impl ConfigError {
    /// Create a new not found error.
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        Self::NotFound { path: path.into() }
    }

    /// Create a new read error.
    pub fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    /// Create a new unsupported format error.
    pub fn unsupported_format(format: impl Into<String>) -> Self {
        Self::UnsupportedFormat {
            format: format.into(),
        }
    }

    /// Create a new unknown log level error.
    pub fn unknown_log_level(level: impl Into<String>) -> Self {
        Self::UnknownLogLevel {
            level: level.into(),
        }
    }

    /// Create a new environment override error.
    pub fn env_override(var: impl Into<String>, expected: &'static str) -> Self {
        Self::EnvOverride {
            var: var.into(),
            expected,
        }
    }
}
