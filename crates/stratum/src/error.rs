//! Errors raised while assembling a [`Stack`](crate::Stack).

use stratum_config::ConfigError;
use stratum_core::ComposeError;
use stratum_telemetry::TelemetryError;
use thiserror::Error;

/// Errors raised while loading, composing, or looking up configured chains.
#[derive(Error, Debug)]
pub enum StackError {
    /// The configuration could not be loaded or is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A chain declaration could not be composed.
    #[error("chain '{chain}': {source}")]
    Compose {
        /// Name of the offending chain.
        chain: String,
        /// The composition failure.
        #[source]
        source: ComposeError,
    },

    /// No chain with this name is configured.
    #[error("unknown chain: {name}")]
    UnknownChain {
        /// The requested chain name.
        name: String,
    },

    /// Logging could not be initialized.
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
}

impl StackError {
    /// Create a new compose error for a chain.
    pub fn compose(chain: impl Into<String>, source: ComposeError) -> Self {
        Self::Compose {
            chain: chain.into(),
            source,
        }
    }

    /// Create a new unknown chain error.
    pub fn unknown_chain(name: impl Into<String>) -> Self {
        Self::UnknownChain { name: name.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compose_error_names_chain() {
        let err = StackError::compose("api", ComposeError::unknown_middleware(2, "cors"));
        assert!(err.to_string().starts_with("chain 'api': "));
        assert!(err.to_string().contains("cors"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_unknown_chain_error() {
        let err = StackError::unknown_chain("jobs");
        assert_eq!(err.to_string(), "unknown chain: jobs");
    }

    #[test]
    fn test_config_error_is_transparent() {
        let err = StackError::from(ConfigError::EmptyChainName);
        assert_eq!(err.to_string(), "[chains] declares a chain with an empty name");
    }
}
