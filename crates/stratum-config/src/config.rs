//! Main configuration types.
//!
//! This module provides the top-level [`StratumConfig`] struct and its builder.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use stratum_core::Mode;

use crate::{ConfigError, DispatchConfig, LogFormat, LoggingConfig, LOG_LEVELS};

/// Complete Stratum configuration.
///
/// Chain declarations are kept as raw values. Whether a declaration is a
/// well-formed list of registered names is decided when the chain is
/// composed, so that malformed entries are reported the same way as any
/// other composition error.
///
/// # Example
///
/// ```
/// use stratum_config::StratumConfig;
/// use stratum_core::Mode;
///
/// let config = StratumConfig::default();
/// assert_eq!(config.dispatch.mode, Mode::Strict);
/// assert!(config.chains.is_empty());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct StratumConfig {
    /// Dispatcher selection.
    #[serde(default)]
    pub dispatch: DispatchConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Named chain declarations, each expected to be a list of layer names.
    #[serde(default)]
    pub chains: BTreeMap<String, toml::Value>,
}

impl StratumConfig {
    /// Create a new configuration builder.
    ///
    /// # Example
    ///
    /// ```
    /// use stratum_config::StratumConfig;
    /// use stratum_core::Mode;
    ///
    /// let config = StratumConfig::builder()
    ///     .mode(Mode::Fast)
    ///     .chain("api", ["auth", "timing"])
    ///     .build();
    ///
    /// assert_eq!(config.dispatch.mode, Mode::Fast);
    /// assert_eq!(config.chain_names(), vec!["api"]);
    /// ```
    #[must_use]
    pub fn builder() -> StratumConfigBuilder {
        StratumConfigBuilder::new()
    }

    /// Returns the declaration of a named chain.
    #[must_use]
    pub fn chain(&self, name: &str) -> Option<&toml::Value> {
        self.chains.get(name)
    }

    /// Returns the declared chain names in sorted order.
    #[must_use]
    pub fn chain_names(&self) -> Vec<&str> {
        self.chains.keys().map(String::as_str).collect()
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - A chain name is empty or blank
    /// - The log level is not one of trace, debug, info, warn, error
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chains.keys().any(|name| name.trim().is_empty()) {
            return Err(ConfigError::EmptyChainName);
        }

        let level = self.logging.level.to_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            return Err(ConfigError::unknown_log_level(&self.logging.level));
        }

        Ok(())
    }

    /// Create a development configuration preset.
    ///
    /// Debug level, pretty output with source locations, strict dispatch.
    ///
    /// # Example
    ///
    /// ```
    /// use stratum_config::{LogFormat, StratumConfig};
    ///
    /// let config = StratumConfig::development();
    /// assert_eq!(config.logging.level, "debug");
    /// assert_eq!(config.logging.format, LogFormat::Pretty);
    /// ```
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();

        config.dispatch.mode = Mode::Strict;
        config.logging.level = "debug".to_string();
        config.logging.format = LogFormat::Pretty;
        config.logging.include_location = true;

        config
    }

    /// Create a production configuration preset.
    ///
    /// Info level and JSON output. Dispatch stays strict until switched to
    /// [`Mode::Fast`] explicitly.
    ///
    /// # Example
    ///
    /// ```
    /// use stratum_config::{LogFormat, StratumConfig};
    /// use stratum_core::Mode;
    ///
    /// let config = StratumConfig::production();
    /// assert_eq!(config.logging.format, LogFormat::Json);
    /// assert_eq!(config.dispatch.mode, Mode::Strict);
    /// ```
    #[must_use]
    pub fn production() -> Self {
        let mut config = Self::default();

        config.dispatch.mode = Mode::Strict;
        config.logging.level = "info".to_string();
        config.logging.format = LogFormat::Json;
        config.logging.include_location = false;

        config
    }
}

/// Builder for [`StratumConfig`].
#[derive(Debug, Default)]
pub struct StratumConfigBuilder {
    dispatch: Option<DispatchConfig>,
    logging: Option<LoggingConfig>,
    chains: BTreeMap<String, toml::Value>,
}

impl StratumConfigBuilder {
    /// Create a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the dispatch configuration.
    #[must_use]
    pub fn dispatch(mut self, dispatch: DispatchConfig) -> Self {
        self.dispatch = Some(dispatch);
        self
    }

    /// Set the dispatcher mode.
    #[must_use]
    pub fn mode(self, mode: Mode) -> Self {
        self.dispatch(DispatchConfig { mode })
    }

    /// Set the logging configuration.
    #[must_use]
    pub fn logging(mut self, logging: LoggingConfig) -> Self {
        self.logging = Some(logging);
        self
    }

    /// Declare a chain as an ordered list of layer names.
    #[must_use]
    pub fn chain<I, N>(self, name: impl Into<String>, layers: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<String>,
    {
        let layers = layers
            .into_iter()
            .map(|layer| toml::Value::String(layer.into()))
            .collect();
        self.chain_value(name, toml::Value::Array(layers))
    }

    /// Declare a chain from a raw value.
    #[must_use]
    pub fn chain_value(mut self, name: impl Into<String>, value: toml::Value) -> Self {
        self.chains.insert(name.into(), value);
        self
    }

    /// Build the configuration.
    ///
    /// Any unset sections will use their default values.
    #[must_use]
    pub fn build(self) -> StratumConfig {
        StratumConfig {
            dispatch: self.dispatch.unwrap_or_default(),
            logging: self.logging.unwrap_or_default(),
            chains: self.chains,
        }
    }

    /// Build and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if validation fails.
    pub fn build_validated(self) -> Result<StratumConfig, ConfigError> {
        let config = self.build();
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = StratumConfig::default();
        assert_eq!(config.dispatch.mode, Mode::Strict);
        assert_eq!(config.logging.level, "info");
        assert!(config.chains.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_chains() {
        let config = StratumConfig::builder()
            .chain("api", ["request_log", "auth"])
            .chain_value("broken", toml::Value::Integer(7))
            .build();

        assert_eq!(config.chain_names(), vec!["api", "broken"]);
        assert_eq!(
            config.chain("api"),
            Some(&toml::Value::Array(vec![
                toml::Value::String("request_log".to_string()),
                toml::Value::String("auth".to_string()),
            ]))
        );
        // Malformed declarations are left for composition to report
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_empty_chain_name() {
        let result = StratumConfig::builder().chain("  ", ["auth"]).build_validated();
        assert!(matches!(result, Err(ConfigError::EmptyChainName)));
    }

    #[test]
    fn test_validate_unknown_log_level() {
        let config = StratumConfig::builder()
            .logging(LoggingConfig {
                level: "loud".to_string(),
                ..Default::default()
            })
            .build();

        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::UnknownLogLevel { ref level } if level == "loud"));
        assert!(err.to_string().starts_with("[logging] level 'loud'"));
    }

    #[test]
    fn test_validate_level_is_case_insensitive() {
        let config = StratumConfig::builder()
            .logging(LoggingConfig {
                level: "WARN".to_string(),
                ..Default::default()
            })
            .build();

        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_development_preset() {
        let config = StratumConfig::development();
        assert_eq!(config.dispatch.mode, Mode::Strict);
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert!(config.logging.include_location);
    }

    #[test]
    fn test_production_preset() {
        let config = StratumConfig::production();
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, LogFormat::Json);
        assert!(!config.logging.include_location);
    }

    #[test]
    fn test_toml_round_trip_keeps_chains() {
        let config = StratumConfig::builder()
            .mode(Mode::Fast)
            .chain("api", ["auth"])
            .build();

        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[dispatch]"));
        assert!(toml_str.contains("[chains]"));

        let parsed: StratumConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_unknown_section_rejected() {
        let result: Result<StratumConfig, _> = toml::from_str("[server]\nport = 80\n");
        assert!(result.is_err());
    }
}
