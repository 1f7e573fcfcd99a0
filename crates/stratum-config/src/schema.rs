//! Configuration section types.

use serde::{Deserialize, Serialize};
use stratum_core::Mode;
use stratum_telemetry::LogConfig;

/// Log levels accepted by `logging.level`.
pub const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Dispatch configuration section.
///
/// Selects the dispatcher every declared chain is composed with.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct DispatchConfig {
    /// Dispatcher mode (`strict` or `fast`).
    #[serde(default)]
    pub mode: Mode,
}

/// Log format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON formatted logs (production).
    #[default]
    Json,
    /// Human-readable pretty format (development).
    Pretty,
}

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Enable logging.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Include source file and line in logs.
    #[serde(default)]
    pub include_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: LogFormat::default(),
            include_location: false,
        }
    }
}

impl From<&LoggingConfig> for LogConfig {
    fn from(config: &LoggingConfig) -> Self {
        let base = match config.format {
            LogFormat::Json => Self::production(),
            LogFormat::Pretty => Self::development(),
        };
        Self {
            enabled: config.enabled,
            level: config.level.clone(),
            file_line_info: config.include_location,
            ..base
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_config_default() {
        assert_eq!(DispatchConfig::default().mode, Mode::Strict);
    }

    #[test]
    fn test_dispatch_mode_deserialize() {
        let config: DispatchConfig = toml::from_str(r#"mode = "fast""#).unwrap();
        assert_eq!(config.mode, Mode::Fast);

        let result: Result<DispatchConfig, _> = toml::from_str(r#"mode = "debug""#);
        assert!(result.is_err());
    }

    #[test]
    fn test_logging_config_default() {
        let config = LoggingConfig::default();
        assert!(config.enabled);
        assert_eq!(config.level, "info");
        assert_eq!(config.format, LogFormat::Json);
        assert!(!config.include_location);
    }

    #[test]
    fn test_log_format_deserialize() {
        let format: LogFormat = serde_json::from_str(r#""pretty""#).unwrap();
        assert_eq!(format, LogFormat::Pretty);
    }

    #[test]
    fn test_into_log_config() {
        let config = LoggingConfig {
            level: "warn".to_string(),
            format: LogFormat::Pretty,
            ..Default::default()
        };

        let log = LogConfig::from(&config);
        assert!(log.enabled);
        assert_eq!(log.level, "warn");
        assert!(!log.json_format);
        assert!(!log.file_line_info);

        let log = LogConfig::from(&LoggingConfig::default());
        assert!(log.json_format);
    }

    #[test]
    fn test_logging_unknown_field_rejected() {
        let result: Result<LoggingConfig, _> = toml::from_str(r#"colour = "always""#);
        assert!(result.is_err());
    }
}
