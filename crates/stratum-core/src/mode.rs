//! Dispatcher execution mode.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Selects which dispatcher a composition produces.
///
/// The mode is always an explicit argument of composition. Nothing in
/// Stratum reads it from the process environment.
///
/// | Mode | Guards | Structural failures |
/// |---|---|---|
/// | `Strict` | all | descriptive [`DispatchError`](crate::DispatchError) |
/// | `Fast` | none | undiagnosed |
///
/// # Example
///
/// ```
/// use stratum_core::Mode;
///
/// assert_eq!(Mode::default(), Mode::Strict);
/// assert!(!Mode::Fast.is_strict());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Validate inputs and invariants, report descriptive errors.
    #[default]
    Strict,
    /// Skip all guards for minimal overhead. Misuse is not diagnosed.
    Fast,
}

impl Mode {
    /// Returns true if this mode runs the structural guards.
    #[must_use]
    pub const fn is_strict(self) -> bool {
        matches!(self, Self::Strict)
    }

    /// Returns the mode name as used in configuration.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Fast => "fast",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_deserialize() {
        let mode: Mode = serde_json::from_str(r#""fast""#).unwrap();
        assert_eq!(mode, Mode::Fast);

        let mode: Mode = serde_json::from_str(r#""strict""#).unwrap();
        assert_eq!(mode, Mode::Strict);

        assert!(serde_json::from_str::<Mode>(r#""debug""#).is_err());
    }

    #[test]
    fn test_mode_display() {
        assert_eq!(Mode::Strict.to_string(), "strict");
        assert_eq!(Mode::Fast.to_string(), "fast");
    }
}
