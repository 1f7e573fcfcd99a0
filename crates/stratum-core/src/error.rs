//! Error types for Stratum.
//!
//! Two families of structural error exist, split by when they can occur:
//!
//! | Type | Raised by | When |
//! |---|---|---|
//! | [`ComposeError`] | composer | before any dispatcher exists |
//! | [`DispatchError`] | strict dispatcher | while a single invocation runs |
//!
//! Dispatch errors are fatal to the invocation that raised them only. The
//! dispatcher itself keeps working for later calls.
//!
//! # Example
//!
//! ```
//! use stratum_core::DispatchError;
//!
//! let err = DispatchError::next_called_twice(2);
//! assert_eq!(err.kind(), "next_called_twice");
//! assert_eq!(err.to_string(), "`next()` called multiple times (position 2)");
//! ```

use thiserror::Error;

/// Result type alias using [`ComposeError`].
pub type ComposeResult<T> = Result<T, ComposeError>;

/// Errors raised while turning a middleware declaration into a dispatcher.
///
/// These only arise from dynamic declarations (for example a chain listed in
/// a configuration file). Statically typed layer lists cannot be malformed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ComposeError {
    /// The declaration is not an ordered sequence.
    #[error("expected middleware to be an array, got {found}")]
    NotASequence {
        /// The kind of value that was found instead.
        found: &'static str,
    },

    /// An element of the declaration cannot name a middleware.
    #[error("expected middleware to contain functions, but got {found} at index {index}")]
    NotCallable {
        /// Position of the offending element.
        index: usize,
        /// The kind of value that was found.
        found: &'static str,
    },

    /// An element names a middleware that was never registered.
    #[error("middleware `{name}` at index {index} is not registered")]
    UnknownMiddleware {
        /// Position of the offending element.
        index: usize,
        /// The unresolved name.
        name: String,
    },
}

impl ComposeError {
    /// Creates a not-a-sequence error.
    pub fn not_a_sequence(found: &'static str) -> Self {
        Self::NotASequence { found }
    }

    /// Creates a not-callable error.
    pub fn not_callable(index: usize, found: &'static str) -> Self {
        Self::NotCallable { index, found }
    }

    /// Creates an unknown middleware error.
    pub fn unknown_middleware(index: usize, name: impl Into<String>) -> Self {
        Self::UnknownMiddleware {
            index,
            name: name.into(),
        }
    }

    /// Returns a stable identifier for this error, suitable for log fields.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::NotASequence { .. } => "not_a_sequence",
            Self::NotCallable { .. } => "not_callable",
            Self::UnknownMiddleware { .. } => "unknown_middleware",
        }
    }
}

/// Structural violations detected while a dispatcher runs.
///
/// The strict dispatcher reports every variant. The fast dispatcher skips
/// the guards and only ever produces [`DispatchError::NoValue`], without
/// position information, because a value must exist to resolve the chain.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// The requested terminal does not exist.
    #[error("expected the last argument to be `done(ctx)`, but `{name}` is not registered")]
    MissingTerminal {
        /// The terminal name that failed to resolve.
        name: String,
    },

    /// A continuation was invoked more than once.
    #[error("`next()` called multiple times (position {position})")]
    NextCalledTwice {
        /// Position of the layer that owned the continuation.
        position: usize,
    },

    /// The terminal tried to continue past the end of the chain.
    #[error("composed `done(ctx)` function should not call `next()` (position {position})")]
    TerminalOverrun {
        /// The position that was requested.
        position: usize,
    },

    /// A layer finished without producing a value.
    #[error("expected middleware to return `next()` or a value{}", site(.position, .name))]
    NoValue {
        /// Position of the silent layer, when known.
        position: Option<usize>,
        /// Name of the silent layer, when known.
        name: Option<&'static str>,
    },
}

fn site(position: &Option<usize>, name: &Option<&'static str>) -> String {
    match (position, name) {
        (Some(position), Some(name)) => format!(" (`{name}` at position {position})"),
        (Some(position), None) => format!(" (position {position})"),
        (None, Some(name)) => format!(" (`{name}`)"),
        (None, None) => String::new(),
    }
}

impl DispatchError {
    /// Creates a missing terminal error.
    pub fn missing_terminal(name: impl Into<String>) -> Self {
        Self::MissingTerminal { name: name.into() }
    }

    /// Creates a double continuation error.
    pub fn next_called_twice(position: usize) -> Self {
        Self::NextCalledTwice { position }
    }

    /// Creates a terminal overrun error.
    pub fn terminal_overrun(position: usize) -> Self {
        Self::TerminalOverrun { position }
    }

    /// Creates a no-value error with full diagnostics.
    pub fn no_value(position: usize, name: &'static str) -> Self {
        Self::NoValue {
            position: Some(position),
            name: Some(name),
        }
    }

    /// Creates a no-value error without diagnostics.
    pub fn no_value_unchecked() -> Self {
        Self::NoValue {
            position: None,
            name: None,
        }
    }

    /// Returns a stable identifier for this error, suitable for log fields.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::MissingTerminal { .. } => "missing_terminal",
            Self::NextCalledTwice { .. } => "next_called_twice",
            Self::TerminalOverrun { .. } => "terminal_overrun",
            Self::NoValue { .. } => "no_value",
        }
    }

    /// Returns the chain position the error refers to, if any.
    #[must_use]
    pub const fn position(&self) -> Option<usize> {
        match self {
            Self::MissingTerminal { .. } => None,
            Self::NextCalledTwice { position } | Self::TerminalOverrun { position } => {
                Some(*position)
            }
            Self::NoValue { position, .. } => *position,
        }
    }
}
