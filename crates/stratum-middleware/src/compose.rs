//! Composition of layers into a [`Dispatcher`].
//!
//! Layers can be supplied statically, through [`compose`] or the
//! [`Composer`] builder, or dynamically, as a declaration of registered
//! names (for example a chain listed in a configuration file):
//!
//! ```toml
//! api = ["request_log", "auth", "timing"]
//! ```
//!
//! A static list is well-formed by construction. A dynamic declaration is
//! checked before any dispatcher exists, and the first problem found is
//! reported as a [`ComposeError`].

use crate::dispatch::Dispatcher;
use crate::middleware::{BoxedMiddleware, Middleware};
use crate::registry::Registry;
use std::sync::Arc;
use stratum_core::{ComposeError, ComposeResult, DispatchError, Mode};
use tracing::warn;

/// Composes an ordered list of layers into a dispatcher.
///
/// # Example
///
/// ```
/// use stratum_core::Mode;
/// use stratum_middleware::{compose, Dispatcher};
///
/// let dispatcher: Dispatcher<(), ()> = compose(Mode::Fast, Vec::new());
/// assert!(dispatcher.is_empty());
/// ```
pub fn compose<S, U, E>(mode: Mode, layers: Vec<BoxedMiddleware<S, U, E>>) -> Dispatcher<S, U, E>
where
    S: Clone + Send + Sync + 'static,
    U: Send + 'static,
    E: From<DispatchError> + Send + 'static,
{
    Dispatcher::new(mode, layers)
}

/// Builder for constructing a [`Dispatcher`].
///
/// # Example
///
/// ```
/// use stratum_middleware::{Composer, FnMiddleware, Next};
///
/// let dispatcher = Composer::strict()
///     .layer(FnMiddleware::new("pass", |n: u8, next: Next<u8, u8>| async move {
///         next.run().await.map(Some)
///     }))
///     .build();
///
/// assert_eq!(dispatcher.layer_names(), vec!["pass"]);
/// ```
pub struct Composer<S, U, E = anyhow::Error> {
    mode: Mode,
    layers: Vec<BoxedMiddleware<S, U, E>>,
}

impl<S, U, E> Composer<S, U, E>
where
    S: Clone + Send + Sync + 'static,
    U: Send + 'static,
    E: From<DispatchError> + Send + 'static,
{
    /// Creates an empty composer for the given mode.
    #[must_use]
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            layers: Vec::new(),
        }
    }

    /// Creates an empty composer producing a strict dispatcher.
    #[must_use]
    pub fn strict() -> Self {
        Self::new(Mode::Strict)
    }

    /// Creates an empty composer producing a fast dispatcher.
    #[must_use]
    pub fn fast() -> Self {
        Self::new(Mode::Fast)
    }

    /// Appends a layer.
    #[must_use]
    pub fn layer<M: Middleware<S, U, E>>(mut self, middleware: M) -> Self {
        self.layers.push(Arc::new(middleware));
        self
    }

    /// Appends an already shared layer.
    #[must_use]
    pub fn boxed_layer(mut self, middleware: BoxedMiddleware<S, U, E>) -> Self {
        self.layers.push(middleware);
        self
    }

    /// Builds the dispatcher.
    #[must_use]
    pub fn build(self) -> Dispatcher<S, U, E> {
        Dispatcher::new(self.mode, self.layers)
    }

    /// Composes a dispatcher from a declaration of registered names.
    ///
    /// The declaration must be an array of strings, each naming a layer in
    /// `registry`. Resolution is inherent to building the chain, so both
    /// modes check the declaration.
    ///
    /// # Errors
    ///
    /// - [`ComposeError::NotASequence`] if `value` is not an array
    /// - [`ComposeError::NotCallable`] if an element is not a string
    /// - [`ComposeError::UnknownMiddleware`] if a name is not registered
    pub fn from_value(
        mode: Mode,
        registry: &Registry<S, U, E>,
        value: &toml::Value,
    ) -> ComposeResult<Dispatcher<S, U, E>> {
        let Some(entries) = value.as_array() else {
            return Err(rejected(ComposeError::not_a_sequence(value.type_str())));
        };

        let mut composer = Self::new(mode);
        for (index, entry) in entries.iter().enumerate() {
            let Some(name) = entry.as_str() else {
                return Err(rejected(ComposeError::not_callable(index, entry.type_str())));
            };
            let Some(middleware) = registry.middleware(name) else {
                return Err(rejected(ComposeError::unknown_middleware(index, name)));
            };
            composer = composer.boxed_layer(middleware);
        }

        Ok(composer.build())
    }
}

impl<S, U, E> Default for Composer<S, U, E>
where
    S: Clone + Send + Sync + 'static,
    U: Send + 'static,
    E: From<DispatchError> + Send + 'static,
{
    fn default() -> Self {
        Self::new(Mode::default())
    }
}

fn rejected(err: ComposeError) -> ComposeError {
    warn!(kind = err.kind(), error = %err, "Middleware declaration rejected");
    err
}
