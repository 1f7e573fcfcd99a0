//! Named dispatchers built from configuration.
//!
//! A [`Stack`] composes every chain declared under `[chains]` against a
//! [`Registry`] of named layers, using the dispatcher mode from
//! `[dispatch]`. Composition happens once. Afterwards each chain is a
//! reusable [`Dispatcher`] looked up by name.

use std::collections::BTreeMap;

use stratum_config::{ConfigLoader, StratumConfig};
use stratum_core::{DispatchError, Mode};
use stratum_middleware::{BoxFuture, Composer, Dispatcher, Registry, Terminal};
use stratum_telemetry::LogConfig;
use tracing::{debug, info};

use crate::StackError;

/// The dispatchers of every configured chain.
///
/// # Example
///
/// ```
/// use stratum::prelude::*;
///
/// # tokio_test::block_on(async {
/// let mut registry: Registry<u32, u32> = Registry::new();
/// registry.register("inc", FnMiddleware::new("inc", |n: u32, next: Next<u32, u32>| async move {
///     next.run_with(n + 1).await.map(Some)
/// }));
///
/// let config = StratumConfig::builder().chain("twice", ["inc", "inc"]).build();
/// let stack = Stack::from_config(&config, &registry).unwrap();
///
/// let result = stack
///     .call("twice", 40, |n: u32| async move { anyhow::Ok(n) })
///     .unwrap()
///     .await
///     .unwrap();
/// assert_eq!(result, 42);
/// # });
/// ```
pub struct Stack<S, U, E = anyhow::Error> {
    mode: Mode,
    chains: BTreeMap<String, Dispatcher<S, U, E>>,
}

impl<S, U, E> Clone for Stack<S, U, E> {
    fn clone(&self) -> Self {
        Self {
            mode: self.mode,
            chains: self.chains.clone(),
        }
    }
}

impl<S, U, E> std::fmt::Debug for Stack<S, U, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stack")
            .field("mode", &self.mode)
            .field("chains", &self.chains.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<S, U, E> Stack<S, U, E>
where
    S: Clone + Send + Sync + 'static,
    U: Send + 'static,
    E: From<DispatchError> + Send + 'static,
{
    /// Composes every chain declared in `config`.
    ///
    /// # Errors
    ///
    /// Returns `StackError::Compose` naming the first chain (in name order)
    /// whose declaration is malformed or references an unregistered layer.
    pub fn from_config(
        config: &StratumConfig,
        registry: &Registry<S, U, E>,
    ) -> Result<Self, StackError> {
        let mode = config.dispatch.mode;
        let mut chains = BTreeMap::new();

        for (name, declaration) in &config.chains {
            let dispatcher = Composer::from_value(mode, registry, declaration)
                .map_err(|source| StackError::compose(name, source))?;
            debug!(
                chain = %name,
                layers = ?dispatcher.layer_names(),
                "Chain composed"
            );
            chains.insert(name.clone(), dispatcher);
        }

        info!(mode = %mode, chains = chains.len(), "Stack composed");
        Ok(Self { mode, chains })
    }

    /// Loads configuration through `loader`, then composes it.
    ///
    /// # Errors
    ///
    /// Returns `StackError::Config` if loading or validation fails, or
    /// `StackError::Compose` as for [`Stack::from_config`].
    pub fn load(loader: ConfigLoader, registry: &Registry<S, U, E>) -> Result<Self, StackError> {
        let config = loader.load()?;
        Self::from_config(&config, registry)
    }

    /// Returns the mode every chain was composed with.
    #[must_use]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Returns the dispatcher of a chain.
    #[must_use]
    pub fn chain(&self, name: &str) -> Option<&Dispatcher<S, U, E>> {
        self.chains.get(name)
    }

    /// Returns the configured chain names in sorted order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.chains.keys().map(String::as_str).collect()
    }

    /// Runs a chain by name.
    ///
    /// An unknown name fails immediately, before any layer runs.
    ///
    /// # Errors
    ///
    /// Returns `StackError::UnknownChain` if no chain is called `name`.
    pub fn call<T>(
        &self,
        name: &str,
        ctx: S,
        done: T,
    ) -> Result<BoxFuture<'static, Result<U, E>>, StackError>
    where
        T: Terminal<S, U, E>,
    {
        let dispatcher = self
            .chain(name)
            .ok_or_else(|| StackError::unknown_chain(name))?;
        Ok(dispatcher.call(ctx, done))
    }
}

/// Installs the global log subscriber described by the `[logging]` section.
///
/// # Errors
///
/// Returns `StackError::Telemetry` if the level is not a valid filter or a
/// subscriber is already installed.
pub fn init_logging(config: &StratumConfig) -> Result<(), StackError> {
    stratum_telemetry::init_logging(&LogConfig::from(&config.logging))?;
    Ok(())
}
