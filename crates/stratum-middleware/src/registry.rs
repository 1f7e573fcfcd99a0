//! Named middleware and terminals.
//!
//! A [`Registry`] maps names to shared layers and terminals so that chains
//! can be declared by name (see [`Composer::from_value`]) and invocations can
//! pick their terminal by name (see [`Dispatcher::call_named`]).
//!
//! [`Composer::from_value`]: crate::Composer::from_value
//! [`Dispatcher::call_named`]: crate::Dispatcher::call_named

use crate::middleware::{BoxedMiddleware, BoxedTerminal, Middleware, Terminal};
use std::collections::HashMap;
use std::sync::Arc;

/// Name-indexed layers and terminals.
///
/// # Example
///
/// ```
/// use stratum_middleware::{FnMiddleware, Next, Registry};
///
/// let mut registry: Registry<u32, u32> = Registry::new();
/// registry
///     .register("inc", FnMiddleware::new("inc", |n: u32, next: Next<u32, u32>| async move {
///         next.run_with(n + 1).await.map(Some)
///     }))
///     .register_terminal("echo", |n: u32| async move { anyhow::Ok(n) });
///
/// assert!(registry.middleware("inc").is_some());
/// assert!(registry.terminal("echo").is_some());
/// assert!(registry.terminal("missing").is_none());
/// ```
pub struct Registry<S, U, E = anyhow::Error> {
    middleware: HashMap<String, BoxedMiddleware<S, U, E>>,
    terminals: HashMap<String, BoxedTerminal<S, U, E>>,
}

impl<S, U, E> Registry<S, U, E> {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            middleware: HashMap::new(),
            terminals: HashMap::new(),
        }
    }

    /// Registers a layer under `name`, replacing any previous entry.
    pub fn register<M>(&mut self, name: impl Into<String>, middleware: M) -> &mut Self
    where
        M: Middleware<S, U, E>,
    {
        self.register_boxed(name, Arc::new(middleware))
    }

    /// Registers an already shared layer under `name`.
    pub fn register_boxed(
        &mut self,
        name: impl Into<String>,
        middleware: BoxedMiddleware<S, U, E>,
    ) -> &mut Self {
        self.middleware.insert(name.into(), middleware);
        self
    }

    /// Registers a terminal under `name`, replacing any previous entry.
    pub fn register_terminal<T>(&mut self, name: impl Into<String>, terminal: T) -> &mut Self
    where
        T: Terminal<S, U, E>,
    {
        self.terminals.insert(name.into(), Arc::new(terminal));
        self
    }

    /// Looks up a layer.
    #[must_use]
    pub fn middleware(&self, name: &str) -> Option<BoxedMiddleware<S, U, E>> {
        self.middleware.get(name).cloned()
    }

    /// Looks up a terminal.
    #[must_use]
    pub fn terminal(&self, name: &str) -> Option<BoxedTerminal<S, U, E>> {
        self.terminals.get(name).cloned()
    }

    /// Returns the registered layer names, sorted.
    #[must_use]
    pub fn middleware_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.middleware.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Returns the registered terminal names, sorted.
    #[must_use]
    pub fn terminal_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.terminals.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl<S, U, E> Default for Registry<S, U, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, U, E> std::fmt::Debug for Registry<S, U, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("middleware", &self.middleware_names())
            .field("terminals", &self.terminal_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::Next;
    use crate::middleware::BoxFuture;

    struct Noop;

    impl Middleware<u8, u8> for Noop {
        fn name(&self) -> &'static str {
            "noop"
        }

        fn process<'a>(
            &'a self,
            _ctx: u8,
            next: Next<u8, u8>,
        ) -> BoxFuture<'a, anyhow::Result<Option<u8>>> {
            Box::pin(async move { next.run().await.map(Some) })
        }
    }

    #[test]
    fn test_register_and_lookup() {
        let mut registry: Registry<u8, u8> = Registry::new();
        registry.register("b", Noop).register("a", Noop);
        registry.register_terminal("done", |n: u8| async move { anyhow::Ok(n) });

        assert_eq!(registry.middleware_names(), vec!["a", "b"]);
        assert_eq!(registry.terminal_names(), vec!["done"]);
        assert!(registry.middleware("c").is_none());
        assert_eq!(registry.middleware("a").unwrap().name(), "noop");
    }

    #[test]
    fn test_register_replaces() {
        let mut registry: Registry<u8, u8> = Registry::default();
        registry.register("a", Noop);
        let first = registry.middleware("a").unwrap();
        registry.register("a", Noop);
        let second = registry.middleware("a").unwrap();

        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(registry.middleware_names().len(), 1);
    }
}
