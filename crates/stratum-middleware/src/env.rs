//! The environment (n-ary) form of composition.
//!
//! Instead of a single replaceable state, every layer of an environment
//! chain sees the same fixed set of values, captured once per invocation.
//! The set is one generic value `A`, usually a tuple or a small struct, so a
//! chain over `(Request, Response)` needs no per-arity machinery.
//!
//! Only the continuation varies from layer to layer, and it cannot replace
//! the environment. All strict-mode rules of [`Dispatcher`] apply, because
//! an [`EnvDispatcher`] is a thin adapter over one with `S = Arc<A>`.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use stratum_core::Mode;
//! use stratum_middleware::env::{compose_env, BoxedEnvMiddleware, EnvNext, FnEnvMiddleware};
//!
//! # tokio_test::block_on(async {
//! let greet = FnEnvMiddleware::new(
//!     "greet",
//!     |env: Arc<(&'static str, u8)>, next: EnvNext<(&'static str, u8), String>| async move {
//!         let inner = next.run().await;
//!         inner.map(|inner| Some(format!("{}: {inner}", env.0)))
//!     },
//! );
//! let layers: Vec<BoxedEnvMiddleware<(&'static str, u8), String>> = vec![Arc::new(greet)];
//! let dispatcher = compose_env(Mode::Strict, layers);
//!
//! let result = dispatcher
//!     .call(("hello", 3), |env: Arc<(&'static str, u8)>| async move {
//!         anyhow::Ok(env.1.to_string())
//!     })
//!     .await;
//! assert_eq!(result.unwrap(), "hello: 3");
//! # });
//! ```

use crate::dispatch::{Dispatcher, Next};
use crate::middleware::{BoxFuture, BoxedMiddleware, Middleware, Terminal};
use std::future::Future;
use std::sync::Arc;
use stratum_core::{DispatchError, Mode};

/// A type-erased environment layer.
pub type BoxedEnvMiddleware<A, U, E = anyhow::Error> = Arc<dyn EnvMiddleware<A, U, E>>;

/// One layer of an environment chain.
pub trait EnvMiddleware<A, U, E = anyhow::Error>: Send + Sync + 'static {
    /// Returns the name of this layer, used in logs and diagnostics.
    fn name(&self) -> &'static str;

    /// Runs this layer against the shared environment.
    fn process<'a>(&'a self, env: Arc<A>, next: EnvNext<A, U, E>)
        -> BoxFuture<'a, Result<Option<U>, E>>;
}

/// Continuation of an environment chain. It carries no replacement state.
pub struct EnvNext<A, U, E = anyhow::Error> {
    inner: Next<Arc<A>, U, E>,
}

impl<A, U, E> Clone for EnvNext<A, U, E> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<A, U, E> std::fmt::Debug for EnvNext<A, U, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("EnvNext").field(&self.inner).finish()
    }
}

impl<A, U, E> EnvNext<A, U, E>
where
    A: Send + Sync + 'static,
    U: Send + 'static,
    E: From<DispatchError> + Send + 'static,
{
    /// Continues into the rest of the chain.
    pub fn run(&self) -> BoxFuture<'static, Result<U, E>> {
        self.inner.run()
    }

    /// Returns the position of the layer that owns this continuation.
    #[must_use]
    pub fn position(&self) -> usize {
        self.inner.position()
    }
}

/// An environment layer created from an async function.
pub struct FnEnvMiddleware<F> {
    name: &'static str,
    func: F,
}

impl<F> FnEnvMiddleware<F> {
    /// Creates a new function-based environment layer.
    pub const fn new(name: &'static str, func: F) -> Self {
        Self { name, func }
    }
}

impl<A, U, E, F, Fut> EnvMiddleware<A, U, E> for FnEnvMiddleware<F>
where
    F: Fn(Arc<A>, EnvNext<A, U, E>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Option<U>, E>> + Send + 'static,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn process<'a>(
        &'a self,
        env: Arc<A>,
        next: EnvNext<A, U, E>,
    ) -> BoxFuture<'a, Result<Option<U>, E>> {
        Box::pin((self.func)(env, next))
    }
}

/// Adapts an environment layer to the core engine.
struct EnvLayer<A, U, E> {
    inner: BoxedEnvMiddleware<A, U, E>,
}

impl<A, U, E> Middleware<Arc<A>, U, E> for EnvLayer<A, U, E>
where
    A: Send + Sync + 'static,
    U: Send + 'static,
    E: From<DispatchError> + Send + 'static,
{
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    fn process<'a>(
        &'a self,
        ctx: Arc<A>,
        next: Next<Arc<A>, U, E>,
    ) -> BoxFuture<'a, Result<Option<U>, E>> {
        self.inner.process(ctx, EnvNext { inner: next })
    }
}

/// The composed form of an environment chain.
pub struct EnvDispatcher<A, U, E = anyhow::Error> {
    inner: Dispatcher<Arc<A>, U, E>,
}

impl<A, U, E> Clone for EnvDispatcher<A, U, E> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<A, U, E> std::fmt::Debug for EnvDispatcher<A, U, E>
where
    A: 'static,
    U: 'static,
    E: 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("EnvDispatcher").field(&self.inner).finish()
    }
}

impl<A, U, E> EnvDispatcher<A, U, E>
where
    A: Send + Sync + 'static,
    U: Send + 'static,
    E: From<DispatchError> + Send + 'static,
{
    /// Runs the chain with `args` as the shared environment, ending in `done`.
    pub fn call<T>(&self, args: A, done: T) -> BoxFuture<'static, Result<U, E>>
    where
        T: Terminal<Arc<A>, U, E>,
    {
        self.inner.call(Arc::new(args), done)
    }

    /// Returns the mode this dispatcher was composed with.
    #[must_use]
    pub fn mode(&self) -> Mode {
        self.inner.mode()
    }

    /// Returns the number of layers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns true if the dispatcher has no layers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns the names of all layers in order.
    #[must_use]
    pub fn layer_names(&self) -> Vec<&'static str> {
        self.inner.layer_names()
    }
}

/// A composed environment chain is itself an environment layer.
impl<A, U, E> EnvMiddleware<A, U, E> for EnvDispatcher<A, U, E>
where
    A: Send + Sync + 'static,
    U: Send + 'static,
    E: From<DispatchError> + Send + 'static,
{
    fn name(&self) -> &'static str {
        "env_dispatcher"
    }

    fn process<'a>(
        &'a self,
        env: Arc<A>,
        next: EnvNext<A, U, E>,
    ) -> BoxFuture<'a, Result<Option<U>, E>> {
        let walk = self.inner.call(env, next.inner);
        Box::pin(async move { walk.await.map(Some) })
    }
}

/// Composes an ordered list of environment layers.
pub fn compose_env<A, U, E>(
    mode: Mode,
    layers: Vec<BoxedEnvMiddleware<A, U, E>>,
) -> EnvDispatcher<A, U, E>
where
    A: Send + Sync + 'static,
    U: Send + 'static,
    E: From<DispatchError> + Send + 'static,
{
    let layers = layers
        .into_iter()
        .map(|inner| Arc::new(EnvLayer { inner }) as BoxedMiddleware<Arc<A>, U, E>)
        .collect();
    EnvDispatcher {
        inner: crate::compose::compose(mode, layers),
    }
}
