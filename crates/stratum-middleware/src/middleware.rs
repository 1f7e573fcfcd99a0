//! Core middleware traits and types.
//!
//! This module defines the two callable shapes a chain is built from:
//!
//! - [`Middleware`] - receives the state and a [`Next`] continuation
//! - [`Terminal`] - receives the state only and ends the chain
//!
//! # Example
//!
//! ```
//! use stratum_middleware::{BoxFuture, Middleware, Next};
//!
//! struct Timing;
//!
//! impl Middleware<u32, String> for Timing {
//!     fn name(&self) -> &'static str {
//!         "timing"
//!     }
//!
//!     fn process<'a>(
//!         &'a self,
//!         ctx: u32,
//!         next: Next<u32, String>,
//!     ) -> BoxFuture<'a, anyhow::Result<Option<String>>> {
//!         Box::pin(async move {
//!             let started = std::time::Instant::now();
//!             let value = next.run().await?;
//!             tracing::debug!(ctx, elapsed = ?started.elapsed(), "downstream settled");
//!             Ok(Some(value))
//!         })
//!     }
//! }
//! ```

use crate::dispatch::Next;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// A boxed, sendable future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A type-erased middleware that can be stored in a chain.
pub type BoxedMiddleware<S, U, E = anyhow::Error> = Arc<dyn Middleware<S, U, E>>;

/// A type-erased terminal.
pub type BoxedTerminal<S, U, E = anyhow::Error> = Arc<dyn Terminal<S, U, E>>;

/// One layer of a composed chain.
///
/// A layer receives the state by value and a [`Next`] continuation. It may
/// post-process whatever the continuation resolves to, or answer on its own
/// without continuing.
///
/// # Invariants
///
/// - `next` MUST be run at most once
/// - The layer MUST return `Ok(Some(_))` or an error; `Ok(None)` means the
///   layer forgot to hand back a value and is rejected in strict mode
/// - Errors from downstream SHOULD be returned as they are
pub trait Middleware<S, U, E = anyhow::Error>: Send + Sync + 'static {
    /// Returns the name of this layer, used in logs and diagnostics.
    fn name(&self) -> &'static str;

    /// Runs this layer.
    ///
    /// # Arguments
    ///
    /// * `ctx` - The state as seen at this position
    /// * `next` - Continuation into the rest of the chain
    fn process<'a>(&'a self, ctx: S, next: Next<S, U, E>)
        -> BoxFuture<'a, Result<Option<U>, E>>;
}

/// The innermost function of a chain.
///
/// It has no continuation, and cannot return "no value" at the type level.
/// Any `Fn(S) -> impl Future<Output = Result<U, E>>` is a terminal.
pub trait Terminal<S, U, E = anyhow::Error>: Send + Sync + 'static {
    /// Returns the name of this terminal, used in logs and diagnostics.
    fn name(&self) -> &'static str {
        "done"
    }

    /// Ends the chain with the state it arrived with.
    fn call<'a>(&'a self, ctx: S) -> BoxFuture<'a, Result<U, E>>;
}

impl<S, U, E, F, Fut> Terminal<S, U, E> for F
where
    F: Fn(S) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<U, E>> + Send + 'static,
{
    fn call<'a>(&'a self, ctx: S) -> BoxFuture<'a, Result<U, E>> {
        Box::pin(self(ctx))
    }
}

/// A middleware that can be created from an async function.
///
/// # Example
///
/// ```
/// use stratum_middleware::{FnMiddleware, Next};
///
/// let layer = FnMiddleware::new("tag", |ctx: Vec<&'static str>, next: Next<Vec<&'static str>, usize>| async move {
///     let mut ctx = ctx;
///     ctx.push("tag");
///     next.run_with(ctx).await.map(Some)
/// });
/// # let _ = layer;
/// ```
pub struct FnMiddleware<F> {
    name: &'static str,
    func: F,
}

impl<F> FnMiddleware<F> {
    /// Creates a new function-based middleware.
    pub const fn new(name: &'static str, func: F) -> Self {
        Self { name, func }
    }
}

impl<S, U, E, F, Fut> Middleware<S, U, E> for FnMiddleware<F>
where
    F: Fn(S, Next<S, U, E>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Option<U>, E>> + Send + 'static,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn process<'a>(
        &'a self,
        ctx: S,
        next: Next<S, U, E>,
    ) -> BoxFuture<'a, Result<Option<U>, E>> {
        Box::pin((self.func)(ctx, next))
    }
}

impl<F> std::fmt::Debug for FnMiddleware<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnMiddleware")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
