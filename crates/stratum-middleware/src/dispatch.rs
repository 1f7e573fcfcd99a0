//! The composed dispatcher and its continuation.
//!
//! A [`Dispatcher`] owns an immutable list of layers. Each call walks that
//! list front to back, one position per [`Next::run`], and unwinds back to
//! front as every layer's future settles:
//!
//! ```text
//! call(ctx, done)
//!   → layer 0 → layer 1 → … → layer N-1 → done
//!   ← layer 0 ← layer 1 ← … ← layer N-1 ←──┘
//! ```
//!
//! ## Strict and fast walks
//!
//! Both walks produce the same result for a well-formed chain. The strict
//! walk additionally keeps a per-invocation record and rejects misuse with a
//! [`DispatchError`]:
//!
//! | Guard | Error |
//! |---|---|
//! | a continuation is run twice | [`DispatchError::NextCalledTwice`] |
//! | a layer-shaped terminal continues | [`DispatchError::TerminalOverrun`] |
//! | a layer returns `Ok(None)` | [`DispatchError::NoValue`] |
//!
//! The fast walk keeps none of this. Running a continuation twice re-runs the
//! rest of the chain. A layer-shaped terminal that continues re-enters itself
//! without end: the walk overflows the stack and the process aborts.
//!
//! ## Depth
//!
//! Polling a chain descends one boxed future per position, so stack use
//! grows linearly with chain length in both walks. Chains thousands of layers
//! deep need a thread stack sized for them.

use crate::middleware::{BoxFuture, BoxedMiddleware, BoxedTerminal, Middleware, Terminal};
use crate::registry::Registry;
use std::future;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use stratum_core::{DispatchError, Mode};
use tracing::{debug, trace, warn};

static INVOCATION_IDS: AtomicU64 = AtomicU64::new(1);

/// The composed, reusable callable produced by composition.
///
/// A dispatcher is stateless between calls. Cloning it is cheap and every
/// clone shares the same immutable layer list, so independent calls can run
/// concurrently without interfering.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use stratum_core::Mode;
/// use stratum_middleware::{compose, BoxedMiddleware, FnMiddleware, Next};
///
/// # tokio_test::block_on(async {
/// let double = FnMiddleware::new("double", |n: u32, next: Next<u32, u32>| async move {
///     next.run_with(n * 2).await.map(Some)
/// });
/// let layers: Vec<BoxedMiddleware<u32, u32>> = vec![Arc::new(double)];
/// let dispatcher = compose(Mode::Strict, layers);
///
/// let result = dispatcher.call(21, |n: u32| async move { anyhow::Ok(n) }).await;
/// assert_eq!(result.unwrap(), 42);
/// # });
/// ```
pub struct Dispatcher<S, U, E = anyhow::Error> {
    mode: Mode,
    layers: Arc<[BoxedMiddleware<S, U, E>]>,
}

impl<S, U, E> Clone for Dispatcher<S, U, E> {
    fn clone(&self) -> Self {
        Self {
            mode: self.mode,
            layers: Arc::clone(&self.layers),
        }
    }
}

impl<S, U, E> std::fmt::Debug for Dispatcher<S, U, E>
where
    S: 'static,
    U: 'static,
    E: 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("mode", &self.mode)
            .field("layers", &self.layers.iter().map(|l| l.name()).collect::<Vec<_>>())
            .finish()
    }
}

impl<S, U, E> Dispatcher<S, U, E>
where
    S: Clone + Send + Sync + 'static,
    U: Send + 'static,
    E: From<DispatchError> + Send + 'static,
{
    pub(crate) fn new(mode: Mode, layers: Vec<BoxedMiddleware<S, U, E>>) -> Self {
        debug!(mode = %mode, layers = layers.len(), "Composed dispatcher");
        Self {
            mode,
            layers: layers.into(),
        }
    }

    /// Returns the mode this dispatcher was composed with.
    #[must_use]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Returns the number of layers, not counting the terminal.
    #[must_use]
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Returns true if the dispatcher has no layers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Returns the names of all layers in order.
    #[must_use]
    pub fn layer_names(&self) -> Vec<&'static str> {
        self.layers.iter().map(|layer| layer.name()).collect()
    }

    /// Runs the chain for one state, ending in `done`.
    pub fn call<T>(&self, ctx: S, done: T) -> BoxFuture<'static, Result<U, E>>
    where
        T: Terminal<S, U, E>,
    {
        self.call_done(ctx, Done::new(done))
    }

    /// Runs the chain for one state, ending in an already-built [`Done`].
    pub fn call_done(&self, ctx: S, done: Done<S, U, E>) -> BoxFuture<'static, Result<U, E>> {
        if !self.mode.is_strict() {
            let chain = Arc::new(Chain {
                layers: Arc::clone(&self.layers),
                done,
                invocation: None,
            });
            return fast_dispatch(chain, 0, ctx);
        }

        let invocation = Arc::new(Invocation::new());
        let chain = Arc::new(Chain {
            layers: Arc::clone(&self.layers),
            done,
            invocation: Some(Arc::clone(&invocation)),
        });

        debug!(
            invocation_id = invocation.id,
            layers = chain.layers.len(),
            terminal = chain.done.name(),
            "Dispatch started"
        );

        let walk = strict_dispatch(chain, invocation.clone(), 0, ctx);
        Box::pin(async move {
            let result = walk.await;
            debug!(
                invocation_id = invocation.id,
                cursor = invocation.cursor(),
                outcome = if result.is_ok() { "ok" } else { "error" },
                "Dispatch settled"
            );
            result
        })
    }

    /// Runs the chain, ending in a terminal registered under `name`.
    ///
    /// An unknown name fails immediately, before any layer runs.
    pub fn call_named(
        &self,
        ctx: S,
        registry: &Registry<S, U, E>,
        name: &str,
    ) -> Result<BoxFuture<'static, Result<U, E>>, DispatchError> {
        let Some(terminal) = registry.terminal(name) else {
            let err = DispatchError::missing_terminal(name);
            warn!(kind = err.kind(), terminal = name, "Terminal lookup failed");
            return Err(err);
        };
        Ok(self.call_done(ctx, Done::Terminal(terminal)))
    }
}

/// A composed dispatcher is itself a layer.
///
/// The nested chain ends in the outer continuation, which receives the state
/// as the nested chain left it. Using a dispatcher as a layer behaves like
/// splicing its layers in at that position.
impl<S, U, E> Middleware<S, U, E> for Dispatcher<S, U, E>
where
    S: Clone + Send + Sync + 'static,
    U: Send + 'static,
    E: From<DispatchError> + Send + 'static,
{
    fn name(&self) -> &'static str {
        "dispatcher"
    }

    fn process<'a>(
        &'a self,
        ctx: S,
        next: Next<S, U, E>,
    ) -> BoxFuture<'a, Result<Option<U>, E>> {
        let walk = self.call(ctx, next);
        Box::pin(async move { walk.await.map(Some) })
    }
}

/// The terminal of one invocation, at virtual position N.
pub enum Done<S, U, E = anyhow::Error> {
    /// A plain terminal with no continuation.
    Terminal(BoxedTerminal<S, U, E>),
    /// A layer-shaped terminal. It receives a continuation it must never run.
    Layer(BoxedMiddleware<S, U, E>),
}

impl<S, U, E> Done<S, U, E>
where
    S: 'static,
    U: 'static,
    E: 'static,
{
    /// Wraps a plain terminal.
    pub fn new<T>(terminal: T) -> Self
    where
        T: Terminal<S, U, E>,
    {
        Self::Terminal(Arc::new(terminal))
    }

    /// Wraps a layer-shaped terminal.
    ///
    /// In strict mode running its continuation fails with
    /// [`DispatchError::TerminalOverrun`]. In fast mode it re-enters the
    /// terminal until the stack overflows and the process aborts.
    pub fn layer<M>(middleware: M) -> Self
    where
        M: Middleware<S, U, E>,
    {
        Self::Layer(Arc::new(middleware))
    }

    /// Returns the name of the wrapped callable.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Terminal(terminal) => terminal.name(),
            Self::Layer(layer) => layer.name(),
        }
    }
}

impl<S, U, E> Clone for Done<S, U, E> {
    fn clone(&self) -> Self {
        match self {
            Self::Terminal(terminal) => Self::Terminal(Arc::clone(terminal)),
            Self::Layer(layer) => Self::Layer(Arc::clone(layer)),
        }
    }
}

/// Per-invocation record, strict mode only.
#[derive(Debug)]
struct Invocation {
    id: u64,
    /// Highest position entered so far. Only ever increases.
    cursor: AtomicUsize,
}

impl Invocation {
    fn new() -> Self {
        Self {
            id: INVOCATION_IDS.fetch_add(1, Ordering::Relaxed),
            cursor: AtomicUsize::new(0),
        }
    }

    fn enter(&self, position: usize) {
        self.cursor.fetch_max(position, Ordering::AcqRel);
    }

    fn cursor(&self) -> usize {
        self.cursor.load(Ordering::Acquire)
    }
}

/// Everything one invocation needs, shared by all of its continuations.
struct Chain<S, U, E> {
    layers: Arc<[BoxedMiddleware<S, U, E>]>,
    done: Done<S, U, E>,
    invocation: Option<Arc<Invocation>>,
}

/// Continuation into the rest of the chain.
///
/// A `Next` is scoped to one position of one invocation. Running it advances
/// to the following position and resolves once everything downstream,
/// including the terminal, has settled.
///
/// `Next` is cheap to clone. All clones share one "already run" flag, so in
/// strict mode the continuation of a position can be run once in total.
pub struct Next<S, U, E = anyhow::Error> {
    chain: Arc<Chain<S, U, E>>,
    position: usize,
    ctx: S,
    fired: Option<Arc<AtomicBool>>,
}

impl<S: Clone, U, E> Clone for Next<S, U, E> {
    fn clone(&self) -> Self {
        Self {
            chain: Arc::clone(&self.chain),
            position: self.position,
            ctx: self.ctx.clone(),
            fired: self.fired.clone(),
        }
    }
}

impl<S, U, E> std::fmt::Debug for Next<S, U, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Next")
            .field("position", &self.position)
            .field("strict", &self.fired.is_some())
            .finish_non_exhaustive()
    }
}

impl<S, U, E> Next<S, U, E>
where
    S: Clone + Send + Sync + 'static,
    U: Send + 'static,
    E: From<DispatchError> + Send + 'static,
{
    fn new(chain: Arc<Chain<S, U, E>>, position: usize, ctx: S) -> Self {
        let fired = chain
            .invocation
            .as_ref()
            .map(|_| Arc::new(AtomicBool::new(false)));
        Self {
            chain,
            position,
            ctx,
            fired,
        }
    }

    /// Returns the position of the layer that owns this continuation.
    #[must_use]
    pub fn position(&self) -> usize {
        self.position
    }

    /// Continues with the state this layer received.
    pub fn run(&self) -> BoxFuture<'static, Result<U, E>> {
        self.advance(self.ctx.clone())
    }

    /// Continues with a replacement state.
    ///
    /// Only positions below this one observe `ctx`. The calling layer keeps
    /// the state it was given.
    pub fn run_with(&self, ctx: S) -> BoxFuture<'static, Result<U, E>> {
        if let Some(invocation) = &self.chain.invocation {
            trace!(
                invocation_id = invocation.id,
                position = self.position,
                "Continuing with replacement state"
            );
        }
        self.advance(ctx)
    }

    fn advance(&self, ctx: S) -> BoxFuture<'static, Result<U, E>> {
        let next_position = self.position + 1;
        let (Some(fired), Some(invocation)) = (&self.fired, &self.chain.invocation) else {
            return fast_dispatch(Arc::clone(&self.chain), next_position, ctx);
        };

        if fired.swap(true, Ordering::AcqRel) {
            let err = DispatchError::next_called_twice(self.position);
            warn!(
                invocation_id = invocation.id,
                kind = err.kind(),
                position = self.position,
                "Continuation invoked more than once"
            );
            return Box::pin(future::ready(Err(E::from(err))));
        }

        strict_dispatch(
            Arc::clone(&self.chain),
            Arc::clone(invocation),
            next_position,
            ctx,
        )
    }
}

/// A continuation can terminate a nested chain.
impl<S, U, E> Terminal<S, U, E> for Next<S, U, E>
where
    S: Clone + Send + Sync + 'static,
    U: Send + 'static,
    E: From<DispatchError> + Send + 'static,
{
    fn name(&self) -> &'static str {
        "next"
    }

    fn call<'a>(&'a self, ctx: S) -> BoxFuture<'a, Result<U, E>> {
        self.run_with(ctx)
    }
}

fn strict_dispatch<S, U, E>(
    chain: Arc<Chain<S, U, E>>,
    invocation: Arc<Invocation>,
    position: usize,
    ctx: S,
) -> BoxFuture<'static, Result<U, E>>
where
    S: Clone + Send + Sync + 'static,
    U: Send + 'static,
    E: From<DispatchError> + Send + 'static,
{
    let len = chain.layers.len();
    if position > len {
        let err = DispatchError::terminal_overrun(position);
        warn!(
            invocation_id = invocation.id,
            kind = err.kind(),
            position,
            "Terminal attempted to continue"
        );
        return Box::pin(future::ready(Err(E::from(err))));
    }

    invocation.enter(position);

    let name = match chain.layers.get(position) {
        Some(layer) => {
            trace!(invocation_id = invocation.id, position, layer = layer.name(), "Entering layer");
            layer.name()
        }
        None => {
            let name = chain.done.name();
            trace!(invocation_id = invocation.id, position, terminal = name, "Entering terminal");
            name
        }
    };

    // Only the boxed step is held across the await. Deep chains poll through
    // one of these frames per position.
    Box::pin(async move {
        let outcome = step(&chain, position, ctx).await;
        settle(&invocation, position, name, outcome)
    })
}

fn fast_dispatch<S, U, E>(
    chain: Arc<Chain<S, U, E>>,
    position: usize,
    ctx: S,
) -> BoxFuture<'static, Result<U, E>>
where
    S: Clone + Send + Sync + 'static,
    U: Send + 'static,
    E: From<DispatchError> + Send + 'static,
{
    Box::pin(async move {
        step(&chain, position, ctx)
            .await?
            .ok_or_else(|| E::from(DispatchError::no_value_unchecked()))
    })
}

/// Starts the callable at `position`, handing layers their continuation.
fn step<'a, S, U, E>(
    chain: &'a Arc<Chain<S, U, E>>,
    position: usize,
    ctx: S,
) -> BoxFuture<'a, Result<Option<U>, E>>
where
    S: Clone + Send + Sync + 'static,
    U: Send + 'static,
    E: From<DispatchError> + Send + 'static,
{
    let layer = match chain.layers.get(position) {
        Some(layer) => layer,
        None => match &chain.done {
            Done::Layer(layer) => layer,
            Done::Terminal(terminal) => {
                let call = terminal.call(ctx);
                return Box::pin(async move { call.await.map(Some) });
            }
        },
    };
    let next = Next::new(Arc::clone(chain), position, ctx.clone());
    layer.process(ctx, next)
}

/// Checks a settled position in strict mode.
#[inline(never)]
fn settle<U, E>(
    invocation: &Invocation,
    position: usize,
    name: &'static str,
    outcome: Result<Option<U>, E>,
) -> Result<U, E>
where
    E: From<DispatchError>,
{
    trace!(
        invocation_id = invocation.id,
        position,
        layer = name,
        ok = outcome.is_ok(),
        "Leaving layer"
    );

    match outcome {
        Ok(Some(value)) => Ok(value),
        Ok(None) => {
            let err = DispatchError::no_value(position, name);
            warn!(
                invocation_id = invocation.id,
                kind = err.kind(),
                position,
                layer = name,
                "Layer returned no value"
            );
            Err(E::from(err))
        }
        Err(err) => Err(err),
    }
}
