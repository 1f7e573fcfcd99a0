//! # Stratum Middleware
//!
//! Ordered asynchronous middleware composition.
//!
//! Given an ordered list of layers and a terminal function, this crate
//! produces a single reusable [`Dispatcher`] that runs them as nested
//! ("onion") layers. Every layer can inspect or replace the state, await the
//! rest of the chain, and post-process the result on its way back up.
//!
//! ```text
//! call(ctx, done) → A → B → C → done
//!                                 ↓
//! result         ← A ← B ← C ←────┘
//! ```
//!
//! ## Key Features
//!
//! - **Strict or fast**: the [`Mode`] chosen at composition decides whether
//!   structural misuse is diagnosed or skipped for throughput
//! - **Context replacement**: [`Next::run_with`] hands a new state to the
//!   layers below without affecting the caller's own copy
//! - **Composable**: a [`Dispatcher`] is itself a [`Middleware`], so chains nest
//! - **Environment form**: [`env`] threads one fixed environment through every
//!   layer for n-ary style chains
//! - **Declarative chains**: [`Composer::from_value`] builds a chain from
//!   registered names
//!
//! ## Example
//!
//! ```
//! use stratum_core::Mode;
//! use stratum_middleware::{Composer, FnMiddleware, Next};
//!
//! # tokio_test::block_on(async {
//! let dispatcher = Composer::new(Mode::Strict)
//!     .layer(FnMiddleware::new("trim", |s: String, next: Next<String, usize>| async move {
//!         next.run_with(s.trim().to_string()).await.map(Some)
//!     }))
//!     .build();
//!
//! let len = dispatcher
//!     .call("  onion  ".to_string(), |s: String| async move { anyhow::Ok(s.len()) })
//!     .await
//!     .unwrap();
//! assert_eq!(len, 5);
//! # });
//! ```

#![doc(html_root_url = "https://docs.rs/stratum-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod compose;
pub mod dispatch;
pub mod env;
pub mod middleware;
pub mod registry;

// Re-export main types at crate root
pub use compose::{compose, Composer};
pub use dispatch::{Dispatcher, Done, Next};
pub use env::{compose_env, EnvDispatcher, EnvMiddleware, EnvNext, FnEnvMiddleware};
pub use middleware::{BoxFuture, BoxedMiddleware, BoxedTerminal, FnMiddleware, Middleware, Terminal};
pub use registry::Registry;
pub use stratum_core::{ComposeError, DispatchError, Mode};
