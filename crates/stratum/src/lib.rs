//! # Stratum
//!
//! Ordered asynchronous middleware composition.
//!
//! Stratum turns an ordered list of layers plus a terminal function into a
//! single reusable dispatcher that runs them as nested ("onion") layers.
//!
//! ## Quick Start
//!
//! ```
//! use stratum::prelude::*;
//!
//! # tokio_test::block_on(async {
//! let dispatcher = Composer::new(Mode::Strict)
//!     .layer(FnMiddleware::new("greet", |_name: String, next: Next<String, String>| async move {
//!         next.run().await.map(|body| Some(format!("hello {body}")))
//!     }))
//!     .build();
//!
//! let out = dispatcher
//!     .call("world".to_string(), |name: String| async move { anyhow::Ok(name) })
//!     .await
//!     .unwrap();
//! assert_eq!(out, "hello world");
//! # });
//! ```
//!
//! ## Architecture
//!
//! ```text
//! call(ctx, done) → layer 0 → layer 1 → … → layer N-1 → done
//!                                                          ↓
//! result          ← layer 0 ← layer 1 ← … ← layer N-1 ←───┘
//! ```
//!
//! | Crate | Role |
//! |---|---|
//! | [`core`] | modes and error types |
//! | [`middleware`] | traits, composition, strict and fast dispatch |
//! | [`config`] | typed TOML/JSON configuration of named chains |
//! | [`telemetry`] | log subscriber setup |
//!
//! [`Stack`] ties them together: it composes every configured chain once
//! and dispatches by chain name.

#![doc(html_root_url = "https://docs.rs/stratum/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod stack;

pub use error::StackError;
pub use stack::{init_logging, Stack};

// Re-export core types
pub use stratum_core as core;

// Re-export middleware types
pub use stratum_middleware as middleware;

// Re-export configuration types
pub use stratum_config as config;

// Re-export telemetry types
pub use stratum_telemetry as telemetry;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```
/// use stratum::prelude::*;
/// ```
pub mod prelude {
    pub use stratum_core::{ComposeError, DispatchError, Mode};

    pub use stratum_middleware::{
        compose, BoxFuture, BoxedMiddleware, BoxedTerminal, Composer, Dispatcher, Done,
        FnMiddleware, Middleware, Next, Registry, Terminal,
    };

    // Re-export environment-form types
    pub use stratum_middleware::{compose_env, EnvDispatcher, EnvMiddleware, EnvNext, FnEnvMiddleware};

    pub use stratum_config::{ConfigLoader, StratumConfig};

    pub use crate::{init_logging, Stack, StackError};
}
