//! # Stratum Core
//!
//! Core types shared by every Stratum crate.
//!
//! This crate provides:
//!
//! - [`Mode`] - Selects the strict (guarded) or fast (unguarded) dispatcher
//! - [`ComposeError`] - Failures raised while building a dispatcher
//! - [`DispatchError`] - Structural violations raised while running one
//!
//! Business failures raised by middleware never pass through these types.
//! They travel through the dispatcher unchanged as the caller's own error
//! type, which only needs to implement `From<DispatchError>`.

#![doc(html_root_url = "https://docs.rs/stratum-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod mode;

pub use error::{ComposeError, ComposeResult, DispatchError};
pub use mode::Mode;
