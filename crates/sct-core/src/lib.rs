//! # sct-core
//!
//! Shared foundation for sctrends.
//!
//! This crate provides:
//! - the workspace-wide [`Error`] / [`Result`] types,
//! - the [`ColumnSource`] seam between tabular data and model fitting,
//! - serializable fit results ([`RegressionFit`], [`Coefficient`]).
//!
//! ## Architecture
//!
//! `sct-inference` builds design matrices through [`ColumnSource`] and never
//! depends on the concrete tables in `sct-data`.

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Error types.
pub mod error;
/// Core traits.
pub mod traits;
/// Fit result types.
pub mod types;

pub use error::{Error, Result};
pub use traits::ColumnSource;
pub use types::{Coefficient, CovarianceType, RegressionFit};

/// Crate version, shared by the CLI and serialized results.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
