//! # sct-inference
//!
//! Linear models for sctrends.
//!
//! This crate provides:
//! - OLS with heteroskedasticity-robust (HC0–HC3) covariance
//! - Absorption of any number of categorical fixed effects
//! - Model specifications built from named columns, with interactions
//! - Wald tests of linear restrictions
//! - The three published models and the release-effect test
//!
//! ## Architecture
//!
//! Designs are assembled through the `ColumnSource` trait from sct-core, so
//! this crate never depends on the tables in sct-data.

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Fixed-effect absorption and robust covariance.
pub mod econometrics;
/// Model specifications and formula parsing.
pub mod formula;
/// Wald tests.
pub mod hypothesis;
/// Models A, B and C.
pub mod models;
/// Least-squares fitting.
pub mod regression;

pub use econometrics::FixedEffectsSolver;
pub use formula::{ModelSpec, Term};
pub use hypothesis::{LinearHypothesis, Restriction, WaldTest, wald_test};
pub use models::{
    ModelOptions, ModelSet, fit_models, model_a, model_b, model_c, release_effect_test,
};
pub use regression::{DesignMatrix, FitLabels, INTERCEPT, absorbed_ols, ols};
