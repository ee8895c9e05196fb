//! Econometric building blocks.
//!
//! - **Fixed-effect absorption** by alternating projections, with exact
//!   absorbed degrees of freedom for one and two dimensions.
//! - **Robust covariance**: HC0–HC3 sandwich estimators and leverages.

pub mod hdfe;
pub mod robust;

pub use hdfe::FixedEffectsSolver;
pub use robust::{leverages, robust_covariance};
