//! Core traits for sctrends
//!
//! This module defines the seam between tabular data and model fitting:
//! regression specifications ask a [`ColumnSource`] for named columns and
//! never see the concrete row types that produced them.

use crate::Result;

/// Read-only columnar access to an analysis table.
///
/// Implementations return freshly materialized columns; callers may mutate
/// them (e.g. for demeaning) without affecting the source.
pub trait ColumnSource {
    /// Number of rows (observations).
    fn n_rows(&self) -> usize;

    /// Numeric column by name. Boolean columns are exposed as 0.0 / 1.0.
    fn numeric(&self, name: &str) -> Result<Vec<f64>>;

    /// Categorical column by name as dense 0-based level codes.
    fn categorical(&self, name: &str) -> Result<Vec<usize>>;
}
