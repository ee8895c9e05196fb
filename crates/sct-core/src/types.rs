//! Common result types for sctrends

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// Heteroskedasticity-consistent covariance estimator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum CovarianceType {
    /// White (1980): ω_i = e_i².
    HC0,
    /// HC0 scaled by n / (n − k).
    HC1,
    /// ω_i = e_i² / (1 − h_i).
    #[default]
    HC2,
    /// ω_i = e_i² / (1 − h_i)².
    HC3,
}

impl CovarianceType {
    /// Whether the estimator needs observation leverages.
    pub fn needs_leverage(self) -> bool {
        matches!(self, Self::HC2 | Self::HC3)
    }
}

impl fmt::Display for CovarianceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::HC0 => "HC0",
            Self::HC1 => "HC1",
            Self::HC2 => "HC2",
            Self::HC3 => "HC3",
        };
        f.write_str(s)
    }
}

impl FromStr for CovarianceType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "HC0" => Ok(Self::HC0),
            "HC1" => Ok(Self::HC1),
            "HC2" => Ok(Self::HC2),
            "HC3" => Ok(Self::HC3),
            other => Err(Error::Validation(format!(
                "unknown covariance type '{other}' (expected HC0, HC1, HC2 or HC3)"
            ))),
        }
    }
}

/// One row of a coefficient table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Coefficient {
    /// Term name, e.g. `after_release:is_high_earning`.
    pub term: String,
    /// Point estimate.
    pub estimate: f64,
    /// Robust standard error.
    pub std_error: f64,
    /// Classical (homoskedastic) standard error.
    pub std_error_ols: f64,
    /// `estimate / std_error`.
    pub t_stat: f64,
    /// Two-sided p-value from Student-t with the residual df.
    pub p_value: f64,
    /// 95% CI lower bound.
    pub ci_lower: f64,
    /// 95% CI upper bound.
    pub ci_upper: f64,
}

/// Fitted linear model with robust inference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegressionFit {
    /// Short label (e.g. `Model A`).
    pub label: String,
    /// Response column.
    pub response: String,
    /// Coefficients in design order.
    pub coefficients: Vec<Coefficient>,
    /// Robust covariance matrix (row-major, k×k).
    pub covariance: Vec<f64>,
    /// Estimator used for `covariance`.
    pub covariance_type: CovarianceType,
    /// Absorbed fixed-effect dimensions (empty for plain OLS).
    pub absorbed: Vec<String>,
    /// Degrees of freedom consumed by absorbed fixed effects (incl. intercept).
    pub df_absorbed: usize,
    /// Number of observations.
    pub n_obs: usize,
    /// Residual degrees of freedom.
    pub df_resid: usize,
    /// Residual sum of squares.
    pub rss: f64,
    /// R² (within R² when fixed effects are absorbed).
    pub r_squared: f64,
    /// Adjusted R².
    pub adj_r_squared: f64,
}

impl RegressionFit {
    /// Number of estimated (non-absorbed) coefficients.
    pub fn n_coefficients(&self) -> usize {
        self.coefficients.len()
    }

    /// Position of a term in the coefficient vector.
    pub fn index_of(&self, term: &str) -> Option<usize> {
        self.coefficients.iter().position(|c| c.term == term)
    }

    /// Coefficient by term name.
    pub fn coefficient(&self, term: &str) -> Option<&Coefficient> {
        self.coefficients.iter().find(|c| c.term == term)
    }

    /// Point estimates in design order.
    pub fn estimates(&self) -> Vec<f64> {
        self.coefficients.iter().map(|c| c.estimate).collect()
    }

    /// Covariance element (i, j). Returns `None` when out of range.
    pub fn covariance_at(&self, i: usize, j: usize) -> Option<f64> {
        let k = self.coefficients.len();
        if i >= k || j >= k {
            return None;
        }
        self.covariance.get(i * k + j).copied()
    }
}
