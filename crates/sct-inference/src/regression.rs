//! Least-squares fitting with classical and robust inference.
//!
//! Both entry points solve the normal equations `(X'X) β = X'y` with
//! `nalgebra`, then attach a sandwich covariance, Student-t p-values and
//! 95% confidence intervals. [`absorbed_ols`] first sweeps the fixed effects
//! out of `X` and `y` with [`FixedEffectsSolver`] and fits on the residuals.

use nalgebra::{DMatrix, DVector};
use sct_core::{Coefficient, CovarianceType, Error, RegressionFit, Result};
use statrs::distribution::{ContinuousCDF, StudentsT};

use crate::econometrics::hdfe::FixedEffectsSolver;
use crate::econometrics::robust::{leverages, robust_covariance};

/// Name of the intercept term.
pub const INTERCEPT: &str = "(Intercept)";

/// Smallest eigenvalue ratio of `X'X` accepted as full rank.
const RANK_TOL: f64 = 1e-12;

#[inline]
fn validate_xy_dims(n: usize, k: usize, x_len: usize, y_len: usize) -> Result<()> {
    if n == 0 {
        return Err(Error::Validation("X/y must be non-empty".to_string()));
    }
    if k == 0 {
        return Err(Error::Validation("X must have at least 1 column".to_string()));
    }
    if x_len != n * k {
        return Err(Error::Validation(format!(
            "X has wrong length: expected n*k={}, got {}",
            n * k,
            x_len
        )));
    }
    if y_len != n {
        return Err(Error::Validation(format!(
            "y has wrong length: expected n={}, got {}",
            n, y_len
        )));
    }
    Ok(())
}

/// Dense row-major design matrix with named columns.
#[derive(Debug, Clone)]
pub struct DesignMatrix {
    n: usize,
    names: Vec<String>,
    data: Vec<f64>,
}

impl DesignMatrix {
    /// Assemble from named columns of equal length.
    pub fn from_columns(columns: Vec<(String, Vec<f64>)>) -> Result<Self> {
        let n = columns.first().map_or(0, |(_, c)| c.len());
        let k = columns.len();
        if n == 0 || k == 0 {
            return Err(Error::Validation("design must be non-empty (n>0, k>0)".to_string()));
        }
        for (name, col) in &columns {
            if col.len() != n {
                return Err(Error::Validation(format!(
                    "column '{}' has {} rows, expected {}",
                    name,
                    col.len(),
                    n
                )));
            }
            if col.iter().any(|v| !v.is_finite()) {
                return Err(Error::Validation(format!(
                    "column '{name}' must contain only finite values"
                )));
            }
        }

        let mut data = vec![0.0; n * k];
        for (j, (_, col)) in columns.iter().enumerate() {
            for (i, v) in col.iter().enumerate() {
                data[i * k + j] = *v;
            }
        }
        let names = columns.into_iter().map(|(name, _)| name).collect();
        Ok(Self { n, names, data })
    }

    /// Observations.
    pub fn n_rows(&self) -> usize {
        self.n
    }

    /// Columns.
    pub fn n_cols(&self) -> usize {
        self.names.len()
    }

    /// Column names in order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Column `j` as an owned vector.
    pub fn column(&self, j: usize) -> Vec<f64> {
        let k = self.n_cols();
        (0..self.n).map(|i| self.data[i * k + j]).collect()
    }

    fn to_matrix(&self) -> DMatrix<f64> {
        DMatrix::from_row_slice(self.n, self.n_cols(), &self.data)
    }
}

/// Labels carried into the fitted result.
#[derive(Debug, Clone, Copy)]
pub struct FitLabels<'a> {
    /// Model label.
    pub label: &'a str,
    /// Response column name.
    pub response: &'a str,
}

/// Plain OLS. Include an intercept column in `x` if one is wanted.
pub fn ols(
    labels: FitLabels<'_>,
    x: &DesignMatrix,
    y: &[f64],
    cov_type: CovarianceType,
) -> Result<RegressionFit> {
    validate_xy_dims(x.n_rows(), x.n_cols(), x.data.len(), y.len())?;
    let has_intercept = x.names.iter().any(|n| n == INTERCEPT);
    let y = DVector::from_column_slice(y);
    fit_normal_equations(labels, x.names.clone(), x.to_matrix(), y, cov_type, None, has_intercept)
}

/// OLS after absorbing categorical fixed effects. `x` must not contain an intercept.
///
/// `absorb` pairs each fixed-effect name with its level codes.
pub fn absorbed_ols(
    labels: FitLabels<'_>,
    x: &DesignMatrix,
    y: &[f64],
    absorb: Vec<(String, Vec<usize>)>,
    cov_type: CovarianceType,
) -> Result<RegressionFit> {
    validate_xy_dims(x.n_rows(), x.n_cols(), x.data.len(), y.len())?;
    if x.names.iter().any(|n| n == INTERCEPT) {
        return Err(Error::Validation(
            "an intercept cannot be combined with absorbed fixed effects".into(),
        ));
    }
    if cov_type.needs_leverage() && absorb.len() > 1 {
        return Err(Error::NotImplemented(format!(
            "{} covariance with {} absorbed fixed effects (use HC0 or HC1)",
            cov_type,
            absorb.len()
        )));
    }

    let (names, groups): (Vec<String>, Vec<Vec<usize>>) = absorb.into_iter().unzip();
    let solver = FixedEffectsSolver::new(groups)?;
    for (name, levels) in names.iter().zip(solver.levels()) {
        if levels < 2 {
            return Err(Error::Validation(format!(
                "fixed effect '{name}' has {levels} level(s); at least two are required"
            )));
        }
    }

    let y_dm = solver.partial_out(y)?;
    let n = x.n_rows();
    let k = x.n_cols();
    let cols: Vec<Vec<f64>> = (0..k).map(|j| x.column(j)).collect();
    let demeaned = solver.partial_out_many(&cols)?;
    let mut x_dm = DMatrix::zeros(n, k);
    for (j, (col, dm)) in cols.iter().zip(demeaned).enumerate() {
        let scale = col.iter().map(|v| v.abs()).fold(0.0, f64::max);
        let remaining = dm.iter().map(|v| v.abs()).fold(0.0, f64::max);
        if remaining <= 1e-10 * scale.max(1.0) {
            return Err(Error::Computation(format!(
                "term '{}' is collinear with the absorbed fixed effects ({})",
                x.names[j],
                names.join(", ")
            )));
        }
        for (i, v) in dm.into_iter().enumerate() {
            x_dm[(i, j)] = v;
        }
    }

    tracing::debug!(
        label = labels.label,
        absorbed = ?names,
        levels = ?solver.levels(),
        df_absorbed = solver.degrees_of_freedom_absorbed(),
        "fixed effects absorbed"
    );

    let fe = Absorbed { names, solver: &solver };
    fit_normal_equations(
        labels,
        x.names.clone(),
        x_dm,
        DVector::from_vec(y_dm),
        cov_type,
        Some(fe),
        false,
    )
}

struct Absorbed<'a> {
    names: Vec<String>,
    solver: &'a FixedEffectsSolver,
}

fn check_full_rank(xtx: &DMatrix<f64>, names: &[String]) -> Result<()> {
    let eig = xtx.clone().symmetric_eigen().eigenvalues;
    let max = eig.iter().copied().fold(0.0, f64::max);
    let min = eig.iter().copied().fold(f64::INFINITY, f64::min);
    if max.is_nan() || max <= 0.0 || min <= RANK_TOL * max {
        return Err(Error::Computation(format!(
            "design matrix is rank deficient (terms: {})",
            names.join(", ")
        )));
    }
    Ok(())
}

fn fit_normal_equations(
    labels: FitLabels<'_>,
    names: Vec<String>,
    x: DMatrix<f64>,
    y: DVector<f64>,
    cov_type: CovarianceType,
    absorbed: Option<Absorbed<'_>>,
    has_intercept: bool,
) -> Result<RegressionFit> {
    let n = x.nrows();
    let k = x.ncols();

    let xtx = x.transpose() * &x;
    check_full_rank(&xtx, &names)?;
    let xtx_inv = xtx
        .try_inverse()
        .ok_or_else(|| Error::Computation("X'X is singular".to_string()))?;
    let beta = &xtx_inv * (x.transpose() * &y);

    let resid = &y - &x * &beta;
    let rss: f64 = resid.iter().map(|e| e * e).sum();

    let df_absorbed = absorbed.as_ref().map_or(0, |a| a.solver.degrees_of_freedom_absorbed());
    let df_resid = n.checked_sub(k + df_absorbed).filter(|&d| d > 0).ok_or_else(|| {
        Error::Computation(format!(
            "no residual degrees of freedom (n={n}, k={k}, absorbed={df_absorbed})"
        ))
    })?;

    let lev = if cov_type.needs_leverage() {
        Some(leverages(&x, &xtx_inv, absorbed.as_ref().map(|a| a.solver))?)
    } else {
        None
    };
    let vcov = robust_covariance(&x, &resid, &xtx_inv, cov_type, df_resid, lev.as_deref())?;

    // R²: centered with an intercept, within after absorption, uncentered otherwise
    let tss: f64 = if has_intercept {
        let mean = y.mean();
        y.iter().map(|v| (v - mean) * (v - mean)).sum()
    } else {
        y.iter().map(|v| v * v).sum()
    };
    let r_squared = if tss > 0.0 { 1.0 - rss / tss } else { 0.0 };
    let base = if absorbed.is_some() {
        df_absorbed
    } else if has_intercept {
        1
    } else {
        0
    };
    let adj_r_squared = 1.0 - (1.0 - r_squared) * (n - base) as f64 / df_resid as f64;

    let sigma2 = rss / df_resid as f64;
    let t_dist = StudentsT::new(0.0, 1.0, df_resid as f64)
        .map_err(|e| Error::Computation(format!("Student-t with {df_resid} df: {e}")))?;
    let t_crit = t_dist.inverse_cdf(0.975);

    let coefficients: Vec<Coefficient> = names
        .iter()
        .enumerate()
        .map(|(j, term)| {
            let estimate = beta[j];
            let std_error = vcov[(j, j)].max(0.0).sqrt();
            let std_error_ols = (sigma2 * xtx_inv[(j, j)]).max(0.0).sqrt();
            let t_stat = estimate / std_error;
            let p_value = 2.0 * (1.0 - t_dist.cdf(t_stat.abs()));
            Coefficient {
                term: term.clone(),
                estimate,
                std_error,
                std_error_ols,
                t_stat,
                p_value,
                ci_lower: estimate - t_crit * std_error,
                ci_upper: estimate + t_crit * std_error,
            }
        })
        .collect();

    // row-major
    let covariance: Vec<f64> = vcov.transpose().as_slice().to_vec();

    tracing::info!(
        label = labels.label,
        n_obs = n,
        k,
        df_resid,
        r_squared,
        covariance = %cov_type,
        "model fitted"
    );

    Ok(RegressionFit {
        label: labels.label.to_string(),
        response: labels.response.to_string(),
        coefficients,
        covariance,
        covariance_type: cov_type,
        absorbed: absorbed.map(|a| a.names).unwrap_or_default(),
        df_absorbed,
        n_obs: n,
        df_resid,
        rss,
        r_squared,
        adj_r_squared,
    })
}
