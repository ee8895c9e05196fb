//! Heteroskedasticity-consistent (sandwich) covariance estimators.
//!
//! `V = (X'X)⁻¹ · X' diag(ω) X · (X'X)⁻¹`, with the per-observation weight
//! ω chosen by [`CovarianceType`].
//!
//! # References
//!
//! - White (1980), "A heteroskedasticity-consistent covariance matrix estimator."
//! - MacKinnon & White (1985), "Some heteroskedasticity-consistent covariance
//!   matrix estimators with improved finite sample properties."

use nalgebra::{DMatrix, DVector};
use sct_core::{CovarianceType, Error, Result};

use super::hdfe::FixedEffectsSolver;

/// Leverage (hat-matrix diagonal) of every observation.
///
/// `x` is the design actually regressed on (already demeaned when effects are
/// absorbed). With one absorbed dimension the group's own `1 / n_g` is added.
pub fn leverages(
    x: &DMatrix<f64>,
    xtx_inv: &DMatrix<f64>,
    absorbed: Option<&FixedEffectsSolver>,
) -> Result<Vec<f64>> {
    let n = x.nrows();
    let mut h = Vec::with_capacity(n);
    for i in 0..n {
        let row = x.row(i);
        let hi = (row * xtx_inv * row.transpose())[(0, 0)];
        let fe = match absorbed {
            Some(solver) => solver.absorbed_leverage(i)?,
            None => 0.0,
        };
        h.push(hi + fe);
    }
    Ok(h)
}

/// Per-observation sandwich weights.
fn weights(
    residuals: &DVector<f64>,
    cov_type: CovarianceType,
    df_resid: usize,
    leverage: Option<&[f64]>,
) -> Result<Vec<f64>> {
    let n = residuals.len();
    let lev = |i: usize| -> Result<f64> {
        leverage.map(|h| h[i]).ok_or_else(|| {
            Error::Computation(format!("{cov_type} covariance requires observation leverages"))
        })
    };

    let mut w = Vec::with_capacity(n);
    for i in 0..n {
        let e2 = residuals[i] * residuals[i];
        let wi = match cov_type {
            CovarianceType::HC0 => e2,
            CovarianceType::HC1 => e2 * n as f64 / df_resid as f64,
            CovarianceType::HC2 | CovarianceType::HC3 => {
                let one_minus_h = 1.0 - lev(i)?;
                // h = 1 forces e = 0
                if one_minus_h <= 1e-12 {
                    0.0
                } else if cov_type == CovarianceType::HC2 {
                    e2 / one_minus_h
                } else {
                    e2 / (one_minus_h * one_minus_h)
                }
            }
        };
        w.push(wi);
    }
    Ok(w)
}

/// Sandwich covariance of the coefficients.
pub fn robust_covariance(
    x: &DMatrix<f64>,
    residuals: &DVector<f64>,
    xtx_inv: &DMatrix<f64>,
    cov_type: CovarianceType,
    df_resid: usize,
    leverage: Option<&[f64]>,
) -> Result<DMatrix<f64>> {
    let n = x.nrows();
    if residuals.len() != n {
        return Err(Error::Validation(format!(
            "residuals length ({}) != rows of X ({})",
            residuals.len(),
            n
        )));
    }
    if df_resid == 0 {
        return Err(Error::Computation("no residual degrees of freedom".into()));
    }

    let w = weights(residuals, cov_type, df_resid, leverage)?;

    // Meat: X' diag(ω) X
    let mut xw = x.clone();
    for (i, wi) in w.iter().enumerate() {
        xw.row_mut(i).scale_mut(*wi);
    }
    let meat = x.transpose() * xw;

    let v = xtx_inv * meat * xtx_inv;
    // symmetrize against rounding
    Ok((&v + v.transpose()) * 0.5)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn design() -> (DMatrix<f64>, DVector<f64>) {
        // intercept + x, residuals chosen by hand
        let x = DMatrix::from_row_slice(4, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0, 1.0, 3.0]);
        let e = DVector::from_column_slice(&[0.5, -1.0, 1.0, -0.5]);
        (x, e)
    }

    #[test]
    fn hc1_scales_hc0() {
        let (x, e) = design();
        let inv = (x.transpose() * &x).try_inverse().unwrap();
        let v0 = robust_covariance(&x, &e, &inv, CovarianceType::HC0, 2, None).unwrap();
        let v1 = robust_covariance(&x, &e, &inv, CovarianceType::HC1, 2, None).unwrap();
        for (a, b) in v0.iter().zip(v1.iter()) {
            assert_relative_eq!(*a * 2.0, *b, epsilon = 1e-12);
        }
    }

    #[test]
    fn leverage_sums_to_rank() {
        let (x, _) = design();
        let inv = (x.transpose() * &x).try_inverse().unwrap();
        let h = leverages(&x, &inv, None).unwrap();
        assert_relative_eq!(h.iter().sum::<f64>(), 2.0, epsilon = 1e-12);
        // symmetric design: endpoints 0.7, interior 0.3
        assert_relative_eq!(h[0], 0.7, epsilon = 1e-12);
        assert_relative_eq!(h[1], 0.3, epsilon = 1e-12);
    }

    #[test]
    fn hc3_exceeds_hc2_exceeds_hc0() {
        let (x, e) = design();
        let inv = (x.transpose() * &x).try_inverse().unwrap();
        let h = leverages(&x, &inv, None).unwrap();
        let v0 = robust_covariance(&x, &e, &inv, CovarianceType::HC0, 2, None).unwrap();
        let v2 = robust_covariance(&x, &e, &inv, CovarianceType::HC2, 2, Some(&h)).unwrap();
        let v3 = robust_covariance(&x, &e, &inv, CovarianceType::HC3, 2, Some(&h)).unwrap();
        for j in 0..2 {
            assert!(v0[(j, j)] < v2[(j, j)]);
            assert!(v2[(j, j)] < v3[(j, j)]);
        }
    }

    #[test]
    fn hc2_without_leverage_is_an_error() {
        let (x, e) = design();
        let inv = (x.transpose() * &x).try_inverse().unwrap();
        assert!(robust_covariance(&x, &e, &inv, CovarianceType::HC2, 2, None).is_err());
        assert!(robust_covariance(&x, &e, &inv, CovarianceType::HC0, 0, None).is_err());
    }
}
