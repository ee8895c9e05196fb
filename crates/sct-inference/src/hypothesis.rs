//! Wald tests of linear restrictions `Rβ = r` on a fitted model.

use nalgebra::{DMatrix, DVector};
use sct_core::{Error, RegressionFit, Result};
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, FisherSnedecor};

/// One restriction: `Σ w_j β_j = rhs`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Restriction {
    /// `(term, weight)` pairs.
    pub weights: Vec<(String, f64)>,
    /// Right-hand side.
    pub rhs: f64,
}

impl Restriction {
    /// The sum of `terms` equals `rhs`.
    pub fn sum_of<S: AsRef<str>>(terms: &[S], rhs: f64) -> Self {
        Self { weights: terms.iter().map(|t| (t.as_ref().to_string(), 1.0)).collect(), rhs }
    }

    /// A single coefficient equals `rhs`.
    pub fn equals(term: impl Into<String>, rhs: f64) -> Self {
        Self { weights: vec![(term.into(), 1.0)], rhs }
    }
}

impl std::fmt::Display for Restriction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for (term, w) in &self.weights {
            let (sign, mag) = if *w < 0.0 { ("-", -w) } else { ("+", *w) };
            match (first, sign) {
                (true, "-") => f.write_str("-")?,
                (true, _) => {}
                (false, s) => write!(f, " {s} ")?,
            }
            if (mag - 1.0).abs() > f64::EPSILON {
                write!(f, "{mag}*")?;
            }
            f.write_str(term)?;
            first = false;
        }
        write!(f, " = {}", self.rhs)
    }
}

/// Joint hypothesis over one or more restrictions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearHypothesis {
    /// Restrictions tested jointly.
    pub restrictions: Vec<Restriction>,
}

impl LinearHypothesis {
    /// Hypothesis with a single restriction.
    pub fn single(r: Restriction) -> Self {
        Self { restrictions: vec![r] }
    }

    /// Human-readable form.
    pub fn describe(&self) -> String {
        self.restrictions.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
    }
}

/// Outcome of a Wald test.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaldTest {
    /// Model the test was run on.
    pub model: String,
    /// Hypothesis text.
    pub hypothesis: String,
    /// `Rβ − r`, one entry per restriction.
    pub estimate: Vec<f64>,
    /// Standard error of `Rβ − r` (single restriction only).
    pub std_error: Option<f64>,
    /// `F = (Rβ−r)'(RVR')⁻¹(Rβ−r) / q`.
    pub f_stat: f64,
    /// Numerator df `q`.
    pub df_num: usize,
    /// Denominator df (residual df of the model).
    pub df_denom: usize,
    /// Upper-tail p-value from `F(q, df_denom)`.
    pub p_value: f64,
}

impl WaldTest {
    /// Reject at level `alpha`.
    pub fn rejects(&self, alpha: f64) -> bool {
        self.p_value < alpha
    }
}

/// Wald test of `hyp` against `fit`, using the fit's robust covariance.
pub fn wald_test(fit: &RegressionFit, hyp: &LinearHypothesis) -> Result<WaldTest> {
    let q = hyp.restrictions.len();
    let k = fit.n_coefficients();
    if q == 0 {
        return Err(Error::Validation("hypothesis has no restrictions".into()));
    }
    if q > k {
        return Err(Error::Validation(format!(
            "{q} restrictions exceed the {k} coefficients of {}",
            fit.label
        )));
    }

    if fit.covariance.len() != k * k {
        return Err(Error::Validation(format!(
            "{} covariance has {} entries, expected {}",
            fit.label,
            fit.covariance.len(),
            k * k
        )));
    }

    let mut r_mat = DMatrix::<f64>::zeros(q, k);
    let mut rhs = DVector::<f64>::zeros(q);
    for (i, restr) in hyp.restrictions.iter().enumerate() {
        for (term, w) in &restr.weights {
            let j = fit.index_of(term).ok_or_else(|| {
                Error::Validation(format!("{} has no coefficient '{}'", fit.label, term))
            })?;
            r_mat[(i, j)] += *w;
        }
        rhs[i] = restr.rhs;
    }

    let beta = DVector::from_vec(fit.estimates());
    let v = DMatrix::from_fn(k, k, |i, j| fit.covariance_at(i, j).unwrap_or(f64::NAN));

    let diff = &r_mat * beta - rhs;
    let rvr = &r_mat * v * r_mat.transpose();
    let rvr_inv = rvr
        .clone()
        .try_inverse()
        .ok_or_else(|| Error::Computation("restriction covariance R V R' is singular".into()))?;
    let f_stat = (diff.transpose() * &rvr_inv * &diff)[(0, 0)] / q as f64;

    let dist = FisherSnedecor::new(q as f64, fit.df_resid as f64)
        .map_err(|e| Error::Computation(format!("F({q}, {}): {e}", fit.df_resid)))?;
    let p_value = 1.0 - dist.cdf(f_stat);

    let std_error = (q == 1).then(|| rvr[(0, 0)].max(0.0).sqrt());
    let test = WaldTest {
        model: fit.label.clone(),
        hypothesis: hyp.describe(),
        estimate: diff.iter().copied().collect(),
        std_error,
        f_stat,
        df_num: q,
        df_denom: fit.df_resid,
        p_value,
    };
    tracing::info!(
        model = %test.model,
        hypothesis = %test.hypothesis,
        f_stat = test.f_stat,
        p_value = test.p_value,
        "wald test"
    );
    Ok(test)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use sct_core::{Coefficient, CovarianceType};

    fn fit() -> RegressionFit {
        let coef = |term: &str, estimate: f64, se: f64| Coefficient {
            term: term.into(),
            estimate,
            std_error: se,
            std_error_ols: se,
            t_stat: estimate / se,
            p_value: 0.5,
            ci_lower: 0.0,
            ci_upper: 0.0,
        };
        RegressionFit {
            label: "Model A".into(),
            response: "y".into(),
            coefficients: vec![coef("a", 0.3, 0.1), coef("a:b", -0.1, 0.2)],
            covariance: vec![0.01, -0.005, -0.005, 0.04],
            covariance_type: CovarianceType::HC2,
            absorbed: vec![],
            df_absorbed: 0,
            n_obs: 100,
            df_resid: 98,
            rss: 1.0,
            r_squared: 0.1,
            adj_r_squared: 0.09,
        }
    }

    #[test]
    fn sum_restriction_from_two_coefficients() {
        let h = LinearHypothesis::single(Restriction::sum_of(&["a", "a:b"], 0.0));
        let t = wald_test(&fit(), &h).unwrap();
        // estimate 0.2, var = 0.01 + 0.04 - 2*0.005 = 0.04
        assert_relative_eq!(t.estimate[0], 0.2, epsilon = 1e-12);
        assert_relative_eq!(t.std_error.unwrap(), 0.2, epsilon = 1e-12);
        assert_relative_eq!(t.f_stat, 1.0, epsilon = 1e-12);
        assert_eq!((t.df_num, t.df_denom), (1, 98));
        assert!(t.p_value > 0.3 && t.p_value < 0.33, "p = {}", t.p_value);
        assert_eq!(t.hypothesis, "a + a:b = 0");
    }

    #[test]
    fn joint_restrictions() {
        let h = LinearHypothesis {
            restrictions: vec![Restriction::equals("a", 0.0), Restriction::equals("a:b", 0.0)],
        };
        let t = wald_test(&fit(), &h).unwrap();
        assert_eq!(t.df_num, 2);
        assert!(t.std_error.is_none());
        assert!(t.f_stat > 0.0);
    }

    #[test]
    fn unknown_term_is_rejected() {
        let h = LinearHypothesis::single(Restriction::equals("nope", 0.0));
        assert!(wald_test(&fit(), &h).is_err());
    }

    #[test]
    fn truncated_covariance_is_rejected() {
        let mut f = fit();
        f.covariance.pop();
        let h = LinearHypothesis::single(Restriction::equals("a", 0.0));
        assert!(matches!(wald_test(&f, &h), Err(Error::Validation(_))));
    }
}
