//! Model specifications over named columns.
//!
//! A [`ModelSpec`] lists the response, the regressor terms and the absorbed
//! fixed effects by column name; [`ModelSpec::fit`] materializes them from
//! any [`ColumnSource`].
//!
//! [`ModelSpec::formula`] renders a spec in the usual notation,
//! `y ~ a + b + a:b | f + g`, with the absorbed effects after the bar.

use sct_core::{ColumnSource, CovarianceType, Error, RegressionFit, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::regression::{DesignMatrix, FitLabels, INTERCEPT, absorbed_ols, ols};

/// A regressor: a single column or the product of several.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Term {
    factors: Vec<String>,
}

impl Term {
    /// Single column.
    pub fn column(name: impl Into<String>) -> Self {
        Self { factors: vec![name.into()] }
    }

    /// Elementwise product of columns.
    pub fn interaction<S: AsRef<str>>(names: &[S]) -> Self {
        Self { factors: names.iter().map(|s| s.as_ref().to_string()).collect() }
    }

    /// Display name, factors joined by `:`.
    pub fn name(&self) -> String {
        self.factors.join(":")
    }

    /// Columns the term reads.
    pub fn factors(&self) -> &[String] {
        &self.factors
    }

    /// Evaluate against `src`.
    pub fn evaluate(&self, src: &dyn ColumnSource) -> Result<Vec<f64>> {
        let mut out = vec![1.0; src.n_rows()];
        for f in &self.factors {
            let col = src.numeric(f)?;
            for (o, v) in out.iter_mut().zip(col) {
                *o *= v;
            }
        }
        Ok(out)
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// A linear model over named columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSpec {
    /// Label shown in reports.
    pub label: String,
    /// Response column.
    pub response: String,
    /// Regressors in order.
    pub terms: Vec<Term>,
    /// Categorical columns absorbed as fixed effects.
    pub absorb: Vec<String>,
    /// Robust covariance estimator.
    pub covariance: CovarianceType,
}

impl ModelSpec {
    /// Empty specification with an intercept-only right-hand side.
    pub fn new(label: impl Into<String>, response: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            response: response.into(),
            terms: Vec::new(),
            absorb: Vec::new(),
            covariance: CovarianceType::default(),
        }
    }

    /// Add a single-column term.
    pub fn term(mut self, name: impl Into<String>) -> Self {
        self.push(Term::column(name));
        self
    }

    /// Add `a`, `b` and `a:b`.
    pub fn crossed(mut self, a: &str, b: &str) -> Self {
        self.push(Term::column(a));
        self.push(Term::column(b));
        self.push(Term::interaction(&[a, b]));
        self
    }

    /// Absorb a categorical column.
    pub fn absorb(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !self.absorb.contains(&name) {
            self.absorb.push(name);
        }
        self
    }

    /// Select the covariance estimator.
    pub fn covariance(mut self, cov: CovarianceType) -> Self {
        self.covariance = cov;
        self
    }

    fn push(&mut self, t: Term) {
        if !self.terms.contains(&t) {
            self.terms.push(t);
        }
    }

    /// Formula text, e.g. `index_std ~ a + b + a:b | month_of_year`.
    pub fn formula(&self) -> String {
        let rhs = if self.terms.is_empty() {
            "1".to_string()
        } else {
            self.terms.iter().map(Term::name).collect::<Vec<_>>().join(" + ")
        };
        if self.absorb.is_empty() {
            format!("{} ~ {}", self.response, rhs)
        } else {
            format!("{} ~ {} | {}", self.response, rhs, self.absorb.join(" + "))
        }
    }

    /// Build the design and fit.
    pub fn fit(&self, src: &dyn ColumnSource) -> Result<RegressionFit> {
        let y = src.numeric(&self.response)?;
        let n = src.n_rows();

        let mut columns = Vec::with_capacity(self.terms.len() + 1);
        if self.absorb.is_empty() {
            columns.push((INTERCEPT.to_string(), vec![1.0; n]));
        } else if self.terms.is_empty() {
            return Err(Error::Validation(format!(
                "{}: a fixed-effects model needs at least one regressor",
                self.label
            )));
        }
        for t in &self.terms {
            columns.push((t.name(), t.evaluate(src)?));
        }
        let design = DesignMatrix::from_columns(columns)?;
        let labels = FitLabels { label: &self.label, response: &self.response };

        tracing::debug!(label = %self.label, formula = %self.formula(), n, "fitting model");

        if self.absorb.is_empty() {
            ols(labels, &design, &y, self.covariance)
        } else {
            let absorb = self
                .absorb
                .iter()
                .map(|name| src.categorical(name).map(|codes| (name.clone(), codes)))
                .collect::<Result<Vec<_>>>()?;
            absorbed_ols(labels, &design, &y, absorb, self.covariance)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    struct Frame {
        cols: Vec<(&'static str, Vec<f64>)>,
        groups: Vec<(&'static str, Vec<usize>)>,
    }

    impl ColumnSource for Frame {
        fn n_rows(&self) -> usize {
            self.cols[0].1.len()
        }

        fn numeric(&self, name: &str) -> Result<Vec<f64>> {
            self.cols
                .iter()
                .find(|(n, _)| *n == name)
                .map(|(_, c)| c.clone())
                .ok_or_else(|| Error::Validation(format!("no column {name}")))
        }

        fn categorical(&self, name: &str) -> Result<Vec<usize>> {
            self.groups
                .iter()
                .find(|(n, _)| *n == name)
                .map(|(_, c)| c.clone())
                .ok_or_else(|| Error::Validation(format!("no column {name}")))
        }
    }

    #[test]
    fn crossing_adds_main_effects_once() {
        let s = ModelSpec::new("B", "y")
            .crossed("a", "b")
            .term("a")
            .term("c")
            .absorb("m")
            .absorb("s");
        let names: Vec<String> = s.terms.iter().map(Term::name).collect();
        assert_eq!(names, vec!["a", "b", "a:b", "c"]);
        assert_eq!(s.absorb, vec!["m", "s"]);
        assert_eq!(s.formula(), "y ~ a + b + a:b + c | m + s");
    }

    #[test]
    fn interaction_cell_means() {
        // saturated 2x2: coefficients reproduce the cell means
        let a = vec![0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 1.0];
        let b = vec![0.0, 1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0];
        let y = vec![1.0, 2.0, 4.0, 9.0, 1.2, 2.2, 4.2, 9.2];
        let frame = Frame { cols: vec![("a", a), ("b", b), ("y", y)], groups: vec![] };

        let fit = ModelSpec::new("A", "y").crossed("a", "b").fit(&frame).unwrap();
        assert_eq!(fit.coefficients[0].term, INTERCEPT);
        assert_relative_eq!(fit.coefficient(INTERCEPT).unwrap().estimate, 1.1, epsilon = 1e-10);
        assert_relative_eq!(fit.coefficient("a").unwrap().estimate, 3.0, epsilon = 1e-10);
        assert_relative_eq!(fit.coefficient("b").unwrap().estimate, 1.0, epsilon = 1e-10);
        assert_relative_eq!(fit.coefficient("a:b").unwrap().estimate, 4.0, epsilon = 1e-10);
        assert_eq!(fit.df_resid, 4);
    }

    #[test]
    fn unknown_column_propagates() {
        let frame = Frame { cols: vec![("y", vec![1.0, 2.0, 3.0])], groups: vec![] };
        assert!(ModelSpec::new("A", "y").term("missing").fit(&frame).is_err());
        assert!(ModelSpec::new("B", "y").term("y").absorb("g").fit(&frame).is_err());
    }
}
