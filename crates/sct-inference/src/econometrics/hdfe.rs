//! Absorption of categorical fixed effects by alternating projections.
//!
//! One dimension is absorbed exactly in a single demeaning sweep. Two or
//! more dimensions are absorbed by repeated sweeps (method of alternating
//! projections) until one full sweep changes no element by more than the
//! tolerance, relative to the scale of the input. Every sweep is an exact
//! projection, so the limit is the residual of `v` on the fixed-effect span.
//! Running out of sweeps is an error.
//!
//! # References
//!
//! - Gaure (2013), "OLS with multiple high dimensional category variables."
//! - Correia (2017), "Linear Models with High-Dimensional Fixed Effects."

use sct_core::{Error, Result};
use std::collections::HashSet;

const DEFAULT_TOL: f64 = 1e-10;
const DEFAULT_MAX_ITER: usize = 10_000;

/// One categorical dimension: level code per observation plus the inverse index.
#[derive(Debug, Clone)]
struct Dimension {
    codes: Vec<usize>,
    members: Vec<Vec<usize>>,
}

impl Dimension {
    fn new(codes: Vec<usize>) -> Self {
        let n_levels = codes.iter().copied().max().map_or(0, |m| m + 1);
        let mut members: Vec<Vec<usize>> = vec![Vec::new(); n_levels];
        for (i, &g) in codes.iter().enumerate() {
            members[g].push(i);
        }
        Self { codes, members }
    }

    /// Levels that actually occur.
    fn n_used_levels(&self) -> usize {
        self.members.iter().filter(|m| !m.is_empty()).count()
    }

    fn demean(&self, v: &mut [f64]) {
        for obs in &self.members {
            if obs.is_empty() {
                continue;
            }
            let mean = obs.iter().map(|&i| v[i]).sum::<f64>() / obs.len() as f64;
            for &i in obs {
                v[i] -= mean;
            }
        }
    }

    fn max_abs_mean(&self, v: &[f64]) -> f64 {
        self.members
            .iter()
            .filter(|obs| !obs.is_empty())
            .map(|obs| (obs.iter().map(|&i| v[i]).sum::<f64>() / obs.len() as f64).abs())
            .fold(0.0, f64::max)
    }
}

/// Absorbs any number of fixed-effect dimensions from regressors and response.
///
/// Each dimension is a `Vec<usize>` of dense 0-based level codes, one per
/// observation.
#[derive(Debug, Clone)]
pub struct FixedEffectsSolver {
    n: usize,
    dims: Vec<Dimension>,
    tol: f64,
    max_iter: usize,
}

impl FixedEffectsSolver {
    /// Build a solver over `groups` (one code vector per dimension).
    pub fn new(groups: Vec<Vec<usize>>) -> Result<Self> {
        let Some(first) = groups.first() else {
            return Err(Error::Validation("at least one fixed-effect dimension required".into()));
        };
        let n = first.len();
        if n == 0 {
            return Err(Error::Validation("fixed effects need at least one observation".into()));
        }
        for (d, g) in groups.iter().enumerate() {
            if g.len() != n {
                return Err(Error::Validation(format!(
                    "fixed-effect dimension {} has length {}, expected {}",
                    d,
                    g.len(),
                    n
                )));
            }
        }
        let dims = groups.into_iter().map(Dimension::new).collect();
        Ok(Self { n, dims, tol: DEFAULT_TOL, max_iter: DEFAULT_MAX_ITER })
    }

    #[cfg(test)]
    fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Occurring levels per dimension.
    pub fn levels(&self) -> Vec<usize> {
        self.dims.iter().map(Dimension::n_used_levels).collect()
    }

    /// Remove every fixed effect from `v`.
    pub fn partial_out(&self, v: &[f64]) -> Result<Vec<f64>> {
        if v.len() != self.n {
            return Err(Error::Validation(format!(
                "column length ({}) != observations ({})",
                v.len(),
                self.n
            )));
        }
        let mut resid = v.to_vec();

        if let [only] = self.dims.as_slice() {
            only.demean(&mut resid);
            return Ok(resid);
        }

        let scale = v.iter().map(|x| x.abs()).fold(0.0, f64::max).max(1.0);
        let mut prev = resid.clone();
        for iter in 0..self.max_iter {
            for dim in &self.dims {
                dim.demean(&mut resid);
            }
            let change =
                resid.iter().zip(&prev).map(|(a, b)| (a - b).abs()).fold(0.0, f64::max);
            if change <= self.tol * scale {
                tracing::trace!(iterations = iter + 1, "fixed effects converged");
                return Ok(resid);
            }
            prev.copy_from_slice(&resid);
        }

        Err(Error::Computation(format!(
            "fixed-effect projections did not converge in {} iterations \
             (largest residual group mean {:.3e})",
            self.max_iter,
            self.max_group_mean(&resid)
        )))
    }

    /// [`partial_out`](Self::partial_out) applied to several columns.
    pub fn partial_out_many(&self, cols: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
        cols.iter().map(|c| self.partial_out(c)).collect()
    }

    /// Rank of the absorbed fixed-effect span, including the implicit intercept.
    ///
    /// - one dimension: the number of levels;
    /// - two dimensions: `L₀ + L₁ − components` of the bipartite level graph;
    /// - more: `Σ L_d − (k − 1)`, an upper bound.
    pub fn degrees_of_freedom_absorbed(&self) -> usize {
        let total: usize = self.levels().iter().sum();
        match self.dims.len() {
            1 => total,
            2 => total.saturating_sub(self.connected_components()),
            k => total.saturating_sub(k - 1),
        }
    }

    /// Leverage contributed by the absorbed effects for observation `i`.
    ///
    /// Only defined for a single dimension, where it is `1 / n_g(i)`.
    pub fn absorbed_leverage(&self, i: usize) -> Result<f64> {
        match self.dims.as_slice() {
            [only] => {
                let g = only.codes[i];
                Ok(1.0 / only.members[g].len() as f64)
            }
            _ => Err(Error::NotImplemented(format!(
                "leverage with {} absorbed fixed-effect dimensions",
                self.dims.len()
            ))),
        }
    }

    fn max_group_mean(&self, v: &[f64]) -> f64 {
        self.dims.iter().map(|d| d.max_abs_mean(v)).fold(0.0, f64::max)
    }

    /// Connected components of the graph joining the levels of dimensions 0 and 1.
    fn connected_components(&self) -> usize {
        let (a, b) = (&self.dims[0], &self.dims[1]);
        let offset = a.members.len();
        let total = offset + b.members.len();
        let mut parent: Vec<usize> = (0..total).collect();
        let mut rank = vec![0u8; total];

        for i in 0..self.n {
            uf_union(&mut parent, &mut rank, a.codes[i], offset + b.codes[i]);
        }

        let mut roots = HashSet::new();
        for i in 0..self.n {
            roots.insert(uf_find(&mut parent, a.codes[i]));
        }
        roots.len()
    }
}

fn uf_find(parent: &mut [usize], mut x: usize) -> usize {
    while parent[x] != x {
        parent[x] = parent[parent[x]];
        x = parent[x];
    }
    x
}

fn uf_union(parent: &mut [usize], rank: &mut [u8], a: usize, b: usize) {
    let ra = uf_find(parent, a);
    let rb = uf_find(parent, b);
    if ra == rb {
        return;
    }
    match rank[ra].cmp(&rank[rb]) {
        std::cmp::Ordering::Less => parent[ra] = rb,
        std::cmp::Ordering::Greater => parent[rb] = ra,
        std::cmp::Ordering::Equal => {
            parent[rb] = ra;
            rank[ra] += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn one_dimension_is_exact() {
        let solver = FixedEffectsSolver::new(vec![vec![0, 0, 0, 1, 1, 1]]).unwrap();
        let r = solver.partial_out(&[1.0, 2.0, 3.0, 10.0, 20.0, 30.0]).unwrap();
        let expected = [-1.0, 0.0, 1.0, -10.0, 0.0, 10.0];
        for (a, b) in r.iter().zip(expected) {
            assert_abs_diff_eq!(*a, b, epsilon = 1e-12);
        }
        assert_eq!(solver.degrees_of_freedom_absorbed(), 2);
        assert_abs_diff_eq!(solver.absorbed_leverage(4).unwrap(), 1.0 / 3.0);
    }

    #[test]
    fn two_dimensions_remove_additive_effects() {
        // month effect + keyword effect, unbalanced
        let month = vec![0, 1, 2, 0, 1, 2, 1];
        let keyword = vec![0, 0, 0, 1, 1, 1, 2];
        let solver = FixedEffectsSolver::new(vec![month.clone(), keyword.clone()]).unwrap();

        let m_eff = [1.0, -2.0, 0.5];
        let k_eff = [10.0, 3.0, -4.0];
        let y: Vec<f64> = (0..7).map(|i| m_eff[month[i]] + k_eff[keyword[i]]).collect();
        let r = solver.partial_out(&y).unwrap();
        for ri in r {
            assert_abs_diff_eq!(ri, 0.0, epsilon = 1e-7);
        }
        // 3 + 3 levels, one component
        assert_eq!(solver.degrees_of_freedom_absorbed(), 5);
        assert!(solver.absorbed_leverage(0).is_err());
    }

    #[test]
    fn exhausted_sweeps_are_an_error() {
        let month = vec![0, 1, 2, 0, 1, 2, 1];
        let keyword = vec![0, 0, 0, 1, 1, 1, 2];
        let solver = FixedEffectsSolver::new(vec![month, keyword]).unwrap().with_max_iter(1);
        let err = solver.partial_out(&[1.0, 5.0, -2.0, 7.0, 0.5, 3.0, 9.0]).unwrap_err();
        assert!(
            matches!(err, Error::Computation(ref m) if m.contains("did not converge")),
            "{err}"
        );
    }

    #[test]
    fn two_dimensions_give_the_least_squares_residual() {
        // residual must be orthogonal to every level indicator, not just mean-free
        let month = vec![0, 1, 2, 0, 1, 2, 0, 1, 2, 0];
        let keyword = vec![0, 0, 0, 1, 1, 1, 2, 2, 2, 1];
        let solver = FixedEffectsSolver::new(vec![month.clone(), keyword.clone()]).unwrap();
        let v = [0.3, 1.7, 2.2, 3.9, 0.8, 2.6, 1.1, 3.3, 0.5, 2.9];
        let r = solver.partial_out(&v).unwrap();
        // v − r lies in the span, so a second pass leaves r unchanged
        let again = solver.partial_out(&r).unwrap();
        for (a, b) in r.iter().zip(&again) {
            assert_abs_diff_eq!(*a, *b, epsilon = 1e-8);
        }
        for codes in [&month, &keyword] {
            for level in 0..3 {
                let s: f64 = (0..10).filter(|&i| codes[i] == level).map(|i| r[i]).sum();
                assert_abs_diff_eq!(s, 0.0, epsilon = 1e-8);
            }
        }
    }

    #[test]
    fn disconnected_levels_count_components() {
        let solver = FixedEffectsSolver::new(vec![vec![0, 0, 1, 1], vec![0, 1, 2, 3]]).unwrap();
        // 2 + 4 levels, two components
        assert_eq!(solver.degrees_of_freedom_absorbed(), 4);
    }

    #[test]
    fn many_columns_match_single() {
        let solver =
            FixedEffectsSolver::new(vec![vec![0, 0, 1, 1, 2, 2], vec![0, 1, 0, 1, 0, 1]]).unwrap();
        let a = vec![1.0, 4.0, 2.0, 8.0, 3.0, 3.0];
        let b = vec![0.5, 0.0, 1.5, 2.0, 9.0, 1.0];
        let many = solver.partial_out_many(&[a.clone(), b.clone()]).unwrap();
        assert_eq!(many[0], solver.partial_out(&a).unwrap());
        assert_eq!(many[1], solver.partial_out(&b).unwrap());
    }

    #[test]
    fn validation_errors() {
        assert!(FixedEffectsSolver::new(vec![]).is_err());
        assert!(FixedEffectsSolver::new(vec![vec![]]).is_err());
        assert!(FixedEffectsSolver::new(vec![vec![0, 1], vec![0]]).is_err());
        let solver = FixedEffectsSolver::new(vec![vec![0, 0, 1, 1]]).unwrap();
        assert!(solver.partial_out(&[1.0, 2.0]).is_err());
    }
}
