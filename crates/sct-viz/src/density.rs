//! Gaussian kernel density estimate of a single variable.
//!
//! Bandwidth follows Silverman's rule of thumb,
//! `0.9 · min(sd, IQR/1.34) · n^(−1/5)`, and the density is evaluated on a
//! regular grid that extends three bandwidths past the data on each side.

use sct_core::{Error, Result};
use sct_data::AnalysisTable;
use serde::{Deserialize, Serialize};

use crate::meta::ArtifactMeta;

/// Grid resolution of the density curve.
pub const GRID_POINTS: usize = 512;

/// Bandwidths of padding on each side of the data range.
const GRID_PAD: f64 = 3.0;

/// Plot-friendly kernel density artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DensityArtifact {
    /// Always `sctrends_density_v0`.
    pub schema_version: String,
    /// Provenance.
    pub meta: ArtifactMeta,
    /// Variable the density describes.
    pub variable: String,
    /// Number of observations.
    pub n: usize,
    /// Kernel bandwidth.
    pub bandwidth: f64,
    /// Sample mean (drawn as a marker).
    pub mean: f64,
    /// Sample median.
    pub median: f64,
    /// Optional reference line, e.g. the high-earning threshold.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
    /// Grid x-values.
    pub x: Vec<f64>,
    /// Density at each grid point.
    pub density: Vec<f64>,
}

/// Linear-interpolation quantile of sorted data (R type 7).
fn quantile_sorted(sorted: &[f64], p: f64) -> f64 {
    let h = (sorted.len() - 1) as f64 * p;
    let lo = h.floor() as usize;
    let hi = (lo + 1).min(sorted.len() - 1);
    sorted[lo] + (h - lo as f64) * (sorted[hi] - sorted[lo])
}

fn sample_sd(values: &[f64], mean: f64) -> f64 {
    let n = values.len() as f64;
    let ss: f64 = values.iter().map(|v| (v - mean) * (v - mean)).sum();
    (ss / (n - 1.0)).sqrt()
}

fn check_input(values: &[f64]) -> Result<()> {
    if values.len() < 2 {
        return Err(Error::Validation(format!(
            "kernel density needs at least 2 observations, got {}",
            values.len()
        )));
    }
    if values.iter().any(|v| !v.is_finite()) {
        return Err(Error::Validation("kernel density input contains non-finite values".into()));
    }
    Ok(())
}

/// Silverman's rule-of-thumb bandwidth.
///
/// When the spread term is zero (e.g. more than half the values tie) the
/// sample sd is used instead, then `|x₀|`, then 1.
pub fn silverman_bandwidth(values: &[f64]) -> Result<f64> {
    check_input(values)?;
    let n = values.len();
    let mean = values.iter().sum::<f64>() / n as f64;
    let sd = sample_sd(values, mean);

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let iqr = quantile_sorted(&sorted, 0.75) - quantile_sorted(&sorted, 0.25);

    let mut spread = sd.min(iqr / 1.34);
    if spread <= 0.0 {
        spread = [sd, values[0].abs(), 1.0].into_iter().find(|s| *s > 0.0).unwrap_or(1.0);
    }
    Ok(0.9 * spread * (n as f64).powf(-0.2))
}

/// Evaluate the Gaussian KDE of `values` on `GRID_POINTS` points.
pub fn density_artifact(
    variable: &str,
    values: &[f64],
    threshold: Option<f64>,
) -> Result<DensityArtifact> {
    let bw = silverman_bandwidth(values)?;
    let n = values.len();

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let lo = sorted[0] - GRID_PAD * bw;
    let hi = sorted[n - 1] + GRID_PAD * bw;
    let step = (hi - lo) / (GRID_POINTS - 1) as f64;

    let norm = 1.0 / (n as f64 * bw * (2.0 * std::f64::consts::PI).sqrt());
    let x: Vec<f64> = (0..GRID_POINTS).map(|i| lo + step * i as f64).collect();
    let density = x
        .iter()
        .map(|&xg| {
            values
                .iter()
                .map(|&v| {
                    let z = (xg - v) / bw;
                    (-0.5 * z * z).exp()
                })
                .sum::<f64>()
                * norm
        })
        .collect();

    let mean = values.iter().sum::<f64>() / n as f64;
    let median = quantile_sorted(&sorted, 0.5);
    tracing::debug!(variable, n, bandwidth = bw, mean, "kernel density");

    Ok(DensityArtifact {
        schema_version: "sctrends_density_v0".to_string(),
        meta: ArtifactMeta::now()?,
        variable: variable.to_string(),
        n,
        bandwidth: bw,
        mean,
        median,
        threshold,
        x,
        density,
    })
}

/// Density of 10-year median earnings over the distinct institutions of `table`.
pub fn earnings_density(table: &AnalysisTable, threshold: Option<f64>) -> Result<DensityArtifact> {
    let earnings: Vec<f64> = table.institution_earnings().into_iter().map(|(_, e)| e).collect();
    density_artifact("median_earnings_10yr", &earnings, threshold)
}
