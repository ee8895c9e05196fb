//! Monthly mean of the standardized search index, one series per group.

use sct_core::{Error, Result};
use sct_data::{MonthlyMean, YearMonth};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::meta::ArtifactMeta;

/// One line of the trend plot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendSeries {
    /// Legend label.
    pub label: String,
    /// Mean index per month, aligned with [`TrendArtifact::months`]; `None` where the group
    /// has no rows.
    pub mean: Vec<Option<f64>>,
    /// Rows averaged per month.
    pub n: Vec<usize>,
}

/// Plot-friendly artifact for mean search interest over time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendArtifact {
    /// Always `sctrends_trend_v0`.
    pub schema_version: String,
    /// Provenance.
    pub meta: ArtifactMeta,
    /// Y-axis quantity.
    pub y_label: String,
    /// Shared x-axis, `YYYY-MM`, ascending.
    pub months: Vec<String>,
    /// Last month before the release; drawn as a vertical marker.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release: Option<String>,
    /// Lines in legend order.
    pub series: Vec<TrendSeries>,
}

fn group_label(in_city: Option<bool>) -> &'static str {
    match in_city {
        None => "All institutions",
        Some(false) => "Outside city",
        Some(true) => "In city",
    }
}

/// Build the trend artifact from per-month means.
///
/// Months missing for one group are `None` in that series so every series
/// shares the same x-axis.
pub fn trend_artifact(means: &[MonthlyMean], release: Option<YearMonth>) -> Result<TrendArtifact> {
    if means.is_empty() {
        return Err(Error::Validation("trend artifact needs at least one monthly mean".into()));
    }

    let months: Vec<YearMonth> =
        means.iter().map(|m| m.year_month).collect::<BTreeSet<_>>().into_iter().collect();
    let pos: BTreeMap<YearMonth, usize> = months.iter().enumerate().map(|(i, m)| (*m, i)).collect();

    let mut groups: BTreeMap<Option<bool>, TrendSeries> = BTreeMap::new();
    for m in means {
        let s = groups.entry(m.in_city).or_insert_with(|| TrendSeries {
            label: group_label(m.in_city).to_string(),
            mean: vec![None; months.len()],
            n: vec![0; months.len()],
        });
        let i = pos[&m.year_month];
        s.mean[i] = Some(m.mean_index_std);
        s.n[i] = m.n;
    }

    tracing::debug!(months = months.len(), series = groups.len(), "trend artifact");

    Ok(TrendArtifact {
        schema_version: "sctrends_trend_v0".to_string(),
        meta: ArtifactMeta::now()?,
        y_label: "Mean standardized search index".to_string(),
        months: months.iter().map(ToString::to_string).collect(),
        release: release.map(|r| r.to_string()),
        series: groups.into_values().collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mm(ym: &str, in_city: Option<bool>, mean: f64, n: usize) -> MonthlyMean {
        MonthlyMean { year_month: ym.parse().unwrap(), in_city, mean_index_std: mean, n }
    }

    #[test]
    fn single_series() {
        let means = vec![mm("2015-08", None, -0.2, 10), mm("2015-09", None, 0.1, 12)];
        let a = trend_artifact(&means, Some("2015-09".parse().unwrap())).unwrap();
        assert_eq!(a.schema_version, "sctrends_trend_v0");
        assert_eq!(a.months, vec!["2015-08", "2015-09"]);
        assert_eq!(a.release.as_deref(), Some("2015-09"));
        assert_eq!(a.series.len(), 1);
        assert_eq!(a.series[0].label, "All institutions");
        assert_eq!(a.series[0].mean, vec![Some(-0.2), Some(0.1)]);
        assert_eq!(a.series[0].n, vec![10, 12]);
    }

    #[test]
    fn split_series_share_months() {
        let means = vec![
            mm("2015-07", Some(false), 0.3, 4),
            mm("2015-08", Some(false), 0.2, 4),
            mm("2015-08", Some(true), -0.1, 2),
        ];
        let a = trend_artifact(&means, None).unwrap();
        assert_eq!(a.months.len(), 2);
        let labels: Vec<&str> = a.series.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec!["Outside city", "In city"]);
        assert_eq!(a.series[1].mean, vec![None, Some(-0.1)]);
        assert_eq!(a.series[1].n, vec![0, 2]);

        let json = serde_json::to_value(&a).unwrap();
        assert!(json.get("release").is_none());
    }

    #[test]
    fn empty_input_is_rejected() {
        assert!(trend_artifact(&[], None).is_err());
    }
}
