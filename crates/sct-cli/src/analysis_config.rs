//! Analysis config v0 (YAML) parsing + semantic validation.
//!
//! One YAML file controls the whole run: input discovery, column names,
//! derivation constants, model options and report presentation. Every
//! section is optional; omitted keys take the published analysis' values.

use anyhow::{Context, Result, bail};
use sct_data::{AnalysisTable, ColumnMapping, DeriveConfig, InputConfig, PipelineConfig};
use sct_inference::ModelOptions;
use sct_viz_render::theme::BuiltinTheme;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const CONFIG_V0: &str = "sctrends_analysis_v0";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub schema_version: String,
    pub inputs: InputConfig,
    pub columns: ColumnMapping,
    pub derive: DeriveConfig,
    pub models: ModelOptions,
    pub report: ReportOptions,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            schema_version: CONFIG_V0.to_string(),
            inputs: InputConfig::default(),
            columns: ColumnMapping::default(),
            derive: DeriveConfig::default(),
            models: ModelOptions::default(),
            report: ReportOptions::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportOptions {
    /// Draw one trend line per city group.
    pub split_by_city: bool,
    /// Plot theme (`sctrends`, `minimal`, `print`).
    pub theme: String,
    /// Plot file format (`svg`, or `png` when built with the feature).
    pub format: String,
    /// Significance level used in the narration.
    pub alpha: f64,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self { split_by_city: false, theme: "sctrends".into(), format: "svg".into(), alpha: 0.05 }
    }
}

impl AnalysisConfig {
    /// Loader / cleaner view of the config.
    pub fn pipeline(&self) -> PipelineConfig {
        PipelineConfig {
            inputs: self.inputs.clone(),
            columns: self.columns.clone(),
            derive: self.derive.clone(),
        }
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        let cfg: Self = serde_yaml_ng::from_str(text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn read(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading analysis config {}", path.display()))?;
        Self::from_yaml(&text)
            .with_context(|| format!("invalid analysis config {}", path.display()))
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.schema_version != CONFIG_V0 {
            bail!(
                "unsupported schema_version for analysis config: got={} expected={}",
                self.schema_version,
                CONFIG_V0
            );
        }

        let numeric = AnalysisTable::numeric_columns();
        let m = &self.models;
        for (role, col) in [
            ("response", &m.response),
            ("period", &m.period),
            ("group", &m.group),
            ("city_covariate", &m.city_covariate),
        ] {
            if !numeric.contains(&col.as_str()) {
                bail!(
                    "models.{role}: '{col}' is not a numeric column (one of {})",
                    numeric.join(", ")
                );
            }
        }
        if m.absorb.is_empty() {
            bail!("models.absorb: Model B needs at least one fixed effect");
        }
        let categorical = AnalysisTable::categorical_columns();
        for fe in &m.absorb {
            if !categorical.contains(&fe.as_str()) {
                bail!(
                    "models.absorb: '{fe}' is not a categorical column (one of {})",
                    categorical.join(", ")
                );
            }
        }

        if !self.derive.earnings_threshold.is_finite() {
            bail!("derive.earnings_threshold must be finite");
        }
        if self.inputs.search_pattern.trim().is_empty() {
            bail!("inputs.search_pattern must not be empty");
        }

        BuiltinTheme::parse(&self.report.theme)?;
        if !matches!(self.report.format.as_str(), "svg" | "png") {
            bail!("report.format: expected svg or png, got '{}'", self.report.format);
        }
        if !(self.report.alpha > 0.0 && self.report.alpha < 1.0) {
            bail!("report.alpha must be in (0, 1), got {}", self.report.alpha);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sct_core::CovarianceType;

    #[test]
    fn default_round_trips_through_yaml() {
        let yaml = AnalysisConfig::default().to_yaml().unwrap();
        assert!(yaml.contains("schema_version: sctrends_analysis_v0"));
        assert!(yaml.contains("release_cutoff:") && yaml.contains("2015-09"));
        let back = AnalysisConfig::from_yaml(&yaml).unwrap();
        assert_eq!(back.models, ModelOptions::default());
        assert_eq!(back.derive.earnings_threshold, 61_400.0);
    }

    #[test]
    fn partial_sections_keep_defaults() {
        let cfg = AnalysisConfig::from_yaml(
            "schema_version: sctrends_analysis_v0\n\
             models:\n  covariance: HC1\n  absorb: [month_of_year, state]\n\
             report:\n  split_by_city: true\n",
        )
        .unwrap();
        assert_eq!(cfg.models.covariance, CovarianceType::HC1);
        assert_eq!(cfg.models.absorb, vec!["month_of_year", "state"]);
        assert_eq!(cfg.models.response, "index_std");
        assert!(cfg.report.split_by_city);
        assert_eq!(cfg.report.theme, "sctrends");
        assert_eq!(cfg.pipeline().inputs.search_pattern, "trends_up_to_*.csv");
    }

    #[test]
    fn unknown_schema_version_is_rejected() {
        let err = AnalysisConfig::from_yaml("schema_version: sctrends_analysis_v9\n").unwrap_err();
        assert!(err.to_string().contains("unsupported schema_version"), "{err}");
    }

    #[test]
    fn semantic_errors() {
        for yaml in [
            "models:\n  absorb: [earnings]\n",
            "models:\n  absorb: []\n",
            "models:\n  response: state\n",
            "report:\n  theme: neon\n",
            "report:\n  format: gif\n",
            "report:\n  alpha: 1.5\n",
            "inputs:\n  search_pattern: ''\n",
        ] {
            assert!(AnalysisConfig::from_yaml(yaml).is_err(), "accepted: {yaml}");
        }
    }
}
