//! Load → clean → join, shared by `report` and `audit`.

use anyhow::{Context, Result};
use sct_data::{AnalysisTable, CleaningReport, JoinReport, PipelineConfig, TableSummary};
use std::path::PathBuf;

/// Locations of the three input sources.
#[derive(Debug, Clone)]
pub struct InputPaths {
    pub trends_dir: PathBuf,
    pub crosswalk: PathBuf,
    pub scorecard: PathBuf,
}

pub struct PipelineOutput {
    /// Search interest, identifiers, outcomes (in that order).
    pub cleaning: Vec<CleaningReport>,
    pub join: JoinReport,
    pub table: AnalysisTable,
    pub summary: TableSummary,
}

pub fn run_pipeline(paths: &InputPaths, cfg: &PipelineConfig) -> Result<PipelineOutput> {
    let raw_search = sct_data::load_search_interest(&paths.trends_dir, cfg)
        .with_context(|| format!("loading search interest from {}", paths.trends_dir.display()))?;
    let raw_ids = sct_data::load_identifiers(&paths.crosswalk, cfg)
        .with_context(|| format!("loading identifier crosswalk {}", paths.crosswalk.display()))?;
    let raw_outcomes = sct_data::load_outcomes(&paths.scorecard, cfg)
        .with_context(|| format!("loading outcomes {}", paths.scorecard.display()))?;

    let (search, search_report) = sct_data::clean_search_interest(&raw_search, cfg);
    let (ids, id_report) = sct_data::clean_identifiers(&raw_ids, cfg);
    let (outcomes, outcome_report) = sct_data::clean_outcomes(&raw_outcomes, cfg);

    let (table, join) = sct_data::build_analysis_table(&ids, &outcomes, &search)
        .context("joining cleaned tables")?;
    let summary = table.summary();
    tracing::info!(
        rows = summary.rows,
        institutions = summary.institutions,
        months = summary.months,
        "analysis table ready"
    );

    Ok(PipelineOutput {
        cleaning: vec![search_report, id_report, outcome_report],
        join,
        table,
        summary,
    })
}
