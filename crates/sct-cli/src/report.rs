//! Console report: audit tables, the side-by-side coefficient table, the
//! Wald test and a plain-language reading of the estimates.

use comfy_table::{Cell, CellAlignment, ContentArrangement, Table, presets};
use sct_core::RegressionFit;
use sct_data::{CleaningReport, JoinReport, TableSummary};
use sct_inference::{ModelOptions, ModelSet, WaldTest};
use sct_viz::{DensityArtifact, TrendArtifact};
use serde::Serialize;

use crate::analysis_config::AnalysisConfig;

pub const RESULTS_V0: &str = "sctrends_results_v0";

/// Everything `report --output` serializes.
#[derive(Debug, Serialize)]
pub struct Results<'a> {
    pub schema_version: &'static str,
    pub tool_version: &'static str,
    pub config: &'a AnalysisConfig,
    pub cleaning: &'a [CleaningReport],
    pub join: &'a JoinReport,
    pub summary: &'a TableSummary,
    pub models: &'a ModelSet,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub density: Option<&'a DensityArtifact>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trend: Option<&'a TrendArtifact>,
}

fn new_table() -> Table {
    let mut t = Table::new();
    t.load_preset(presets::UTF8_FULL).set_content_arrangement(ContentArrangement::Dynamic);
    t
}

fn right(s: impl ToString) -> Cell {
    Cell::new(s).set_alignment(CellAlignment::Right)
}

/// Significance code for a p-value.
pub fn stars(p: f64) -> &'static str {
    if !p.is_finite() {
        ""
    } else if p < 0.001 {
        "***"
    } else if p < 0.01 {
        "**"
    } else if p < 0.05 {
        "*"
    } else if p < 0.1 {
        "."
    } else {
        ""
    }
}

pub fn format_p(p: f64) -> String {
    if p < 0.001 { "<0.001".to_string() } else { format!("{p:.3}") }
}

pub fn cleaning_table(reports: &[CleaningReport]) -> Table {
    let mut t = new_table();
    t.set_header(vec![
        "table",
        "rows in",
        "null",
        "sentinel",
        "malformed",
        "degree",
        "dup. name",
        "kept",
        "rows out",
    ]);
    for r in reports {
        t.add_row(vec![
            Cell::new(&r.table),
            right(r.rows_in),
            right(r.dropped_null),
            right(r.dropped_sentinel),
            right(r.dropped_malformed),
            right(r.dropped_degree),
            right(r.dropped_duplicate_name),
            right(r.rows_kept),
            right(r.rows_out),
        ]);
    }
    t
}

pub fn join_table(join: &JoinReport) -> Table {
    let mut t = new_table();
    t.set_header(vec!["join stage", "rows"]);
    t.add_row(vec![Cell::new("identifier ⟕ outcomes"), right(join.left_join_rows)]);
    t.add_row(vec![Cell::new("  with an outcomes match"), right(join.matched_outcomes)]);
    t.add_row(vec![Cell::new("⋈ search interest"), right(join.inner_join_rows)]);
    t.add_row(vec![Cell::new("complete rows"), right(join.complete_rows)]);
    t.add_row(vec![Cell::new("institutions"), right(join.institutions)]);
    t
}

pub fn summary_table(s: &TableSummary) -> Table {
    let month =
        |m: Option<sct_data::YearMonth>| m.map(|m| m.to_string()).unwrap_or_else(|| "-".into());
    let mut t = new_table();
    t.set_header(vec!["statistic", "value"]);
    t.add_row(vec![Cell::new("rows"), right(s.rows)]);
    t.add_row(vec![Cell::new("institutions"), right(s.institutions)]);
    t.add_row(vec![Cell::new("keywords"), right(s.keywords)]);
    t.add_row(vec![
        Cell::new("months"),
        right(format!("{} ({} to {})", s.months, month(s.first_month), month(s.last_month))),
    ]);
    t.add_row(vec![Cell::new("share high-earning"), right(format!("{:.3}", s.share_high_earning))]);
    t.add_row(vec![Cell::new("share in city"), right(format!("{:.3}", s.share_in_city))]);
    t.add_row(vec![Cell::new("mean earnings"), right(format!("{:.0}", s.mean_earnings))]);
    t
}

/// Terms in first-appearance order across the fits.
fn term_order(fits: &[&RegressionFit]) -> Vec<String> {
    let mut terms: Vec<String> = Vec::new();
    for fit in fits {
        for c in &fit.coefficients {
            if !terms.contains(&c.term) {
                terms.push(c.term.clone());
            }
        }
    }
    terms
}

fn footer_row(
    label: &str,
    fits: &[&RegressionFit],
    f: impl Fn(&RegressionFit) -> String,
) -> Vec<Cell> {
    let mut row = vec![Cell::new(label)];
    row.extend(fits.iter().map(|fit| right(f(fit))));
    row
}

/// Side-by-side coefficient table; robust SE in parentheses under each estimate.
pub fn coefficient_table(fits: &[&RegressionFit]) -> Table {
    let mut t = new_table();
    let mut header = vec![Cell::new("")];
    header.extend(fits.iter().map(|f| Cell::new(&f.label).set_alignment(CellAlignment::Center)));
    t.set_header(header);

    for term in term_order(fits) {
        let mut est = vec![Cell::new(&term)];
        let mut se = vec![Cell::new("")];
        for fit in fits {
            match fit.coefficient(&term) {
                Some(c) => {
                    est.push(right(format!("{:.4}{}", c.estimate, stars(c.p_value))));
                    se.push(right(format!("({:.4})", c.std_error)));
                }
                None => {
                    est.push(Cell::new(""));
                    se.push(Cell::new(""));
                }
            }
        }
        t.add_row(est);
        t.add_row(se);
    }

    t.add_row(footer_row("Fixed effects", fits, |f| {
        if f.absorbed.is_empty() { "none".into() } else { f.absorbed.join(", ") }
    }));
    t.add_row(footer_row("SE type", fits, |f| f.covariance_type.to_string()));
    t.add_row(footer_row("N", fits, |f| f.n_obs.to_string()));
    t.add_row(footer_row("R²", fits, |f| format!("{:.4}", f.r_squared)));
    t.add_row(footer_row("Adj. R²", fits, |f| format!("{:.4}", f.adj_r_squared)));
    t
}

pub fn wald_table(w: &WaldTest) -> Table {
    let mut t = new_table();
    t.set_header(vec!["model", "H0", "estimate", "std. error", "F", "df", "p"]);
    let estimate = w.estimate.iter().map(|e| format!("{e:.4}")).collect::<Vec<_>>().join(", ");
    t.add_row(vec![
        Cell::new(&w.model),
        Cell::new(&w.hypothesis),
        right(estimate),
        right(w.std_error.map(|s| format!("{s:.4}")).unwrap_or_else(|| "-".into())),
        right(format!("{:.3}", w.f_stat)),
        right(format!("{}, {}", w.df_num, w.df_denom)),
        right(format_p(w.p_value)),
    ]);
    t
}

fn verdict(p: f64, alpha: f64) -> String {
    if p < alpha {
        format!("significant at α = {alpha}")
    } else {
        format!("not significant at α = {alpha}")
    }
}

/// Plain-language reading of the fitted models.
pub fn narrate(set: &ModelSet, opts: &ModelOptions, alpha: f64) -> Vec<String> {
    let mut out = Vec::new();
    let inter = opts.interaction();

    if let Some(c) = set.a.coefficient(&opts.period) {
        out.push(format!(
            "{}: outside the {} group, mean {} changed by {:+.4} after the release (p = {}, {}).",
            set.a.label,
            opts.group,
            opts.response,
            c.estimate,
            format_p(c.p_value),
            verdict(c.p_value, alpha)
        ));
    }

    if let Some(c) = set.a.coefficient(&inter) {
        let direction = if c.estimate >= 0.0 { "larger" } else { "smaller" };
        out.push(format!(
            "{}: the {} group's post-release change was {:.4} {} than the rest (p = {}, {}).",
            set.a.label,
            opts.group,
            c.estimate.abs(),
            direction,
            format_p(c.p_value),
            verdict(c.p_value, alpha)
        ));
    }

    let inter_estimates: Vec<(&str, f64)> = set
        .fits()
        .into_iter()
        .filter_map(|f| f.coefficient(&inter).map(|c| (f.label.as_str(), c.estimate)))
        .collect();
    if inter_estimates.len() > 1 {
        let lo = inter_estimates.iter().map(|e| e.1).fold(f64::INFINITY, f64::min);
        let hi = inter_estimates.iter().map(|e| e.1).fold(f64::NEG_INFINITY, f64::max);
        let listed = inter_estimates
            .iter()
            .map(|(label, e)| format!("{label} {e:.4}"))
            .collect::<Vec<_>>()
            .join(", ");
        out.push(format!(
            "The {inter} estimate ranges over {listed} (spread {:.4}).",
            hi - lo
        ));
    }

    let w = &set.wald;
    let conclusion = if w.rejects(alpha) {
        format!("the {} group's search interest changed after the release", opts.group)
    } else {
        format!("no post-release change is detected for the {} group", opts.group)
    };
    out.push(format!(
        "Wald test on {} of {}: F({}, {}) = {:.3}, p = {}; at α = {alpha} {conclusion}.",
        w.model,
        w.hypothesis,
        w.df_num,
        w.df_denom,
        w.f_stat,
        format_p(w.p_value)
    ));
    out
}

/// Full console report for `report`.
pub fn render_report(
    cleaning: &[CleaningReport],
    join: &JoinReport,
    summary: &TableSummary,
    set: &ModelSet,
    opts: &ModelOptions,
    alpha: f64,
) -> String {
    let mut s = String::new();
    s.push_str(&audit_section(cleaning, join, summary));

    s.push_str("\nModels\n");
    for (fit, formula) in set.fits().iter().zip(&set.formulas) {
        s.push_str(&format!("  {}: {formula}\n", fit.label));
    }
    s.push_str(&format!("{}\n", coefficient_table(&set.fits())));
    s.push_str("Signif. codes: 0 '***' 0.001 '**' 0.01 '*' 0.05 '.' 0.1 ' ' 1\n");

    s.push_str("\nRelease-effect test\n");
    s.push_str(&format!("{}\n", wald_table(&set.wald)));

    s.push_str("\nInterpretation\n");
    for line in narrate(set, opts, alpha) {
        s.push_str(&format!("  {line}\n"));
    }
    s
}

/// Cleaning, join and summary tables (the `audit` output).
pub fn audit_section(
    cleaning: &[CleaningReport],
    join: &JoinReport,
    summary: &TableSummary,
) -> String {
    format!(
        "Cleaning\n{}\n\nJoin\n{}\n\nAnalysis table\n{}\n",
        cleaning_table(cleaning),
        join_table(join),
        summary_table(summary)
    )
}
