//! Key-based joins.
//!
//! identifier ⟕ outcomes on (UNITID, OPEID), then ⋈ search interest on the
//! institution name, then a completeness filter.

use serde::Serialize;
use sct_core::{Error, Result};
use std::collections::{HashMap, HashSet};

use crate::records::{AnalysisRow, IdentifierRecord, OutcomesRecord, SearchInterestRecord};
use crate::table::AnalysisTable;

/// Row accounting for the join stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct JoinReport {
    /// Rows after identifier ⟕ outcomes.
    pub left_join_rows: usize,
    /// Of those, rows that found an outcomes match.
    pub matched_outcomes: usize,
    /// Rows after the inner join with search interest.
    pub inner_join_rows: usize,
    /// Rows surviving the completeness filter.
    pub complete_rows: usize,
    /// Distinct institutions in the final table.
    pub institutions: usize,
}

/// Join the cleaned tables into the analysis table.
///
/// Fails only when nothing survives, since no model can be fitted on an
/// empty table.
pub fn build_analysis_table(
    identifiers: &[IdentifierRecord],
    outcomes: &[OutcomesRecord],
    search: &[SearchInterestRecord],
) -> Result<(AnalysisTable, JoinReport)> {
    let mut report = JoinReport::default();

    // identifier ⟕ outcomes
    let mut by_key: HashMap<(&str, &str), Vec<&OutcomesRecord>> = HashMap::new();
    for o in outcomes {
        by_key.entry((o.unitid.as_str(), o.opeid.as_str())).or_default().push(o);
    }
    let mut left: Vec<(&IdentifierRecord, Option<&OutcomesRecord>)> = Vec::new();
    for id in identifiers {
        match by_key.get(&(id.unitid.as_str(), id.opeid.as_str())) {
            Some(matches) => {
                for o in matches {
                    left.push((id, Some(*o)));
                }
                report.matched_outcomes += matches.len();
            }
            None => left.push((id, None)),
        }
    }
    report.left_join_rows = left.len();

    // ⋈ search interest on name
    let mut by_name: HashMap<&str, Vec<&SearchInterestRecord>> = HashMap::new();
    for s in search {
        by_name.entry(s.institution_name.as_str()).or_default().push(s);
    }

    let mut rows = Vec::new();
    for (id, outcome) in left {
        let Some(matches) = by_name.get(id.institution_name.as_str()) else {
            continue;
        };
        report.inner_join_rows += matches.len();

        // completeness: a matched outcome and a defined z-score
        let Some(o) = outcome else {
            continue;
        };
        for s in matches {
            let Some(index_std) = s.index_std else {
                continue;
            };
            rows.push(AnalysisRow {
                institution_name: id.institution_name.clone(),
                unitid: id.unitid.clone(),
                opeid: id.opeid.clone(),
                keyword: s.keyword.clone(),
                year_month: s.year_month,
                monthly_sum: s.monthly_sum,
                index_std,
                after_release: s.after_release,
                month_of_year: s.month_of_year,
                predominant_degree_type: o.predominant_degree_type,
                state: o.state.clone(),
                locale_code: o.locale_code,
                control_type: o.control_type,
                is_minority_serving: o.is_minority_serving,
                median_earnings_10yr: o.median_earnings_10yr,
                is_in_city: o.is_in_city,
                is_high_earning: o.is_high_earning,
            });
        }
    }
    report.complete_rows = rows.len();
    report.institutions =
        rows.iter().map(|r| r.institution_name.as_str()).collect::<HashSet<_>>().len();

    tracing::info!(
        left_join_rows = report.left_join_rows,
        matched_outcomes = report.matched_outcomes,
        inner_join_rows = report.inner_join_rows,
        complete_rows = report.complete_rows,
        institutions = report.institutions,
        "analysis table joined"
    );

    if rows.is_empty() {
        return Err(Error::Validation(
            "analysis table is empty after joining (check identifier keys and institution names)"
                .into(),
        ));
    }
    Ok((AnalysisTable::new(rows), report))
}
