//! Per-source cleaners.
//!
//! Every cleaner is a pure function of its raw rows and the pipeline config,
//! returning the typed table together with a [`CleaningReport`] of what was
//! dropped and why.

use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use crate::config::PipelineConfig;
use crate::period::YearMonth;
use crate::records::{
    IdentifierRecord, OutcomesRecord, RawIdentifierRecord, RawOutcomesRecord, RawSearchRecord,
    SearchInterestRecord,
};

/// Row accounting for one cleaned table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleaningReport {
    /// Table name.
    pub table: String,
    /// Rows received from the loader.
    pub rows_in: usize,
    /// Rows with at least one null field.
    pub dropped_null: usize,
    /// Rows whose earnings were a sentinel string.
    pub dropped_sentinel: usize,
    /// Rows with a field that failed type coercion.
    pub dropped_malformed: usize,
    /// Rows outside the retained degree type.
    pub dropped_degree: usize,
    /// Rows whose institution name was not unique.
    pub dropped_duplicate_name: usize,
    /// Rows surviving the filters (before any aggregation).
    pub rows_kept: usize,
    /// Rows in the cleaned table.
    pub rows_out: usize,
}

impl CleaningReport {
    fn new(table: &str, rows_in: usize) -> Self {
        Self { table: table.to_string(), rows_in, ..Default::default() }
    }

    fn log(&self) {
        tracing::info!(
            table = %self.table,
            rows_in = self.rows_in,
            dropped_null = self.dropped_null,
            dropped_sentinel = self.dropped_sentinel,
            dropped_malformed = self.dropped_malformed,
            dropped_degree = self.dropped_degree,
            dropped_duplicate_name = self.dropped_duplicate_name,
            rows_out = self.rows_out,
            "table cleaned"
        );
        if self.dropped_malformed > 0 {
            tracing::warn!(
                table = %self.table,
                rows = self.dropped_malformed,
                "dropped rows with values that failed type coercion"
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Derived columns
// ---------------------------------------------------------------------------

/// Locale codes below `cutoff` are city locales.
pub fn is_in_city(locale_code: u16, cutoff: u16) -> bool {
    locale_code < cutoff
}

/// Earnings strictly above `threshold`.
pub fn is_high_earning(earnings: f64, threshold: f64) -> bool {
    earnings > threshold
}

/// Months strictly after `cutoff`.
pub fn is_after_release(year_month: YearMonth, cutoff: YearMonth) -> bool {
    year_month > cutoff
}

/// z-scores of `values` using the sample standard deviation.
///
/// Returns `None` for fewer than two values or zero / non-finite spread.
pub fn standardize(values: &[f64]) -> Option<Vec<f64>> {
    let n = values.len();
    if n < 2 {
        return None;
    }
    let mean = values.iter().sum::<f64>() / n as f64;
    let var = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / (n - 1) as f64;
    let sd = var.sqrt();
    if !sd.is_finite() || sd <= 0.0 {
        return None;
    }
    Some(values.iter().map(|v| (v - mean) / sd).collect())
}

/// Canonical form of a UNITID / OPEID: trimmed; digit strings lose leading zeros.
pub fn normalize_id(raw: &str) -> String {
    let t = raw.trim();
    if !t.is_empty() && t.bytes().all(|b| b.is_ascii_digit()) {
        let s = t.trim_start_matches('0');
        if s.is_empty() { "0".to_string() } else { s.to_string() }
    } else {
        t.to_string()
    }
}

/// Parse an integer code, accepting integral floats such as `"3.0"`.
fn parse_code(s: &str) -> Option<i64> {
    if let Ok(v) = s.parse::<i64>() {
        return Some(v);
    }
    let f = s.parse::<f64>().ok()?;
    if f.is_finite() && f.fract() == 0.0 { Some(f as i64) } else { None }
}

fn parse_finite(s: &str) -> Option<f64> {
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

// ---------------------------------------------------------------------------
// Search interest
// ---------------------------------------------------------------------------

/// Clean, aggregate to months, and standardize the search-interest rows.
///
/// Output is one row per institution × keyword × month, sorted by those keys.
pub fn clean_search_interest(
    raw: &[RawSearchRecord],
    cfg: &PipelineConfig,
) -> (Vec<SearchInterestRecord>, CleaningReport) {
    let mut report = CleaningReport::new("search_interest", raw.len());

    // (institution, keyword) -> month -> summed index
    let mut groups: BTreeMap<(String, String), BTreeMap<YearMonth, f64>> = BTreeMap::new();

    for r in raw {
        let (Some(name), Some(kw), Some(period), Some(idx)) =
            (&r.institution_name, &r.keyword, &r.period, &r.raw_index)
        else {
            report.dropped_null += 1;
            continue;
        };
        let (Ok(ym), Some(value)) = (YearMonth::parse_label(period), parse_finite(idx)) else {
            report.dropped_malformed += 1;
            continue;
        };
        report.rows_kept += 1;
        *groups
            .entry((name.clone(), kw.clone()))
            .or_default()
            .entry(ym)
            .or_insert(0.0) += value;
    }

    let cutoff = cfg.derive.release_cutoff;
    let mut out = Vec::new();
    let mut undefined_groups = 0usize;
    for ((name, kw), months) in groups {
        let sums: Vec<f64> = months.values().copied().collect();
        let z = standardize(&sums);
        if z.is_none() {
            undefined_groups += 1;
        }
        for (i, (ym, sum)) in months.into_iter().enumerate() {
            out.push(SearchInterestRecord {
                institution_name: name.clone(),
                keyword: kw.clone(),
                year_month: ym,
                monthly_sum: sum,
                index_std: z.as_ref().map(|z| z[i]),
                after_release: is_after_release(ym, cutoff),
                month_of_year: ym.month(),
            });
        }
    }

    if undefined_groups > 0 {
        tracing::warn!(
            groups = undefined_groups,
            "institution x keyword groups without a defined z-score \
             (single month or constant index)"
        );
    }

    report.rows_out = out.len();
    report.log();
    (out, report)
}

// ---------------------------------------------------------------------------
// Identifier crosswalk
// ---------------------------------------------------------------------------

/// Drop null rows, normalize ids, and remove every row whose name is not unique.
pub fn clean_identifiers(
    raw: &[RawIdentifierRecord],
    _cfg: &PipelineConfig,
) -> (Vec<IdentifierRecord>, CleaningReport) {
    let mut report = CleaningReport::new("identifier", raw.len());

    let mut complete = Vec::with_capacity(raw.len());
    for r in raw {
        match (&r.institution_name, &r.opeid, &r.unitid) {
            (Some(name), Some(opeid), Some(unitid)) => complete.push(IdentifierRecord {
                institution_name: name.clone(),
                opeid: normalize_id(opeid),
                unitid: normalize_id(unitid),
            }),
            _ => report.dropped_null += 1,
        }
    }

    let mut name_counts: HashMap<&str, usize> = HashMap::new();
    for r in &complete {
        *name_counts.entry(r.institution_name.as_str()).or_insert(0) += 1;
    }
    let duplicated: std::collections::HashSet<String> = name_counts
        .into_iter()
        .filter(|&(_, c)| c > 1)
        .map(|(n, _)| n.to_string())
        .collect();

    let out: Vec<IdentifierRecord> = complete
        .into_iter()
        .filter(|r| {
            let keep = !duplicated.contains(&r.institution_name);
            if !keep {
                report.dropped_duplicate_name += 1;
            }
            keep
        })
        .collect();

    if !duplicated.is_empty() {
        tracing::debug!(names = duplicated.len(), "ambiguous institution names removed");
    }

    report.rows_kept = out.len();
    report.rows_out = out.len();
    report.log();
    (out, report)
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Filter and type the outcomes rows, then derive the city / earnings flags.
pub fn clean_outcomes(
    raw: &[RawOutcomesRecord],
    cfg: &PipelineConfig,
) -> (Vec<OutcomesRecord>, CleaningReport) {
    let mut report = CleaningReport::new("outcomes", raw.len());
    let d = &cfg.derive;

    let mut out = Vec::new();
    for r in raw {
        let (
            Some(unitid),
            Some(opeid),
            Some(degree),
            Some(state),
            Some(locale),
            Some(control),
            Some(earnings),
        ) = (&r.unitid, &r.opeid, &r.degree, &r.state, &r.locale, &r.control, &r.earnings)
        else {
            report.dropped_null += 1;
            continue;
        };
        let flags: Option<Vec<&String>> = r.minority_flags.iter().map(|f| f.as_ref()).collect();
        let Some(flags) = flags else {
            report.dropped_null += 1;
            continue;
        };

        if d.earnings_sentinels.iter().any(|s| s == earnings) {
            report.dropped_sentinel += 1;
            continue;
        }

        let earnings = parse_finite(earnings);
        let degree = parse_code(degree).and_then(|v| u8::try_from(v).ok());
        let locale = parse_code(locale).and_then(|v| u16::try_from(v).ok());
        let control = parse_code(control).and_then(|v| u8::try_from(v).ok());
        let flag_values: Option<Vec<i64>> = flags.iter().map(|f| parse_code(f)).collect();
        let (Some(earnings), Some(degree), Some(locale), Some(control), Some(flag_values)) =
            (earnings, degree, locale, control, flag_values)
        else {
            report.dropped_malformed += 1;
            continue;
        };

        if degree != d.bachelor_degree_code {
            report.dropped_degree += 1;
            continue;
        }

        out.push(OutcomesRecord {
            unitid: normalize_id(unitid),
            opeid: normalize_id(opeid),
            predominant_degree_type: degree,
            state: state.clone(),
            locale_code: locale,
            control_type: control,
            is_minority_serving: flag_values.iter().any(|&v| v == 1),
            median_earnings_10yr: earnings,
            is_in_city: is_in_city(locale, d.city_locale_cutoff),
            is_high_earning: is_high_earning(earnings, d.earnings_threshold),
        });
    }

    report.rows_kept = out.len();
    report.rows_out = out.len();
    report.log();
    (out, report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    fn s(v: &str) -> Option<String> {
        Some(v.to_string())
    }

    fn search(name: &str, kw: &str, period: &str, idx: &str) -> RawSearchRecord {
        RawSearchRecord {
            institution_name: s(name),
            keyword: s(kw),
            period: s(period),
            raw_index: s(idx),
        }
    }

    fn outcome(unitid: &str, degree: &str, locale: &str, earnings: &str) -> RawOutcomesRecord {
        RawOutcomesRecord {
            unitid: s(unitid),
            opeid: s(&format!("00{unitid}00")),
            degree: s(degree),
            state: s("CA"),
            locale: s(locale),
            control: s("1"),
            minority_flags: vec![s("0")],
            earnings: s(earnings),
        }
    }

    #[test]
    fn derived_flag_boundaries() {
        assert!(!is_high_earning(61_400.0, 61_400.0));
        assert!(is_high_earning(61_400.01, 61_400.0));
        assert!(!is_in_city(14, 14));
        assert!(is_in_city(13, 14));

        let cutoff = YearMonth::new(2015, 9).unwrap();
        assert!(!is_after_release("2015-08".parse().unwrap(), cutoff));
        assert!(!is_after_release("2015-09".parse().unwrap(), cutoff));
        assert!(is_after_release("2015-10".parse().unwrap(), cutoff));
    }

    #[test]
    fn normalize_ids() {
        assert_eq!(normalize_id(" 00100200 "), "100200");
        assert_eq!(normalize_id("100200"), "100200");
        assert_eq!(normalize_id("000"), "0");
        assert_eq!(normalize_id("A-01"), "A-01");
    }

    #[test]
    fn search_interest_aggregates_weeks_into_months() {
        let raw = vec![
            search("Alpha U", "alpha", "2015-08-02 - 2015-08-08", "10"),
            search("Alpha U", "alpha", "2015-08-09 - 2015-08-15", "20"),
            search("Alpha U", "alpha", "2015-09-06 - 2015-09-12", "60"),
            search("Alpha U", "alpha", "2015-10-04 - 2015-10-10", "90"),
            search("Alpha U", "alpha", "2015-10-11 - 2015-10-17", "<1"),
            RawSearchRecord { raw_index: None, ..search("Alpha U", "alpha", "2015-10", "1") },
        ];
        let (rows, report) = clean_search_interest(&raw, &PipelineConfig::default());

        assert_eq!(report.rows_in, 6);
        assert_eq!(report.dropped_null, 1);
        assert_eq!(report.dropped_malformed, 1);
        assert_eq!(report.rows_kept, 4);
        assert_eq!(report.rows_out, 3);

        let sums: Vec<f64> = rows.iter().map(|r| r.monthly_sum).collect();
        assert_eq!(sums, vec![30.0, 60.0, 90.0]);
        assert_eq!(rows.iter().map(|r| r.after_release).collect::<Vec<_>>(), vec![
            false, false, true
        ]);
        assert_eq!(rows[2].month_of_year, 10);

        // sums 30, 60, 90: mean 60, sample sd 30
        assert_relative_eq!(rows[0].index_std.unwrap(), -1.0, epsilon = 1e-12);
        assert_relative_eq!(rows[1].index_std.unwrap(), 0.0, epsilon = 1e-12);
        assert_relative_eq!(rows[2].index_std.unwrap(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn single_month_group_has_no_z_score() {
        let raw = vec![search("Beta", "beta", "2015-05", "5")];
        let (rows, _) = clean_search_interest(&raw, &PipelineConfig::default());
        assert_eq!(rows.len(), 1);
        assert!(rows[0].index_std.is_none());
    }

    #[test]
    fn identifiers_drop_every_duplicated_name() {
        let raw = vec![
            RawIdentifierRecord { institution_name: s("Dup"), opeid: s("1"), unitid: s("11") },
            RawIdentifierRecord { institution_name: s("Dup"), opeid: s("2"), unitid: s("22") },
            RawIdentifierRecord { institution_name: s("Solo"), opeid: s("003"), unitid: s("33") },
            RawIdentifierRecord { institution_name: s("Null"), opeid: None, unitid: s("44") },
        ];
        let (rows, report) = clean_identifiers(&raw, &PipelineConfig::default());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].institution_name, "Solo");
        assert_eq!(rows[0].opeid, "3");
        assert_eq!(report.dropped_null, 1);
        assert_eq!(report.dropped_duplicate_name, 2);
        assert_eq!(report.rows_out, 1);
    }

    #[test]
    fn outcomes_filters_and_flags() {
        let raw = vec![
            outcome("1", "3", "11", "61400"),
            outcome("2", "3", "14", "61401"),
            outcome("3", "2", "12", "50000"),
            outcome("4", "3", "12", "PrivacySuppressed"),
            outcome("5", "3", "12", "NULL"),
            outcome("6", "3", "NULL", "70000"),
            RawOutcomesRecord { state: None, ..outcome("7", "3", "12", "70000") },
            RawOutcomesRecord { minority_flags: vec![None], ..outcome("8", "3", "12", "1") },
        ];
        let (rows, report) = clean_outcomes(&raw, &PipelineConfig::default());

        assert_eq!(report.dropped_null, 2);
        assert_eq!(report.dropped_sentinel, 2);
        assert_eq!(report.dropped_malformed, 1);
        assert_eq!(report.dropped_degree, 1);
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.predominant_degree_type == 3));

        assert!(rows[0].is_in_city);
        assert!(!rows[0].is_high_earning);
        assert!(!rows[1].is_in_city);
        assert!(rows[1].is_high_earning);
        assert_eq!(rows[0].opeid, "100");
    }

    #[test]
    fn minority_flag_any_of_many() {
        let mut cfg = PipelineConfig::default();
        cfg.columns.outcomes.minority_serving = vec!["HBCU".into(), "HSI".into()];
        let raw = vec![RawOutcomesRecord {
            minority_flags: vec![s("0"), s("1.0")],
            ..outcome("1", "3", "21", "40000")
        }];
        let (rows, _) = clean_outcomes(&raw, &cfg);
        assert!(rows[0].is_minority_serving);
    }

    proptest! {
        #[test]
        fn standardized_groups_have_zero_mean_unit_sd(
            values in proptest::collection::vec(0.0f64..1e4, 2..40)
        ) {
            if let Some(z) = standardize(&values) {
                let n = z.len() as f64;
                let mean = z.iter().sum::<f64>() / n;
                let sd = (z.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0)).sqrt();
                prop_assert!(mean.abs() < 1e-9);
                prop_assert!((sd - 1.0).abs() < 1e-9);
            }
        }
    }
}
