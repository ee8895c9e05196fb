//! The joined analysis table.

use sct_core::{ColumnSource, Error, Result};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use crate::period::YearMonth;
use crate::records::AnalysisRow;

const NUMERIC_COLUMNS: &[&str] = &[
    "index_std",
    "monthly_sum",
    "after_release",
    "is_high_earning",
    "is_in_city",
    "is_minority_serving",
    "median_earnings_10yr",
    "locale_code",
];

const CATEGORICAL_COLUMNS: &[&str] =
    &["month_of_year", "state", "control_type", "keyword", "institution", "year_month"];

/// Immutable, fully populated analysis table.
#[derive(Debug, Clone)]
pub struct AnalysisTable {
    rows: Vec<AnalysisRow>,
}

/// Descriptive statistics of an analysis table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableSummary {
    /// Rows.
    pub rows: usize,
    /// Distinct institutions.
    pub institutions: usize,
    /// Distinct keywords.
    pub keywords: usize,
    /// Distinct months.
    pub months: usize,
    /// First month present.
    pub first_month: Option<YearMonth>,
    /// Last month present.
    pub last_month: Option<YearMonth>,
    /// Share of institutions that are high earning.
    pub share_high_earning: f64,
    /// Share of institutions in a city.
    pub share_in_city: f64,
    /// Mean of the institutions' median earnings.
    pub mean_earnings: f64,
}

/// Mean standardized index for one month (and optionally one city group).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyMean {
    /// Calendar month.
    pub year_month: YearMonth,
    /// City group when the series is split, `None` otherwise.
    pub in_city: Option<bool>,
    /// Mean of `index_std`.
    pub mean_index_std: f64,
    /// Rows averaged.
    pub n: usize,
}

fn flag(b: bool) -> f64 {
    if b { 1.0 } else { 0.0 }
}

/// Dense codes assigned in sorted order of the distinct values.
fn encode<K: Ord + Clone>(values: Vec<K>) -> Vec<usize> {
    let levels: BTreeMap<K, usize> = values
        .iter()
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .enumerate()
        .map(|(i, k)| (k, i))
        .collect();
    values.iter().map(|v| levels[v]).collect()
}

impl AnalysisTable {
    /// Wrap joined rows.
    pub fn new(rows: Vec<AnalysisRow>) -> Self {
        Self { rows }
    }

    /// All rows in join order.
    pub fn rows(&self) -> &[AnalysisRow] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Column names usable as numeric regressors.
    pub fn numeric_columns() -> &'static [&'static str] {
        NUMERIC_COLUMNS
    }

    /// Column names usable as fixed effects.
    pub fn categorical_columns() -> &'static [&'static str] {
        CATEGORICAL_COLUMNS
    }

    /// One `(institution, earnings)` pair per distinct institution, sorted by name.
    pub fn institution_earnings(&self) -> Vec<(String, f64)> {
        let mut seen: BTreeMap<&str, f64> = BTreeMap::new();
        for r in &self.rows {
            seen.entry(r.institution_name.as_str()).or_insert(r.median_earnings_10yr);
        }
        seen.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
    }

    /// Descriptive statistics.
    pub fn summary(&self) -> TableSummary {
        let mut institutions: BTreeMap<&str, &AnalysisRow> = BTreeMap::new();
        let mut keywords = BTreeSet::new();
        let mut months = BTreeSet::new();
        for r in &self.rows {
            institutions.entry(r.institution_name.as_str()).or_insert(r);
            keywords.insert(r.keyword.as_str());
            months.insert(r.year_month);
        }

        let n_inst = institutions.len();
        let share = |pred: fn(&AnalysisRow) -> bool| {
            if n_inst == 0 {
                0.0
            } else {
                institutions.values().filter(|r| pred(r)).count() as f64 / n_inst as f64
            }
        };
        let mean_earnings = if n_inst == 0 {
            0.0
        } else {
            institutions.values().map(|r| r.median_earnings_10yr).sum::<f64>() / n_inst as f64
        };

        TableSummary {
            rows: self.rows.len(),
            institutions: n_inst,
            keywords: keywords.len(),
            months: months.len(),
            first_month: months.first().copied(),
            last_month: months.last().copied(),
            share_high_earning: share(|r| r.is_high_earning),
            share_in_city: share(|r| r.is_in_city),
            mean_earnings,
        }
    }

    /// Mean `index_std` per month, optionally per city group, in month order.
    pub fn mean_index_by_month(&self, split_by_city: bool) -> Vec<MonthlyMean> {
        let mut acc: BTreeMap<(Option<bool>, YearMonth), (f64, usize)> = BTreeMap::new();
        for r in &self.rows {
            let group = split_by_city.then_some(r.is_in_city);
            let e = acc.entry((group, r.year_month)).or_insert((0.0, 0));
            e.0 += r.index_std;
            e.1 += 1;
        }
        acc.into_iter()
            .map(|((in_city, year_month), (sum, n))| MonthlyMean {
                year_month,
                in_city,
                mean_index_std: sum / n as f64,
                n,
            })
            .collect()
    }

    /// Write every row as CSV with a header.
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let mut w = csv::Writer::from_path(path)?;
        for r in &self.rows {
            w.serialize(r)?;
        }
        w.flush()?;
        tracing::info!(path = %path.display(), rows = self.rows.len(), "analysis table exported");
        Ok(())
    }
}

impl ColumnSource for AnalysisTable {
    fn n_rows(&self) -> usize {
        self.rows.len()
    }

    fn numeric(&self, name: &str) -> Result<Vec<f64>> {
        let rows = &self.rows;
        let col: Vec<f64> = match name {
            "index_std" => rows.iter().map(|r| r.index_std).collect(),
            "monthly_sum" => rows.iter().map(|r| r.monthly_sum).collect(),
            "after_release" => rows.iter().map(|r| flag(r.after_release)).collect(),
            "is_high_earning" => rows.iter().map(|r| flag(r.is_high_earning)).collect(),
            "is_in_city" => rows.iter().map(|r| flag(r.is_in_city)).collect(),
            "is_minority_serving" => rows.iter().map(|r| flag(r.is_minority_serving)).collect(),
            "median_earnings_10yr" => rows.iter().map(|r| r.median_earnings_10yr).collect(),
            "locale_code" => rows.iter().map(|r| f64::from(r.locale_code)).collect(),
            _ => {
                return Err(Error::Validation(format!(
                    "unknown numeric column '{}' (available: {})",
                    name,
                    NUMERIC_COLUMNS.join(", ")
                )));
            }
        };
        Ok(col)
    }

    fn categorical(&self, name: &str) -> Result<Vec<usize>> {
        let rows = &self.rows;
        let codes = match name {
            "month_of_year" => encode(rows.iter().map(|r| r.month_of_year).collect()),
            "state" => encode(rows.iter().map(|r| r.state.as_str()).collect()),
            "control_type" => encode(rows.iter().map(|r| r.control_type).collect()),
            "keyword" => encode(rows.iter().map(|r| r.keyword.as_str()).collect()),
            "institution" => encode(rows.iter().map(|r| r.institution_name.as_str()).collect()),
            "year_month" => encode(rows.iter().map(|r| r.year_month).collect()),
            _ => {
                return Err(Error::Validation(format!(
                    "unknown categorical column '{}' (available: {})",
                    name,
                    CATEGORICAL_COLUMNS.join(", ")
                )));
            }
        };
        Ok(codes)
    }
}
