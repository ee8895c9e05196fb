use serde::Serialize;

use crate::period::YearMonth;

/// One weekly (or monthly) row of a search-interest file, untyped.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSearchRecord {
    /// Institution name.
    pub institution_name: Option<String>,
    /// Search keyword.
    pub keyword: Option<String>,
    /// Period label (`YYYY-MM-DD - YYYY-MM-DD` or `YYYY-MM`).
    pub period: Option<String>,
    /// Raw search index.
    pub raw_index: Option<String>,
}

/// One crosswalk row, untyped.
#[derive(Debug, Clone, PartialEq)]
pub struct RawIdentifierRecord {
    /// Institution name.
    pub institution_name: Option<String>,
    /// OPEID.
    pub opeid: Option<String>,
    /// UNITID.
    pub unitid: Option<String>,
}

/// One outcomes row, untyped.
#[derive(Debug, Clone, PartialEq)]
pub struct RawOutcomesRecord {
    /// UNITID.
    pub unitid: Option<String>,
    /// OPEID.
    pub opeid: Option<String>,
    /// Predominant degree code.
    pub degree: Option<String>,
    /// State abbreviation.
    pub state: Option<String>,
    /// Locale code.
    pub locale: Option<String>,
    /// Control code.
    pub control: Option<String>,
    /// Minority-serving 0/1 flags, one per configured column.
    pub minority_flags: Vec<Option<String>>,
    /// Median earnings text (may be a sentinel).
    pub earnings: Option<String>,
}

/// Search interest aggregated to institution × keyword × month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchInterestRecord {
    /// Institution name.
    pub institution_name: String,
    /// Search keyword.
    pub keyword: String,
    /// Calendar month.
    pub year_month: YearMonth,
    /// Raw index summed over the month.
    pub monthly_sum: f64,
    /// z-score of `monthly_sum` within institution × keyword; `None` when undefined.
    pub index_std: Option<f64>,
    /// `year_month` is strictly after the release cutoff.
    pub after_release: bool,
    /// Month of year, 1–12.
    pub month_of_year: u32,
}

/// Crosswalk row after cleaning. Names are unique across the table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IdentifierRecord {
    /// Institution name.
    pub institution_name: String,
    /// Normalized OPEID.
    pub opeid: String,
    /// Normalized UNITID.
    pub unitid: String,
}

/// Outcomes row after cleaning (bachelor's-predominant, numeric earnings).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutcomesRecord {
    /// Normalized UNITID.
    pub unitid: String,
    /// Normalized OPEID.
    pub opeid: String,
    /// Predominant degree code.
    pub predominant_degree_type: u8,
    /// State abbreviation.
    pub state: String,
    /// Locale code.
    pub locale_code: u16,
    /// Control code.
    pub control_type: u8,
    /// Any minority-serving flag set.
    pub is_minority_serving: bool,
    /// Median earnings ten years after entry.
    pub median_earnings_10yr: f64,
    /// `locale_code` below the city cutoff.
    pub is_in_city: bool,
    /// Earnings above the threshold.
    pub is_high_earning: bool,
}

/// A fully populated row of the analysis table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisRow {
    /// Institution name.
    pub institution_name: String,
    /// Normalized UNITID.
    pub unitid: String,
    /// Normalized OPEID.
    pub opeid: String,
    /// Search keyword.
    pub keyword: String,
    /// Calendar month.
    pub year_month: YearMonth,
    /// Monthly summed search index.
    pub monthly_sum: f64,
    /// Standardized search index (response).
    pub index_std: f64,
    /// After the release cutoff.
    pub after_release: bool,
    /// Month of year, 1–12.
    pub month_of_year: u32,
    /// Predominant degree code.
    pub predominant_degree_type: u8,
    /// State abbreviation.
    pub state: String,
    /// Locale code.
    pub locale_code: u16,
    /// Control code.
    pub control_type: u8,
    /// Minority-serving.
    pub is_minority_serving: bool,
    /// Median earnings ten years after entry.
    pub median_earnings_10yr: f64,
    /// In a city.
    pub is_in_city: bool,
    /// High earning.
    pub is_high_earning: bool,
}
