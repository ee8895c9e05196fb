use serde::{Deserialize, Serialize};

use crate::period::YearMonth;

/// Everything the loaders and cleaners need to know about the inputs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// File discovery and parsing.
    pub inputs: InputConfig,
    /// Source column names.
    pub columns: ColumnMapping,
    /// Constants for derived columns and filters.
    pub derive: DeriveConfig,
}

/// File discovery and cell parsing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Glob matched against file names in the search-interest directory.
    pub search_pattern: String,
    /// Cell values (after trimming) treated as null.
    pub null_tokens: Vec<String>,
    /// Field delimiter override. When unset, `.tsv` files use tab, others comma.
    pub delimiter: Option<char>,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            search_pattern: "trends_up_to_*.csv".into(),
            null_tokens: vec![String::new(), "NA".into()],
            delimiter: None,
        }
    }
}

/// Column names per source.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnMapping {
    /// Search-interest files.
    pub search: SearchColumns,
    /// Identifier crosswalk.
    pub identifier: IdentifierColumns,
    /// Outcomes dataset.
    pub outcomes: OutcomesColumns,
}

/// Search-interest column names.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchColumns {
    /// Institution name.
    pub institution: String,
    /// Search keyword.
    pub keyword: String,
    /// Week or month label.
    pub period: String,
    /// Raw search index.
    pub index: String,
}

impl Default for SearchColumns {
    fn default() -> Self {
        Self {
            institution: "schname".into(),
            keyword: "keyword".into(),
            period: "monthorweek".into(),
            index: "index".into(),
        }
    }
}

/// Identifier-crosswalk column names.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentifierColumns {
    /// Institution name.
    pub institution: String,
    /// UNITID.
    pub unitid: String,
    /// OPEID.
    pub opeid: String,
}

impl Default for IdentifierColumns {
    fn default() -> Self {
        Self { institution: "schname".into(), unitid: "unitid".into(), opeid: "opeid".into() }
    }
}

/// Outcomes column names.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutcomesColumns {
    /// UNITID.
    pub unitid: String,
    /// OPEID.
    pub opeid: String,
    /// Predominant degree awarded.
    pub degree: String,
    /// State abbreviation.
    pub state: String,
    /// Locale code.
    pub locale: String,
    /// Control (public / private nonprofit / for-profit).
    pub control: String,
    /// 0/1 flag columns; an institution is minority-serving if any flag is 1.
    pub minority_serving: Vec<String>,
    /// Median earnings ten years after entry.
    pub earnings: String,
}

impl Default for OutcomesColumns {
    fn default() -> Self {
        Self {
            unitid: "UNITID".into(),
            opeid: "OPEID".into(),
            degree: "PREDDEG".into(),
            state: "STABBR".into(),
            locale: "LOCALE".into(),
            control: "CONTROL".into(),
            minority_serving: vec!["HBCU".into()],
            earnings: "md_earn_wne_p10-REPORTED-EARNINGS".into(),
        }
    }
}

/// Thresholds and codes used by the cleaners.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeriveConfig {
    /// Months strictly after this one are `after_release`.
    pub release_cutoff: YearMonth,
    /// Earnings strictly above this are `is_high_earning`.
    pub earnings_threshold: f64,
    /// Locale codes strictly below this are `is_in_city`.
    pub city_locale_cutoff: u16,
    /// Predominant-degree code retained by the outcomes cleaner.
    pub bachelor_degree_code: u8,
    /// Earnings strings dropped before numeric coercion.
    pub earnings_sentinels: Vec<String>,
}

impl Default for DeriveConfig {
    fn default() -> Self {
        Self {
            // 2015-09
            release_cutoff: YearMonth::from_ordinal(2015 * 12 + 8),
            earnings_threshold: 61_400.0,
            city_locale_cutoff: 14,
            bachelor_degree_code: 3,
            earnings_sentinels: vec!["PrivacySuppressed".into(), "NULL".into()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_published_analysis() {
        let cfg = PipelineConfig::default();
        assert_eq!(cfg.derive.release_cutoff.to_string(), "2015-09");
        assert_eq!(cfg.derive.earnings_threshold, 61_400.0);
        assert_eq!(cfg.derive.city_locale_cutoff, 14);
        assert_eq!(cfg.derive.bachelor_degree_code, 3);
        assert_eq!(cfg.inputs.search_pattern, "trends_up_to_*.csv");
        assert_eq!(cfg.columns.outcomes.minority_serving, vec!["HBCU".to_string()]);
    }
}
