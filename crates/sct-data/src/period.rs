use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use sct_core::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// A calendar month. Orders chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    /// Build from a year and a 1-based month.
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(Error::Validation(format!("month must be in 1..=12, got {month}")));
        }
        Ok(Self { year, month })
    }

    /// Month containing `date`.
    pub fn from_date(date: NaiveDate) -> Self {
        Self { year: date.year(), month: date.month() }
    }

    /// Parse `YYYY-MM`, `YYYY-MM-DD`, or a week label `YYYY-MM-DD - YYYY-MM-DD`.
    ///
    /// Week labels map to the month of their first day.
    pub fn parse_label(label: &str) -> Result<Self> {
        let s = label.trim();
        if let Some(head) = s.get(..10) {
            if let Ok(d) = NaiveDate::parse_from_str(head, "%Y-%m-%d") {
                return Ok(Self::from_date(d));
            }
        }
        if s.len() == 7 {
            if let Ok(d) = NaiveDate::parse_from_str(&format!("{s}-01"), "%Y-%m-%d") {
                return Ok(Self::from_date(d));
            }
        }
        Err(Error::Validation(format!("unrecognized period label '{s}'")))
    }

    /// Calendar year.
    pub fn year(&self) -> i32 {
        self.year
    }

    /// Month of year, 1–12.
    pub fn month(&self) -> u32 {
        self.month
    }

    /// Months since year 0; consecutive months differ by one.
    pub fn ordinal(&self) -> i64 {
        self.year as i64 * 12 + (self.month as i64 - 1)
    }

    /// Inverse of [`YearMonth::ordinal`].
    pub fn from_ordinal(ordinal: i64) -> Self {
        let year = ordinal.div_euclid(12) as i32;
        let month = ordinal.rem_euclid(12) as u32 + 1;
        Self { year, month }
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse_label(s)
    }
}

impl TryFrom<String> for YearMonth {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        Self::parse_label(&s)
    }
}

impl From<YearMonth> for String {
    fn from(ym: YearMonth) -> Self {
        ym.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_month_and_week_labels() {
        let ym: YearMonth = "2015-09".parse().unwrap();
        assert_eq!((ym.year(), ym.month()), (2015, 9));

        let week = YearMonth::parse_label("2015-08-30 - 2015-09-05").unwrap();
        assert_eq!(week, YearMonth::new(2015, 8).unwrap());

        let day = YearMonth::parse_label(" 2016-01-31 ").unwrap();
        assert_eq!(day.to_string(), "2016-01");
    }

    #[test]
    fn rejects_garbage() {
        assert!(YearMonth::parse_label("").is_err());
        assert!(YearMonth::parse_label("2015-13").is_err());
        assert!(YearMonth::parse_label("last week").is_err());
        assert!(YearMonth::parse_label("résumé-01-01").is_err());
        assert!(YearMonth::new(2015, 0).is_err());
    }

    #[test]
    fn ordering_and_ordinal() {
        let a = YearMonth::new(2015, 12).unwrap();
        let b = YearMonth::new(2016, 1).unwrap();
        assert!(a < b);
        assert_eq!(b.ordinal() - a.ordinal(), 1);
        assert_eq!(YearMonth::from_ordinal(a.ordinal()), a);
    }
}
