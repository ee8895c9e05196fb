//! # sct-data
//!
//! Tabular pipeline for sctrends: loaders for the three input sources,
//! per-source cleaners with auditable drop counts, and the two-stage joiner
//! that produces the immutable [`AnalysisTable`].
//!
//! Tables are ordered `Vec`s of typed records; grouping and joining use
//! explicit hash / B-tree maps keyed by the grouping tuple.

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Cleaners and derived-column functions.
pub mod clean;
/// Pipeline configuration (column mapping, derivation constants).
pub mod config;
/// Key-based joins.
pub mod join;
/// Source loaders.
pub mod load;
/// Calendar month type.
pub mod period;
/// Delimited-text reader with null-token handling.
pub mod raw;
/// Typed records.
pub mod records;
/// The joined analysis table.
pub mod table;

pub use clean::{CleaningReport, clean_identifiers, clean_outcomes, clean_search_interest};
pub use config::{ColumnMapping, DeriveConfig, InputConfig, PipelineConfig};
pub use join::{JoinReport, build_analysis_table};
pub use load::{load_identifiers, load_outcomes, load_search_interest};
pub use period::YearMonth;
pub use records::{AnalysisRow, IdentifierRecord, OutcomesRecord, SearchInterestRecord};
pub use table::{AnalysisTable, MonthlyMean, TableSummary};
