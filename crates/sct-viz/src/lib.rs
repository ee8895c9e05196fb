//! # sct-viz
//!
//! Visualization data artifacts for sctrends.
//!
//! Artifacts are plain serde structs with flat arrays, so they can be written
//! as JSON next to the report and rendered later by `sct-viz-render`.

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Kernel density of institution earnings.
pub mod density;

/// Artifact provenance block.
pub mod meta;

/// Monthly mean search interest.
pub mod trend;

pub use density::{DensityArtifact, density_artifact, earnings_density, silverman_bandwidth};
pub use meta::ArtifactMeta;
pub use trend::{TrendArtifact, TrendSeries, trend_artifact};
