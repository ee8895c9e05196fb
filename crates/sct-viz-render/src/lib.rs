//! # sct-viz-render
//!
//! Renders `sct-viz` artifacts to standalone SVG documents, and to PNG when
//! built with the `png` feature.
//!
//! Artifacts arrive as JSON so the renderer can be driven from files written
//! by an earlier `sctrends report --output` run.

pub mod canvas;
pub mod color;
pub mod config;
pub mod header;
pub mod layout;
pub mod output;
pub mod plots;
pub mod primitives;
pub mod text;
pub mod theme;

use config::VizConfig;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("unknown artifact kind: {0}")]
    UnknownKind(String),
    #[error("unknown output format: {0}")]
    UnknownFormat(String),
    #[error("deserialization error: {0}")]
    Deserialize(#[from] serde_json::Error),
    #[error("config error: {0}")]
    Config(String),
    #[error("layout error: {0}")]
    Layout(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[cfg(feature = "png")]
    #[error("PNG encoding error: {0}")]
    Png(String),
}

pub type Result<T> = std::result::Result<T, RenderError>;

/// Artifact kinds understood by [`render_svg`].
pub const KINDS: &[&str] = &["density", "trend"];

/// Render an artifact JSON to SVG string.
pub fn render_svg(artifact_json: &str, kind: &str, config: &VizConfig) -> Result<String> {
    let svg = match kind {
        "density" | "kde" => {
            let art: sct_viz::DensityArtifact = serde_json::from_str(artifact_json)?;
            plots::density::render(&art, config)?
        }
        "trend" => {
            let art: sct_viz::TrendArtifact = serde_json::from_str(artifact_json)?;
            plots::trend::render(&art, config)?
        }
        other => return Err(RenderError::UnknownKind(other.to_string())),
    };
    Ok(svg)
}

/// Render an SVG document to bytes in `format` (`svg`, or `png` with the feature).
pub fn svg_to_bytes(svg: String, format: &str, config: &VizConfig) -> Result<Vec<u8>> {
    match format {
        "svg" => Ok(svg.into_bytes()),
        #[cfg(feature = "png")]
        "png" => output::png::svg_to_png(&svg, config.output.dpi),
        other => {
            let _ = config;
            Err(RenderError::UnknownFormat(other.to_string()))
        }
    }
}

/// Render an artifact JSON to bytes in the specified format.
pub fn render_to_bytes(
    artifact_json: &str,
    kind: &str,
    format: &str,
    config: &VizConfig,
) -> Result<Vec<u8>> {
    let svg = render_svg(artifact_json, kind, config)?;
    svg_to_bytes(svg, format, config)
}

/// Render an artifact JSON to a file (format inferred from extension).
pub fn render_to_file(
    artifact_json: &str,
    kind: &str,
    path: &std::path::Path,
    config: &VizConfig,
) -> Result<()> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or(&config.output.format);
    let bytes = render_to_bytes(artifact_json, kind, ext, config)?;
    std::fs::write(path, bytes)?;
    tracing::info!(path = %path.display(), kind, "rendered plot");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_kind_and_format() {
        let cfg = VizConfig::default();
        assert!(matches!(render_svg("{}", "pie", &cfg), Err(RenderError::UnknownKind(_))));
        assert!(matches!(
            svg_to_bytes("<svg/>".into(), "gif", &cfg),
            Err(RenderError::UnknownFormat(_))
        ));
        assert!(matches!(render_svg("not json", "trend", &cfg), Err(RenderError::Deserialize(_))));
    }
}
