use sct_viz::TrendArtifact;

use crate::canvas::Canvas;
use crate::config::VizConfig;
use crate::header::draw_title;
use crate::layout::axes::Axis;
use crate::layout::legend::{self, LegendCorner, LegendEntry, LegendKind};
use crate::layout::margins::PlotArea;
use crate::plots::axes_draw::{draw_axes, draw_vline};
use crate::plots::empty_svg;
use crate::primitives::*;

const SHAPES: [MarkerShape; 2] = [MarkerShape::Circle, MarkerShape::Square];

/// Split a series into runs of consecutive defined points.
fn runs(values: &[Option<f64>]) -> Vec<Vec<(usize, f64)>> {
    let mut out = Vec::new();
    let mut cur = Vec::new();
    for (i, v) in values.iter().enumerate() {
        match v {
            Some(y) if y.is_finite() => cur.push((i, *y)),
            _ => {
                if !cur.is_empty() {
                    out.push(std::mem::take(&mut cur));
                }
            }
        }
    }
    if !cur.is_empty() {
        out.push(cur);
    }
    out
}

pub fn render(artifact: &TrendArtifact, config: &VizConfig) -> crate::Result<String> {
    let defined: Vec<f64> = artifact
        .series
        .iter()
        .flat_map(|s| s.mean.iter().flatten().copied())
        .filter(|v| v.is_finite())
        .collect();
    if artifact.months.is_empty() || defined.is_empty() {
        return Ok(empty_svg("No trend data"));
    }

    let mut canvas = Canvas::new(config.figure.width, config.figure.height)?
        .with_font_family(config.font.family.clone());

    let x_axis = Axis::categorical(&artifact.months, config.trend.max_x_labels).with_label("Month");
    let y_min = defined.iter().copied().fold(f64::INFINITY, f64::min);
    let y_max = defined.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let y_axis = Axis::auto_linear(y_min, y_max, 6).with_label(artifact.y_label.clone());

    let area = PlotArea::auto(&canvas, Some(&y_axis), Some(&x_axis), config);
    let note = format!("{} months", artifact.months.len());
    draw_title(&mut canvas, &area, "Search interest over time", Some(&note), config);
    draw_axes(&mut canvas, &area, &x_axis, &y_axis, config);

    let _clip = canvas.push_clip(area.left, area.top, area.width, area.height);

    if y_axis.contains(0.0) {
        let py = y_axis.data_to_pixel(0.0, area.bottom(), area.top);
        canvas.line(area.left, py, area.right(), py, &LineStyle::solid(config.colors.muted, 0.5));
    }

    if config.trend.show_release {
        let idx =
            artifact.release.as_ref().and_then(|r| artifact.months.iter().position(|m| m == r));
        if let Some(i) = idx {
            // months strictly after the cutoff are post-release
            draw_vline(
                &mut canvas,
                &area,
                &x_axis,
                i as f64 + 0.5,
                "release",
                &LineStyle::dashed(config.colors.release, 1.0),
                config.font.tick_size * 0.9,
                config.colors.release,
            );
        }
    }

    let palette = config.palette_colors();
    let mut entries = Vec::with_capacity(artifact.series.len());
    for (k, series) in artifact.series.iter().enumerate() {
        let color =
            palette.get(k % palette.len().max(1)).copied().unwrap_or(config.colors.foreground);
        let shape = SHAPES[k % SHAPES.len()];
        let line = LineStyle::solid(color, config.trend.line_width);

        for run in runs(&series.mean) {
            let points: Vec<(f64, f64)> = run
                .iter()
                .map(|&(i, y)| {
                    (
                        x_axis.data_to_pixel(i as f64, area.left, area.right()),
                        y_axis.data_to_pixel(y, area.bottom(), area.top),
                    )
                })
                .collect();
            canvas.polyline(&points, &line);
            if config.trend.markers {
                let marker = MarkerStyle { shape, size: 2.2, color, fill: true };
                for &(x, y) in &points {
                    canvas.marker(x, y, &marker);
                }
            }
        }

        let kind = if config.trend.markers {
            LegendKind::LineMarker(shape)
        } else {
            LegendKind::Line(None)
        };
        entries.push(LegendEntry { label: series.label.clone(), color, kind });
    }

    canvas.pop_clip();

    if entries.len() > 1 {
        legend::draw_legend(&mut canvas, &area, &entries, config.font.size, LegendCorner::TopLeft);
    }

    canvas.finish_svg()
}
