use sct_viz::DensityArtifact;

use crate::canvas::Canvas;
use crate::config::VizConfig;
use crate::header::draw_title;
use crate::layout::axes::Axis;
use crate::layout::margins::PlotArea;
use crate::plots::axes_draw::{draw_axes, draw_vline};
use crate::plots::{empty_svg, format_value};
use crate::primitives::*;

pub fn render(artifact: &DensityArtifact, config: &VizConfig) -> crate::Result<String> {
    let n = artifact.x.len().min(artifact.density.len());
    if n < 2 {
        return Ok(empty_svg("No density data"));
    }
    let xs = &artifact.x[..n];
    let ys = &artifact.density[..n];

    let mut canvas = Canvas::new(config.figure.width, config.figure.height)?
        .with_font_family(config.font.family.clone());

    let x_label = if artifact.variable == "median_earnings_10yr" {
        config.density.x_label.clone()
    } else {
        artifact.variable.clone()
    };
    let x_axis = Axis::auto_linear(xs[0], xs[n - 1], 6).with_label(x_label);
    let y_max = ys.iter().copied().fold(0.0_f64, f64::max);
    let y_axis = Axis::auto_linear(0.0, y_max * 1.05, 5).with_label("Density");

    let area = PlotArea::auto(&canvas, Some(&y_axis), Some(&x_axis), config);
    let note = format!("n = {}, bandwidth = {}", artifact.n, format_value(artifact.bandwidth));
    draw_title(&mut canvas, &area, "Distribution of institution earnings", Some(&note), config);
    draw_axes(&mut canvas, &area, &x_axis, &y_axis, config);

    let _clip = canvas.push_clip(area.left, area.top, area.width, area.height);

    let px: Vec<f64> =
        xs.iter().map(|&x| x_axis.data_to_pixel(x, area.left, area.right())).collect();
    let py: Vec<f64> =
        ys.iter().map(|&y| y_axis.data_to_pixel(y, area.bottom(), area.top)).collect();
    let floor = vec![area.bottom(); n];

    let color = config.colors.density;
    let fill = Style::filled(color.with_alpha(config.density.fill_alpha));
    canvas.fill_between(&px, &floor, &py, &fill);
    let curve: Vec<(f64, f64)> = px.iter().copied().zip(py.iter().copied()).collect();
    canvas.polyline(&curve, &LineStyle::solid(color, 1.5));

    let label_size = config.font.tick_size * 0.9;
    if config.density.show_threshold {
        if let Some(t) = artifact.threshold {
            draw_vline(
                &mut canvas,
                &area,
                &x_axis,
                t,
                &format!("threshold {}", format_value(t)),
                &LineStyle::dotted(config.colors.threshold, 1.0),
                label_size,
                config.colors.threshold,
            );
        }
    }

    if config.density.show_mean {
        let marker = config.colors.mean_marker;
        draw_vline(
            &mut canvas,
            &area,
            &x_axis,
            artifact.mean,
            &format!("mean {}", format_value(artifact.mean)),
            &LineStyle::dashed(marker, 1.0),
            label_size,
            marker,
        );
        // triangle on the baseline
        let mx = x_axis.data_to_pixel(artifact.mean, area.left, area.right());
        let b = area.bottom();
        canvas.polygon(&[(mx, b - 7.0), (mx - 4.5, b), (mx + 4.5, b)], &Style::filled(marker));
    }

    canvas.pop_clip();

    canvas.finish_svg()
}
