use crate::canvas::Canvas;
use crate::color::Color;
use crate::config::VizConfig;
use crate::layout::axes::Axis;
use crate::layout::margins::PlotArea;
use crate::primitives::*;

/// Draw a box frame with ticks, grid, tick labels and axis labels.
pub fn draw_axes(
    canvas: &mut Canvas,
    area: &PlotArea,
    x_axis: &Axis,
    y_axis: &Axis,
    config: &VizConfig,
) {
    let frame_color = config.colors.foreground;
    let frame_style = LineStyle::solid(frame_color, 0.8);
    let tick_style_line = LineStyle::solid(frame_color, 0.6);
    let minor_tick_style = LineStyle::solid(frame_color, 0.4);
    let grid_style = LineStyle {
        color: config.grid.color.with_alpha(config.grid.alpha),
        width: 0.5,
        dash: Some("3 3".into()),
    };

    // +1 points into the plot, -1 away from it
    let dir = if config.axes.tick_direction == "in" { 1.0 } else { -1.0 };
    let tl = config.axes.tick_length;
    let mtl = config.axes.minor_tick_length;
    let outward = if dir > 0.0 { 0.0 } else { tl };

    canvas.line(area.left, area.top, area.right(), area.top, &frame_style);
    canvas.line(area.left, area.bottom(), area.right(), area.bottom(), &frame_style);
    canvas.line(area.left, area.top, area.left, area.bottom(), &frame_style);
    canvas.line(area.right(), area.top, area.right(), area.bottom(), &frame_style);

    let tick_label_style = TextStyle {
        size: config.font.tick_size,
        color: frame_color,
        anchor: TextAnchor::Middle,
        baseline: TextBaseline::Hanging,
        ..Default::default()
    };

    // --- X axis ---
    for (i, &val) in x_axis.tick_positions.iter().enumerate() {
        let px = x_axis.data_to_pixel(val, area.left, area.right());
        if px < area.left - 0.5 || px > area.right() + 0.5 {
            continue;
        }
        if config.grid.show {
            canvas.line(px, area.top, px, area.bottom(), &grid_style);
        }
        canvas.line(px, area.bottom(), px, area.bottom() - dir * tl, &tick_style_line);
        if config.axes.show_top_ticks {
            canvas.line(px, area.top, px, area.top + dir * tl, &tick_style_line);
        }
        if let Some(label) = x_axis.tick_labels.get(i) {
            canvas.text(px, area.bottom() + outward + 3.0, label, &tick_label_style);
        }
    }
    for &val in &x_axis.minor_ticks {
        let px = x_axis.data_to_pixel(val, area.left, area.right());
        if px < area.left - 0.5 || px > area.right() + 0.5 {
            continue;
        }
        canvas.line(px, area.bottom(), px, area.bottom() - dir * mtl, &minor_tick_style);
    }

    // --- Y axis ---
    let y_tick_label_style = TextStyle {
        anchor: TextAnchor::End,
        baseline: TextBaseline::Central,
        ..tick_label_style.clone()
    };
    let mut widest = 0.0_f64;
    for (i, &val) in y_axis.tick_positions.iter().enumerate() {
        let py = y_axis.data_to_pixel(val, area.bottom(), area.top);
        if py < area.top - 0.5 || py > area.bottom() + 0.5 {
            continue;
        }
        if config.grid.show {
            canvas.line(area.left, py, area.right(), py, &grid_style);
        }
        canvas.line(area.left, py, area.left + dir * tl, py, &tick_style_line);
        if config.axes.show_right_ticks {
            canvas.line(area.right(), py, area.right() - dir * tl, py, &tick_style_line);
        }
        if let Some(label) = y_axis.tick_labels.get(i) {
            widest = widest.max(canvas.measure_text(label, &y_tick_label_style).width);
            canvas.text(area.left - outward - 4.0, py, label, &y_tick_label_style);
        }
    }
    for &val in &y_axis.minor_ticks {
        let py = y_axis.data_to_pixel(val, area.bottom(), area.top);
        if py < area.top - 0.5 || py > area.bottom() + 0.5 {
            continue;
        }
        canvas.line(area.left, py, area.left + dir * mtl, py, &minor_tick_style);
    }

    // --- Axis labels ---
    let label_style = TextStyle {
        size: config.font.label_size,
        color: frame_color,
        anchor: TextAnchor::Middle,
        ..Default::default()
    };
    if !x_axis.label.is_empty() {
        let label_y = area.bottom() + outward + config.font.tick_size + 16.0;
        canvas.text(area.left + area.width / 2.0, label_y, &x_axis.label, &label_style);
    }
    if !y_axis.label.is_empty() {
        let label_x = area.left - outward - widest - 10.0 - config.font.label_size / 2.0;
        let label_y = area.top + area.height / 2.0;
        canvas.text_rotated(label_x, label_y, &y_axis.label, &label_style, -90.0);
    }
}

/// Full-height vertical reference line at data value `x`, labelled at the top.
///
/// Skipped when `x` is outside the axis.
#[allow(clippy::too_many_arguments)]
pub fn draw_vline(
    canvas: &mut Canvas,
    area: &PlotArea,
    x_axis: &Axis,
    x: f64,
    label: &str,
    style: &LineStyle,
    font_size: f64,
    label_color: Color,
) {
    if !x_axis.contains(x) {
        return;
    }
    let px = x_axis.data_to_pixel(x, area.left, area.right());
    canvas.line(px, area.top, px, area.bottom(), style);
    if label.is_empty() {
        return;
    }
    let label_style = TextStyle {
        size: font_size,
        color: label_color,
        anchor: TextAnchor::Start,
        baseline: TextBaseline::Hanging,
        ..Default::default()
    };
    // flip to the left side when the label would run past the frame
    let w = canvas.measure_text(label, &label_style).width;
    if px + 3.0 + w > area.right() {
        let style = TextStyle { anchor: TextAnchor::End, ..label_style };
        canvas.text(px - 3.0, area.top + 4.0, label, &style);
    } else {
        canvas.text(px + 3.0, area.top + 4.0, label, &label_style);
    }
}
