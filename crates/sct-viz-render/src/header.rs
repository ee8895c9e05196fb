use crate::canvas::Canvas;
use crate::config::VizConfig;
use crate::layout::margins::PlotArea;
use crate::primitives::*;

/// Height reserved above the plot area for the title line.
pub fn title_height(config: &VizConfig) -> f64 {
    if config.title.show { config.font.label_size * 1.3 + 14.0 } else { 0.0 }
}

/// Draw the plot title (bold, left) and an optional note (muted, right-aligned).
///
/// `config.title.text` replaces `title` when set.
pub fn draw_title(
    canvas: &mut Canvas,
    area: &PlotArea,
    title: &str,
    note: Option<&str>,
    config: &VizConfig,
) {
    if !config.title.show {
        return;
    }
    let title = if config.title.text.is_empty() { title } else { config.title.text.as_str() };
    let y = area.top - 8.0;

    let bold_style = TextStyle {
        size: config.font.label_size * 1.2,
        color: config.colors.foreground,
        weight: FontWeight::Bold,
        ..Default::default()
    };
    canvas.text(area.left, y, title, &bold_style);
    let title_w = canvas.measure_text(title, &bold_style).width;

    if let Some(note) = note {
        let note_style = TextStyle {
            size: config.font.tick_size,
            color: config.colors.muted,
            style: FontStyle::Italic,
            anchor: TextAnchor::End,
            ..Default::default()
        };
        // drop the note rather than overlap the title
        let note_w = canvas.measure_text(note, &note_style).width;
        if area.left + title_w + 12.0 + note_w <= area.right() {
            canvas.text(area.right(), y, note, &note_style);
        }
    }
}
