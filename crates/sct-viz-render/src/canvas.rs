use std::fmt::{self, Write as FmtWrite};

use crate::RenderError;
use crate::color::Color;
use crate::primitives::*;
use crate::text::{TextMetrics, measure_styled};

/// An SVG element stored for deferred rendering.
#[derive(Debug, Clone)]
enum SvgElement {
    Rect { x: f64, y: f64, w: f64, h: f64, style: Style },
    Line { x1: f64, y1: f64, x2: f64, y2: f64, style: LineStyle },
    Polyline { points: Vec<(f64, f64)>, style: LineStyle },
    Polygon { points: Vec<(f64, f64)>, style: Style },
    Text { x: f64, y: f64, content: String, style: TextStyle, rotate: Option<f64> },
    Path { d: String, style: Style },
    Circle { cx: f64, cy: f64, r: f64, style: Style },
    Group { clip_id: String, children: Vec<SvgElement> },
}

/// Immediate-mode SVG canvas. Coordinates in points (1pt = 1/72").
pub struct Canvas {
    pub width: f64,
    pub height: f64,
    font_family: String,
    elements: Vec<SvgElement>,
    defs: Vec<String>,
    // open clip groups, innermost last
    clip_stack: Vec<(String, Vec<SvgElement>)>,
    next_clip_id: usize,
}

impl Canvas {
    pub fn new(width: f64, height: f64) -> crate::Result<Self> {
        if !(width > 0.0 && height > 0.0 && width.is_finite() && height.is_finite()) {
            return Err(RenderError::Layout(format!("invalid figure size {width}x{height}")));
        }
        Ok(Self {
            width,
            height,
            font_family: "Helvetica, Arial, sans-serif".into(),
            elements: Vec::new(),
            defs: Vec::new(),
            clip_stack: Vec::new(),
            next_clip_id: 0,
        })
    }

    pub fn with_font_family(mut self, family: impl Into<String>) -> Self {
        self.font_family = family.into();
        self
    }

    // --- Drawing primitives ---

    pub fn rect(&mut self, x: f64, y: f64, w: f64, h: f64, style: &Style) {
        self.push(SvgElement::Rect { x, y, w, h, style: style.clone() });
    }

    pub fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, style: &LineStyle) {
        self.push(SvgElement::Line { x1, y1, x2, y2, style: style.clone() });
    }

    pub fn polyline(&mut self, points: &[(f64, f64)], style: &LineStyle) {
        if points.len() < 2 {
            return;
        }
        self.push(SvgElement::Polyline { points: points.to_vec(), style: style.clone() });
    }

    pub fn polygon(&mut self, points: &[(f64, f64)], style: &Style) {
        self.push(SvgElement::Polygon { points: points.to_vec(), style: style.clone() });
    }

    pub fn text(&mut self, x: f64, y: f64, content: &str, style: &TextStyle) {
        self.push(SvgElement::Text {
            x,
            y,
            content: content.to_string(),
            style: style.clone(),
            rotate: None,
        });
    }

    pub fn text_rotated(&mut self, x: f64, y: f64, content: &str, style: &TextStyle, angle: f64) {
        self.push(SvgElement::Text {
            x,
            y,
            content: content.to_string(),
            style: style.clone(),
            rotate: Some(angle),
        });
    }

    pub fn circle(&mut self, cx: f64, cy: f64, r: f64, style: &Style) {
        self.push(SvgElement::Circle { cx, cy, r, style: style.clone() });
    }

    /// Fill between y_lo and y_hi at given x positions (areas under curves).
    pub fn fill_between(&mut self, x: &[f64], y_lo: &[f64], y_hi: &[f64], style: &Style) {
        let n = x.len().min(y_lo.len()).min(y_hi.len());
        if n < 2 {
            return;
        }
        let mut d = format!("M{:.2},{:.2}", x[0], y_hi[0]);
        for i in 1..n {
            d.push_str(&format!(" L{:.2},{:.2}", x[i], y_hi[i]));
        }
        for i in (0..n).rev() {
            d.push_str(&format!(" L{:.2},{:.2}", x[i], y_lo[i]));
        }
        d.push('Z');
        self.push(SvgElement::Path { d, style: style.clone() });
    }

    /// Data marker.
    pub fn marker(&mut self, x: f64, y: f64, marker: &MarkerStyle) {
        let style = if marker.fill {
            Style {
                fill: Some(marker.color),
                stroke: Some(marker.color),
                stroke_width: 0.5,
                opacity: 1.0,
            }
        } else {
            Style {
                fill: Some(Color::rgb(255, 255, 255)),
                stroke: Some(marker.color),
                stroke_width: 1.0,
                opacity: 1.0,
            }
        };
        match marker.shape {
            MarkerShape::Circle => self.circle(x, y, marker.size, &style),
            MarkerShape::Square => {
                let s = marker.size;
                self.rect(x - s, y - s, 2.0 * s, 2.0 * s, &style);
            }
        }
    }

    // --- Clip paths ---

    /// Start clipping subsequent elements to a rectangle until [`Canvas::pop_clip`].
    pub fn push_clip(&mut self, x: f64, y: f64, w: f64, h: f64) -> String {
        let id = format!("clip{}", self.next_clip_id);
        self.next_clip_id += 1;
        self.defs.push(format!(
            "<clipPath id=\"{id}\">\
             <rect x=\"{x:.2}\" y=\"{y:.2}\" width=\"{w:.2}\" height=\"{h:.2}\" />\
             </clipPath>"
        ));
        self.clip_stack.push((id.clone(), Vec::new()));
        id
    }

    pub fn pop_clip(&mut self) {
        if let Some((clip_id, children)) = self.clip_stack.pop() {
            self.push(SvgElement::Group { clip_id, children });
        }
    }

    // --- Text measurement ---

    pub fn measure_text(&self, content: &str, style: &TextStyle) -> TextMetrics {
        measure_styled(content, style)
    }

    // --- SVG output ---

    fn push(&mut self, elem: SvgElement) {
        match self.clip_stack.last_mut() {
            Some((_, children)) => children.push(elem),
            None => self.elements.push(elem),
        }
    }

    /// Serialize to an SVG document. Unclosed clip groups are closed.
    pub fn finish_svg(mut self) -> crate::Result<String> {
        while !self.clip_stack.is_empty() {
            self.pop_clip();
        }
        let mut out = String::with_capacity(32 * 1024);
        self.write_svg(&mut out).map_err(|e| RenderError::Layout(e.to_string()))?;
        Ok(out)
    }

    fn write_svg(&self, out: &mut String) -> fmt::Result {
        writeln!(
            out,
            "<svg xmlns=\"http://www.w3.org/2000/svg\" \
             width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\">",
            w = self.width,
            h = self.height,
        )?;

        if !self.defs.is_empty() {
            out.push_str("<defs>\n");
            for d in &self.defs {
                out.push_str(d);
                out.push('\n');
            }
            out.push_str("</defs>\n");
        }

        writeln!(out, r#"<rect width="{}" height="{}" fill="white" />"#, self.width, self.height)?;

        for elem in &self.elements {
            self.render_element(out, elem)?;
        }

        out.push_str("</svg>\n");
        Ok(())
    }

    fn render_element(&self, out: &mut String, elem: &SvgElement) -> fmt::Result {
        match elem {
            SvgElement::Rect { x, y, w, h, style } => {
                write!(out, r#"<rect x="{x:.2}" y="{y:.2}" width="{w:.2}" height="{h:.2}""#)?;
                write_style_attrs(out, style)?;
                out.push_str(" />\n");
            }
            SvgElement::Line { x1, y1, x2, y2, style } => {
                write!(out, r#"<line x1="{x1:.2}" y1="{y1:.2}" x2="{x2:.2}" y2="{y2:.2}""#)?;
                write_line_attrs(out, style)?;
                out.push_str(" />\n");
            }
            SvgElement::Polyline { points, style } => {
                out.push_str(r#"<polyline points=""#);
                write_points(out, points)?;
                out.push_str(r#"" fill="none" stroke-linejoin="round""#);
                write_line_attrs(out, style)?;
                out.push_str(" />\n");
            }
            SvgElement::Polygon { points, style } => {
                out.push_str(r#"<polygon points=""#);
                write_points(out, points)?;
                out.push('"');
                write_style_attrs(out, style)?;
                out.push_str(" />\n");
            }
            SvgElement::Text { x, y, content, style, rotate } => {
                write!(out, r#"<text x="{x:.2}" y="{y:.2}""#)?;
                write!(
                    out,
                    r#" font-family="{}" font-size="{:.1}""#,
                    self.font_family, style.size
                )?;
                write!(out, r#" fill="{}""#, style.color.to_svg_fill())?;
                write!(out, r#" text-anchor="{}""#, style.anchor.as_str())?;
                write!(out, r#" dominant-baseline="{}""#, style.baseline.as_str())?;
                if style.weight == FontWeight::Bold {
                    out.push_str(r#" font-weight="bold""#);
                }
                if style.style == FontStyle::Italic {
                    out.push_str(r#" font-style="italic""#);
                }
                if let Some(angle) = rotate {
                    write!(out, r#" transform="rotate({angle:.1},{x:.2},{y:.2})""#)?;
                }
                out.push('>');
                escape_xml(out, content);
                out.push_str("</text>\n");
            }
            SvgElement::Path { d, style } => {
                write!(out, r#"<path d="{d}""#)?;
                write_style_attrs(out, style)?;
                out.push_str(" />\n");
            }
            SvgElement::Circle { cx, cy, r, style } => {
                write!(out, r#"<circle cx="{cx:.2}" cy="{cy:.2}" r="{r:.2}""#)?;
                write_style_attrs(out, style)?;
                out.push_str(" />\n");
            }
            SvgElement::Group { clip_id, children } => {
                writeln!(out, r#"<g clip-path="url(#{clip_id})">"#)?;
                for child in children {
                    self.render_element(out, child)?;
                }
                out.push_str("</g>\n");
            }
        }
        Ok(())
    }
}

fn escape_xml(out: &mut String, content: &str) {
    for ch in content.chars() {
        match ch {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
}

fn write_points(out: &mut String, points: &[(f64, f64)]) -> fmt::Result {
    for (i, (x, y)) in points.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        write!(out, "{x:.2},{y:.2}")?;
    }
    Ok(())
}

fn write_style_attrs(out: &mut String, style: &Style) -> fmt::Result {
    match &style.fill {
        Some(fill) => write!(out, r#" fill="{}""#, fill.to_svg_fill())?,
        None => out.push_str(r#" fill="none""#),
    }
    if let Some(stroke) = &style.stroke {
        write!(out, r#" stroke="{}""#, stroke.to_svg_fill())?;
        write!(out, r#" stroke-width="{:.2}""#, style.stroke_width)?;
    }
    if (style.opacity - 1.0).abs() > 1e-4 {
        write!(out, r#" opacity="{:.3}""#, style.opacity)?;
    }
    Ok(())
}

fn write_line_attrs(out: &mut String, style: &LineStyle) -> fmt::Result {
    write!(out, r#" stroke="{}""#, style.color.to_svg_fill())?;
    write!(out, r#" stroke-width="{:.2}""#, style.width)?;
    if let Some(dash) = &style.dash {
        write!(out, r#" stroke-dasharray="{dash}""#)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_canvas() {
        let svg = Canvas::new(100.0, 50.0).unwrap().finish_svg().unwrap();
        assert!(svg.contains("width=\"100\""));
        assert!(svg.contains("height=\"50\""));
        assert!(svg.ends_with("</svg>\n"));
        assert!(!svg.contains("<defs>"));
    }

    #[test]
    fn invalid_size_is_rejected() {
        assert!(Canvas::new(0.0, 50.0).is_err());
        assert!(Canvas::new(f64::NAN, 50.0).is_err());
    }

    #[test]
    fn rect_rendering() {
        let mut c = Canvas::new(200.0, 100.0).unwrap();
        c.rect(10.0, 20.0, 50.0, 30.0, &Style::filled(Color::hex("#ff0000")));
        let svg = c.finish_svg().unwrap();
        assert!(svg.contains(r##"fill="#ff0000""##));
        assert!(svg.contains("width=\"50.00\""));
    }

    #[test]
    fn text_is_escaped() {
        let mut c = Canvas::new(200.0, 100.0).unwrap().with_font_family("serif");
        c.text(10.0, 20.0, "a < b & c", &TextStyle::default());
        let svg = c.finish_svg().unwrap();
        assert!(svg.contains("a &lt; b &amp; c"));
        assert!(svg.contains("font-family=\"serif\""));
    }

    #[test]
    fn clipped_elements_are_grouped() {
        let mut c = Canvas::new(200.0, 100.0).unwrap();
        c.line(0.0, 0.0, 1.0, 1.0, &LineStyle::default());
        let id = c.push_clip(10.0, 10.0, 50.0, 50.0);
        c.polyline(&[(0.0, 0.0), (100.0, 100.0)], &LineStyle::dashed(Color::rgb(1, 2, 3), 1.0));
        c.pop_clip();
        let svg = c.finish_svg().unwrap();
        assert!(svg.contains(&format!(r#"<clipPath id="{id}">"#)));
        let group = svg.find(&format!("clip-path=\"url(#{id})\"")).unwrap();
        let poly = svg.find("<polyline").unwrap();
        assert!(poly > group);
        assert!(svg.contains(r#"stroke-dasharray="6 3""#));
    }

    #[test]
    fn unclosed_clip_is_flushed() {
        let mut c = Canvas::new(100.0, 100.0).unwrap();
        c.push_clip(0.0, 0.0, 10.0, 10.0);
        c.circle(5.0, 5.0, 2.0, &Style::filled(Color::rgb(0, 0, 0)));
        let svg = c.finish_svg().unwrap();
        assert!(svg.contains("<circle"));
        assert!(svg.contains("</g>"));
    }
}
