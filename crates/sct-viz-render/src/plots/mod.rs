pub mod density;
pub mod trend;

mod axes_draw;

/// Placeholder document for artifacts with nothing to draw.
fn empty_svg(message: &str) -> String {
    format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"160\" height=\"50\">\
         <text x=\"10\" y=\"30\">{message}</text></svg>"
    )
}

/// Value label for reference lines: grouped integers for large magnitudes.
fn format_value(v: f64) -> String {
    if v.abs() >= 1000.0 {
        crate::layout::axes::format_tick(v, 1.0)
    } else {
        format!("{v:.3}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_labels() {
        assert_eq!(format_value(64_210.4), "64,210");
        assert_eq!(format_value(1500.0), "1500");
        assert_eq!(format_value(-0.1234), "-0.123");
        assert!(empty_svg("nothing").contains(">nothing</text>"));
    }
}
