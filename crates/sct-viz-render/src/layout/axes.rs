/// Axis configuration with tick generation and data→pixel mapping.
#[derive(Debug, Clone)]
pub struct Axis {
    pub min: f64,
    pub max: f64,
    pub label: String,
    pub tick_positions: Vec<f64>,
    pub tick_labels: Vec<String>,
    pub minor_ticks: Vec<f64>,
}

impl Axis {
    /// Auto-scale linear axis with "nice number" ticks.
    pub fn auto_linear(data_min: f64, data_max: f64, target_ticks: usize) -> Self {
        let (nice_min, nice_max, step) = nice_range(data_min, data_max, target_ticks);
        let n_steps = ((nice_max - nice_min) / step).round() as usize;
        let ticks: Vec<f64> = (0..=n_steps).map(|i| nice_min + step * i as f64).collect();
        let labels = ticks.iter().map(|&v| format_tick(v, step)).collect();

        // 5 subdivisions per major
        let minor_step = step / 5.0;
        let minor = (0..=n_steps * 5)
            .filter(|i| i % 5 != 0)
            .map(|i| nice_min + minor_step * i as f64)
            .collect();

        Self {
            min: nice_min,
            max: nice_max,
            label: String::new(),
            tick_positions: ticks,
            tick_labels: labels,
            minor_ticks: minor,
        }
    }

    /// Fixed axis with explicit limits (no tick auto-generation).
    pub fn fixed(min: f64, max: f64) -> Self {
        Self {
            min,
            max,
            label: String::new(),
            tick_positions: Vec::new(),
            tick_labels: Vec::new(),
            minor_ticks: Vec::new(),
        }
    }

    /// Evenly spaced categories at positions `0..n`, with half a slot of padding.
    ///
    /// At most `max_labels` categories get a labelled tick; the rest get a
    /// minor tick.
    pub fn categorical<S: AsRef<str>>(categories: &[S], max_labels: usize) -> Self {
        let n = categories.len();
        let every = n.div_ceil(max_labels.max(1)).max(1);
        let mut ax = Self::fixed(-0.5, n.max(1) as f64 - 0.5);
        for (i, c) in categories.iter().enumerate() {
            if i % every == 0 {
                ax.tick_positions.push(i as f64);
                ax.tick_labels.push(c.as_ref().to_string());
            } else {
                ax.minor_ticks.push(i as f64);
            }
        }
        ax
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Map a data value to pixel coordinate.
    pub fn data_to_pixel(&self, value: f64, px_min: f64, px_max: f64) -> f64 {
        let frac = (value - self.min) / (self.max - self.min);
        px_min + frac * (px_max - px_min)
    }

    /// Whether `value` lies inside the axis limits.
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// "Nice numbers" algorithm for pleasant tick spacing.
fn nice_range(data_min: f64, data_max: f64, target_ticks: usize) -> (f64, f64, f64) {
    if (data_max - data_min).abs() < 1e-15 {
        return (data_min - 1.0, data_max + 1.0, 1.0);
    }
    let range = data_max - data_min;
    let rough_step = range / (target_ticks.max(2) - 1) as f64;
    let step = nice_step(rough_step);
    let nice_min = (data_min / step).floor() * step;
    let nice_max = (data_max / step).ceil() * step;
    (nice_min, nice_max, step)
}

fn nice_step(rough: f64) -> f64 {
    let exp = rough.abs().log10().floor();
    let frac = rough / 10.0_f64.powf(exp);
    let nice_frac = if frac <= 1.5 {
        1.0
    } else if frac <= 3.5 {
        2.0
    } else if frac <= 7.5 {
        5.0
    } else {
        10.0
    };
    nice_frac * 10.0_f64.powf(exp)
}

/// Tick label with just enough decimals for `step`; integers of five or more
/// digits get thousands separators.
pub(crate) fn format_tick(value: f64, step: f64) -> String {
    let decimals = if step >= 1.0 { 0 } else { (-step.log10().floor()) as usize };
    if decimals > 0 {
        return format!("{:.prec$}", value, prec = decimals);
    }
    // Avoid "-0"
    let v = if value.abs() < step * 0.01 { 0 } else { value.round() as i64 };
    let digits = v.unsigned_abs().to_string();
    if digits.len() < 5 {
        return v.to_string();
    }
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if v < 0 {
        grouped.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auto_linear_basic() {
        let ax = Axis::auto_linear(0.0, 10.0, 6);
        assert!(!ax.tick_positions.is_empty());
        assert!(ax.min <= 0.0);
        assert!(ax.max >= 10.0);
        assert_eq!(ax.tick_positions.len(), ax.tick_labels.len());
        assert_eq!(ax.minor_ticks.len(), (ax.tick_positions.len() - 1) * 4);
    }

    #[test]
    fn data_to_pixel_linear() {
        let ax = Axis::auto_linear(0.0, 100.0, 5);
        let px = ax.data_to_pixel(50.0, 0.0, 500.0);
        assert!((px - 250.0).abs() < 1.0);
        // inverted range, as used for y axes
        assert!((ax.data_to_pixel(100.0, 500.0, 0.0)).abs() < 1.0);
    }

    #[test]
    fn nice_step_values() {
        assert!((nice_step(3.2) - 2.0).abs() < 1e-9);
        assert!((nice_step(0.7) - 0.5).abs() < 1e-9);
        assert!((nice_step(15.0) - 10.0).abs() < 1e-9);
        assert!((nice_step(4.5) - 5.0).abs() < 1e-9);
        assert!((nice_step(1.2) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn tick_formatting() {
        assert_eq!(format_tick(60_000.0, 10_000.0), "60,000");
        assert_eq!(format_tick(-125_000.0, 25_000.0), "-125,000");
        assert_eq!(format_tick(5000.0, 1000.0), "5000");
        assert_eq!(format_tick(-0.0000001, 1.0), "0");
        assert_eq!(format_tick(0.25, 0.05), "0.25");
    }

    #[test]
    fn categorical_thins_labels() {
        let months: Vec<String> = (1..=24).map(|m| format!("m{m}")).collect();
        let ax = Axis::categorical(&months, 6);
        assert_eq!(ax.tick_labels, vec!["m1", "m5", "m9", "m13", "m17", "m21"]);
        assert_eq!(ax.minor_ticks.len(), 18);
        assert_eq!((ax.min, ax.max), (-0.5, 23.5));
        assert!(ax.contains(0.0) && !ax.contains(24.0));
    }
}
