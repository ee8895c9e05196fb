use crate::RenderError;
use crate::color::Color;
use crate::config::*;

/// Built-in theme presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinTheme {
    Sctrends,
    Minimal,
    Print,
}

impl BuiltinTheme {
    pub const NAMES: &'static [&'static str] = &["sctrends", "minimal", "print"];

    pub fn parse(s: &str) -> crate::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "sctrends" | "default" => Ok(Self::Sctrends),
            "minimal" => Ok(Self::Minimal),
            "print" => Ok(Self::Print),
            other => Err(RenderError::Config(format!(
                "unknown theme '{other}' (expected one of {})",
                Self::NAMES.join(", ")
            ))),
        }
    }

    pub fn base_config(self) -> VizConfig {
        match self {
            Self::Sctrends => sctrends(),
            Self::Minimal => minimal(),
            Self::Print => print(),
        }
    }
}

fn sctrends() -> VizConfig {
    VizConfig {
        theme: "sctrends".into(),
        figure: FigureConfig::default(),
        font: FontConfig::default(),
        axes: AxesConfig::default(),
        grid: GridConfig::default(),
        title: TitleConfig::default(),
        colors: ColorsConfig::default(),
        palette: "sctrends".into(),
        output: OutputConfig::default(),
        density: DensityConfig::default(),
        trend: TrendConfig::default(),
    }
}

fn minimal() -> VizConfig {
    VizConfig {
        theme: "minimal".into(),
        figure: FigureConfig { width: 432.0, height: 288.0 },
        font: FontConfig { size: 9.0, label_size: 10.0, tick_size: 8.0, ..FontConfig::default() },
        grid: GridConfig { show: false, ..GridConfig::default() },
        title: TitleConfig { show: false, ..TitleConfig::default() },
        trend: TrendConfig { markers: false, line_width: 1.2, ..TrendConfig::default() },
        palette: "okabe_ito".into(),
        ..sctrends()
    }
}

/// Black-and-white, inward ticks on all four sides, serif text.
fn print() -> VizConfig {
    let ink = Color::rgb(0, 0, 0);
    VizConfig {
        theme: "print".into(),
        figure: FigureConfig { width: 468.0, height: 324.0 },
        font: FontConfig {
            family: "Times New Roman, Times, serif".into(),
            size: 10.0,
            label_size: 11.0,
            tick_size: 9.0,
        },
        axes: AxesConfig {
            tick_direction: "in".into(),
            show_top_ticks: true,
            show_right_ticks: true,
            tick_length: 5.0,
            minor_tick_length: 3.0,
        },
        grid: GridConfig { show: false, ..GridConfig::default() },
        colors: ColorsConfig {
            foreground: ink,
            muted: Color::rgb(60, 60, 60),
            density: ink,
            mean_marker: ink,
            threshold: Color::rgb(100, 100, 100),
            release: ink,
        },
        density: DensityConfig { fill_alpha: 0.12, ..DensityConfig::default() },
        output: OutputConfig { dpi: 300, ..OutputConfig::default() },
        palette: "grayscale".into(),
        ..sctrends()
    }
}
