use serde::{Deserialize, Serialize};
use serde_yaml_ng::Value;

use crate::RenderError;
use crate::color::Color;
use crate::theme::BuiltinTheme;

/// Top-level visualization configuration (YAML or programmatic).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VizConfig {
    pub theme: String,
    pub figure: FigureConfig,
    pub font: FontConfig,
    pub axes: AxesConfig,
    pub grid: GridConfig,
    pub title: TitleConfig,
    pub colors: ColorsConfig,
    pub palette: String,
    pub output: OutputConfig,
    pub density: DensityConfig,
    pub trend: TrendConfig,
}

impl Default for VizConfig {
    fn default() -> Self {
        BuiltinTheme::Sctrends.base_config()
    }
}

impl VizConfig {
    pub fn palette_colors(&self) -> Vec<Color> {
        crate::color::palette_colors(&self.palette)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FigureConfig {
    pub width: f64,
    pub height: f64,
}

impl Default for FigureConfig {
    fn default() -> Self {
        Self {
            width: 518.4,  // 7.2" * 72
            height: 302.4, // 4.2" * 72
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FontConfig {
    pub family: String,
    pub size: f64,
    pub label_size: f64,
    pub tick_size: f64,
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            family: "Helvetica, Arial, sans-serif".into(),
            size: 10.0,
            label_size: 11.0,
            tick_size: 8.5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AxesConfig {
    pub tick_direction: String,
    pub show_top_ticks: bool,
    pub show_right_ticks: bool,
    pub tick_length: f64,
    pub minor_tick_length: f64,
}

impl Default for AxesConfig {
    fn default() -> Self {
        Self {
            tick_direction: "out".into(),
            show_top_ticks: false,
            show_right_ticks: false,
            tick_length: 4.0,
            minor_tick_length: 2.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub show: bool,
    pub color: Color,
    pub alpha: f64,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self { show: true, color: Color::hex("#CBD5E1"), alpha: 0.55 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TitleConfig {
    pub show: bool,
    /// Overrides the plot's default title when non-empty.
    pub text: String,
}

impl Default for TitleConfig {
    fn default() -> Self {
        Self { show: true, text: String::new() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorsConfig {
    pub foreground: Color,
    pub muted: Color,
    pub density: Color,
    pub mean_marker: Color,
    pub threshold: Color,
    pub release: Color,
}

impl Default for ColorsConfig {
    fn default() -> Self {
        Self {
            foreground: Color::hex("#111827"),
            muted: Color::hex("#505050"),
            density: Color::hex("#1F5A96"),
            mean_marker: Color::hex("#D1495B"),
            threshold: Color::hex("#6B7280"),
            release: Color::hex("#D1495B"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: String,
    pub dpi: u32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { format: "svg".into(), dpi: 220 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DensityConfig {
    pub fill_alpha: f64,
    pub show_mean: bool,
    pub show_threshold: bool,
    pub x_label: String,
}

impl Default for DensityConfig {
    fn default() -> Self {
        Self {
            fill_alpha: 0.25,
            show_mean: true,
            show_threshold: true,
            x_label: "Median earnings 10 years after entry (USD)".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendConfig {
    pub markers: bool,
    pub show_release: bool,
    /// Most month labels printed on the x axis; the rest are thinned out.
    pub max_x_labels: usize,
    pub line_width: f64,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self { markers: true, show_release: true, max_x_labels: 12, line_width: 1.5 }
    }
}

/// Overlay `patch` onto `base`, recursing into mappings.
fn merge(base: &mut Value, patch: Value) {
    match (base, patch) {
        (Value::Mapping(b), Value::Mapping(p)) => {
            for (k, v) in p {
                match b.get_mut(&k) {
                    Some(slot) => merge(slot, v),
                    None => {
                        b.insert(k, v);
                    }
                }
            }
        }
        (slot, v) => *slot = v,
    }
}

/// Resolve a VizConfig.
///
/// Priority: user YAML overrides → theme base config. The theme is `theme`
/// when given, else the YAML's own `theme:` key, else `sctrends`.
pub fn resolve_config(theme: Option<&str>, user_yaml: Option<&str>) -> crate::Result<VizConfig> {
    let patch: Option<Value> = user_yaml
        .map(serde_yaml_ng::from_str::<Value>)
        .transpose()
        .map_err(|e| RenderError::Config(e.to_string()))?;

    let theme_name = theme
        .map(str::to_string)
        .or_else(|| patch.as_ref().and_then(|p| p.get("theme")?.as_str().map(str::to_string)));
    let base_theme = match theme_name {
        Some(name) => BuiltinTheme::parse(&name)?,
        None => BuiltinTheme::Sctrends,
    };
    let base = base_theme.base_config();

    let Some(mut patch) = patch.filter(|p| !p.is_null()) else {
        return Ok(base);
    };
    if let (Some(t), Value::Mapping(m)) = (theme, &mut patch) {
        m.insert(Value::from("theme"), Value::from(t));
    }

    let mut value = serde_yaml_ng::to_value(&base).map_err(|e| RenderError::Config(e.to_string()))?;
    merge(&mut value, patch);
    serde_yaml_ng::from_value(value).map_err(|e| RenderError::Config(e.to_string()))
}
