use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f64,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: f64) -> Self {
        Self { r, g, b, a }
    }

    /// Parse `#rrggbb` (the `#` is optional). `None` on malformed input.
    pub fn parse_hex(s: &str) -> Option<Self> {
        let s = s.trim();
        let s = s.strip_prefix('#').unwrap_or(s);
        if s.len() != 6 || !s.is_ascii() {
            return None;
        }
        let r = u8::from_str_radix(&s[0..2], 16).ok()?;
        let g = u8::from_str_radix(&s[2..4], 16).ok()?;
        let b = u8::from_str_radix(&s[4..6], 16).ok()?;
        Some(Self::rgb(r, g, b))
    }

    /// Parse a hex literal, falling back to black.
    pub fn hex(s: &str) -> Self {
        Self::parse_hex(s).unwrap_or_default()
    }

    pub const fn with_alpha(mut self, a: f64) -> Self {
        self.a = a;
        self
    }

    pub fn to_svg_fill(&self) -> String {
        if (self.a - 1.0).abs() < 1e-6 {
            self.to_hex()
        } else {
            format!("rgba({},{},{},{:.3})", self.r, self.g, self.b, self.a)
        }
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_svg_fill())
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Color::parse_hex(&s).ok_or_else(|| {
            serde::de::Error::custom(format!("invalid color '{s}', expected #rrggbb"))
        })
    }
}

impl Serialize for Color {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::rgb(0, 0, 0)
    }
}

// --- Palettes ---

pub const SCTRENDS: &[&str] = &["#1F5A96", "#D1495B", "#00798C", "#EDAE49", "#66A182", "#8D6A9F"];

pub const OKABE_ITO: &[&str] =
    &["#0072b2", "#d55e00", "#009e73", "#e69f00", "#56b4e9", "#cc79a7", "#f0e442"];

pub const GRAYSCALE: &[&str] = &["#111111", "#666666", "#999999", "#bbbbbb"];

pub fn palette_colors(name: &str) -> Vec<Color> {
    let strs = match name {
        "okabe_ito" => OKABE_ITO,
        "grayscale" => GRAYSCALE,
        _ => SCTRENDS,
    };
    strs.iter().map(|s| Color::hex(s)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_parsing() {
        let c = Color::hex("#1F5A96");
        assert_eq!((c.r, c.g, c.b), (0x1F, 0x5A, 0x96));
        assert!((c.a - 1.0).abs() < 1e-9);
        assert_eq!(Color::parse_hex("1f5a96"), Some(c));
        assert_eq!(Color::parse_hex("#fff"), None);
        assert_eq!(Color::parse_hex("#gg0000"), None);
    }

    #[test]
    fn svg_fill() {
        let c = Color::rgb(31, 90, 150);
        assert_eq!(c.to_svg_fill(), "#1f5a96");
        assert_eq!(c.with_alpha(0.25).to_svg_fill(), "rgba(31,90,150,0.250)");
    }

    #[test]
    fn palette_lookup() {
        assert_eq!(palette_colors("sctrends").len(), 6);
        assert_eq!(palette_colors("okabe_ito").len(), 7);
        assert_eq!(palette_colors("grayscale").len(), 4);
        assert_eq!(palette_colors("nope"), palette_colors("sctrends"));
    }
}
