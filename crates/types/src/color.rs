//! Foundational color types used throughout sensor-panel.
//!
//! Color, ColorStop and the gradient description are the building blocks
//! for every fill and stroke in a panel.

use serde::{Deserialize, Deserializer, Serialize};

/// RGBA color with alpha channel, components in 0.0..=1.0
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Color {
    pub const WHITE: Color = Color::new(1.0, 1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::new(0.0, 0.0, 0.0, 1.0);
    pub const TRANSPARENT: Color = Color::new(0.0, 0.0, 0.0, 0.0);

    pub const fn new(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }

    pub fn from_rgba8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self {
            r: r as f64 / 255.0,
            g: g as f64 / 255.0,
            b: b as f64 / 255.0,
            a: a as f64 / 255.0,
        }
    }

    pub fn to_rgba8(&self) -> (u8, u8, u8, u8) {
        (
            (self.r.clamp(0.0, 1.0) * 255.0).round() as u8,
            (self.g.clamp(0.0, 1.0) * 255.0).round() as u8,
            (self.b.clamp(0.0, 1.0) * 255.0).round() as u8,
            (self.a.clamp(0.0, 1.0) * 255.0).round() as u8,
        )
    }

    /// Same color with a different alpha
    pub fn with_alpha(&self, a: f64) -> Self {
        Self { a, ..*self }
    }

    /// Linear interpolation between two colors
    pub fn lerp(&self, other: &Color, t: f64) -> Color {
        let t = t.clamp(0.0, 1.0);
        Color {
            r: self.r + (other.r - self.r) * t,
            g: self.g + (other.g - self.g) * t,
            b: self.b + (other.b - self.b) * t,
            a: self.a + (other.a - self.a) * t,
        }
    }

    /// Parse `#RGB`, `#RRGGBB` or `#RRGGBBAA` (leading `#` optional)
    pub fn parse(text: &str) -> Result<Self, ColorParseError> {
        let hex = text.trim().trim_start_matches('#');
        let digit = |i: usize| -> Result<u8, ColorParseError> {
            u8::from_str_radix(&hex[i..i + 2], 16)
                .map_err(|_| ColorParseError(text.to_string()))
        };

        if !hex.is_ascii() {
            return Err(ColorParseError(text.to_string()));
        }

        match hex.len() {
            3 => {
                let mut channels = [0u8; 3];
                for (i, c) in hex.chars().enumerate() {
                    let v = c.to_digit(16).ok_or_else(|| ColorParseError(text.to_string()))?;
                    channels[i] = (v * 17) as u8;
                }
                Ok(Self::from_rgba8(channels[0], channels[1], channels[2], 255))
            }
            6 => Ok(Self::from_rgba8(digit(0)?, digit(2)?, digit(4)?, 255)),
            8 => Ok(Self::from_rgba8(digit(0)?, digit(2)?, digit(4)?, digit(6)?)),
            _ => Err(ColorParseError(text.to_string())),
        }
    }

    /// Parse a color, falling back to `fallback` (and logging) when malformed
    pub fn parse_or(text: &str, fallback: Color) -> Self {
        Self::parse(text).unwrap_or_else(|e| {
            log::warn!("{}, using fallback color", e);
            fallback
        })
    }

    /// `#RRGGBBAA` representation
    pub fn to_hex(&self) -> String {
        let (r, g, b, a) = self.to_rgba8();
        format!("#{:02X}{:02X}{:02X}{:02X}", r, g, b, a)
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::new(0.0, 0.0, 0.0, 1.0)
    }
}

/// Error returned for unparsable color strings
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("malformed color string '{0}'")]
pub struct ColorParseError(pub String);

/// Colors deserialize from either a hex string or an `{r, g, b, a}` object.
/// A malformed hex string degrades to white instead of failing the whole profile.
impl<'de> Deserialize<'de> for Color {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum ColorRepr {
            Hex(String),
            Rgba {
                r: f64,
                g: f64,
                b: f64,
                #[serde(default = "opaque")]
                a: f64,
            },
        }

        fn opaque() -> f64 {
            1.0
        }

        Ok(match ColorRepr::deserialize(deserializer)? {
            ColorRepr::Hex(text) => Color::parse_or(&text, Color::WHITE),
            ColorRepr::Rgba { r, g, b, a } => Color::new(r, g, b, a),
        })
    }
}

/// Color stop for gradients
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ColorStop {
    pub position: f64, // 0.0 to 1.0
    pub color: Color,
}

impl ColorStop {
    pub fn new(position: f64, color: Color) -> Self {
        Self { position, color }
    }
}

/// Shader construction used for a two-color gradient fill
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum GradientStyle {
    /// Straight blend along `angle`
    #[default]
    Linear,
    /// Conic blend around the center
    Sweep,
    /// Concentric rings whose phase moves outward over time
    RadialPulse,
    /// Four triangles meeting at the center, blending center to edge
    Diamond,
    /// Linear blend mirrored about the midline
    Reflected,
    /// Conic blend whose start angle twists with the radius
    Spiral,
}

/// Two-color gradient description attached to fills and strokes
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GradientSpec {
    #[serde(default)]
    pub style: GradientStyle,
    pub start: Color,
    pub end: Color,
    /// Degrees; 0 = left to right, 90 = top to bottom
    #[serde(default)]
    pub angle: f64,
}

impl GradientSpec {
    pub fn new(style: GradientStyle, start: Color, end: Color) -> Self {
        Self {
            style,
            start,
            end,
            angle: 0.0,
        }
    }

    pub fn stops(&self) -> [ColorStop; 2] {
        [
            ColorStop::new(0.0, self.start),
            ColorStop::new(1.0, self.end),
        ]
    }
}

/// Interpolate color at position t from sorted color stops
pub fn color_at(stops: &[ColorStop], t: f64) -> Color {
    match stops {
        [] => Color::default(),
        [only] => only.color,
        _ => {
            let t = t.clamp(0.0, 1.0);
            let first = &stops[0];
            let last = &stops[stops.len() - 1];
            if t <= first.position {
                return first.color;
            }
            if t >= last.position {
                return last.color;
            }
            for pair in stops.windows(2) {
                let (a, b) = (&pair[0], &pair[1]);
                if a.position <= t && t <= b.position {
                    let range = b.position - a.position;
                    if range < 0.001 {
                        return a.color;
                    }
                    return a.color.lerp(&b.color, (t - a.position) / range);
                }
            }
            last.color
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_variants() {
        assert_eq!(Color::parse("#FFFFFF").unwrap(), Color::WHITE);
        assert_eq!(Color::parse("000").unwrap(), Color::BLACK);
        let c = Color::parse("#FF000080").unwrap();
        assert_eq!(c.to_rgba8(), (255, 0, 0, 128));
    }

    #[test]
    fn test_malformed_color_falls_back() {
        assert!(Color::parse("#GG0000").is_err());
        assert!(Color::parse("#12345").is_err());
        assert_eq!(Color::parse_or("nope", Color::TRANSPARENT), Color::TRANSPARENT);
    }

    #[test]
    fn test_deserialize_hex_or_struct() {
        let hex: Color = serde_json::from_str("\"#00FF00\"").unwrap();
        assert_eq!(hex.to_rgba8(), (0, 255, 0, 255));
        let obj: Color = serde_json::from_str(r#"{"r":1.0,"g":0.0,"b":0.0}"#).unwrap();
        assert_eq!(obj, Color::new(1.0, 0.0, 0.0, 1.0));
        let bad: Color = serde_json::from_str("\"#zzzzzz\"").unwrap();
        assert_eq!(bad, Color::WHITE);
    }

    #[test]
    fn test_color_at_interpolates() {
        let stops = [
            ColorStop::new(0.0, Color::BLACK),
            ColorStop::new(1.0, Color::WHITE),
        ];
        let mid = color_at(&stops, 0.5);
        assert!((mid.r - 0.5).abs() < 1e-9);
        assert_eq!(color_at(&stops, -1.0), Color::BLACK);
        assert_eq!(color_at(&stops, 2.0), Color::WHITE);
    }
}
