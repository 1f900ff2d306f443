//! Text styling types shared by text items, chart labels and the HUD.

use serde::{Deserialize, Serialize};

use crate::color::Color;

/// Font selection for a run of text; `size` is in pixels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontSpec {
    #[serde(default = "default_family")]
    pub family: String,
    #[serde(default = "default_size")]
    pub size: f64,
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
    #[serde(default)]
    pub underline: bool,
    #[serde(default)]
    pub strikeout: bool,
}

fn default_family() -> String {
    "Sans".to_string()
}

fn default_size() -> f64 {
    14.0
}

impl Default for FontSpec {
    fn default() -> Self {
        Self {
            family: default_family(),
            size: default_size(),
            bold: false,
            italic: false,
            underline: false,
            strikeout: false,
        }
    }
}

impl FontSpec {
    pub fn new(family: impl Into<String>, size: f64) -> Self {
        Self {
            family: family.into(),
            size,
            ..Default::default()
        }
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    /// Same font at a different pixel size
    pub fn with_size(&self, size: f64) -> Self {
        Self {
            size,
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum VerticalAlign {
    #[default]
    Top,
    Middle,
    Bottom,
}

/// Where ellipsis truncation removes characters when text overflows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Ellipsis {
    #[default]
    None,
    End,
    Middle,
}

/// Scrolling for text wider than its declared box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Marquee {
    /// Pixels per second
    pub speed: f64,
    /// Gap between the two repeating copies, in pixels
    pub spacing: f64,
}

impl Default for Marquee {
    fn default() -> Self {
        Self {
            speed: 40.0,
            spacing: 40.0,
        }
    }
}

/// Complete style of a text item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextStyle {
    #[serde(default)]
    pub font: FontSpec,
    #[serde(default = "default_text_color")]
    pub color: Color,
    #[serde(default)]
    pub align: TextAlign,
    #[serde(default)]
    pub vertical_align: VerticalAlign,
    #[serde(default)]
    pub wrap: bool,
    #[serde(default)]
    pub ellipsis: Ellipsis,
    #[serde(default)]
    pub marquee: Option<Marquee>,
}

fn default_text_color() -> Color {
    Color::WHITE
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font: FontSpec::default(),
            color: default_text_color(),
            align: TextAlign::default(),
            vertical_align: VerticalAlign::default(),
            wrap: false,
            ellipsis: Ellipsis::default(),
            marquee: None,
        }
    }
}
