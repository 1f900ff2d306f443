//! Shape items: filled/stroked polygons from a fixed set of kinds.

use serde::{Deserialize, Serialize};

use super::ItemBase;
use crate::color::{Color, GradientSpec};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ShapeKind {
    #[default]
    Rectangle,
    Capsule,
    Ellipse,
    Triangle,
    Star,
    Pentagon,
    Hexagon,
    Plus,
    Arrow,
    Octagon,
    Trapezoid,
    Parallelogram,
}

impl ShapeKind {
    pub const ALL: [ShapeKind; 12] = [
        ShapeKind::Rectangle,
        ShapeKind::Capsule,
        ShapeKind::Ellipse,
        ShapeKind::Triangle,
        ShapeKind::Star,
        ShapeKind::Pentagon,
        ShapeKind::Hexagon,
        ShapeKind::Plus,
        ShapeKind::Arrow,
        ShapeKind::Octagon,
        ShapeKind::Trapezoid,
        ShapeKind::Parallelogram,
    ];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeItem {
    #[serde(flatten)]
    pub base: ItemBase,
    #[serde(default)]
    pub kind: ShapeKind,
    #[serde(default = "default_true")]
    pub show_fill: bool,
    #[serde(default = "default_fill")]
    pub fill_color: Color,
    /// Replaces `fill_color` when set
    #[serde(default)]
    pub fill_gradient: Option<GradientSpec>,
    #[serde(default)]
    pub show_frame: bool,
    #[serde(default = "default_frame")]
    pub frame_color: Color,
    /// Replaces `frame_color` when set
    #[serde(default)]
    pub frame_gradient: Option<GradientSpec>,
    #[serde(default = "default_frame_thickness")]
    pub frame_thickness: f64,
    /// Corner rounding for rectangles
    #[serde(default)]
    pub corner_radius: f64,
}

fn default_true() -> bool {
    true
}

fn default_fill() -> Color {
    Color::new(0.3, 0.3, 0.3, 1.0)
}

fn default_frame() -> Color {
    Color::WHITE
}

fn default_frame_thickness() -> f64 {
    1.0
}

impl ShapeItem {
    pub fn new(base: ItemBase, kind: ShapeKind) -> Self {
        Self {
            base,
            kind,
            show_fill: true,
            fill_color: default_fill(),
            fill_gradient: None,
            show_frame: false,
            frame_color: default_frame(),
            frame_gradient: None,
            frame_thickness: default_frame_thickness(),
            corner_radius: 0.0,
        }
    }
}
