//! Chart items: time-series graphs, bars and donuts bound to one sensor.

use serde::{Deserialize, Serialize};

use super::ItemBase;
use crate::color::Color;
use crate::sensor::SensorId;

/// Styling and scaling shared by every chart variant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartStyle {
    pub sensor: SensorId,
    #[serde(default)]
    pub min: f64,
    #[serde(default = "default_max")]
    pub max: f64,
    /// Derive min/max from the visible samples instead of `min`/`max`
    #[serde(default)]
    pub auto_scale: bool,
    /// Ease bar/donut values toward new readings
    #[serde(default = "default_true")]
    pub smooth: bool,
    #[serde(default = "default_foreground")]
    pub color: Color,
    /// When set, the foreground blends from `color` to this color
    #[serde(default)]
    pub gradient_color: Option<Color>,
    #[serde(default)]
    pub background: Option<Color>,
    #[serde(default)]
    pub frame: Option<Color>,
    /// Mirror the rendered chart horizontally when blitting
    #[serde(default)]
    pub flip_x: bool,
}

fn default_max() -> f64 {
    100.0
}

fn default_true() -> bool {
    true
}

fn default_foreground() -> Color {
    Color::new(0.2, 0.6, 1.0, 1.0)
}

impl ChartStyle {
    pub fn new(sensor: SensorId) -> Self {
        Self {
            sensor,
            min: 0.0,
            max: default_max(),
            auto_scale: false,
            smooth: true,
            color: default_foreground(),
            gradient_color: None,
            background: None,
            frame: None,
            flip_x: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GraphMode {
    #[default]
    Line,
    Histogram,
}

/// Line or histogram time series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphItem {
    #[serde(flatten)]
    pub base: ItemBase,
    pub chart: ChartStyle,
    #[serde(default)]
    pub mode: GraphMode,
    /// Horizontal pixels per sample (line) or bar pitch base (histogram)
    #[serde(default = "default_step")]
    pub step: f64,
    /// Line width, or bar thickness for histograms
    #[serde(default = "default_thickness")]
    pub thickness: f64,
    /// Gap between histogram bars
    #[serde(default = "default_spacing")]
    pub spacing: f64,
    /// Fill the area under the line with this color
    #[serde(default)]
    pub fill: Option<Color>,
}

fn default_step() -> f64 {
    4.0
}

fn default_thickness() -> f64 {
    2.0
}

fn default_spacing() -> f64 {
    1.0
}

impl GraphItem {
    pub fn new(base: ItemBase, chart: ChartStyle) -> Self {
        Self {
            base,
            chart,
            mode: GraphMode::Line,
            step: default_step(),
            thickness: default_thickness(),
            spacing: default_spacing(),
            fill: None,
        }
    }
}

/// Single-value bar gauge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarItem {
    #[serde(flatten)]
    pub base: ItemBase,
    pub chart: ChartStyle,
    /// Fill bottom-to-top instead of left-to-right
    #[serde(default)]
    pub vertical: bool,
    #[serde(default)]
    pub corner_radius: f64,
}

impl BarItem {
    pub fn new(base: ItemBase, chart: ChartStyle) -> Self {
        Self {
            base,
            chart,
            vertical: false,
            corner_radius: 0.0,
        }
    }
}

/// Ring gauge filled by percentage over a configurable span
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DonutItem {
    #[serde(flatten)]
    pub base: ItemBase,
    pub chart: ChartStyle,
    /// Ring thickness in pixels
    #[serde(default = "default_ring")]
    pub thickness: f64,
    /// Total arc in degrees; 360 is a full ring
    #[serde(default = "default_span")]
    pub span: f64,
    /// Start angle in degrees clockwise from 3 o'clock
    #[serde(default)]
    pub rotation_offset: f64,
}

fn default_ring() -> f64 {
    10.0
}

fn default_span() -> f64 {
    360.0
}

impl DonutItem {
    pub fn new(base: ItemBase, chart: ChartStyle) -> Self {
        Self {
            base,
            chart,
            thickness: default_ring(),
            span: default_span(),
            rotation_offset: 0.0,
        }
    }
}
