//! Arc gauge items: a partial ring swept by a sensor value.

use serde::{Deserialize, Serialize};

use super::ItemBase;
use crate::color::Color;
use crate::sensor::SensorId;
use crate::text::FontSpec;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArcItem {
    #[serde(flatten)]
    pub base: ItemBase,
    pub sensor: SensorId,
    #[serde(default)]
    pub min: f64,
    #[serde(default = "default_max")]
    pub max: f64,
    /// Ring thickness in pixels
    #[serde(default = "default_thickness")]
    pub thickness: f64,
    /// Degrees (0 = right, 90 = down, 180 = left, 270 = up)
    #[serde(default = "default_start_angle")]
    pub start_angle: f64,
    /// Degrees swept at 100%
    #[serde(default = "default_sweep_angle")]
    pub sweep_angle: f64,
    #[serde(default = "default_background")]
    pub background_color: Color,
    #[serde(default = "default_foreground")]
    pub foreground_color: Color,
    #[serde(default)]
    pub show_value: bool,
    #[serde(default)]
    pub value_font: FontSpec,
    #[serde(default)]
    pub decimals: u8,
    #[serde(default = "default_true")]
    pub show_unit: bool,
    /// Ring drawn around the gauge while the item is selected in the editor
    #[serde(default = "default_highlight")]
    pub highlight_color: Color,
}

fn default_max() -> f64 {
    100.0
}

fn default_thickness() -> f64 {
    12.0
}

fn default_start_angle() -> f64 {
    135.0 // Bottom-left
}

fn default_sweep_angle() -> f64 {
    270.0 // Through the top to bottom-right
}

fn default_background() -> Color {
    Color::new(0.2, 0.2, 0.2, 0.3)
}

fn default_foreground() -> Color {
    Color::new(0.0, 0.8, 0.0, 1.0)
}

fn default_true() -> bool {
    true
}

fn default_highlight() -> Color {
    Color::new(1.0, 0.8, 0.0, 0.8)
}

impl ArcItem {
    pub fn new(base: ItemBase, sensor: SensorId) -> Self {
        Self {
            base,
            sensor,
            min: 0.0,
            max: default_max(),
            thickness: default_thickness(),
            start_angle: default_start_angle(),
            sweep_angle: default_sweep_angle(),
            background_color: default_background(),
            foreground_color: default_foreground(),
            show_value: false,
            value_font: FontSpec::default(),
            decimals: 0,
            show_unit: true,
            highlight_color: default_highlight(),
        }
    }

    /// Fraction of the sweep filled by `value`, clamped to 0..=1.
    /// A zero-width range yields 0.
    pub fn fraction(&self, value: f64) -> f64 {
        let range = self.max - self.min;
        if range.abs() < f64::EPSILON {
            return 0.0;
        }
        ((value - self.min) / range).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fraction_clamps_and_handles_zero_range() {
        let mut arc = ArcItem::new(ItemBase::default(), SensorId::plugin("t"));
        assert_eq!(arc.fraction(50.0), 0.5);
        assert_eq!(arc.fraction(-5.0), 0.0);
        assert_eq!(arc.fraction(500.0), 1.0);
        arc.max = arc.min;
        assert_eq!(arc.fraction(50.0), 0.0);
    }
}
