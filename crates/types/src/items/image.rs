//! Image items: file, URL and sensor-driven gauge images.

use serde::{Deserialize, Serialize};

use super::ItemBase;
use crate::color::Color;
use crate::sensor::{SensorId, SensorSource};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageItem {
    #[serde(flatten)]
    pub base: ItemBase,
    pub source: ImageSource,
    #[serde(default)]
    pub flip_horizontal: bool,
    #[serde(default)]
    pub flip_vertical: bool,
    #[serde(default = "default_opacity")]
    pub opacity: f64,
    /// Color layered over the image inside its bounds
    #[serde(default)]
    pub tint: Option<Color>,
    /// When false, switching to a different image (a new gauge step or a
    /// changed path) drops the previously shown one from the asset cache
    #[serde(default = "default_true")]
    pub cache: bool,
    /// Keep the decoded image cached even when idle
    #[serde(default)]
    pub persistent: bool,
    /// Draw the playback HUD over animated images
    #[serde(default = "default_true")]
    pub show_hud: bool,
}

fn default_opacity() -> f64 {
    1.0
}

fn default_true() -> bool {
    true
}

/// Where the pixels of an image item come from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ImageSource {
    /// Absolute or profile-relative file path
    File { path: String },
    /// Remote image fetched once and cached by URL
    Url { url: String },
    /// One of several images picked by a sensor value
    Gauge(GaugeImages),
}

/// Image sequence indexed by a normalized sensor value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GaugeImages {
    pub sensor: SensorId,
    pub images: Vec<String>,
    #[serde(default)]
    pub min: f64,
    #[serde(default = "default_max")]
    pub max: f64,
}

fn default_max() -> f64 {
    100.0
}

impl GaugeImages {
    /// Index of the image for `value`; `None` when there are no images
    pub fn index_for(&self, value: f64) -> Option<usize> {
        if self.images.is_empty() {
            return None;
        }
        let range = self.max - self.min;
        let normalized = if range.abs() < f64::EPSILON {
            0.0
        } else {
            ((value - self.min) / range).clamp(0.0, 1.0)
        };
        Some((normalized * (self.images.len() - 1) as f64).round() as usize)
    }
}

impl ImageItem {
    pub fn file(base: ItemBase, path: impl Into<String>) -> Self {
        Self {
            base,
            source: ImageSource::File { path: path.into() },
            flip_horizontal: false,
            flip_vertical: false,
            opacity: 1.0,
            tint: None,
            cache: true,
            persistent: false,
            show_hud: true,
        }
    }

    /// Cache key for the image to show now.
    ///
    /// `resolve` turns a profile-relative path into an absolute one. URLs are
    /// used verbatim. Gauge images without a reading fall back to the first image.
    pub fn asset_key(
        &self,
        source: &dyn SensorSource,
        resolve: impl Fn(&str) -> String,
    ) -> Option<String> {
        match &self.source {
            ImageSource::File { path } if !path.is_empty() => Some(resolve(path)),
            ImageSource::File { .. } => None,
            ImageSource::Url { url } if !url.is_empty() => Some(url.clone()),
            ImageSource::Url { .. } => None,
            ImageSource::Gauge(gauge) => {
                let value = source
                    .read(&gauge.sensor)
                    .map(|r| r.value_now)
                    .unwrap_or(gauge.min);
                let index = gauge.index_for(value)?;
                Some(resolve(&gauge.images[index]))
            }
        }
    }
}
