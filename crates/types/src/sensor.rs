//! Sensor identities, readings and the source trait the renderer samples.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Key used to look up a live telemetry value
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SensorId {
    /// Composite hardware id: device plus sensor within the device
    Hardware { device: String, sensor: String },
    /// Sensor exposed by a plugin, addressed by its string id
    Plugin { id: String },
    /// Sensor from the AIDA64 shared-memory feed, addressed by its string id
    Aida { id: String },
}

impl SensorId {
    pub fn hardware(device: impl Into<String>, sensor: impl Into<String>) -> Self {
        Self::Hardware {
            device: device.into(),
            sensor: sensor.into(),
        }
    }

    pub fn plugin(id: impl Into<String>) -> Self {
        Self::Plugin { id: id.into() }
    }

    pub fn aida(id: impl Into<String>) -> Self {
        Self::Aida { id: id.into() }
    }

    /// Stable string key, unique across the three identity kinds
    pub fn key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for SensorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SensorId::Hardware { device, sensor } => write!(f, "hw:{}/{}", device, sensor),
            SensorId::Plugin { id } => write!(f, "plugin:{}", id),
            SensorId::Aida { id } => write!(f, "aida:{}", id),
        }
    }
}

/// Tabular sensor result (e.g. per-process or per-disk lists)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SensorTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Snapshot returned by a sensor lookup; sampled each frame, never stored
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SensorReading {
    pub value_now: f64,
    #[serde(default)]
    pub value_text: Option<String>,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub value_table: Option<SensorTable>,
}

impl SensorReading {
    pub fn numeric(value: f64, unit: impl Into<String>) -> Self {
        Self {
            value_now: value,
            unit: unit.into(),
            ..Default::default()
        }
    }
}

/// Trait for anything that can produce live sensor values.
///
/// Implementations must fail silently: an unavailable backend returns `None`
/// and the renderer shows a blank or zero value.
pub trait SensorSource: Send + Sync {
    fn read(&self, id: &SensorId) -> Option<SensorReading>;
}

/// Source with no sensors, useful for static panels
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSensorSource;

impl SensorSource for NullSensorSource {
    fn read(&self, _id: &SensorId) -> Option<SensorReading> {
        None
    }
}

/// Comparison used by sensor-conditional visibility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Comparison {
    #[serde(rename = ">")]
    #[default]
    Greater,
    #[serde(rename = ">=")]
    GreaterOrEqual,
    #[serde(rename = "<")]
    Less,
    #[serde(rename = "<=")]
    LessOrEqual,
    #[serde(rename = "==")]
    Equal,
    #[serde(rename = "!=")]
    NotEqual,
}

impl Comparison {
    pub fn holds(&self, value: f64, threshold: f64) -> bool {
        match self {
            Comparison::Greater => value > threshold,
            Comparison::GreaterOrEqual => value >= threshold,
            Comparison::Less => value < threshold,
            Comparison::LessOrEqual => value <= threshold,
            Comparison::Equal => (value - threshold).abs() < f64::EPSILON,
            Comparison::NotEqual => (value - threshold).abs() >= f64::EPSILON,
        }
    }
}

/// Show an item only while a sensor reading satisfies a comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorCondition {
    pub sensor: SensorId,
    #[serde(default)]
    pub comparison: Comparison,
    pub threshold: f64,
}

impl SensorCondition {
    /// A missing reading never satisfies the condition
    pub fn evaluate(&self, source: &dyn SensorSource) -> bool {
        source
            .read(&self.sensor)
            .map(|r| self.comparison.holds(r.value_now, self.threshold))
            .unwrap_or(false)
    }
}
