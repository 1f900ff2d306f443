//! sensor-panel-types: Scene model and shared data types for sensor-panel.
//!
//! This crate contains pure data types (colors, geometry, the display item
//! tree, profiles, sensor identities) shared by every sensor-panel crate.
//! Nothing here depends on Cairo or on a runtime, so the scene model can be
//! built and inspected without a drawing backend.

pub mod color;
pub mod geometry;
pub mod items;
pub mod profile;
pub mod sensor;
pub mod text;

// Re-export commonly used types at the crate root for convenience
pub use color::{color_at, Color, ColorParseError, ColorStop, GradientSpec, GradientStyle};
pub use geometry::{Path, PathEl, Point, Rect};
pub use items::{
    ArcItem, BarItem, ChartStyle, DisplayItem, DonutItem, GaugeImages, GraphItem, GraphMode,
    GroupItem, ImageItem, ImageSource, ItemBase, SensorText, ShapeItem, ShapeKind, TableColumn,
    TableText, TextContent, TextItem, ThresholdColors,
};
pub use profile::{GridSettings, Profile, SceneError, WindowPlacement};
pub use sensor::{
    Comparison, NullSensorSource, SensorCondition, SensorId, SensorReading, SensorSource,
    SensorTable,
};
pub use text::{Ellipsis, FontSpec, Marquee, TextAlign, TextStyle, VerticalAlign};
