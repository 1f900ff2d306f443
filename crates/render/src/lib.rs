//! sensor-panel-render: drawing surfaces, gradients, shapes and charts.

pub mod cairo_surface;
pub mod gradient;
pub mod graph;
pub mod pango_text;
pub mod recording;
pub mod render_cache;
pub mod shapes;
pub mod surface;
pub mod text_layout;

pub use cairo_surface::CairoSurface;
pub use recording::{DrawCommand, RecordingSurface};
pub use surface::{Donut, ImageDraw, LineCap, Paint, Rotation, Stroke, Surface, TextLayout, TextSize};
