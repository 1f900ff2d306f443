//! Drawing surface abstraction.
//!
//! A small immediate-mode 2D API the compositor and graph renderer draw
//! through. `CairoSurface` implements it for real pixels and
//! `RecordingSurface` records the calls for headless inspection.

use std::sync::Arc;

use anyhow::Result;
use sensor_panel_core::DecodedImage;
use sensor_panel_types::{
    Color, Ellipsis, FontSpec, GradientSpec, Path, Point, Rect, TextAlign, VerticalAlign,
};

/// Source of color for a fill or stroke
#[derive(Debug, Clone, PartialEq)]
pub enum Paint {
    Solid(Color),
    /// Gradient laid out over `bounds`; `phase` (0..1) animates pulsing styles
    Gradient {
        spec: GradientSpec,
        bounds: Rect,
        phase: f64,
    },
}

impl Paint {
    pub fn gradient(spec: GradientSpec, bounds: Rect) -> Self {
        Paint::Gradient {
            spec,
            bounds,
            phase: 0.0,
        }
    }

    /// Color representative of this paint (the gradient start for gradients)
    pub fn base_color(&self) -> Color {
        match self {
            Paint::Solid(c) => *c,
            Paint::Gradient { spec, .. } => spec.start,
        }
    }
}

impl From<Color> for Paint {
    fn from(color: Color) -> Self {
        Paint::Solid(color)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineCap {
    #[default]
    Butt,
    Round,
    Square,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stroke {
    pub paint: Paint,
    pub width: f64,
    pub cap: LineCap,
    /// On/off lengths; empty for a solid line
    pub dash: Vec<f64>,
}

impl Stroke {
    pub fn new(paint: impl Into<Paint>, width: f64) -> Self {
        Self {
            paint: paint.into(),
            width,
            cap: LineCap::Butt,
            dash: Vec::new(),
        }
    }

    pub fn dashed(mut self, dash: Vec<f64>) -> Self {
        self.dash = dash;
        self
    }

    pub fn with_cap(mut self, cap: LineCap) -> Self {
        self.cap = cap;
        self
    }
}

/// Rotation about an arbitrary center, in degrees clockwise
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rotation {
    pub center: Point,
    pub degrees: f64,
}

impl Rotation {
    pub fn about(center: Point, degrees: f64) -> Option<Self> {
        if degrees % 360.0 == 0.0 {
            None
        } else {
            Some(Self { center, degrees })
        }
    }
}

/// Placement and styling of a block of text
#[derive(Debug, Clone, PartialEq)]
pub struct TextLayout {
    /// Box the text is aligned in; width bounds wrapping and ellipsis
    pub rect: Rect,
    pub font: FontSpec,
    pub color: Color,
    pub align: TextAlign,
    pub vertical_align: VerticalAlign,
    pub wrap: bool,
    pub ellipsis: Ellipsis,
}

impl TextLayout {
    pub fn new(rect: Rect, font: FontSpec, color: Color) -> Self {
        Self {
            rect,
            font,
            color,
            align: TextAlign::Left,
            vertical_align: VerticalAlign::Top,
            wrap: false,
            ellipsis: Ellipsis::None,
        }
    }

    pub fn aligned(mut self, align: TextAlign, vertical_align: VerticalAlign) -> Self {
        self.align = align;
        self.vertical_align = vertical_align;
        self
    }
}

/// Options for blitting an image
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageDraw {
    /// Degrees clockwise about the destination center
    pub rotation: f64,
    pub flip_horizontal: bool,
    pub flip_vertical: bool,
    pub opacity: f64,
}

impl Default for ImageDraw {
    fn default() -> Self {
        Self {
            rotation: 0.0,
            flip_horizontal: false,
            flip_vertical: false,
            opacity: 1.0,
        }
    }
}

/// Annulus or partial annulus with a percentage-filled foreground
#[derive(Debug, Clone, PartialEq)]
pub struct Donut {
    pub center: Point,
    /// Outer radius
    pub radius: f64,
    pub thickness: f64,
    /// Degrees clockwise from 3 o'clock
    pub start_angle: f64,
    /// Total arc in degrees
    pub span: f64,
    /// 0..=100
    pub percent: f64,
    pub background: Option<Color>,
    pub foreground: Paint,
    pub outline: Option<(Color, f64)>,
    pub round_caps: bool,
}

impl Donut {
    /// Degrees covered by the foreground
    pub fn filled_sweep(&self) -> f64 {
        self.span * self.percent.clamp(0.0, 100.0) / 100.0
    }

    /// Radius through the middle of the ring
    pub fn mid_radius(&self) -> f64 {
        (self.radius - self.thickness / 2.0).max(0.0)
    }
}

/// Measured extent of laid-out text
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TextSize {
    pub width: f64,
    pub height: f64,
}

/// Immediate-mode drawing target.
///
/// Coordinates are in surface pixels after the current transform. Drawing
/// a degenerate shape (empty rect, empty path, zero-size text) is a no-op.
pub trait Surface {
    /// Size of the drawing target in pixels
    fn size(&self) -> (f64, f64);

    fn clear(&mut self, color: Color) -> Result<()>;

    fn save(&mut self) -> Result<()>;
    fn restore(&mut self) -> Result<()>;
    fn translate(&mut self, dx: f64, dy: f64);
    fn scale(&mut self, sx: f64, sy: f64);
    fn rotate_about(&mut self, center: Point, degrees: f64);
    fn clip_rect(&mut self, rect: Rect);

    fn draw_line(&mut self, from: Point, to: Point, stroke: &Stroke) -> Result<()>;
    fn draw_rect(&mut self, rect: Rect, stroke: &Stroke, rotation: Option<Rotation>) -> Result<()>;
    fn fill_rect(&mut self, rect: Rect, paint: &Paint, rotation: Option<Rotation>) -> Result<()>;
    fn draw_path(&mut self, path: &Path, stroke: &Stroke) -> Result<()>;
    fn fill_path(&mut self, path: &Path, paint: &Paint) -> Result<()>;

    /// Size of `text` as it would be drawn; `wrap_width` bounds wrapped text
    fn measure_string(&mut self, text: &str, font: &FontSpec, wrap_width: Option<f64>) -> TextSize;
    fn draw_string(&mut self, text: &str, layout: &TextLayout) -> Result<()>;

    /// Draw frame `frame` of `image` stretched into `dest`
    fn draw_image(
        &mut self,
        image: &Arc<DecodedImage>,
        frame: usize,
        dest: Rect,
        options: &ImageDraw,
    ) -> Result<()>;

    fn fill_donut(&mut self, donut: &Donut) -> Result<()>;

    /// Redirect drawing into a fresh transparent `width` x `height` layer
    fn begin_layer(&mut self, width: u32, height: u32) -> Result<()>;
    /// Composite the current layer into `dest` on the layer below
    fn end_layer(&mut self, dest: Rect, flip_horizontal: bool) -> Result<()>;

    /// Called once after each frame; backends drop stale native resources here
    fn end_frame(&mut self) {}
}
