//! Surface doubles shared by the unit tests

use std::sync::Arc;

use anyhow::{bail, Result};
use sensor_panel_core::DecodedImage;
use sensor_panel_render::{
    Donut, ImageDraw, Paint, RecordingSurface, Rotation, Stroke, Surface, TextLayout, TextSize,
};
use sensor_panel_types::{Color, FontSpec, Path, Point, Rect};

/// Which call a `FaultySurface` refuses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    Clear,
    Lines,
    Donuts,
}

/// Records like `RecordingSurface` but fails every call of one kind
pub struct FaultySurface {
    pub inner: RecordingSurface,
    fault: Fault,
}

impl FaultySurface {
    pub fn new(fault: Fault, width: f64, height: f64) -> Self {
        Self {
            inner: RecordingSurface::new(width, height),
            fault,
        }
    }
}

impl Surface for FaultySurface {
    fn size(&self) -> (f64, f64) {
        self.inner.size()
    }
    fn clear(&mut self, color: Color) -> Result<()> {
        if self.fault == Fault::Clear {
            bail!("surface lost");
        }
        self.inner.clear(color)
    }
    fn save(&mut self) -> Result<()> {
        self.inner.save()
    }
    fn restore(&mut self) -> Result<()> {
        self.inner.restore()
    }
    fn translate(&mut self, dx: f64, dy: f64) {
        self.inner.translate(dx, dy)
    }
    fn scale(&mut self, sx: f64, sy: f64) {
        self.inner.scale(sx, sy)
    }
    fn rotate_about(&mut self, center: Point, degrees: f64) {
        self.inner.rotate_about(center, degrees)
    }
    fn clip_rect(&mut self, rect: Rect) {
        self.inner.clip_rect(rect)
    }
    fn draw_line(&mut self, from: Point, to: Point, stroke: &Stroke) -> Result<()> {
        if self.fault == Fault::Lines {
            bail!("line backend unavailable");
        }
        self.inner.draw_line(from, to, stroke)
    }
    fn draw_rect(&mut self, rect: Rect, stroke: &Stroke, rotation: Option<Rotation>) -> Result<()> {
        self.inner.draw_rect(rect, stroke, rotation)
    }
    fn fill_rect(&mut self, rect: Rect, paint: &Paint, rotation: Option<Rotation>) -> Result<()> {
        self.inner.fill_rect(rect, paint, rotation)
    }
    fn draw_path(&mut self, path: &Path, stroke: &Stroke) -> Result<()> {
        self.inner.draw_path(path, stroke)
    }
    fn fill_path(&mut self, path: &Path, paint: &Paint) -> Result<()> {
        self.inner.fill_path(path, paint)
    }
    fn measure_string(&mut self, text: &str, font: &FontSpec, wrap: Option<f64>) -> TextSize {
        self.inner.measure_string(text, font, wrap)
    }
    fn draw_string(&mut self, text: &str, layout: &TextLayout) -> Result<()> {
        self.inner.draw_string(text, layout)
    }
    fn draw_image(
        &mut self,
        image: &Arc<DecodedImage>,
        frame: usize,
        dest: Rect,
        options: &ImageDraw,
    ) -> Result<()> {
        self.inner.draw_image(image, frame, dest, options)
    }
    fn fill_donut(&mut self, donut: &Donut) -> Result<()> {
        if self.fault == Fault::Donuts {
            bail!("donut backend unavailable");
        }
        self.inner.fill_donut(donut)
    }
    fn begin_layer(&mut self, width: u32, height: u32) -> Result<()> {
        self.inner.begin_layer(width, height)
    }
    fn end_layer(&mut self, dest: Rect, flip_horizontal: bool) -> Result<()> {
        self.inner.end_layer(dest, flip_horizontal)
    }
    fn end_frame(&mut self) {
        self.inner.end_frame()
    }
}
