//! Recording backend: keeps every draw call as a `DrawCommand`.
//!
//! Used for headless rendering checks. Text is measured with a fixed
//! advance of `0.6 * size` per character and a line height of `1.2 * size`,
//! so layout math is deterministic without a font system.

use std::sync::Arc;

use anyhow::{bail, Result};
use sensor_panel_core::DecodedImage;
use sensor_panel_types::{Color, FontSpec, Path, Point, Rect};

use crate::surface::{Donut, ImageDraw, Paint, Rotation, Stroke, Surface, TextLayout, TextSize};

const ADVANCE: f64 = 0.6;
const LINE_HEIGHT: f64 = 1.2;

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Clear(Color),
    Save,
    Restore,
    Translate(f64, f64),
    Scale(f64, f64),
    Rotate { center: Point, degrees: f64 },
    Clip(Rect),
    Line { from: Point, to: Point, stroke: Stroke },
    StrokeRect { rect: Rect, stroke: Stroke, rotation: Option<Rotation> },
    FillRect { rect: Rect, paint: Paint, rotation: Option<Rotation> },
    StrokePath { path: Path, stroke: Stroke },
    FillPath { path: Path, paint: Paint },
    Text { text: String, layout: TextLayout },
    Image { image: u64, frame: usize, dest: Rect, options: ImageDraw },
    Donut(Donut),
    BeginLayer { width: u32, height: u32 },
    EndLayer { dest: Rect, flip_horizontal: bool },
}

#[derive(Debug, Default)]
pub struct RecordingSurface {
    width: f64,
    height: f64,
    commands: Vec<DrawCommand>,
    save_depth: usize,
    layer_depth: usize,
    frames: usize,
}

impl RecordingSurface {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            ..Default::default()
        }
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Drain the recorded commands, keeping size and frame count
    pub fn take_commands(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Every string drawn, in order
    pub fn texts(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Bounds of every filled rect and path, in order
    pub fn filled_bounds(&self) -> Vec<Rect> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::FillRect { rect, .. } => Some(*rect),
                DrawCommand::FillPath { path, .. } => path.bounds(),
                _ => None,
            })
            .collect()
    }

    /// `(image id, frame)` of every image drawn
    pub fn images(&self) -> Vec<(u64, usize)> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Image { image, frame, .. } => Some((*image, *frame)),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, pred: impl Fn(&DrawCommand) -> bool) -> usize {
        self.commands.iter().filter(|c| pred(c)).count()
    }

    /// Frames completed through `end_frame`
    pub fn frames(&self) -> usize {
        self.frames
    }

    /// Nested save/layer depth; zero between well-formed frames
    pub fn depth(&self) -> (usize, usize) {
        (self.save_depth, self.layer_depth)
    }
}

/// Deterministic text extent used by the recording backend
pub fn measure_fixed(text: &str, font: &FontSpec, wrap_width: Option<f64>) -> TextSize {
    let advance = font.size * ADVANCE;
    if text.is_empty() || advance <= 0.0 {
        return TextSize::default();
    }
    let per_line = wrap_width
        .filter(|w| *w > 0.0)
        .map(|w| ((w / advance).floor() as usize).max(1));

    let mut lines = 0usize;
    let mut widest = 0usize;
    for line in text.split('\n') {
        let chars = line.chars().count();
        match per_line {
            Some(limit) => {
                lines += chars.div_ceil(limit).max(1);
                widest = widest.max(chars.min(limit));
            }
            None => {
                lines += 1;
                widest = widest.max(chars);
            }
        }
    }
    TextSize {
        width: widest as f64 * advance,
        height: lines as f64 * font.size * LINE_HEIGHT,
    }
}

impl Surface for RecordingSurface {
    fn size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    fn clear(&mut self, color: Color) -> Result<()> {
        self.commands.push(DrawCommand::Clear(color));
        Ok(())
    }

    fn save(&mut self) -> Result<()> {
        self.save_depth += 1;
        self.commands.push(DrawCommand::Save);
        Ok(())
    }

    fn restore(&mut self) -> Result<()> {
        if self.save_depth == 0 {
            bail!("restore without matching save");
        }
        self.save_depth -= 1;
        self.commands.push(DrawCommand::Restore);
        Ok(())
    }

    fn translate(&mut self, dx: f64, dy: f64) {
        self.commands.push(DrawCommand::Translate(dx, dy));
    }

    fn scale(&mut self, sx: f64, sy: f64) {
        self.commands.push(DrawCommand::Scale(sx, sy));
    }

    fn rotate_about(&mut self, center: Point, degrees: f64) {
        self.commands.push(DrawCommand::Rotate { center, degrees });
    }

    fn clip_rect(&mut self, rect: Rect) {
        self.commands.push(DrawCommand::Clip(rect));
    }

    fn draw_line(&mut self, from: Point, to: Point, stroke: &Stroke) -> Result<()> {
        self.commands.push(DrawCommand::Line {
            from,
            to,
            stroke: stroke.clone(),
        });
        Ok(())
    }

    fn draw_rect(&mut self, rect: Rect, stroke: &Stroke, rotation: Option<Rotation>) -> Result<()> {
        if !rect.is_empty() {
            self.commands.push(DrawCommand::StrokeRect {
                rect,
                stroke: stroke.clone(),
                rotation,
            });
        }
        Ok(())
    }

    fn fill_rect(&mut self, rect: Rect, paint: &Paint, rotation: Option<Rotation>) -> Result<()> {
        if !rect.is_empty() {
            self.commands.push(DrawCommand::FillRect {
                rect,
                paint: paint.clone(),
                rotation,
            });
        }
        Ok(())
    }

    fn draw_path(&mut self, path: &Path, stroke: &Stroke) -> Result<()> {
        if !path.is_empty() {
            self.commands.push(DrawCommand::StrokePath {
                path: path.clone(),
                stroke: stroke.clone(),
            });
        }
        Ok(())
    }

    fn fill_path(&mut self, path: &Path, paint: &Paint) -> Result<()> {
        if !path.is_empty() {
            self.commands.push(DrawCommand::FillPath {
                path: path.clone(),
                paint: paint.clone(),
            });
        }
        Ok(())
    }

    fn measure_string(&mut self, text: &str, font: &FontSpec, wrap_width: Option<f64>) -> TextSize {
        measure_fixed(text, font, wrap_width)
    }

    fn draw_string(&mut self, text: &str, layout: &TextLayout) -> Result<()> {
        if !text.is_empty() {
            self.commands.push(DrawCommand::Text {
                text: text.to_string(),
                layout: layout.clone(),
            });
        }
        Ok(())
    }

    fn draw_image(
        &mut self,
        image: &Arc<DecodedImage>,
        frame: usize,
        dest: Rect,
        options: &ImageDraw,
    ) -> Result<()> {
        if !dest.is_empty() {
            self.commands.push(DrawCommand::Image {
                image: image.id(),
                frame,
                dest,
                options: *options,
            });
        }
        Ok(())
    }

    fn fill_donut(&mut self, donut: &Donut) -> Result<()> {
        if donut.radius > 0.0 {
            self.commands.push(DrawCommand::Donut(donut.clone()));
        }
        Ok(())
    }

    fn begin_layer(&mut self, width: u32, height: u32) -> Result<()> {
        self.layer_depth += 1;
        self.commands.push(DrawCommand::BeginLayer { width, height });
        Ok(())
    }

    fn end_layer(&mut self, dest: Rect, flip_horizontal: bool) -> Result<()> {
        if self.layer_depth == 0 {
            bail!("end_layer without matching begin_layer");
        }
        self.layer_depth -= 1;
        self.commands.push(DrawCommand::EndLayer {
            dest,
            flip_horizontal,
        });
        Ok(())
    }

    fn end_frame(&mut self) {
        self.frames += 1;
    }
}
