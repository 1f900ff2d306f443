//! Cairo/Pango implementation of `Surface`.

use std::collections::HashMap;
use std::f64::consts::PI;
use std::fs::File;
use std::path::Path as FsPath;
use std::sync::{Arc, Weak};

use anyhow::{anyhow, bail, Context as _, Result};
use cairo::{Context, Extend, Format, ImageSurface, LinearGradient, Mesh, MeshCorner, RadialGradient};
use pangocairo::functions::show_layout;
use sensor_panel_core::DecodedImage;
use sensor_panel_types::{Color, ColorStop, FontSpec, Path, PathEl, Point, Rect};

use crate::gradient::{build_shader, Shader};
use crate::pango_text::{aligns_internally, clear_pango_caches, layout_size, text_layout, LayoutOptions};
use crate::render_cache::clear_render_caches;
use crate::surface::{Donut, ImageDraw, LineCap, Paint, Rotation, Stroke, Surface, TextLayout, TextSize};
use crate::text_layout::{align_x, align_y};

const MESH_CORNERS: [MeshCorner; 4] = [
    MeshCorner::MeshCorner0,
    MeshCorner::MeshCorner1,
    MeshCorner::MeshCorner2,
    MeshCorner::MeshCorner3,
];

/// Offscreen layer that drawing is redirected into
struct Layer {
    cr: Context,
    surface: ImageSurface,
    width: u32,
    height: u32,
}

/// Native surface built from one frame of a decoded image.
///
/// Lives only as long as the decoded image does; `end_frame` drops entries
/// whose image has been evicted from the asset cache.
struct NativeImage {
    owner: Weak<DecodedImage>,
    surface: ImageSurface,
}

pub struct CairoSurface {
    target: ImageSurface,
    base: Context,
    layers: Vec<Layer>,
    images: HashMap<(u64, usize), NativeImage>,
}

impl CairoSurface {
    /// Transparent ARGB32 surface of the given size
    pub fn new(width: u32, height: u32) -> Result<Self> {
        let target = ImageSurface::create(Format::ARgb32, width.max(1) as i32, height.max(1) as i32)
            .context("Failed to create image surface")?;
        let base = Context::new(&target)?;
        Ok(Self {
            target,
            base,
            layers: Vec::new(),
            images: HashMap::new(),
        })
    }

    fn cr(&self) -> &Context {
        self.layers.last().map(|l| &l.cr).unwrap_or(&self.base)
    }

    /// Write the composited frame as PNG
    pub fn write_png(&self, path: &FsPath) -> Result<()> {
        self.target.flush();
        let mut file = File::create(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        self.target
            .write_to_png(&mut file)
            .map_err(|e| anyhow!("Failed to write PNG {}: {}", path.display(), e))?;
        log::info!("Wrote frame to {}", path.display());
        Ok(())
    }

    /// Copy of the frame as premultiplied native-endian ARGB words, row-major
    pub fn pixels(&self) -> Result<Vec<u32>> {
        self.target.flush();
        let (width, height) = (self.target.width(), self.target.height());
        // The base context holds a reference, so read through an exclusive copy
        let mut copy = ImageSurface::create(Format::ARgb32, width, height)?;
        {
            let cr = Context::new(&copy)?;
            cr.set_source_surface(&self.target, 0.0, 0.0)?;
            cr.set_operator(cairo::Operator::Source);
            cr.paint()?;
        }
        copy.flush();
        let stride = copy.stride() as usize;
        let data = copy
            .data()
            .map_err(|e| anyhow!("Surface data unavailable: {}", e))?;
        let mut out = Vec::with_capacity((width * height) as usize);
        for row in 0..height as usize {
            for col in 0..width as usize {
                let at = row * stride + col * 4;
                out.push(u32::from_ne_bytes([data[at], data[at + 1], data[at + 2], data[at + 3]]));
            }
        }
        Ok(out)
    }

    /// Number of native image surfaces currently held
    pub fn cached_images(&self) -> usize {
        self.images.len()
    }

    fn native_image(&mut self, image: &Arc<DecodedImage>, index: usize) -> Result<ImageSurface> {
        let key = (image.id(), index);
        if let Some(native) = self.images.get(&key) {
            return Ok(native.surface.clone());
        }

        let frame = image
            .frame(index)
            .ok_or_else(|| anyhow!("Image {} has no frame {}", image.id(), index))?;
        let (width, height) = (image.width() as usize, image.height() as usize);
        let mut surface = ImageSurface::create(Format::ARgb32, width as i32, height as i32)?;
        let stride = surface.stride() as usize;
        {
            let mut data = surface
                .data()
                .map_err(|e| anyhow!("Image surface data unavailable: {}", e))?;
            for (row, pixels) in frame.pixels.chunks(width).take(height).enumerate() {
                let line = &mut data[row * stride..row * stride + width * 4];
                for (dst, px) in line.chunks_exact_mut(4).zip(pixels) {
                    dst.copy_from_slice(&px.to_ne_bytes());
                }
            }
        }
        surface.mark_dirty();

        self.images.insert(
            key,
            NativeImage {
                owner: Arc::downgrade(image),
                surface: surface.clone(),
            },
        );
        Ok(surface)
    }
}

fn set_color(cr: &Context, color: Color) {
    cr.set_source_rgba(color.r, color.g, color.b, color.a);
}

fn add_stops(gradient: &cairo::Gradient, stops: &[ColorStop]) {
    for stop in stops {
        let c = stop.color;
        gradient.add_color_stop_rgba(stop.position, c.r, c.g, c.b, c.a);
    }
}

fn set_paint(cr: &Context, paint: &Paint) -> Result<()> {
    match paint {
        Paint::Solid(color) => set_color(cr, *color),
        Paint::Gradient { spec, bounds, phase } => match build_shader(spec, *bounds, *phase) {
            Shader::Linear { from, to, stops } => {
                let gradient = LinearGradient::new(from.x, from.y, to.x, to.y);
                add_stops(&gradient, &stops);
                cr.set_source(&gradient)?;
            }
            Shader::Radial {
                center,
                radius,
                stops,
                repeat,
            } => {
                let gradient = RadialGradient::new(center.x, center.y, 0.0, center.x, center.y, radius);
                add_stops(&gradient, &stops);
                if repeat {
                    gradient.set_extend(Extend::Repeat);
                }
                cr.set_source(&gradient)?;
            }
            Shader::Mesh(patches) => {
                let mesh = Mesh::new();
                for patch in &patches {
                    mesh.begin_patch();
                    let [p0, p1, p2, p3] = patch.points;
                    mesh.move_to(p0.x, p0.y);
                    mesh.line_to(p1.x, p1.y);
                    mesh.line_to(p2.x, p2.y);
                    mesh.line_to(p3.x, p3.y);
                    for (corner, c) in MESH_CORNERS.iter().zip(patch.colors) {
                        mesh.set_corner_color_rgba(*corner, c.r, c.g, c.b, c.a);
                    }
                    mesh.end_patch();
                }
                cr.set_source(&mesh)?;
            }
        },
    }
    Ok(())
}

fn apply_stroke(cr: &Context, stroke: &Stroke) -> Result<()> {
    set_paint(cr, &stroke.paint)?;
    cr.set_line_width(stroke.width);
    cr.set_line_cap(match stroke.cap {
        LineCap::Butt => cairo::LineCap::Butt,
        LineCap::Round => cairo::LineCap::Round,
        LineCap::Square => cairo::LineCap::Square,
    });
    cr.set_dash(&stroke.dash, 0.0);
    Ok(())
}

fn append_path(cr: &Context, path: &Path) {
    cr.new_path();
    for el in path.elements() {
        match *el {
            PathEl::MoveTo(p) => cr.move_to(p.x, p.y),
            PathEl::LineTo(p) => cr.line_to(p.x, p.y),
            PathEl::CubicTo(c1, c2, end) => cr.curve_to(c1.x, c1.y, c2.x, c2.y, end.x, end.y),
            PathEl::Close => cr.close_path(),
        }
    }
}

fn rotate(cr: &Context, rotation: Option<Rotation>) {
    if let Some(r) = rotation {
        cr.translate(r.center.x, r.center.y);
        cr.rotate(r.degrees.to_radians());
        cr.translate(-r.center.x, -r.center.y);
    }
}

/// Run `draw` between `save` and `restore`. The state is restored even
/// when `draw` fails part way.
fn with_saved<T>(cr: &Context, draw: impl FnOnce(&Context) -> Result<T>) -> Result<T> {
    cr.save()?;
    let result = draw(cr);
    let restored = cr.restore();
    let value = result?;
    restored?;
    Ok(value)
}

/// Font and gradient caches are per thread; drop them with the surface
/// that owns the thread's drawing.
impl Drop for CairoSurface {
    fn drop(&mut self) {
        clear_pango_caches();
        clear_render_caches();
    }
}

impl Surface for CairoSurface {
    fn size(&self) -> (f64, f64) {
        match self.layers.last() {
            Some(layer) => (layer.width as f64, layer.height as f64),
            None => (self.target.width() as f64, self.target.height() as f64),
        }
    }

    fn clear(&mut self, color: Color) -> Result<()> {
        with_saved(self.cr(), |cr| {
            cr.set_operator(cairo::Operator::Source);
            set_color(cr, color);
            cr.paint()?;
            Ok(())
        })
    }

    fn save(&mut self) -> Result<()> {
        self.cr().save()?;
        Ok(())
    }

    fn restore(&mut self) -> Result<()> {
        self.cr().restore()?;
        Ok(())
    }

    fn translate(&mut self, dx: f64, dy: f64) {
        self.cr().translate(dx, dy);
    }

    fn scale(&mut self, sx: f64, sy: f64) {
        self.cr().scale(sx, sy);
    }

    fn rotate_about(&mut self, center: Point, degrees: f64) {
        rotate(self.cr(), Rotation::about(center, degrees));
    }

    fn clip_rect(&mut self, rect: Rect) {
        let cr = self.cr();
        cr.rectangle(rect.x, rect.y, rect.width, rect.height);
        cr.clip();
    }

    fn draw_line(&mut self, from: Point, to: Point, stroke: &Stroke) -> Result<()> {
        with_saved(self.cr(), |cr| {
            cr.new_path();
            cr.move_to(from.x, from.y);
            cr.line_to(to.x, to.y);
            apply_stroke(cr, stroke)?;
            cr.stroke()?;
            Ok(())
        })
    }

    fn draw_rect(&mut self, rect: Rect, stroke: &Stroke, rotation: Option<Rotation>) -> Result<()> {
        if rect.is_empty() {
            return Ok(());
        }
        with_saved(self.cr(), |cr| {
            rotate(cr, rotation);
            cr.new_path();
            cr.rectangle(rect.x, rect.y, rect.width, rect.height);
            apply_stroke(cr, stroke)?;
            cr.stroke()?;
            Ok(())
        })
    }

    fn fill_rect(&mut self, rect: Rect, paint: &Paint, rotation: Option<Rotation>) -> Result<()> {
        if rect.is_empty() {
            return Ok(());
        }
        with_saved(self.cr(), |cr| {
            rotate(cr, rotation);
            cr.new_path();
            cr.rectangle(rect.x, rect.y, rect.width, rect.height);
            set_paint(cr, paint)?;
            cr.fill()?;
            Ok(())
        })
    }

    fn draw_path(&mut self, path: &Path, stroke: &Stroke) -> Result<()> {
        if path.is_empty() {
            return Ok(());
        }
        with_saved(self.cr(), |cr| {
            append_path(cr, path);
            apply_stroke(cr, stroke)?;
            cr.set_line_join(cairo::LineJoin::Round);
            cr.stroke()?;
            Ok(())
        })
    }

    fn fill_path(&mut self, path: &Path, paint: &Paint) -> Result<()> {
        if path.is_empty() {
            return Ok(());
        }
        with_saved(self.cr(), |cr| {
            append_path(cr, path);
            set_paint(cr, paint)?;
            cr.fill()?;
            Ok(())
        })
    }

    fn measure_string(&mut self, text: &str, font: &FontSpec, wrap_width: Option<f64>) -> TextSize {
        if text.is_empty() {
            return TextSize::default();
        }
        let options = LayoutOptions {
            width: wrap_width,
            wrap: wrap_width.is_some(),
            ..Default::default()
        };
        let (width, height) = layout_size(&text_layout(self.cr(), text, font, options));
        TextSize { width, height }
    }

    fn draw_string(&mut self, text: &str, layout: &TextLayout) -> Result<()> {
        if text.is_empty() {
            return Ok(());
        }
        let cr = self.cr();
        let options = LayoutOptions {
            width: Some(layout.rect.width),
            wrap: layout.wrap,
            ellipsis: layout.ellipsis,
            align: layout.align,
        };
        let pango_layout = text_layout(cr, text, &layout.font, options);
        let (width, height) = layout_size(&pango_layout);
        let x = if aligns_internally(&options) {
            layout.rect.x
        } else {
            align_x(layout.rect, width, layout.align)
        };
        let y = align_y(layout.rect, height, layout.vertical_align);

        with_saved(cr, |cr| {
            set_color(cr, layout.color);
            cr.move_to(x, y);
            show_layout(cr, &pango_layout);
            Ok(())
        })
    }

    fn draw_image(
        &mut self,
        image: &Arc<DecodedImage>,
        frame: usize,
        dest: Rect,
        options: &ImageDraw,
    ) -> Result<()> {
        if dest.is_empty() || image.width() == 0 || image.height() == 0 {
            return Ok(());
        }
        let native = self.native_image(image, frame)?;
        let (w, h) = (image.width() as f64, image.height() as f64);
        let center = dest.center();
        let sx = dest.width / w * if options.flip_horizontal { -1.0 } else { 1.0 };
        let sy = dest.height / h * if options.flip_vertical { -1.0 } else { 1.0 };

        with_saved(self.cr(), |cr| {
            cr.translate(center.x, center.y);
            if options.rotation != 0.0 {
                cr.rotate(options.rotation.to_radians());
            }
            cr.scale(sx, sy);
            cr.translate(-w / 2.0, -h / 2.0);
            cr.set_source_surface(&native, 0.0, 0.0)?;
            cr.rectangle(0.0, 0.0, w, h);
            cr.clip();
            cr.paint_with_alpha(options.opacity.clamp(0.0, 1.0))?;
            Ok(())
        })
    }

    fn fill_donut(&mut self, donut: &Donut) -> Result<()> {
        if donut.radius <= 0.0 || donut.thickness <= 0.0 {
            return Ok(());
        }
        let (cx, cy) = (donut.center.x, donut.center.y);
        let start = donut.start_angle.to_radians();
        let end = start + donut.span.to_radians();
        let mid = donut.mid_radius();
        let cap = if donut.round_caps {
            cairo::LineCap::Round
        } else {
            cairo::LineCap::Butt
        };

        with_saved(self.cr(), |cr| {
            cr.set_line_width(donut.thickness);
            cr.set_line_cap(cap);

            if let Some(background) = donut.background {
                cr.new_path();
                cr.arc(cx, cy, mid, start, end);
                set_color(cr, background);
                cr.stroke()?;
            }

            let sweep = donut.filled_sweep();
            if sweep > 0.0 {
                cr.new_path();
                cr.arc(cx, cy, mid, start, start + sweep.to_radians());
                set_paint(cr, &donut.foreground)?;
                cr.set_line_width(donut.thickness);
                cr.stroke()?;
            }

            if let Some((color, width)) = donut.outline {
                let inner = (donut.radius - donut.thickness).max(0.0);
                cr.new_path();
                if donut.span >= 360.0 {
                    cr.arc(cx, cy, donut.radius, 0.0, 2.0 * PI);
                    cr.new_sub_path();
                    cr.arc(cx, cy, inner, 0.0, 2.0 * PI);
                } else {
                    cr.arc(cx, cy, donut.radius, start, end);
                    cr.arc_negative(cx, cy, inner, end, start);
                    cr.close_path();
                }
                set_color(cr, color);
                cr.set_line_width(width);
                cr.set_line_cap(cairo::LineCap::Butt);
                cr.stroke()?;
            }
            Ok(())
        })
    }

    fn begin_layer(&mut self, width: u32, height: u32) -> Result<()> {
        let surface = ImageSurface::create(Format::ARgb32, width.max(1) as i32, height.max(1) as i32)
            .context("Failed to create layer surface")?;
        let cr = Context::new(&surface)?;
        self.layers.push(Layer {
            cr,
            surface,
            width,
            height,
        });
        Ok(())
    }

    fn end_layer(&mut self, dest: Rect, flip_horizontal: bool) -> Result<()> {
        let Some(layer) = self.layers.pop() else {
            bail!("end_layer without matching begin_layer");
        };
        let Layer {
            cr: layer_cr,
            surface,
            width,
            height,
        } = layer;
        drop(layer_cr);
        surface.flush();
        if dest.is_empty() || width == 0 || height == 0 {
            return Ok(());
        }

        with_saved(self.cr(), |cr| {
            cr.translate(dest.x, dest.y);
            if flip_horizontal {
                cr.translate(dest.width, 0.0);
                cr.scale(-1.0, 1.0);
            }
            cr.scale(dest.width / width as f64, dest.height / height as f64);
            cr.set_source_surface(&surface, 0.0, 0.0)?;
            cr.paint()?;
            Ok(())
        })
    }

    fn end_frame(&mut self) {
        let before = self.images.len();
        self.images.retain(|_, native| native.owner.strong_count() > 0);
        let dropped = before - self.images.len();
        if dropped > 0 {
            log::debug!("Released {} native image surface(s)", dropped);
        }
        if !self.layers.is_empty() {
            log::warn!("{} layer(s) left open at end of frame", self.layers.len());
            self.layers.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argb(px: u32) -> (u8, u8, u8, u8) {
        ((px >> 24) as u8, (px >> 16) as u8, (px >> 8) as u8, px as u8)
    }

    #[test]
    fn test_fill_rect_writes_pixels() {
        let mut surface = CairoSurface::new(4, 4).unwrap();
        surface.clear(Color::BLACK).unwrap();
        surface
            .fill_rect(Rect::new(0.0, 0.0, 2.0, 4.0), &Paint::Solid(Color::new(1.0, 0.0, 0.0, 1.0)), None)
            .unwrap();
        let pixels = surface.pixels().unwrap();
        assert_eq!(argb(pixels[0]), (255, 255, 0, 0));
        assert_eq!(argb(pixels[3]), (255, 0, 0, 0));
    }

    #[test]
    fn test_layer_flip_mirrors_content() {
        let mut surface = CairoSurface::new(4, 1).unwrap();
        surface.begin_layer(4, 1).unwrap();
        assert_eq!(surface.size(), (4.0, 1.0));
        surface
            .fill_rect(Rect::new(0.0, 0.0, 1.0, 1.0), &Paint::Solid(Color::WHITE), None)
            .unwrap();
        surface.end_layer(Rect::new(0.0, 0.0, 4.0, 1.0), true).unwrap();
        let pixels = surface.pixels().unwrap();
        assert_eq!(argb(pixels[0]).0, 0);
        assert_eq!(argb(pixels[3]).0, 255);
    }

    #[test]
    fn test_native_images_follow_decoded_lifetime() {
        let mut surface = CairoSurface::new(8, 8).unwrap();
        let image = Arc::new(DecodedImage::from_rgba(2, 2, &[255u8; 16]));
        surface
            .draw_image(&image, 0, Rect::new(0.0, 0.0, 8.0, 8.0), &ImageDraw::default())
            .unwrap();
        assert_eq!(surface.cached_images(), 1);
        surface.end_frame();
        assert_eq!(surface.cached_images(), 1);

        drop(image);
        surface.end_frame();
        assert_eq!(surface.cached_images(), 0);
        let px = surface.pixels().unwrap()[3 * 8 + 3];
        assert_eq!(argb(px), (255, 255, 255, 255));
    }

    #[test]
    fn test_failed_draw_still_restores_state() {
        let surface = CairoSurface::new(4, 4).unwrap();
        let cr = surface.cr();
        let failed: Result<()> = with_saved(cr, |cr| {
            cr.translate(2.0, 2.0);
            cr.set_line_width(7.0);
            bail!("gradient unavailable")
        });
        assert!(failed.is_err());
        assert_eq!(cr.line_width(), 2.0);
        let (x, y) = cr.user_to_device(0.0, 0.0);
        assert_eq!((x, y), (0.0, 0.0));

        // The stack is balanced, so the base level cannot be popped again
        assert!(cr.restore().is_err());
    }

    #[test]
    fn test_unbalanced_layer_is_error() {
        let mut surface = CairoSurface::new(2, 2).unwrap();
        assert!(surface.end_layer(Rect::new(0.0, 0.0, 2.0, 2.0), false).is_err());
    }
}
