//! Per-frame compositing pass
//!
//! Walks a profile's item tree once per frame and issues draw calls on a
//! `Surface`. Each item is drawn in isolation: a failure is logged and the
//! rest of the frame still renders.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use chrono::{DateTime, Local};
use uuid::Uuid;

use sensor_panel_core::{AssetCache, DecodedImage, SensorValueCache, DEFAULT_GRAPH_UPDATE_INTERVAL};
use sensor_panel_render::graph::{gauge_fraction, render_bar, render_donut, render_graph};
use sensor_panel_render::shapes::shape_path;
use sensor_panel_render::text_layout::{marquee_copies, marquee_offset, needs_marquee};
use sensor_panel_render::{Donut, ImageDraw, LineCap, Paint, Rotation, Stroke, Surface, TextLayout};
use sensor_panel_types::{
    ArcItem, Color, DisplayItem, Ellipsis, GradientSpec, ImageItem, Path, Point, Profile, Rect,
    SensorId, SensorSource, ShapeItem, TableText, TextAlign, TextContent, TextItem, VerticalAlign,
};

use crate::settings::RendererSettings;

/// Selection outline is visible for this part of every second
const SELECTION_BLINK_ON_MS: i64 = 600;
const HUD_HEIGHT: f64 = 22.0;
const TABLE_CELL_PADDING: f64 = 8.0;
/// Gradient animations complete one cycle in this many seconds
const GRADIENT_CYCLE_SECS: f64 = 2.0;

/// Timing and mode for one frame
#[derive(Debug, Clone, Copy)]
pub struct FrameContext {
    /// Monotonic time of this frame
    pub now: Instant,
    /// Time since the renderer started; drives marquees and animations
    pub elapsed: Duration,
    /// Wall clock for clocks, text macros and the selection blink
    pub wall: DateTime<Local>,
    /// Draw grid and selection outlines
    pub edit_mode: bool,
    /// Suppress media overlays
    pub preview: bool,
    /// Profile-to-surface scale factor
    pub scale: f64,
}

impl FrameContext {
    pub fn new(now: Instant, elapsed: Duration, wall: DateTime<Local>) -> Self {
        Self {
            now,
            elapsed,
            wall,
            edit_mode: false,
            preview: false,
            scale: 1.0,
        }
    }

    pub fn editing(mut self, edit_mode: bool) -> Self {
        self.edit_mode = edit_mode;
        self
    }

    pub fn previewing(mut self, preview: bool) -> Self {
        self.preview = preview;
        self
    }

    pub fn scaled(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    fn blink_on(&self) -> bool {
        self.wall.timestamp_millis().rem_euclid(1000) < SELECTION_BLINK_ON_MS
    }

    fn gradient_phase(&self) -> f64 {
        (self.elapsed.as_secs_f64() / GRADIENT_CYCLE_SECS).fract()
    }
}

/// What happened during one frame
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameStats {
    pub drawn: usize,
    pub failed: usize,
    pub selected: usize,
    pub fps: f64,
}

/// Rolling frames-per-second over the last second
#[derive(Debug, Default)]
struct FpsCounter {
    frames: VecDeque<Instant>,
    last_frame_time: Duration,
}

impl FpsCounter {
    fn tick(&mut self, now: Instant, frame_time: Duration) -> f64 {
        self.frames.push_back(now);
        while let Some(first) = self.frames.front() {
            if now.saturating_duration_since(*first) > Duration::from_secs(1) {
                self.frames.pop_front();
            } else {
                break;
            }
        }
        self.last_frame_time = frame_time;
        self.frames.len() as f64
    }
}

/// State shared by every item draw within one frame
struct Pass<'a> {
    profile: &'a Profile,
    source: &'a dyn SensorSource,
    ctx: &'a FrameContext,
    cycles: u32,
    selection: Vec<Rect>,
    stats: FrameStats,
}

pub struct Compositor {
    sensors: Arc<SensorValueCache>,
    assets: AssetCache,
    settings: RendererSettings,
    fps: FpsCounter,
    /// Last asset key shown by items that opted out of caching
    uncached_keys: HashMap<Uuid, String>,
}

impl Compositor {
    pub fn new(sensors: Arc<SensorValueCache>, assets: AssetCache, settings: RendererSettings) -> Self {
        Self {
            sensors,
            assets,
            settings,
            fps: FpsCounter::default(),
            uncached_keys: HashMap::new(),
        }
    }

    pub fn sensors(&self) -> &Arc<SensorValueCache> {
        &self.sensors
    }

    pub fn assets(&self) -> &AssetCache {
        &self.assets
    }

    pub fn settings(&self) -> &RendererSettings {
        &self.settings
    }

    /// Render one frame of `profile` onto `surface`
    pub fn run(
        &mut self,
        profile: &Profile,
        surface: &mut dyn Surface,
        source: &dyn SensorSource,
        ctx: &FrameContext,
    ) -> Result<FrameStats> {
        let started = Instant::now();
        self.sample_charts(profile, source, ctx.now);

        let mut pass = Pass {
            profile,
            source,
            ctx,
            cycles: self.settings.smoothing_cycles(profile.frame_rate()),
            selection: Vec::new(),
            stats: FrameStats::default(),
        };

        surface.clear(profile.background_color)?;
        surface.save()?;
        if ctx.scale != 1.0 && ctx.scale > 0.0 {
            surface.scale(ctx.scale, ctx.scale);
        }

        if let Err(e) = self.draw_backdrop(surface, &pass) {
            log::warn!("Failed to draw background image: {:#}", e);
        }

        for item in &profile.items {
            self.draw_isolated(surface, item, &mut pass);
        }

        if ctx.edit_mode {
            if let Err(e) = draw_edit_overlay(surface, profile, ctx, &pass.selection) {
                log::warn!("Failed to draw editor overlay: {:#}", e);
            }
        }
        surface.restore()?;
        self.prune_uncached(profile);

        pass.stats.selected = pass.selection.len();
        pass.stats.fps = self.fps.tick(ctx.now, started.elapsed());
        if profile.show_fps || self.settings.show_fps {
            self.draw_fps_overlay(surface, profile, pass.stats.fps)?;
        }

        self.assets.sweep(ctx.now);
        self.sensors.smoothing().sweep(ctx.now);
        surface.end_frame();
        Ok(pass.stats)
    }

    /// Forget uncached items that left the profile and release what they showed
    fn prune_uncached(&mut self, profile: &Profile) {
        if self.uncached_keys.is_empty() {
            return;
        }
        let mut present = HashSet::new();
        for item in &profile.items {
            item.walk(&mut |node| {
                if let DisplayItem::Image(image) = node {
                    if !image.cache {
                        present.insert(image.base.id);
                    }
                }
            });
        }
        let assets = &self.assets;
        self.uncached_keys.retain(|id, key| {
            let keep = present.contains(id);
            if !keep {
                assets.invalidate(key);
            }
            keep
        });
    }

    /// Feed the rolling queues of every graph-bound sensor, gated by the
    /// profile's graph update rate
    fn sample_charts(&self, profile: &Profile, source: &dyn SensorSource, now: Instant) {
        let mut ids: Vec<&SensorId> = Vec::new();
        for item in &profile.items {
            item.walk(&mut |node| match node {
                DisplayItem::Graph(g) => ids.push(&g.chart.sensor),
                DisplayItem::Bar(b) => ids.push(&b.chart.sensor),
                DisplayItem::Donut(d) => ids.push(&d.chart.sensor),
                _ => {}
            });
        }
        if ids.is_empty() {
            return;
        }
        let interval = match profile.target_graph_update_rate_ms {
            0 => DEFAULT_GRAPH_UPDATE_INTERVAL,
            ms => Duration::from_millis(ms),
        };
        if self.sensors.sample(ids, source, interval, now) {
            log::trace!("Sampled chart sensors");
        }
    }

    fn draw_backdrop(&self, surface: &mut dyn Surface, pass: &Pass) -> Result<()> {
        let Some(path) = pass.profile.background_image.as_deref().filter(|p| !p.is_empty()) else {
            return Ok(());
        };
        let key = pass.profile.resolve_path(path);
        let Some(image) = self.assets.get(&key, true) else {
            return Ok(());
        };
        let rect = Rect::new(0.0, 0.0, pass.profile.width as f64, pass.profile.height as f64);
        let frame = image.frame_index_at(pass.ctx.elapsed);
        surface.draw_image(&image, frame, rect, &ImageDraw::default())
    }

    /// Draw one item, containing any failure to that item
    fn draw_isolated(&mut self, surface: &mut dyn Surface, item: &DisplayItem, pass: &mut Pass) {
        if !item.is_visible(pass.source) {
            return;
        }
        if let DisplayItem::Group(group) = item {
            for child in &group.items {
                self.draw_isolated(surface, child, pass);
            }
            return;
        }

        if item.base().selected {
            pass.selection.push(item.evaluate_bounds());
        }

        let result = surface
            .save()
            .and_then(|_| self.draw_item(surface, item, pass))
            .and_then(|_| surface.restore());
        match result {
            Ok(()) => pass.stats.drawn += 1,
            Err(e) => {
                pass.stats.failed += 1;
                log::warn!(
                    "Failed to draw {} '{}' ({}): {:#}",
                    item.kind(),
                    item.name(),
                    item.id(),
                    e
                );
                // Unwind the save taken above so later items start clean
                if let Err(e) = surface.restore() {
                    log::debug!("Restore after failed draw: {}", e);
                }
            }
        }
    }

    fn draw_item(&mut self, surface: &mut dyn Surface, item: &DisplayItem, pass: &Pass) -> Result<()> {
        match item {
            DisplayItem::Text(text) => draw_text(surface, text, pass),
            DisplayItem::Image(image) => self.draw_image(surface, image, pass),
            DisplayItem::Graph(_) | DisplayItem::Bar(_) | DisplayItem::Donut(_) => {
                self.draw_chart(surface, item, pass)
            }
            DisplayItem::Shape(shape) => draw_shape(surface, shape, pass.ctx),
            DisplayItem::Arc(arc) => draw_arc(surface, arc, pass.source),
            // Groups are expanded by draw_isolated
            DisplayItem::Group(_) => Ok(()),
        }
    }

    fn draw_image(&mut self, surface: &mut dyn Surface, item: &ImageItem, pass: &Pass) -> Result<()> {
        let Some(key) = item.asset_key(pass.source, |p| pass.profile.resolve_path(p)) else {
            return Ok(());
        };
        if !item.cache {
            if let Some(previous) = self.uncached_keys.insert(item.base.id, key.clone()) {
                if previous != key {
                    self.assets.invalidate(&previous);
                }
            }
        }
        let Some(image) = self.assets.get(&key, item.persistent) else {
            log::trace!("Image {} not ready for '{}'", key, item.base.name);
            return Ok(());
        };

        let rect = item.base.rect();
        let rotation = item.base.rotation as f64;
        let options = ImageDraw {
            rotation,
            flip_horizontal: item.flip_horizontal,
            flip_vertical: item.flip_vertical,
            opacity: item.opacity,
        };
        let frame = image.frame_index_at(pass.ctx.elapsed);
        surface.draw_image(&image, frame, rect, &options)?;

        if let Some(tint) = item.tint {
            surface.fill_rect(rect, &Paint::Solid(tint), Rotation::about(rect.center(), rotation))?;
        }

        if image.is_animated() && item.show_hud && !pass.ctx.preview {
            draw_media_hud(surface, rect, rotation, &image, pass)?;
        }
        Ok(())
    }

    /// Charts render into a layer of their declared size, then blit into place
    fn draw_chart(&mut self, surface: &mut dyn Surface, item: &DisplayItem, pass: &Pass) -> Result<()> {
        let base = item.base();
        if base.width <= 0 || base.height <= 0 {
            return Ok(());
        }
        let rect = base.rect();
        surface.rotate_about(rect.center(), base.rotation as f64);
        surface.begin_layer(base.width as u32, base.height as u32)?;

        let now = pass.ctx.now;
        let smoothing = self.sensors.smoothing();
        let (result, flip) = match item {
            DisplayItem::Graph(graph) => {
                let samples = self.sensors.snapshot(&graph.chart.sensor);
                (render_graph(surface, graph, &samples), graph.chart.flip_x)
            }
            DisplayItem::Bar(bar) => {
                let samples = self.sensors.snapshot(&bar.chart.sensor);
                let live = pass.source.read(&bar.chart.sensor).map(|r| r.value_now);
                let fraction =
                    gauge_fraction(&bar.chart, base.id, live, &samples, smoothing, pass.cycles, now);
                (render_bar(surface, bar, fraction), bar.chart.flip_x)
            }
            DisplayItem::Donut(donut) => {
                let samples = self.sensors.snapshot(&donut.chart.sensor);
                let live = pass.source.read(&donut.chart.sensor).map(|r| r.value_now);
                let fraction =
                    gauge_fraction(&donut.chart, base.id, live, &samples, smoothing, pass.cycles, now);
                (render_donut(surface, donut, fraction), donut.chart.flip_x)
            }
            _ => (Ok(()), false),
        };

        // Close the layer even when the chart failed so the stack stays balanced
        surface.end_layer(rect, flip)?;
        result
    }

    fn draw_fps_overlay(&self, surface: &mut dyn Surface, profile: &Profile, fps: f64) -> Result<()> {
        let assets = self.assets.stats();
        let text = format!(
            "{:.0} FPS  {:.1} ms  {} items  img {}/{}",
            fps,
            self.fps.last_frame_time.as_secs_f64() * 1000.0,
            profile.item_count(),
            assets.entries,
            assets.in_flight,
        );
        let font = profile.font.with_size(11.0);
        let size = surface.measure_string(&text, &font, None);
        let rect = Rect::new(4.0, 4.0, size.width + 8.0, size.height + 4.0);
        surface.fill_rect(rect, &Paint::Solid(Color::new(0.0, 0.0, 0.0, 0.6)), None)?;
        surface.draw_string(
            &text,
            &TextLayout::new(rect.inset(2.0), font, Color::new(0.4, 1.0, 0.4, 1.0))
                .aligned(TextAlign::Left, VerticalAlign::Middle),
        )
    }
}

fn text_layout(rect: Rect, item: &TextItem, color: Color) -> TextLayout {
    TextLayout {
        rect,
        font: item.style.font.clone(),
        color,
        align: item.style.align,
        vertical_align: item.style.vertical_align,
        wrap: item.style.wrap,
        ellipsis: item.style.ellipsis,
    }
}

fn draw_text(surface: &mut dyn Surface, item: &TextItem, pass: &Pass) -> Result<()> {
    let rect = item.base.rect();
    if rect.is_empty() {
        return Ok(());
    }
    surface.rotate_about(rect.center(), item.base.rotation as f64);

    if let TextContent::Table(table) = &item.content {
        return draw_table(surface, item, table, pass.source);
    }

    let (text, color) = item.evaluate_text_and_color(pass.source, &pass.ctx.wall);
    if text.is_empty() {
        return Ok(());
    }

    if let Some(marquee) = item.style.marquee.filter(|_| !item.style.wrap) {
        let measured = surface.measure_string(&text, &item.style.font, None);
        if needs_marquee(measured.width, rect.width) {
            let offset = marquee_offset(pass.ctx.elapsed.as_secs_f64(), measured.width, &marquee);
            surface.clip_rect(rect);
            for x in marquee_copies(rect, measured.width, &marquee, offset) {
                let copy = Rect::new(x, rect.y, measured.width, rect.height);
                let mut layout = text_layout(copy, item, color);
                layout.align = TextAlign::Left;
                layout.ellipsis = Ellipsis::None;
                surface.draw_string(&text, &layout)?;
            }
            return Ok(());
        }
    }

    surface.draw_string(&text, &text_layout(rect, item, color))
}

/// Tabular sensor text as a grid of cells; fixed-width columns keep their
/// width, auto columns fit their widest cell
fn draw_table(
    surface: &mut dyn Surface,
    item: &TextItem,
    table: &TableText,
    source: &dyn SensorSource,
) -> Result<()> {
    let Some(reading) = source.read(&table.sensor) else {
        log::trace!("No table reading for {}", table.sensor);
        return Ok(());
    };
    let cells = table.cells(&reading);
    if cells.is_empty() {
        return Ok(());
    }
    let font = &item.style.font;
    let columns = cells.iter().map(Vec::len).max().unwrap_or(0);
    let widths: Vec<f64> = (0..columns)
        .map(|col| {
            table.fixed_width(col).unwrap_or_else(|| {
                cells
                    .iter()
                    .filter_map(|row| row.get(col))
                    .map(|cell| surface.measure_string(cell, font, None).width)
                    .fold(0.0, f64::max)
                    + TABLE_CELL_PADDING
            })
        })
        .collect();
    let row_height = surface.measure_string("Ag", font, None).height;

    let rect = item.base.rect();
    surface.clip_rect(rect);
    let mut y = rect.y;
    for row in &cells {
        if y >= rect.bottom() {
            break;
        }
        let mut x = rect.x;
        for (col, cell) in row.iter().enumerate() {
            let cell_rect = Rect::new(x, y, widths[col], row_height);
            let mut layout = text_layout(cell_rect, item, item.style.color);
            layout.wrap = false;
            layout.vertical_align = VerticalAlign::Top;
            surface.draw_string(cell, &layout)?;
            x += widths[col];
        }
        y += row_height;
    }
    Ok(())
}

fn animated(spec: GradientSpec, rotation: f64) -> GradientSpec {
    GradientSpec {
        angle: spec.angle + rotation,
        ..spec
    }
}

fn draw_shape(surface: &mut dyn Surface, item: &ShapeItem, ctx: &FrameContext) -> Result<()> {
    let rect = item.base.rect();
    if rect.is_empty() {
        return Ok(());
    }
    let rotation = item.base.rotation as f64;
    let path = shape_path(item.kind, rect, item.corner_radius).rotated_about(rect.center(), rotation);
    let paint = |solid: Color, gradient: Option<GradientSpec>| match gradient {
        Some(spec) => Paint::Gradient {
            spec: animated(spec, rotation),
            bounds: rect,
            phase: ctx.gradient_phase(),
        },
        None => Paint::Solid(solid),
    };

    if item.show_fill {
        surface.fill_path(&path, &paint(item.fill_color, item.fill_gradient))?;
    }
    if item.show_frame && item.frame_thickness > 0.0 {
        let stroke = Stroke::new(paint(item.frame_color, item.frame_gradient), item.frame_thickness);
        surface.draw_path(&path, &stroke)?;
    }
    Ok(())
}

fn draw_arc(surface: &mut dyn Surface, item: &ArcItem, source: &dyn SensorSource) -> Result<()> {
    let rect = item.base.rect();
    if rect.is_empty() {
        return Ok(());
    }
    let reading = source.read(&item.sensor);
    let value = reading.as_ref().map(|r| r.value_now).unwrap_or(item.min);
    let fraction = item.fraction(value);

    surface.fill_donut(&Donut {
        center: rect.center(),
        radius: rect.width.min(rect.height) / 2.0,
        thickness: item.thickness,
        start_angle: item.start_angle + item.base.rotation as f64,
        span: item.sweep_angle,
        percent: fraction * 100.0,
        background: Some(item.background_color),
        foreground: Paint::Solid(item.foreground_color),
        outline: None,
        round_caps: true,
    })?;

    if item.show_value {
        if let Some(reading) = &reading {
            let mut text = format!("{:.*}", item.decimals as usize, reading.value_now);
            if item.show_unit {
                text.push_str(&reading.unit);
            }
            let layout = TextLayout::new(rect, item.value_font.clone(), item.foreground_color)
                .aligned(TextAlign::Center, VerticalAlign::Middle);
            surface.draw_string(&text, &layout)?;
        }
    }

    if item.base.selected {
        let ring = Path::ellipse(rect.inset(-3.0));
        surface.draw_path(&ring, &Stroke::new(item.highlight_color, 1.5))?;
    }
    Ok(())
}

/// Box the media overlay sits on: the item box with its rotation snapped to
/// the nearest quarter turn, so the overlay runs along the edge that is
/// currently down
fn hud_anchor(rect: Rect, rotation: f64) -> Rect {
    let quarter = ((rotation.rem_euclid(360.0) + 45.0) / 90.0).floor() as i32 % 4;
    let (w, h) = if quarter % 2 == 1 {
        (rect.height, rect.width)
    } else {
        (rect.width, rect.height)
    };
    let c = rect.center();
    let snapped = Rect::new(c.x - w / 2.0, c.y - h / 2.0, w, h);
    Rect::new(snapped.x, snapped.bottom() - HUD_HEIGHT, snapped.width, HUD_HEIGHT)
}

fn format_clock(d: Duration) -> String {
    let secs = d.as_secs();
    format!("{}:{:02}", secs / 60, secs % 60)
}

/// Progress, time, live badge, volume and frame rate for animated images
fn draw_media_hud(
    surface: &mut dyn Surface,
    rect: Rect,
    rotation: f64,
    image: &Arc<DecodedImage>,
    pass: &Pass,
) -> Result<()> {
    let bar = hud_anchor(rect, rotation);
    if bar.width < 40.0 {
        return Ok(());
    }
    surface.fill_rect(bar, &Paint::Solid(Color::new(0.0, 0.0, 0.0, 0.55)), None)?;

    let duration = image.duration();
    // Loops shorter than a second play like a live feed
    let live = duration < Duration::from_secs(1);
    let font = pass.profile.font.with_size(10.0);
    let white = Color::new(1.0, 1.0, 1.0, 0.9);

    if !duration.is_zero() {
        let position = Duration::from_secs_f64(
            pass.ctx.elapsed.as_secs_f64() % duration.as_secs_f64().max(f64::EPSILON),
        );
        let progress = position.as_secs_f64() / duration.as_secs_f64();
        let track = Rect::new(bar.x, bar.y, bar.width, 2.0);
        surface.fill_rect(track, &Paint::Solid(Color::new(1.0, 1.0, 1.0, 0.25)), None)?;
        surface.fill_rect(
            Rect::new(track.x, track.y, track.width * progress, track.height),
            &Paint::Solid(Color::new(1.0, 0.2, 0.2, 0.9)),
            None,
        )?;

        let label = if live {
            "LIVE".to_string()
        } else {
            format!("{} / {}", format_clock(position), format_clock(duration))
        };
        let color = if live { Color::new(1.0, 0.3, 0.3, 1.0) } else { white };
        let text_rect = Rect::new(bar.x + 6.0, bar.y + 2.0, bar.width / 2.0, bar.height - 2.0);
        surface.draw_string(
            &label,
            &TextLayout::new(text_rect, font.clone(), color).aligned(TextAlign::Left, VerticalAlign::Middle),
        )?;
    }

    // Animated images carry no audio track: always muted
    let icon = Rect::new(bar.right() - 18.0, bar.y + 6.0, 10.0, 10.0);
    let speaker = Path::polygon(&[
        Point::new(icon.x, icon.y + 3.0),
        Point::new(icon.x + 3.0, icon.y + 3.0),
        Point::new(icon.x + 6.0, icon.y),
        Point::new(icon.x + 6.0, icon.bottom()),
        Point::new(icon.x + 3.0, icon.y + 7.0),
        Point::new(icon.x, icon.y + 7.0),
    ]);
    surface.fill_path(&speaker, &Paint::Solid(white))?;
    let cross = Stroke::new(white, 1.0).with_cap(LineCap::Round);
    surface.draw_line(Point::new(icon.x + 7.5, icon.y + 3.0), Point::new(icon.right(), icon.y + 7.0), &cross)?;
    surface.draw_line(Point::new(icon.x + 7.5, icon.y + 7.0), Point::new(icon.right(), icon.y + 3.0), &cross)?;

    let fps_rect = Rect::new(bar.x + bar.width / 2.0, bar.y + 2.0, bar.width / 2.0 - 24.0, bar.height - 2.0);
    surface.draw_string(
        &format!("{:.0} fps", image.frame_rate()),
        &TextLayout::new(fps_rect, font, white).aligned(TextAlign::Right, VerticalAlign::Middle),
    )
}

/// Grid and blinking selection outlines, drawn over every item
fn draw_edit_overlay(
    surface: &mut dyn Surface,
    profile: &Profile,
    ctx: &FrameContext,
    selection: &[Rect],
) -> Result<()> {
    if profile.grid.show {
        draw_grid(surface, profile)?;
    }
    if ctx.blink_on() {
        draw_selection(surface, selection)?;
    }
    Ok(())
}

fn draw_grid(surface: &mut dyn Surface, profile: &Profile) -> Result<()> {
    let size = profile.grid.size.max(2) as f64;
    let (width, height) = (profile.width as f64, profile.height as f64);
    let stroke = Stroke::new(profile.grid.color, 1.0);
    let mut x = size;
    while x < width {
        surface.draw_line(Point::new(x, 0.0), Point::new(x, height), &stroke)?;
        x += size;
    }
    let mut y = size;
    while y < height {
        surface.draw_line(Point::new(0.0, y), Point::new(width, y), &stroke)?;
        y += size;
    }
    Ok(())
}

fn draw_selection(surface: &mut dyn Surface, selection: &[Rect]) -> Result<()> {
    let stroke = Stroke::new(Color::WHITE, 1.0).dashed(vec![4.0, 4.0]);
    for rect in selection {
        surface.draw_rect(rect.inset(-1.0), &stroke, None)?;
    }
    Ok(())
}
