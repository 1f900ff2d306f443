//! Graph renderer: turns sample history into chart drawing commands.
//!
//! Charts draw in their own local space, `(0, 0)` to the item's declared
//! size; the compositor redirects them into a layer and blits the result.

use std::time::Instant;

use anyhow::Result;
use sensor_panel_core::SmoothingCache;
use sensor_panel_types::{
    BarItem, ChartStyle, DonutItem, GradientSpec, GradientStyle, GraphItem, GraphMode,
    Path, Point, Rect,
};
use uuid::Uuid;

use crate::surface::{Donut, LineCap, Paint, Stroke, Surface};

/// Trailing samples that fit `width` at `step` pixels per sample.
///
/// `samples` is ordered oldest first; the returned slice keeps that order.
pub fn visible_window(samples: &[f64], width: f64, step: f64) -> &[f64] {
    if step <= 0.0 || width <= 0.0 {
        return &samples[samples.len()..];
    }
    let fit = (width / step).floor() as usize + 1;
    &samples[samples.len().saturating_sub(fit)..]
}

/// Vertical range for a window of samples.
///
/// Auto-scaling uses the window's own extremes, so the scale follows
/// whatever is currently visible.
pub fn scale_range(chart: &ChartStyle, window: &[f64]) -> (f64, f64) {
    if chart.auto_scale && !window.is_empty() {
        let min = window.iter().copied().fold(f64::INFINITY, f64::min);
        let max = window.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        (min, max)
    } else {
        (chart.min, chart.max)
    }
}

/// Map `value` into 0..=1; a zero-width range yields 0
pub fn normalize(value: f64, min: f64, max: f64) -> f64 {
    let range = max - min;
    if range == 0.0 || !range.is_finite() || !value.is_finite() {
        return 0.0;
    }
    ((value - min) / range).clamp(0.0, 1.0)
}

/// Points of the line, newest sample on the right edge.
///
/// The returned points run right to left: index 0 is the newest sample.
pub fn line_points(window: &[f64], range: (f64, f64), width: f64, height: f64, step: f64) -> Vec<Point> {
    window
        .iter()
        .rev()
        .enumerate()
        .map(|(i, &value)| {
            let norm = normalize(value, range.0, range.1);
            Point::new(width - i as f64 * step, height - norm * height)
        })
        .collect()
}

/// Bars for histogram mode, newest on the right, one per visible sample
pub fn histogram_bars(
    samples: &[f64],
    range: (f64, f64),
    width: f64,
    height: f64,
    thickness: f64,
    spacing: f64,
) -> Vec<Rect> {
    let thickness = thickness.max(1.0);
    let pitch = thickness + spacing.max(0.0);
    let window = visible_window(samples, width - thickness, pitch);
    window
        .iter()
        .rev()
        .enumerate()
        .map(|(i, &value)| {
            let bar_height = normalize(value, range.0, range.1) * height;
            Rect::new(
                width - thickness - i as f64 * pitch,
                height - bar_height,
                thickness,
                bar_height,
            )
        })
        .collect()
}

fn foreground(chart: &ChartStyle, bounds: Rect, angle: f64) -> Paint {
    match chart.gradient_color {
        Some(end) => {
            let mut spec = GradientSpec::new(GradientStyle::Linear, chart.color, end);
            spec.angle = angle;
            Paint::gradient(spec, bounds)
        }
        None => Paint::Solid(chart.color),
    }
}

fn draw_frame(surface: &mut dyn Surface, chart: &ChartStyle, bounds: Rect) -> Result<()> {
    if let Some(color) = chart.frame {
        surface.draw_rect(bounds.inset(0.5), &Stroke::new(color, 1.0), None)?;
    }
    Ok(())
}

/// Draw a line or histogram chart of `samples` (oldest first).
///
/// An empty sample list draws nothing at all, not even the background.
pub fn render_graph(surface: &mut dyn Surface, item: &GraphItem, samples: &[f64]) -> Result<()> {
    if samples.is_empty() {
        return Ok(());
    }
    let width = item.base.width as f64;
    let height = item.base.height as f64;
    let bounds = Rect::new(0.0, 0.0, width, height);
    if bounds.is_empty() {
        return Ok(());
    }

    if let Some(background) = item.chart.background {
        surface.fill_rect(bounds, &Paint::Solid(background), None)?;
    }

    match item.mode {
        GraphMode::Line => {
            let window = visible_window(samples, width, item.step);
            let range = scale_range(&item.chart, window);
            let points = line_points(window, range, width, height, item.step);

            if let (Some(fill), Some(first), Some(last)) = (item.fill, points.first(), points.last()) {
                let mut area = Path::new();
                area.move_to(first.x, height);
                for p in &points {
                    area.line_to(p.x, p.y);
                }
                area.line_to(last.x, height).close();
                surface.fill_path(&area, &Paint::Solid(fill))?;
            }

            if points.len() > 1 {
                let mut line = Path::new();
                for (i, p) in points.iter().enumerate() {
                    if i == 0 {
                        line.move_to(p.x, p.y);
                    } else {
                        line.line_to(p.x, p.y);
                    }
                }
                let stroke = Stroke::new(foreground(&item.chart, bounds, 90.0), item.thickness)
                    .with_cap(LineCap::Round);
                surface.draw_path(&line, &stroke)?;
            }
        }
        GraphMode::Histogram => {
            let pitch = item.thickness.max(1.0) + item.spacing.max(0.0);
            let window = visible_window(samples, width - item.thickness.max(1.0), pitch);
            let range = scale_range(&item.chart, window);
            let paint = foreground(&item.chart, bounds, 270.0);
            for bar in histogram_bars(samples, range, width, height, item.thickness, item.spacing) {
                if !bar.is_empty() {
                    surface.fill_rect(bar, &paint, None)?;
                }
            }
        }
    }

    draw_frame(surface, &item.chart, bounds)
}

/// Range a single-value gauge normalizes against
pub fn gauge_range(chart: &ChartStyle, samples: &[f64]) -> (f64, f64) {
    scale_range(chart, samples)
}

/// Fill fraction for a bar or donut.
///
/// Prefers the live reading, then the newest sample, then the range minimum.
/// The clamped value is eased through the smoothing cache before being
/// normalized, so the gauge moves toward new readings over `cycles` frames.
#[allow(clippy::too_many_arguments)]
pub fn gauge_fraction(
    chart: &ChartStyle,
    item: Uuid,
    live: Option<f64>,
    samples: &[f64],
    smoothing: &SmoothingCache,
    cycles: u32,
    now: Instant,
) -> f64 {
    let (min, max) = gauge_range(chart, samples);
    let (lo, hi) = if min <= max { (min, max) } else { (max, min) };
    let raw = live
        .or_else(|| samples.last().copied())
        .filter(|v| v.is_finite())
        .unwrap_or(lo);
    let clamped = raw.clamp(lo, hi);
    let value = if chart.smooth {
        smoothing.ease(item, clamped, cycles, now)
    } else {
        clamped
    };
    normalize(value, min, max)
}

/// Draw a bar gauge filled to `fraction` (0..=1)
pub fn render_bar(surface: &mut dyn Surface, item: &BarItem, fraction: f64) -> Result<()> {
    let width = item.base.width as f64;
    let height = item.base.height as f64;
    let bounds = Rect::new(0.0, 0.0, width, height);
    if bounds.is_empty() {
        return Ok(());
    }
    let fraction = fraction.clamp(0.0, 1.0);
    let radius = item.corner_radius.max(0.0);

    if let Some(background) = item.chart.background {
        surface.fill_path(&Path::rounded_rect(bounds, radius), &Paint::Solid(background))?;
    }

    let filled = if item.vertical {
        let h = height * fraction;
        Rect::new(0.0, height - h, width, h)
    } else {
        Rect::new(0.0, 0.0, width * fraction, height)
    };
    if !filled.is_empty() {
        let angle = if item.vertical { 270.0 } else { 0.0 };
        let paint = foreground(&item.chart, bounds, angle);
        surface.fill_path(&Path::rounded_rect(filled, radius), &paint)?;
    }

    if let Some(frame) = item.chart.frame {
        surface.draw_path(&Path::rounded_rect(bounds.inset(0.5), radius), &Stroke::new(frame, 1.0))?;
    }
    Ok(())
}

/// Donut geometry for `item` filled to `fraction`
pub fn donut_shape(item: &DonutItem, fraction: f64) -> Donut {
    let width = item.base.width as f64;
    let height = item.base.height as f64;
    let bounds = Rect::new(0.0, 0.0, width, height);
    Donut {
        center: bounds.center(),
        radius: width.min(height) / 2.0,
        thickness: item.thickness.max(0.0),
        start_angle: item.rotation_offset,
        span: item.span.clamp(0.0, 360.0),
        percent: fraction.clamp(0.0, 1.0) * 100.0,
        background: item.chart.background,
        foreground: foreground(&item.chart, bounds, 0.0),
        outline: item.chart.frame.map(|c| (c, 1.0)),
        round_caps: false,
    }
}

/// Draw a donut gauge filled to `fraction` (0..=1)
pub fn render_donut(surface: &mut dyn Surface, item: &DonutItem, fraction: f64) -> Result<()> {
    if item.base.width <= 0 || item.base.height <= 0 {
        return Ok(());
    }
    surface.fill_donut(&donut_shape(item, fraction))
}
