//! Backend-independent text placement: alignment offsets and marquee scroll.

use sensor_panel_types::{Marquee, Rect, TextAlign, VerticalAlign};

use crate::surface::TextSize;

/// Left edge of a block `width` wide aligned inside `rect`
pub fn align_x(rect: Rect, width: f64, align: TextAlign) -> f64 {
    match align {
        TextAlign::Left => rect.x,
        TextAlign::Center => rect.x + (rect.width - width) / 2.0,
        TextAlign::Right => rect.right() - width,
    }
}

/// Top edge of a block `height` tall aligned inside `rect`
pub fn align_y(rect: Rect, height: f64, align: VerticalAlign) -> f64 {
    match align {
        VerticalAlign::Top => rect.y,
        VerticalAlign::Middle => rect.y + (rect.height - height) / 2.0,
        VerticalAlign::Bottom => rect.bottom() - height,
    }
}

/// Top-left corner for text of `size` inside `rect`
pub fn aligned_origin(
    rect: Rect,
    size: TextSize,
    align: TextAlign,
    vertical_align: VerticalAlign,
) -> (f64, f64) {
    (
        align_x(rect, size.width, align),
        align_y(rect, size.height, vertical_align),
    )
}

/// Marquee scrolling only engages when the text is wider than its box
pub fn needs_marquee(measured_width: f64, box_width: f64) -> bool {
    measured_width > box_width
}

/// Distance scrolled after `elapsed_secs`, wrapping every
/// `measured_width + spacing` pixels so two copies tile without a gap
pub fn marquee_offset(elapsed_secs: f64, measured_width: f64, marquee: &Marquee) -> f64 {
    let period = measured_width + marquee.spacing.max(0.0);
    if period <= 0.0 || marquee.speed <= 0.0 {
        return 0.0;
    }
    (elapsed_secs * marquee.speed).rem_euclid(period)
}

/// X positions of the two copies drawn for a marquee at `offset`
pub fn marquee_copies(rect: Rect, measured_width: f64, marquee: &Marquee, offset: f64) -> [f64; 2] {
    let first = rect.x - offset;
    [first, first + measured_width + marquee.spacing.max(0.0)]
}

/// Seconds until the marquee returns to its starting position
pub fn marquee_period(measured_width: f64, marquee: &Marquee) -> Option<f64> {
    if marquee.speed <= 0.0 {
        return None;
    }
    Some((measured_width + marquee.spacing.max(0.0)) / marquee.speed)
}
