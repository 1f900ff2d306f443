//! Path construction for shape items, in local unrotated coordinates.

use std::f64::consts::PI;

use sensor_panel_types::{Path, Point, Rect, ShapeKind};

/// Points of a regular polygon inscribed in the ellipse of `rect`
fn regular_polygon(rect: Rect, sides: usize, start_degrees: f64) -> Vec<Point> {
    let c = rect.center();
    let (rx, ry) = (rect.width / 2.0, rect.height / 2.0);
    (0..sides)
        .map(|i| {
            let angle = start_degrees.to_radians() + 2.0 * PI * i as f64 / sides as f64;
            Point::new(c.x + rx * angle.cos(), c.y + ry * angle.sin())
        })
        .collect()
}

fn star(rect: Rect, points: usize, inner_ratio: f64) -> Vec<Point> {
    let c = rect.center();
    let (rx, ry) = (rect.width / 2.0, rect.height / 2.0);
    (0..points * 2)
        .map(|i| {
            let angle = -PI / 2.0 + PI * i as f64 / points as f64;
            let k = if i % 2 == 0 { 1.0 } else { inner_ratio };
            Point::new(c.x + rx * k * angle.cos(), c.y + ry * k * angle.sin())
        })
        .collect()
}

fn plus(rect: Rect) -> Vec<Point> {
    let (l, t, r, b) = (rect.x, rect.y, rect.right(), rect.bottom());
    let (x1, x2) = (l + rect.width / 3.0, l + rect.width * 2.0 / 3.0);
    let (y1, y2) = (t + rect.height / 3.0, t + rect.height * 2.0 / 3.0);
    vec![
        Point::new(x1, t),
        Point::new(x2, t),
        Point::new(x2, y1),
        Point::new(r, y1),
        Point::new(r, y2),
        Point::new(x2, y2),
        Point::new(x2, b),
        Point::new(x1, b),
        Point::new(x1, y2),
        Point::new(l, y2),
        Point::new(l, y1),
        Point::new(x1, y1),
    ]
}

/// Right-pointing arrow; the head takes the last 40% of the width
fn arrow(rect: Rect) -> Vec<Point> {
    let (l, t, r, b) = (rect.x, rect.y, rect.right(), rect.bottom());
    let head = l + rect.width * 0.6;
    let mid = t + rect.height / 2.0;
    let shaft = rect.height / 4.0;
    vec![
        Point::new(l, mid - shaft),
        Point::new(head, mid - shaft),
        Point::new(head, t),
        Point::new(r, mid),
        Point::new(head, b),
        Point::new(head, mid + shaft),
        Point::new(l, mid + shaft),
    ]
}

/// Outline for a shape kind filling `rect`.
///
/// `corner_radius` only applies to rectangles. Empty rects give an empty path.
pub fn shape_path(kind: ShapeKind, rect: Rect, corner_radius: f64) -> Path {
    if rect.is_empty() {
        return Path::new();
    }
    let (l, t, r, b) = (rect.x, rect.y, rect.right(), rect.bottom());
    let inset = rect.width * 0.2;
    match kind {
        ShapeKind::Rectangle => Path::rounded_rect(rect, corner_radius),
        ShapeKind::Capsule => Path::rounded_rect(rect, rect.width.min(rect.height) / 2.0),
        ShapeKind::Ellipse => Path::ellipse(rect),
        ShapeKind::Triangle => Path::polygon(&[
            Point::new(l + rect.width / 2.0, t),
            Point::new(r, b),
            Point::new(l, b),
        ]),
        ShapeKind::Star => Path::polygon(&star(rect, 5, 0.4)),
        ShapeKind::Pentagon => Path::polygon(&regular_polygon(rect, 5, -90.0)),
        ShapeKind::Hexagon => Path::polygon(&regular_polygon(rect, 6, 0.0)),
        ShapeKind::Octagon => Path::polygon(&regular_polygon(rect, 8, 22.5)),
        ShapeKind::Plus => Path::polygon(&plus(rect)),
        ShapeKind::Arrow => Path::polygon(&arrow(rect)),
        ShapeKind::Trapezoid => Path::polygon(&[
            Point::new(l + inset, t),
            Point::new(r - inset, t),
            Point::new(r, b),
            Point::new(l, b),
        ]),
        ShapeKind::Parallelogram => Path::polygon(&[
            Point::new(l + inset, t),
            Point::new(r, t),
            Point::new(r - inset, b),
            Point::new(l, b),
        ]),
    }
}
