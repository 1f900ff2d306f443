//! Geometry primitives shared by the scene model and the renderer.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Rotate this point about `center` by `degrees` (clockwise in screen space)
    pub fn rotate_about(&self, center: Point, degrees: f64) -> Point {
        if degrees == 0.0 {
            return *self;
        }
        let (sin, cos) = degrees.to_radians().sin_cos();
        let dx = self.x - center.x;
        let dy = self.y - center.y;
        Point {
            x: center.x + dx * cos - dy * sin,
            y: center.y + dx * sin + dy * cos,
        }
    }
}

/// Axis-aligned rectangle
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Zero or negative area; drawing such a rect is a no-op
    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x < self.right() && p.y >= self.y && p.y < self.bottom()
    }

    pub fn corners(&self) -> [Point; 4] {
        [
            Point::new(self.x, self.y),
            Point::new(self.right(), self.y),
            Point::new(self.right(), self.bottom()),
            Point::new(self.x, self.bottom()),
        ]
    }

    pub fn scaled(&self, scale: f64) -> Rect {
        Rect::new(
            self.x * scale,
            self.y * scale,
            self.width * scale,
            self.height * scale,
        )
    }

    pub fn inset(&self, amount: f64) -> Rect {
        Rect::new(
            self.x + amount,
            self.y + amount,
            (self.width - amount * 2.0).max(0.0),
            (self.height - amount * 2.0).max(0.0),
        )
    }

    /// Bounding box of this rect after rotating it about its own center
    pub fn rotated_bounds(&self, degrees: f64) -> Rect {
        if degrees % 360.0 == 0.0 {
            return *self;
        }
        let center = self.center();
        let rotated = self.corners().map(|p| p.rotate_about(center, degrees));
        Rect::bounding(&rotated).unwrap_or(*self)
    }

    /// Smallest rect containing all points
    pub fn bounding(points: &[Point]) -> Option<Rect> {
        let first = points.first()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for p in &points[1..] {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        Some(Rect::new(min_x, min_y, max_x - min_x, max_y - min_y))
    }

    pub fn union(&self, other: &Rect) -> Rect {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        Rect::new(
            x,
            y,
            self.right().max(other.right()) - x,
            self.bottom().max(other.bottom()) - y,
        )
    }
}

/// One element of a vector path
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathEl {
    MoveTo(Point),
    LineTo(Point),
    CubicTo(Point, Point, Point),
    Close,
}

/// A vector path in panel coordinates
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Path {
    elements: Vec<PathEl>,
}

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn move_to(&mut self, x: f64, y: f64) -> &mut Self {
        self.elements.push(PathEl::MoveTo(Point::new(x, y)));
        self
    }

    pub fn line_to(&mut self, x: f64, y: f64) -> &mut Self {
        self.elements.push(PathEl::LineTo(Point::new(x, y)));
        self
    }

    pub fn cubic_to(&mut self, c1: Point, c2: Point, end: Point) -> &mut Self {
        self.elements.push(PathEl::CubicTo(c1, c2, end));
        self
    }

    pub fn close(&mut self) -> &mut Self {
        self.elements.push(PathEl::Close);
        self
    }

    /// Closed polygon through `points`
    pub fn polygon(points: &[Point]) -> Self {
        let mut path = Path::new();
        for (i, p) in points.iter().enumerate() {
            if i == 0 {
                path.move_to(p.x, p.y);
            } else {
                path.line_to(p.x, p.y);
            }
        }
        if !points.is_empty() {
            path.close();
        }
        path
    }

    /// Ellipse inscribed in `rect`, built from four cubic segments
    pub fn ellipse(rect: Rect) -> Self {
        // Control point distance for a quarter circle
        const KAPPA: f64 = 0.552_284_749_8;
        let c = rect.center();
        let rx = rect.width / 2.0;
        let ry = rect.height / 2.0;
        let ox = rx * KAPPA;
        let oy = ry * KAPPA;

        let mut path = Path::new();
        path.move_to(c.x + rx, c.y);
        path.cubic_to(
            Point::new(c.x + rx, c.y + oy),
            Point::new(c.x + ox, c.y + ry),
            Point::new(c.x, c.y + ry),
        );
        path.cubic_to(
            Point::new(c.x - ox, c.y + ry),
            Point::new(c.x - rx, c.y + oy),
            Point::new(c.x - rx, c.y),
        );
        path.cubic_to(
            Point::new(c.x - rx, c.y - oy),
            Point::new(c.x - ox, c.y - ry),
            Point::new(c.x, c.y - ry),
        );
        path.cubic_to(
            Point::new(c.x + ox, c.y - ry),
            Point::new(c.x + rx, c.y - oy),
            Point::new(c.x + rx, c.y),
        );
        path.close();
        path
    }

    /// Rectangle with rounded corners; radius is clamped to half the short side
    pub fn rounded_rect(rect: Rect, radius: f64) -> Self {
        let r = radius.min(rect.width / 2.0).min(rect.height / 2.0).max(0.0);
        if r <= 0.0 {
            return Path::polygon(&rect.corners());
        }
        const KAPPA: f64 = 0.552_284_749_8;
        let k = r * KAPPA;
        let (l, t, rt, b) = (rect.x, rect.y, rect.right(), rect.bottom());

        let mut path = Path::new();
        path.move_to(l + r, t);
        path.line_to(rt - r, t);
        path.cubic_to(Point::new(rt - r + k, t), Point::new(rt, t + r - k), Point::new(rt, t + r));
        path.line_to(rt, b - r);
        path.cubic_to(Point::new(rt, b - r + k), Point::new(rt - r + k, b), Point::new(rt - r, b));
        path.line_to(l + r, b);
        path.cubic_to(Point::new(l + r - k, b), Point::new(l, b - r + k), Point::new(l, b - r));
        path.line_to(l, t + r);
        path.cubic_to(Point::new(l, t + r - k), Point::new(l + r - k, t), Point::new(l + r, t));
        path.close();
        path
    }

    pub fn elements(&self) -> &[PathEl] {
        &self.elements
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Map every point through `f`
    pub fn map_points(&self, f: impl Fn(Point) -> Point) -> Path {
        let elements = self
            .elements
            .iter()
            .map(|el| match *el {
                PathEl::MoveTo(p) => PathEl::MoveTo(f(p)),
                PathEl::LineTo(p) => PathEl::LineTo(f(p)),
                PathEl::CubicTo(a, b, c) => PathEl::CubicTo(f(a), f(b), f(c)),
                PathEl::Close => PathEl::Close,
            })
            .collect();
        Path { elements }
    }

    pub fn rotated_about(&self, center: Point, degrees: f64) -> Path {
        if degrees % 360.0 == 0.0 {
            return self.clone();
        }
        self.map_points(|p| p.rotate_about(center, degrees))
    }

    pub fn translated(&self, dx: f64, dy: f64) -> Path {
        self.map_points(|p| Point::new(p.x + dx, p.y + dy))
    }

    pub fn scaled(&self, scale: f64) -> Path {
        self.map_points(|p| Point::new(p.x * scale, p.y * scale))
    }

    /// Control-point bounding box (a superset of the exact curve bounds)
    pub fn bounds(&self) -> Option<Rect> {
        let points: Vec<Point> = self
            .elements
            .iter()
            .flat_map(|el| match *el {
                PathEl::MoveTo(p) | PathEl::LineTo(p) => vec![p],
                PathEl::CubicTo(a, b, c) => vec![a, b, c],
                PathEl::Close => vec![],
            })
            .collect();
        Rect::bounding(&points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_rotated_bounds_quarter_turn() {
        let r = Rect::new(0.0, 0.0, 100.0, 20.0);
        let b = r.rotated_bounds(90.0);
        assert!(approx(b.width, 20.0));
        assert!(approx(b.height, 100.0));
        assert!(approx(b.center().x, 50.0));
        assert!(approx(b.center().y, 10.0));
    }

    #[test]
    fn test_rotated_bounds_identity() {
        let r = Rect::new(5.0, 5.0, 10.0, 10.0);
        assert_eq!(r.rotated_bounds(0.0), r);
        assert_eq!(r.rotated_bounds(360.0), r);
    }

    #[test]
    fn test_path_rotation_keeps_center() {
        let path = Path::polygon(&Rect::new(0.0, 0.0, 10.0, 10.0).corners());
        let rotated = path.rotated_about(Point::new(5.0, 5.0), 45.0);
        let b = rotated.bounds().unwrap();
        assert!(approx(b.center().x, 5.0));
        assert!(b.width > 10.0);
    }

    #[test]
    fn test_empty_rect() {
        assert!(Rect::new(0.0, 0.0, 0.0, 10.0).is_empty());
        assert!(!Rect::new(0.0, 0.0, 1.0, 1.0).is_empty());
    }
}
