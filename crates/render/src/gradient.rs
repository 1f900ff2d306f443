//! Gradient shader construction, independent of the drawing backend.
//!
//! Each `GradientStyle` is built as a distinct shader: linear and reflected
//! map to a linear gradient, the radial pulse to a repeating radial gradient
//! with a moving phase, and sweep, spiral and diamond to mesh patches whose
//! corner colors are sampled from the stops.

use sensor_panel_types::{Color, ColorStop, GradientSpec, GradientStyle, Point, Rect};

use crate::render_cache::cached_color_at;

const SWEEP_WEDGES: usize = 36;
const SPIRAL_RINGS: usize = 8;
/// Full color turns from center to edge of a spiral
const SPIRAL_TWIST: f64 = 1.0;
const PULSE_STOPS: usize = 9;

/// One Coons patch: four corners in drawing order with their colors
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshPatch {
    pub points: [Point; 4],
    pub colors: [Color; 4],
}

/// Backend-neutral description of how to paint a gradient
#[derive(Debug, Clone, PartialEq)]
pub enum Shader {
    Linear {
        from: Point,
        to: Point,
        stops: Vec<ColorStop>,
    },
    /// Concentric rings from `center`, repeating every `radius`
    Radial {
        center: Point,
        radius: f64,
        stops: Vec<ColorStop>,
        repeat: bool,
    },
    Mesh(Vec<MeshPatch>),
}

/// Triangle wave over 0..1: 0 at the ends, 1 in the middle
fn tri(x: f64) -> f64 {
    1.0 - (2.0 * x.rem_euclid(1.0) - 1.0).abs()
}

fn polar(center: Point, radius: f64, degrees: f64) -> Point {
    let (sin, cos) = degrees.to_radians().sin_cos();
    Point::new(center.x + radius * cos, center.y + radius * sin)
}

/// Gradient line through the center of `bounds` at `angle` degrees,
/// long enough that both ends touch the bounding box corners
pub fn linear_axis(bounds: Rect, angle: f64) -> (Point, Point) {
    let c = bounds.center();
    let (sin, cos) = angle.to_radians().sin_cos();
    let half = (bounds.width / 2.0 * cos).abs() + (bounds.height / 2.0 * sin).abs();
    (
        Point::new(c.x - cos * half, c.y - sin * half),
        Point::new(c.x + cos * half, c.y + sin * half),
    )
}

/// Start at both ends, end color on the midline
pub fn reflected_stops(spec: &GradientSpec) -> Vec<ColorStop> {
    vec![
        ColorStop::new(0.0, spec.start),
        ColorStop::new(0.5, spec.end),
        ColorStop::new(1.0, spec.start),
    ]
}

/// Stops for one ring of the pulse; increasing `phase` moves rings outward
pub fn pulse_stops(spec: &GradientSpec, phase: f64) -> Vec<ColorStop> {
    (0..PULSE_STOPS)
        .map(|i| {
            let position = i as f64 / (PULSE_STOPS - 1) as f64;
            let t = tri(position - phase);
            ColorStop::new(position, spec.start.lerp(&spec.end, t))
        })
        .collect()
}

fn sweep_patches(spec: &GradientSpec, bounds: Rect) -> Vec<MeshPatch> {
    let stops = spec.stops();
    let center = bounds.center();
    let step = 360.0 / SWEEP_WEDGES as f64;
    // Wedge chords must clear the bounding circle
    let radius = half_diagonal(bounds) / (step / 2.0).to_radians().cos();

    (0..SWEEP_WEDGES)
        .map(|i| {
            let a0 = spec.angle + i as f64 * step;
            let a1 = a0 + step;
            let c0 = cached_color_at(&stops, i as f64 / SWEEP_WEDGES as f64);
            let c1 = cached_color_at(&stops, (i + 1) as f64 / SWEEP_WEDGES as f64);
            MeshPatch {
                points: [center, polar(center, radius, a0), polar(center, radius, a1), center],
                colors: [c0, c0, c1, c1],
            }
        })
        .collect()
}

fn spiral_patches(spec: &GradientSpec, bounds: Rect, phase: f64) -> Vec<MeshPatch> {
    let stops = spec.stops();
    let center = bounds.center();
    let step = 360.0 / SWEEP_WEDGES as f64;
    let outer = half_diagonal(bounds) / (step / 2.0).to_radians().cos();
    let color = |wedge: usize, ring: usize| {
        let t = wedge as f64 / SWEEP_WEDGES as f64
            + ring as f64 / SPIRAL_RINGS as f64 * SPIRAL_TWIST
            + phase;
        cached_color_at(&stops, tri(t))
    };

    let mut patches = Vec::with_capacity(SWEEP_WEDGES * SPIRAL_RINGS);
    for ring in 0..SPIRAL_RINGS {
        let r0 = outer * ring as f64 / SPIRAL_RINGS as f64;
        let r1 = outer * (ring + 1) as f64 / SPIRAL_RINGS as f64;
        for wedge in 0..SWEEP_WEDGES {
            let a0 = spec.angle + wedge as f64 * step;
            let a1 = a0 + step;
            patches.push(MeshPatch {
                points: [
                    polar(center, r0, a0),
                    polar(center, r1, a0),
                    polar(center, r1, a1),
                    polar(center, r0, a1),
                ],
                colors: [
                    color(wedge, ring),
                    color(wedge, ring + 1),
                    color(wedge + 1, ring + 1),
                    color(wedge + 1, ring),
                ],
            });
        }
    }
    patches
}

fn diamond_patches(spec: &GradientSpec, bounds: Rect) -> Vec<MeshPatch> {
    let center = bounds.center();
    let corners = bounds.corners();
    (0..4)
        .map(|i| MeshPatch {
            points: [center, corners[i], corners[(i + 1) % 4], center],
            colors: [spec.start, spec.end, spec.end, spec.start],
        })
        .collect()
}

fn half_diagonal(bounds: Rect) -> f64 {
    (bounds.width.powi(2) + bounds.height.powi(2)).sqrt() / 2.0
}

/// Build the shader for `spec` over `bounds`
pub fn build_shader(spec: &GradientSpec, bounds: Rect, phase: f64) -> Shader {
    match spec.style {
        GradientStyle::Linear => {
            let (from, to) = linear_axis(bounds, spec.angle);
            Shader::Linear {
                from,
                to,
                stops: spec.stops().to_vec(),
            }
        }
        GradientStyle::Reflected => {
            let (from, to) = linear_axis(bounds, spec.angle);
            Shader::Linear {
                from,
                to,
                stops: reflected_stops(spec),
            }
        }
        GradientStyle::RadialPulse => Shader::Radial {
            center: bounds.center(),
            radius: (bounds.width.max(bounds.height) / 4.0).max(1.0),
            stops: pulse_stops(spec, phase),
            repeat: true,
        },
        GradientStyle::Sweep => Shader::Mesh(sweep_patches(spec, bounds)),
        GradientStyle::Spiral => Shader::Mesh(spiral_patches(spec, bounds, phase)),
        GradientStyle::Diamond => Shader::Mesh(diamond_patches(spec, bounds)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Point, b: Point) -> bool {
        (a.x - b.x).abs() < 1e-9 && (a.y - b.y).abs() < 1e-9
    }

    fn spec(style: GradientStyle) -> GradientSpec {
        GradientSpec::new(style, Color::BLACK, Color::WHITE)
    }

    #[test]
    fn test_linear_axis_directions() {
        let bounds = Rect::new(0.0, 0.0, 100.0, 50.0);
        let (from, to) = linear_axis(bounds, 0.0);
        assert!(approx(from, Point::new(0.0, 25.0)));
        assert!(approx(to, Point::new(100.0, 25.0)));

        let (from, to) = linear_axis(bounds, 90.0);
        assert!(approx(from, Point::new(50.0, 0.0)));
        assert!(approx(to, Point::new(50.0, 50.0)));
    }

    #[test]
    fn test_each_style_builds_a_distinct_shader() {
        let bounds = Rect::new(0.0, 0.0, 80.0, 80.0);
        assert!(matches!(
            build_shader(&spec(GradientStyle::Linear), bounds, 0.0),
            Shader::Linear { ref stops, .. } if stops.len() == 2
        ));
        assert!(matches!(
            build_shader(&spec(GradientStyle::Reflected), bounds, 0.0),
            Shader::Linear { ref stops, .. } if stops.len() == 3
        ));
        assert!(matches!(
            build_shader(&spec(GradientStyle::RadialPulse), bounds, 0.0),
            Shader::Radial { repeat: true, .. }
        ));
        let Shader::Mesh(sweep) = build_shader(&spec(GradientStyle::Sweep), bounds, 0.0) else {
            panic!("sweep is a mesh");
        };
        assert_eq!(sweep.len(), SWEEP_WEDGES);
        let Shader::Mesh(spiral) = build_shader(&spec(GradientStyle::Spiral), bounds, 0.0) else {
            panic!("spiral is a mesh");
        };
        assert_eq!(spiral.len(), SWEEP_WEDGES * SPIRAL_RINGS);
        let Shader::Mesh(diamond) = build_shader(&spec(GradientStyle::Diamond), bounds, 0.0) else {
            panic!("diamond is a mesh");
        };
        assert_eq!(diamond.len(), 4);
        assert!(diamond.iter().all(|p| p.colors[0] == Color::BLACK && p.colors[1] == Color::WHITE));
    }

    #[test]
    fn test_sweep_runs_start_to_end() {
        let Shader::Mesh(patches) =
            build_shader(&spec(GradientStyle::Sweep), Rect::new(0.0, 0.0, 10.0, 10.0), 0.0)
        else {
            panic!("sweep is a mesh");
        };
        assert_eq!(patches[0].colors[0], Color::BLACK);
        let last = patches[patches.len() - 1].colors[2];
        assert!(last.r > 0.99);
    }

    #[test]
    fn test_pulse_phase_shifts_rings() {
        let s = spec(GradientStyle::RadialPulse);
        let still = pulse_stops(&s, 0.0);
        assert_eq!(still[0].color, Color::BLACK);
        assert_eq!(still[PULSE_STOPS / 2].color, Color::WHITE);

        let moved = pulse_stops(&s, 0.5);
        assert_eq!(moved[0].color, Color::WHITE);
        assert_eq!(moved[PULSE_STOPS / 2].color, Color::BLACK);
    }
}
