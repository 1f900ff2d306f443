//! Render cache for gradient color lookups.
//!
//! Mesh-based gradients (sweep, spiral, diamond) sample their stops once per
//! patch corner, every frame. A pre-computed lookup table per distinct stop
//! list keeps that sampling to an index and a lerp.

use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;

use sensor_panel_types::{color_at, Color, ColorStop};

/// Pre-computed color lookup table for a gradient
#[derive(Debug, Clone)]
pub struct ColorGradientLUT {
    colors: Vec<Color>,
    resolution: usize,
}

impl ColorGradientLUT {
    /// Create a new LUT from color stops.
    /// Stops are sorted by position during construction (handles unsorted input)
    pub fn from_stops(stops: &[ColorStop], resolution: usize) -> Self {
        let resolution = resolution.max(2);
        let mut sorted: Vec<ColorStop> = stops.to_vec();
        sorted.sort_by(|a, b| {
            a.position
                .partial_cmp(&b.position)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let colors = (0..resolution)
            .map(|i| color_at(&sorted, i as f64 / (resolution - 1) as f64))
            .collect();
        Self { colors, resolution }
    }

    /// Color at position t (0.0 to 1.0), interpolating between entries
    pub fn get_color(&self, t: f64) -> Color {
        let t = t.clamp(0.0, 1.0);
        let scaled = t * (self.resolution - 1) as f64;
        let index = (scaled as usize).min(self.resolution - 1);
        let frac = scaled - scaled.floor();

        if frac < 0.001 || index >= self.resolution - 1 {
            self.colors[index]
        } else {
            self.colors[index].lerp(&self.colors[index + 1], frac)
        }
    }
}

// Thread-local gradient LUT cache; the render thread is the only reader
thread_local! {
    static GRADIENT_LUT_CACHE: RefCell<GradientLUTCache> = RefCell::new(GradientLUTCache::new());
}

struct GradientLUTCache {
    cache: HashMap<u64, Arc<ColorGradientLUT>>,
    max_entries: usize,
}

impl GradientLUTCache {
    fn new() -> Self {
        Self {
            cache: HashMap::new(),
            max_entries: 32,
        }
    }

    fn get_or_create(&mut self, stops: &[ColorStop], resolution: usize) -> Arc<ColorGradientLUT> {
        let key = hash_color_stops(stops);
        if let Some(lut) = self.cache.get(&key) {
            return Arc::clone(lut);
        }

        if self.cache.len() >= self.max_entries {
            if let Some(&any_key) = self.cache.keys().next() {
                self.cache.remove(&any_key);
            }
        }

        let lut = Arc::new(ColorGradientLUT::from_stops(stops, resolution));
        self.cache.insert(key, Arc::clone(&lut));
        lut
    }
}

fn hash_color_stops(stops: &[ColorStop]) -> u64 {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    let mut hasher = DefaultHasher::new();
    for stop in stops {
        stop.position.to_bits().hash(&mut hasher);
        stop.color.r.to_bits().hash(&mut hasher);
        stop.color.g.to_bits().hash(&mut hasher);
        stop.color.b.to_bits().hash(&mut hasher);
        stop.color.a.to_bits().hash(&mut hasher);
    }
    hasher.finish()
}

/// Color at `t` through a cached 256-entry LUT
pub fn cached_color_at(stops: &[ColorStop], t: f64) -> Color {
    match stops {
        [] => Color::default(),
        [only] => only.color,
        _ => {
            const RESOLUTION: usize = 256;
            GRADIENT_LUT_CACHE
                .with(|cache| cache.borrow_mut().get_or_create(stops, RESOLUTION))
                .get_color(t)
        }
    }
}

/// Number of cached LUTs on this thread
pub fn cached_lut_count() -> usize {
    GRADIENT_LUT_CACHE.with(|cache| cache.borrow().cache.len())
}

/// Drop every cached LUT on this thread
pub fn clear_render_caches() {
    GRADIENT_LUT_CACHE.with(|cache| cache.borrow_mut().cache.clear());
    log::debug!("Gradient LUT cache cleared");
}
