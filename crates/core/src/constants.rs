//! Shared constants for the renderer caches

use std::time::Duration;

/// Maximum samples kept per sensor queue; oldest samples are dropped first
pub const SAMPLE_QUEUE_CAPACITY: usize = 4096;

/// Threshold for snapping eased values to their target.
/// When the difference between the current and target values is at most this,
/// easing is considered complete and the value snaps to the target.
pub const SMOOTHING_SNAP_THRESHOLD: f64 = 0.001;

/// Default seconds of frames a gauge takes to settle on a new reading
pub const SMOOTHING_SECONDS: u32 = 3;

/// Smoothing entries not touched for this long restart from zero
pub const SMOOTHING_TTL: Duration = Duration::from_secs(5);

/// Non-persistent decoded images are evicted after this much idle time
pub const ASSET_IDLE_TTL: Duration = Duration::from_secs(10);

/// Default minimum interval between two chart samples
pub const DEFAULT_GRAPH_UPDATE_INTERVAL: Duration = Duration::from_millis(1000);
