//! sensor-panel-core: Runtime caches shared by the sensor-panel renderer.
//!
//! This crate holds the state that outlives a single frame: rolling sensor
//! sample queues, eased gauge values and decoded images. Both caches are
//! owned values handed to the compositor at construction, never globals.

pub mod asset_cache;
pub mod constants;
pub mod sensor_cache;
mod sync;

pub use asset_cache::{
    is_url, AssetCache, AssetCacheStats, AssetError, AssetSource, DecodedImage, FileAssetSource,
    ImageFrame,
};
pub use constants::{
    ASSET_IDLE_TTL, DEFAULT_GRAPH_UPDATE_INTERVAL, SAMPLE_QUEUE_CAPACITY, SMOOTHING_SECONDS,
    SMOOTHING_SNAP_THRESHOLD, SMOOTHING_TTL,
};
pub use sensor_cache::{smooth, SampleGate, SampleQueue, SensorValueCache, SmoothingCache};
