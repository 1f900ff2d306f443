//! Decoded image cache with non-blocking fill on miss.
//!
//! `get` never waits on I/O. A miss takes the per-key lock with a zero-timeout
//! try, schedules the decode on the tokio blocking pool and returns `None`;
//! the decode fills the cache and releases the lock whether it succeeded or
//! not. A caller that finds the lock already held also gets `None` and simply
//! draws nothing this frame.
//!
//! Per-key locks live in a dictionary of semaphores created on demand and
//! removed once the decode that created them finishes, so unrelated paths
//! never contend.

use std::collections::HashMap;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use image::codecs::gif::GifDecoder;
use image::{AnimationDecoder, ImageFormat, RgbaImage};
use tokio::runtime::Handle;
use tokio::sync::Semaphore;

use crate::constants::ASSET_IDLE_TTL;
use crate::sync;

static NEXT_IMAGE_ID: AtomicU64 = AtomicU64::new(1);

/// Errors from loading an asset
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("file not found: {0}")]
    NotFound(PathBuf),
    #[error("unsupported URL scheme: {0}")]
    UnsupportedScheme(String),
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to decode {key}: {source}")]
    Decode {
        key: String,
        source: image::ImageError,
    },
    #[error("failed to fetch {url}: {source}")]
    Http { url: String, source: reqwest::Error },
    #[error("image {0} has no frames")]
    Empty(String),
}

/// One frame of a decoded image
#[derive(Debug, Clone)]
pub struct ImageFrame {
    /// Premultiplied ARGB, one native-endian `u32` per pixel, row-major
    pub pixels: Vec<u32>,
    /// How long this frame is shown; zero for still images
    pub delay: Duration,
}

/// A decoded still or animated image.
///
/// Each decode gets a unique id; drawing backends key their native copies by
/// it and drop them once the image is gone from the cache.
#[derive(Debug)]
pub struct DecodedImage {
    id: u64,
    width: u32,
    height: u32,
    frames: Vec<ImageFrame>,
    duration: Duration,
}

/// Straight RGBA to premultiplied native ARGB
fn premultiply(rgba: &[u8]) -> Vec<u32> {
    rgba.chunks_exact(4)
        .map(|px| {
            let a = px[3] as u32;
            let mul = |c: u8| (c as u32 * a + 127) / 255;
            (a << 24) | (mul(px[0]) << 16) | (mul(px[1]) << 8) | mul(px[2])
        })
        .collect()
}

impl DecodedImage {
    /// Still image from straight (non-premultiplied) RGBA bytes
    pub fn from_rgba(width: u32, height: u32, rgba: &[u8]) -> Self {
        Self::from_frames(
            width,
            height,
            vec![ImageFrame {
                pixels: premultiply(rgba),
                delay: Duration::ZERO,
            }],
        )
    }

    pub fn from_frames(width: u32, height: u32, frames: Vec<ImageFrame>) -> Self {
        let duration = frames.iter().map(|f| f.delay).sum();
        Self {
            id: NEXT_IMAGE_ID.fetch_add(1, Ordering::Relaxed),
            width,
            height,
            frames,
            duration,
        }
    }

    fn from_rgba_image(image: RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        Self::from_rgba(width, height, image.as_raw())
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Multi-frame images with a playback duration are treated as video
    pub fn is_animated(&self) -> bool {
        self.frames.len() > 1 && !self.duration.is_zero()
    }

    /// Total playback time of one loop
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Average frames per second of the animation, 0 for still images
    pub fn frame_rate(&self) -> f64 {
        if self.is_animated() {
            self.frames.len() as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Frame index shown after `elapsed` of looping playback
    pub fn frame_index_at(&self, elapsed: Duration) -> usize {
        if !self.is_animated() {
            return 0;
        }
        let total = self.duration.as_nanos();
        let mut position = elapsed.as_nanos() % total;
        for (index, frame) in self.frames.iter().enumerate() {
            let delay = frame.delay.as_nanos();
            if position < delay {
                return index;
            }
            position -= delay;
        }
        self.frames.len() - 1
    }

    pub fn frame(&self, index: usize) -> Option<&ImageFrame> {
        self.frames.get(index)
    }

    pub fn frame_at(&self, elapsed: Duration) -> Option<&ImageFrame> {
        self.frame(self.frame_index_at(elapsed))
    }
}

/// Where decoded images come from.
///
/// Loads run on a background thread and may block.
pub trait AssetSource: Send + Sync {
    fn load_from_path(&self, path: &Path) -> Result<DecodedImage, AssetError>;

    fn load_from_url(&self, url: &str) -> Result<DecodedImage, AssetError>;

    /// Dispatch on the cache key: URLs go to `load_from_url`, anything else
    /// is a file path
    fn load(&self, key: &str) -> Result<DecodedImage, AssetError> {
        if is_url(key) {
            self.load_from_url(key)
        } else {
            self.load_from_path(Path::new(key))
        }
    }
}

pub fn is_url(key: &str) -> bool {
    key.contains("://")
}

/// Files through the `image` crate, remote images through `reqwest`
#[derive(Debug, Default)]
pub struct FileAssetSource;

impl FileAssetSource {
    fn decode(key: &str, bytes: &[u8]) -> Result<DecodedImage, AssetError> {
        let decode_err = |source| AssetError::Decode {
            key: key.to_string(),
            source,
        };
        let format = image::guess_format(bytes).map_err(decode_err)?;
        if format == ImageFormat::Gif {
            let decoder = GifDecoder::new(Cursor::new(bytes)).map_err(decode_err)?;
            let frames = decoder.into_frames().collect_frames().map_err(decode_err)?;
            return Self::from_gif_frames(key, frames);
        }
        let image = image::load_from_memory_with_format(bytes, format).map_err(decode_err)?;
        Ok(DecodedImage::from_rgba_image(image.to_rgba8()))
    }

    fn from_gif_frames(key: &str, frames: Vec<image::Frame>) -> Result<DecodedImage, AssetError> {
        let mut decoded = Vec::with_capacity(frames.len());
        let mut size = None;
        for frame in frames {
            let (numer, denom) = frame.delay().numer_denom_ms();
            let delay_ms = if denom == 0 { 0 } else { numer / denom };
            let buffer = frame.into_buffer();
            size.get_or_insert(buffer.dimensions());
            decoded.push(ImageFrame {
                pixels: premultiply(buffer.as_raw()),
                // Browsers treat delays under 20ms as 100ms
                delay: Duration::from_millis(if delay_ms < 20 { 100 } else { delay_ms as u64 }),
            });
        }
        let (width, height) = size.ok_or_else(|| AssetError::Empty(key.to_string()))?;
        if decoded.len() == 1 {
            decoded[0].delay = Duration::ZERO;
        }
        Ok(DecodedImage::from_frames(width, height, decoded))
    }
}

impl AssetSource for FileAssetSource {
    fn load_from_path(&self, path: &Path) -> Result<DecodedImage, AssetError> {
        if !path.exists() {
            return Err(AssetError::NotFound(path.to_path_buf()));
        }
        let bytes = std::fs::read(path).map_err(|source| AssetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::decode(&path.to_string_lossy(), &bytes)
    }

    fn load_from_url(&self, url: &str) -> Result<DecodedImage, AssetError> {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(AssetError::UnsupportedScheme(url.to_string()));
        }
        let http_err = |source| AssetError::Http {
            url: url.to_string(),
            source,
        };
        let bytes = reqwest::blocking::get(url)
            .and_then(|response| response.error_for_status())
            .and_then(|response| response.bytes())
            .map_err(http_err)?;
        Self::decode(url, &bytes)
    }
}

struct CacheEntry {
    image: Arc<DecodedImage>,
    persistent: bool,
    last_access: Instant,
}

/// Counters reported by the FPS overlay
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssetCacheStats {
    pub entries: usize,
    pub in_flight: usize,
    pub hits: u64,
    pub misses: u64,
    pub decodes: u64,
    pub failures: u64,
    pub evictions: u64,
}

#[derive(Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    decodes: AtomicU64,
    failures: AtomicU64,
    evictions: AtomicU64,
}

struct Inner {
    entries: Mutex<HashMap<String, CacheEntry>>,
    locks: Mutex<HashMap<String, Arc<Semaphore>>>,
    source: Arc<dyn AssetSource>,
    idle_ttl: Duration,
    counters: Counters,
}

impl Inner {
    fn lookup(&self, key: &str, persistent: bool) -> Option<Arc<DecodedImage>> {
        let mut entries = sync::lock(&self.entries, "Asset entries");
        let entry = entries.get_mut(key)?;
        entry.last_access = Instant::now();
        entry.persistent |= persistent;
        Some(entry.image.clone())
    }

    /// Remove the key's lock if it is still the one we were handed
    fn release_lock(&self, key: &str, semaphore: &Arc<Semaphore>) {
        let mut locks = sync::lock(&self.locks, "Asset locks");
        if locks.get(key).is_some_and(|s| Arc::ptr_eq(s, semaphore)) {
            locks.remove(key);
        }
    }
}

/// Keyed store of decoded images shared by the render thread and the
/// background decode pool
#[derive(Clone)]
pub struct AssetCache {
    inner: Arc<Inner>,
    runtime: Handle,
}

impl AssetCache {
    pub fn new(source: Arc<dyn AssetSource>, runtime: Handle) -> Self {
        Self::with_idle_ttl(source, runtime, ASSET_IDLE_TTL)
    }

    pub fn with_idle_ttl(source: Arc<dyn AssetSource>, runtime: Handle, idle_ttl: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                entries: Mutex::new(HashMap::new()),
                locks: Mutex::new(HashMap::new()),
                source,
                idle_ttl,
                counters: Counters::default(),
            }),
            runtime,
        }
    }

    /// Decoded image for `key`, or `None` while it is missing or loading.
    ///
    /// A miss schedules at most one background decode per key. `persistent`
    /// exempts the entry from idle eviction once it is cached.
    pub fn get(&self, key: &str, persistent: bool) -> Option<Arc<DecodedImage>> {
        if let Some(image) = self.inner.lookup(key, persistent) {
            self.inner.counters.hits.fetch_add(1, Ordering::Relaxed);
            return Some(image);
        }
        self.inner.counters.misses.fetch_add(1, Ordering::Relaxed);

        let semaphore = sync::lock(&self.inner.locks, "Asset locks")
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Semaphore::new(1)))
            .clone();
        let Ok(permit) = semaphore.clone().try_acquire_owned() else {
            log::trace!("Decode already in flight for {}", key);
            return None;
        };

        // The previous decode may have landed between the lookup and the lock
        if let Some(image) = self.inner.lookup(key, persistent) {
            self.inner.release_lock(key, &semaphore);
            return Some(image);
        }

        self.inner.counters.decodes.fetch_add(1, Ordering::Relaxed);
        log::debug!("Scheduling decode of {}", key);
        let inner = self.inner.clone();
        let key = key.to_string();
        self.runtime.spawn_blocking(move || {
            let started = Instant::now();
            match inner.source.load(&key) {
                Ok(image) => {
                    log::debug!(
                        "Decoded {} ({}x{}, {} frames) in {:?}",
                        key,
                        image.width(),
                        image.height(),
                        image.frame_count(),
                        started.elapsed()
                    );
                    sync::lock(&inner.entries, "Asset entries").insert(
                        key.clone(),
                        CacheEntry {
                            image: Arc::new(image),
                            persistent,
                            last_access: Instant::now(),
                        },
                    );
                }
                Err(e) => {
                    inner.counters.failures.fetch_add(1, Ordering::Relaxed);
                    log::error!("Failed to load image: {}", e);
                }
            }
            inner.release_lock(&key, &semaphore);
            drop(permit);
        });
        None
    }

    /// Whether a decode for `key` is currently running
    pub fn is_loading(&self, key: &str) -> bool {
        sync::lock(&self.inner.locks, "Asset locks")
            .get(key)
            .is_some_and(|s| s.available_permits() == 0)
    }

    pub fn contains(&self, key: &str) -> bool {
        sync::lock(&self.inner.entries, "Asset entries").contains_key(key)
    }

    /// Force-remove an entry regardless of persistence.
    ///
    /// Draws already holding the image keep it alive until they finish.
    pub fn invalidate(&self, key: &str) -> bool {
        let removed = sync::lock(&self.inner.entries, "Asset entries")
            .remove(key)
            .is_some();
        if removed {
            self.inner.counters.evictions.fetch_add(1, Ordering::Relaxed);
            log::debug!("Invalidated cached image {}", key);
        }
        removed
    }

    /// Evict non-persistent entries idle past the TTL; returns the count
    pub fn sweep(&self, now: Instant) -> usize {
        let ttl = self.inner.idle_ttl;
        let mut entries = sync::lock(&self.inner.entries, "Asset entries");
        let before = entries.len();
        entries.retain(|key, entry| {
            let keep = entry.persistent || now.saturating_duration_since(entry.last_access) <= ttl;
            if !keep {
                log::debug!("Evicting idle image {}", key);
            }
            keep
        });
        let evicted = before - entries.len();
        self.inner
            .counters
            .evictions
            .fetch_add(evicted as u64, Ordering::Relaxed);
        evicted
    }

    /// Drop every entry, persistent ones included
    pub fn clear(&self) {
        let mut entries = sync::lock(&self.inner.entries, "Asset entries");
        self.inner
            .counters
            .evictions
            .fetch_add(entries.len() as u64, Ordering::Relaxed);
        entries.clear();
    }

    pub fn stats(&self) -> AssetCacheStats {
        let counters = &self.inner.counters;
        AssetCacheStats {
            entries: sync::lock(&self.inner.entries, "Asset entries").len(),
            in_flight: sync::lock(&self.inner.locks, "Asset locks").len(),
            hits: counters.hits.load(Ordering::Relaxed),
            misses: counters.misses.load(Ordering::Relaxed),
            decodes: counters.decodes.load(Ordering::Relaxed),
            failures: counters.failures.load(Ordering::Relaxed),
            evictions: counters.evictions.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    /// Source that counts loads and takes a while to answer
    struct SlowSource {
        loads: AtomicUsize,
        delay: Duration,
        fail_first: bool,
    }

    impl SlowSource {
        fn new(delay_ms: u64) -> Self {
            Self {
                loads: AtomicUsize::new(0),
                delay: Duration::from_millis(delay_ms),
                fail_first: false,
            }
        }

        fn loads(&self) -> usize {
            self.loads.load(Ordering::SeqCst)
        }
    }

    impl AssetSource for SlowSource {
        fn load_from_path(&self, path: &Path) -> Result<DecodedImage, AssetError> {
            let n = self.loads.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(self.delay);
            if self.fail_first && n == 0 {
                return Err(AssetError::NotFound(path.to_path_buf()));
            }
            Ok(DecodedImage::from_rgba(2, 1, &[255, 0, 0, 255, 0, 0, 255, 128]))
        }

        fn load_from_url(&self, url: &str) -> Result<DecodedImage, AssetError> {
            Err(AssetError::UnsupportedScheme(url.to_string()))
        }
    }

    fn runtime() -> tokio::runtime::Runtime {
        tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .unwrap()
    }

    fn wait_for(cache: &AssetCache, key: &str) -> Option<Arc<DecodedImage>> {
        for _ in 0..200 {
            if !cache.is_loading(key) {
                if let Some(image) = cache.get(key, false) {
                    return Some(image);
                }
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        None
    }

    fn wait_idle(cache: &AssetCache, key: &str) {
        for _ in 0..200 {
            if !cache.is_loading(key) {
                return;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
    }

    #[test]
    fn test_miss_then_hit_after_decode() {
        let rt = runtime();
        let source = Arc::new(SlowSource::new(20));
        let cache = AssetCache::new(source.clone(), rt.handle().clone());

        assert!(cache.get("/img/a.png", false).is_none());
        let image = wait_for(&cache, "/img/a.png").expect("decode finished");
        assert_eq!((image.width(), image.height()), (2, 1));
        assert_eq!(source.loads(), 1);
        assert_eq!(cache.stats().in_flight, 0);
    }

    #[test]
    fn test_concurrent_misses_decode_once() {
        let rt = runtime();
        let source = Arc::new(SlowSource::new(150));
        let cache = AssetCache::new(source.clone(), rt.handle().clone());

        let threads: Vec<_> = (0..8)
            .map(|_| {
                let cache = cache.clone();
                std::thread::spawn(move || {
                    for _ in 0..20 {
                        let _ = cache.get("/img/shared.png", false);
                        std::thread::sleep(Duration::from_millis(2));
                    }
                })
            })
            .collect();
        for t in threads {
            t.join().unwrap();
        }

        assert!(wait_for(&cache, "/img/shared.png").is_some());
        assert_eq!(source.loads(), 1);
        assert_eq!(cache.stats().decodes, 1);
    }

    #[test]
    fn test_distinct_keys_do_not_block_each_other() {
        let rt = runtime();
        let source = Arc::new(SlowSource::new(100));
        let cache = AssetCache::new(source.clone(), rt.handle().clone());

        assert!(cache.get("/a.png", false).is_none());
        assert!(cache.get("/b.png", false).is_none());
        assert!(cache.is_loading("/a.png") || cache.contains("/a.png"));
        assert!(cache.is_loading("/b.png") || cache.contains("/b.png"));
        assert!(wait_for(&cache, "/a.png").is_some());
        assert!(wait_for(&cache, "/b.png").is_some());
        assert_eq!(source.loads(), 2);
    }

    #[test]
    fn test_failed_decode_is_retried() {
        let rt = runtime();
        let source = Arc::new(SlowSource {
            fail_first: true,
            ..SlowSource::new(5)
        });
        let cache = AssetCache::new(source.clone(), rt.handle().clone());

        assert!(cache.get("/flaky.png", false).is_none());
        wait_idle(&cache, "/flaky.png");
        assert!(!cache.contains("/flaky.png"));
        assert_eq!(cache.stats().failures, 1);

        assert!(wait_for(&cache, "/flaky.png").is_some());
        assert_eq!(source.loads(), 2);
    }

    #[test]
    fn test_idle_eviction_spares_persistent() {
        let rt = runtime();
        let source = Arc::new(SlowSource::new(1));
        let cache = AssetCache::with_idle_ttl(source, rt.handle().clone(), Duration::from_millis(50));

        assert!(cache.get("/idle.png", false).is_none());
        assert!(cache.get("/keep.png", true).is_none());
        assert!(wait_for(&cache, "/idle.png").is_some());
        wait_idle(&cache, "/keep.png");
        assert!(cache.contains("/keep.png"));

        let later = Instant::now() + Duration::from_secs(1);
        assert_eq!(cache.sweep(later), 1);
        assert!(!cache.contains("/idle.png"));
        assert!(cache.contains("/keep.png"));

        assert!(cache.invalidate("/keep.png"));
        assert!(!cache.contains("/keep.png"));
        assert!(!cache.invalidate("/keep.png"));
    }

    #[test]
    fn test_evicted_image_outlives_cache_entry() {
        let rt = runtime();
        let cache = AssetCache::new(Arc::new(SlowSource::new(1)), rt.handle().clone());
        assert!(cache.get("/held.png", false).is_none());
        let held = wait_for(&cache, "/held.png").unwrap();
        let weak = Arc::downgrade(&held);

        cache.invalidate("/held.png");
        assert!(weak.upgrade().is_some());
        drop(held);
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn test_file_source_decodes_png_and_reports_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dot.png");
        RgbaImage::from_pixel(3, 2, image::Rgba([0, 255, 0, 255]))
            .save(&path)
            .unwrap();

        let image = FileAssetSource.load(&path.to_string_lossy()).unwrap();
        assert_eq!((image.width(), image.height()), (3, 2));
        assert!(!image.is_animated());
        assert_eq!(image.frame(0).unwrap().pixels[0], 0xFF00_FF00);

        let missing = FileAssetSource.load_from_path(&dir.path().join("none.png"));
        assert!(matches!(missing, Err(AssetError::NotFound(_))));
        assert!(matches!(
            FileAssetSource.load_from_url("ftp://example.com/x.png"),
            Err(AssetError::UnsupportedScheme(_))
        ));
    }

    #[test]
    fn test_premultiplied_pixels() {
        let image = DecodedImage::from_rgba(1, 1, &[255, 255, 255, 128]);
        assert_eq!(image.frame(0).unwrap().pixels[0], 0x8080_8080);
    }

    #[test]
    fn test_animation_frame_selection() {
        let frame = |ms| ImageFrame {
            pixels: vec![0],
            delay: Duration::from_millis(ms),
        };
        let image = DecodedImage::from_frames(1, 1, vec![frame(100), frame(200), frame(100)]);
        assert!(image.is_animated());
        assert_eq!(image.duration(), Duration::from_millis(400));
        assert_eq!(image.frame_index_at(Duration::from_millis(50)), 0);
        assert_eq!(image.frame_index_at(Duration::from_millis(250)), 1);
        assert_eq!(image.frame_index_at(Duration::from_millis(350)), 2);
        assert_eq!(image.frame_index_at(Duration::from_millis(450)), 0);
        assert!((image.frame_rate() - 7.5).abs() < 1e-9);
    }
}
