//! Sensor value cache: rolling sample queues for charts and eased values
//! for gauges.
//!
//! Queues are keyed by sensor identity and each carries its own lock, so a
//! push for one sensor never waits on a snapshot of another. The map of
//! queues is only write-locked when a sensor is seen for the first time.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, Instant};

use sensor_panel_types::{SensorId, SensorSource};
use uuid::Uuid;

use crate::constants::{SAMPLE_QUEUE_CAPACITY, SMOOTHING_SNAP_THRESHOLD, SMOOTHING_TTL};
use crate::sync;

/// One sensor's sample history, oldest first
pub type SampleQueue = Arc<Mutex<VecDeque<f64>>>;

/// Ease `last` toward `target` so that `cycles` further calls (each with one
/// fewer remaining cycle) land within the snap threshold.
///
/// Snaps straight to `target` when `cycles <= 0` or the gap is already
/// within the threshold.
pub fn smooth(last: f64, target: f64, cycles: i64) -> f64 {
    let gap = (target - last).abs();
    if cycles <= 0 || gap <= SMOOTHING_SNAP_THRESHOLD || !gap.is_finite() {
        return target;
    }
    let decay = (SMOOTHING_SNAP_THRESHOLD / gap).powf(1.0 / cycles as f64);
    let t = (1.0 - decay).clamp(0.0, 1.0);
    last + (target - last) * t
}

#[derive(Debug, Clone, Copy)]
struct SmoothedValue {
    value: f64,
    target: f64,
    remaining: u32,
    touched: Instant,
}

/// Per-item last rendered value with a short TTL
#[derive(Debug)]
pub struct SmoothingCache {
    entries: Mutex<HashMap<Uuid, SmoothedValue>>,
    ttl: Duration,
}

impl Default for SmoothingCache {
    fn default() -> Self {
        Self::new(SMOOTHING_TTL)
    }
}

impl SmoothingCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// Advance the eased value for `item` one frame toward `target`.
    ///
    /// An item with no live entry starts from 0. A new target restarts the
    /// countdown of `cycles` frames.
    pub fn ease(&self, item: Uuid, target: f64, cycles: u32, now: Instant) -> f64 {
        let mut entries = sync::lock(&self.entries, "Smoothing cache");
        let mut entry = entries
            .get(&item)
            .copied()
            .filter(|e| now.saturating_duration_since(e.touched) <= self.ttl)
            .unwrap_or(SmoothedValue {
                value: 0.0,
                target,
                remaining: cycles,
                touched: now,
            });

        if entry.target != target {
            entry.target = target;
            entry.remaining = cycles;
        }
        entry.value = smooth(entry.value, target, entry.remaining as i64);
        entry.remaining = entry.remaining.saturating_sub(1);
        entry.touched = now;
        entries.insert(item, entry);
        entry.value
    }

    /// Last eased value for an item, if still live
    pub fn value(&self, item: Uuid, now: Instant) -> Option<f64> {
        sync::lock(&self.entries, "Smoothing cache")
            .get(&item)
            .filter(|e| now.saturating_duration_since(e.touched) <= self.ttl)
            .map(|e| e.value)
    }

    /// Drop entries idle past the TTL; returns how many were removed
    pub fn sweep(&self, now: Instant) -> usize {
        let mut entries = sync::lock(&self.entries, "Smoothing cache");
        let before = entries.len();
        entries.retain(|_, e| now.saturating_duration_since(e.touched) <= self.ttl);
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        sync::lock(&self.entries, "Smoothing cache").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Shared stopwatch that opens at most once per interval
#[derive(Debug, Default)]
pub struct SampleGate {
    last_open: Mutex<Option<Instant>>,
}

impl SampleGate {
    /// True (and restarts the stopwatch) when `interval` has elapsed since the
    /// last opening, or on the first call
    pub fn try_open(&self, interval: Duration, now: Instant) -> bool {
        let mut last = sync::lock(&self.last_open, "Sample gate");
        match *last {
            Some(previous) if now.saturating_duration_since(previous) < interval => false,
            _ => {
                *last = Some(now);
                true
            }
        }
    }
}

/// Rolling sample queues, the smoothing cache and the sampling gate
pub struct SensorValueCache {
    queues: RwLock<HashMap<String, SampleQueue>>,
    capacity: usize,
    smoothing: SmoothingCache,
    gate: SampleGate,
}

impl Default for SensorValueCache {
    fn default() -> Self {
        Self::new(SMOOTHING_TTL)
    }
}

impl SensorValueCache {
    pub fn new(smoothing_ttl: Duration) -> Self {
        Self::with_capacity(SAMPLE_QUEUE_CAPACITY, smoothing_ttl)
    }

    pub fn with_capacity(capacity: usize, smoothing_ttl: Duration) -> Self {
        Self {
            queues: RwLock::new(HashMap::new()),
            capacity: capacity.max(1),
            smoothing: SmoothingCache::new(smoothing_ttl),
            gate: SampleGate::default(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn smoothing(&self) -> &SmoothingCache {
        &self.smoothing
    }

    /// Queue for a sensor, created empty on first use.
    /// The same identity always yields the same queue.
    pub fn get_or_create_queue(&self, id: &SensorId) -> SampleQueue {
        let key = id.key();
        if let Some(queue) = sync::read(&self.queues, "Sample queues").get(&key) {
            return queue.clone();
        }
        sync::write(&self.queues, "Sample queues")
            .entry(key)
            .or_insert_with(|| {
                log::debug!("Created sample queue for {}", id);
                Arc::new(Mutex::new(VecDeque::new()))
            })
            .clone()
    }

    /// Append a sample, trimming the oldest beyond capacity
    pub fn push_sample(&self, id: &SensorId, value: f64) {
        let queue = self.get_or_create_queue(id);
        let mut samples = sync::lock(&queue, "Sample queue");
        samples.push_back(value);
        while samples.len() > self.capacity {
            samples.pop_front();
        }
    }

    /// Copy of a sensor's history, oldest first; empty when never sampled.
    /// The queue lock is released before the caller lays anything out.
    pub fn snapshot(&self, id: &SensorId) -> Vec<f64> {
        let queue = match sync::read(&self.queues, "Sample queues").get(&id.key()) {
            Some(queue) => queue.clone(),
            None => return Vec::new(),
        };
        let samples = sync::lock(&queue, "Sample queue");
        samples.iter().copied().collect()
    }

    /// Most recent sample, if any
    pub fn latest(&self, id: &SensorId) -> Option<f64> {
        let queue = sync::read(&self.queues, "Sample queues").get(&id.key())?.clone();
        let samples = sync::lock(&queue, "Sample queue");
        samples.back().copied()
    }

    /// Pull one sample per distinct sensor from `source`, at most once per
    /// `interval`. Returns whether the gate opened.
    ///
    /// Sensors without a reading are skipped rather than sampled as zero.
    pub fn sample<'a>(
        &self,
        ids: impl IntoIterator<Item = &'a SensorId>,
        source: &dyn SensorSource,
        interval: Duration,
        now: Instant,
    ) -> bool {
        if !self.gate.try_open(interval, now) {
            return false;
        }
        let mut seen = HashSet::new();
        for id in ids {
            if !seen.insert(id.key()) {
                continue;
            }
            match source.read(id) {
                Some(reading) => self.push_sample(id, reading.value_now),
                None => log::trace!("No sample for {}", id),
            }
        }
        true
    }

    pub fn queue_count(&self) -> usize {
        sync::read(&self.queues, "Sample queues").len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sensor_panel_types::SensorReading;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const EPS: f64 = 1e-9;

    #[test]
    fn test_queue_lookup_is_idempotent() {
        let cache = SensorValueCache::default();
        let a = cache.get_or_create_queue(&SensorId::plugin("cpu"));
        let b = cache.get_or_create_queue(&SensorId::plugin("cpu"));
        let c = cache.get_or_create_queue(&SensorId::aida("cpu"));
        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(cache.queue_count(), 2);
    }

    #[test]
    fn test_queue_trims_oldest_first() {
        let cache = SensorValueCache::default();
        let id = SensorId::hardware("cpu0", "temp");
        for i in 0..5000 {
            cache.push_sample(&id, i as f64);
        }
        let samples = cache.snapshot(&id);
        assert_eq!(samples.len(), SAMPLE_QUEUE_CAPACITY);
        assert_eq!(samples[0], (5000 - SAMPLE_QUEUE_CAPACITY) as f64);
        assert_eq!(*samples.last().unwrap(), 4999.0);
        assert_eq!(cache.latest(&id), Some(4999.0));
    }

    #[test]
    fn test_snapshot_of_unknown_sensor_is_empty() {
        let cache = SensorValueCache::default();
        assert!(cache.snapshot(&SensorId::plugin("nope")).is_empty());
        assert_eq!(cache.queue_count(), 0);
    }

    #[test]
    fn test_smooth_snaps_on_degenerate_input() {
        assert_eq!(smooth(3.0, 80.0, 0), 80.0);
        assert_eq!(smooth(3.0, 80.0, -4), 80.0);
        assert_eq!(smooth(50.0005, 50.0, 10), 50.0);
    }

    #[test]
    fn test_smooth_converges_within_cycles() {
        for &(start, target, cycles) in &[(0.0, 50.0, 30), (100.0, -20.0, 7), (1.0, 1.5, 90)] {
            let mut value = start;
            for remaining in (1..=cycles).rev() {
                value = smooth(value, target, remaining);
            }
            assert!((value - target).abs() <= SMOOTHING_SNAP_THRESHOLD + EPS);
        }
    }

    #[test]
    fn test_smooth_moves_monotonically() {
        let mut value = 0.0;
        for remaining in (1..=10).rev() {
            let next = smooth(value, 10.0, remaining);
            assert!(next > value && next <= 10.0);
            value = next;
        }
    }

    #[test]
    fn test_ease_starts_from_zero_and_converges() {
        let cache = SmoothingCache::default();
        let item = Uuid::new_v4();
        let now = Instant::now();
        let first = cache.ease(item, 50.0, 30, now);
        assert!(first > 0.0 && first < 50.0);

        let mut value = first;
        for _ in 1..30 {
            value = cache.ease(item, 50.0, 30, now);
        }
        assert!((value - 50.0).abs() <= SMOOTHING_SNAP_THRESHOLD + EPS);
    }

    #[test]
    fn test_ease_new_target_restarts_countdown() {
        let cache = SmoothingCache::default();
        let item = Uuid::new_v4();
        let now = Instant::now();
        for _ in 0..10 {
            cache.ease(item, 100.0, 10, now);
        }
        let settled = cache.value(item, now).unwrap();
        let moved = cache.ease(item, 0.0, 10, now);
        assert!(moved < settled && moved > 0.0);
    }

    #[test]
    fn test_expired_entry_restarts_from_zero() {
        let cache = SmoothingCache::new(Duration::from_millis(100));
        let item = Uuid::new_v4();
        let start = Instant::now();
        for _ in 0..5 {
            cache.ease(item, 40.0, 5, start);
        }
        let later = start + Duration::from_secs(1);
        assert_eq!(cache.value(item, later), None);
        let restarted = cache.ease(item, 40.0, 5, later);
        assert!(restarted < 40.0 - SMOOTHING_SNAP_THRESHOLD);

        assert_eq!(cache.sweep(later + Duration::from_secs(1)), 1);
        assert!(cache.is_empty());
    }

    struct Counting {
        reads: AtomicUsize,
    }

    impl SensorSource for Counting {
        fn read(&self, id: &SensorId) -> Option<SensorReading> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            match id {
                SensorId::Plugin { .. } => Some(SensorReading::numeric(7.0, "")),
                _ => None,
            }
        }
    }

    #[test]
    fn test_sampling_gate_throttles_and_dedupes() {
        let cache = SensorValueCache::default();
        let source = Counting {
            reads: AtomicUsize::new(0),
        };
        let cpu = SensorId::plugin("cpu");
        let gone = SensorId::aida("gone");
        let ids = [cpu.clone(), cpu.clone(), gone.clone()];
        let interval = Duration::from_millis(500);
        let start = Instant::now();

        assert!(cache.sample(&ids, &source, interval, start));
        assert_eq!(source.reads.load(Ordering::SeqCst), 2);
        assert_eq!(cache.snapshot(&cpu), vec![7.0]);
        assert!(cache.snapshot(&gone).is_empty());

        assert!(!cache.sample(&ids, &source, interval, start + Duration::from_millis(100)));
        assert_eq!(cache.snapshot(&cpu).len(), 1);

        assert!(cache.sample(&ids, &source, interval, start + Duration::from_millis(600)));
        assert_eq!(cache.snapshot(&cpu).len(), 2);
    }

    #[test]
    fn test_concurrent_pushes_keep_every_sample() {
        let cache = Arc::new(SensorValueCache::default());
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let cache = cache.clone();
                std::thread::spawn(move || {
                    let id = SensorId::plugin(format!("s{}", t % 2));
                    for i in 0..500 {
                        cache.push_sample(&id, i as f64);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(cache.snapshot(&SensorId::plugin("s0")).len(), 1000);
        assert_eq!(cache.snapshot(&SensorId::plugin("s1")).len(), 1000);
    }
}
