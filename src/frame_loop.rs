//! Dedicated render thread
//!
//! Ticks at the profile's frame rate and runs the compositor once per tick.
//! The profile lives in an `ArcSwap`, so an editor can replace it without
//! waiting for the frame in flight.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use arc_swap::ArcSwap;
use chrono::Local;
use crossbeam::channel::{self, Receiver, Sender};

use sensor_panel_render::Surface;
use sensor_panel_types::{Profile, SensorSource};

use crate::compositor::{Compositor, FrameContext, FrameStats};

#[derive(Debug, Clone, Copy)]
pub struct FrameLoopOptions {
    /// Initial edit mode; `FrameLoop::set_edit_mode` changes it later
    pub edit_mode: bool,
    pub preview: bool,
    pub scale: f64,
    /// Stop by itself after this many ticks. Failing to draw or present
    /// the last of them ends the loop with an error.
    pub max_frames: Option<u64>,
}

impl Default for FrameLoopOptions {
    fn default() -> Self {
        Self {
            edit_mode: false,
            preview: false,
            scale: 1.0,
            max_frames: None,
        }
    }
}

/// Failed frames in a row after which the render thread gives up
pub const MAX_FAILED_FRAMES: u32 = 30;

/// Tick period for a frame rate; one millisecond early so a slow frame
/// does not push the next one a whole period back
pub fn frame_interval(frame_rate: u32) -> Duration {
    let millis = (1000 / frame_rate.max(1) as u64).saturating_sub(1).max(1);
    Duration::from_millis(millis)
}

pub struct FrameLoop {
    profile: Arc<ArcSwap<Profile>>,
    edit_mode: Arc<AtomicBool>,
    stop_tx: Sender<()>,
    handle: Option<JoinHandle<Result<u64>>>,
}

impl FrameLoop {
    /// Start rendering on a new thread.
    ///
    /// `make_surface` runs on the render thread, so backends that cannot
    /// cross threads work. `present` sees the surface after every frame that
    /// rendered, along with its 1-based tick number.
    pub fn spawn<S, F, P>(
        compositor: Compositor,
        source: Arc<dyn SensorSource>,
        profile: Profile,
        options: FrameLoopOptions,
        make_surface: F,
        present: P,
    ) -> Result<Self>
    where
        S: Surface,
        F: FnOnce() -> Result<S> + Send + 'static,
        P: FnMut(&mut S, u64, &FrameStats) -> Result<()> + Send + 'static,
    {
        let profile = Arc::new(ArcSwap::from_pointee(profile));
        let edit_mode = Arc::new(AtomicBool::new(options.edit_mode));
        let (stop_tx, stop_rx) = channel::bounded(1);

        let worker = Worker {
            compositor,
            source,
            profile: profile.clone(),
            edit_mode: edit_mode.clone(),
            options,
        };
        let handle = std::thread::Builder::new()
            .name("sensor-panel-render".to_string())
            .spawn(move || worker.run(stop_rx, make_surface, present))?;

        Ok(Self {
            profile,
            edit_mode,
            stop_tx,
            handle: Some(handle),
        })
    }

    /// Profile the next frame will draw
    pub fn profile(&self) -> Arc<Profile> {
        self.profile.load_full()
    }

    pub fn set_profile(&self, profile: Profile) {
        log::debug!("Swapping in profile '{}'", profile.name);
        self.profile.store(Arc::new(profile));
    }

    pub fn set_edit_mode(&self, edit_mode: bool) {
        self.edit_mode.store(edit_mode, Ordering::Relaxed);
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, |h| h.is_finished())
    }

    /// Ask the thread to stop and wait for it; returns frames rendered
    pub fn stop(mut self) -> Result<u64> {
        // Already-exited threads have dropped the receiver
        let _ = self.stop_tx.try_send(());
        self.join_inner()
    }

    /// Wait for a loop started with `max_frames` to finish by itself;
    /// returns frames rendered
    pub fn join(mut self) -> Result<u64> {
        self.join_inner()
    }

    fn join_inner(&mut self) -> Result<u64> {
        match self.handle.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| anyhow!("Render thread panicked"))?,
            None => Ok(0),
        }
    }
}

impl Drop for FrameLoop {
    fn drop(&mut self) {
        if self.handle.is_some() {
            let _ = self.stop_tx.try_send(());
            if let Err(e) = self.join_inner() {
                log::warn!("Render thread ended with error: {:#}", e);
            }
        }
    }
}

struct Worker {
    compositor: Compositor,
    source: Arc<dyn SensorSource>,
    profile: Arc<ArcSwap<Profile>>,
    edit_mode: Arc<AtomicBool>,
    options: FrameLoopOptions,
}

impl Worker {
    fn run<S, F, P>(mut self, stop_rx: Receiver<()>, make_surface: F, mut present: P) -> Result<u64>
    where
        S: Surface,
        F: FnOnce() -> Result<S>,
        P: FnMut(&mut S, u64, &FrameStats) -> Result<()>,
    {
        let mut surface = make_surface()?;
        let started = Instant::now();
        let mut frame_rate = self.profile.load().frame_rate();
        let mut ticker = channel::tick(frame_interval(frame_rate));
        let mut ticks = 0u64;
        let mut frames = 0u64;
        let mut failed_in_row = 0u32;
        log::info!("Render thread started at {} fps", frame_rate);

        loop {
            let tick = crossbeam::select! {
                recv(stop_rx) -> _ => None,
                recv(ticker) -> tick => tick.ok(),
            };
            let Some(now) = tick else { break };
            let profile = self.profile.load_full();

            let ctx = FrameContext::new(now, now.saturating_duration_since(started), Local::now())
                .editing(self.edit_mode.load(Ordering::Relaxed))
                .previewing(self.options.preview)
                .scaled(self.options.scale);
            ticks += 1;
            let last = self.options.max_frames.is_some_and(|max| ticks >= max);
            match self.compositor.run(&profile, &mut surface, self.source.as_ref(), &ctx) {
                Ok(stats) => {
                    failed_in_row = 0;
                    frames += 1;
                    if let Err(e) = present(&mut surface, ticks, &stats) {
                        if self.options.max_frames.is_some() {
                            return Err(e.context(format!("Failed to present frame {}", ticks)));
                        }
                        log::warn!("Failed to present frame {}: {:#}", ticks, e);
                    }
                }
                Err(e) => {
                    failed_in_row += 1;
                    if last || failed_in_row >= MAX_FAILED_FRAMES {
                        return Err(e.context(format!("Render failed {} frame(s) in a row", failed_in_row)));
                    }
                    log::warn!("Frame failed: {:#}", e);
                }
            }

            if last {
                break;
            }
            if profile.frame_rate() != frame_rate {
                frame_rate = profile.frame_rate();
                ticker = channel::tick(frame_interval(frame_rate));
                log::debug!("Frame rate changed to {} fps", frame_rate);
            }
        }

        log::info!("Render thread exiting after {} frames", frames);
        Ok(frames)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::RendererSettings;
    use crate::test_support::{Fault, FaultySurface};
    use sensor_panel_core::{AssetCache, FileAssetSource, SensorValueCache, SMOOTHING_TTL};
    use sensor_panel_render::RecordingSurface;
    use sensor_panel_types::{DisplayItem, NullSensorSource, TextItem};
    use std::sync::atomic::AtomicU64;
    use std::sync::Mutex;

    fn compositor(rt: &tokio::runtime::Runtime) -> Compositor {
        Compositor::new(
            Arc::new(SensorValueCache::new(SMOOTHING_TTL)),
            AssetCache::new(Arc::new(FileAssetSource), rt.handle().clone()),
            RendererSettings::default(),
        )
    }

    fn runtime() -> tokio::runtime::Runtime {
        tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .unwrap()
    }

    fn fast_profile() -> Profile {
        let mut profile = Profile::new("loop", 64, 64);
        profile.target_frame_rate = 200;
        profile
    }

    #[test]
    fn test_frame_interval() {
        assert_eq!(frame_interval(30), Duration::from_millis(32));
        assert_eq!(frame_interval(60), Duration::from_millis(15));
        assert_eq!(frame_interval(1000), Duration::from_millis(1));
        assert_eq!(frame_interval(0), Duration::from_millis(999));
    }

    #[test]
    fn test_runs_requested_frames() {
        let rt = runtime();
        let options = FrameLoopOptions {
            max_frames: Some(3),
            ..Default::default()
        };
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let frame_loop = FrameLoop::spawn(
            compositor(&rt),
            Arc::new(NullSensorSource),
            fast_profile(),
            options,
            || Ok(RecordingSurface::new(64.0, 64.0)),
            move |surface: &mut RecordingSurface, frame, _stats| {
                sink.lock().unwrap().push((frame, surface.frames()));
                Ok(())
            },
        )
        .unwrap();

        assert_eq!(frame_loop.join().unwrap(), 3);
        assert_eq!(*seen.lock().unwrap(), vec![(1, 1), (2, 2), (3, 3)]);
    }

    #[test]
    fn test_swapped_profile_is_drawn() {
        let rt = runtime();
        let texts = Arc::new(Mutex::new(Vec::<String>::new()));
        let sink = texts.clone();
        let frame_loop = FrameLoop::spawn(
            compositor(&rt),
            Arc::new(NullSensorSource),
            fast_profile(),
            FrameLoopOptions::default(),
            || Ok(RecordingSurface::new(64.0, 64.0)),
            move |surface: &mut RecordingSurface, _frame, _stats| {
                let drawn = surface.take_commands();
                let mut texts = sink.lock().unwrap();
                for command in drawn {
                    if let sensor_panel_render::DrawCommand::Text { text, .. } = command {
                        texts.push(text);
                    }
                }
                Ok(())
            },
        )
        .unwrap();

        let mut profile = fast_profile();
        let mut label = TextItem::literal("swapped");
        label.base.width = 64;
        label.base.height = 20;
        profile.items.push(DisplayItem::Text(label));
        frame_loop.set_profile(profile);
        assert_eq!(frame_loop.profile().item_count(), 1);

        for _ in 0..200 {
            if !texts.lock().unwrap().is_empty() {
                break;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        let frames = frame_loop.stop().unwrap();
        assert!(frames >= 1);
        assert_eq!(texts.lock().unwrap().first().map(String::as_str), Some("swapped"));
    }

    #[test]
    fn test_surface_failure_ends_thread_with_error() {
        let rt = runtime();
        let frame_loop = FrameLoop::spawn(
            compositor(&rt),
            Arc::new(NullSensorSource),
            fast_profile(),
            FrameLoopOptions::default(),
            || -> Result<RecordingSurface> { Err(anyhow!("no display")) },
            |_: &mut RecordingSurface, _, _| Ok(()),
        )
        .unwrap();
        assert!(frame_loop.stop().is_err());
    }

    #[test]
    fn test_render_failures_end_unbounded_loop() {
        let rt = runtime();
        let frame_loop = FrameLoop::spawn(
            compositor(&rt),
            Arc::new(NullSensorSource),
            fast_profile(),
            FrameLoopOptions::default(),
            || Ok(FaultySurface::new(Fault::Clear, 64.0, 64.0)),
            |_: &mut FaultySurface, _, _| Ok(()),
        )
        .unwrap();
        let err = frame_loop.join().unwrap_err();
        assert!(format!("{:#}", err).contains("surface lost"));
    }

    #[test]
    fn test_failed_last_frame_is_error() {
        let rt = runtime();
        let options = FrameLoopOptions {
            max_frames: Some(2),
            ..Default::default()
        };
        let frame_loop = FrameLoop::spawn(
            compositor(&rt),
            Arc::new(NullSensorSource),
            fast_profile(),
            options,
            || Ok(FaultySurface::new(Fault::Clear, 64.0, 64.0)),
            |_: &mut FaultySurface, _, _| Ok(()),
        )
        .unwrap();
        assert!(frame_loop.join().is_err());
    }

    #[test]
    fn test_present_failure_fails_bounded_run() {
        let rt = runtime();
        let options = FrameLoopOptions {
            max_frames: Some(1),
            ..Default::default()
        };
        let frame_loop = FrameLoop::spawn(
            compositor(&rt),
            Arc::new(NullSensorSource),
            fast_profile(),
            options,
            || Ok(RecordingSurface::new(64.0, 64.0)),
            |_: &mut RecordingSurface, _, _| Err(anyhow!("disk full")),
        )
        .unwrap();
        let err = frame_loop.join().unwrap_err();
        assert!(format!("{:#}", err).contains("disk full"));
    }

    #[test]
    fn test_present_failure_logged_when_unbounded() {
        let rt = runtime();
        let attempts = Arc::new(AtomicU64::new(0));
        let counter = attempts.clone();
        let frame_loop = FrameLoop::spawn(
            compositor(&rt),
            Arc::new(NullSensorSource),
            fast_profile(),
            FrameLoopOptions::default(),
            || Ok(RecordingSurface::new(64.0, 64.0)),
            move |_: &mut RecordingSurface, _, _| {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(anyhow!("window closed"))
            },
        )
        .unwrap();

        for _ in 0..200 {
            if attempts.load(Ordering::SeqCst) >= 2 {
                break;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        assert!(!frame_loop.is_finished());
        assert!(frame_loop.stop().unwrap() >= 2);
    }
}
