//! sensor-panel: compositing engine for hardware-monitoring overlay panels
//!
//! This crate ties the workspace together:
//! - `compositor` draws one frame of a profile onto any `Surface`
//! - `frame_loop` drives the compositor on a dedicated thread
//! - `settings` holds renderer tunables loaded from the config directory
//! - `sources` provides the built-in demo sensor source and profile

pub mod compositor;
pub mod frame_loop;
pub mod settings;
pub mod sources;

#[cfg(test)]
mod test_support;

// Re-export commonly used types
pub use compositor::{Compositor, FrameContext, FrameStats};
pub use frame_loop::{frame_interval, FrameLoop, FrameLoopOptions};
pub use settings::RendererSettings;
