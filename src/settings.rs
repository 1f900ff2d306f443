//! Renderer settings
//!
//! Loaded from `settings.json` in the platform config directory, falling
//! back to defaults when the file does not exist.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use sensor_panel_core::{ASSET_IDLE_TTL, SAMPLE_QUEUE_CAPACITY, SMOOTHING_SECONDS, SMOOTHING_TTL};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RendererSettings {
    /// Unused non-persistent images are evicted after this long
    #[serde(default = "default_asset_idle_ttl_ms")]
    pub asset_idle_ttl_ms: u64,
    /// Smoothed gauge values are forgotten after this long without a frame
    #[serde(default = "default_smoothing_ttl_ms")]
    pub smoothing_ttl_ms: u64,
    /// Gauges ease over this many seconds' worth of frames
    #[serde(default = "default_smoothing_seconds")]
    pub smoothing_seconds: u32,
    /// Show the FPS overlay regardless of the profile setting
    #[serde(default)]
    pub show_fps: bool,
}

fn default_asset_idle_ttl_ms() -> u64 {
    ASSET_IDLE_TTL.as_millis() as u64
}

fn default_smoothing_ttl_ms() -> u64 {
    SMOOTHING_TTL.as_millis() as u64
}

fn default_smoothing_seconds() -> u32 {
    SMOOTHING_SECONDS
}

impl Default for RendererSettings {
    fn default() -> Self {
        Self {
            asset_idle_ttl_ms: default_asset_idle_ttl_ms(),
            smoothing_ttl_ms: default_smoothing_ttl_ms(),
            smoothing_seconds: default_smoothing_seconds(),
            show_fps: false,
        }
    }
}

impl RendererSettings {
    /// Load settings from the config directory
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if !path.exists() {
            log::debug!("No settings at {:?}, using defaults", path);
            return Ok(Self::default());
        }
        Self::load_from_path(&path)
    }

    /// Save settings to the config directory
    pub fn save(&self) -> Result<()> {
        self.save_to_path(&Self::config_path()?)
    }

    /// Get the settings file path
    pub fn config_path() -> Result<PathBuf> {
        let dirs = directories::ProjectDirs::from("org", "sensor-panel", "sensor-panel")
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        Ok(dirs.config_dir().join("settings.json"))
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let settings = serde_json::from_str(&content)?;
        log::info!("Loaded renderer settings from {:?}", path);
        Ok(settings)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn asset_idle_ttl(&self) -> Duration {
        Duration::from_millis(self.asset_idle_ttl_ms)
    }

    pub fn smoothing_ttl(&self) -> Duration {
        Duration::from_millis(self.smoothing_ttl_ms)
    }

    /// Easing length in frames at `frame_rate`
    pub fn smoothing_cycles(&self, frame_rate: u32) -> u32 {
        frame_rate.saturating_mul(self.smoothing_seconds)
    }

    /// Per-sensor sample history length; fixed
    pub fn sample_queue_capacity(&self) -> usize {
        SAMPLE_QUEUE_CAPACITY
    }
}
