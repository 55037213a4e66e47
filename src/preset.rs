//! Preset persistence
//!
//! Small JSON blob holding the overlay's window geometry, opacity, and the
//! capture flags. A missing or malformed file is never fatal: the overlay
//! keeps its defaults and logs what happened.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::constants::{config, layout, timing, validation};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Preset {
    /// Window opacity in [0.0, 1.0]
    pub alpha: f32,

    /// Top-left corner of the overlay window, root coordinates
    pub window_pos: (i16, i16),

    /// Overlay window size
    pub window_size: (u16, u16),

    /// Grab keyboard devices so observed events are suppressed from the rest
    /// of the input pipeline
    pub exclusive_capture: bool,

    /// Render tick interval in milliseconds
    pub tick_ms: u64,
}

impl Default for Preset {
    fn default() -> Self {
        Self {
            alpha: 0.8,
            window_pos: (100, 100),
            window_size: (layout::WINDOW_WIDTH, layout::WINDOW_HEIGHT),
            exclusive_capture: false,
            tick_ms: timing::DEFAULT_TICK_MS,
        }
    }
}

impl Preset {
    fn preset_path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(config::APP_DIR);
        path.push(config::FILENAME);
        path
    }

    /// Load the preset from the user config dir, falling back to defaults on
    /// any read or parse failure.
    pub fn load() -> Self {
        Self::load_from(&Self::preset_path())
    }

    pub fn load_from(path: &Path) -> Self {
        let mut preset = match fs::read_to_string(path) {
            Ok(raw) => match serde_json::from_str::<Preset>(&raw) {
                Ok(preset) => {
                    info!(path = %path.display(), "Loaded preset");
                    preset
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Malformed preset, keeping defaults");
                    Self::default()
                }
            },
            Err(e) => {
                info!(path = %path.display(), error = %e, "No readable preset, keeping defaults");
                Self::default()
            }
        };
        preset.validate_and_clamp();
        preset
    }

    /// Persist the preset, creating the config directory if needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::preset_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .context(format!("Failed to create config dir {}", parent.display()))?;
        }
        let raw = serde_json::to_string_pretty(self).context("Failed to serialize preset")?;
        fs::write(path, raw).context(format!("Failed to write preset to {}", path.display()))?;
        info!(path = %path.display(), "Saved preset");
        Ok(())
    }

    /// Clamp loaded values to safe ranges.
    fn validate_and_clamp(&mut self) {
        if !self.alpha.is_finite()
            || self.alpha < validation::MIN_ALPHA
            || self.alpha > validation::MAX_ALPHA
        {
            warn!(alpha = self.alpha, "alpha out of range, clamping");
            self.alpha = self
                .alpha
                .clamp(validation::MIN_ALPHA, validation::MAX_ALPHA);
            if !self.alpha.is_finite() {
                self.alpha = Self::default().alpha;
            }
        }

        let (w, h) = self.window_size;
        if !(validation::MIN_DIMENSION..=validation::MAX_DIMENSION).contains(&w)
            || !(validation::MIN_DIMENSION..=validation::MAX_DIMENSION).contains(&h)
        {
            warn!(width = w, height = h, "window size out of range, clamping");
            self.window_size = (
                w.clamp(validation::MIN_DIMENSION, validation::MAX_DIMENSION),
                h.clamp(validation::MIN_DIMENSION, validation::MAX_DIMENSION),
            );
        }

        if !(validation::MIN_TICK_MS..=validation::MAX_TICK_MS).contains(&self.tick_ms) {
            warn!(tick_ms = self.tick_ms, "tick interval out of range, clamping");
            self.tick_ms = self
                .tick_ms
                .clamp(validation::MIN_TICK_MS, validation::MAX_TICK_MS);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_missing_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let preset = Preset::load_from(&dir.path().join("absent.json"));
        assert_eq!(preset, Preset::default());
    }

    #[test]
    fn test_load_malformed_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preset.json");
        fs::write(&path, "{ not json").unwrap();
        let preset = Preset::load_from(&path);
        assert_eq!(preset, Preset::default());
    }

    #[test]
    fn test_save_then_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("preset.json");
        let preset = Preset {
            alpha: 0.5,
            window_pos: (10, -20),
            window_size: (640, 200),
            exclusive_capture: true,
            tick_ms: 50,
        };
        preset.save_to(&path).unwrap();
        assert_eq!(Preset::load_from(&path), preset);
    }

    #[test]
    fn test_loaded_fields_use_wire_names() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preset.json");
        fs::write(
            &path,
            r#"{"alpha": 0.25, "windowPos": [5, 6], "windowSize": [400, 150]}"#,
        )
        .unwrap();
        let preset = Preset::load_from(&path);
        assert_eq!(preset.alpha, 0.25);
        assert_eq!(preset.window_pos, (5, 6));
        assert_eq!(preset.window_size, (400, 150));
        // Omitted fields fall back to defaults
        assert!(!preset.exclusive_capture);
        assert_eq!(preset.tick_ms, timing::DEFAULT_TICK_MS);
    }

    #[test]
    fn test_out_of_range_values_are_clamped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preset.json");
        fs::write(
            &path,
            r#"{"alpha": 7.5, "windowPos": [0, 0], "windowSize": [10, 9000], "tickMs": 2}"#,
        )
        .unwrap();
        let preset = Preset::load_from(&path);
        assert_eq!(preset.alpha, 1.0);
        assert_eq!(preset.window_size, (validation::MIN_DIMENSION, validation::MAX_DIMENSION));
        assert_eq!(preset.tick_ms, validation::MIN_TICK_MS);
    }
}
