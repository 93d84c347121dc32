use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use camsight_core::detection::domain::detector_adapter::DetectorKind;
use camsight_core::detection::domain::hand_landmark_model::HandModelConfig;
use camsight_core::shared::constants::DEFAULT_CAMERA_INDEX;

/// Detector selection as persisted on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StartupDetector {
    None,
    Hand,
    Face,
}

impl StartupDetector {
    pub fn kind(self) -> Option<DetectorKind> {
        match self {
            StartupDetector::Hand => Some(DetectorKind::Hand),
            StartupDetector::Face => Some(DetectorKind::Face),
            StartupDetector::None => None,
        }
    }

    pub fn from_kind(kind: Option<DetectorKind>) -> Self {
        match kind {
            Some(DetectorKind::Hand) => StartupDetector::Hand,
            Some(DetectorKind::Face) => StartupDetector::Face,
            None => StartupDetector::None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub camera_index: u32,
    pub detector: StartupDetector,
    pub max_hands: usize,
    /// Percent, 0-100.
    pub detection_confidence: u32,
    /// Percent, 0-100.
    pub tracking_confidence: u32,
    pub static_mode: bool,
    pub last_file: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            camera_index: DEFAULT_CAMERA_INDEX,
            detector: StartupDetector::None,
            max_hands: 2,
            detection_confidence: 50,
            tracking_confidence: 50,
            static_mode: false,
            last_file: None,
        }
    }
}

impl Settings {
    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("CamSight").join("settings.json"))
    }

    pub fn load() -> Self {
        Self::config_path()
            .map(|path| Self::load_from(&path))
            .unwrap_or_default()
    }

    pub fn save(&self) {
        if let Some(path) = Self::config_path() {
            if let Err(e) = self.save_to(&path) {
                log::warn!("Failed to save settings to {}: {e}", path.display());
            }
        }
    }

    /// Reads settings from `path`, falling back to defaults if the file is
    /// missing or unreadable.
    pub fn load_from(path: &Path) -> Self {
        fs::read_to_string(path)
            .ok()
            .and_then(|json| serde_json::from_str(&json).ok())
            .unwrap_or_default()
    }

    pub fn save_to(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn hand_config(&self) -> HandModelConfig {
        let defaults = HandModelConfig::default();
        let config = HandModelConfig {
            static_mode: self.static_mode,
            max_hands: self.max_hands,
            detection_confidence: self.detection_confidence.min(100) as f32 / 100.0,
            tracking_confidence: self.tracking_confidence.min(100) as f32 / 100.0,
        };
        if config.validate().is_ok() {
            config
        } else {
            log::warn!("Invalid hand settings, using defaults");
            defaults
        }
    }
}

/// Remembers what was last written so unchanged settings are not rewritten.
pub struct SettingsPersistence {
    saved: Settings,
}

impl SettingsPersistence {
    pub fn new(saved: Settings) -> Self {
        Self { saved }
    }

    /// A snapshot to write if `current` differs from the last one handed
    /// out, `None` otherwise.
    pub fn pending(&mut self, current: &Settings) -> Option<Settings> {
        if *current == self.saved {
            return None;
        }
        self.saved = current.clone();
        Some(current.clone())
    }
}
