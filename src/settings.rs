// Settings management and persistence
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// How `speak` narrates a generated sentence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NarrationMode {
    /// Chain per-word clips from the clip library
    Clips,
    /// Hand the whole sentence to the speech synthesizer
    Tts,
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    pub version: i32, // Settings schema version for future migrations
    pub volume: f32,  // 0.0 to 1.0, applied to the output stream
    pub clips_dir: Option<PathBuf>,
    pub narration: NarrationMode,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            version: 1,
            volume: 0.9,
            clips_dir: None,
            narration: NarrationMode::Clips,
        }
    }
}

impl AppSettings {
    /// Get the settings file path
    pub fn settings_path(app_dir: &Path) -> PathBuf {
        app_dir.join("settings.json")
    }

    /// Load settings from file, or return defaults if file doesn't exist
    pub fn load(app_dir: &Path) -> Result<Self, String> {
        let path = Self::settings_path(app_dir);

        if !path.exists() {
            log::info!("No settings file found, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)
            .map_err(|e| format!("Failed to read settings file: {}", e))?;

        let settings: AppSettings = serde_json::from_str(&content)
            .map_err(|e| format!("Failed to parse settings: {}", e))?;

        log::info!("Loaded settings from {:?}", path);
        Ok(settings)
    }

    /// Save settings to file
    pub fn save(&self, app_dir: &Path) -> Result<(), String> {
        fs::create_dir_all(app_dir)
            .map_err(|e| format!("Failed to create settings directory: {}", e))?;

        let path = Self::settings_path(app_dir);
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize settings: {}", e))?;

        fs::write(&path, content).map_err(|e| format!("Failed to write settings file: {}", e))?;

        log::info!("Saved settings to {:?}", path);
        Ok(())
    }
}
