use crate::constants::{
    CONFIG_DIR_NAME, DEFAULT_ENGINE_LOG_LEVEL, DEFAULT_FFMPEG_PATH, DEFAULT_RELEASE_DELAY_MS,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub last_input_dir: Option<PathBuf>,
    /// Where finished conversions are written. Falls back to the OS downloads dir.
    pub download_dir: Option<PathBuf>,
    pub prompt_for_save_location: bool,
    pub open_after_save: bool,
    pub ffmpeg_path: PathBuf,
    pub engine_log_output: bool,
    pub engine_log_level: String,
    pub release_delay_ms: u64,
    pub window_width: f32,
    pub window_height: f32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            last_input_dir: None,
            download_dir: None,
            prompt_for_save_location: false,
            open_after_save: false,
            ffmpeg_path: PathBuf::from(DEFAULT_FFMPEG_PATH),
            engine_log_output: true,
            engine_log_level: DEFAULT_ENGINE_LOG_LEVEL.to_string(),
            release_delay_ms: DEFAULT_RELEASE_DELAY_MS,
            window_width: 560.0,
            window_height: 520.0,
        }
    }
}

impl AppConfig {
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join("config.json"))
    }

    /// Loads the config from the default location, falling back to defaults.
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) if path.exists() => match Self::load_from(&path) {
                Ok(config) => {
                    tracing::info!("Config loaded from: {:?}", path);
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to read config file, using defaults: {}", e);
                    Self::default()
                }
            },
            Some(_) => {
                tracing::info!("Config file doesn't exist, using defaults");
                Self::default()
            }
            None => {
                tracing::warn!("Could not determine config directory, using defaults");
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::config_path().ok_or(ConfigError::NoConfigDir)?;
        self.save_to(&path)?;
        tracing::debug!("Config saved to: {:?}", path);
        Ok(())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn update_last_input_dir(&mut self, file: &Path) {
        if let Some(parent) = file.parent() {
            self.last_input_dir = Some(parent.to_path_buf());
        }
    }

    /// Directory used when the save dialog is not requested.
    pub fn resolve_download_dir(&self) -> PathBuf {
        self.download_dir
            .clone()
            .or_else(dirs::download_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}
