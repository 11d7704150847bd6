//! Configuration management for CrabRecorder
//!
//! Capture parameters, playback preferences and the recordings directory.
//! Settings live in `crabrecorder.toml`; environment variables of the form
//! `CRABRECORDER__<SECTION>__<KEY>` override file values when loaded through
//! [`CrabRecorderConfig::load_layered`].

use crate::errors::RecorderError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment prefix for layered overrides
pub const ENV_PREFIX: &str = "CRABRECORDER";

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrabRecorderConfig {
    pub recording: RecordingConfig,
    pub playback: PlaybackConfig,
    pub storage: StorageConfig,
}

/// Microphone capture configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordingConfig {
    /// Input device name, `None` for the system default
    pub input_device: Option<String>,
    /// Sample rate in Hz, 0 to use the device default
    pub sample_rate: u32,
    /// Channel count, 0 to use the device default
    pub channels: u16,
}

/// Playback configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Output device name, `None` for the system default
    pub output_device: Option<String>,
    /// Linear gain applied to decoded samples (0.0-2.0)
    pub volume: f32,
}

/// Storage configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Recordings directory; falls back to the app cache directory
    pub cache_directory: Option<String>,
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            input_device: None,
            sample_rate: 0,
            channels: 1,
        }
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            output_device: None,
            volume: 1.0,
        }
    }
}

impl CrabRecorderConfig {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, RecorderError> {
        let path = path.as_ref();

        if !path.exists() {
            log::info!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path).map_err(|e| {
            RecorderError::ConfigError(format!("Failed to read config file: {}", e))
        })?;

        let config: CrabRecorderConfig = toml::from_str(&contents).map_err(|e| {
            RecorderError::ConfigError(format!("Failed to parse config file: {}", e))
        })?;

        log::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Load the TOML file (if present) and apply environment overrides
    pub fn load_layered<P: AsRef<Path>>(path: P) -> Result<Self, RecorderError> {
        let path = path.as_ref();
        let settings = ::config::Config::builder()
            .add_source(::config::File::from(path.to_path_buf()).required(false))
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| RecorderError::ConfigError(format!("Failed to load config: {}", e)))?;

        let loaded: CrabRecorderConfig = settings
            .try_deserialize()
            .map_err(|e| RecorderError::ConfigError(format!("Invalid config: {}", e)))?;

        loaded.validate().map_err(RecorderError::ConfigError)?;
        Ok(loaded)
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), RecorderError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| {
                    RecorderError::ConfigError(format!("Failed to create config directory: {}", e))
                })?;
            }
        }

        let toml_string = toml::to_string_pretty(self).map_err(|e| {
            RecorderError::ConfigError(format!("Failed to serialize config: {}", e))
        })?;

        fs::write(path, toml_string).map_err(|e| {
            RecorderError::ConfigError(format!("Failed to write config file: {}", e))
        })?;

        log::info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Get default config file path
    pub fn default_path() -> PathBuf {
        PathBuf::from("crabrecorder.toml")
    }

    /// Load from default location or fall back to defaults
    pub fn load_or_default() -> Self {
        Self::load_layered(Self::default_path()).unwrap_or_else(|e| {
            log::warn!("Failed to load config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        let rate = self.recording.sample_rate;
        if rate != 0 && !(8_000..=192_000).contains(&rate) {
            return Err("Sample rate must be 0 (device default) or 8000-192000 Hz".to_string());
        }
        if self.recording.channels > 2 {
            return Err("Channels must be 0 (device default), 1 or 2".to_string());
        }
        if !(0.0..=2.0).contains(&self.playback.volume) {
            return Err("Volume must be between 0.0 and 2.0".to_string());
        }
        if let Some(dir) = &self.storage.cache_directory {
            if dir.trim().is_empty() {
                return Err("Cache directory must not be empty".to_string());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Layered loads read the process environment
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_default_config() {
        let config = CrabRecorderConfig::default();
        assert_eq!(config.recording.sample_rate, 0);
        assert_eq!(config.recording.channels, 1);
        assert_eq!(config.playback.volume, 1.0);
        assert!(config.storage.cache_directory.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut bad_rate = CrabRecorderConfig::default();
        bad_rate.recording.sample_rate = 100;
        assert!(bad_rate.validate().is_err());

        let mut bad_channels = CrabRecorderConfig::default();
        bad_channels.recording.channels = 6;
        assert!(bad_channels.validate().is_err());

        let mut bad_volume = CrabRecorderConfig::default();
        bad_volume.playback.volume = 3.0;
        assert!(bad_volume.validate().is_err());

        let mut blank_dir = CrabRecorderConfig::default();
        blank_dir.storage.cache_directory = Some("  ".to_string());
        assert!(blank_dir.validate().is_err());
    }

    #[test]
    fn test_config_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("crabrecorder.toml");

        let mut config = CrabRecorderConfig::default();
        config.recording.sample_rate = 44_100;
        config.storage.cache_directory = Some("/tmp/recordings".to_string());
        config.save_to_file(&config_path).unwrap();

        let loaded = CrabRecorderConfig::load_from_file(&config_path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_config_toml_sections() {
        let toml_string = toml::to_string_pretty(&CrabRecorderConfig::default()).unwrap();
        assert!(toml_string.contains("[recording]"));
        assert!(toml_string.contains("[playback]"));
        assert!(toml_string.contains("[storage]"));
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("partial.toml");
        fs::write(&config_path, "[playback]\nvolume = 0.5\n").unwrap();

        let _env = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let loaded = CrabRecorderConfig::load_layered(&config_path).unwrap();
        assert_eq!(loaded.playback.volume, 0.5);
        assert_eq!(loaded.recording.channels, 1);
    }

    #[test]
    fn test_environment_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("layered.toml");
        fs::write(&config_path, "[playback]\nvolume = 0.5\n").unwrap();

        let _env = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        std::env::set_var("CRABRECORDER__PLAYBACK__VOLUME", "0.25");
        let loaded = CrabRecorderConfig::load_layered(&config_path);
        std::env::remove_var("CRABRECORDER__PLAYBACK__VOLUME");

        let loaded = loaded.unwrap();
        assert_eq!(loaded.playback.volume, 0.25);
        assert_eq!(loaded.recording.channels, 1);
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = CrabRecorderConfig::load_from_file("nonexistent_file.toml");
        assert_eq!(result.unwrap(), CrabRecorderConfig::default());
    }
}
