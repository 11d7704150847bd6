use crate::config::{CrabRecorderConfig, PlaybackConfig, RecordingConfig, StorageConfig};
use crate::errors::RecorderError;
use std::sync::{Arc, RwLock};
use tauri::command;

lazy_static::lazy_static! {
    static ref GLOBAL_CONFIG: Arc<RwLock<CrabRecorderConfig>> = Arc::new(RwLock::new(CrabRecorderConfig::load_or_default()));
}

/// Snapshot of the process-wide configuration
pub fn current_config() -> CrabRecorderConfig {
    GLOBAL_CONFIG
        .read()
        .map(|config| config.clone())
        .unwrap_or_else(|e| e.into_inner().clone())
}

fn store_config(new_config: CrabRecorderConfig) -> Result<(), RecorderError> {
    new_config.validate().map_err(RecorderError::ConfigError)?;

    {
        let mut config = GLOBAL_CONFIG
            .write()
            .map_err(|e| RecorderError::Internal(format!("Failed to write config: {}", e)))?;
        *config = new_config.clone();
    }

    super::recorder::apply_config(&new_config)?;
    new_config.save_to_file(CrabRecorderConfig::default_path())
}

/// Get the current configuration
#[command]
pub async fn get_config() -> Result<CrabRecorderConfig, RecorderError> {
    Ok(current_config())
}

/// Replace the configuration, persist it, and apply it to new sessions
#[command]
pub async fn update_config(new_config: CrabRecorderConfig) -> Result<(), RecorderError> {
    store_config(new_config)
}

/// Reset configuration to defaults
#[command]
pub async fn reset_config() -> Result<CrabRecorderConfig, RecorderError> {
    let default_config = CrabRecorderConfig::default();
    store_config(default_config.clone())?;
    Ok(default_config)
}

/// Update only the recording section
#[command]
pub async fn update_recording_config(recording: RecordingConfig) -> Result<(), RecorderError> {
    let mut config = current_config();
    config.recording = recording;
    store_config(config)
}

/// Update only the playback section
#[command]
pub async fn update_playback_config(playback: PlaybackConfig) -> Result<(), RecorderError> {
    let mut config = current_config();
    config.playback = playback;
    store_config(config)
}

/// Update only the storage section
#[command]
pub async fn update_storage_config(storage: StorageConfig) -> Result<(), RecorderError> {
    let mut config = current_config();
    config.storage = storage;
    store_config(config)
}
