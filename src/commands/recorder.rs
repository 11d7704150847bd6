//! Tauri commands for recording and playback
//!
//! All commands share one process-wide [`SystemAudioService`]. The mutex
//! serializes calls from the shell, so at most one operation touches the
//! native recorder or player at a time.

use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};

use tauri::command;

use crate::config::CrabRecorderConfig;
use crate::errors::RecorderError;
use crate::service::{ServiceStatus, SystemAudioService};

lazy_static::lazy_static! {
    static ref AUDIO_SERVICE: Mutex<Option<SystemAudioService>> = Mutex::new(None);
}

static APP_CACHE_DIR: OnceLock<PathBuf> = OnceLock::new();

/// Register the host app's cache directory as the default recordings
/// directory. Only the first registration is kept.
pub fn register_app_cache_dir(dir: PathBuf) {
    log::debug!("App cache directory: {}", dir.display());
    let _ = APP_CACHE_DIR.set(dir);
}

/// Run `f` against the shared service, creating it on first use
pub fn with_service<T>(
    f: impl FnOnce(&mut SystemAudioService) -> Result<T, RecorderError>,
) -> Result<T, RecorderError> {
    let mut guard = AUDIO_SERVICE
        .lock()
        .map_err(|_| RecorderError::Internal("Audio service lock poisoned".to_string()))?;
    let service = guard.get_or_insert_with(|| {
        let config = super::config::current_config();
        SystemAudioService::system(&config, APP_CACHE_DIR.get().map(PathBuf::as_path))
    });
    f(service)
}

/// Push new configuration into the running service, if one exists
pub(crate) fn apply_config(config: &CrabRecorderConfig) -> Result<(), RecorderError> {
    let mut guard = AUDIO_SERVICE
        .lock()
        .map_err(|_| RecorderError::Internal("Audio service lock poisoned".to_string()))?;
    if let Some(service) = guard.as_mut() {
        service.reconfigure(config, APP_CACHE_DIR.get().map(PathBuf::as_path));
    }
    Ok(())
}

/// Start recording from the microphone into the cache directory
#[command]
pub async fn start_recording() -> Result<String, RecorderError> {
    with_service(|service| service.start_recording())
}

/// Stop the active recording (no-op when idle)
#[command]
pub async fn stop_recording() -> Result<String, RecorderError> {
    with_service(|service| Ok(service.stop_recording()))
}

/// List absolute paths of completed recordings
#[command]
pub async fn get_recordings() -> Result<Vec<String>, RecorderError> {
    with_service(|service| {
        Ok(service
            .get_recordings()
            .into_iter()
            .map(|p| p.to_string_lossy().into_owned())
            .collect())
    })
}

/// Play a recording, replacing any current playback
#[command]
pub async fn play_recording(file_path: Option<String>) -> Result<String, RecorderError> {
    with_service(|service| service.play_recording(file_path.as_deref()))
}

/// Stop and release the current player (no-op when idle)
#[command]
pub async fn stop_playback() -> Result<String, RecorderError> {
    with_service(|service| Ok(service.stop_playback()))
}

/// Current recording/playback state
#[command]
pub async fn get_audio_status() -> Result<ServiceStatus, RecorderError> {
    with_service(|service| Ok(service.status()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::{ACK_PLAYBACK_STOPPED, ACK_RECORDING_STOPPED};

    #[tokio::test]
    async fn test_play_without_path_is_rejected() {
        let err = play_recording(None).await.unwrap_err();
        assert_eq!(err, RecorderError::PathMissing);

        let err = play_recording(Some(String::new())).await.unwrap_err();
        assert_eq!(err, RecorderError::PathMissing);
    }

    #[tokio::test]
    async fn test_stops_are_idempotent() {
        assert_eq!(stop_playback().await.unwrap(), ACK_PLAYBACK_STOPPED);
        assert_eq!(stop_playback().await.unwrap(), ACK_PLAYBACK_STOPPED);
        assert_eq!(stop_recording().await.unwrap(), ACK_RECORDING_STOPPED);
    }

    #[tokio::test]
    async fn test_status_reports_cache_directory() {
        let status = get_audio_status().await.unwrap();
        assert!(!status.cache_directory.is_empty());
        assert!(status.playback.is_none());
    }
}
