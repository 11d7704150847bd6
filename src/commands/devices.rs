//! Tauri commands for audio device discovery
//!
//! Errors are logged in full and reported to the frontend as short,
//! user-facing messages.

use tauri::command;

use crate::audio::{self, AudioDevice};
use crate::errors::RecorderError;

/// List audio input devices, default first
#[command]
pub async fn list_audio_input_devices() -> Result<Vec<AudioDevice>, RecorderError> {
    audio::list_input_devices().map_err(|e| {
        log::error!("Failed to enumerate input devices: {:?}", e);
        RecorderError::AudioError(
            "Unable to list microphones. Please check that your audio drivers are installed correctly."
                .to_string(),
        )
    })
}

/// List audio output devices, default first
#[command]
pub async fn list_audio_output_devices() -> Result<Vec<AudioDevice>, RecorderError> {
    audio::list_output_devices().map_err(|e| {
        log::error!("Failed to enumerate output devices: {:?}", e);
        RecorderError::AudioError(
            "Unable to list speakers. Please check that your audio drivers are installed correctly."
                .to_string(),
        )
    })
}

/// Get the default microphone
#[command]
pub async fn get_default_input_device() -> Result<AudioDevice, RecorderError> {
    audio::default_input_device().map_err(|e| {
        log::error!("Failed to get default input device: {:?}", e);
        RecorderError::AudioError(
            "No default microphone available. Please connect a microphone.".to_string(),
        )
    })
}
