use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecorderError {
    #[error("Microphone permission denied")]
    PermissionDenied,
    #[error("File path not provided")]
    PathMissing,
    #[error("Playback failed: {0}")]
    PlaybackFailed(String),
    #[error("A recording session is already active")]
    SessionAlreadyActive,
    #[error("Method not implemented: {0}")]
    NotImplemented(String),
    #[error("Audio error: {0}")]
    AudioError(String),
    #[error("IO error: {0}")]
    IoError(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl RecorderError {
    /// Stable error code reported to the application shell.
    pub fn code(&self) -> &'static str {
        match self {
            RecorderError::PermissionDenied => "PERMISSION_DENIED",
            RecorderError::PathMissing => "PATH_NOT_FOUND",
            RecorderError::PlaybackFailed(_) => "PLAYBACK_FAILED",
            RecorderError::SessionAlreadyActive => "SESSION_ALREADY_ACTIVE",
            RecorderError::NotImplemented(_) => "NOT_IMPLEMENTED",
            RecorderError::AudioError(_) => "AUDIO_ERROR",
            RecorderError::IoError(_) => "IO_ERROR",
            RecorderError::ConfigError(_) => "CONFIG_ERROR",
            RecorderError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<std::io::Error> for RecorderError {
    fn from(err: std::io::Error) -> Self {
        RecorderError::IoError(err.to_string())
    }
}

impl From<hound::Error> for RecorderError {
    fn from(err: hound::Error) -> Self {
        match err {
            hound::Error::IoError(e) => RecorderError::IoError(e.to_string()),
            other => RecorderError::AudioError(format!("WAV error: {}", other)),
        }
    }
}

// Tauri needs serializable command errors; the shell sees `{ code, message }`.
impl Serialize for RecorderError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("RecorderError", 2)?;
        state.serialize_field("code", self.code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}
