//! Recording files in the cache directory
//!
//! Recordings are named `audiorecord_<epoch-millis>.wav`. Listing is
//! non-recursive, keeps regular files with the recording extension, and
//! preserves directory enumeration order.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};

use crate::config::StorageConfig;
use crate::errors::RecorderError;

pub const RECORDING_PREFIX: &str = "audiorecord";
pub const RECORDING_EXTENSION: &str = "wav";

/// Subdirectory used under the user cache directory outside of a Tauri app
const CACHE_SUBDIR: &str = "crabrecorder";

/// Pick the recordings directory: explicit config, then the app cache
/// directory, then the user cache directory, then `./recordings`.
pub fn resolve_cache_dir(config: &StorageConfig, app_cache_dir: Option<&Path>) -> PathBuf {
    if let Some(dir) = config.cache_directory.as_deref().filter(|d| !d.trim().is_empty()) {
        return PathBuf::from(dir);
    }
    if let Some(dir) = app_cache_dir {
        return dir.to_path_buf();
    }
    dirs::cache_dir()
        .map(|dir| dir.join(CACHE_SUBDIR))
        .unwrap_or_else(|| PathBuf::from("recordings"))
}

fn absolutize(path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        return path;
    }
    match std::env::current_dir() {
        Ok(cwd) => cwd.join(path),
        Err(e) => {
            log::warn!("Cannot resolve {} against working directory: {}", path.display(), e);
            path
        }
    }
}

/// True for paths carrying the recording extension
pub fn has_recording_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext == RECORDING_EXTENSION)
        .unwrap_or(false)
}

/// File name for a capture started at `at`
pub fn recording_file_name(at: DateTime<Utc>) -> String {
    format!(
        "{}_{}.{}",
        RECORDING_PREFIX,
        at.timestamp_millis(),
        RECORDING_EXTENSION
    )
}

/// The directory recordings are written to and listed from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordingStore {
    directory: PathBuf,
}

impl RecordingStore {
    /// Relative directories are resolved against the working directory.
    /// The directory is not created until a recording needs it.
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: absolutize(directory.into()),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn ensure_directory(&self) -> Result<(), RecorderError> {
        fs::create_dir_all(&self.directory).map_err(|e| {
            RecorderError::IoError(format!(
                "Failed to create recordings directory {}: {}",
                self.directory.display(),
                e
            ))
        })
    }

    /// Absolute output path for a capture started at `at`
    pub fn recording_path(&self, at: DateTime<Utc>) -> PathBuf {
        self.directory.join(recording_file_name(at))
    }

    /// First unused recording path at or after `at`, stepping one
    /// millisecond at a time. Returns the timestamp the name encodes.
    pub fn fresh_recording_path(&self, at: DateTime<Utc>) -> (DateTime<Utc>, PathBuf) {
        let mut at = at;
        let mut path = self.recording_path(at);
        while path.exists() {
            at = at + Duration::milliseconds(1);
            path = self.recording_path(at);
        }
        (at, path)
    }

    /// Absolute paths of completed recordings. A missing or unreadable
    /// directory yields an empty list.
    pub fn list(&self) -> Vec<PathBuf> {
        let entries = match fs::read_dir(&self.directory) {
            Ok(entries) => entries,
            Err(e) => {
                log::debug!(
                    "Recordings directory {} not readable: {}",
                    self.directory.display(),
                    e
                );
                return Vec::new();
            }
        };

        entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && has_recording_extension(path))
            .collect()
    }
}
