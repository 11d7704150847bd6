//! AudioService: the single owner of the recorder, the player and the
//! device audio mode.
//!
//! Each kind of session moves `Idle -> Active -> Idle`. Sessions hold their
//! native handle by value, so releasing a session (stop, replacement, error
//! path, or service drop) releases the device.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::audio::{
    AudioBackend, AudioMode, CpalBackend, NativePlayer, NativeRecorder, RecorderSpec, RoutingGuard,
};
use crate::config::{CrabRecorderConfig, RecordingConfig};
use crate::errors::RecorderError;
use crate::permissions::{MicrophonePermission, PermissionInfo, SystemPermission};
use crate::storage::{resolve_cache_dir, RecordingStore};

pub const ACK_RECORDING_STARTED: &str = "Recording Started";
pub const ACK_RECORDING_STOPPED: &str = "Recording Stopped";
pub const ACK_PLAYING: &str = "Playing recording";
pub const ACK_PLAYBACK_STOPPED: &str = "Playback Stopped";

/// An active capture. Field order matters: the recorder is released before
/// the routing guard restores normal mode.
pub struct RecordingSession<R: NativeRecorder> {
    recorder: R,
    output_path: PathBuf,
    started_at: DateTime<Utc>,
    _routing: RoutingGuard,
}

impl<R: NativeRecorder> RecordingSession<R> {
    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }
}

/// An active (or naturally finished, not yet released) playback
pub struct PlaybackSession<P: NativePlayer> {
    player: P,
    source_path: PathBuf,
}

impl<P: NativePlayer> PlaybackSession<P> {
    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    pub fn is_playing(&self) -> bool {
        self.player.is_playing()
    }
}

/// Snapshot of the service state for the application shell
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceStatus {
    pub recording: Option<String>,
    pub recording_started_at: Option<DateTime<Utc>>,
    pub playback: Option<String>,
    pub playing: bool,
    pub audio_mode: AudioMode,
    pub microphone_muted: bool,
    pub cache_directory: String,
}

/// Capture parameters applied to each new recording
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptureSettings {
    pub device: Option<String>,
    pub sample_rate: u32,
    pub channels: u16,
}

impl From<&RecordingConfig> for CaptureSettings {
    fn from(config: &RecordingConfig) -> Self {
        Self {
            device: config.input_device.clone(),
            sample_rate: config.sample_rate,
            channels: config.channels,
        }
    }
}

/// Audio service bound to the host's cpal devices and OS permissions
pub type SystemAudioService = AudioService<CpalBackend, SystemPermission>;

pub struct AudioService<B: AudioBackend, P: MicrophonePermission> {
    backend: B,
    permission: P,
    store: RecordingStore,
    capture: CaptureSettings,
    recording: Option<RecordingSession<B::Recorder>>,
    playback: Option<PlaybackSession<B::Player>>,
}

impl SystemAudioService {
    /// Build the service from configuration. `app_cache_dir` is the host
    /// application's cache directory when one is known.
    pub fn system(config: &CrabRecorderConfig, app_cache_dir: Option<&Path>) -> Self {
        let store = RecordingStore::new(resolve_cache_dir(&config.storage, app_cache_dir));
        AudioService::new(CpalBackend::new(&config.playback), SystemPermission, store)
            .with_capture(CaptureSettings::from(&config.recording))
    }
}

impl<B: AudioBackend, P: MicrophonePermission> AudioService<B, P> {
    pub fn new(backend: B, permission: P, store: RecordingStore) -> Self {
        log::debug!(
            "Audio service using recordings directory {}",
            store.directory().display()
        );
        Self {
            backend,
            permission,
            store,
            capture: CaptureSettings::default(),
            recording: None,
            playback: None,
        }
    }

    pub fn with_capture(mut self, capture: CaptureSettings) -> Self {
        self.capture = capture;
        self
    }

    /// Apply new configuration. Active sessions keep their settings; the
    /// next session uses the new ones.
    pub fn reconfigure(&mut self, config: &CrabRecorderConfig, app_cache_dir: Option<&Path>) {
        self.capture = CaptureSettings::from(&config.recording);
        self.store = RecordingStore::new(resolve_cache_dir(&config.storage, app_cache_dir));
        self.backend.configure_playback(&config.playback);
        log::info!(
            "Audio service reconfigured, recordings directory {}",
            self.store.directory().display()
        );
    }

    pub fn store(&self) -> &RecordingStore {
        &self.store
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn recording_session(&self) -> Option<&RecordingSession<B::Recorder>> {
        self.recording.as_ref()
    }

    pub fn playback_session(&self) -> Option<&PlaybackSession<B::Player>> {
        self.playback.as_ref()
    }

    pub fn is_recording(&self) -> bool {
        self.recording.is_some()
    }

    pub fn is_playing(&self) -> bool {
        self.playback.as_ref().map(|s| s.is_playing()).unwrap_or(false)
    }

    pub fn audio_mode(&self) -> AudioMode {
        self.backend.routing().mode()
    }

    pub fn permission_status(&self) -> PermissionInfo {
        self.permission.check()
    }

    pub fn request_permission(&self) {
        self.permission.request();
    }

    /// Begin capturing from the microphone into a new recording file
    pub fn start_recording(&mut self) -> Result<String, RecorderError> {
        if self.recording.is_some() {
            log::warn!("startRecording rejected: a recording session is already active");
            return Err(RecorderError::SessionAlreadyActive);
        }

        let permission = self.permission.check();
        if !permission.is_granted() {
            log::warn!(
                "startRecording rejected: microphone permission {} ({})",
                permission.status,
                permission.message
            );
            self.permission.request();
            return Err(RecorderError::PermissionDenied);
        }

        let routing = self.backend.routing().engage();

        self.store.ensure_directory()?;
        let (started_at, output_path) = self.store.fresh_recording_path(Utc::now());
        let spec = RecorderSpec {
            output_path: output_path.clone(),
            device: self.capture.device.clone(),
            sample_rate: self.capture.sample_rate,
            channels: self.capture.channels,
        };

        let mut recorder = self.backend.prepare_recorder(&spec).map_err(|e| {
            log::error!("Failed to prepare recorder: {}", e);
            e
        })?;

        if let Err(e) = recorder.start() {
            log::error!("Failed to start recorder: {}", e);
            drop(recorder);
            if let Err(remove_err) = std::fs::remove_file(&output_path) {
                log::debug!("No partial recording to remove: {}", remove_err);
            }
            return Err(e);
        }

        log::info!("Recording session started: {}", output_path.display());
        self.recording = Some(RecordingSession {
            recorder,
            output_path,
            started_at,
            _routing: routing,
        });
        Ok(ACK_RECORDING_STARTED.to_string())
    }

    /// Stop the active recording, if any. Always acknowledges.
    pub fn stop_recording(&mut self) -> String {
        if let Some(mut session) = self.recording.take() {
            if let Err(e) = session.recorder.stop() {
                log::error!(
                    "Recorder stop failed for {}: {}",
                    session.output_path.display(),
                    e
                );
            }
            log::info!("Recording session stopped: {}", session.output_path.display());
        }
        ACK_RECORDING_STOPPED.to_string()
    }

    /// Absolute paths of recordings in the cache directory
    pub fn get_recordings(&self) -> Vec<PathBuf> {
        self.store.list()
    }

    /// Play `path`, replacing any current playback
    pub fn play_recording(&mut self, path: Option<&str>) -> Result<String, RecorderError> {
        let path = match path {
            Some(p) if !p.is_empty() => PathBuf::from(p),
            _ => {
                log::warn!("playRecording rejected: no file path provided");
                return Err(RecorderError::PathMissing);
            }
        };

        self.stop_playback();

        let mut player = self.backend.prepare_player(&path).map_err(|e| {
            log::error!("Failed to prepare player for {}: {}", path.display(), e);
            into_playback_failure(e)
        })?;
        player.start().map_err(|e| {
            log::error!("Failed to start playback of {}: {}", path.display(), e);
            into_playback_failure(e)
        })?;

        log::info!("Playback session started: {}", path.display());
        self.playback = Some(PlaybackSession {
            player,
            source_path: path,
        });
        Ok(ACK_PLAYING.to_string())
    }

    /// Stop and release the current player, if any. Always acknowledges.
    pub fn stop_playback(&mut self) -> String {
        if let Some(mut session) = self.playback.take() {
            if session.player.is_playing() {
                if let Err(e) = session.player.stop() {
                    log::warn!(
                        "Player stop failed for {}: {}",
                        session.source_path.display(),
                        e
                    );
                }
            }
            log::info!("Playback session released: {}", session.source_path.display());
        }
        ACK_PLAYBACK_STOPPED.to_string()
    }

    pub fn status(&self) -> ServiceStatus {
        let routing = self.backend.routing();
        ServiceStatus {
            recording: self
                .recording
                .as_ref()
                .map(|s| s.output_path.to_string_lossy().into_owned()),
            recording_started_at: self.recording.as_ref().map(|s| s.started_at),
            playback: self
                .playback
                .as_ref()
                .map(|s| s.source_path.to_string_lossy().into_owned()),
            playing: self.is_playing(),
            audio_mode: routing.mode(),
            microphone_muted: routing.is_microphone_muted(),
            cache_directory: self.store.directory().to_string_lossy().into_owned(),
        }
    }

    /// Stop playback and recording
    pub fn shutdown(&mut self) {
        self.stop_playback();
        self.stop_recording();
    }
}

fn into_playback_failure(err: RecorderError) -> RecorderError {
    match err {
        RecorderError::PlaybackFailed(_) => err,
        other => RecorderError::PlaybackFailed(other.to_string()),
    }
}
