//! In-memory audio backend and permission gate
//!
//! Records every lifecycle call so tests can assert ordering and count live
//! native handles without audio hardware.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::audio::{AudioBackend, AudioRouting, NativePlayer, NativeRecorder, RecorderSpec};
use crate::errors::RecorderError;
use crate::permissions::{MicrophonePermission, PermissionInfo, PermissionStatus};

/// Lifecycle calls observed by the mock backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendEvent {
    RecorderPrepared(PathBuf),
    RecorderStarted(PathBuf),
    RecorderStopped(PathBuf),
    RecorderReleased(PathBuf),
    PlayerPrepared(PathBuf),
    PlayerStarted(PathBuf),
    PlayerStopped(PathBuf),
    PlayerReleased(PathBuf),
}

#[derive(Debug, Default)]
struct ProbeState {
    events: Mutex<Vec<BackendEvent>>,
    live_recorders: AtomicUsize,
    live_players: AtomicUsize,
    max_live_recorders: AtomicUsize,
    max_live_players: AtomicUsize,
    current_player: Mutex<Option<Arc<AtomicBool>>>,
}

impl ProbeState {
    fn push(&self, event: BackendEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }

    fn acquire(live: &AtomicUsize, max: &AtomicUsize) {
        let now = live.fetch_add(1, Ordering::SeqCst) + 1;
        max.fetch_max(now, Ordering::SeqCst);
    }
}

/// Observer handle kept by tests after the backend moves into the service
#[derive(Debug, Clone)]
pub struct MockProbe {
    state: Arc<ProbeState>,
    routing: AudioRouting,
}

impl MockProbe {
    pub fn events(&self) -> Vec<BackendEvent> {
        self.state.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn clear_events(&self) {
        if let Ok(mut events) = self.state.events.lock() {
            events.clear();
        }
    }

    pub fn live_recorders(&self) -> usize {
        self.state.live_recorders.load(Ordering::SeqCst)
    }

    pub fn live_players(&self) -> usize {
        self.state.live_players.load(Ordering::SeqCst)
    }

    /// Highest number of simultaneously live recorders ever observed
    pub fn max_live_recorders(&self) -> usize {
        self.state.max_live_recorders.load(Ordering::SeqCst)
    }

    /// Highest number of simultaneously live players ever observed
    pub fn max_live_players(&self) -> usize {
        self.state.max_live_players.load(Ordering::SeqCst)
    }

    pub fn routing(&self) -> &AudioRouting {
        &self.routing
    }

    /// Simulate natural end-of-stream on the most recent player
    pub fn finish_playback(&self) {
        if let Ok(current) = self.state.current_player.lock() {
            if let Some(flag) = current.as_ref() {
                flag.store(false, Ordering::SeqCst);
            }
        }
    }
}

/// Audio backend that touches only the filesystem
#[derive(Debug)]
pub struct MockBackend {
    routing: AudioRouting,
    state: Arc<ProbeState>,
    fail_recorder_prepare: bool,
    fail_recorder_start: bool,
    reject_playback: bool,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            routing: AudioRouting::new(),
            state: Arc::new(ProbeState::default()),
            fail_recorder_prepare: false,
            fail_recorder_start: false,
            reject_playback: false,
        }
    }

    /// `prepare_recorder` fails with an audio error
    pub fn failing_recorder_prepare(mut self) -> Self {
        self.fail_recorder_prepare = true;
        self
    }

    /// `start` on prepared recorders fails with an audio error
    pub fn failing_recorder_start(mut self) -> Self {
        self.fail_recorder_start = true;
        self
    }

    /// Every `prepare_player` call fails with `PlaybackFailed`
    pub fn rejecting_playback(mut self) -> Self {
        self.reject_playback = true;
        self
    }

    pub fn probe(&self) -> MockProbe {
        MockProbe {
            state: self.state.clone(),
            routing: self.routing.clone(),
        }
    }
}

impl AudioBackend for MockBackend {
    type Recorder = MockRecorder;
    type Player = MockPlayer;

    fn routing(&self) -> &AudioRouting {
        &self.routing
    }

    fn prepare_recorder(&mut self, spec: &RecorderSpec) -> Result<MockRecorder, RecorderError> {
        if self.fail_recorder_prepare {
            return Err(RecorderError::AudioError("mock input device unavailable".to_string()));
        }
        // The native recorder creates its output file during prepare
        fs::write(&spec.output_path, b"")?;

        ProbeState::acquire(&self.state.live_recorders, &self.state.max_live_recorders);
        self.state
            .push(BackendEvent::RecorderPrepared(spec.output_path.clone()));
        Ok(MockRecorder {
            path: spec.output_path.clone(),
            state: self.state.clone(),
            fail_start: self.fail_recorder_start,
        })
    }

    fn prepare_player(&mut self, path: &Path) -> Result<MockPlayer, RecorderError> {
        if self.reject_playback {
            return Err(RecorderError::PlaybackFailed(format!(
                "Cannot play {}",
                path.display()
            )));
        }

        let playing = Arc::new(AtomicBool::new(false));
        if let Ok(mut current) = self.state.current_player.lock() {
            *current = Some(playing.clone());
        }
        ProbeState::acquire(&self.state.live_players, &self.state.max_live_players);
        self.state
            .push(BackendEvent::PlayerPrepared(path.to_path_buf()));
        Ok(MockPlayer {
            path: path.to_path_buf(),
            state: self.state.clone(),
            playing,
        })
    }
}

pub struct MockRecorder {
    path: PathBuf,
    state: Arc<ProbeState>,
    fail_start: bool,
}

impl NativeRecorder for MockRecorder {
    fn start(&mut self) -> Result<(), RecorderError> {
        if self.fail_start {
            return Err(RecorderError::AudioError("mock capture failed to start".to_string()));
        }
        self.state.push(BackendEvent::RecorderStarted(self.path.clone()));
        Ok(())
    }

    fn stop(&mut self) -> Result<(), RecorderError> {
        self.state.push(BackendEvent::RecorderStopped(self.path.clone()));
        Ok(())
    }
}

impl Drop for MockRecorder {
    fn drop(&mut self) {
        self.state.live_recorders.fetch_sub(1, Ordering::SeqCst);
        self.state.push(BackendEvent::RecorderReleased(self.path.clone()));
    }
}

pub struct MockPlayer {
    path: PathBuf,
    state: Arc<ProbeState>,
    playing: Arc<AtomicBool>,
}

impl NativePlayer for MockPlayer {
    fn start(&mut self) -> Result<(), RecorderError> {
        self.playing.store(true, Ordering::SeqCst);
        self.state.push(BackendEvent::PlayerStarted(self.path.clone()));
        Ok(())
    }

    fn is_playing(&self) -> bool {
        self.playing.load(Ordering::SeqCst)
    }

    fn stop(&mut self) -> Result<(), RecorderError> {
        self.playing.store(false, Ordering::SeqCst);
        self.state.push(BackendEvent::PlayerStopped(self.path.clone()));
        Ok(())
    }
}

impl Drop for MockPlayer {
    fn drop(&mut self) {
        self.state.live_players.fetch_sub(1, Ordering::SeqCst);
        self.state.push(BackendEvent::PlayerReleased(self.path.clone()));
    }
}

/// Permission gate with a scripted answer
#[derive(Debug, Clone)]
pub struct MockPermission {
    granted: Arc<AtomicBool>,
    grant_on_request: Arc<AtomicBool>,
    requests: Arc<AtomicUsize>,
}

impl MockPermission {
    pub fn granted() -> Self {
        Self::with_status(true)
    }

    pub fn denied() -> Self {
        Self::with_status(false)
    }

    fn with_status(granted: bool) -> Self {
        Self {
            granted: Arc::new(AtomicBool::new(granted)),
            grant_on_request: Arc::new(AtomicBool::new(false)),
            requests: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// The simulated user accepts the next prompt
    pub fn grant_on_request(self) -> Self {
        self.grant_on_request.store(true, Ordering::SeqCst);
        self
    }

    pub fn set_granted(&self, granted: bool) {
        self.granted.store(granted, Ordering::SeqCst);
    }

    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

impl MicrophonePermission for MockPermission {
    fn check(&self) -> PermissionInfo {
        if self.granted.load(Ordering::SeqCst) {
            PermissionInfo {
                status: PermissionStatus::Granted,
                message: "mock microphone granted".to_string(),
                can_request: false,
            }
        } else {
            PermissionInfo {
                status: PermissionStatus::Denied,
                message: "mock microphone denied".to_string(),
                can_request: true,
            }
        }
    }

    fn request(&self) {
        self.requests.fetch_add(1, Ordering::SeqCst);
        if self.grant_on_request.load(Ordering::SeqCst) {
            self.granted.store(true, Ordering::SeqCst);
        }
    }
}
