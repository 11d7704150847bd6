//! AudioService behaviour against the mock backend

use std::fs;
use std::path::PathBuf;

use crabrecorder::service::{
    ACK_PLAYBACK_STOPPED, ACK_PLAYING, ACK_RECORDING_STARTED, ACK_RECORDING_STOPPED,
};
use crabrecorder::testing::{BackendEvent, MockBackend, MockPermission, MockProbe};
use crabrecorder::{AudioMode, AudioService, RecorderError, RecordingStore};
use tempfile::TempDir;

struct Fixture {
    service: AudioService<MockBackend, MockPermission>,
    probe: MockProbe,
    permission: MockPermission,
    dir: TempDir,
}

fn fixture_with(backend: MockBackend, permission: MockPermission) -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let probe = backend.probe();
    let store = RecordingStore::new(dir.path().join("cache"));
    let service = AudioService::new(backend, permission.clone(), store);
    Fixture {
        service,
        probe,
        permission,
        dir,
    }
}

fn fixture() -> Fixture {
    fixture_with(MockBackend::new(), MockPermission::granted())
}

#[test]
fn test_start_stop_list_returns_new_recording() {
    let mut f = fixture();

    assert_eq!(f.service.start_recording().unwrap(), ACK_RECORDING_STARTED);
    let path = f
        .service
        .recording_session()
        .map(|s| s.output_path().to_path_buf())
        .unwrap();
    assert_eq!(f.service.stop_recording(), ACK_RECORDING_STOPPED);

    let recordings = f.service.get_recordings();
    assert_eq!(recordings, vec![path.clone()]);
    assert!(path.is_absolute());
    let name = path.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("audiorecord_"));
    assert!(name.ends_with(".wav"));
}

#[test]
fn test_back_to_back_recordings_never_overwrite() {
    let mut f = fixture();

    for _ in 0..5 {
        f.service.start_recording().unwrap();
        f.service.stop_recording();
    }

    let mut recordings = f.service.get_recordings();
    recordings.sort();
    recordings.dedup();
    assert_eq!(recordings.len(), 5);
}

#[test]
fn test_audio_mode_follows_recording_session() {
    let mut f = fixture();
    let routing = f.probe.routing().clone();

    assert_eq!(routing.mode(), AudioMode::Normal);
    assert!(routing.is_microphone_muted());

    f.service.start_recording().unwrap();
    assert_eq!(routing.mode(), AudioMode::Communication);
    assert!(!routing.is_microphone_muted());

    f.service.stop_recording();
    assert_eq!(routing.mode(), AudioMode::Normal);
    assert!(routing.is_microphone_muted());
}

#[test]
fn test_recorder_stopped_then_released() {
    let mut f = fixture();
    f.service.start_recording().unwrap();
    let path = f
        .service
        .recording_session()
        .map(|s| s.output_path().to_path_buf())
        .unwrap();
    f.service.stop_recording();

    assert_eq!(
        f.probe.events(),
        vec![
            BackendEvent::RecorderPrepared(path.clone()),
            BackendEvent::RecorderStarted(path.clone()),
            BackendEvent::RecorderStopped(path.clone()),
            BackendEvent::RecorderReleased(path),
        ]
    );
    assert_eq!(f.probe.live_recorders(), 0);
}

#[test]
fn test_stop_recording_when_idle_is_noop() {
    let mut f = fixture();
    assert_eq!(f.service.stop_recording(), ACK_RECORDING_STOPPED);
    assert_eq!(f.service.stop_recording(), ACK_RECORDING_STOPPED);
    assert!(f.probe.events().is_empty());
    assert_eq!(f.probe.routing().mode(), AudioMode::Normal);
}

#[test]
fn test_permission_denied_requests_once_and_starts_nothing() {
    let mut f = fixture_with(MockBackend::new(), MockPermission::denied());

    let err = f.service.start_recording().unwrap_err();
    assert_eq!(err, RecorderError::PermissionDenied);
    assert_eq!(f.permission.request_count(), 1);
    assert!(!f.service.is_recording());
    assert_eq!(f.probe.live_recorders(), 0);
    assert!(f.probe.events().is_empty());
    assert_eq!(f.probe.routing().mode(), AudioMode::Normal);
}

#[test]
fn test_permission_granted_after_prompt_allows_retry() {
    let mut f = fixture_with(MockBackend::new(), MockPermission::denied().grant_on_request());

    assert_eq!(
        f.service.start_recording().unwrap_err(),
        RecorderError::PermissionDenied
    );
    assert_eq!(f.service.start_recording().unwrap(), ACK_RECORDING_STARTED);
    assert_eq!(f.permission.request_count(), 1);
}

#[test]
fn test_second_start_is_rejected_and_first_keeps_running() {
    let mut f = fixture();
    f.service.start_recording().unwrap();
    let first = f
        .service
        .recording_session()
        .map(|s| s.output_path().to_path_buf())
        .unwrap();

    let err = f.service.start_recording().unwrap_err();
    assert_eq!(err, RecorderError::SessionAlreadyActive);
    assert_eq!(f.probe.live_recorders(), 1);
    assert_eq!(
        f.service.recording_session().map(|s| s.output_path().to_path_buf()),
        Some(first)
    );
    assert_eq!(f.probe.routing().mode(), AudioMode::Communication);
}

#[test]
fn test_failed_prepare_restores_normal_mode() {
    let mut f = fixture_with(
        MockBackend::new().failing_recorder_prepare(),
        MockPermission::granted(),
    );

    let err = f.service.start_recording().unwrap_err();
    assert!(matches!(err, RecorderError::AudioError(_)));
    assert!(!f.service.is_recording());
    assert_eq!(f.probe.routing().mode(), AudioMode::Normal);
    assert!(f.probe.routing().is_microphone_muted());
}

#[test]
fn test_failed_start_releases_recorder_and_removes_file() {
    let mut f = fixture_with(
        MockBackend::new().failing_recorder_start(),
        MockPermission::granted(),
    );

    assert!(f.service.start_recording().is_err());
    assert_eq!(f.probe.live_recorders(), 0);
    assert!(f.service.get_recordings().is_empty());
    assert_eq!(f.probe.routing().mode(), AudioMode::Normal);
}

#[test]
fn test_get_recordings_missing_directory_is_empty() {
    let f = fixture();
    assert!(!f.service.store().directory().exists());
    assert!(f.service.get_recordings().is_empty());
}

#[test]
fn test_get_recordings_filters_extension_and_directories() {
    let f = fixture();
    let cache = f.service.store().directory().to_path_buf();
    fs::create_dir_all(cache.join("nested.wav")).unwrap();
    fs::write(cache.join("audiorecord_1.wav"), b"").unwrap();
    fs::write(cache.join("audiorecord_2.3gp"), b"").unwrap();
    fs::write(cache.join("notes.txt"), b"").unwrap();

    let recordings = f.service.get_recordings();
    assert_eq!(recordings, vec![cache.join("audiorecord_1.wav")]);
}

#[test]
fn test_play_without_path_creates_no_session() {
    let mut f = fixture();

    assert_eq!(
        f.service.play_recording(None).unwrap_err(),
        RecorderError::PathMissing
    );
    assert_eq!(
        f.service.play_recording(Some("")).unwrap_err(),
        RecorderError::PathMissing
    );
    assert!(f.service.playback_session().is_none());
    assert_eq!(f.probe.live_players(), 0);
}

#[test]
fn test_replacing_playback_releases_first_player_before_second() {
    let mut f = fixture();
    let a = PathBuf::from("/tmp/a.3gp");
    let b = PathBuf::from("/tmp/b.3gp");

    assert_eq!(f.service.play_recording(Some("/tmp/a.3gp")).unwrap(), ACK_PLAYING);
    assert_eq!(f.service.play_recording(Some("/tmp/b.3gp")).unwrap(), ACK_PLAYING);

    assert_eq!(
        f.probe.events(),
        vec![
            BackendEvent::PlayerPrepared(a.clone()),
            BackendEvent::PlayerStarted(a.clone()),
            BackendEvent::PlayerStopped(a.clone()),
            BackendEvent::PlayerReleased(a),
            BackendEvent::PlayerPrepared(b.clone()),
            BackendEvent::PlayerStarted(b),
        ]
    );
    assert_eq!(f.probe.max_live_players(), 1);
    assert_eq!(f.probe.live_players(), 1);
}

#[test]
fn test_stop_playback_after_natural_end_only_releases() {
    let mut f = fixture();
    let a = PathBuf::from("/tmp/a.wav");
    f.service.play_recording(Some("/tmp/a.wav")).unwrap();
    assert!(f.service.is_playing());

    f.probe.finish_playback();
    assert!(!f.service.is_playing());

    assert_eq!(f.service.stop_playback(), ACK_PLAYBACK_STOPPED);
    let events = f.probe.events();
    assert!(!events.contains(&BackendEvent::PlayerStopped(a.clone())));
    assert_eq!(events.last(), Some(&BackendEvent::PlayerReleased(a)));
    assert_eq!(f.probe.live_players(), 0);
}

#[test]
fn test_stop_playback_when_idle_is_noop() {
    let mut f = fixture();
    assert_eq!(f.service.stop_playback(), ACK_PLAYBACK_STOPPED);
    assert_eq!(f.service.stop_playback(), ACK_PLAYBACK_STOPPED);
    assert!(f.probe.events().is_empty());
}

#[test]
fn test_rejected_playback_reports_playback_failed() {
    let mut f = fixture_with(
        MockBackend::new().rejecting_playback(),
        MockPermission::granted(),
    );

    let err = f.service.play_recording(Some("/tmp/broken.wav")).unwrap_err();
    assert!(matches!(err, RecorderError::PlaybackFailed(_)));
    assert!(f.service.playback_session().is_none());
}

#[test]
fn test_recording_and_playback_are_independent() {
    let mut f = fixture();
    f.service.start_recording().unwrap();
    f.service.play_recording(Some("/tmp/a.wav")).unwrap();

    f.service.stop_playback();
    assert!(f.service.is_recording());
    assert_eq!(f.probe.routing().mode(), AudioMode::Communication);

    f.service.stop_recording();
    assert_eq!(f.probe.live_players(), 0);
    assert_eq!(f.probe.live_recorders(), 0);
}

#[test]
fn test_status_snapshot() {
    let mut f = fixture();
    f.service.start_recording().unwrap();
    f.service.play_recording(Some("/tmp/a.wav")).unwrap();

    let status = f.service.status();
    assert!(status.recording.is_some());
    assert!(status.recording_started_at.is_some());
    assert_eq!(status.playback.as_deref(), Some("/tmp/a.wav"));
    assert!(status.playing);
    assert_eq!(status.audio_mode, AudioMode::Communication);
    assert!(!status.microphone_muted);
    assert!(status.cache_directory.starts_with(&*f.dir.path().to_string_lossy()));
}

#[test]
fn test_shutdown_releases_everything() {
    let mut f = fixture();
    f.service.start_recording().unwrap();
    f.service.play_recording(Some("/tmp/a.wav")).unwrap();

    f.service.shutdown();
    assert_eq!(f.probe.live_players(), 0);
    assert_eq!(f.probe.live_recorders(), 0);
    assert_eq!(f.probe.routing().mode(), AudioMode::Normal);
}

#[test]
fn test_dropping_service_releases_sessions() {
    let f = fixture();
    let probe = f.probe.clone();
    let mut service = f.service;
    service.start_recording().unwrap();
    service.play_recording(Some("/tmp/a.wav")).unwrap();

    drop(service);
    assert_eq!(probe.live_players(), 0);
    assert_eq!(probe.live_recorders(), 0);
    assert_eq!(probe.routing().mode(), AudioMode::Normal);
}
