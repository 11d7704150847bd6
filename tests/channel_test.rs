//! Method channel round trips against the mock backend

use crabrecorder::channel::{dispatch, handle, MethodCall, Reply, Response};
use crabrecorder::testing::{MockBackend, MockPermission};
use crabrecorder::{AudioService, RecorderError, RecordingStore};
use serde_json::{json, Value};

fn service(permission: MockPermission) -> (AudioService<MockBackend, MockPermission>, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let store = RecordingStore::new(dir.path());
    (AudioService::new(MockBackend::new(), permission, store), dir)
}

#[test]
fn test_record_then_list_over_channel() {
    let (mut svc, _dir) = service(MockPermission::granted());

    let started = handle(&mut svc, "startRecording", &Value::Null);
    assert_eq!(started, Response::Success(Reply::Ack("Recording Started".into())));

    let stopped = handle(&mut svc, "stopRecording", &Value::Null);
    assert_eq!(stopped, Response::Success(Reply::Ack("Recording Stopped".into())));

    match dispatch(&mut svc, MethodCall::GetRecordings).unwrap() {
        Reply::Paths(paths) => {
            assert_eq!(paths.len(), 1);
            assert!(paths[0].ends_with(".wav"));
        }
        other => panic!("expected paths, got {:?}", other),
    }
}

#[test]
fn test_permission_denied_code() {
    let (mut svc, _dir) = service(MockPermission::denied());
    let response = handle(&mut svc, "startRecording", &Value::Null);
    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(json["error"]["code"], "PERMISSION_DENIED");
    assert_eq!(json["error"]["message"], "Microphone permission denied");
}

#[test]
fn test_play_without_file_path() {
    let (mut svc, _dir) = service(MockPermission::granted());
    let response = handle(&mut svc, "playRecording", &json!({}));
    assert_eq!(response, Response::Error(RecorderError::PathMissing));
}

#[test]
fn test_play_and_stop_over_channel() {
    let (mut svc, _dir) = service(MockPermission::granted());
    let played = handle(&mut svc, "playRecording", &json!({"filePath": "/tmp/a.wav"}));
    assert_eq!(played, Response::Success(Reply::Ack("Playing recording".into())));

    let stopped = handle(&mut svc, "stopPlayback", &Value::Null);
    assert_eq!(stopped, Response::Success(Reply::Ack("Playback Stopped".into())));
}

#[test]
fn test_unknown_method_is_not_implemented() {
    let (mut svc, _dir) = service(MockPermission::granted());
    let response = handle(&mut svc, "pauseRecording", &Value::Null);
    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(json["error"]["code"], "NOT_IMPLEMENTED");
}

#[test]
fn test_empty_listing_serializes_as_array() {
    let (mut svc, _dir) = service(MockPermission::granted());
    let response = handle(&mut svc, "getRecordings", &Value::Null);
    assert_eq!(serde_json::to_value(&response).unwrap(), json!({"success": []}));
}
