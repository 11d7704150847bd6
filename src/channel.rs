//! Method channel for shells that do not speak Tauri IPC
//!
//! A call is a method name plus JSON arguments; the reply is either an
//! acknowledgment string or a list of recording paths.

use serde::Serialize;
use serde_json::Value;

use crate::audio::AudioBackend;
use crate::errors::RecorderError;
use crate::permissions::MicrophonePermission;
use crate::service::AudioService;

pub const CHANNEL_NAME: &str = "audio_recorder";

/// A parsed channel request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MethodCall {
    StartRecording,
    StopRecording,
    GetRecordings,
    PlayRecording { file_path: Option<String> },
    StopPlayback,
}

impl MethodCall {
    /// Parse a method name and its arguments. A `filePath` that is absent or
    /// not a string is treated as missing.
    pub fn parse(method: &str, args: &Value) -> Result<Self, RecorderError> {
        match method {
            "startRecording" => Ok(MethodCall::StartRecording),
            "stopRecording" => Ok(MethodCall::StopRecording),
            "getRecordings" => Ok(MethodCall::GetRecordings),
            "playRecording" => Ok(MethodCall::PlayRecording {
                file_path: args
                    .get("filePath")
                    .and_then(Value::as_str)
                    .map(str::to_string),
            }),
            "stopPlayback" => Ok(MethodCall::StopPlayback),
            other => Err(RecorderError::NotImplemented(other.to_string())),
        }
    }

    pub fn method(&self) -> &'static str {
        match self {
            MethodCall::StartRecording => "startRecording",
            MethodCall::StopRecording => "stopRecording",
            MethodCall::GetRecordings => "getRecordings",
            MethodCall::PlayRecording { .. } => "playRecording",
            MethodCall::StopPlayback => "stopPlayback",
        }
    }
}

/// Successful channel result
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Reply {
    Ack(String),
    Paths(Vec<String>),
}

/// Envelope written back to the shell
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Response {
    Success(Reply),
    Error(RecorderError),
}

impl From<Result<Reply, RecorderError>> for Response {
    fn from(result: Result<Reply, RecorderError>) -> Self {
        match result {
            Ok(reply) => Response::Success(reply),
            Err(e) => Response::Error(e),
        }
    }
}

/// Run one call against the service
pub fn dispatch<B, P>(service: &mut AudioService<B, P>, call: MethodCall) -> Result<Reply, RecorderError>
where
    B: AudioBackend,
    P: MicrophonePermission,
{
    log::debug!("[{}] {}", CHANNEL_NAME, call.method());
    match call {
        MethodCall::StartRecording => service.start_recording().map(Reply::Ack),
        MethodCall::StopRecording => Ok(Reply::Ack(service.stop_recording())),
        MethodCall::GetRecordings => Ok(Reply::Paths(
            service
                .get_recordings()
                .into_iter()
                .map(|p| p.to_string_lossy().into_owned())
                .collect(),
        )),
        MethodCall::PlayRecording { file_path } => {
            service.play_recording(file_path.as_deref()).map(Reply::Ack)
        }
        MethodCall::StopPlayback => Ok(Reply::Ack(service.stop_playback())),
    }
}

/// Parse and dispatch a raw request
pub fn handle<B, P>(service: &mut AudioService<B, P>, method: &str, args: &Value) -> Response
where
    B: AudioBackend,
    P: MicrophonePermission,
{
    let result = MethodCall::parse(method, args).and_then(|call| dispatch(service, call));
    if let Err(e) = &result {
        log::warn!("[{}] {} failed: {}", CHANNEL_NAME, method, e);
    }
    result.into()
}
