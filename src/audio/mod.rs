//! Native audio primitives for CrabRecorder
//!
//! The service talks to the platform through [`AudioBackend`]:
//! - `cpal_backend`: cpal capture/playback with hound WAV files
//! - `device`: input and output device enumeration
//! - `recorder` / `player`: native handles with a prepare/start/stop lifecycle
//! - `routing`: device audio mode and microphone mute flag
//! - `worker`: the thread each cpal stream lives on
//!
//! Native handles release their resources on `Drop`.

mod cpal_backend;
mod device;
mod player;
mod recorder;
mod routing;
mod worker;

use std::path::{Path, PathBuf};

use crate::errors::RecorderError;

pub use cpal_backend::CpalBackend;
pub use device::{
    default_input_device, default_output_device, list_input_devices, list_output_devices,
    AudioDevice,
};
pub use player::{decode_wav, CpalPlayer, DecodedAudio, PlaybackCursor, PlayerOptions};
pub use recorder::{CpalRecorder, BITS_PER_SAMPLE};
pub use routing::{AudioMode, AudioRouting, RoutingGuard};

/// Capture parameters for one recording session.
///
/// The source is always the microphone and the file is always WAV with
/// 16-bit signed PCM.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecorderSpec {
    pub output_path: PathBuf,
    /// Input device name, `None` for the system default
    pub device: Option<String>,
    /// 0 selects the device default
    pub sample_rate: u32,
    /// 0 selects the device default
    pub channels: u16,
}

/// A prepared native recorder. Dropping it releases the device.
pub trait NativeRecorder: Send {
    fn start(&mut self) -> Result<(), RecorderError>;
    /// Stop capture and finalize the output file.
    fn stop(&mut self) -> Result<(), RecorderError>;
}

/// A prepared native player. Dropping it releases the device.
pub trait NativePlayer: Send {
    fn start(&mut self) -> Result<(), RecorderError>;
    /// False before `start`, after `stop`, and after end-of-stream.
    fn is_playing(&self) -> bool;
    fn stop(&mut self) -> Result<(), RecorderError>;
}

/// Platform multimedia layer used by [`crate::AudioService`].
pub trait AudioBackend: Send {
    type Recorder: NativeRecorder;
    type Player: NativePlayer;

    /// Device-global audio mode and microphone mute state.
    fn routing(&self) -> &AudioRouting;

    /// Configure capture and open the output file; capture does not begin
    /// until `start`.
    fn prepare_recorder(&mut self, spec: &RecorderSpec) -> Result<Self::Recorder, RecorderError>;

    /// Bind a player to `path`. Missing or undecodable files fail with
    /// [`RecorderError::PlaybackFailed`].
    fn prepare_player(&mut self, path: &Path) -> Result<Self::Player, RecorderError>;

    /// Apply playback preferences to players prepared from now on.
    fn configure_playback(&mut self, _config: &crate::config::PlaybackConfig) {}
}
