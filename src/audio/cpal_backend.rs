use std::path::Path;

use super::player::{CpalPlayer, PlayerOptions};
use super::recorder::CpalRecorder;
use super::routing::AudioRouting;
use super::{AudioBackend, RecorderSpec};
use crate::config::PlaybackConfig;
use crate::errors::RecorderError;

/// Host audio through cpal, recordings stored as WAV via hound
#[derive(Debug, Clone)]
pub struct CpalBackend {
    routing: AudioRouting,
    player_options: PlayerOptions,
}

impl CpalBackend {
    pub fn new(playback: &PlaybackConfig) -> Self {
        Self {
            routing: AudioRouting::new(),
            player_options: PlayerOptions {
                output_device: playback.output_device.clone(),
                volume: playback.volume,
            },
        }
    }
}

impl Default for CpalBackend {
    fn default() -> Self {
        Self::new(&PlaybackConfig::default())
    }
}

impl AudioBackend for CpalBackend {
    type Recorder = CpalRecorder;
    type Player = CpalPlayer;

    fn routing(&self) -> &AudioRouting {
        &self.routing
    }

    fn prepare_recorder(&mut self, spec: &RecorderSpec) -> Result<CpalRecorder, RecorderError> {
        CpalRecorder::prepare(spec, self.routing.clone())
    }

    fn prepare_player(&mut self, path: &Path) -> Result<CpalPlayer, RecorderError> {
        CpalPlayer::prepare(path, &self.player_options)
    }

    fn configure_playback(&mut self, config: &PlaybackConfig) {
        self.player_options = PlayerOptions {
            output_device: config.output_device.clone(),
            volume: config.volume,
        };
    }
}
