//! WAV playback through the default (or configured) output device
//!
//! Files are decoded up front so a missing or corrupt file fails before a
//! device is opened. The output callback maps source channels onto the
//! device layout and steps through source frames at the ratio of the two
//! sample rates.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use cpal::traits::DeviceTrait;
use cpal::{FromSample, Sample, SampleFormat, SizedSample, StreamConfig};

use super::device::find_output_device;
use super::worker::StreamWorker;
use super::NativePlayer;
use crate::errors::RecorderError;

/// Interleaved PCM decoded from a WAV file, normalized to [-1.0, 1.0]
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAudio {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub channels: u16,
}

impl DecodedAudio {
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            return 0;
        }
        self.samples.len() / self.channels as usize
    }

    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f64 / self.sample_rate as f64
    }
}

/// Decode a WAV file. Every failure is reported as `PlaybackFailed`.
pub fn decode_wav(path: &Path) -> Result<DecodedAudio, RecorderError> {
    let fail = |e: hound::Error| {
        RecorderError::PlaybackFailed(format!("Cannot play {}: {}", path.display(), e))
    };

    let mut reader = hound::WavReader::open(path).map_err(fail)?;
    let spec = reader.spec();
    if spec.channels == 0 {
        return Err(RecorderError::PlaybackFailed(format!(
            "Cannot play {}: no audio channels",
            path.display()
        )));
    }
    if spec.sample_rate == 0 {
        return Err(RecorderError::PlaybackFailed(format!(
            "Cannot play {}: sample rate is zero",
            path.display()
        )));
    }

    let samples = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<Result<Vec<_>, _>>()
            .map_err(fail)?,
        hound::SampleFormat::Int => {
            let scale = (1_i64 << (spec.bits_per_sample.saturating_sub(1))) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<Result<Vec<_>, _>>()
                .map_err(fail)?
        }
    };

    Ok(DecodedAudio {
        samples,
        sample_rate: spec.sample_rate,
        channels: spec.channels,
    })
}

/// Read position into decoded audio, advanced by the output callback
#[derive(Debug, Clone)]
pub struct PlaybackCursor {
    audio: Arc<DecodedAudio>,
    position: f64,
    step: f64,
    output_channels: usize,
    volume: f32,
}

impl PlaybackCursor {
    pub fn new(audio: Arc<DecodedAudio>, output_rate: u32, output_channels: u16, volume: f32) -> Self {
        let step = if output_rate == 0 {
            1.0
        } else {
            audio.sample_rate as f64 / output_rate as f64
        };
        Self {
            audio,
            position: 0.0,
            step,
            output_channels: output_channels.max(1) as usize,
            volume,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.position as usize >= self.audio.frames()
    }

    /// Fill an interleaved output buffer. Returns false once the source is
    /// exhausted; the remainder of `out` is silence.
    pub fn fill(&mut self, out: &mut [f32]) -> bool {
        let source_channels = self.audio.channels as usize;
        let total_frames = self.audio.frames();

        for frame in out.chunks_mut(self.output_channels) {
            let index = self.position as usize;
            if index >= total_frames {
                frame.iter_mut().for_each(|s| *s = 0.0);
                continue;
            }

            let base = index * source_channels;
            for (channel, slot) in frame.iter_mut().enumerate() {
                let source = channel.min(source_channels - 1);
                *slot = self.audio.samples[base + source] * self.volume;
            }
            self.position += self.step;
        }

        !self.is_finished()
    }
}

/// Playback options fixed when the player is prepared
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerOptions {
    pub output_device: Option<String>,
    pub volume: f32,
}

/// cpal output stream playing one decoded file
pub struct CpalPlayer {
    worker: StreamWorker,
    started: Arc<AtomicBool>,
    playing: Arc<AtomicBool>,
    source_path: PathBuf,
}

impl CpalPlayer {
    pub fn prepare(path: &Path, options: &PlayerOptions) -> Result<Self, RecorderError> {
        let audio = Arc::new(decode_wav(path)?);
        log::debug!(
            "Decoded {}: {:.2}s at {} Hz, {} channel(s)",
            path.display(),
            audio.duration_secs(),
            audio.sample_rate,
            audio.channels
        );

        let started = Arc::new(AtomicBool::new(false));
        let playing = Arc::new(AtomicBool::new(false));

        let build_started = started.clone();
        let build_playing = playing.clone();
        let build_options = options.clone();

        let worker = StreamWorker::spawn("crabrecorder-playback", move || {
            build_playback_stream(audio, &build_options, build_started, build_playing)
        })
        .map_err(|e| RecorderError::PlaybackFailed(e.to_string()))?;

        Ok(Self {
            worker,
            started,
            playing,
            source_path: path.to_path_buf(),
        })
    }

    pub fn source_path(&self) -> &Path {
        &self.source_path
    }
}

impl NativePlayer for CpalPlayer {
    fn start(&mut self) -> Result<(), RecorderError> {
        self.playing.store(true, Ordering::SeqCst);
        self.started.store(true, Ordering::SeqCst);
        if let Err(e) = self.worker.play() {
            self.playing.store(false, Ordering::SeqCst);
            return Err(RecorderError::PlaybackFailed(e.to_string()));
        }
        log::info!("Playback started: {}", self.source_path.display());
        Ok(())
    }

    fn is_playing(&self) -> bool {
        self.playing.load(Ordering::SeqCst)
    }

    fn stop(&mut self) -> Result<(), RecorderError> {
        self.started.store(false, Ordering::SeqCst);
        self.playing.store(false, Ordering::SeqCst);
        self.worker.shutdown();
        log::info!("Playback stopped: {}", self.source_path.display());
        Ok(())
    }
}

impl Drop for CpalPlayer {
    fn drop(&mut self) {
        self.playing.store(false, Ordering::SeqCst);
        self.worker.shutdown();
    }
}

fn build_playback_stream(
    audio: Arc<DecodedAudio>,
    options: &PlayerOptions,
    started: Arc<AtomicBool>,
    playing: Arc<AtomicBool>,
) -> Result<cpal::Stream, RecorderError> {
    let device = find_output_device(options.output_device.as_deref())?;
    let supported = device
        .default_output_config()
        .map_err(|e| RecorderError::AudioError(format!("No supported output config: {}", e)))?;
    let config: StreamConfig = supported.config();
    let cursor = PlaybackCursor::new(audio, config.sample_rate.0, config.channels, options.volume);

    match supported.sample_format() {
        SampleFormat::F32 => build_typed::<f32>(&device, &config, cursor, started, playing),
        SampleFormat::I16 => build_typed::<i16>(&device, &config, cursor, started, playing),
        SampleFormat::U16 => build_typed::<u16>(&device, &config, cursor, started, playing),
        SampleFormat::I32 => build_typed::<i32>(&device, &config, cursor, started, playing),
        other => Err(RecorderError::AudioError(format!(
            "Unsupported output sample format: {:?}",
            other
        ))),
    }
}

fn build_typed<T>(
    device: &cpal::Device,
    config: &StreamConfig,
    mut cursor: PlaybackCursor,
    started: Arc<AtomicBool>,
    playing: Arc<AtomicBool>,
) -> Result<cpal::Stream, RecorderError>
where
    T: SizedSample + FromSample<f32>,
{
    let mut scratch: Vec<f32> = Vec::new();

    device
        .build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                scratch.clear();
                scratch.resize(data.len(), 0.0);

                if started.load(Ordering::Relaxed) && !cursor.fill(&mut scratch) {
                    playing.store(false, Ordering::SeqCst);
                }

                for (out, &sample) in data.iter_mut().zip(scratch.iter()) {
                    *out = T::from_sample(sample);
                }
            },
            move |err| {
                log::error!("Audio playback error: {}", err);
            },
            None,
        )
        .map_err(|e| RecorderError::AudioError(format!("Failed to build output stream: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn audio(samples: Vec<f32>, sample_rate: u32, channels: u16) -> Arc<DecodedAudio> {
        Arc::new(DecodedAudio {
            samples,
            sample_rate,
            channels,
        })
    }

    #[test]
    fn test_mono_source_duplicated_to_stereo() {
        let mut cursor = PlaybackCursor::new(audio(vec![0.5, -0.5], 48_000, 1), 48_000, 2, 1.0);
        let mut out = vec![0.0; 4];
        let more = cursor.fill(&mut out);
        assert_eq!(out, vec![0.5, 0.5, -0.5, -0.5]);
        assert!(!more);
    }

    #[test]
    fn test_silence_after_end_of_stream() {
        let mut cursor = PlaybackCursor::new(audio(vec![0.25], 48_000, 1), 48_000, 1, 1.0);
        let mut out = vec![1.0; 3];
        assert!(!cursor.fill(&mut out));
        assert_eq!(out, vec![0.25, 0.0, 0.0]);
        assert!(cursor.is_finished());
    }

    #[test]
    fn test_rate_conversion_steps_through_source() {
        // 8 kHz source on a 16 kHz device repeats each source frame twice
        let mut cursor = PlaybackCursor::new(audio(vec![0.1, 0.2], 8_000, 1), 16_000, 1, 1.0);
        let mut out = vec![0.0; 4];
        cursor.fill(&mut out);
        assert_eq!(out, vec![0.1, 0.1, 0.2, 0.2]);
    }

    #[test]
    fn test_volume_is_applied() {
        let mut cursor = PlaybackCursor::new(audio(vec![0.5, 0.5], 48_000, 1), 48_000, 1, 0.5);
        let mut out = vec![0.0; 1];
        assert!(cursor.fill(&mut out));
        assert_eq!(out, vec![0.25]);
    }

    #[test]
    fn test_stereo_source_on_mono_device_uses_first_channel() {
        let mut cursor = PlaybackCursor::new(audio(vec![0.3, 0.9, 0.4, 0.8], 48_000, 2), 48_000, 1, 1.0);
        let mut out = vec![0.0; 2];
        cursor.fill(&mut out);
        assert_eq!(out, vec![0.3, 0.4]);
    }

    #[test]
    fn test_decode_missing_file_fails_with_playback_failed() {
        let err = decode_wav(Path::new("/definitely/not/here.wav")).unwrap_err();
        assert!(matches!(err, RecorderError::PlaybackFailed(_)));
    }

    #[test]
    fn test_decode_zero_sample_rate_fails_with_playback_failed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("zero_rate.wav");
        crate::testing::write_synthetic_recording(&path, 480, 48_000, 1).unwrap();

        // Zero the sample rate and byte rate fields of the fmt chunk
        let mut bytes = std::fs::read(&path).unwrap();
        bytes[24..32].fill(0);
        std::fs::write(&path, &bytes).unwrap();

        let err = decode_wav(&path).unwrap_err();
        assert!(matches!(err, RecorderError::PlaybackFailed(ref m) if m.contains("sample rate")));
    }
}
