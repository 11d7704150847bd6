//! Synthetic recordings for offline tests
//!
//! Writes WAV files in the same format the recorder produces, so playback
//! decoding can be exercised without a microphone.

use std::path::Path;

use hound::{WavSpec, WavWriter};

use crate::audio::BITS_PER_SAMPLE;
use crate::errors::RecorderError;

/// Generate `frames` of a 440Hz sine at 0.3 amplitude, interleaved
pub fn synthetic_tone(frames: usize, sample_rate: u32, channels: u16) -> Vec<f32> {
    let frequency = 440.0;
    let mut samples = Vec::with_capacity(frames * channels as usize);

    for i in 0..frames {
        let t = i as f64 / sample_rate as f64;
        let value = (2.0 * std::f64::consts::PI * frequency * t).sin() as f32 * 0.3;
        for _ in 0..channels {
            samples.push(value);
        }
    }

    samples
}

/// Write a 16-bit PCM WAV file holding a synthetic tone
pub fn write_synthetic_recording(
    path: &Path,
    frames: usize,
    sample_rate: u32,
    channels: u16,
) -> Result<(), RecorderError> {
    let spec = WavSpec {
        channels,
        sample_rate,
        bits_per_sample: BITS_PER_SAMPLE,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = WavWriter::create(path, spec)?;
    for sample in synthetic_tone(frames, sample_rate, channels) {
        writer.write_sample((sample * i16::MAX as f32) as i16)?;
    }
    writer.finalize()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::decode_wav;

    #[test]
    fn test_tone_has_signal_without_clipping() {
        let samples = synthetic_tone(960, 48_000, 2);
        assert_eq!(samples.len(), 960 * 2);
        let peak = samples.iter().map(|s| s.abs()).fold(0.0, f32::max);
        assert!(peak > 0.1, "Audio should have signal, got {}", peak);
        assert!(peak < 0.5, "Audio shouldn't clip, got {}", peak);
    }

    #[test]
    fn test_written_file_decodes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        write_synthetic_recording(&path, 4_800, 48_000, 1).unwrap();

        let decoded = decode_wav(&path).unwrap();
        assert_eq!(decoded.sample_rate, 48_000);
        assert_eq!(decoded.channels, 1);
        assert_eq!(decoded.frames(), 4_800);
        assert!((decoded.duration_secs() - 0.1).abs() < 1e-9);
    }
}
