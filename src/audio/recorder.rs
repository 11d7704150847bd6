//! Microphone capture into a WAV file
//!
//! The WAV writer is created during prepare so an unwritable cache directory
//! fails before any audio is captured. Samples arriving before `start`, or
//! after the stream is told to stop, are discarded. While the microphone is
//! muted the recorder writes silence so the file keeps wall-clock length.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use cpal::traits::DeviceTrait;
use cpal::{Sample, SampleFormat, SizedSample, StreamConfig};
use hound::{WavSpec, WavWriter};

use super::device::find_input_device;
use super::routing::AudioRouting;
use super::worker::StreamWorker;
use super::{NativeRecorder, RecorderSpec};
use crate::errors::RecorderError;

/// Recordings are 16-bit signed PCM
pub const BITS_PER_SAMPLE: u16 = 16;

type SharedWriter = Arc<Mutex<Option<WavWriter<BufWriter<File>>>>>;

/// cpal input stream writing into a WAV file
pub struct CpalRecorder {
    worker: StreamWorker,
    writer: SharedWriter,
    capturing: Arc<AtomicBool>,
    output_path: PathBuf,
    stopped: bool,
}

impl CpalRecorder {
    /// Open the input device and create the output file
    pub fn prepare(spec: &RecorderSpec, routing: AudioRouting) -> Result<Self, RecorderError> {
        let writer: SharedWriter = Arc::new(Mutex::new(None));
        let capturing = Arc::new(AtomicBool::new(false));

        let build_spec = spec.clone();
        let build_writer = writer.clone();
        let build_capturing = capturing.clone();

        let worker = StreamWorker::spawn("crabrecorder-capture", move || {
            build_capture_stream(&build_spec, build_writer, build_capturing, routing)
        });

        let worker = match worker {
            Ok(worker) => worker,
            Err(e) => {
                discard_partial_file(&writer, &spec.output_path);
                return Err(e);
            }
        };

        log::info!("Recorder prepared for {}", spec.output_path.display());
        Ok(Self {
            worker,
            writer,
            capturing,
            output_path: spec.output_path.clone(),
            stopped: false,
        })
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    fn finalize(&mut self) -> Result<(), RecorderError> {
        let writer = self
            .writer
            .lock()
            .map_err(|_| RecorderError::Internal("WAV writer lock poisoned".to_string()))?
            .take();

        match writer {
            Some(writer) => {
                let samples = writer.len();
                writer.finalize()?;
                log::info!(
                    "Recording finalized: {} ({} samples)",
                    self.output_path.display(),
                    samples
                );
                Ok(())
            }
            None => Ok(()),
        }
    }
}

impl NativeRecorder for CpalRecorder {
    fn start(&mut self) -> Result<(), RecorderError> {
        if self.stopped {
            return Err(RecorderError::AudioError(
                "Recorder has already been stopped".to_string(),
            ));
        }
        self.worker.play()?;
        self.capturing.store(true, Ordering::SeqCst);
        log::info!("Recording started: {}", self.output_path.display());
        Ok(())
    }

    fn stop(&mut self) -> Result<(), RecorderError> {
        if self.stopped {
            return Ok(());
        }
        self.stopped = true;
        self.capturing.store(false, Ordering::SeqCst);
        self.worker.shutdown();
        self.finalize()
    }
}

impl Drop for CpalRecorder {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            log::warn!("Failed to finalize recording on release: {}", e);
        }
    }
}

fn discard_partial_file(writer: &SharedWriter, path: &Path) {
    let had_writer = writer.lock().map(|mut w| w.take().is_some()).unwrap_or(false);
    if had_writer {
        if let Err(e) = fs::remove_file(path) {
            log::debug!("Could not remove partial recording {}: {}", path.display(), e);
        }
    }
}

fn build_capture_stream(
    spec: &RecorderSpec,
    writer: SharedWriter,
    capturing: Arc<AtomicBool>,
    routing: AudioRouting,
) -> Result<cpal::Stream, RecorderError> {
    let device = find_input_device(spec.device.as_deref())?;
    let supported = device
        .default_input_config()
        .map_err(|e| RecorderError::AudioError(format!("No supported input config: {}", e)))?;

    let sample_rate = match spec.sample_rate {
        0 => supported.sample_rate().0,
        rate => rate,
    };
    let channels = match spec.channels {
        0 => supported.channels(),
        count => count,
    };

    let config = StreamConfig {
        channels,
        sample_rate: cpal::SampleRate(sample_rate),
        buffer_size: cpal::BufferSize::Default,
    };

    let wav_spec = WavSpec {
        channels,
        sample_rate,
        bits_per_sample: BITS_PER_SAMPLE,
        sample_format: hound::SampleFormat::Int,
    };
    let wav = WavWriter::create(&spec.output_path, wav_spec)?;
    *writer
        .lock()
        .map_err(|_| RecorderError::Internal("WAV writer lock poisoned".to_string()))? = Some(wav);

    log::debug!(
        "Capture config: {} Hz, {} channel(s), device format {:?}",
        sample_rate,
        channels,
        supported.sample_format()
    );

    match supported.sample_format() {
        SampleFormat::F32 => build_typed::<f32>(&device, &config, writer, capturing, routing),
        SampleFormat::I16 => build_typed::<i16>(&device, &config, writer, capturing, routing),
        SampleFormat::U16 => build_typed::<u16>(&device, &config, writer, capturing, routing),
        SampleFormat::I32 => build_typed::<i32>(&device, &config, writer, capturing, routing),
        other => Err(RecorderError::AudioError(format!(
            "Unsupported input sample format: {:?}",
            other
        ))),
    }
}

fn build_typed<T>(
    device: &cpal::Device,
    config: &StreamConfig,
    writer: SharedWriter,
    capturing: Arc<AtomicBool>,
    routing: AudioRouting,
) -> Result<cpal::Stream, RecorderError>
where
    T: SizedSample,
    i16: cpal::FromSample<T>,
{
    let mut write_failed = false;

    device
        .build_input_stream(
            config,
            move |data: &[T], _: &cpal::InputCallbackInfo| {
                if !capturing.load(Ordering::Relaxed) {
                    return;
                }
                let muted = routing.is_microphone_muted();

                let Ok(mut guard) = writer.lock() else {
                    return;
                };
                let Some(wav) = guard.as_mut() else {
                    return;
                };

                for &sample in data {
                    let value: i16 = if muted { 0 } else { sample.to_sample::<i16>() };
                    if let Err(e) = wav.write_sample(value) {
                        if !write_failed {
                            log::error!("Failed to write audio sample: {}", e);
                            write_failed = true;
                        }
                        return;
                    }
                }
            },
            move |err| {
                log::error!("Audio capture error: {}", err);
            },
            None,
        )
        .map_err(|e| RecorderError::AudioError(format!("Failed to build input stream: {}", e)))
}
