//! Stream ownership thread
//!
//! cpal streams cannot cross threads, so each one is built, played and
//! dropped on a dedicated worker. Shutdown joins the worker, which
//! guarantees the device is released once `shutdown` returns.

use std::thread::{self, JoinHandle};

use cpal::traits::StreamTrait;
use crossbeam_channel::{bounded, unbounded, Sender};

use crate::errors::RecorderError;

enum Control {
    Play(Sender<Result<(), RecorderError>>),
    Shutdown,
}

pub(crate) struct StreamWorker {
    control: Sender<Control>,
    thread: Option<JoinHandle<()>>,
}

impl StreamWorker {
    /// Spawn a worker and build its stream. Returns once the stream exists
    /// or building it failed.
    pub(crate) fn spawn<F>(name: &str, build: F) -> Result<Self, RecorderError>
    where
        F: FnOnce() -> Result<cpal::Stream, RecorderError> + Send + 'static,
    {
        let (ready_tx, ready_rx) = bounded(1);
        let (control_tx, control_rx) = unbounded::<Control>();

        let thread = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                let stream = match build() {
                    Ok(stream) => {
                        let _ = ready_tx.send(Ok(()));
                        stream
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };

                for control in control_rx.iter() {
                    match control {
                        Control::Play(reply) => {
                            let result = stream.play().map_err(|e| {
                                RecorderError::AudioError(format!("Failed to start stream: {}", e))
                            });
                            let _ = reply.send(result);
                        }
                        Control::Shutdown => break,
                    }
                }

                if let Err(e) = stream.pause() {
                    log::debug!("Pausing stream before release failed: {}", e);
                }
            })
            .map_err(|e| RecorderError::AudioError(format!("Failed to spawn audio thread: {}", e)))?;

        match ready_rx.recv() {
            Ok(Ok(())) => Ok(Self {
                control: control_tx,
                thread: Some(thread),
            }),
            Ok(Err(e)) => {
                let _ = thread.join();
                Err(e)
            }
            Err(_) => {
                let _ = thread.join();
                Err(RecorderError::AudioError(
                    "Audio thread exited during setup".to_string(),
                ))
            }
        }
    }

    pub(crate) fn play(&self) -> Result<(), RecorderError> {
        let (reply_tx, reply_rx) = bounded(1);
        self.control
            .send(Control::Play(reply_tx))
            .map_err(|_| RecorderError::AudioError("Audio thread is not running".to_string()))?;
        reply_rx
            .recv()
            .map_err(|_| RecorderError::AudioError("Audio thread stopped unexpectedly".to_string()))?
    }

    /// Drop the stream and join the worker (idempotent)
    pub(crate) fn shutdown(&mut self) {
        if let Some(thread) = self.thread.take() {
            let _ = self.control.send(Control::Shutdown);
            if thread.join().is_err() {
                log::error!("Audio thread panicked during shutdown");
            }
        }
    }
}

impl Drop for StreamWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}
