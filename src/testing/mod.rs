//! Testing utilities for CrabRecorder
//!
//! A mock backend and permission gate for hardware-free service tests, and
//! synthetic WAV recordings for playback tests.

pub mod mock_backend;
pub mod synthetic_data;

pub use mock_backend::{BackendEvent, MockBackend, MockPermission, MockProbe};
pub use synthetic_data::{synthetic_tone, write_synthetic_recording};
