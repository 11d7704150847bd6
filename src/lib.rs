//! CrabRecorder: microphone recording and playback for Tauri applications
//!
//! This crate bridges an application shell to the host's audio devices:
//! record the microphone to a WAV file in the app cache directory, list
//! recordings, play one back, and check microphone permission.
//!
//! # Features
//! - One recording session and one playback session at a time
//! - Cross-platform capture and playback via cpal
//! - WAV (16-bit PCM) recordings named by capture timestamp
//! - Microphone permission checks (macOS AVFoundation, device probing elsewhere)
//! - A JSON method channel for shells that do not use Tauri IPC
//!
//! # Usage
//! Add this to your `Cargo.toml`:
//! ```toml
//! [dependencies]
//! crabrecorder = "0.1"
//! tauri = { version = "2.0" }
//! ```
//!
//! Then in your Tauri app:
//! ```rust,ignore
//! fn main() {
//!     tauri::Builder::default()
//!         .plugin(crabrecorder::init())
//!         .run(tauri::generate_context!())
//!         .expect("error while running tauri application");
//! }
//! ```
//!
//! The frontend then calls e.g. `invoke("plugin:crabrecorder|start_recording")`.
pub mod audio;
pub mod channel;
pub mod commands;
pub mod config;
pub mod errors;
pub mod permissions;
pub mod service;
pub mod storage;

// Testing utilities - mock backend and synthetic recordings for offline testing
pub mod testing;

// Re-exports for convenience
pub use audio::{AudioBackend, AudioMode, CpalBackend, NativePlayer, NativeRecorder};
pub use channel::{MethodCall, Reply, Response, CHANNEL_NAME};
pub use config::CrabRecorderConfig;
pub use errors::RecorderError;
pub use permissions::{MicrophonePermission, PermissionInfo, PermissionStatus, SystemPermission};
pub use service::{AudioService, ServiceStatus, SystemAudioService};
pub use storage::RecordingStore;

use tauri::{
    plugin::{Builder, TauriPlugin},
    Manager, Runtime,
};

/// Initialize the CrabRecorder plugin with all commands
pub fn init<R: Runtime>() -> TauriPlugin<R> {
    Builder::new("crabrecorder")
        .invoke_handler(tauri::generate_handler![
            // Recording and playback
            commands::recorder::start_recording,
            commands::recorder::stop_recording,
            commands::recorder::get_recordings,
            commands::recorder::play_recording,
            commands::recorder::stop_playback,
            commands::recorder::get_audio_status,
            // Permission commands
            commands::permissions::check_microphone_permission,
            commands::permissions::request_microphone_permission,
            // Device commands
            commands::devices::list_audio_input_devices,
            commands::devices::list_audio_output_devices,
            commands::devices::get_default_input_device,
            // Configuration commands
            commands::config::get_config,
            commands::config::update_config,
            commands::config::reset_config,
            commands::config::update_recording_config,
            commands::config::update_playback_config,
            commands::config::update_storage_config,
        ])
        .setup(|app, _api| {
            match app.path().app_cache_dir() {
                Ok(dir) => commands::recorder::register_app_cache_dir(dir),
                Err(e) => log::warn!("App cache directory unavailable, using defaults: {}", e),
            }
            Ok(())
        })
        .build()
}

/// Initialize logging for the recorder
pub fn init_logging() {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "crabrecorder=info");
    }
    let _ = env_logger::try_init();
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Get crate information
pub fn get_info() -> CrateInfo {
    CrateInfo {
        name: NAME.to_string(),
        version: VERSION.to_string(),
        description: DESCRIPTION.to_string(),
    }
}

/// Crate information structure
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CrateInfo {
    pub name: String,
    pub version: String,
    pub description: String,
}
