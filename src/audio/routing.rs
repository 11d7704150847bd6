//! Device audio mode and microphone mute state
//!
//! Both flags are process-wide. Only [`RoutingGuard`] switches them, so the
//! communication mode is held exactly as long as one recording session.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Device audio routing mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioMode {
    Normal,
    /// Voice capture routing, held while a recording is active
    Communication,
}

impl std::fmt::Display for AudioMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AudioMode::Normal => write!(f, "normal"),
            AudioMode::Communication => write!(f, "communication"),
        }
    }
}

/// Shared audio mode and microphone mute flags
#[derive(Debug, Clone)]
pub struct AudioRouting {
    communication: Arc<AtomicBool>,
    microphone_muted: Arc<AtomicBool>,
}

impl Default for AudioRouting {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioRouting {
    /// Normal mode with the microphone muted
    pub fn new() -> Self {
        Self {
            communication: Arc::new(AtomicBool::new(false)),
            microphone_muted: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn mode(&self) -> AudioMode {
        if self.communication.load(Ordering::SeqCst) {
            AudioMode::Communication
        } else {
            AudioMode::Normal
        }
    }

    pub fn is_microphone_muted(&self) -> bool {
        self.microphone_muted.load(Ordering::SeqCst)
    }

    /// Switch to communication mode and unmute the microphone until the
    /// returned guard is dropped.
    pub fn engage(&self) -> RoutingGuard {
        self.communication.store(true, Ordering::SeqCst);
        self.microphone_muted.store(false, Ordering::SeqCst);
        log::debug!("Audio mode set to {}", AudioMode::Communication);
        RoutingGuard {
            routing: self.clone(),
        }
    }
}

/// Restores normal mode and mutes the microphone on drop
#[derive(Debug)]
pub struct RoutingGuard {
    routing: AudioRouting,
}

impl Drop for RoutingGuard {
    fn drop(&mut self) {
        self.routing.communication.store(false, Ordering::SeqCst);
        self.routing.microphone_muted.store(true, Ordering::SeqCst);
        log::debug!("Audio mode restored to {}", AudioMode::Normal);
    }
}
