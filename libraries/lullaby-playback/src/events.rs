//! Controller events
//!
//! Engine failures never abort a command; they are reported here so the
//! presentation layer (or a test) can observe them.

use lullaby_core::TrackId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Engine call that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EngineOperation {
    Play,
    Pause,
    SetVolume,
    Seek,
    Status,
    Unload,
}

impl fmt::Display for EngineOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EngineOperation::Play => "play",
            EngineOperation::Pause => "pause",
            EngineOperation::SetVolume => "set_volume",
            EngineOperation::Seek => "seek",
            EngineOperation::Status => "status",
            EngineOperation::Unload => "unload",
        };
        f.write_str(name)
    }
}

/// Events emitted by the playback controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ControllerEvent {
    /// Audio mode configuration failed; playback continues
    AudioModeFailed {
        /// Engine error message
        message: String,
    },

    /// A track could not be loaded and is absent from the mixer
    TrackLoadFailed {
        track_id: TrackId,
        message: String,
    },

    /// Initial load finished and state was published
    Ready {
        /// Tracks that loaded
        loaded: usize,
        /// Tracks that failed to load
        failed: usize,
    },

    /// An engine call failed; the controller kept its optimistic state
    EngineFailure {
        track_id: TrackId,
        operation: EngineOperation,
        message: String,
    },

    /// A group command named an id with no loaded track
    TrackSkipped {
        track_id: TrackId,
    },

    /// Controller was torn down
    Closed,
}
