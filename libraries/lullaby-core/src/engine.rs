//! Audio engine capability
//!
//! The controller never decodes or outputs audio itself. Platforms provide an
//! [`AudioEngine`] that loads tracks into [`EngineHandle`]s; every call may
//! suspend while the engine performs its own native I/O.

use crate::error::Result;
use crate::types::{AudioSource, TrackId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// How a track is prepared by [`AudioEngine::load`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoadOptions {
    /// Engine volume right after loading (0.0 - 1.0)
    pub initial_volume: f32,

    /// Loop forever when the end is reached
    pub looping: bool,

    /// Start playing as soon as loading finishes
    pub autoplay: bool,
}

impl LoadOptions {
    /// Looping, paused, at the given volume
    pub fn looped(initial_volume: f32) -> Self {
        Self {
            initial_volume,
            looping: true,
            autoplay: false,
        }
    }
}

/// Position report from an engine handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PlaybackStatus {
    /// Current position in milliseconds
    pub position_ms: u64,

    /// Total duration in milliseconds, if the engine knows it
    pub duration_ms: Option<u64>,

    /// Whether the handle still holds decoded media
    pub is_loaded: bool,
}

/// Interruption behavior when other apps play audio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterruptionMode {
    /// Stop other audio while ours plays
    DoNotMix,
    /// Lower other audio while ours plays
    DuckOthers,
    /// Play alongside other audio
    MixWithOthers,
}

/// Process-wide output configuration, applied once before loading tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioMode {
    pub interruption: InterruptionMode,

    /// Keep playing when the app is backgrounded
    pub stays_active_in_background: bool,

    /// Keep playing when the device's silent switch is on
    pub plays_in_silent_mode: bool,

    /// Let the OS lower our volume for notifications
    pub duck_others: bool,

    /// Route output through the earpiece instead of the speaker
    pub play_through_earpiece: bool,

    pub allows_recording: bool,
}

impl Default for AudioMode {
    fn default() -> Self {
        Self {
            interruption: InterruptionMode::DoNotMix,
            stays_active_in_background: true,
            plays_in_silent_mode: true,
            duck_others: false,
            play_through_earpiece: false,
            allows_recording: false,
        }
    }
}

/// Audio engine trait
///
/// Implementers own decoding and output. Loading is the only operation that
/// creates per-track state.
#[async_trait]
pub trait AudioEngine: Send + Sync + 'static {
    /// Per-track playback handle produced by [`AudioEngine::load`]
    type Handle: EngineHandle;

    /// Configure the global output mode.
    ///
    /// Called once per controller. Failure only degrades background and
    /// silent-switch behavior, never playback itself.
    async fn configure_audio_mode(&self, mode: &AudioMode) -> Result<()>;

    /// Load a track.
    ///
    /// # Errors
    /// Returns `MixerError::Load` if the source cannot be opened or decoded
    async fn load(
        &self,
        track_id: &TrackId,
        source: &AudioSource,
        options: LoadOptions,
    ) -> Result<Self::Handle>;
}

/// Engine handle trait
///
/// One per loaded track. Calls on a single handle are never issued
/// concurrently by the controller.
#[async_trait]
pub trait EngineHandle: Send + Sync + 'static {
    /// Start or resume playback from the current position
    async fn play(&self) -> Result<()>;

    /// Pause, keeping position
    async fn pause(&self) -> Result<()>;

    /// Set output volume (0.0 = silent, 1.0 = full volume)
    async fn set_volume(&self, volume: f32) -> Result<()>;

    /// Move the play head
    async fn seek(&self, position_ms: u64) -> Result<()>;

    /// Current position and duration
    async fn status(&self) -> Result<PlaybackStatus>;

    /// Release native resources.
    ///
    /// Errors are reported but callers only log them.
    async fn unload(&self) -> Result<()>;
}
