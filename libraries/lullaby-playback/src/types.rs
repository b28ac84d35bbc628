//! Published controller state
//!
//! The presentation layer only ever sees these snapshots; live engine handles
//! stay inside the controller.

use lullaby_core::TrackId;
use serde::{Deserialize, Serialize};

/// Lifecycle of a controller instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ControllerPhase {
    /// Tracks are still loading; `tracks` is empty
    Loading,

    /// Tracks loaded and published
    Ready,

    /// Torn down; no further engine calls are made
    Closed,
}

/// Read-only view of one loaded track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackSnapshot {
    pub id: TrackId,
    pub title: String,
    pub is_playing: bool,

    /// Per-track volume (0.0 - 1.0), before the master volume is applied
    pub volume: f32,
}

/// Read-only view of the whole mixer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MixerSnapshot {
    pub phase: ControllerPhase,

    /// Master volume (0.0 - 1.0)
    pub global_volume: f32,

    /// Loaded tracks in catalog order. Tracks that failed to load are absent.
    pub tracks: Vec<TrackSnapshot>,
}

impl MixerSnapshot {
    pub(crate) fn loading() -> Self {
        Self {
            phase: ControllerPhase::Loading,
            global_volume: 1.0,
            tracks: Vec::new(),
        }
    }

    pub fn track(&self, id: &TrackId) -> Option<&TrackSnapshot> {
        self.tracks.iter().find(|t| &t.id == id)
    }

    pub(crate) fn track_mut(&mut self, id: &TrackId) -> Option<&mut TrackSnapshot> {
        self.tracks.iter_mut().find(|t| &t.id == id)
    }

    /// `false` for unknown ids
    pub fn is_playing(&self, id: &TrackId) -> bool {
        self.track(id).is_some_and(|t| t.is_playing)
    }

    /// Whether any of `ids` is currently playing
    pub fn any_playing<'a>(&self, ids: impl IntoIterator<Item = &'a TrackId>) -> bool {
        ids.into_iter().any(|id| self.is_playing(id))
    }

    pub fn playing_count(&self) -> usize {
        self.tracks.iter().filter(|t| t.is_playing).count()
    }
}

/// What a group play/pause toggle did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GroupAction {
    /// Nothing in the group was playing, so the group was started
    Played,

    /// Something in the group was playing, so the group was paused
    Paused,
}
