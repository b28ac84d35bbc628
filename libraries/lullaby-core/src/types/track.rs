/// Track descriptor domain type
use crate::types::{AudioSource, TrackId};
use serde::{Deserialize, Serialize};

/// Immutable catalog entry for one looping ambient track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackDescriptor {
    /// Unique track identifier
    pub id: TrackId,

    /// Display title
    pub title: String,

    /// Locator passed to the engine at load time
    pub audio_source: AudioSource,

    /// Volume applied at load time (0.0 - 1.0)
    pub default_volume: f32,

    /// Candidate `mm:ss` start positions; empty means always start at 0
    #[serde(default)]
    pub start_offsets: Vec<String>,
}

impl TrackDescriptor {
    /// Create a descriptor at full default volume with no start offsets
    pub fn new(
        id: impl Into<TrackId>,
        title: impl Into<String>,
        audio_source: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            audio_source: AudioSource::new(audio_source),
            default_volume: 1.0,
            start_offsets: Vec::new(),
        }
    }

    /// Set the default volume
    #[must_use]
    pub fn with_default_volume(mut self, volume: f32) -> Self {
        self.default_volume = volume;
        self
    }

    /// Set the candidate start offsets
    #[must_use]
    pub fn with_start_offsets<I, S>(mut self, offsets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.start_offsets = offsets.into_iter().map(Into::into).collect();
        self
    }
}
