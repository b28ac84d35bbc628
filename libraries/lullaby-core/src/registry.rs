//! Track registry
//!
//! Read-only catalog of the ambient loops the mixer knows about. The order of
//! `all()` is the default presentation order and the order tracks are loaded.

use crate::error::{MixerError, Result};
use crate::types::{TrackDescriptor, TrackId};
use std::collections::HashMap;
use std::sync::Arc;

/// Immutable, cheaply clonable track catalog
#[derive(Debug, Clone)]
pub struct TrackRegistry {
    tracks: Arc<[Arc<TrackDescriptor>]>,
    index: Arc<HashMap<TrackId, usize>>,
}

impl TrackRegistry {
    /// Build a registry from descriptors in presentation order.
    ///
    /// # Errors
    /// `InvalidCatalog` on duplicate ids or a default volume outside 0.0 - 1.0.
    pub fn new(tracks: Vec<TrackDescriptor>) -> Result<Self> {
        let mut index = HashMap::with_capacity(tracks.len());

        for (position, track) in tracks.iter().enumerate() {
            if !(0.0..=1.0).contains(&track.default_volume) {
                return Err(MixerError::InvalidCatalog(format!(
                    "default volume {} of {} is outside 0.0 - 1.0",
                    track.default_volume, track.id
                )));
            }
            if index.insert(track.id.clone(), position).is_some() {
                return Err(MixerError::InvalidCatalog(format!(
                    "duplicate track id {}",
                    track.id
                )));
            }
        }

        Ok(Self::from_indexed(tracks, index))
    }

    /// The built-in bedtime catalog
    pub fn bedtime() -> Self {
        let tracks = bedtime_tracks();
        let index = tracks
            .iter()
            .enumerate()
            .map(|(position, track)| (track.id.clone(), position))
            .collect();
        Self::from_indexed(tracks, index)
    }

    fn from_indexed(tracks: Vec<TrackDescriptor>, index: HashMap<TrackId, usize>) -> Self {
        Self {
            tracks: tracks.into_iter().map(Arc::new).collect(),
            index: Arc::new(index),
        }
    }

    /// All descriptors in presentation order
    pub fn all(&self) -> &[Arc<TrackDescriptor>] {
        &self.tracks
    }

    /// Look up a descriptor by id
    pub fn by_id(&self, id: &TrackId) -> Result<&Arc<TrackDescriptor>> {
        self.index
            .get(id)
            .map(|&position| &self.tracks[position])
            .ok_or_else(|| MixerError::UnknownTrackId(id.clone()))
    }

    pub fn contains(&self, id: &TrackId) -> bool {
        self.index.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}

impl Default for TrackRegistry {
    fn default() -> Self {
        Self::bedtime()
    }
}

const KALIMBA_OFFSETS: [&str; 19] = [
    "00:22", "01:48", "05:35", "09:11", "11:54", "13:48", "15:38", "17:49", "20:18", "22:30",
    "24:01", "26:04", "28:06", "31:06", "34:53", "37:02", "39:39", "41:51", "43:20",
];

fn bedtime_tracks() -> Vec<TrackDescriptor> {
    vec![
        TrackDescriptor::new("kalimba", "Kalimba", "assets/audio/kalimba.m4a")
            .with_start_offsets(KALIMBA_OFFSETS),
        TrackDescriptor::new("rain", "Rain", "assets/audio/rain.mp3"),
        TrackDescriptor::new(
            "water-stream-soft",
            "Water Stream (Soft)",
            "assets/audio/water stream soft.mp3",
        ),
        TrackDescriptor::new(
            "water-stream-intense",
            "Water Stream (Intense)",
            "assets/audio/water stream intense.mp3",
        ),
        TrackDescriptor::new("heartbeat", "Heartbeat", "assets/audio/heartbeat.mp3"),
        TrackDescriptor::new("sh-sh-sh", "Shush (x3)", "assets/audio/sh sh sh.mp3"),
        TrackDescriptor::new("sh-sh-sh-sh-sh", "Shush (x5)", "assets/audio/sh sh sh sh sh.mp3"),
    ]
}
