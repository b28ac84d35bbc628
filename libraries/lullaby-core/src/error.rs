/// Core error types for Lullaby Mixer
use crate::types::TrackId;
use thiserror::Error;

/// Result type alias using `MixerError`
pub type Result<T> = std::result::Result<T, MixerError>;

/// Error taxonomy shared by the catalog, the engine traits and the controller
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MixerError {
    /// Id is not part of the catalog (or its track failed to load)
    #[error("Unknown track id: {0}")]
    UnknownTrackId(TrackId),

    /// The engine could not open or decode a track
    #[error("Failed to load track {track_id}: {message}")]
    Load { track_id: TrackId, message: String },

    /// Play or pause was rejected by the engine
    #[error("Playback error on {track_id}: {message}")]
    Playback { track_id: TrackId, message: String },

    /// Setting the engine volume failed
    #[error("Volume error on {track_id}: {message}")]
    Volume { track_id: TrackId, message: String },

    /// Seeking failed
    #[error("Seek error on {track_id}: {message}")]
    Seek { track_id: TrackId, message: String },

    /// Position/duration query failed
    #[error("Status error on {track_id}: {message}")]
    Status { track_id: TrackId, message: String },

    /// Process-wide audio mode configuration failed
    #[error("Audio mode configuration failed: {0}")]
    AudioMode(String),

    /// A start offset string is not a valid `mm:ss` value
    #[error("Invalid start offset: {0:?}")]
    InvalidOffset(String),

    /// The track catalog is inconsistent
    #[error("Invalid catalog: {0}")]
    InvalidCatalog(String),

    /// Operation is not valid in the controller's current lifecycle phase
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Controller was torn down
    #[error("Controller is closed")]
    Closed,

    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(String),
}

impl MixerError {
    /// Create a load error
    pub fn load(track_id: &TrackId, msg: impl Into<String>) -> Self {
        Self::Load {
            track_id: track_id.clone(),
            message: msg.into(),
        }
    }

    /// Create a playback error
    pub fn playback(track_id: &TrackId, msg: impl Into<String>) -> Self {
        Self::Playback {
            track_id: track_id.clone(),
            message: msg.into(),
        }
    }

    /// Create a volume error
    pub fn volume(track_id: &TrackId, msg: impl Into<String>) -> Self {
        Self::Volume {
            track_id: track_id.clone(),
            message: msg.into(),
        }
    }

    /// Create a seek error
    pub fn seek(track_id: &TrackId, msg: impl Into<String>) -> Self {
        Self::Seek {
            track_id: track_id.clone(),
            message: msg.into(),
        }
    }

    /// Create a status error
    pub fn status(track_id: &TrackId, msg: impl Into<String>) -> Self {
        Self::Status {
            track_id: track_id.clone(),
            message: msg.into(),
        }
    }

    /// Track the error refers to, if any
    pub fn track_id(&self) -> Option<&TrackId> {
        match self {
            Self::UnknownTrackId(id)
            | Self::Load { track_id: id, .. }
            | Self::Playback { track_id: id, .. }
            | Self::Volume { track_id: id, .. }
            | Self::Seek { track_id: id, .. }
            | Self::Status { track_id: id, .. } => Some(id),
            _ => None,
        }
    }
}
