//! Domain types for Lullaby Mixer

mod ids;
mod offset;
mod track;

pub use ids::{AudioSource, TrackId};
pub use offset::StartOffset;
pub use track::TrackDescriptor;
