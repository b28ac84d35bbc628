//! Lullaby Mixer Core
//!
//! Platform-agnostic building blocks shared by the mixer crates.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Track Registry**: the immutable catalog of looping ambient tracks
//! - **Domain Types**: `TrackId`, `AudioSource`, `StartOffset`, `TrackDescriptor`
//! - **Engine Traits**: `AudioEngine` and `EngineHandle`, implemented per platform
//! - **Error Handling**: unified `MixerError` and `Result` types
//!
//! # Example
//!
//! ```rust
//! use lullaby_core::{StartOffset, TrackId, TrackRegistry};
//!
//! let registry = TrackRegistry::bedtime();
//! let kalimba = registry.by_id(&TrackId::new("kalimba")).unwrap();
//!
//! let first = StartOffset::parse(&kalimba.start_offsets[0]).unwrap();
//! assert_eq!(first.as_millis(), 22_000);
//! ```

#![forbid(unsafe_code)]

pub mod engine;
pub mod error;
pub mod registry;
pub mod types;

pub use engine::{AudioEngine, AudioMode, EngineHandle, InterruptionMode, LoadOptions, PlaybackStatus};
pub use error::{MixerError, Result};
pub use registry::TrackRegistry;
pub use types::{AudioSource, StartOffset, TrackDescriptor, TrackId};
