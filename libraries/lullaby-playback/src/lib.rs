//! Lullaby Mixer - Playback Control
//!
//! Multi-track playback controller for the bedtime sound mixer.
//!
//! This crate provides:
//! - Concurrent loading of every catalog track as a looping engine handle
//! - Per-track toggle and volume, plus a master volume
//! - Group play / pause / stop over a selection of tracks
//! - Randomized start offsets for tracks started from the beginning
//! - Published state snapshots (`tokio::sync::watch`) and failure events
//!   (`tokio::sync::broadcast`)
//! - Per-controller logging policy and file/environment configuration
//!
//! # Architecture
//!
//! `lullaby-playback` never touches a platform audio API. The engine is
//! injected through [`lullaby_core::AudioEngine`]; a native bridge
//! implements it on device, a fake implements it in tests.
//!
//! # Example
//!
//! ```rust,no_run
//! use lullaby_core::{TrackId, TrackRegistry};
//! use lullaby_playback::{ControllerConfig, PlaybackController};
//! # use lullaby_core::{AudioEngine, AudioMode, AudioSource, EngineHandle, LoadOptions, PlaybackStatus, Result};
//! # struct NativeEngine;
//! # struct NativeHandle;
//! # #[async_trait::async_trait]
//! # impl EngineHandle for NativeHandle {
//! #     async fn play(&self) -> Result<()> { Ok(()) }
//! #     async fn pause(&self) -> Result<()> { Ok(()) }
//! #     async fn set_volume(&self, _volume: f32) -> Result<()> { Ok(()) }
//! #     async fn seek(&self, _position_ms: u64) -> Result<()> { Ok(()) }
//! #     async fn status(&self) -> Result<PlaybackStatus> { Ok(PlaybackStatus::default()) }
//! #     async fn unload(&self) -> Result<()> { Ok(()) }
//! # }
//! # #[async_trait::async_trait]
//! # impl AudioEngine for NativeEngine {
//! #     type Handle = NativeHandle;
//! #     async fn configure_audio_mode(&self, _mode: &AudioMode) -> Result<()> { Ok(()) }
//! #     async fn load(&self, _id: &TrackId, _source: &AudioSource, _options: LoadOptions) -> Result<NativeHandle> { Ok(NativeHandle) }
//! # }
//!
//! # async fn run() -> lullaby_core::Result<()> {
//! let config = ControllerConfig::load()?;
//! lullaby_playback::init_subscriber(&config.logging)?;
//!
//! let controller = PlaybackController::new(NativeEngine, TrackRegistry::bedtime(), config);
//! controller.initialize().await?;
//!
//! controller.toggle_track(&TrackId::new("rain")).await?;
//! controller.set_global_volume(0.4).await?;
//!
//! let mut state = controller.subscribe();
//! state.changed().await.ok();
//! println!("{} tracks playing", state.borrow().playing_count());
//!
//! controller.teardown().await;
//! # Ok(())
//! # }
//! ```

mod logging;

pub mod config;
pub mod controller;
pub mod events;
pub mod start_offset;
pub mod types;

// Public exports
pub use config::ControllerConfig;
pub use controller::PlaybackController;
pub use events::{ControllerEvent, EngineOperation};
pub use logging::{init_subscriber, Logger, LoggingConfig};
pub use start_offset::{choose_start, choose_start_with, StartChoice};
pub use types::{ControllerPhase, GroupAction, MixerSnapshot, TrackSnapshot};
