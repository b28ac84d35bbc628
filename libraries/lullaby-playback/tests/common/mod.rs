//! Shared test helpers: a recording fake engine and small catalogs

use async_trait::async_trait;
use lullaby_core::{
    AudioEngine, AudioMode, AudioSource, EngineHandle, LoadOptions, MixerError, PlaybackStatus,
    Result, TrackDescriptor, TrackId, TrackRegistry,
};
use lullaby_playback::{
    ControllerConfig, ControllerEvent, EngineOperation, LoggingConfig, PlaybackController,
};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;
use tokio::sync::{broadcast, watch};

static INIT: Once = Once::new();

pub fn init_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::DEBUG)
            .try_init();
    });
}

/// Default duration reported for every fake track (one hour)
pub const DEFAULT_DURATION_MS: u64 = 3_600_000;

/// Simulated play time credited to a track each time it is paused
pub const ELAPSED_PER_PLAY_MS: u64 = 1_000;

/// One recorded engine call
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Load { initial_volume: f32, looping: bool },
    Status,
    Seek(u64),
    SetVolume(f32),
    Play,
    Pause,
    Unload,
}

#[derive(Default)]
struct EngineState {
    audio_mode: Option<AudioMode>,
    audio_mode_fails: bool,
    calls: HashMap<TrackId, Vec<Call>>,
    positions: HashMap<TrackId, u64>,
    durations: HashMap<TrackId, Option<u64>>,
    failing_loads: HashSet<TrackId>,
    failing_ops: HashSet<(TrackId, EngineOperation)>,
    not_loaded: HashSet<TrackId>,
    live_handles: usize,
}

impl EngineState {
    fn record(&mut self, id: &TrackId, call: Call) {
        self.calls.entry(id.clone()).or_default().push(call);
    }

    fn check(&self, id: &TrackId, op: EngineOperation) -> Result<()> {
        if !self.failing_ops.contains(&(id.clone(), op)) {
            return Ok(());
        }
        let message = format!("injected {op} failure");
        Err(match op {
            EngineOperation::Play | EngineOperation::Pause | EngineOperation::Unload => {
                MixerError::playback(id, message)
            }
            EngineOperation::SetVolume => MixerError::volume(id, message),
            EngineOperation::Seek => MixerError::seek(id, message),
            EngineOperation::Status => MixerError::status(id, message),
        })
    }
}

/// In-memory engine that records every call per track
#[derive(Clone)]
pub struct FakeEngine {
    state: Arc<Mutex<EngineState>>,
    gate: Arc<watch::Sender<bool>>,
}

impl Default for FakeEngine {
    fn default() -> Self {
        let (gate, _) = watch::channel(true);
        Self {
            state: Arc::default(),
            gate: Arc::new(gate),
        }
    }
}

impl FakeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut EngineState) -> T) -> T {
        f(&mut self.state.lock().unwrap())
    }

    // ----- configuration -----

    pub fn fail_audio_mode(&self) {
        self.with_state(|s| s.audio_mode_fails = true);
    }

    pub fn fail_load(&self, id: &str) {
        self.with_state(|s| s.failing_loads.insert(TrackId::new(id)));
    }

    pub fn fail(&self, id: &str, op: EngineOperation) {
        self.with_state(|s| s.failing_ops.insert((TrackId::new(id), op)));
    }

    pub fn heal(&self, id: &str, op: EngineOperation) {
        self.with_state(|s| s.failing_ops.remove(&(TrackId::new(id), op)));
    }

    pub fn set_duration(&self, id: &str, duration_ms: Option<u64>) {
        self.with_state(|s| s.durations.insert(TrackId::new(id), duration_ms));
    }

    pub fn set_position(&self, id: &str, position_ms: u64) {
        self.with_state(|s| s.positions.insert(TrackId::new(id), position_ms));
    }

    /// Make `status` report the track as not loaded
    pub fn report_not_loaded(&self, id: &str) {
        self.with_state(|s| s.not_loaded.insert(TrackId::new(id)));
    }

    /// Block every `load` until [`FakeEngine::release_loads`]
    pub fn hold_loads(&self) {
        self.gate.send_replace(false);
    }

    pub fn release_loads(&self) {
        self.gate.send_replace(true);
    }

    // ----- inspection -----

    pub fn audio_mode(&self) -> Option<AudioMode> {
        self.with_state(|s| s.audio_mode)
    }

    pub fn calls(&self, id: &str) -> Vec<Call> {
        self.with_state(|s| s.calls.get(&TrackId::new(id)).cloned().unwrap_or_default())
    }

    pub fn clear_calls(&self) {
        self.with_state(|s| s.calls.clear());
    }

    pub fn seeks(&self, id: &str) -> Vec<u64> {
        self.calls(id)
            .into_iter()
            .filter_map(|call| match call {
                Call::Seek(ms) => Some(ms),
                _ => None,
            })
            .collect()
    }

    pub fn last_volume(&self, id: &str) -> Option<f32> {
        self.calls(id).into_iter().rev().find_map(|call| match call {
            Call::SetVolume(v) => Some(v),
            _ => None,
        })
    }

    pub fn count(&self, id: &str, call: &Call) -> usize {
        self.calls(id).iter().filter(|c| *c == call).count()
    }

    pub fn position(&self, id: &str) -> u64 {
        self.with_state(|s| s.positions.get(&TrackId::new(id)).copied().unwrap_or(0))
    }

    /// Handles loaded and not yet unloaded
    pub fn live_handles(&self) -> usize {
        self.with_state(|s| s.live_handles)
    }
}

#[async_trait]
impl AudioEngine for FakeEngine {
    type Handle = FakeHandle;

    async fn configure_audio_mode(&self, mode: &AudioMode) -> Result<()> {
        self.with_state(|s| {
            if s.audio_mode_fails {
                return Err(MixerError::AudioMode("injected audio mode failure".to_string()));
            }
            s.audio_mode = Some(*mode);
            Ok(())
        })
    }

    async fn load(
        &self,
        track_id: &TrackId,
        _source: &AudioSource,
        options: LoadOptions,
    ) -> Result<Self::Handle> {
        let mut gate = self.gate.subscribe();
        let _ = gate.wait_for(|open| *open).await;

        self.with_state(|s| {
            s.record(
                track_id,
                Call::Load {
                    initial_volume: options.initial_volume,
                    looping: options.looping,
                },
            );
            if s.failing_loads.contains(track_id) {
                return Err(MixerError::load(track_id, "injected load failure"));
            }
            s.live_handles += 1;
            Ok(())
        })?;

        Ok(FakeHandle {
            id: track_id.clone(),
            state: Arc::clone(&self.state),
        })
    }
}

pub struct FakeHandle {
    id: TrackId,
    state: Arc<Mutex<EngineState>>,
}

impl FakeHandle {
    fn call<T>(
        &self,
        call: Call,
        op: EngineOperation,
        f: impl FnOnce(&mut EngineState) -> T,
    ) -> Result<T> {
        let mut state = self.state.lock().unwrap();
        state.record(&self.id, call);
        state.check(&self.id, op)?;
        Ok(f(&mut state))
    }
}

#[async_trait]
impl EngineHandle for FakeHandle {
    async fn play(&self) -> Result<()> {
        // Yield so overlapping operations on other tracks can interleave
        tokio::task::yield_now().await;
        self.call(Call::Play, EngineOperation::Play, |_| ())
    }

    async fn pause(&self) -> Result<()> {
        tokio::task::yield_now().await;
        let id = self.id.clone();
        self.call(Call::Pause, EngineOperation::Pause, |s| {
            *s.positions.entry(id).or_default() += ELAPSED_PER_PLAY_MS;
        })
    }

    async fn set_volume(&self, volume: f32) -> Result<()> {
        self.call(Call::SetVolume(volume), EngineOperation::SetVolume, |_| ())
    }

    async fn seek(&self, position_ms: u64) -> Result<()> {
        let id = self.id.clone();
        self.call(Call::Seek(position_ms), EngineOperation::Seek, |s| {
            s.positions.insert(id, position_ms);
        })
    }

    async fn status(&self) -> Result<PlaybackStatus> {
        tokio::time::sleep(Duration::from_millis(1)).await;
        let id = self.id.clone();
        self.call(Call::Status, EngineOperation::Status, |s| PlaybackStatus {
            position_ms: s.positions.get(&id).copied().unwrap_or(0),
            duration_ms: s
                .durations
                .get(&id)
                .copied()
                .unwrap_or(Some(DEFAULT_DURATION_MS)),
            is_loaded: !s.not_loaded.contains(&id),
        })
    }

    async fn unload(&self) -> Result<()> {
        self.call(Call::Unload, EngineOperation::Unload, |s| {
            s.live_handles -= 1;
        })
    }
}

// ===== Catalogs =====

/// Small catalog: rain (no offsets), heartbeat (two offsets), broken (malformed offset)
pub fn test_registry() -> TrackRegistry {
    TrackRegistry::new(vec![
        TrackDescriptor::new("rain", "Rain", "rain.mp3"),
        TrackDescriptor::new("heartbeat", "Heartbeat", "heartbeat.mp3")
            .with_start_offsets(["00:10", "00:20"]),
        TrackDescriptor::new("broken", "Broken", "broken.mp3").with_start_offsets(["01:70"]),
        TrackDescriptor::new("fan", "Fan", "fan.mp3").with_default_volume(0.5),
    ])
    .unwrap()
}

pub fn ids(list: &[&str]) -> Vec<TrackId> {
    list.iter().map(|id| TrackId::new(*id)).collect()
}

pub fn verbose_config() -> ControllerConfig {
    ControllerConfig {
        logging: LoggingConfig {
            enabled: true,
            verbose: true,
        },
        ..ControllerConfig::default()
    }
}

/// Controller over `engine` and the test catalog, already initialized
pub async fn ready_controller(engine: &FakeEngine) -> PlaybackController<FakeEngine> {
    init_tracing();
    let controller = PlaybackController::new(engine.clone(), test_registry(), verbose_config());
    controller.initialize().await.unwrap();
    engine.clear_calls();
    controller
}

pub fn approx_eq(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-6
}

/// Everything buffered on an event receiver
pub fn drain(events: &mut broadcast::Receiver<ControllerEvent>) -> Vec<ControllerEvent> {
    let mut drained = Vec::new();
    while let Ok(event) = events.try_recv() {
        drained.push(event);
    }
    drained
}

pub fn failures(events: &[ControllerEvent]) -> Vec<(TrackId, EngineOperation)> {
    events
        .iter()
        .filter_map(|event| match event {
            ControllerEvent::EngineFailure {
                track_id,
                operation,
                ..
            } => Some((track_id.clone(), *operation)),
            _ => None,
        })
        .collect()
}
