//! Playback controller - multi-track orchestration
//!
//! Owns one engine handle per loaded track plus the master volume, turns
//! user intents (toggle, group play/pause, volume) into engine calls and
//! publishes a [`MixerSnapshot`] after each one settles.
//!
//! Operations on one track are serialized by that track's slot lock, which is
//! held across every engine call of the operation. Operations on different
//! tracks run concurrently. No operation holds two slot locks at once.
//!
//! Engine failures are best-effort: the controller keeps its optimistic state
//! (a toggle that failed to reach the engine still flips `is_playing`), logs
//! the failure and emits [`ControllerEvent::EngineFailure`].

use crate::{
    config::ControllerConfig,
    events::{ControllerEvent, EngineOperation},
    logging::{log_debug, log_info, log_warn, Logger},
    start_offset::{choose_start, StartChoice},
    types::{ControllerPhase, GroupAction, MixerSnapshot, TrackSnapshot},
};
use futures_util::future::join_all;
use lullaby_core::{
    AudioEngine, EngineHandle, LoadOptions, MixerError, Result, TrackDescriptor, TrackId,
    TrackRegistry,
};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};
use tokio::sync::{broadcast, watch, Mutex as SlotMutex, MutexGuard as SlotGuard};
use tokio::task::JoinHandle;
use tracing::error;

/// Buffered events per subscriber before the oldest are dropped
const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Created,
    Loading,
    Ready,
    Closed,
}

/// Live state of one loaded track
struct LoadedTrack<H> {
    descriptor: Arc<TrackDescriptor>,

    /// `None` once released by teardown
    handle: Option<H>,

    is_playing: bool,

    /// Per-track volume, independent of the master volume
    volume: f32,

    /// Last volume the engine accepted for this handle
    engine_volume: f32,

    /// Bumped on every change to `is_playing` or `volume`
    revision: u64,
}

impl<H> LoadedTrack<H> {
    fn new(descriptor: Arc<TrackDescriptor>, handle: H, engine_volume: f32) -> Self {
        Self {
            volume: descriptor.default_volume,
            descriptor,
            handle: Some(handle),
            is_playing: false,
            engine_volume,
            revision: 0,
        }
    }

    fn id(&self) -> &TrackId {
        &self.descriptor.id
    }

    fn snapshot(&self) -> TrackSnapshot {
        TrackSnapshot {
            id: self.descriptor.id.clone(),
            title: self.descriptor.title.clone(),
            is_playing: self.is_playing,
            volume: self.volume,
        }
    }

    fn update(&self) -> TrackUpdate {
        TrackUpdate {
            id: self.descriptor.id.clone(),
            revision: self.revision,
            is_playing: self.is_playing,
            volume: self.volume,
        }
    }
}

/// Track state captured under its slot lock, waiting to be published
struct TrackUpdate {
    id: TrackId,
    revision: u64,
    is_playing: bool,
    volume: f32,
}

struct TrackSlot<H> {
    track: SlotMutex<LoadedTrack<H>>,
}

/// Fixed table of loaded tracks, built once when loading completes
struct SlotTable<H> {
    slots: Vec<TrackSlot<H>>,
    index: HashMap<TrackId, usize>,
}

impl<H> SlotTable<H> {
    fn new(tracks: Vec<LoadedTrack<H>>) -> Self {
        let index = tracks
            .iter()
            .enumerate()
            .map(|(position, track)| (track.id().clone(), position))
            .collect();
        let slots = tracks
            .into_iter()
            .map(|track| TrackSlot {
                track: SlotMutex::new(track),
            })
            .collect();
        Self { slots, index }
    }

    fn get(&self, id: &TrackId) -> Option<&TrackSlot<H>> {
        self.index.get(id).map(|&position| &self.slots[position])
    }
}

/// Multi-track playback controller
///
/// One instance per mounted mixer screen. Create it with [`PlaybackController::new`],
/// load tracks with [`PlaybackController::initialize`] and release them with
/// [`PlaybackController::teardown`].
///
/// # Example
///
/// ```rust,ignore
/// let controller = Arc::new(PlaybackController::new(engine, TrackRegistry::bedtime(), config));
/// controller.initialize().await?;
///
/// controller.toggle_track(&TrackId::new("rain")).await?;
/// controller.set_global_volume(0.5).await?;
///
/// let selection = [TrackId::new("rain"), TrackId::new("heartbeat")];
/// controller.toggle_selected_play_pause(&selection).await?;
///
/// controller.teardown().await;
/// ```
pub struct PlaybackController<E: AudioEngine> {
    engine: E,
    registry: TrackRegistry,
    config: ControllerConfig,
    logger: Logger,
    lifecycle: Mutex<Lifecycle>,
    slots: OnceLock<SlotTable<E::Handle>>,

    /// Master volume stored as `f32` bits
    global_volume: AtomicU32,

    /// Newest revision published per track; older updates are dropped
    published: Mutex<HashMap<TrackId, u64>>,

    state: watch::Sender<MixerSnapshot>,
    events: broadcast::Sender<ControllerEvent>,
}

impl<E: AudioEngine> PlaybackController<E> {
    /// Create a controller. No engine calls are made until `initialize`.
    pub fn new(engine: E, registry: TrackRegistry, config: ControllerConfig) -> Self {
        let (state, _) = watch::channel(MixerSnapshot::loading());
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Self {
            engine,
            registry,
            logger: Logger::new(config.logging),
            config,
            lifecycle: Mutex::new(Lifecycle::Created),
            slots: OnceLock::new(),
            global_volume: AtomicU32::new(1.0_f32.to_bits()),
            published: Mutex::default(),
            state,
            events,
        }
    }

    // ===== Lifecycle =====

    /// Configure the audio mode and load every catalog track concurrently.
    ///
    /// Tracks that fail to load are left out of the published state. If the
    /// controller is torn down before loading finishes, every loaded handle is
    /// released, nothing is published and `Closed` is returned.
    pub async fn initialize(&self) -> Result<()> {
        {
            let mut lifecycle = self.lock_lifecycle();
            match *lifecycle {
                Lifecycle::Created => *lifecycle = Lifecycle::Loading,
                Lifecycle::Closed => return Err(MixerError::Closed),
                Lifecycle::Loading | Lifecycle::Ready => {
                    return Err(MixerError::InvalidState(
                        "controller is already initialized".to_string(),
                    ))
                }
            }
        }

        if let Err(err) = self
            .engine
            .configure_audio_mode(&self.config.audio_mode)
            .await
        {
            error!(error = %err, "Failed to configure audio mode");
            self.emit(ControllerEvent::AudioModeFailed {
                message: err.to_string(),
            });
        }

        let descriptors = self.registry.all();
        log_info!(self.logger, tracks = self.registry.len(), "Loading tracks");

        let results = join_all(descriptors.iter().map(|d| self.load_track(d))).await;

        let mut loaded = Vec::with_capacity(results.len());
        let mut failed = 0;
        for (descriptor, result) in descriptors.iter().zip(results) {
            match result {
                Ok((handle, volume)) => {
                    loaded.push(LoadedTrack::new(Arc::clone(descriptor), handle, volume));
                }
                Err(err) => {
                    failed += 1;
                    error!(track_id = %descriptor.id, error = %err, "Failed to load track");
                    self.emit(ControllerEvent::TrackLoadFailed {
                        track_id: descriptor.id.clone(),
                        message: err.to_string(),
                    });
                }
            }
        }

        // Publish under the lifecycle lock so teardown either sees Ready with
        // a complete table or wins and leaves the release to us.
        let published = {
            let mut lifecycle = self.lock_lifecycle();
            if *lifecycle == Lifecycle::Closed {
                Err(loaded)
            } else {
                let tracks: Vec<TrackSnapshot> = loaded.iter().map(LoadedTrack::snapshot).collect();
                let count = tracks.len();
                if self.slots.set(SlotTable::new(loaded)).is_err() {
                    return Err(MixerError::InvalidState(
                        "track table already populated".to_string(),
                    ));
                }
                *lifecycle = Lifecycle::Ready;
                self.state.send_modify(|state| {
                    state.phase = ControllerPhase::Ready;
                    state.tracks = tracks;
                });
                Ok(count)
            }
        };

        match published {
            Ok(count) => {
                // The master volume may have moved while loads were in flight
                self.sync_volumes().await;
                log_info!(self.logger, loaded = count, failed, "Tracks ready");
                self.emit(ControllerEvent::Ready {
                    loaded: count,
                    failed,
                });
                Ok(())
            }
            Err(discarded) => {
                log_info!(
                    self.logger,
                    tracks = discarded.len(),
                    "Closed during load, releasing tracks"
                );
                self.release(discarded).await;
                Err(MixerError::Closed)
            }
        }
    }

    /// Run [`initialize`](Self::initialize) on the tokio runtime.
    ///
    /// Lets the caller tear down while loading is still in flight.
    pub fn spawn_initialize(self: &Arc<Self>) -> JoinHandle<Result<()>> {
        let controller = Arc::clone(self);
        tokio::spawn(async move { controller.initialize().await })
    }

    /// Release every engine handle concurrently.
    ///
    /// Idempotent. Afterwards every command fails with `Closed`.
    pub async fn teardown(&self) {
        let previous = {
            let mut lifecycle = self.lock_lifecycle();
            let previous = std::mem::replace(&mut *lifecycle, Lifecycle::Closed);
            if previous != Lifecycle::Closed {
                self.state.send_modify(|state| {
                    state.phase = ControllerPhase::Closed;
                    for track in &mut state.tracks {
                        track.is_playing = false;
                    }
                });
            }
            previous
        };

        match previous {
            Lifecycle::Closed => return,
            // Loading releases its own handles when it sees Closed
            Lifecycle::Created | Lifecycle::Loading => {}
            Lifecycle::Ready => {
                if let Some(table) = self.slots.get() {
                    join_all(table.slots.iter().map(|slot| async move {
                        let mut track = slot.track.lock().await;
                        track.is_playing = false;
                        if let Some(handle) = track.handle.take() {
                            if let Err(err) = handle.unload().await {
                                self.report(track.id(), EngineOperation::Unload, &err);
                            }
                        }
                    }))
                    .await;
                }
            }
        }

        log_info!(self.logger, "Controller closed");
        self.emit(ControllerEvent::Closed);
    }

    // ===== Single-track commands =====

    /// Flip one track between playing and paused.
    ///
    /// Starting applies the start offset policy, then sets the effective
    /// volume and plays. Pausing only pauses. Returns the new `is_playing`.
    ///
    /// # Errors
    /// `UnknownTrackId` if the track is not loaded, `Closed` after teardown.
    /// Engine failures are reported as events, not returned.
    pub async fn toggle_track(&self, id: &TrackId) -> Result<bool> {
        let slot = self.slot(id)?;
        let mut track = Self::lock_open(slot).await?;

        if track.is_playing {
            self.pause_locked(&mut track).await;
        } else {
            self.start_locked(&mut track).await;
        }

        self.publish([track.update()]);
        Ok(track.is_playing)
    }

    /// Set one track's volume (clamped to 0.0 - 1.0). Play state is unchanged.
    pub async fn set_track_volume(&self, id: &TrackId, volume: f32) -> Result<()> {
        let slot = self.slot(id)?;
        let volume = clamp_volume(volume);
        let mut track = Self::lock_open(slot).await?;

        track.volume = volume;
        track.revision += 1;
        self.apply_volume(&mut track).await;

        log_debug!(self.logger, track_id = %id, volume, "Track volume set");
        self.publish([track.update()]);
        Ok(())
    }

    /// Set the master volume (clamped to 0.0 - 1.0) and push the new
    /// effective volume to every loaded track, playing or not.
    ///
    /// While tracks are still loading only the value is stored; `initialize`
    /// pushes it to the handles once they are published.
    pub async fn set_global_volume(&self, volume: f32) -> Result<()> {
        let volume = clamp_volume(volume);

        // Stored under the lifecycle lock: either `initialize` publishes the
        // table after this store, or the table is visible here.
        let table = {
            let lifecycle = self.lock_lifecycle();
            if *lifecycle == Lifecycle::Closed {
                return Err(MixerError::Closed);
            }
            self.global_volume.store(volume.to_bits(), Ordering::Release);
            self.state.send_modify(|state| state.global_volume = volume);
            self.slots.get()
        };
        log_debug!(self.logger, volume, "Global volume set");

        let Some(table) = table else {
            return Ok(());
        };

        join_all(table.slots.iter().map(|slot| async move {
            let mut track = slot.track.lock().await;
            self.apply_volume(&mut track).await;
        }))
        .await;

        Ok(())
    }

    // ===== Group commands =====

    /// Start every selected track that is not playing. Playing tracks are untouched.
    pub async fn play_selected(&self, ids: &[TrackId]) -> Result<()> {
        let slots = self.select(ids)?;
        self.play_slots(&slots).await;
        Ok(())
    }

    /// Pause every selected track that is playing. Paused tracks are untouched.
    pub async fn pause_selected(&self, ids: &[TrackId]) -> Result<()> {
        let slots = self.select(ids)?;
        self.pause_slots(&slots).await;
        Ok(())
    }

    /// One switch for the whole selection: pause everything if anything in
    /// it is playing, otherwise play everything.
    pub async fn toggle_selected_play_pause(&self, ids: &[TrackId]) -> Result<GroupAction> {
        let slots = self.select(ids)?;

        let mut any_playing = false;
        for slot in &slots {
            if slot.track.lock().await.is_playing {
                any_playing = true;
                break;
            }
        }

        if any_playing {
            self.pause_slots(&slots).await;
            Ok(GroupAction::Paused)
        } else {
            self.play_slots(&slots).await;
            Ok(GroupAction::Played)
        }
    }

    /// Pause every selected track regardless of its state, keeping position.
    ///
    /// Each track is attempted even if others fail.
    pub async fn stop_selected(&self, ids: &[TrackId]) -> Result<()> {
        let slots = self.select(ids)?;

        let updates = join_all(slots.iter().map(|slot| async move {
            let mut track = slot.track.lock().await;
            if track.handle.is_none() {
                return None;
            }
            self.pause_locked(&mut track).await;
            Some(track.update())
        }))
        .await;

        self.publish(updates.into_iter().flatten());
        Ok(())
    }

    // ===== Read access =====

    /// Latest published state
    pub fn snapshot(&self) -> MixerSnapshot {
        self.state.borrow().clone()
    }

    /// Receiver that is notified on every publication
    pub fn subscribe(&self) -> watch::Receiver<MixerSnapshot> {
        self.state.subscribe()
    }

    /// Receiver for failures and lifecycle events
    pub fn subscribe_events(&self) -> broadcast::Receiver<ControllerEvent> {
        self.events.subscribe()
    }

    pub fn global_volume(&self) -> f32 {
        f32::from_bits(self.global_volume.load(Ordering::Acquire))
    }

    pub fn phase(&self) -> ControllerPhase {
        self.state.borrow().phase
    }

    /// Published play state; `false` for ids that are not loaded
    pub fn is_playing(&self, id: &TrackId) -> bool {
        self.state.borrow().is_playing(id)
    }

    /// Published per-track volume
    pub fn track_volume(&self, id: &TrackId) -> Option<f32> {
        self.state.borrow().track(id).map(|t| t.volume)
    }

    pub fn registry(&self) -> &TrackRegistry {
        &self.registry
    }


    // ===== Internals =====

    /// Load one track, returning its handle and the volume it was loaded at
    async fn load_track(&self, descriptor: &TrackDescriptor) -> Result<(E::Handle, f32)> {
        let volume = descriptor.default_volume * self.global_volume();
        log_debug!(
            self.logger,
            track_id = %descriptor.id,
            source = %descriptor.audio_source,
            volume,
            "Loading track"
        );
        let handle = self
            .engine
            .load(&descriptor.id, &descriptor.audio_source, LoadOptions::looped(volume))
            .await?;
        Ok((handle, volume))
    }

    /// Seek (only when starting from position 0), set volume, play
    async fn start_locked(&self, track: &mut LoadedTrack<E::Handle>) {
        let Some(handle) = track.handle.as_ref() else {
            return;
        };
        let id = track.id();

        match handle.status().await {
            Ok(status) if status.is_loaded && status.position_ms == 0 => {
                let choice = choose_start(&track.descriptor.start_offsets, status.duration_ms);
                match &choice {
                    StartChoice::Malformed(raw) => {
                        log_warn!(self.logger, track_id = %id, offset = %raw, "Ignoring malformed start offset");
                    }
                    StartChoice::BeyondDuration {
                        offset,
                        duration_ms,
                    } => {
                        log_warn!(
                            self.logger,
                            track_id = %id,
                            offset = %offset,
                            duration_ms,
                            "Start offset is past the end of the track"
                        );
                    }
                    StartChoice::NoOffsets | StartChoice::Offset(_) => {}
                }

                let position_ms = choice.position_ms();
                log_debug!(self.logger, track_id = %id, position_ms, "Starting from position");
                if let Err(err) = handle.seek(position_ms).await {
                    self.report(id, EngineOperation::Seek, &err);
                }
            }
            Ok(status) => {
                log_debug!(
                    self.logger,
                    track_id = %id,
                    position_ms = status.position_ms,
                    "Resuming without reseek"
                );
            }
            Err(err) => self.report(id, EngineOperation::Status, &err),
        }

        self.apply_volume(track).await;
        if let Some(handle) = track.handle.as_ref() {
            if let Err(err) = handle.play().await {
                self.report(track.id(), EngineOperation::Play, &err);
            }
        }

        track.is_playing = true;
        track.revision += 1;
    }

    async fn pause_locked(&self, track: &mut LoadedTrack<E::Handle>) {
        if let Some(handle) = track.handle.as_ref() {
            if let Err(err) = handle.pause().await {
                self.report(track.id(), EngineOperation::Pause, &err);
            }
        }
        track.is_playing = false;
        track.revision += 1;
    }

    /// Send `volume * global_volume` to the engine
    async fn apply_volume(&self, track: &mut LoadedTrack<E::Handle>) {
        let Some(handle) = track.handle.as_ref() else {
            return;
        };
        let effective = track.volume * self.global_volume();
        let result = handle.set_volume(effective).await;
        match result {
            Ok(()) => track.engine_volume = effective,
            Err(err) => self.report(track.id(), EngineOperation::SetVolume, &err),
        }
    }

    /// Bring every handle whose engine volume is stale up to date
    async fn sync_volumes(&self) {
        let Some(table) = self.slots.get() else {
            return;
        };
        join_all(table.slots.iter().map(|slot| async move {
            let mut track = slot.track.lock().await;
            if track.engine_volume != track.volume * self.global_volume() {
                self.apply_volume(&mut track).await;
            }
        }))
        .await;
    }

    async fn play_slots(&self, slots: &[&TrackSlot<E::Handle>]) {
        let updates = join_all(slots.iter().map(|slot| async move {
            let mut track = slot.track.lock().await;
            if track.handle.is_none() || track.is_playing {
                return None;
            }
            self.start_locked(&mut track).await;
            Some(track.update())
        }))
        .await;

        self.publish(updates.into_iter().flatten());
    }

    async fn pause_slots(&self, slots: &[&TrackSlot<E::Handle>]) {
        let updates = join_all(slots.iter().map(|slot| async move {
            let mut track = slot.track.lock().await;
            if track.handle.is_none() || !track.is_playing {
                return None;
            }
            self.pause_locked(&mut track).await;
            Some(track.update())
        }))
        .await;

        self.publish(updates.into_iter().flatten());
    }

    /// Release handles that never made it into the slot table
    async fn release(&self, tracks: Vec<LoadedTrack<E::Handle>>) {
        join_all(tracks.into_iter().map(|mut track| async move {
            if let Some(handle) = track.handle.take() {
                if let Err(err) = handle.unload().await {
                    self.report(track.id(), EngineOperation::Unload, &err);
                }
            }
        }))
        .await;
    }

    /// Apply track updates to the published state in one notification.
    ///
    /// An update older than what is already published for its track is
    /// dropped, and nothing is published once the controller is closed.
    fn publish(&self, updates: impl IntoIterator<Item = TrackUpdate>) {
        let mut published = self.published.lock().unwrap_or_else(PoisonError::into_inner);
        self.state.send_if_modified(|state| {
            if state.phase == ControllerPhase::Closed {
                return false;
            }
            let mut modified = false;
            for update in updates {
                let newest = published.entry(update.id.clone()).or_insert(0);
                if update.revision <= *newest {
                    continue;
                }
                *newest = update.revision;
                if let Some(entry) = state.track_mut(&update.id) {
                    entry.is_playing = update.is_playing;
                    entry.volume = update.volume;
                    modified = true;
                }
            }
            modified
        });
    }

    fn report(&self, track_id: &TrackId, operation: EngineOperation, err: &MixerError) {
        error!(track_id = %track_id, %operation, error = %err, "Engine call failed");
        self.emit(ControllerEvent::EngineFailure {
            track_id: track_id.clone(),
            operation,
            message: err.to_string(),
        });
    }

    fn emit(&self, event: ControllerEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    fn lock_lifecycle(&self) -> MutexGuard<'_, Lifecycle> {
        self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn ensure_open(&self) -> Result<()> {
        if *self.lock_lifecycle() == Lifecycle::Closed {
            return Err(MixerError::Closed);
        }
        Ok(())
    }

    fn slot(&self, id: &TrackId) -> Result<&TrackSlot<E::Handle>> {
        self.ensure_open()?;
        self.slots
            .get()
            .and_then(|table| table.get(id))
            .ok_or_else(|| MixerError::UnknownTrackId(id.clone()))
    }

    async fn lock_open(slot: &TrackSlot<E::Handle>) -> Result<SlotGuard<'_, LoadedTrack<E::Handle>>> {
        let track = slot.track.lock().await;
        if track.handle.is_none() {
            return Err(MixerError::Closed);
        }
        Ok(track)
    }

    /// Resolve a selection to loaded slots, deduplicated, in the given order
    fn select(&self, ids: &[TrackId]) -> Result<Vec<&TrackSlot<E::Handle>>> {
        self.ensure_open()?;

        let table = self.slots.get();
        let mut seen = HashSet::with_capacity(ids.len());
        let mut selected = Vec::with_capacity(ids.len());

        for id in ids {
            if !seen.insert(id) {
                continue;
            }
            match table.and_then(|t| t.get(id)) {
                Some(slot) => selected.push(slot),
                None if self.registry.contains(id) => {
                    log_warn!(self.logger, track_id = %id, "Skipping track that failed to load");
                    self.emit(ControllerEvent::TrackSkipped {
                        track_id: id.clone(),
                    });
                }
                None => {
                    log_warn!(self.logger, track_id = %id, "Skipping unknown track");
                    self.emit(ControllerEvent::TrackSkipped {
                        track_id: id.clone(),
                    });
                }
            }
        }

        Ok(selected)
    }
}

fn clamp_volume(volume: f32) -> f32 {
    if volume.is_nan() {
        0.0
    } else {
        volume.clamp(0.0, 1.0)
    }
}
