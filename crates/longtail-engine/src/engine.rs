//! The orchestrator: frame clock, registry, lifecycle, deferred emission.

use std::fmt::Write as _;

use tracing::{debug, warn};

use longtail_error::{LongtailError, Result};
use longtail_sketch::{BinPool, DEFAULT_POOL_CAPACITY};
use longtail_types::{
    FrameHandle, Recording, RecordingSnapshot, ScriptSlot, SketchParams, TrackerGroup, TrackerId,
    DEFAULT_ALPHA, DEFAULT_OUTLIER_CAPACITY,
};

use crate::encounter::{ActiveEncounter, EncounterLifecycle, EncounterTag};
use crate::registry::{FrameClock, TrackerRegistry};
use crate::snapshot::{JsonCodec, RecordingStore, SnapshotCodec, DEFAULT_STORE_CAPACITY};
use crate::tracker::{ScriptTracker, TrackerFactory};

/// Engine version stamped into every persisted recording.
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine construction parameters.
#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    /// Relative error of the log-binned sketch tier.
    pub alpha: f64,
    /// Capacity of the exact outlier tier per tracker.
    pub outlier_capacity: usize,
    /// Bin vectors preallocated at startup.
    pub pool_capacity: usize,
    /// Most-recent recordings retained.
    pub store_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            alpha: DEFAULT_ALPHA,
            outlier_capacity: DEFAULT_OUTLIER_CAPACITY,
            pool_capacity: DEFAULT_POOL_CAPACITY,
            store_capacity: DEFAULT_STORE_CAPACITY,
        }
    }
}

/// Result of one emission tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmitOutcome {
    /// Nothing pending.
    Idle,
    /// A recording is pending but the host reports combat; try again later.
    Deferred,
    /// The pending recording was encoded and persisted.
    Written,
    /// Encoding failed; the recording was dropped and will not be retried.
    Failed,
}

/// The measurement engine.
///
/// All methods are invoked from the host's single render thread: hooked
/// script callbacks call [`record`](Self::record), the per-render hook
/// calls [`on_render`](Self::on_render), host event dispatches drive the
/// encounter methods, and a ~1 Hz host ticker drives
/// [`emit_tick`](Self::emit_tick). Nothing here suspends or spawns.
pub struct Engine {
    params: SketchParams,
    pool: BinPool,
    clock: FrameClock,
    registry: TrackerRegistry,
    render_delay: ScriptTracker,
    lifecycle: EncounterLifecycle,
    pending: Option<RecordingSnapshot>,
    store: RecordingStore,
    codec: Box<dyn SnapshotCodec>,
    enabled: bool,
}

impl Engine {
    /// Build an engine with the default JSON codec.
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self::with_codec(config, Box::new(JsonCodec))
    }

    /// Build an engine with a caller-supplied snapshot codec.
    #[must_use]
    pub fn with_codec(config: EngineConfig, codec: Box<dyn SnapshotCodec>) -> Self {
        let params = SketchParams::new(config.alpha);
        let pool = BinPool::new(&params, config.pool_capacity);
        let factory = TrackerFactory::new(params, config.outlier_capacity, pool.clone());
        let render_delay = factory.build(false, 0);
        Self {
            params,
            pool,
            clock: FrameClock::new(),
            registry: TrackerRegistry::new(factory),
            render_delay,
            lifecycle: EncounterLifecycle::new(),
            pending: None,
            store: RecordingStore::new(config.store_capacity),
            codec,
            enabled: true,
        }
    }

    // -----------------------------------------------------------------------
    // Hot path
    // -----------------------------------------------------------------------

    /// Add `delta_ms` of wall-clock time to a tracker for the current render.
    ///
    /// A no-op outside an active encounter; the gate is read once, before
    /// anything else. An unknown id is ignored: a measurement failure must
    /// never break what is being measured.
    #[inline]
    pub fn record(&mut self, id: TrackerId, delta_ms: f64) {
        if !self.lifecycle.is_active() {
            return;
        }
        let frame = self.clock.current();
        if let Some(tracker) = self.registry.get_mut(id) {
            tracker.record(frame, delta_ms);
        } else {
            debug_assert!(false, "record with unissued tracker id {}", id.get());
        }
    }

    /// Per-render tick: advance the frame index and record the host's
    /// render delta into the distinguished render-delay tracker.
    ///
    /// `elapsed_ms` must already be scaled to milliseconds.
    pub fn on_render(&mut self, elapsed_ms: f64) {
        let frame = self.clock.advance();
        if self.lifecycle.is_active() {
            self.render_delay.record(frame, elapsed_ms);
        }
    }

    // -----------------------------------------------------------------------
    // Registration
    // -----------------------------------------------------------------------

    /// Tracker for a host frame's script slot. See
    /// [`TrackerRegistry::frame_tracker`].
    ///
    /// # Errors
    ///
    /// [`LongtailError::IdentityCollision`] when `key` is already taken by
    /// a different binding.
    pub fn register_frame_tracker(
        &mut self,
        frame: FrameHandle,
        script: ScriptSlot,
        key: &str,
    ) -> Result<TrackerId> {
        let now = self.clock.current();
        self.registry.frame_tracker(frame, script, key, now)
    }

    /// Tracker for a non-frame callable. See
    /// [`TrackerRegistry::named_tracker`].
    ///
    /// # Errors
    ///
    /// [`LongtailError::IdentityCollision`] or
    /// [`LongtailError::IdentityMetadataMismatch`] on conflicting
    /// registrations.
    pub fn register_named_tracker(
        &mut self,
        key: &str,
        dependent: bool,
        group: TrackerGroup,
    ) -> Result<TrackerId> {
        let now = self.clock.current();
        self.registry.named_tracker(key, dependent, group, now)
    }

    /// Attach a host-reported CPU total to a tracker.
    ///
    /// # Errors
    ///
    /// [`LongtailError::UnknownTracker`] for an id this engine never issued.
    pub fn record_official_time(&mut self, id: TrackerId, total_ms: f64) -> Result<()> {
        match self.registry.get_mut(id) {
            Some(tracker) => {
                tracker.set_official_time(total_ms);
                Ok(())
            }
            None => Err(LongtailError::UnknownTracker { id: id.get() }),
        }
    }

    // -----------------------------------------------------------------------
    // Encounter events
    // -----------------------------------------------------------------------

    /// Raid boss pull.
    pub fn encounter_start(
        &mut self,
        now: u64,
        encounter_id: u64,
        encounter_name: &str,
        difficulty_id: u64,
        group_size: u64,
    ) {
        self.start(ActiveEncounter::Raid {
            start_time: now,
            encounter_id,
            encounter_name: encounter_name.to_owned(),
            difficulty_id,
            group_size,
        });
    }

    /// Raid boss kill or wipe.
    pub fn encounter_end(&mut self, now: u64, success: bool) {
        self.stop(EncounterTag::Raid, now, success);
    }

    /// Timed dungeon run started.
    pub fn dungeon_start(&mut self, now: u64, map_id: u64, group_size: u64) {
        self.start(ActiveEncounter::Dungeon {
            start_time: now,
            map_id,
            group_size,
        });
    }

    /// Timed dungeon run completed.
    pub fn dungeon_completed(&mut self, now: u64) {
        self.stop(EncounterTag::Dungeon, now, true);
    }

    /// Timed dungeon run abandoned.
    pub fn dungeon_reset(&mut self, now: u64) {
        self.stop(EncounterTag::Dungeon, now, false);
    }

    /// Manual test session started (console `teststart`).
    pub fn manual_start(&mut self, now: u64) {
        self.start(ActiveEncounter::Manual { start_time: now });
    }

    /// Manual test session stopped (console `teststop`).
    pub fn manual_stop(&mut self, now: u64) {
        self.stop(EncounterTag::Manual, now, true);
    }

    /// Host "saved variables loaded" event: seed the store with the
    /// recordings the host persisted in earlier sessions. Retention applies
    /// as usual; anything beyond capacity drops oldest-first.
    pub fn saved_variables_loaded(&mut self, recordings: Vec<Recording>) {
        debug!(
            target: "longtail.engine",
            count = recordings.len(),
            "seeding store from saved variables"
        );
        for recording in recordings {
            self.store.insert(recording);
        }
    }

    fn start(&mut self, incoming: ActiveEncounter) {
        if !self.enabled {
            debug!(target: "longtail.engine", "start ignored, profiling disabled");
            return;
        }
        if self.lifecycle.try_start(incoming) {
            let frame = self.clock.current();
            self.registry.reset_all(frame);
            self.render_delay.reset(frame);
            self.pool.rearm_exhaustion_warning();
        }
    }

    fn stop(&mut self, tag: EncounterTag, now: u64, success: bool) {
        let Some(encounter) = self.lifecycle.try_stop(tag, now, success) else {
            return;
        };
        let frame = self.clock.current();
        let (scripts, externals) = self.registry.exports(frame);
        let snapshot = RecordingSnapshot {
            encounter,
            render_delay: self.render_delay.export(frame),
            scripts,
            externals,
            sketch_params: self.params,
        };
        if self.pending.is_some() {
            warn!(
                target: "longtail.engine",
                "previous recording never emitted, replacing it"
            );
        }
        self.pending = Some(snapshot);
        self.registry.reset_all(frame);
        self.render_delay.reset(frame);
    }

    // -----------------------------------------------------------------------
    // Deferred emission
    // -----------------------------------------------------------------------

    /// One tick of the ~1 Hz emission driver.
    ///
    /// While the host reports combat the pending recording waits. Once
    /// clear, the pending value is taken *before* encoding (a codec
    /// failure drops the recording rather than looping) and on success the
    /// encoded bytes are appended to the bounded store.
    pub fn emit_tick(&mut self, in_combat: bool) -> EmitOutcome {
        if self.pending.is_none() {
            return EmitOutcome::Idle;
        }
        if in_combat {
            debug!(target: "longtail.engine", "snapshot deferred, combat in progress");
            return EmitOutcome::Deferred;
        }
        let Some(snapshot) = self.pending.take() else {
            return EmitOutcome::Idle;
        };
        match self.codec.encode(&snapshot) {
            Ok(data) => {
                self.store.insert(Recording {
                    encounter: snapshot.encounter,
                    engine_version: ENGINE_VERSION.to_owned(),
                    data,
                });
                EmitOutcome::Written
            }
            Err(err) => {
                warn!(target: "longtail.engine", %err, "snapshot encoding failed, recording dropped");
                EmitOutcome::Failed
            }
        }
    }

    // -----------------------------------------------------------------------
    // Introspection
    // -----------------------------------------------------------------------

    /// Master switch (console `enable`/`disable`). Disabling prevents new
    /// encounters from starting; an already-active encounter still closes
    /// normally through its stop event.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Whether an encounter is currently being measured.
    #[must_use]
    pub fn is_recording(&self) -> bool {
        self.lifecycle.is_active()
    }

    /// The current render index.
    #[must_use]
    pub fn frame_index(&self) -> u64 {
        self.clock.current()
    }

    /// Persisted recordings, oldest first.
    #[must_use]
    pub fn store(&self) -> &RecordingStore {
        &self.store
    }

    /// The engine's sketch parameters.
    #[must_use]
    pub fn params(&self) -> &SketchParams {
        &self.params
    }

    /// Human-readable diagnostics for the console `status` verb.
    #[must_use]
    pub fn status(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "longtail v{ENGINE_VERSION}");
        let _ = writeln!(
            out,
            "profiling: {}",
            if self.enabled { "enabled" } else { "disabled" }
        );
        match self.lifecycle.active() {
            Some(active) => {
                let _ = writeln!(out, "encounter: active ({:?})", active.tag());
            }
            None => {
                let _ = writeln!(out, "encounter: idle");
            }
        }
        let _ = writeln!(out, "frame index: {}", self.clock.current());
        let _ = writeln!(out, "trackers: {}", self.registry.len());
        let _ = writeln!(
            out,
            "bin pool: {}/{} available",
            self.pool.available(),
            self.pool.capacity()
        );
        let _ = writeln!(
            out,
            "recordings: {}/{} stored{}",
            self.store.len(),
            self.store.capacity(),
            if self.pending.is_some() {
                ", 1 pending"
            } else {
                ""
            }
        );
        out
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("enabled", &self.enabled)
            .field("recording", &self.lifecycle.is_active())
            .field("frame_index", &self.clock.current())
            .field("trackers", &self.registry.len())
            .field("recordings", &self.store.len())
            .finish_non_exhaustive()
    }
}
