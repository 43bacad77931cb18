//! Frame clock and tracker registry.

use std::collections::{BTreeMap, HashMap};

use tracing::debug;

use longtail_error::{LongtailError, Result};
use longtail_types::{
    FrameHandle, ScriptSlot, TrackerBinding, TrackerExport, TrackerGroup, TrackerId,
};

use crate::tracker::{ScriptTracker, TrackerFactory};

/// Monotone render index.
///
/// Incremented exactly once per host render tick; never reset for the life
/// of the process. The host is single-threaded, so a plain counter is
/// enough.
#[derive(Debug, Default)]
pub struct FrameClock {
    index: u64,
}

impl FrameClock {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance to the next render; returns the new index.
    pub fn advance(&mut self) -> u64 {
        self.index += 1;
        self.index
    }

    /// The current render index.
    #[must_use]
    pub fn current(&self) -> u64 {
        self.index
    }
}

struct Registered {
    key: String,
    group: TrackerGroup,
    tracker: ScriptTracker,
}

/// Owns every tracker for the engine's lifetime.
///
/// Trackers live in a `Vec` addressed by [`TrackerId`], so resolving a
/// handle on the record path is one bounds-checked index. Two maps cover
/// registration: bindings (frame slot or name) to ids, and identity strings
/// to ids for collision refusal.
pub struct TrackerRegistry {
    factory: TrackerFactory,
    trackers: Vec<Registered>,
    bindings: HashMap<TrackerBinding, TrackerId>,
    identities: HashMap<String, TrackerId>,
}

impl TrackerRegistry {
    #[must_use]
    pub fn new(factory: TrackerFactory) -> Self {
        Self {
            factory,
            trackers: Vec::new(),
            bindings: HashMap::new(),
            identities: HashMap::new(),
        }
    }

    /// Tracker for a host frame's script slot, created on first call.
    ///
    /// Identity of the installed callable is useless here (closures with
    /// identical bodies are distinct values, and hosts rebind slots freely),
    /// so the slot itself is the identity: re-registering `(frame, slot)`
    /// returns the same tracker regardless of `key`.
    ///
    /// # Errors
    ///
    /// [`LongtailError::IdentityCollision`] if `key` is already taken by a
    /// different binding; the existing tracker is never overwritten.
    pub fn frame_tracker(
        &mut self,
        frame: FrameHandle,
        script: ScriptSlot,
        key: &str,
        now_frame: u64,
    ) -> Result<TrackerId> {
        let binding = TrackerBinding::ByFrameSlot { frame, script };
        if let Some(&id) = self.bindings.get(&binding) {
            return Ok(id);
        }
        if self.identities.contains_key(key) {
            return Err(LongtailError::IdentityCollision {
                key: key.to_owned(),
            });
        }
        let tracker = self.factory.build(false, now_frame);
        let id = self.insert(key, TrackerGroup::Scripts, tracker);
        self.bindings.insert(binding, id);
        debug!(target: "longtail.registry", key, id = id.get(), "frame tracker registered");
        Ok(id)
    }

    /// Tracker for a non-frame callable, keyed by identity string.
    ///
    /// Re-registering the same key returns the existing tracker, provided
    /// the dependent flag and group match the original registration.
    ///
    /// # Errors
    ///
    /// [`LongtailError::IdentityCollision`] if `key` belongs to a frame
    /// tracker; [`LongtailError::IdentityMetadataMismatch`] if the flag or
    /// group differ from the original registration.
    pub fn named_tracker(
        &mut self,
        key: &str,
        dependent: bool,
        group: TrackerGroup,
        now_frame: u64,
    ) -> Result<TrackerId> {
        let binding = TrackerBinding::ByName {
            key: key.to_owned(),
        };
        if let Some(&id) = self.bindings.get(&binding) {
            let registered = &self.trackers[id.get() as usize];
            if registered.group == group && registered.tracker.dependent() == dependent {
                return Ok(id);
            }
            return Err(LongtailError::IdentityMetadataMismatch {
                key: key.to_owned(),
            });
        }
        if self.identities.contains_key(key) {
            return Err(LongtailError::IdentityCollision {
                key: key.to_owned(),
            });
        }
        let tracker = self.factory.build(dependent, now_frame);
        let id = self.insert(key, group, tracker);
        self.bindings.insert(binding, id);
        debug!(target: "longtail.registry", key, id = id.get(), "named tracker registered");
        Ok(id)
    }

    fn insert(&mut self, key: &str, group: TrackerGroup, tracker: ScriptTracker) -> TrackerId {
        #[allow(clippy::cast_possible_truncation)]
        let id = TrackerId::new(self.trackers.len() as u32);
        self.trackers.push(Registered {
            key: key.to_owned(),
            group,
            tracker,
        });
        self.identities.insert(key.to_owned(), id);
        id
    }

    /// Resolve a tracker for the record hot path.
    #[inline]
    pub fn get_mut(&mut self, id: TrackerId) -> Option<&mut ScriptTracker> {
        self.trackers
            .get_mut(id.get() as usize)
            .map(|r| &mut r.tracker)
    }

    /// Number of registered trackers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.trackers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.trackers.is_empty()
    }

    /// Reset every tracker, rebasing on `frame`.
    pub fn reset_all(&mut self, frame: u64) {
        for registered in &mut self.trackers {
            registered.tracker.reset(frame);
        }
    }

    /// Export every tracker with at least one commit, split by group.
    pub fn exports(
        &mut self,
        frame: u64,
    ) -> (
        BTreeMap<String, TrackerExport>,
        BTreeMap<String, TrackerExport>,
    ) {
        let mut scripts = BTreeMap::new();
        let mut externals = BTreeMap::new();
        for registered in &mut self.trackers {
            if !registered.tracker.should_export(frame) {
                continue;
            }
            let export = registered.tracker.export(frame);
            let target = match registered.group {
                TrackerGroup::Scripts => &mut scripts,
                TrackerGroup::Externals => &mut externals,
            };
            target.insert(registered.key.clone(), export);
        }
        (scripts, externals)
    }
}

impl std::fmt::Debug for TrackerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackerRegistry")
            .field("trackers", &self.trackers.len())
            .finish_non_exhaustive()
    }
}
