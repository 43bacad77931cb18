//! Shared value types for the longtail profiler core.
//!
//! Everything that crosses the snapshot boundary lives here so that the
//! sketch and engine crates agree on one vocabulary:
//!
//! - [`SketchParams`]: the log-binning parameters embedded in every snapshot.
//! - [`Encounter`]: metadata for one completed measurement session.
//! - [`TrackerExport`] / [`SketchSnapshot`] / [`RecordingSnapshot`]: the
//!   value shapes handed to the serialization collaborator.
//! - [`TrackerId`], [`FrameHandle`], [`ScriptSlot`], [`TrackerBinding`],
//!   [`TrackerGroup`]: registry addressing.
//!
//! Identity strings (`@addon/path:script_type`, with optional `dec:`
//! compressed segments) are opaque here: produced by the instrumentation
//! collaborator, decompressed by the viewer, never parsed by the core.

mod encounter;
mod params;
mod snapshot;

pub use encounter::Encounter;
pub use params::{SketchParams, DEFAULT_ALPHA, DEFAULT_OUTLIER_CAPACITY, MAX_OBSERVATION_MS};
pub use snapshot::{Recording, RecordingSnapshot, SketchSnapshot, TrackerExport};

// ---------------------------------------------------------------------------
// Registry addressing
// ---------------------------------------------------------------------------

/// Handle to a registered tracker.
///
/// Issued by the engine's registry; the hot `record` path resolves it with
/// a single index, so host-side instrumentation can hold these by value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TrackerId(u32);

impl TrackerId {
    #[must_use]
    pub fn new(raw: u32) -> Self {
        Self(raw)
    }

    #[must_use]
    pub fn get(self) -> u32 {
        self.0
    }
}

/// Opaque handle to a host frame object.
///
/// The host guarantees stability for the frame's lifetime; the core only
/// ever compares these for equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(u64);

impl FrameHandle {
    #[must_use]
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }
}

/// A host frame's script slot name (`OnUpdate`, `OnEvent`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScriptSlot(Box<str>);

impl ScriptSlot {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self(name.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ScriptSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// How a tracker is bound to a callable.
///
/// Frame scripts are keyed by `(frame, slot)` rather than callable identity,
/// because closures with identical bodies are distinct values and the host
/// rebinds slots freely. Everything else (library methods, timer callbacks)
/// is keyed by its identity string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TrackerBinding {
    ByFrameSlot {
        frame: FrameHandle,
        script: ScriptSlot,
    },
    ByName {
        key: String,
    },
}

/// Snapshot grouping for a tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackerGroup {
    /// Host-frame script handlers.
    Scripts,
    /// Non-frame callables: library methods, timers, event hooks.
    Externals,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracker_binding_hash_distinct() {
        let a = TrackerBinding::ByFrameSlot {
            frame: FrameHandle::new(7),
            script: ScriptSlot::new("OnUpdate"),
        };
        let b = TrackerBinding::ByFrameSlot {
            frame: FrameHandle::new(7),
            script: ScriptSlot::new("OnEvent"),
        };
        let c = TrackerBinding::ByName {
            key: "@addon/lib:Fire".to_owned(),
        };
        assert_ne!(a, b);
        assert_ne!(a, c);

        let a2 = TrackerBinding::ByFrameSlot {
            frame: FrameHandle::new(7),
            script: ScriptSlot::new("OnUpdate"),
        };
        assert_eq!(a, a2);

        println!("[PASS] tracker binding equality: slots and names distinct");
    }
}
