//! Snapshot value shapes handed to the serialization collaborator.
//!
//! These are plain values: building one allocates freely, which is why the
//! engine only builds them at encounter close and defers the actual
//! serialization to an out-of-combat tick.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{Encounter, SketchParams};

/// Value-semantic copy of a tiered sketch's state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SketchSnapshot {
    /// Total observations.
    pub count: u64,
    /// Observations at or below the trivial cutoff.
    pub trivial_count: u64,
    /// Log-binned counts; absent when the sketch never overflowed its
    /// outlier tier.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub bins: Option<Vec<u64>>,
    /// The largest observations, preserved exactly. Order unspecified.
    pub outliers: Vec<f64>,
}

impl SketchSnapshot {
    /// An empty sketch: no observations, no bins.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            count: 0,
            trivial_count: 0,
            bins: None,
            outliers: Vec::new(),
        }
    }
}

/// One tracker's contribution to a recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackerExport {
    pub commits: u64,
    pub calls: u64,
    pub total_time: f64,
    /// Host-reported CPU total for this callable, when the instrumentation
    /// layer supplied one. Passed through verbatim.
    #[serde(rename = "officialTime", skip_serializing_if = "Option::is_none", default)]
    pub official_time: Option<f64>,
    pub dependent: bool,
    pub sketch: SketchSnapshot,
}

/// The full snapshot built when an encounter closes.
///
/// `scripts` and `externals` are keyed by opaque identity strings; ordered
/// maps keep the serialized form deterministic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingSnapshot {
    pub encounter: Encounter,
    /// The distinguished render-delay tracker.
    #[serde(rename = "onUpdateDelay")]
    pub render_delay: TrackerExport,
    pub scripts: BTreeMap<String, TrackerExport>,
    pub externals: BTreeMap<String, TrackerExport>,
    pub sketch_params: SketchParams,
}

/// A persisted recording: encounter metadata plus the snapshot as encoded
/// by the codec collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recording {
    pub encounter: Encounter,
    pub engine_version: String,
    /// Serialized + compressed [`RecordingSnapshot`]; opaque to the core.
    pub data: Vec<u8>,
}
