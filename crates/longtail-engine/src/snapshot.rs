//! Snapshot encoding and bounded persistence.
//!
//! The engine builds a [`RecordingSnapshot`] value the moment an encounter
//! closes, but serializing and compressing it can blow the host's per-call
//! time budget, so the encode happens later, on an out-of-combat tick
//! driven by the host (see `Engine::emit_tick`).

use std::collections::VecDeque;

use longtail_error::{LongtailError, Result};
use longtail_types::{Recording, RecordingSnapshot};

/// Most-recent recordings kept by default.
pub const DEFAULT_STORE_CAPACITY: usize = 50;

/// Serializes (and, in production, compresses) a snapshot into the opaque
/// bytes that get persisted.
///
/// The production codec lives with the host integration; [`JsonCodec`] is
/// the built-in uncompressed default.
pub trait SnapshotCodec {
    /// Encode a snapshot.
    ///
    /// # Errors
    ///
    /// [`LongtailError::SnapshotFailed`] when serialization fails; the
    /// caller drops the recording and does not retry.
    fn encode(&self, snapshot: &RecordingSnapshot) -> Result<Vec<u8>>;
}

/// Plain JSON encoding, no compression.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonCodec;

impl SnapshotCodec for JsonCodec {
    fn encode(&self, snapshot: &RecordingSnapshot) -> Result<Vec<u8>> {
        serde_json::to_vec(snapshot).map_err(|e| LongtailError::SnapshotFailed {
            detail: e.to_string(),
        })
    }
}

/// Append-only list of recordings, bounded FIFO.
///
/// Oldest entries are dropped before each insert once the store is full;
/// surviving order equals insertion order.
#[derive(Debug)]
pub struct RecordingStore {
    recordings: VecDeque<Recording>,
    capacity: usize,
}

impl RecordingStore {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        debug_assert!(capacity > 0, "store capacity must be > 0");
        Self {
            recordings: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a recording, trimming the oldest entries first when full.
    pub fn insert(&mut self, recording: Recording) {
        while self.recordings.len() >= self.capacity {
            self.recordings.pop_front();
        }
        self.recordings.push_back(recording);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.recordings.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.recordings.is_empty()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Recordings in insertion order, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Recording> {
        self.recordings.iter()
    }
}

impl Default for RecordingStore {
    fn default() -> Self {
        Self::new(DEFAULT_STORE_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use longtail_types::{Encounter, SketchParams, SketchSnapshot, TrackerExport};

    fn recording(start: u64) -> Recording {
        Recording {
            encounter: Encounter::Manual {
                start_time: start,
                end_time: start + 1,
            },
            engine_version: "test".to_owned(),
            data: vec![1, 2, 3],
        }
    }

    fn snapshot() -> RecordingSnapshot {
        RecordingSnapshot {
            encounter: Encounter::Manual {
                start_time: 1,
                end_time: 2,
            },
            render_delay: TrackerExport {
                commits: 1,
                calls: 1,
                total_time: 16.6,
                official_time: None,
                dependent: false,
                sketch: SketchSnapshot::empty(),
            },
            scripts: BTreeMap::new(),
            externals: BTreeMap::new(),
            sketch_params: SketchParams::default(),
        }
    }

    #[test]
    fn test_store_fifo_retention() {
        let mut store = RecordingStore::new(3);
        for start in 1..=4 {
            store.insert(recording(start));
        }
        assert_eq!(store.len(), 3);
        let starts: Vec<u64> = store.iter().map(|r| r.encounter.start_time()).collect();
        assert_eq!(starts, vec![2, 3, 4], "oldest dropped, order preserved");
        println!("[PASS] store: FIFO trim keeps the newest in order");
    }

    #[test]
    fn test_json_codec_roundtrip() {
        let snap = snapshot();
        let bytes = JsonCodec.encode(&snap).unwrap();
        let back: RecordingSnapshot = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(snap, back);
        println!("[PASS] json codec: encode/decode roundtrip");
    }
}
