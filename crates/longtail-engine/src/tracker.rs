//! Per-callable accumulator.
//!
//! Many sub-calls of one callable within one render must yield one sample,
//! so the tracker accumulates into a pending frame total and commits it to
//! the sketch when it first observes a later frame index (or at export).

use longtail_sketch::{BinPool, TieredSketch};
use longtail_types::{SketchParams, TrackerExport};

/// Builds trackers with the engine's shared sketch configuration.
///
/// The bin pool is injected here so every sketch a factory produces draws
/// from the same preallocated storage.
#[derive(Debug, Clone)]
pub struct TrackerFactory {
    params: SketchParams,
    outlier_capacity: usize,
    pool: BinPool,
}

impl TrackerFactory {
    #[must_use]
    pub fn new(params: SketchParams, outlier_capacity: usize, pool: BinPool) -> Self {
        Self {
            params,
            outlier_capacity,
            pool,
        }
    }

    /// Build a fresh tracker whose first frame is `frame`.
    #[must_use]
    pub fn build(&self, dependent: bool, frame: u64) -> ScriptTracker {
        ScriptTracker::new(
            TieredSketch::new(self.params, self.outlier_capacity, self.pool.clone()),
            dependent,
            frame,
        )
    }
}

/// Accumulates one callable's wall-clock time, one commit per render.
#[derive(Debug)]
pub struct ScriptTracker {
    sketch: TieredSketch,
    total_time: f64,
    commits: u64,
    calls: u64,
    frame_time: f64,
    frame_calls: u64,
    last_frame_index: u64,
    dependent: bool,
    official_time: Option<f64>,
}

impl ScriptTracker {
    #[must_use]
    pub fn new(sketch: TieredSketch, dependent: bool, frame: u64) -> Self {
        Self {
            sketch,
            total_time: 0.0,
            commits: 0,
            calls: 0,
            frame_time: 0.0,
            frame_calls: 0,
            last_frame_index: frame,
            dependent,
            official_time: None,
        }
    }

    /// Add `delta_ms` to the pending total for render `frame`.
    ///
    /// The hot path: a frame-index compare (committing the previous frame's
    /// total when it differs) and two adds. Gating against inactive
    /// encounters happens in the engine, before this is reached.
    #[inline]
    pub fn record(&mut self, frame: u64, delta_ms: f64) {
        if frame != self.last_frame_index {
            self.flush(frame);
        }
        self.frame_time += delta_ms;
        self.frame_calls += 1;
    }

    /// Commit the pending frame total, if any.
    ///
    /// Only a positive total becomes a sample; zero-delta calls still count
    /// as calls. Flushing twice at one frame index is a no-op, which keeps
    /// commits at one per (tracker, render).
    fn flush(&mut self, frame: u64) {
        if self.frame_calls > 0 {
            self.calls += self.frame_calls;
            if self.frame_time > 0.0 {
                self.sketch.push(self.frame_time);
                self.commits += 1;
                self.total_time += self.frame_time;
            }
            self.frame_time = 0.0;
            self.frame_calls = 0;
        }
        self.last_frame_index = frame;
    }

    /// Flush pending state and produce a value-semantic export.
    ///
    /// Repeated exports without intervening records are equal.
    #[must_use]
    pub fn export(&mut self, frame: u64) -> TrackerExport {
        self.flush(frame);
        TrackerExport {
            commits: self.commits,
            calls: self.calls,
            total_time: self.total_time,
            official_time: self.official_time,
            dependent: self.dependent,
            sketch: self.sketch.export(),
        }
    }

    /// Flush pending state; a tracker with no commits has nothing to say.
    pub fn should_export(&mut self, frame: u64) -> bool {
        self.flush(frame);
        self.commits > 0
    }

    /// Zero every accumulator and the sketch; rebase on `frame`.
    pub fn reset(&mut self, frame: u64) {
        self.total_time = 0.0;
        self.commits = 0;
        self.calls = 0;
        self.frame_time = 0.0;
        self.frame_calls = 0;
        self.last_frame_index = frame;
        self.official_time = None;
        self.sketch.reset();
    }

    /// Attach a host-reported CPU total; passed through to the export.
    pub fn set_official_time(&mut self, total_ms: f64) {
        self.official_time = Some(total_ms);
    }

    #[must_use]
    pub fn dependent(&self) -> bool {
        self.dependent
    }

    #[must_use]
    pub fn commits(&self) -> u64 {
        self.commits
    }
}
