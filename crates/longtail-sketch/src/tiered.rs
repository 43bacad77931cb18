//! Three-tier distributional sketch.

use longtail_types::{SketchParams, SketchSnapshot};
use tracing::trace;

use crate::pool::{BinPool, BinVec};
use crate::topk::TopK;

/// Summarizes a stream of non-negative observations (one per commit) with
/// three tiers: a trivial counter, the exact top-k outliers, and a
/// log-binned histogram for everything the outlier tier displaces.
///
/// Every observation above the trivial cutoff is counted exactly once:
/// in the outlier heap or in a bin, never both. The bin vector is acquired
/// from the pool on the first displacement and held for the sketch's life;
/// there is no transition back to the unbinned state.
#[derive(Debug)]
pub struct TieredSketch {
    params: SketchParams,
    count: u64,
    trivial_count: u64,
    bins: Option<BinVec>,
    outliers: TopK,
    pool: BinPool,
}

impl TieredSketch {
    /// Create an empty sketch drawing bin storage from `pool`.
    #[must_use]
    pub fn new(params: SketchParams, outlier_capacity: usize, pool: BinPool) -> Self {
        Self {
            params,
            count: 0,
            trivial_count: 0,
            bins: None,
            outliers: TopK::new(outlier_capacity),
            pool,
        }
    }

    /// Record one observation (milliseconds).
    pub fn push(&mut self, x: f64) {
        self.count += 1;
        if x <= self.params.trivial_cutoff {
            self.trivial_count += 1;
            return;
        }
        if let Some(displaced) = self.outliers.push(x) {
            let bin = self.params.bin_index(displaced);
            let bins = self.bins.get_or_insert_with(|| {
                trace!(target: "longtail.sketch", "outlier tier overflow, acquiring bins");
                self.pool.acquire()
            });
            bins[bin] += 1;
        }
    }

    /// Zero all counters and clear the outlier tier.
    ///
    /// An acquired bin vector stays on loan and is zeroed in place.
    pub fn reset(&mut self) {
        self.count = 0;
        self.trivial_count = 0;
        if let Some(bins) = &mut self.bins {
            bins.fill(0);
        }
        self.outliers.clear();
    }

    /// Value-semantic copy of the current state.
    #[must_use]
    pub fn export(&self) -> SketchSnapshot {
        SketchSnapshot {
            count: self.count,
            trivial_count: self.trivial_count,
            bins: self.bins.as_ref().map(|b| b.to_vec()),
            outliers: self.outliers.contents().to_vec(),
        }
    }

    /// Total observations.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Observations at or below the trivial cutoff.
    #[must_use]
    pub fn trivial_count(&self) -> u64 {
        self.trivial_count
    }

    /// Whether the histogram tier has been activated.
    #[must_use]
    pub fn has_bins(&self) -> bool {
        self.bins.is_some()
    }

    /// The sketch's binning parameters.
    #[must_use]
    pub fn params(&self) -> &SketchParams {
        &self.params
    }
}
