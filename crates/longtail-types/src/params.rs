//! Log-binning parameters shared by every sketch in an engine instance.
//!
//! The binning follows the DDSketch construction: bin `i` covers the
//! half-open interval `[gamma^(i + bin_offset), gamma^(i + 1 + bin_offset))`,
//! which bounds the relative reconstruction error by `alpha`. Observations
//! at or below the trivial cutoff `gamma^bin_offset` carry no diagnostic
//! value and are only counted, never binned.

use serde::{Deserialize, Serialize};

/// Relative error of the log-binned tier.
pub const DEFAULT_ALPHA: f64 = 0.05;

/// Capacity of the exact top-k outlier tier.
pub const DEFAULT_OUTLIER_CAPACITY: usize = 10;

/// Largest observation (milliseconds) representable without clamping.
///
/// Anything slower than this has long since blown the host's render budget;
/// such observations clamp into the last bin rather than grow the vector.
pub const MAX_OBSERVATION_MS: f64 = 100.0;

/// Cutoff target (milliseconds) below which observations are trivial.
const TRIVIAL_CUTOFF_TARGET_MS: f64 = 0.5;

/// Immutable sketch parameters, derived once at engine initialization and
/// embedded verbatim into every snapshot so the viewer can reconstruct bin
/// edges without guessing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SketchParams {
    pub alpha: f64,
    pub gamma: f64,
    pub bin_offset: i32,
    pub trivial_cutoff: f64,
}

impl SketchParams {
    /// Derive parameters for the given relative error.
    ///
    /// `bin_offset` is chosen so the trivial cutoff lands as close to
    /// 0.5 ms as the log grid allows (~0.55 ms at `alpha = 0.05`).
    #[must_use]
    pub fn new(alpha: f64) -> Self {
        debug_assert!(alpha > 0.0 && alpha < 1.0, "alpha must be in (0, 1)");
        let gamma = (1.0 + alpha) / (1.0 - alpha);
        #[allow(clippy::cast_possible_truncation)]
        let bin_offset = (TRIVIAL_CUTOFF_TARGET_MS.ln() / gamma.ln()).ceil() as i32;
        let trivial_cutoff = gamma.powi(bin_offset);

        Self {
            alpha,
            gamma,
            bin_offset,
            trivial_cutoff,
        }
    }

    /// Number of bins every bin vector carries
    /// (enough for [`MAX_OBSERVATION_MS`] without clamping).
    #[must_use]
    pub fn bin_count(&self) -> usize {
        self.bin_index_raw(MAX_OBSERVATION_MS) + 1
    }

    /// Left edge (inclusive) of bin `i`, in milliseconds.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    pub fn left_edge(&self, i: usize) -> f64 {
        self.gamma.powi(i as i32 + self.bin_offset)
    }

    /// Bin index for an observation `x > trivial_cutoff`, clamped into the
    /// last bin beyond [`MAX_OBSERVATION_MS`].
    #[must_use]
    pub fn bin_index(&self, x: f64) -> usize {
        self.bin_index_raw(x).min(self.bin_count() - 1)
    }

    /// Unclamped bin index: the unique `i >= 0` with
    /// `left_edge(i) <= x < left_edge(i + 1)`.
    ///
    /// `x.ln() / gamma.ln()` can land a hair on the wrong side of an exact
    /// bin edge, so the floor estimate is corrected against the same powi
    /// evaluation `left_edge` uses. That keeps `bin_index(left_edge(i)) == i`
    /// exact for every representable `i`.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn bin_index_raw(&self, x: f64) -> usize {
        debug_assert!(
            x > self.trivial_cutoff,
            "bin_index called with a trivial observation: {x}"
        );
        let mut i = ((x.ln() / self.gamma.ln()).floor() as i64) - i64::from(self.bin_offset);
        i = i.max(0);
        while self.edge_at(i + 1) <= x {
            i += 1;
        }
        while i > 0 && self.edge_at(i) > x {
            i -= 1;
        }
        i as usize
    }

    #[allow(clippy::cast_possible_truncation)]
    fn edge_at(&self, i: i64) -> f64 {
        self.gamma.powi(i as i32 + self.bin_offset)
    }
}

impl Default for SketchParams {
    fn default() -> Self {
        Self::new(DEFAULT_ALPHA)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_default_params_values() {
        let p = SketchParams::default();
        assert_eq!(p.alpha, 0.05);
        assert!((p.gamma - 1.105_263).abs() < 1e-6, "gamma = {}", p.gamma);
        assert_eq!(p.bin_offset, -6);
        assert!(
            (p.trivial_cutoff - 0.548_5).abs() < 1e-3,
            "cutoff = {}",
            p.trivial_cutoff
        );
        println!(
            "[PASS] default params: gamma={} offset={} cutoff={}",
            p.gamma, p.bin_offset, p.trivial_cutoff
        );
    }

    #[test]
    fn test_bin_count_covers_100ms() {
        let p = SketchParams::default();
        assert!(p.bin_count() > 0);
        // 100 ms maps to the last bin without clamping kicking in below it.
        assert_eq!(p.bin_index(MAX_OBSERVATION_MS), p.bin_count() - 1);
        // Far beyond the range, the index clamps.
        assert_eq!(p.bin_index(10_000.0), p.bin_count() - 1);
        println!("[PASS] bin count: {} bins cover 100ms", p.bin_count());
    }

    #[test]
    fn test_first_bin_starts_at_cutoff() {
        let p = SketchParams::default();
        // Just above the cutoff lands in bin 0, whose left edge is the cutoff.
        let x = p.trivial_cutoff * 1.000_001;
        assert_eq!(p.bin_index(x), 0);
        assert_eq!(p.left_edge(0), p.trivial_cutoff);
        println!("[PASS] first bin: left edge equals trivial cutoff");
    }

    #[test]
    fn test_bin_of_left_edge_is_identity() {
        let p = SketchParams::default();
        for i in 0..p.bin_count() {
            assert_eq!(
                p.bin_index(p.left_edge(i)),
                i,
                "bin_index(left_edge({i})) mismatch"
            );
        }
        println!("[PASS] bin(left_edge(i)) == i for all {} bins", p.bin_count());
    }

    #[test]
    fn test_serde_shape() {
        let p = SketchParams::default();
        let json = serde_json::to_value(p).unwrap();
        assert_eq!(json["alpha"], 0.05);
        assert_eq!(json["bin_offset"], -6);
        assert!(json.get("bin_count").is_none(), "bin_count is not wire data");
        println!("[PASS] params serde: wire shape stable");
    }

    proptest! {
        // P3: every in-range observation is bracketed by its bin's edges.
        #[test]
        fn prop_bin_edges_bracket_observation(x in 0.56_f64..99.0) {
            let p = SketchParams::default();
            let i = p.bin_index(x);
            prop_assert!(p.left_edge(i) <= x, "left_edge({}) > {}", i, x);
            prop_assert!(x < p.left_edge(i + 1), "{} >= left_edge({})", x, i + 1);
        }

        // Relative error of reconstructing from the left edge is bounded
        // by one gamma step.
        #[test]
        fn prop_relative_error_bounded(x in 0.56_f64..99.0) {
            let p = SketchParams::default();
            let edge = p.left_edge(p.bin_index(x));
            prop_assert!(x / edge < p.gamma * (1.0 + 1e-12));
        }
    }
}
