//! Tiered distributional sketch for the longtail profiler core.
//!
//! One sketch summarizes the per-render time of one instrumented callable
//! with three modalities, cheapest first:
//!
//! - a trivial counter for observations at or below the cutoff (dominant by
//!   count, worthless individually);
//! - a [`TopK`] bounded min-heap preserving the worst observations exactly
//!   (the long tail is the point: the analyst ranks worst renders by name);
//! - a lazily acquired log-binned histogram with relative error `alpha` for
//!   the body in between, drawn from a preallocated [`BinPool`] so the
//!   in-combat path never allocates.

mod pool;
mod tiered;
mod topk;

pub use pool::{BinPool, BinVec, DEFAULT_POOL_CAPACITY};
pub use tiered::TieredSketch;
pub use topk::TopK;
