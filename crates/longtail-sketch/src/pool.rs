//! Preallocated pool of bin vectors.
//!
//! Bin vectors are only needed by the minority of sketches whose outlier
//! tier overflows, but acquiring one must not allocate while the host is
//! mid-encounter. The pool fills eagerly at engine start; `acquire` falls
//! back to a fresh allocation (with a once-per-encounter warning) when the
//! workload outruns it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::warn;

use longtail_types::SketchParams;

/// Idle vectors kept ready at engine start.
pub const DEFAULT_POOL_CAPACITY: usize = 100;

struct PoolInner {
    bin_count: usize,
    free: Mutex<Vec<Vec<u64>>>,
    capacity: usize,
    /// Set on the first empty-pool acquire; rearmed at encounter start so
    /// the warning fires at most once per encounter.
    exhaustion_warned: AtomicBool,
}

impl PoolInner {
    fn return_vec(&self, mut bins: Vec<u64>) {
        bins.fill(0);
        let mut free = self.free.lock();
        if free.len() < self.capacity {
            free.push(bins);
        }
        // A vector beyond capacity drops and frees normally.
    }
}

/// Pool of fixed-length, zero-initialized bin vectors.
///
/// Cheaply cloneable; each sketch holds a clone and acquires its vector on
/// first use. Vectors return to the pool (re-zeroed) when their [`BinVec`]
/// handle drops at engine shutdown, never mid-encounter.
#[derive(Clone)]
pub struct BinPool {
    inner: Arc<PoolInner>,
}

impl BinPool {
    /// Create a pool of `capacity` vectors sized by `params.bin_count()`,
    /// allocated eagerly.
    #[must_use]
    pub fn new(params: &SketchParams, capacity: usize) -> Self {
        let bin_count = params.bin_count();
        let free = (0..capacity).map(|_| vec![0_u64; bin_count]).collect();
        Self {
            inner: Arc::new(PoolInner {
                bin_count,
                free: Mutex::new(free),
                capacity,
                exhaustion_warned: AtomicBool::new(false),
            }),
        }
    }

    /// Take a zero-initialized bin vector.
    ///
    /// On an empty pool a fresh vector is built instead; the first such
    /// fallback since the last [`rearm_exhaustion_warning`](Self::rearm_exhaustion_warning)
    /// logs a warning.
    #[must_use]
    pub fn acquire(&self) -> BinVec {
        let recycled = self.inner.free.lock().pop();
        let data = match recycled {
            Some(bins) => bins,
            None => {
                if !self.inner.exhaustion_warned.swap(true, Ordering::Relaxed) {
                    warn!(
                        target: "longtail.pool",
                        bin_count = self.inner.bin_count,
                        capacity = self.inner.capacity,
                        "bin pool exhausted, allocating directly"
                    );
                }
                vec![0_u64; self.inner.bin_count]
            }
        };
        BinVec {
            data: Some(data),
            pool: Arc::clone(&self.inner),
        }
    }

    /// Re-arm the once-per-encounter exhaustion warning.
    pub fn rearm_exhaustion_warning(&self) {
        self.inner.exhaustion_warned.store(false, Ordering::Relaxed);
    }

    /// Length of every vector this pool serves.
    #[must_use]
    pub fn bin_count(&self) -> usize {
        self.inner.bin_count
    }

    /// Idle vectors currently available.
    #[must_use]
    pub fn available(&self) -> usize {
        self.inner.free.lock().len()
    }

    /// Maximum idle vectors the pool holds.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }
}

impl std::fmt::Debug for BinPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BinPool")
            .field("bin_count", &self.inner.bin_count)
            .field("capacity", &self.inner.capacity)
            .field("available", &self.available())
            .finish()
    }
}

/// Owned bin vector on loan from a [`BinPool`].
///
/// Dereferences to `[u64]`. On drop the backing vector is zeroed and
/// returned to its pool.
pub struct BinVec {
    /// `None` only transiently during `Drop`.
    data: Option<Vec<u64>>,
    pool: Arc<PoolInner>,
}

impl BinVec {
    #[must_use]
    pub fn as_slice(&self) -> &[u64] {
        self.data.as_ref().expect("BinVec backing consumed")
    }

    pub fn as_mut_slice(&mut self) -> &mut [u64] {
        self.data.as_mut().expect("BinVec backing consumed")
    }
}

impl std::ops::Deref for BinVec {
    type Target = [u64];

    fn deref(&self) -> &[u64] {
        self.as_slice()
    }
}

impl std::ops::DerefMut for BinVec {
    fn deref_mut(&mut self) -> &mut [u64] {
        self.as_mut_slice()
    }
}

impl Drop for BinVec {
    fn drop(&mut self) {
        if let Some(data) = self.data.take() {
            self.pool.return_vec(data);
        }
    }
}

impl std::fmt::Debug for BinVec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BinVec")
            .field("len", &self.as_slice().len())
            .field("occupied", &self.as_slice().iter().filter(|&&c| c > 0).count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool(capacity: usize) -> BinPool {
        BinPool::new(&SketchParams::default(), capacity)
    }

    #[test]
    fn test_pool_preallocates() {
        let p = pool(4);
        assert_eq!(p.available(), 4);
        assert_eq!(p.capacity(), 4);
        assert!(p.bin_count() > 0);
        println!("[PASS] pool preallocation: {} vectors ready", p.available());
    }

    #[test]
    fn test_acquire_is_zeroed_and_sized() {
        let p = pool(2);
        let bins = p.acquire();
        assert_eq!(bins.len(), p.bin_count());
        assert!(bins.iter().all(|&c| c == 0));
        assert_eq!(p.available(), 1);
        println!("[PASS] pool acquire: zeroed, correct length");
    }

    #[test]
    fn test_drop_returns_zeroed() {
        let p = pool(2);
        let mut bins = p.acquire();
        bins[3] = 77;
        drop(bins);
        assert_eq!(p.available(), 2);

        // The recycled vector must come back clean.
        let again = p.acquire();
        assert!(again.iter().all(|&c| c == 0));
        println!("[PASS] pool return: dirtied vector re-zeroed");
    }

    #[test]
    fn test_empty_pool_allocates_fresh() {
        let p = pool(1);
        let a = p.acquire();
        let b = p.acquire(); // pool now empty; falls back to fresh
        assert_eq!(b.len(), p.bin_count());
        assert_eq!(p.available(), 0);
        drop(a);
        drop(b);
        // Only capacity-many are kept.
        assert_eq!(p.available(), 1);
        println!("[PASS] pool exhaustion: fresh allocation, capacity bound on return");
    }

    #[test]
    fn test_exhaustion_warning_rearm() {
        let p = pool(0);
        // Both acquires hit the empty pool; the flag trips once.
        let _a = p.acquire();
        let _b = p.acquire();
        p.rearm_exhaustion_warning();
        let _c = p.acquire();
        println!("[PASS] pool warning rearm: flag cycles per encounter");
    }

    #[test]
    fn test_pool_clone_shares_state() {
        let p1 = pool(2);
        let p2 = p1.clone();
        let bins = p1.acquire();
        assert_eq!(p2.available(), 1);
        drop(bins);
        assert_eq!(p2.available(), 2);
        println!("[PASS] pool clone: shared free list");
    }
}
