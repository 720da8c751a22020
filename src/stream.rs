//! Stream allocator.
//!
//! Every generator lane needs its own odd additive constant. They are drawn
//! from a shared counter `c` and filtered:
//!
//! ```md
//! b = ((c << 1) | 1) * K          K = RoundToOdd(2^W / φ)
//!
//! accept  iff  |pop(b) - W/2| <= W/8
//!         and  runs_of_ones(b) >= pop(b) / 4
//! ```
//!
//! Rejected candidates just burn a counter value, so concurrent callers never
//! receive the same constant, and the mapping from counter value to constant
//! is a pure function that can be replayed.

use crate::bits::{bit_run_count_32, bit_run_count_64, modinv_32};
use core::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, trace};

/// `RoundToOdd(2^64 / φ)`
pub const INC_K64: u64 = 0x9e37_79b9_7f4a_7c15;

/// Inverse of [`INC_K64`] modulo 2^64.
pub const INC_I64: u64 = 0xf1de_83e1_9937_733d;

/// `RoundToOdd(2^32 / φ)`
pub const INC_K32: u32 = 0x9e37_79b9;

/// Inverse of [`INC_K32`] modulo 2^32.
pub const INC_I32: u32 = modinv_32(INC_K32);

/// Counter value the process-wide allocator starts from.
pub const DEFAULT_SEED: u64 = 1;

static GLOBAL: StreamAllocator = StreamAllocator::new(DEFAULT_SEED);

/// Candidate additive constant for counter value `c` (64-bit lanes).
#[inline(always)]
pub const fn candidate_64(c: u64) -> u64 {
    ((c << 1) | 1).wrapping_mul(INC_K64)
}

/// Candidate additive constant for counter value `c` (32-bit lanes).
#[inline(always)]
pub const fn candidate_32(c: u32) -> u32 {
    ((c << 1) | 1).wrapping_mul(INC_K32)
}

/// Acceptance filter for 64-bit candidates: popcount in `24..=40` and at
/// least `pop / 4` runs of ones.
#[inline]
pub const fn accept_64(b: u64) -> bool {
    let pop = b.count_ones();

    // NOTE: wrapping sub folds both window bounds into one compare
    pop.wrapping_sub(32 - 8) <= 16 && bit_run_count_64(b) >= (pop >> 2)
}

/// Acceptance filter for 32-bit candidates: popcount in `12..=28`.
#[inline]
pub const fn accept_32(b: u32) -> bool {
    let pop = b.count_ones();

    pop.wrapping_sub(16 - 4) <= 16 && bit_run_count_32(b) >= (pop >> 2)
}

/// Counter value that produced a 64-bit increment (the lane-0 increment of
/// a generator is its stream id).
#[inline(always)]
pub const fn stream_id_64(inc: u64) -> u64 {
    INC_I64.wrapping_mul(inc) >> 1
}

#[inline(always)]
pub const fn stream_id_32(inc: u32) -> u32 {
    INC_I32.wrapping_mul(inc) >> 1
}

/// Thread-safe source of per-stream additive constants.
///
/// The process-wide instance is reached through [`StreamAllocator::global`];
/// private instances can be created for reproducible construction that does
/// not interfere with other users of the global one.
#[derive(Debug)]
pub struct StreamAllocator {
    counter: AtomicU64,
}

impl Default for StreamAllocator {
    fn default() -> Self {
        Self::new(DEFAULT_SEED)
    }
}

impl StreamAllocator {
    pub const fn new(seed: u64) -> Self {
        Self {
            counter: AtomicU64::new(seed),
        }
    }

    /// The process-wide allocator used by the plain constructors.
    #[inline(always)]
    pub fn global() -> &'static StreamAllocator {
        &GLOBAL
    }

    /// Current counter value (the next candidate to be tried).
    #[inline]
    pub fn seed(&self) -> u64 {
        self.counter.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn set_seed(&self, seed: u64) {
        self.counter.store(seed, Ordering::Relaxed);
    }

    /// Next accepted odd 64-bit additive constant.
    pub fn next_increment(&self) -> u64 {
        let mut rejected = 0u32;

        loop {
            let c = self.counter.fetch_add(1, Ordering::Relaxed);
            let b = candidate_64(c);

            if accept_64(b) {
                trace!(counter = c, rejected, inc = b, "stream increment");
                return b;
            }

            rejected += 1;
        }
    }

    /// Next accepted odd 32-bit additive constant. Uses the low 32 bits of
    /// the same counter.
    pub fn next_increment_u32(&self) -> u32 {
        let mut rejected = 0u32;

        loop {
            let c = self.counter.fetch_add(1, Ordering::Relaxed) as u32;
            let b = candidate_32(c);

            if accept_32(b) {
                trace!(counter = c, rejected, inc = b, "stream increment (32)");
                return b;
            }

            rejected += 1;
        }
    }
}

/// Sets the counter of the process-wide allocator.
pub fn set_global_seed(seed: u64) {
    debug!(seed, "global stream seed set");
    GLOBAL.set_seed(seed);
}

/// Reads the counter of the process-wide allocator.
pub fn global_seed() -> u64 {
    GLOBAL.seed()
}
