use crate::generator::{Combined, Generator, LaneSource};
use crate::lanes::{LANES, LANES32};
use crate::mix::Mixer;
use crate::stream::StreamAllocator;
use crate::update::{Permutation, StateUpdate};

/// Scalar view over a vector generator.
///
/// One block is drawn at a time and served word by word. The 64-bit and
/// 32-bit paths keep separate buffers, so interleaving `next_u64` and
/// `next_u32` never splits a block between them.
///
/// ## Visualization
///
/// ```md
/// block k:   [ l0 | l1 | l2 | l3 ]          -> next_u64: l0, l1, l2, l3
/// block k+1: [ l0.lo l0.hi | ... | l3.hi ]   -> next_u32: 8 words
/// ```
#[derive(Clone, Debug)]
pub struct Scalar<G: LaneSource> {
    source: G,
    buf_u64: [u64; LANES],
    buf_u32: [u32; LANES32],
    idx_u64: usize,
    idx_u32: usize,
}

impl<G: LaneSource> Scalar<G> {
    pub fn new(source: G) -> Self {
        Self {
            source,
            buf_u64: [0; LANES],
            buf_u32: [0; LANES32],
            idx_u64: LANES,
            idx_u32: LANES32,
        }
    }

    #[inline]
    pub fn source(&self) -> &G {
        &self.source
    }

    /// Unwraps the generator. Buffered but unserved words are lost.
    pub fn into_inner(self) -> G {
        self.source
    }

    #[inline(always)]
    pub fn next_u64(&mut self) -> u64 {
        // sanity check
        debug_assert!(self.idx_u64 <= LANES);

        if self.idx_u64 == LANES {
            self.buf_u64 = self.source.next_u64x4();
            self.idx_u64 = 0;
        }

        let val = self.buf_u64[self.idx_u64];
        self.idx_u64 += 1;

        val
    }

    #[inline(always)]
    pub fn next_u32(&mut self) -> u32 {
        // sanity check
        debug_assert!(self.idx_u32 <= LANES32);

        if self.idx_u32 == LANES32 {
            self.buf_u32 = self.source.next_u32x8();
            self.idx_u32 = 0;
        }

        let val = self.buf_u32[self.idx_u32];
        self.idx_u32 += 1;

        val
    }

    #[inline]
    pub fn next_f64(&mut self) -> f64 {
        crate::generator::unit_f64(self.next_u64())
    }

    /// Fills `buf` straight from the generator, bypassing the buffer.
    #[inline]
    pub fn batch_u64(&mut self, buf: &mut [u64]) {
        self.source.fill_u64(buf);
    }

    #[inline]
    pub fn batch_u32(&mut self, buf: &mut [u32]) {
        self.source.fill_u32(buf);
    }

    /// Uniform value in `range`, without modulo bias.
    #[inline]
    pub fn range_u64<R: IntoRangeU64>(&mut self, range: R) -> u64 {
        let (start, span) = range.into_bounds();

        if span == 0 {
            return self.next_u64();
        }

        // multiply-shift, rejecting the low products that would bias it
        let mut m = self.next_u64() as u128 * span as u128;

        if (m as u64) < span {
            let threshold = span.wrapping_neg() % span;

            while (m as u64) < threshold {
                m = self.next_u64() as u128 * span as u128;
            }
        }

        start + (m >> 64) as u64
    }

    #[inline]
    pub fn range_u32<R: IntoRangeU32>(&mut self, range: R) -> u32 {
        let (start, span) = range.into_bounds();

        if span == 0 {
            return self.next_u32();
        }

        let mut m = self.next_u32() as u64 * span as u64;

        if (m as u32) < span {
            let threshold = span.wrapping_neg() % span;

            while (m as u32) < threshold {
                m = self.next_u32() as u64 * span as u64;
            }
        }

        start + (m >> 32) as u32
    }
}

impl<G: LaneSource + Default> Default for Scalar<G> {
    fn default() -> Self {
        Self::new(G::default())
    }
}

impl<G: LaneSource> From<G> for Scalar<G> {
    fn from(source: G) -> Self {
        Self::new(source)
    }
}

pub trait IntoRangeU64 {
    /// Returns (start, span) from a range object, where span 0 means the
    /// full 64-bit range.
    fn into_bounds(self) -> (u64, u64);
}

impl IntoRangeU64 for core::ops::Range<u64> {
    fn into_bounds(self) -> (u64, u64) {
        // sanity check
        assert!(self.start < self.end, "range_u64: empty exclusive range");

        (self.start, self.end - self.start)
    }
}

impl IntoRangeU64 for core::ops::RangeInclusive<u64> {
    fn into_bounds(self) -> (u64, u64) {
        let (start, end) = self.into_inner();

        // sanity check
        assert!(start <= end, "range_u64: empty inclusive range");

        // wraps to 0 on the full range
        (start, (end - start).wrapping_add(1))
    }
}

pub trait IntoRangeU32 {
    fn into_bounds(self) -> (u32, u32);
}

impl IntoRangeU32 for core::ops::Range<u32> {
    fn into_bounds(self) -> (u32, u32) {
        // sanity check
        assert!(self.start < self.end, "range_u32: empty exclusive range");

        (self.start, self.end - self.start)
    }
}

impl IntoRangeU32 for core::ops::RangeInclusive<u32> {
    fn into_bounds(self) -> (u32, u32) {
        let (start, end) = self.into_inner();

        // sanity check
        assert!(start <= end, "range_u32: empty inclusive range");

        (start, (end - start).wrapping_add(1))
    }
}

impl<G: LaneSource> rand_core::RngCore for Scalar<G> {
    #[inline]
    fn next_u32(&mut self) -> u32 {
        Scalar::next_u32(self)
    }

    #[inline]
    fn next_u64(&mut self) -> u64 {
        Scalar::next_u64(self)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        rand_core::impls::fill_bytes_via_next(self, dest)
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand_core::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

/// The seed is the starting counter of a private stream allocator, so equal
/// seeds give equal streams and `seed_from_u64(s)` matches
/// `with_streams(&StreamAllocator::new(s))`.
impl<U, M> rand_core::SeedableRng for Scalar<Generator<U, M>>
where
    U: StateUpdate + Default,
    M: Mixer + Default,
{
    type Seed = [u8; 8];

    fn from_seed(seed: Self::Seed) -> Self {
        Self::seed_from_u64(u64::from_le_bytes(seed))
    }

    fn seed_from_u64(state: u64) -> Self {
        Self::new(Generator::with_streams(&StreamAllocator::new(state)))
    }
}

impl<U, P, M> rand_core::SeedableRng for Scalar<Combined<U, P, M>>
where
    U: StateUpdate + Default,
    P: Permutation,
    M: Mixer + Default,
{
    type Seed = [u8; 8];

    fn from_seed(seed: Self::Seed) -> Self {
        Self::seed_from_u64(u64::from_le_bytes(seed))
    }

    fn seed_from_u64(state: u64) -> Self {
        Self::new(Combined::with_streams(&StreamAllocator::new(state)))
    }
}

#[cfg(test)]
mod state_tests {
    use super::*;
    use crate::generator::{Cvprng, Vpcg32, Vprng};
    use rand_core::{RngCore, SeedableRng};

    fn seeded(seed: u64) -> Scalar<Cvprng> {
        Scalar::seed_from_u64(seed)
    }

    mod buffering {
        use super::*;

        #[test]
        fn test_u64_follows_block_order() {
            let mut g = Cvprng::with_streams(&StreamAllocator::new(1));
            let mut s = seeded(1);

            let a = g.next_u64x4();
            let b = g.next_u64x4();

            for v in a.iter().chain(b.iter()) {
                assert_eq!(s.next_u64(), *v);
            }
        }

        #[test]
        fn test_u32_low_half_first() {
            let mut g = Vprng::with_streams(&StreamAllocator::new(9));
            let mut s = Scalar::<Vprng>::seed_from_u64(9);

            let block = g.next_u64x4();

            assert_eq!(s.next_u32(), block[0] as u32);
            assert_eq!(s.next_u32(), (block[0] >> 32) as u32);
        }

        #[test]
        fn test_interleaving_keeps_separate_blocks() {
            let mut g = Vprng::with_streams(&StreamAllocator::new(3));
            let mut s = Scalar::<Vprng>::seed_from_u64(3);

            let first = g.next_u64x4();
            let second = g.next_u32x8();

            assert_eq!(s.next_u64(), first[0]);
            assert_eq!(s.next_u32(), second[0]);
            assert_eq!(s.next_u64(), first[1]);
            assert_eq!(s.next_u32(), second[1]);
        }

        #[test]
        fn test_batch_fills_full_buffer() {
            let mut s = seeded(42);

            let mut buf64 = [0u64; 33];
            let mut buf32 = [0u32; 33];

            s.batch_u64(&mut buf64);
            s.batch_u32(&mut buf32);

            assert!(buf64.iter().all(|&x| x != 0), "batch_u64 must fill buffer");
            assert!(buf32.iter().filter(|&&x| x == 0).count() <= 1, "batch_u32 must fill buffer");
        }

        #[test]
        fn test_into_inner_returns_source() {
            let mut s = seeded(5);
            let _ = s.next_u64();

            assert_eq!(s.into_inner().position(), 1);
        }
    }

    mod rand_interop {
        use super::*;

        #[test]
        fn test_deterministic_for_same_seed() {
            let mut a = seeded(123_456_789);
            let mut b = Scalar::<Cvprng>::from_seed(123_456_789u64.to_le_bytes());

            for _ in 0..64 {
                assert_eq!(a.next_u64(), b.next_u64(), "identical seeds must yield same sequence");
            }
        }

        #[test]
        fn test_different_seeds_produce_different_sequences() {
            let mut a = seeded(1);
            let mut b = seeded(2);

            let seq_a: Vec<u64> = (0..8).map(|_| a.next_u64()).collect();
            let seq_b: Vec<u64> = (0..8).map(|_| b.next_u64()).collect();

            assert_ne!(seq_a, seq_b, "different seeds should yield distinct output");
        }

        #[test]
        fn test_fill_bytes_uses_words_little_endian() {
            let mut a = seeded(11);
            let mut b = seeded(11);

            let mut bytes = [0u8; 16];
            RngCore::fill_bytes(&mut a, &mut bytes);

            let w0 = b.next_u64().to_le_bytes();
            let w1 = b.next_u64().to_le_bytes();

            assert_eq!(&bytes[..8], &w0);
            assert_eq!(&bytes[8..], &w1);
        }

        #[test]
        fn test_try_fill_bytes_never_fails() {
            let mut s = Scalar::<Vpcg32>::seed_from_u64(1);
            let mut bytes = [0u8; 37];

            assert!(s.try_fill_bytes(&mut bytes).is_ok());
        }

        #[test]
        fn test_can_move_across_threads() {
            use std::thread;

            let mut rng = seeded(1234);
            let handle = thread::spawn(move || (0..4).map(|_| rng.next_u64()).collect::<Vec<_>>());

            let res = handle.join().expect("thread should run successfully");
            assert!(res.iter().any(|&x| x != 0));
        }
    }

    mod ranges {
        use super::*;

        #[test]
        fn test_range_u64_basic() {
            let mut rng = seeded(2025);

            for _ in 0..1000 {
                let v = rng.range_u64(10..20);
                assert!((10..20).contains(&v));
            }

            for _ in 0..1000 {
                let v = rng.range_u64(5..=15);
                assert!((5..=15).contains(&v));
            }

            let _ = rng.range_u64(0..=u64::MAX);
            assert_eq!(rng.range_u64(7..=7), 7);
        }

        #[test]
        fn test_range_u32_basic() {
            let mut rng = seeded(909);

            for _ in 0..1000 {
                let v = rng.range_u32(100..200);
                assert!((100..200).contains(&v));
            }

            for _ in 0..1000 {
                let v = rng.range_u32(50..=100);
                assert!((50..=100).contains(&v));
            }

            let _ = rng.range_u32(0..=u32::MAX);
        }

        #[test]
        #[should_panic(expected = "empty exclusive range")]
        fn test_empty_range_panics() {
            let mut rng = seeded(1);
            let _ = rng.range_u64(10..10);
        }

        #[test]
        #[should_panic(expected = "empty inclusive range")]
        #[allow(clippy::reversed_empty_ranges)]
        fn test_reversed_inclusive_range_panics() {
            let mut rng = seeded(1);
            let _ = rng.range_u32(10..=9);
        }

        #[test]
        fn test_uniformity_rough_check() {
            let mut rng = seeded(7777);
            let mut hits = [0u64; 10];

            for _ in 0..10_000 {
                let v = rng.range_u64(0..10);
                hits[v as usize] += 1;
            }

            let avg = hits.iter().sum::<u64>() as f64 / 10.0;
            let max_dev = hits.iter().map(|&x| (x as f64 - avg).abs()).fold(0.0, f64::max);

            assert!(max_dev / avg < 0.25, "rough uniformity check failed");
        }
    }
}
