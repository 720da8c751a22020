//! Bit statistics primitives.
//!
//! Pure functions used by the stream allocator's acceptance filter, the
//! bijectivity checks and the SAC scoring.

/// Number of maximal runs of set bits in `x`.
///
/// `x & (x ^ (x >> 1))` keeps exactly the top bit of every run of ones.
#[inline(always)]
pub const fn bit_run_count_64(x: u64) -> u32 {
    (x & (x ^ (x >> 1))).count_ones()
}

#[inline(always)]
pub const fn bit_run_count_32(x: u32) -> u32 {
    (x & (x ^ (x >> 1))).count_ones()
}

/// Number of adjacent bit pairs that differ, i.e. the number of boundaries
/// between maximal runs of equal bits (including the implicit zero above
/// the top bit).
#[inline(always)]
pub const fn bit_transitions_64(x: u64) -> u32 {
    (x ^ (x >> 1)).count_ones()
}

#[inline(always)]
pub const fn bit_transitions_32(x: u32) -> u32 {
    (x ^ (x >> 1)).count_ones()
}

/// Multiplicative inverse of odd `a` modulo 2^64.
///
/// Newton–Hensel: the seed `(3a) ^ 2` is correct to 5 bits and every step
/// doubles that (5, 10, 20, 40, 80), so four updates are exact.
#[inline]
pub const fn modinv_64(a: u64) -> u64 {
    debug_assert!(a & 1 == 1, "modinv_64 of even value");

    let mut x = a.wrapping_mul(3) ^ 2;
    let mut y = 1u64.wrapping_sub(a.wrapping_mul(x));

    x = x.wrapping_mul(y.wrapping_add(1));
    y = y.wrapping_mul(y);
    x = x.wrapping_mul(y.wrapping_add(1));
    y = y.wrapping_mul(y);
    x = x.wrapping_mul(y.wrapping_add(1));
    y = y.wrapping_mul(y);
    x.wrapping_mul(y.wrapping_add(1))
}

/// Multiplicative inverse of odd `a` modulo 2^32 (three updates: 5, 10, 20, 40).
#[inline]
pub const fn modinv_32(a: u32) -> u32 {
    debug_assert!(a & 1 == 1, "modinv_32 of even value");

    let mut x = a.wrapping_mul(3) ^ 2;
    let mut y = 1u32.wrapping_sub(a.wrapping_mul(x));

    x = x.wrapping_mul(y.wrapping_add(1));
    y = y.wrapping_mul(y);
    x = x.wrapping_mul(y.wrapping_add(1));
    y = y.wrapping_mul(y);
    x.wrapping_mul(y.wrapping_add(1))
}

/// Inverse of `x ^= x >> n` on 64 bits (`n > 0`).
#[inline]
pub const fn rxorshift_inv_64(mut x: u64, mut n: u32) -> u64 {
    while n < 64 {
        x ^= x >> n;
        n += n;
    }

    x
}

/// Inverse of `x ^= x << n` on 64 bits (`n > 0`).
#[inline]
pub const fn lxorshift_inv_64(mut x: u64, mut n: u32) -> u64 {
    while n < 64 {
        x ^= x << n;
        n += n;
    }

    x
}

/// Inverse of `x ^= x >> n` on 32 bits (`n > 0`).
#[inline]
pub const fn rxorshift_inv_32(mut x: u32, mut n: u32) -> u32 {
    while n < 32 {
        x ^= x >> n;
        n += n;
    }

    x
}

/// Streaming mean / variance / extrema (Welford).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SeqStats {
    n: u64,
    m: f64,
    s: f64,
    min: f64,
    max: f64,
}

impl Default for SeqStats {
    fn default() -> Self {
        Self::new()
    }
}

impl SeqStats {
    pub const fn new() -> Self {
        Self {
            n: 0,
            m: 0.0,
            s: 0.0,
            min: f64::MAX,
            max: -f64::MAX,
        }
    }

    #[inline]
    pub fn add(&mut self, v: f64) {
        self.n += 1;

        let dm = v - self.m;
        self.m += dm / self.n as f64;
        self.s = dm.mul_add(v - self.m, self.s);

        self.min = self.min.min(v);
        self.max = self.max.max(v);
    }

    #[inline]
    pub fn count(&self) -> u64 {
        self.n
    }

    #[inline]
    pub fn mean(&self) -> f64 {
        self.m
    }

    /// Sample variance, `None` until two values have been seen.
    #[inline]
    pub fn variance(&self) -> Option<f64> {
        (self.n >= 2).then(|| self.s / (self.n - 1) as f64)
    }

    #[inline]
    pub fn stddev(&self) -> Option<f64> {
        self.variance().map(f64::sqrt)
    }

    /// `None` while empty.
    #[inline]
    pub fn min(&self) -> Option<f64> {
        (self.n > 0).then_some(self.min)
    }

    #[inline]
    pub fn max(&self) -> Option<f64> {
        (self.n > 0).then_some(self.max)
    }
}

impl Extend<f64> for SeqStats {
    fn extend<I: IntoIterator<Item = f64>>(&mut self, iter: I) {
        for v in iter {
            self.add(v);
        }
    }
}

/// Root of the chi-squared numerator against a uniform expectation:
/// `sqrt(Σ (observed[k] - expected)²)`.
///
/// Division by the expected count and any percentage scaling is left to the
/// caller so the figure stays comparable across table sizes.
pub fn chi_squared_uniform(observed: &[u64], expected: f64) -> f64 {
    // NOTE: four independent accumulators to break the FMA dependency chain
    let mut acc = [0.0f64; 4];
    let mut chunks = observed.chunks_exact(4);

    for c in chunks.by_ref() {
        for k in 0..4 {
            let d = c[k] as f64 - expected;
            acc[k] = d.mul_add(d, acc[k]);
        }
    }

    let tail = chunks
        .remainder()
        .iter()
        .fold(0.0, |r, &o| {
            let d = o as f64 - expected;
            d.mul_add(d, r)
        });

    (acc[0] + acc[1] + acc[2] + acc[3] + tail).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    mod counts {
        use super::*;

        #[test]
        fn test_bit_run_count_counts_runs_of_ones() {
            assert_eq!(bit_run_count_64(0), 0);
            assert_eq!(bit_run_count_64(u64::MAX), 1);
            assert_eq!(bit_run_count_64(0b1011_0111), 3);
            assert_eq!(bit_run_count_64(0x5555_5555_5555_5555), 32);
            assert_eq!(bit_run_count_32(0b1100_1100), 2);
        }

        #[test]
        fn test_bit_transitions() {
            assert_eq!(bit_transitions_64(0), 0);
            assert_eq!(bit_transitions_64(1), 1);
            assert_eq!(bit_transitions_64(u64::MAX), 1);
            assert_eq!(bit_transitions_32(0b0110), 2);
            assert_eq!(bit_transitions_32(0xaaaa_aaaa), 32);
        }
    }

    mod inverses {
        use super::*;

        #[test]
        fn test_modinv_edge_values() {
            for a in [1u64, 3, u64::MAX, 0x9e37_79b9_7f4a_7c15, 1 << 63 | 1] {
                assert_eq!(a.wrapping_mul(modinv_64(a)), 1, "a = {a:#x}");
            }

            assert_eq!(modinv_64(0x9e37_79b9_7f4a_7c15), 0xf1de_83e1_9937_733d);
            assert_eq!(modinv_32(0x9e37_79b9), 0x144c_bc89);
        }

        proptest! {
            #[test]
            fn prop_modinv_64_is_inverse(a in any::<u64>()) {
                let a = a | 1;
                prop_assert_eq!(a.wrapping_mul(modinv_64(a)), 1);
            }

            #[test]
            fn prop_modinv_32_is_inverse(a in any::<u32>()) {
                let a = a | 1;
                prop_assert_eq!(a.wrapping_mul(modinv_32(a)), 1);
            }

            #[test]
            fn prop_xorshift_inverses(x in any::<u64>(), n in 1u32..64) {
                prop_assert_eq!(rxorshift_inv_64(x ^ (x >> n), n), x);
                prop_assert_eq!(lxorshift_inv_64(x ^ (x << n), n), x);

                let y = x as u32;
                let m = n % 31 + 1;
                prop_assert_eq!(rxorshift_inv_32(y ^ (y >> m), m), y);
            }
        }
    }

    mod welford {
        use super::*;

        #[test]
        fn test_seq_stats_matches_two_pass() {
            let data = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
            let mut s = SeqStats::new();
            s.extend(data);

            let mean = data.iter().sum::<f64>() / data.len() as f64;
            let var = data.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (data.len() - 1) as f64;

            assert_eq!(s.count(), 8);
            assert_relative_eq!(s.mean(), 5.0);
            assert_relative_eq!(s.variance().unwrap(), var, epsilon = 1e-12);
            assert_eq!(s.min(), Some(2.0));
            assert_eq!(s.max(), Some(9.0));
        }

        #[test]
        fn test_seq_stats_guards_small_counts() {
            let mut s = SeqStats::new();
            assert_eq!(s.variance(), None);
            assert_eq!(s.min(), None);

            s.add(1.5);
            assert_eq!(s.variance(), None);
            assert_eq!(s.max(), Some(1.5));
        }
    }

    mod chi_squared {
        use super::*;

        #[test]
        fn test_exact_expectation_scores_zero() {
            assert_eq!(chi_squared_uniform(&[8; 13], 8.0), 0.0);
        }

        #[test]
        fn test_matches_naive_sum_with_tail() {
            let obs = [3u64, 9, 4, 7, 5, 11, 2];
            let e = 6.0;
            let naive = obs.iter().map(|&o| (o as f64 - e).powi(2)).sum::<f64>().sqrt();

            assert_relative_eq!(chi_squared_uniform(&obs, e), naive, epsilon = 1e-12);
        }
    }
}
