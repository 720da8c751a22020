//! # Strict Avalanche Criterion
//!
//! Flip each input bit of a sample, record which output bits changed, and
//! score the flip table against the ideal of every output bit changing with
//! probability one half.
//!
//! ```md
//! h = f(x)
//! for i in input bits:
//!     t = h ^ f(x ^ (1 << i))
//!     flips[i][j] += bit j of t
//!     input_pop[i] += popcount(t)
//!     histogram[popcount(t)] += 1
//! ```
//!
//! **Only for candidate vetting!** An accumulator has no internal locking;
//! parallel runs give each shard a private accumulator and [`Sac::merge`]
//! them at the end (see [`par_accumulate_weyl`]).

use crate::bits::{SeqStats, chi_squared_uniform};
use core::fmt;
use core::marker::PhantomData;
use rayon::prelude::*;
use tracing::debug;

/// Word type a SAC candidate maps to itself.
pub trait SacWord: Copy + Send + Sync + 'static {
    const BITS: usize;

    /// Truncating conversion, used to derive samples from a 64-bit driver.
    fn from_u64(x: u64) -> Self;

    fn to_u64(self) -> u64;
}

impl SacWord for u32 {
    const BITS: usize = 32;

    #[inline(always)]
    fn from_u64(x: u64) -> Self {
        x as u32
    }

    #[inline(always)]
    fn to_u64(self) -> u64 {
        self as u64
    }
}

impl SacWord for u64 {
    const BITS: usize = 64;

    #[inline(always)]
    fn from_u64(x: u64) -> Self {
        x
    }

    #[inline(always)]
    fn to_u64(self) -> u64 {
        self
    }
}

/// Golden-ratio step of the default sample driver.
pub const WEYL_SAMPLE_STEP: u64 = 0x9e37_79b9_7f4a_7c15;

/// Flip-count accumulator for a `W -> W` candidate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sac<W: SacWord> {
    flips: Vec<u64>,
    input_pop: Vec<u64>,
    histogram: Vec<u64>,
    samples: u64,
    _word: PhantomData<W>,
}

impl<W: SacWord> Default for Sac<W> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: SacWord> Sac<W> {
    pub fn new() -> Self {
        Self {
            flips: vec![0; W::BITS * W::BITS],
            input_pop: vec![0; W::BITS],
            histogram: vec![0; W::BITS + 1],
            samples: 0,
            _word: PhantomData,
        }
    }

    pub fn clear(&mut self) {
        self.flips.fill(0);
        self.input_pop.fill(0);
        self.histogram.fill(0);
        self.samples = 0;
    }

    #[inline]
    pub fn samples(&self) -> u64 {
        self.samples
    }

    /// Times output bit `output` changed when input bit `input` was flipped.
    #[inline]
    pub fn flips(&self, input: usize, output: usize) -> u64 {
        self.flips[input * W::BITS + output]
    }

    /// Total output bits changed per flipped input bit.
    #[inline]
    pub fn input_popcounts(&self) -> &[u64] {
        &self.input_pop
    }

    /// Distribution of `popcount(t)` over all flips, indexed `0..=BITS`.
    #[inline]
    pub fn histogram(&self) -> &[u64] {
        &self.histogram
    }

    /// Adds one sample.
    pub fn accumulate(&mut self, f: impl Fn(W) -> W, x: W) {
        let h = f(x).to_u64();
        let x = x.to_u64();

        for i in 0..W::BITS {
            let t = h ^ f(W::from_u64(x ^ (1 << i))).to_u64();
            let row = &mut self.flips[i * W::BITS..(i + 1) * W::BITS];

            let mut bits = t;
            while bits != 0 {
                row[bits.trailing_zeros() as usize] += 1;
                bits &= bits - 1;
            }

            let pop = t.count_ones();
            self.input_pop[i] += pop as u64;
            self.histogram[pop as usize] += 1;
        }

        self.samples += 1;
    }

    /// Adds `n` samples `start, start + step, start + 2·step, ...`
    /// (wrapping, truncated to `W`).
    pub fn accumulate_weyl(&mut self, f: impl Fn(W) -> W, start: u64, step: u64, n: u64) {
        let mut x = start;

        for _ in 0..n {
            self.accumulate(&f, W::from_u64(x));
            x = x.wrapping_add(step);
        }
    }

    /// Folds another accumulator's counts into this one.
    pub fn merge(&mut self, other: &Sac<W>) {
        for (a, b) in self.flips.iter_mut().zip(&other.flips) {
            *a += b;
        }
        for (a, b) in self.input_pop.iter_mut().zip(&other.input_pop) {
            *a += b;
        }
        for (a, b) in self.histogram.iter_mut().zip(&other.histogram) {
            *a += b;
        }

        self.samples += other.samples;
    }

    /// Scores the table; `None` before the first sample.
    pub fn score(&self) -> Option<SacReport> {
        if self.samples == 0 {
            return None;
        }

        let b = W::BITS;
        let n = self.samples as f64;

        // per cell: expected n/2 flips
        let ei = n / 2.0;
        let bit_chi = 100.0 / (b as f64 * ei) * chi_squared_uniform(&self.flips, ei);

        // per row / column: expected (B/2)·n flips
        let cols: Vec<u64> = (0..b).map(|j| (0..b).map(|i| self.flips[i * b + j]).sum()).collect();
        let e = b as f64 / 2.0 * n;
        let input_chi = 100.0 / e * chi_squared_uniform(&self.input_pop, e);
        let output_chi = 100.0 / e * chi_squared_uniform(&cols, e);

        let scale = 2.0 / n;
        let bias = |o: u64, s: f64| 100.0 * (o as f64 * s - 1.0).abs();

        let mut cells = SeqStats::new();
        cells.extend(self.flips.iter().map(|&o| bias(o, scale)));

        let max_input_bias = self.input_pop.iter().map(|&o| bias(o, scale / b as f64)).fold(0.0, f64::max);
        let max_output_bias = cols.iter().map(|&o| bias(o, scale / b as f64)).fold(0.0, f64::max);

        let report = SacReport {
            bits: b as u32,
            samples: self.samples,
            bit_chi,
            input_chi,
            output_chi,
            max_bias: cells.max().unwrap_or(0.0),
            min_bias: cells.min().unwrap_or(0.0),
            mean_bias: cells.mean(),
            stddev_bias: cells.stddev().unwrap_or(0.0),
            max_input_bias,
            max_output_bias,
        };

        debug!(
            bits = report.bits,
            samples = report.samples,
            max_bias = report.max_bias,
            mean_bias = report.mean_bias,
            "sac report"
        );

        Some(report)
    }
}

/// Sharded [`Sac::accumulate_weyl`]: the sample range is split into
/// `shards` contiguous pieces, each accumulated privately on the rayon pool,
/// then merged. The result equals the sequential accumulation.
pub fn par_accumulate_weyl<W, F>(f: F, start: u64, step: u64, n: u64, shards: usize) -> Sac<W>
where
    W: SacWord,
    F: Fn(W) -> W + Sync,
{
    let shards = shards.max(1) as u64;
    let chunk = n.div_ceil(shards);

    (0..shards)
        .into_par_iter()
        .map(|s| {
            let lo = (s * chunk).min(n);
            let hi = (lo + chunk).min(n);

            let mut acc = Sac::new();
            acc.accumulate_weyl(&f, start.wrapping_add(lo.wrapping_mul(step)), step, hi - lo);
            acc
        })
        .reduce(Sac::new, |mut a, b| {
            a.merge(&b);
            a
        })
}

/// Scores of one accumulation round. Biases are percentages: `0` is ideal,
/// `100` means a bit that always or never flips.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SacReport {
    pub bits: u32,
    pub samples: u64,

    /// Root chi figure over all `(input, output)` cells.
    pub bit_chi: f64,

    /// Root chi figure over per input bit totals.
    pub input_chi: f64,

    /// Root chi figure over per output bit totals.
    pub output_chi: f64,

    pub max_bias: f64,
    pub min_bias: f64,
    pub mean_bias: f64,
    pub stddev_bias: f64,
    pub max_input_bias: f64,
    pub max_output_bias: f64,
}

impl fmt::Display for SacReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "sac{} n={} chi={:.4} in={:.4} out={:.4} max={:.3}% mean={:.3}% sd={:.3}% in.max={:.3}% out.max={:.3}%",
            self.bits,
            self.samples,
            self.bit_chi,
            self.input_chi,
            self.output_chi,
            self.max_bias,
            self.mean_bias,
            self.stddev_bias,
            self.max_input_bias,
            self.max_output_bias,
        )
    }
}
