//! # Portable Engine
//!
//! Scalar per-lane reference implementation. Used on targets without a
//! dedicated kernel and as the oracle the SIMD kernels are tested against.

use super::Engine;
use crate::lanes::Lanes;

pub(crate) struct Portable;

impl Engine for Portable {
    #[inline(always)]
    unsafe fn avalanche(x: &Lanes, m0: &Lanes, m1: &Lanes) -> Lanes {
        Lanes(core::array::from_fn(|i| avalanche_u64(x[i], m0[i], m1[i])))
    }
}

/// Product of the two 32-bit halves of `x` and `m`, independently.
#[inline(always)]
pub(crate) const fn mul32x2(x: u64, m: u64) -> u64 {
    let lo = (x as u32).wrapping_mul(m as u32);
    let hi = ((x >> 32) as u32).wrapping_mul((m >> 32) as u32);

    (lo as u64) | ((hi as u64) << 32)
}

/// One lane of the avalanche finalizer; `m0`/`m1` pack the multipliers of
/// the low and high half.
#[inline(always)]
pub(crate) const fn avalanche_u64(mut x: u64, m0: u64, m1: u64) -> u64 {
    x ^= x >> 33;

    x ^= x >> 16;
    x = mul32x2(x, m0);
    x ^= x << 16;
    x = mul32x2(x, m1);
    x ^= x >> 16;
    x = mul32x2(x, m0);

    x ^ (x >> 32)
}
