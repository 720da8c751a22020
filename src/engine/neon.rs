//! # NEON Engine
//!
//! **Only for aarch64 architectures!**
//!
//! The lane vector is processed as two `uint64x2_t` halves; the 32-bit low
//! products come from `vmulq_u32` on the reinterpreted registers.

use super::Engine;
use crate::lanes::Lanes;
use core::arch::aarch64::*;

pub(crate) struct Neon;

impl Engine for Neon {
    #[inline(always)]
    #[allow(unsafe_op_in_unsafe_fn)]
    unsafe fn avalanche(x: &Lanes, m0: &Lanes, m1: &Lanes) -> Lanes {
        let xp = x.0.as_ptr();
        let k0p = m0.0.as_ptr();
        let k1p = m1.0.as_ptr();

        let lo = avalanche_128(vld1q_u64(xp), vld1q_u64(k0p), vld1q_u64(k1p));
        let hi = avalanche_128(vld1q_u64(xp.add(2)), vld1q_u64(k0p.add(2)), vld1q_u64(k1p.add(2)));

        let mut out = Lanes::ZERO;
        vst1q_u64(out.0.as_mut_ptr(), lo);
        vst1q_u64(out.0.as_mut_ptr().add(2), hi);

        out
    }
}

#[inline(always)]
#[allow(unsafe_op_in_unsafe_fn)]
unsafe fn mul32(v: uint64x2_t, k: uint64x2_t) -> uint64x2_t {
    vreinterpretq_u64_u32(vmulq_u32(vreinterpretq_u32_u64(v), vreinterpretq_u32_u64(k)))
}

#[inline(always)]
#[allow(unsafe_op_in_unsafe_fn)]
unsafe fn avalanche_128(mut v: uint64x2_t, k0: uint64x2_t, k1: uint64x2_t) -> uint64x2_t {
    v = veorq_u64(v, vshrq_n_u64::<33>(v));

    v = veorq_u64(v, vshrq_n_u64::<16>(v));
    v = mul32(v, k0);
    v = veorq_u64(v, vshlq_n_u64::<16>(v));
    v = mul32(v, k1);
    v = veorq_u64(v, vshrq_n_u64::<16>(v));
    v = mul32(v, k0);

    veorq_u64(v, vshrq_n_u64::<32>(v))
}
