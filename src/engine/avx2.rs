//! # AVX2 Engine
//!
//! **Only for x86_64 CPUs with AVX2, selected at runtime!**
//!
//! The whole 256-bit lane vector fits one `ymm` register, and AVX2 has a
//! native 32-bit low product (`vpmulld`), so the finalizer is a straight
//! line of eleven instructions.

use super::Engine;
use crate::lanes::Lanes;
use core::arch::x86_64::*;

pub(crate) struct Avx2;

impl Engine for Avx2 {
    #[inline(always)]
    unsafe fn avalanche(x: &Lanes, m0: &Lanes, m1: &Lanes) -> Lanes {
        unsafe { avalanche_avx2(x, m0, m1) }
    }
}

#[inline]
#[target_feature(enable = "avx2")]
#[allow(unsafe_op_in_unsafe_fn)]
unsafe fn avalanche_avx2(x: &Lanes, m0: &Lanes, m1: &Lanes) -> Lanes {
    // NOTE: `Lanes` is 32-byte aligned so aligned loads are fine
    let k0 = _mm256_load_si256(m0.0.as_ptr() as *const __m256i);
    let k1 = _mm256_load_si256(m1.0.as_ptr() as *const __m256i);
    let mut v = _mm256_load_si256(x.0.as_ptr() as *const __m256i);

    v = _mm256_xor_si256(v, _mm256_srli_epi64::<33>(v));

    v = _mm256_xor_si256(v, _mm256_srli_epi64::<16>(v));
    v = _mm256_mullo_epi32(v, k0);
    v = _mm256_xor_si256(v, _mm256_slli_epi64::<16>(v));
    v = _mm256_mullo_epi32(v, k1);
    v = _mm256_xor_si256(v, _mm256_srli_epi64::<16>(v));
    v = _mm256_mullo_epi32(v, k0);

    v = _mm256_xor_si256(v, _mm256_srli_epi64::<32>(v));

    let mut out = Lanes::ZERO;
    _mm256_store_si256(out.0.as_mut_ptr() as *mut __m256i, v);

    out
}
