//! # SSE2 Engine
//!
//! **Only for x86_64 architectures!** SSE2 is baseline there, so this is the
//! fallback when AVX2 is not detected.
//!
//! The lane vector is processed as two `xmm` halves. SSE2 has no 32-bit low
//! product, so [`mullo_epi32`] builds one from two `pmuludq`.

use super::Engine;
use crate::lanes::Lanes;
use core::arch::x86_64::*;

pub(crate) struct Sse2;

impl Engine for Sse2 {
    #[inline(always)]
    #[allow(unsafe_op_in_unsafe_fn)]
    unsafe fn avalanche(x: &Lanes, m0: &Lanes, m1: &Lanes) -> Lanes {
        let src = x.0.as_ptr() as *const __m128i;
        let k0p = m0.0.as_ptr() as *const __m128i;
        let k1p = m1.0.as_ptr() as *const __m128i;

        let lo = avalanche_128(_mm_load_si128(src), _mm_load_si128(k0p), _mm_load_si128(k1p));
        let hi = avalanche_128(
            _mm_load_si128(src.add(1)),
            _mm_load_si128(k0p.add(1)),
            _mm_load_si128(k1p.add(1)),
        );

        let mut out = Lanes::ZERO;
        let dst = out.0.as_mut_ptr() as *mut __m128i;

        _mm_store_si128(dst, lo);
        _mm_store_si128(dst.add(1), hi);

        out
    }
}

#[inline(always)]
#[allow(unsafe_op_in_unsafe_fn)]
unsafe fn avalanche_128(mut v: __m128i, k0: __m128i, k1: __m128i) -> __m128i {
    v = _mm_xor_si128(v, _mm_srli_epi64::<33>(v));

    v = _mm_xor_si128(v, _mm_srli_epi64::<16>(v));
    v = mullo_epi32(v, k0);
    v = _mm_xor_si128(v, _mm_slli_epi64::<16>(v));
    v = mullo_epi32(v, k1);
    v = _mm_xor_si128(v, _mm_srli_epi64::<16>(v));
    v = mullo_epi32(v, k0);

    _mm_xor_si128(v, _mm_srli_epi64::<32>(v))
}

#[inline(always)]
#[allow(unsafe_op_in_unsafe_fn)]
/// Low 32 bits of the per-dword product
///
/// ## Visualization
///
/// ```md
/// a, b        => | a0 a1 a2 a3 |
///
/// even        => | a0*b0  | a2*b2  |   (64-bit products)
/// odd         => | a1*b1  | a3*b3  |
///
/// out         => | lo(a0*b0) lo(a1*b1) lo(a2*b2) lo(a3*b3) |
/// ```
unsafe fn mullo_epi32(a: __m128i, b: __m128i) -> __m128i {
    let even = _mm_mul_epu32(a, b);
    let odd = _mm_mul_epu32(_mm_srli_epi64::<32>(a), _mm_srli_epi64::<32>(b));

    let even = _mm_and_si128(even, _mm_set1_epi64x(0xffff_ffff));
    let odd = _mm_slli_epi64::<32>(odd);

    _mm_or_si128(even, odd)
}
