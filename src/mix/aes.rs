//! AES-round finalizer.
//!
//! **Not cryptographic.** Two rounds of the AES round function with fixed
//! keys over each 128-bit half of the lane vector. The round is a fast
//! bijection with strong diffusion when the CPU has it in hardware; nothing
//! else about AES is relied on.
//!
//! Each 128-bit half is one block, so lanes 0/1 and lanes 2/3 are mixed
//! together; the per-lane independence of the other mixers does not hold.
//! When the CPU has no AES instructions the integer [`Avalanche`] finalizer
//! is used instead.

use super::{Avalanche, Mixer};
use crate::lanes::Lanes;
use crate::simd::has_aes;

/// First round key (digits of π), as `[low 64, high 64]`.
pub const AES_KEY_LO: [u64; 2] = [0x85a3_08d3_243f_6a88, 0x0370_7344_1319_8a2e];

/// Second round key.
pub const AES_KEY_HI: [u64; 2] = [0x299f_31d0_a409_3822, 0xec4e_6c89_082e_fa98];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AesMix {
    hw: bool,
    fallback: Avalanche,
}

impl Default for AesMix {
    fn default() -> Self {
        Self::new()
    }
}

impl AesMix {
    pub fn new() -> Self {
        Self {
            hw: has_aes(),
            fallback: Avalanche::new(),
        }
    }

    /// True when the hardware rounds are in use.
    #[inline]
    pub fn is_hardware(&self) -> bool {
        self.hw
    }
}

impl Mixer for AesMix {
    fn name(&self) -> &'static str {
        if self.hw { "aes" } else { "aes(avalanche fallback)" }
    }

    #[inline]
    fn mix(&self, x: Lanes) -> Lanes {
        #[cfg(any(target_arch = "x86_64", target_arch = "aarch64"))]
        if self.hw {
            // SAFETY: `hw` is only set when the feature was detected
            return unsafe { hw::mix(&x) };
        }

        self.fallback.mix(x)
    }

    fn unmix(&self, y: Lanes) -> Lanes {
        #[cfg(any(target_arch = "x86_64", target_arch = "aarch64"))]
        if self.hw {
            return unsafe { hw::unmix(&y) };
        }

        self.fallback.unmix(y)
    }
}

#[cfg(target_arch = "x86_64")]
mod hw {
    use super::{AES_KEY_HI, AES_KEY_LO};
    use crate::lanes::Lanes;
    use core::arch::x86_64::*;

    #[inline(always)]
    #[allow(unsafe_op_in_unsafe_fn)]
    unsafe fn key(k: [u64; 2]) -> __m128i {
        _mm_set_epi64x(k[1] as i64, k[0] as i64)
    }

    #[target_feature(enable = "aes")]
    #[allow(unsafe_op_in_unsafe_fn)]
    pub(super) unsafe fn mix(x: &Lanes) -> Lanes {
        let (kl, kh) = (key(AES_KEY_LO), key(AES_KEY_HI));
        let p = x.0.as_ptr() as *const __m128i;

        let mut lo = _mm_load_si128(p);
        let mut hi = _mm_load_si128(p.add(1));

        lo = _mm_aesenc_si128(lo, kl);
        hi = _mm_aesenc_si128(hi, kl);
        lo = _mm_aesenc_si128(lo, kh);
        hi = _mm_aesenc_si128(hi, kh);

        let mut out = Lanes::ZERO;
        let q = out.0.as_mut_ptr() as *mut __m128i;

        _mm_store_si128(q, lo);
        _mm_store_si128(q.add(1), hi);

        out
    }

    /// `aesenc(s, k) = MC(SR(SB(s))) ^ k`, so one inverse round is
    /// `aesdeclast(aesimc(y ^ k), 0)`.
    #[target_feature(enable = "aes")]
    #[allow(unsafe_op_in_unsafe_fn)]
    pub(super) unsafe fn unmix(y: &Lanes) -> Lanes {
        let (kl, kh) = (key(AES_KEY_LO), key(AES_KEY_HI));
        let z = _mm_setzero_si128();
        let p = y.0.as_ptr() as *const __m128i;

        let mut lo = _mm_load_si128(p);
        let mut hi = _mm_load_si128(p.add(1));

        lo = _mm_aesdeclast_si128(_mm_aesimc_si128(_mm_xor_si128(lo, kh)), z);
        hi = _mm_aesdeclast_si128(_mm_aesimc_si128(_mm_xor_si128(hi, kh)), z);
        lo = _mm_aesdeclast_si128(_mm_aesimc_si128(_mm_xor_si128(lo, kl)), z);
        hi = _mm_aesdeclast_si128(_mm_aesimc_si128(_mm_xor_si128(hi, kl)), z);

        let mut out = Lanes::ZERO;
        let q = out.0.as_mut_ptr() as *mut __m128i;

        _mm_store_si128(q, lo);
        _mm_store_si128(q.add(1), hi);

        out
    }
}

#[cfg(target_arch = "aarch64")]
mod hw {
    use super::{AES_KEY_HI, AES_KEY_LO};
    use crate::lanes::Lanes;
    use core::arch::aarch64::*;

    #[inline(always)]
    #[allow(unsafe_op_in_unsafe_fn)]
    unsafe fn key(k: &[u64; 2]) -> uint8x16_t {
        vreinterpretq_u8_u64(vld1q_u64(k.as_ptr()))
    }

    #[inline(always)]
    #[allow(unsafe_op_in_unsafe_fn)]
    unsafe fn load(p: *const u64) -> uint8x16_t {
        vreinterpretq_u8_u64(vld1q_u64(p))
    }

    #[inline(always)]
    #[allow(unsafe_op_in_unsafe_fn)]
    unsafe fn store(p: *mut u64, v: uint8x16_t) {
        vst1q_u64(p, vreinterpretq_u64_u8(v))
    }

    /// `aese` xors the key first, so a zero key plus a trailing xor gives the
    /// x86 `aesenc` ordering.
    #[target_feature(enable = "aes")]
    #[allow(unsafe_op_in_unsafe_fn)]
    unsafe fn round(s: uint8x16_t, k: uint8x16_t) -> uint8x16_t {
        veorq_u8(vaesmcq_u8(vaeseq_u8(s, vdupq_n_u8(0))), k)
    }

    #[target_feature(enable = "aes")]
    #[allow(unsafe_op_in_unsafe_fn)]
    unsafe fn unround(s: uint8x16_t, k: uint8x16_t) -> uint8x16_t {
        vaesdq_u8(vaesimcq_u8(veorq_u8(s, k)), vdupq_n_u8(0))
    }

    #[target_feature(enable = "aes")]
    #[allow(unsafe_op_in_unsafe_fn)]
    pub(super) unsafe fn mix(x: &Lanes) -> Lanes {
        let (kl, kh) = (key(&AES_KEY_LO), key(&AES_KEY_HI));
        let p = x.0.as_ptr();

        let lo = round(round(load(p), kl), kh);
        let hi = round(round(load(p.add(2)), kl), kh);

        let mut out = Lanes::ZERO;
        store(out.0.as_mut_ptr(), lo);
        store(out.0.as_mut_ptr().add(2), hi);

        out
    }

    #[target_feature(enable = "aes")]
    #[allow(unsafe_op_in_unsafe_fn)]
    pub(super) unsafe fn unmix(y: &Lanes) -> Lanes {
        let (kl, kh) = (key(&AES_KEY_LO), key(&AES_KEY_HI));
        let p = y.0.as_ptr();

        let lo = unround(unround(load(p), kh), kl);
        let hi = unround(unround(load(p.add(2)), kh), kl);

        let mut out = Lanes::ZERO;
        store(out.0.as_mut_ptr(), lo);
        store(out.0.as_mut_ptr().add(2), hi);

        out
    }
}
