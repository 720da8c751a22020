//! Per-ISA kernels of the default avalanche finalizer.
//!
//! Every backend computes, per 64-bit lane,
//!
//! ```md
//! x ^= x >> 33
//! x ^= x >> 16;  x = x *32 m0
//! x ^= x << 16;  x = x *32 m1
//! x ^= x >> 16;  x = x *32 m0
//! x ^= x >> 32
//! ```
//!
//! where `*32` multiplies the two 32-bit halves independently, keeping the
//! low 32 bits of each product. All backends are bit-identical to
//! [`portable::Portable`].

use crate::lanes::Lanes;
use crate::simd::Isa;

pub(crate) mod portable;

#[cfg(target_arch = "x86_64")]
pub(crate) mod avx2;

#[cfg(target_arch = "x86_64")]
pub(crate) mod sse2;

#[cfg(target_arch = "aarch64")]
pub(crate) mod neon;

pub(crate) trait Engine {
    /// ## Safety
    ///
    /// The CPU must support the instruction set the engine is written for.
    unsafe fn avalanche(x: &Lanes, m0: &Lanes, m1: &Lanes) -> Lanes;
}

/// Runs the avalanche kernel of `isa`.
///
/// `isa` must come from [`Isa::detect`] (or be [`Isa::Portable`]), which is
/// what makes the unsafe calls sound.
#[inline(always)]
pub(crate) fn avalanche(isa: Isa, x: &Lanes, m0: &Lanes, m1: &Lanes) -> Lanes {
    match isa {
        #[cfg(target_arch = "x86_64")]
        Isa::Avx2 => unsafe { avx2::Avx2::avalanche(x, m0, m1) },

        #[cfg(target_arch = "x86_64")]
        Isa::Sse2 => unsafe { sse2::Sse2::avalanche(x, m0, m1) },

        #[cfg(target_arch = "aarch64")]
        Isa::Neon => unsafe { neon::Neon::avalanche(x, m0, m1) },

        _ => unsafe { portable::Portable::avalanche(x, m0, m1) },
    }
}
