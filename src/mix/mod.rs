//! Mixer (finalizer) strategies.
//!
//! A mixer maps raw state to output bits. Every mixer here is a bijection on
//! its block, built only from invertible steps (xorshifts, odd products, AES
//! rounds), so a full-period state update stays full-period at the output.
//! [`Mixer::unmix`] is the explicit step-by-step inverse.

use crate::bits::{lxorshift_inv_64, modinv_32, rxorshift_inv_64};
use crate::engine;
use crate::engine::portable::mul32x2;
use crate::error::{Error, Result};
use crate::lanes::Lanes;
use crate::simd::Isa;
use core::fmt::Debug;

mod aes;
mod family;

pub use aes::AesMix;
pub use family::{MIX32_M0, MIX32_M1, MIX64_TABLE, Mix32, Mix64, SXM32_TABLE, Sxm32};

/// Bijective finalizer over a 256-bit lane vector.
pub trait Mixer: Clone + Debug + Send + Sync {
    fn name(&self) -> &'static str;

    fn mix(&self, x: Lanes) -> Lanes;

    /// Inverse of [`Mixer::mix`].
    fn unmix(&self, y: Lanes) -> Lanes;
}

/// Low-half/high-half `m0` multipliers of the default finalizer.
pub const AVALANCHE_M0: Lanes = Lanes::from_u32x8([
    0b01010100111001010101100110011001,
    0b00101100100100110111011010110101,
    0b00111010100110101010100110101011,
    0b01000101000100110110100110110101,
    0b11110011010110100010110110010111,
    0b10101101101101001010100100101011,
    0b10000010110000101111110010101101,
    0b10101100010101100100101100000111,
]);

pub const AVALANCHE_M1: Lanes = Lanes::from_u32x8([
    0b10010011010101110110010111011101,
    0b10101101101101001010100100101101,
    0b10000010110000011111110010101101,
    0b10101100010101100100101100000111,
    0b01100011011010001010101010101101,
    0b10101110110001010101000101001011,
    0b10000010111000101111001010101101,
    0b01011010010101001001110100010111,
]);

/// Default finalizer: 64-bit xorshifts around three 32-bit half-lane odd
/// products with per half-lane multipliers.
///
/// ```md
/// x ^= x >> 33
/// x ^= x >> 16;  x = x *32 m0
/// x ^= x << 16;  x = x *32 m1
/// x ^= x >> 16;  x = x *32 m0
/// x ^= x >> 32
/// ```
///
/// The leading `>> 33` folds high bits into the low half before the 32-bit
/// stage; the low 32 bits of a Weyl sequence alone only have period 2^32.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Avalanche {
    isa: Isa,
    m0: Lanes,
    m1: Lanes,
    i0: Lanes,
    i1: Lanes,
}

impl Default for Avalanche {
    fn default() -> Self {
        Self::new()
    }
}

impl Avalanche {
    /// Production multipliers on the best detected kernel.
    pub fn new() -> Self {
        Self::build(Isa::detect(), AVALANCHE_M0, AVALANCHE_M1)
    }

    /// Production multipliers on the scalar kernel.
    pub fn portable() -> Self {
        Self::build(Isa::Portable, AVALANCHE_M0, AVALANCHE_M1)
    }

    /// Candidate multipliers (e.g. under SAC evaluation). Every 32-bit half
    /// must be odd.
    pub fn with_multipliers(m0: Lanes, m1: Lanes) -> Result<Self> {
        for (table, m) in [("m0", m0), ("m1", m1)] {
            if let Some(lane) = m.first_even32() {
                return Err(Error::EvenAvalancheMultiplier { table, lane });
            }
        }

        Ok(Self::build(Isa::detect(), m0, m1))
    }

    fn build(isa: Isa, m0: Lanes, m1: Lanes) -> Self {
        Self {
            isa,
            m0,
            m1,
            i0: m0.map32(modinv_32),
            i1: m1.map32(modinv_32),
        }
    }

    #[inline]
    pub fn isa(&self) -> Isa {
        self.isa
    }

    #[inline]
    pub fn multipliers(&self) -> (Lanes, Lanes) {
        (self.m0, self.m1)
    }
}

impl Mixer for Avalanche {
    /// Includes the kernel in use, e.g. `avalanche/avx2`.
    fn name(&self) -> &'static str {
        match self.isa {
            Isa::Avx2 => "avalanche/avx2",
            Isa::Sse2 => "avalanche/sse2",
            Isa::Neon => "avalanche/neon",
            Isa::Portable => "avalanche/portable",
        }
    }

    #[inline(always)]
    fn mix(&self, x: Lanes) -> Lanes {
        engine::avalanche(self.isa, &x, &self.m0, &self.m1)
    }

    fn unmix(&self, y: Lanes) -> Lanes {
        Lanes(core::array::from_fn(|i| {
            let mut x = y[i];

            x ^= x >> 32;
            x = mul32x2(x, self.i0[i]);
            x = rxorshift_inv_64(x, 16);
            x = mul32x2(x, self.i1[i]);
            x = lxorshift_inv_64(x, 16);
            x = mul32x2(x, self.i0[i]);
            x = rxorshift_inv_64(x, 16);

            rxorshift_inv_64(x, 33)
        }))
    }
}

/// Scalar view of one lane of a mixer, for feeding single-word tools such as
/// the SAC accumulator.
pub fn mixer_lane<M: Mixer>(mixer: &M, lane: usize) -> impl Fn(u64) -> u64 + '_ {
    move |x| mixer.mix(Lanes::splat(x))[lane]
}
