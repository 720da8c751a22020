//! # vprng
//!
//! Vectorised non-cryptographic PRNGs. Every generator is 4 independent
//! 64-bit lanes (one 256-bit block per call), built from a full-period state
//! update and a bijective mixer, so no output repeats within a period.
//!
//! - Streams: each generator draws its own odd increments from a shared
//!   [`StreamAllocator`]; distinct generators never share a stream.
//! - Positioning: [`Generator::set_position`], [`Generator::advance`] and
//!   [`Generator::rewind`] are `O(1)` (Weyl) or `O(log n)` (LCG, combined).
//! - Vetting: [`sac`] measures the avalanche quality of a candidate mixer.
//!
//! ```
//! use vprng::{Cvprng, LaneSource, Scalar};
//!
//! let mut g = Cvprng::new();
//! let block = g.next_u64x4();
//!
//! let mut rng = Scalar::new(g);
//! let die = rng.range_u32(1..=6);
//! # let _ = (block, die);
//! ```

mod bits;
mod engine;
mod error;
mod generator;
mod gf2;
mod lanes;
mod mix;
mod simd;
mod state;
mod stream;
mod update;

pub mod sac;

pub use bits::{
    SeqStats, bit_run_count_32, bit_run_count_64, bit_transitions_32, bit_transitions_64, chi_squared_uniform,
    lxorshift_inv_64, modinv_32, modinv_64, rxorshift_inv_32, rxorshift_inv_64,
};
pub use error::{Error, Result};
pub use generator::{
    Combined, Cvpcg, Cvprng, Cvprng3, Generator, LaneSource, RawState, VSplitMix, Vpcg, Vpcg32, Vprng, VprngAes,
    unit_f32, unit_f64,
};
pub use gf2::{BitMatrix, PERIOD_FACTORS};
pub use lanes::{LANES, LANES32, Lanes};
pub use mix::{
    AVALANCHE_M0, AVALANCHE_M1, AesMix, Avalanche, MIX32_M0, MIX32_M1, MIX64_TABLE, Mix32, Mix64, Mixer, SXM32_TABLE,
    Sxm32, mixer_lane,
};
pub use simd::{Isa, has_aes};
pub use state::{IntoRangeU32, IntoRangeU64, Scalar};
pub use stream::{StreamAllocator, global_seed, set_global_seed};
pub use update::{
    LCG32_MULTIPLIERS, LCG64_MULTIPLIERS, Lcg32, Lcg64, Permutation, StateUpdate, Weyl, Weyl128, XorShift2, XorShift3,
};
