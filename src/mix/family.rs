use super::Mixer;
use crate::bits::{modinv_32, modinv_64, rxorshift_inv_32, rxorshift_inv_64};
use crate::error::{Error, Result};
use crate::lanes::{LANES32, Lanes};

/// 64-bit xorshift-multiply finalizer `(s0, m0, s1, m1, s2)`:
///
/// ```md
/// x ^= x >> s0;  x *= m0
/// x ^= x >> s1;  x *= m1
/// x ^= x >> s2
/// ```
///
/// The same function is applied to all four lanes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Mix64 {
    pub name: &'static str,
    pub s0: u32,
    pub m0: u64,
    pub s1: u32,
    pub m1: u64,
    pub s2: u32,
}

const fn mix64(name: &'static str, s0: u32, m0: u64, s1: u32, m1: u64, s2: u32) -> Mix64 {
    Mix64 { name, s0, m0, s1, m1, s2 }
}

impl Mix64 {
    pub const MIX01: Mix64 = mix64("mix01", 31, 0x7fb5_d329_728e_a185, 27, 0x81da_def4_bc2d_d44d, 33);
    pub const MIX02: Mix64 = mix64("mix02", 33, 0x64dd_8148_2cbd_31d7, 31, 0xe36a_a5c6_1361_2997, 31);
    pub const MIX03: Mix64 = mix64("mix03", 31, 0x99bc_f682_2b23_ca35, 30, 0x1402_0a57_acce_d8b7, 33);
    pub const MIX04: Mix64 = mix64("mix04", 33, 0x62a9_d9ed_7997_05f5, 28, 0xcb24_d0a5_c88c_35b3, 32);
    pub const MIX05: Mix64 = mix64("mix05", 31, 0x79c1_35c1_674b_9add, 29, 0x54c7_7c86_f691_3e45, 30);
    pub const MIX06: Mix64 = mix64("mix06", 31, 0x69b0_bc90_bd9a_8c49, 27, 0x3d5e_661a_2a77_868d, 30);
    pub const MIX07: Mix64 = mix64("mix07", 30, 0x16a6_ac37_883a_f045, 26, 0xcc9c_31a4_2746_86a5, 32);
    pub const MIX08: Mix64 = mix64("mix08", 30, 0x294a_a628_4991_2f0b, 28, 0x0a9b_a9c8_a5b1_5117, 31);
    pub const MIX09: Mix64 = mix64("mix09", 32, 0x4cd6_944c_5cc2_0b6d, 29, 0xfc12_c5b1_9d32_59e9, 32);
    pub const MIX10: Mix64 = mix64("mix10", 30, 0xe4c7_e495_f4c6_83f5, 32, 0xfda8_71ba_ea35_a293, 33);
    pub const MIX11: Mix64 = mix64("mix11", 27, 0x97d4_61a8_b115_70d9, 28, 0x0227_1eb7_c6c4_cd6b, 32);
    pub const MIX12: Mix64 = mix64("mix12", 29, 0x3cd0_eb9d_4753_2dfb, 26, 0x6366_0277_5287_72bb, 33);
    pub const MIX13: Mix64 = mix64("mix13", 30, 0xbf58_476d_1ce4_e5b9, 27, 0x94d0_49bb_1331_11eb, 31);
    pub const MIX14: Mix64 = mix64("mix14", 30, 0x4be9_8134_a597_6fd3, 29, 0x3bc0_993a_5ad1_9a13, 31);
    pub const MURMUR3: Mix64 = mix64("murmur3", 33, 0xff51_afd7_ed55_8ccd, 33, 0xc4ce_b9fe_1a85_ec53, 33);
    pub const XXHASH: Mix64 = mix64("xxhash", 33, 0xc2b2_ae3d_27d4_eb4f, 29, 0x1656_67b1_9e37_79f9, 32);
    pub const LEA: Mix64 = mix64("lea", 32, 0xdaba_0b6e_b093_22e3, 32, 0xdaba_0b6e_b093_22e3, 32);

    /// Candidate entry; both multipliers must be odd.
    pub fn new(name: &'static str, s0: u32, m0: u64, s1: u32, m1: u64, s2: u32) -> Result<Self> {
        if m0 & 1 == 0 {
            return Err(Error::EvenMultiplier { lane: 0 });
        }

        if m1 & 1 == 0 {
            return Err(Error::EvenMultiplier { lane: 1 });
        }

        Ok(mix64(name, s0, m0, s1, m1, s2))
    }

    #[inline(always)]
    pub const fn mix_u64(&self, mut x: u64) -> u64 {
        x ^= x >> self.s0;
        x = x.wrapping_mul(self.m0);
        x ^= x >> self.s1;
        x = x.wrapping_mul(self.m1);
        x ^ (x >> self.s2)
    }

    pub const fn unmix_u64(&self, mut x: u64) -> u64 {
        x = rxorshift_inv_64(x, self.s2);
        x = x.wrapping_mul(modinv_64(self.m1));
        x = rxorshift_inv_64(x, self.s1);
        x = x.wrapping_mul(modinv_64(self.m0));
        rxorshift_inv_64(x, self.s0)
    }
}

impl Default for Mix64 {
    fn default() -> Self {
        Self::MIX14
    }
}

impl Mixer for Mix64 {
    fn name(&self) -> &'static str {
        self.name
    }

    #[inline(always)]
    fn mix(&self, x: Lanes) -> Lanes {
        x.map(|v| self.mix_u64(v))
    }

    fn unmix(&self, y: Lanes) -> Lanes {
        y.map(|v| self.unmix_u64(v))
    }
}

/// The vetted 64-bit finalizers, roughly best first by SAC bias.
pub const MIX64_TABLE: [Mix64; 17] = [
    Mix64::MIX06,
    Mix64::MIX13,
    Mix64::MIX12,
    Mix64::MIX02,
    Mix64::MIX05,
    Mix64::MIX14,
    Mix64::MIX04,
    Mix64::LEA,
    Mix64::XXHASH,
    Mix64::MIX08,
    Mix64::MURMUR3,
    Mix64::MIX07,
    Mix64::MIX01,
    Mix64::MIX10,
    Mix64::MIX09,
    Mix64::MIX11,
    Mix64::MIX03,
];

/// 32-bit xorshift-multiply `(s0, m0, s1, m1, s2)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Sxm32 {
    pub s0: u32,
    pub m0: u32,
    pub s1: u32,
    pub m1: u32,
    pub s2: u32,
}

const fn sxm(m0: u32, m1: u32) -> Sxm32 {
    Sxm32 { s0: 16, m0, s1: 15, m1, s2: 15 }
}

impl Sxm32 {
    #[inline(always)]
    pub const fn mix_u32(&self, mut x: u32) -> u32 {
        x = (x ^ (x >> self.s0)).wrapping_mul(self.m0);
        x = (x ^ (x >> self.s1)).wrapping_mul(self.m1);
        x ^ (x >> self.s2)
    }

    pub const fn unmix_u32(&self, mut x: u32) -> u32 {
        x = rxorshift_inv_32(x, self.s2);
        x = rxorshift_inv_32(x.wrapping_mul(modinv_32(self.m1)), self.s1);
        rxorshift_inv_32(x.wrapping_mul(modinv_32(self.m0)), self.s0)
    }
}

/// Candidate 32-bit finalizers of shape `(16, m0, 15, m1, 15)` kept from the
/// last search, best first.
pub const SXM32_TABLE: [Sxm32; 14] = [
    sxm(0x21f0_aaad, 0xf35a_2d97),
    sxm(0x603a_32a7, 0x5a52_2677),
    sxm(0x21f0_aaad, 0xd35a_2d97),
    sxm(0x9721_9aad, 0xab46_b735),
    sxm(0xb237_694b, 0xeb5b_4593),
    sxm(0x8ee0_d535, 0x5dc6_b5af),
    sxm(0xdc63_b4d3, 0x2c32_b9a9),
    sxm(0x93f2_552b, 0x959b_4a4d),
    sxm(0xdc85_aaa7, 0x6658_a5cb),
    sxm(0x17cd_d657, 0xa426_cb25),
    sxm(0xab39_aacb, 0xa1b5_d19b),
    sxm(0xaecc_96b5, 0xf64d_cd47),
    sxm(0x5dce_3553, 0xa655_d8e9),
    sxm(0x604b_aa5d, 0x43d6_ce97),
];

pub const MIX32_M0: [u32; LANES32] = [
    0x21f0_aaad,
    0xa52f_b2cd,
    0x7feb_352d,
    0x4bdc_9aa5,
    0xac10_d4eb,
    0xdf89_2d4b,
    0x462d_aaad,
    0x4ffc_ab35,
];

pub const MIX32_M1: [u32; LANES32] = [
    0x735a_2d97,
    0x551e_4d49,
    0x846c_a68b,
    0x2729_b469,
    0x9d51_b169,
    0x3c2d_a6b3,
    0x0a36_c95d,
    0xe98d_b28b,
];

/// Eight independent 32-bit finalizers on the 32-bit view. Needed by
/// [`Lcg32`](crate::update::Lcg32): a 64-bit mixer would not keep the
/// 32-bit lanes equidistributed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Mix32 {
    lanes: [Sxm32; LANES32],
}

impl Default for Mix32 {
    fn default() -> Self {
        Self {
            lanes: core::array::from_fn(|i| sxm(MIX32_M0[i], MIX32_M1[i])),
        }
    }
}

impl Mix32 {
    pub fn with_lanes(lanes: [Sxm32; LANES32]) -> Result<Self> {
        for (lane, s) in lanes.iter().enumerate() {
            if s.m0 & s.m1 & 1 == 0 {
                return Err(Error::EvenMultiplier { lane });
            }
        }

        Ok(Self { lanes })
    }

    /// One finalizer on every lane.
    pub fn uniform(f: Sxm32) -> Result<Self> {
        Self::with_lanes([f; LANES32])
    }

    #[inline]
    pub fn lane(&self, i: usize) -> Sxm32 {
        self.lanes[i]
    }
}

impl Mixer for Mix32 {
    fn name(&self) -> &'static str {
        "mix32"
    }

    #[inline(always)]
    fn mix(&self, x: Lanes) -> Lanes {
        let u = x.to_u32x8();
        Lanes::from_u32x8(core::array::from_fn(|i| self.lanes[i].mix_u32(u[i])))
    }

    fn unmix(&self, y: Lanes) -> Lanes {
        let u = y.to_u32x8();
        Lanes::from_u32x8(core::array::from_fn(|i| self.lanes[i].unmix_u32(u[i])))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_tables_are_odd() {
        for m in MIX64_TABLE {
            assert_eq!(m.m0 & m.m1 & 1, 1, "{}", m.name);
        }

        for s in SXM32_TABLE {
            assert_eq!(s.m0 & s.m1 & 1, 1, "{s:?}");
        }

        assert!(Mix32::with_lanes(Mix32::default().lanes).is_ok());
    }

    #[test]
    fn test_mix13_reference_value() {
        // splitmix64 output for state 0x9e3779b97f4a7c15 uses mix13
        assert_eq!(Mix64::MIX13.mix_u64(0x9e37_79b9_7f4a_7c15), 0xe220_a839_7b1d_cdaf);
    }

    #[test]
    fn test_even_multiplier_is_rejected() {
        assert_eq!(Mix64::new("x", 30, 2, 29, 3, 31), Err(Error::EvenMultiplier { lane: 0 }));

        let mut lanes = Mix32::default().lanes;
        lanes[4].m1 = 0x1000;
        assert_eq!(Mix32::with_lanes(lanes), Err(Error::EvenMultiplier { lane: 4 }));
    }

    #[test]
    fn test_mix32_lanes_differ() {
        let m = Mix32::default();
        let u = m.mix(Lanes::splat(0x0000_0001_0000_0001)).to_u32x8();

        assert_ne!(u[0], u[1]);
        assert_eq!(u[0], m.lane(0).mix_u32(1));
    }

    proptest! {
        #[test]
        fn prop_mix64_table_inverts(x in any::<u64>()) {
            for m in MIX64_TABLE {
                prop_assert_eq!(m.unmix_u64(m.mix_u64(x)), x, "{}", m.name);
            }
        }

        #[test]
        fn prop_sxm32_table_inverts(x in any::<u32>()) {
            for s in SXM32_TABLE {
                prop_assert_eq!(s.unmix_u32(s.mix_u32(x)), x);
            }
        }

        #[test]
        fn prop_mix32_inverts(x in any::<[u64; 4]>()) {
            let m = Mix32::default();
            prop_assert_eq!(m.unmix(m.mix(Lanes(x))), Lanes(x));
        }
    }
}
