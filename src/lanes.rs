use core::ops::{Add, BitXor, BitXorAssign, Index, IndexMut, Shl, Shr};

/// Number of 64-bit lanes in a vector.
pub const LANES: usize = 4;

/// Number of 32-bit lanes in a vector.
pub const LANES32: usize = 8;

/// 256-bit lane vector: four independent 64-bit lanes, or eight 32-bit lanes
/// through [`Lanes::to_u32x8`] / [`Lanes::from_u32x8`].
///
/// Every operation here is applied per lane with no cross-lane data flow.
/// The loops are written so the compiler can keep them in vector registers;
/// the hand written kernels in `engine` only exist for the hot mixer.
///
/// ## Layout
///
/// ```md
/// ┌─────────┬─────────┬─────────┬─────────┐
/// │   t3    │   t2    │   t1    │   t0    │  u64 lanes
/// ├────┬────┼────┬────┼────┬────┼────┬────┤
/// │ u7 │ u6 │ u5 │ u4 │ u3 │ u2 │ u1 │ u0 │  u32 lanes
/// └────┴────┴────┴────┴────┴────┴────┴────┘
/// ```
///
/// `u[2i]` is the low half of `t[i]` and `u[2i + 1]` the high half, which is
/// the little-endian memory order the SIMD backends load.
#[repr(C, align(32))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Lanes(pub [u64; LANES]);

impl Lanes {
    pub const ZERO: Lanes = Lanes([0; LANES]);

    #[inline(always)]
    pub const fn new(v: [u64; LANES]) -> Self {
        Self(v)
    }

    #[inline(always)]
    pub const fn splat(x: u64) -> Self {
        Self([x; LANES])
    }

    /// Packs eight 32-bit lanes, `u[0]` landing in the low half of lane 0.
    #[inline(always)]
    pub const fn from_u32x8(u: [u32; LANES32]) -> Self {
        let mut v = [0u64; LANES];
        let mut i = 0;

        while i < LANES {
            v[i] = (u[2 * i] as u64) | ((u[2 * i + 1] as u64) << 32);
            i += 1;
        }

        Self(v)
    }

    #[inline(always)]
    pub const fn to_u32x8(self) -> [u32; LANES32] {
        let mut u = [0u32; LANES32];
        let mut i = 0;

        while i < LANES {
            u[2 * i] = self.0[i] as u32;
            u[2 * i + 1] = (self.0[i] >> 32) as u32;
            i += 1;
        }

        u
    }

    #[inline(always)]
    pub fn map(self, f: impl Fn(u64) -> u64) -> Self {
        Self(core::array::from_fn(|i| f(self.0[i])))
    }

    #[inline(always)]
    pub fn zip(self, rhs: Self, f: impl Fn(u64, u64) -> u64) -> Self {
        Self(core::array::from_fn(|i| f(self.0[i], rhs.0[i])))
    }

    #[inline(always)]
    pub fn map32(self, f: impl Fn(u32) -> u32) -> Self {
        let u = self.to_u32x8();
        Self::from_u32x8(core::array::from_fn(|i| f(u[i])))
    }

    #[inline(always)]
    pub fn zip32(self, rhs: Self, f: impl Fn(u32, u32) -> u32) -> Self {
        let a = self.to_u32x8();
        let b = rhs.to_u32x8();

        Self::from_u32x8(core::array::from_fn(|i| f(a[i], b[i])))
    }

    #[inline(always)]
    pub fn wrapping_add(self, rhs: Self) -> Self {
        self.zip(rhs, u64::wrapping_add)
    }

    #[inline(always)]
    pub fn wrapping_sub(self, rhs: Self) -> Self {
        self.zip(rhs, u64::wrapping_sub)
    }

    #[inline(always)]
    pub fn wrapping_mul(self, rhs: Self) -> Self {
        self.zip(rhs, u64::wrapping_mul)
    }

    /// Per 32-bit lane product keeping the low 32 bits.
    #[inline(always)]
    pub fn mul_lo32(self, rhs: Self) -> Self {
        self.zip(rhs, |a, b| {
            let lo = (a as u32).wrapping_mul(b as u32) as u64;
            let hi = ((a >> 32) as u32).wrapping_mul((b >> 32) as u32) as u64;

            lo | (hi << 32)
        })
    }

    /// Index of the first 64-bit lane that is even, if any.
    #[inline]
    pub fn first_even(self) -> Option<usize> {
        self.0.iter().position(|&x| x & 1 == 0)
    }

    /// Index of the first 32-bit lane that is even, if any.
    #[inline]
    pub fn first_even32(self) -> Option<usize> {
        self.to_u32x8().iter().position(|&x| x & 1 == 0)
    }

    /// Index of the first zero 64-bit lane, if any.
    #[inline]
    pub fn first_zero(self) -> Option<usize> {
        self.0.iter().position(|&x| x == 0)
    }
}

impl From<[u64; LANES]> for Lanes {
    #[inline(always)]
    fn from(v: [u64; LANES]) -> Self {
        Self(v)
    }
}

impl From<Lanes> for [u64; LANES] {
    #[inline(always)]
    fn from(v: Lanes) -> Self {
        v.0
    }
}

impl From<[u32; LANES32]> for Lanes {
    #[inline(always)]
    fn from(u: [u32; LANES32]) -> Self {
        Self::from_u32x8(u)
    }
}

impl From<Lanes> for [u32; LANES32] {
    #[inline(always)]
    fn from(v: Lanes) -> Self {
        v.to_u32x8()
    }
}

impl Index<usize> for Lanes {
    type Output = u64;

    #[inline(always)]
    fn index(&self, i: usize) -> &u64 {
        &self.0[i]
    }
}

impl IndexMut<usize> for Lanes {
    #[inline(always)]
    fn index_mut(&mut self, i: usize) -> &mut u64 {
        &mut self.0[i]
    }
}

impl Add for Lanes {
    type Output = Lanes;

    #[inline(always)]
    fn add(self, rhs: Lanes) -> Lanes {
        self.wrapping_add(rhs)
    }
}

impl BitXor for Lanes {
    type Output = Lanes;

    #[inline(always)]
    fn bitxor(self, rhs: Lanes) -> Lanes {
        self.zip(rhs, |a, b| a ^ b)
    }
}

impl BitXorAssign for Lanes {
    #[inline(always)]
    fn bitxor_assign(&mut self, rhs: Lanes) {
        *self = *self ^ rhs;
    }
}

impl Shl<u32> for Lanes {
    type Output = Lanes;

    #[inline(always)]
    fn shl(self, n: u32) -> Lanes {
        self.map(|x| x << n)
    }
}

impl Shr<u32> for Lanes {
    type Output = Lanes;

    #[inline(always)]
    fn shr(self, n: u32) -> Lanes {
        self.map(|x| x >> n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_u32_view_round_trips_in_order() {
        let u: [u32; 8] = [0, 1, 2, 3, 4, 5, 6, 7];
        let v = Lanes::from_u32x8(u);

        assert_eq!(v[0], 1u64 << 32);
        assert_eq!(v[3], (7u64 << 32) | 6);
        assert_eq!(v.to_u32x8(), u);
    }

    #[test]
    fn test_u32_view_puts_low_half_first() {
        let v = Lanes::new([0x1111_2222_3333_4444, 0x5555_6666_7777_8888, 1, u64::MAX]);
        let halves = v.to_u32x8();

        assert_eq!(halves[..4], [0x3333_4444, 0x1111_2222, 0x7777_8888, 0x5555_6666]);
        assert_eq!(halves[4..], [1, 0, u32::MAX, u32::MAX]);
        assert_eq!(Lanes::from_u32x8(halves), v);
    }

    #[test]
    fn test_mul_lo32_does_not_carry_across_halves() {
        let a = Lanes::splat(0xffff_ffff_ffff_ffff);
        let b = Lanes::splat(0x0000_0003_0000_0003);

        // -1 * 3 in each 32-bit half
        assert_eq!(a.mul_lo32(b), Lanes::splat(0xffff_fffd_ffff_fffd));
    }

    #[test]
    fn test_shifts_and_xor_are_per_lane() {
        let v = Lanes::new([1, 2, 4, 1 << 63]);

        assert_eq!(v << 1, Lanes::new([2, 4, 8, 0]));
        assert_eq!(v >> 1, Lanes::new([0, 1, 2, 1 << 62]));
        assert_eq!(v ^ v, Lanes::ZERO);
    }

    #[test]
    fn test_first_even_and_first_zero() {
        assert_eq!(Lanes::new([1, 3, 4, 5]).first_even(), Some(2));
        assert_eq!(Lanes::new([1, 3, 5, 7]).first_even(), None);
        assert_eq!(Lanes::from_u32x8([1, 1, 1, 2, 1, 1, 1, 1]).first_even32(), Some(3));
        assert_eq!(Lanes::new([9, 0, 0, 1]).first_zero(), Some(1));
    }

    #[test]
    fn test_alignment_is_one_ymm_register() {
        assert_eq!(core::mem::align_of::<Lanes>(), 32);
        assert_eq!(core::mem::size_of::<Lanes>(), 32);
    }
}
