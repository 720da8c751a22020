//! 64×64 matrices over GF(2).
//!
//! Every xorshift permutation is a linear map on the bits of a 64-bit word,
//! so stepping it `n` times is a single matrix power. This is how the
//! combined generator jumps its secondary state, and how the tests certify
//! the cycle structure of the permutations.

/// Prime factors of `2^64 - 1`.
pub const PERIOD_FACTORS: [u64; 7] = [3, 5, 17, 257, 641, 65537, 6700417];

/// Column-major 64×64 bit matrix: `cols[i]` is the image of `1 << i`.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct BitMatrix {
    cols: [u64; 64],
}

impl core::fmt::Debug for BitMatrix {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BitMatrix")
            .field("rank", &self.rank())
            .finish_non_exhaustive()
    }
}

impl Default for BitMatrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl BitMatrix {
    pub const IDENTITY: BitMatrix = {
        let mut cols = [0u64; 64];
        let mut i = 0;

        while i < 64 {
            cols[i] = 1 << i;
            i += 1;
        }

        BitMatrix { cols }
    };

    /// Matrix of a linear map given as a function, by probing each basis bit.
    pub fn from_linear(f: impl Fn(u64) -> u64) -> Self {
        Self {
            cols: core::array::from_fn(|i| f(1 << i)),
        }
    }

    #[inline]
    pub fn column(&self, i: usize) -> u64 {
        self.cols[i]
    }

    /// `M · x`
    #[inline]
    pub fn apply(&self, mut x: u64) -> u64 {
        let mut r = 0;

        while x != 0 {
            r ^= self.cols[x.trailing_zeros() as usize];
            x &= x - 1;
        }

        r
    }

    /// `self · rhs` (apply `rhs` first).
    pub fn mul(&self, rhs: &BitMatrix) -> BitMatrix {
        BitMatrix {
            cols: core::array::from_fn(|i| self.apply(rhs.cols[i])),
        }
    }

    /// `self^n` by square-and-multiply.
    pub fn pow(&self, mut n: u64) -> BitMatrix {
        let mut r = Self::IDENTITY;
        let mut b = *self;

        while n != 0 {
            if n & 1 == 1 {
                r = r.mul(&b);
            }

            b = b.mul(&b);
            n >>= 1;
        }

        r
    }

    /// Rank over GF(2) (Gaussian elimination on a copy of the columns).
    pub fn rank(&self) -> u32 {
        let mut cols = self.cols;
        let mut rank = 0;

        for bit in 0..64 {
            let pivot = 1u64 << bit;
            let Some(p) = (rank as usize..64).find(|&i| cols[i] & pivot != 0) else {
                continue;
            };

            cols.swap(rank as usize, p);

            let piv = cols[rank as usize];
            for c in cols.iter_mut().skip(rank as usize + 1) {
                if *c & pivot != 0 {
                    *c ^= piv;
                }
            }

            rank += 1;
        }

        rank
    }

    /// True when every nonzero vector lies on a single cycle of length
    /// `2^64 - 1`, i.e. `M^(2^64-1) = I` and `M^((2^64-1)/p) ≠ I` for every
    /// prime factor `p`.
    pub fn has_full_period(&self) -> bool {
        if self.pow(u64::MAX) != Self::IDENTITY {
            return false;
        }

        PERIOD_FACTORS
            .iter()
            .all(|&p| self.pow(u64::MAX / p) != Self::IDENTITY)
    }
}
