/// Construction-time precondition violations.
///
/// None of these can happen at runtime once a generator exists; they are
/// only reachable through the `from_parts`/`with_*` constructors that take
/// caller supplied raw values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Weyl and LCG state updates need odd increments for a full period.
    #[error("increment in lane {lane} is even (full period needs odd increments)")]
    EvenIncrement { lane: usize },

    /// Multiplicative constant is even, so the step is not invertible.
    #[error("multiplier in lane {lane} is even")]
    EvenMultiplier { lane: usize },

    /// Even half-lane in one of the two avalanche multiplier tables.
    #[error("avalanche multiplier {table} is even in half-lane {lane}")]
    EvenAvalancheMultiplier { table: &'static str, lane: usize },

    /// LCG multipliers must end in binary `101` to avoid block structure.
    #[error("LCG multiplier in lane {lane} does not end in binary 101")]
    MultiplierLowBits { lane: usize },

    /// Multiplier bit pattern is too sparse or too regular (popcount outside
    /// the allocator window or too few runs of ones).
    #[error("LCG multiplier in lane {lane} has a weak bit pattern")]
    WeakMultiplier { lane: usize },

    /// Zero is a fixed point of every xorshift permutation.
    #[error("secondary state in lane {lane} is zero")]
    ZeroSecondary { lane: usize },

    /// A combined generator was rebuilt from a raw state without secondary lanes.
    #[error("raw state has no secondary lanes")]
    MissingSecondary,
}

pub type Result<T> = std::result::Result<T, Error>;
