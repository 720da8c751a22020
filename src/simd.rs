/// Instruction set used for the avalanche kernel.
#[derive(Debug, Eq, PartialEq, Clone, Copy, Hash)]
#[allow(unused)]
pub enum Isa {
    /// One 256-bit register per avalanche block.
    Avx2,

    /// Two 128-bit halves per block; every x86_64 target has it.
    Sse2,

    /// Two 128-bit halves per block on aarch64.
    Neon,

    /// Per-lane `u64` arithmetic, also the reference for `unmix`.
    Portable,
}

impl Isa {
    /// Best kernel for the running CPU.
    pub fn detect() -> Isa {
        // NOTE: AES round support is a separate flag, see `has_aes`; the
        // avalanche kernel only needs the integer vector unit
        #[cfg(target_arch = "x86_64")]
        {
            if std::is_x86_feature_detected!("avx2") {
                return Isa::Avx2;
            }

            Isa::Sse2
        }

        #[cfg(target_arch = "aarch64")]
        {
            Isa::Neon
        }

        #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
        {
            Isa::Portable
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Isa::Avx2 => "avx2",
            Isa::Sse2 => "sse2",
            Isa::Neon => "neon",
            Isa::Portable => "portable",
        }
    }
}

/// True when the CPU has AES round instructions (`aesenc` / `aese`+`aesmc`).
pub fn has_aes() -> bool {
    #[cfg(target_arch = "x86_64")]
    {
        std::is_x86_feature_detected!("aes")
    }

    #[cfg(target_arch = "aarch64")]
    {
        std::arch::is_aarch64_feature_detected!("aes")
    }

    #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
    {
        false
    }
}
