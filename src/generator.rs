//! # Generator Engines
//!
//! A [`Generator`] is a vector of 4 independent 64-bit lanes, each one the
//! composition of a full-period state update with a bijective mixer:
//!
//! ```md
//! out   = mix(state)
//! state = update(state, inc)
//! ```
//!
//! A [`Combined`] generator adds a secondary state driven by an xorshift
//! permutation and feeds the (wrapping) sum of both states through the mixer:
//!
//! ```md
//! out       = mix(state + secondary)
//! state     = update(state, inc)
//! secondary = permute(secondary)
//! ```
//!
//! The increments come from a [`StreamAllocator`], so two generators never
//! share a stream, and position `p` means "p blocks have been produced".

use crate::error::{Error, Result};
use crate::lanes::{LANES, LANES32, Lanes};
use crate::mix::{AesMix, Avalanche, Mix32, Mix64, Mixer};
use crate::stream::StreamAllocator;
use crate::update::{
    Lcg32, Lcg64, Permutation, StateUpdate, Weyl, Weyl128, XorShift2, XorShift3, permutation_steps,
};
use tracing::debug;

/// Uniform `f64` in `[0, 1)` from the top 52 bits of `x`.
#[inline(always)]
pub fn unit_f64(x: u64) -> f64 {
    f64::from_bits((x >> 12) | 0x3ff0_0000_0000_0000) - 1.0
}

/// Uniform `f32` in `[0, 1)` from the top 23 bits of `x`.
#[inline(always)]
pub fn unit_f32(x: u32) -> f32 {
    f32::from_bits((x >> 9) | 0x3f80_0000) - 1.0
}

/// Anything producing one 256-bit block per call.
pub trait LaneSource {
    fn next_lanes(&mut self) -> Lanes;

    #[inline(always)]
    fn next_u64x4(&mut self) -> [u64; LANES] {
        self.next_lanes().0
    }

    /// Eight 32-bit outputs, low half of each lane first.
    #[inline(always)]
    fn next_u32x8(&mut self) -> [u32; LANES32] {
        self.next_lanes().to_u32x8()
    }

    #[inline]
    fn next_f64x4(&mut self) -> [f64; LANES] {
        self.next_lanes().0.map(unit_f64)
    }

    #[inline]
    fn next_f32x8(&mut self) -> [f32; LANES32] {
        self.next_lanes().to_u32x8().map(unit_f32)
    }

    fn fill_lanes(&mut self, buf: &mut [Lanes]) {
        for slot in buf {
            *slot = self.next_lanes();
        }
    }

    /// Fills `buf` in block order. A partial last block is truncated, its
    /// remaining words are dropped.
    fn fill_u64(&mut self, buf: &mut [u64]) {
        for chunk in buf.chunks_mut(LANES) {
            let block = self.next_u64x4();
            chunk.copy_from_slice(&block[..chunk.len()]);
        }
    }

    fn fill_u32(&mut self, buf: &mut [u32]) {
        for chunk in buf.chunks_mut(LANES32) {
            let block = self.next_u32x8();
            chunk.copy_from_slice(&block[..chunk.len()]);
        }
    }

    fn fill_f64(&mut self, buf: &mut [f64]) {
        for chunk in buf.chunks_mut(LANES) {
            let block = self.next_f64x4();
            chunk.copy_from_slice(&block[..chunk.len()]);
        }
    }

    fn fill_f32(&mut self, buf: &mut [f32]) {
        for chunk in buf.chunks_mut(LANES32) {
            let block = self.next_f32x8();
            chunk.copy_from_slice(&block[..chunk.len()]);
        }
    }
}

/// Plain snapshot of a generator's state, enough to rebuild it given the same
/// update and mixer strategies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RawState {
    pub state: [u64; LANES],
    pub increment: [u64; LANES],
    pub secondary: Option<[u64; LANES]>,
}

/// Update-then-mix vector generator.
#[derive(Clone, Debug)]
pub struct Generator<U: StateUpdate = Weyl, M: Mixer = Avalanche> {
    state: Lanes,
    inc: Lanes,
    update: U,
    mixer: M,
}

impl<U: StateUpdate + Default, M: Mixer + Default> Default for Generator<U, M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<U: StateUpdate + Default, M: Mixer + Default> Generator<U, M> {
    /// Fresh stream from the process-wide allocator.
    pub fn new() -> Self {
        Self::with_streams(StreamAllocator::global())
    }

    /// Fresh stream from a caller owned allocator.
    pub fn with_streams(alloc: &StreamAllocator) -> Self {
        Self::with_strategies(alloc, U::default(), M::default())
    }
}

impl<U: StateUpdate, M: Mixer> Generator<U, M> {
    pub fn with_strategies(alloc: &StreamAllocator, update: U, mixer: M) -> Self {
        let inc = update.increments(alloc);
        let state = update.origin(inc);

        let g = Self {
            state,
            inc,
            update,
            mixer,
        };

        debug!(
            stream = g.stream_id(),
            update = U::NAME,
            mixer = g.mixer.name(),
            "generator constructed"
        );

        g
    }

    /// Rebuilds a generator from raw lanes. The increment is validated
    /// against the update strategy, the state is taken as is.
    pub fn from_parts(state: Lanes, inc: Lanes, update: U, mixer: M) -> Result<Self> {
        update.check_increment(inc)?;

        Ok(Self {
            state,
            inc,
            update,
            mixer,
        })
    }

    /// Inverse of [`Generator::raw`]; any secondary lanes are ignored.
    pub fn from_raw(raw: RawState, update: U, mixer: M) -> Result<Self> {
        Self::from_parts(Lanes(raw.state), Lanes(raw.increment), update, mixer)
    }

    pub fn raw(&self) -> RawState {
        RawState {
            state: self.state.0,
            increment: self.inc.0,
            secondary: None,
        }
    }

    #[inline]
    pub fn state(&self) -> Lanes {
        self.state
    }

    #[inline]
    pub fn increment(&self) -> Lanes {
        self.inc
    }

    #[inline]
    pub fn update(&self) -> &U {
        &self.update
    }

    #[inline]
    pub fn mixer(&self) -> &M {
        &self.mixer
    }

    /// Stream number this generator was allocated, recovered from lane 0.
    pub fn stream_id(&self) -> u64 {
        self.update.stream_id(self.inc)
    }

    /// Blocks produced since position zero, modulo the update period.
    pub fn position(&self) -> u64 {
        self.update.distance(self.update.origin(self.inc), self.state, self.inc)
    }

    pub fn set_position(&mut self, n: u64) {
        self.state = self.update.jump(self.update.origin(self.inc), self.inc, n);
    }

    /// Skips `n` blocks.
    pub fn advance(&mut self, n: u64) {
        self.state = self.update.jump(self.state, self.inc, n);
    }

    /// Steps back `n` blocks, so the next block is the one produced `n`
    /// blocks ago.
    pub fn rewind(&mut self, n: u64) {
        self.state = self.update.jump_back(self.state, self.inc, n);
    }
}

impl<U: StateUpdate, M: Mixer> LaneSource for Generator<U, M> {
    #[inline(always)]
    fn next_lanes(&mut self) -> Lanes {
        let out = self.mixer.mix(self.state);
        self.state = self.update.step(self.state, self.inc);

        out
    }
}

/// Generator with an additional xorshift-driven secondary state.
///
/// The primary update has period 2^64 and the secondary period 2^64 - 1, so
/// the sum has period (2^64)(2^64 - 1) per lane.
#[derive(Clone, Debug)]
pub struct Combined<U: StateUpdate = Weyl, P: Permutation = XorShift2, M: Mixer = Avalanche> {
    base: Generator<U, M>,
    secondary: Lanes,
    // secondary at position zero
    origin: Lanes,
    perm: P,
}

impl<U, P, M> Default for Combined<U, P, M>
where
    U: StateUpdate + Default,
    P: Permutation,
    M: Mixer + Default,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<U, P, M> Combined<U, P, M>
where
    U: StateUpdate + Default,
    P: Permutation,
    M: Mixer + Default,
{
    pub fn new() -> Self {
        Self::with_streams(StreamAllocator::global())
    }

    pub fn with_streams(alloc: &StreamAllocator) -> Self {
        Self::with_strategies(alloc, U::default(), P::default(), M::default())
    }
}

impl<U: StateUpdate, P: Permutation, M: Mixer> Combined<U, P, M> {
    pub fn with_strategies(alloc: &StreamAllocator, update: U, perm: P, mixer: M) -> Self {
        let base = Generator::with_strategies(alloc, update, mixer);

        debug!(stream = base.stream_id(), permutation = P::NAME, "secondary attached");

        Self {
            base,
            secondary: P::SEEDS,
            origin: P::SEEDS,
            perm,
        }
    }

    /// Rebuilds a combined generator from raw lanes. `secondary` is the
    /// secondary state at the primary's current position; its position zero
    /// is recovered by stepping back `position()` steps.
    pub fn from_parts(state: Lanes, inc: Lanes, secondary: Lanes, update: U, perm: P, mixer: M) -> Result<Self> {
        if let Some(lane) = secondary.first_zero() {
            return Err(Error::ZeroSecondary { lane });
        }

        let base = Generator::from_parts(state, inc, update, mixer)?;
        let origin = perm.jump(secondary, permutation_steps(-(base.position() as i128)));

        Ok(Self {
            base,
            secondary,
            origin,
            perm,
        })
    }

    pub fn from_raw(raw: RawState, update: U, perm: P, mixer: M) -> Result<Self> {
        let secondary = raw.secondary.ok_or(Error::MissingSecondary)?;
        Self::from_parts(Lanes(raw.state), Lanes(raw.increment), Lanes(secondary), update, perm, mixer)
    }

    pub fn raw(&self) -> RawState {
        RawState {
            secondary: Some(self.secondary.0),
            ..self.base.raw()
        }
    }

    /// Replaces the secondary start, i.e. the secondary lanes at position
    /// zero. Zero is a fixed point of the permutation and is rejected.
    pub fn with_secondary(mut self, origin: Lanes) -> Result<Self> {
        if let Some(lane) = origin.first_zero() {
            return Err(Error::ZeroSecondary { lane });
        }

        self.reseat(origin);
        Ok(self)
    }

    /// Low entropy secondary start, for statistical testing only.
    pub fn hobbled(mut self) -> Self {
        self.reseat(P::HOBBLED);
        self
    }

    fn reseat(&mut self, origin: Lanes) {
        self.origin = origin;
        self.secondary = self.perm.jump(origin, permutation_steps(self.base.position() as i128));
    }

    #[inline]
    pub fn base(&self) -> &Generator<U, M> {
        &self.base
    }

    #[inline]
    pub fn secondary(&self) -> Lanes {
        self.secondary
    }

    /// Secondary lanes at position zero.
    #[inline]
    pub fn secondary_origin(&self) -> Lanes {
        self.origin
    }

    pub fn stream_id(&self) -> u64 {
        self.base.stream_id()
    }

    /// Position of the primary state. The secondary moves in lockstep.
    pub fn position(&self) -> u64 {
        self.base.position()
    }

    /// Same state as `n` blocks from position zero, whatever the current
    /// position.
    pub fn set_position(&mut self, n: u64) {
        self.secondary = self.perm.jump(self.origin, permutation_steps(n as i128));
        self.base.set_position(n);
    }

    pub fn advance(&mut self, n: u64) {
        self.shift_secondary(n as i128);
        self.base.advance(n);
    }

    pub fn rewind(&mut self, n: u64) {
        self.shift_secondary(-(n as i128));
        self.base.rewind(n);
    }

    fn shift_secondary(&mut self, delta: i128) {
        let steps = permutation_steps(delta);

        if steps != 0 {
            self.secondary = self.perm.jump(self.secondary, steps);
        }
    }
}

impl<U: StateUpdate, P: Permutation, M: Mixer> LaneSource for Combined<U, P, M> {
    #[inline(always)]
    fn next_lanes(&mut self) -> Lanes {
        let out = self.base.mixer.mix(self.base.state + self.secondary);

        self.base.state = self.base.update.step(self.base.state, self.base.inc);
        self.secondary = self.perm.permute(self.secondary);

        out
    }
}

/// Weyl sequence through the vector avalanche finalizer.
pub type Vprng = Generator<Weyl, Avalanche>;

/// [`Vprng`] plus a 2-term xorshift secondary.
pub type Cvprng = Combined<Weyl, XorShift2, Avalanche>;

/// [`Vprng`] plus a 3-term xorshift secondary.
pub type Cvprng3 = Combined<Weyl, XorShift3, Avalanche>;

/// SplitMix-style: Weyl sequence through a 64-bit mix function.
pub type VSplitMix = Generator<Weyl, Mix64>;

/// PCG-style: 64-bit LCG through a 64-bit mix function.
pub type Vpcg = Generator<Lcg64, Mix64>;

/// [`Vpcg`] plus a 2-term xorshift secondary.
pub type Cvpcg = Combined<Lcg64, XorShift2, Mix64>;

/// Eight 32-bit LCG lanes through per-lane 32-bit mixers.
pub type Vpcg32 = Generator<Lcg32, Mix32>;

/// 128-bit Weyl sequence through AES rounds (avalanche fallback without
/// AES instructions).
pub type VprngAes = Generator<Weyl128, AesMix>;
