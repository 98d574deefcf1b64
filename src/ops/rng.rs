// ============================================================================
// SEEDED PRNG — Mulberry32 stream with explicit state
// ============================================================================
//
// Every random value used by a render comes from one of these streams. The
// state is a plain `u32` owned by the caller, so two renders never share it.

/// Additive constant applied to the state before every draw.
pub const MULBERRY_INCREMENT: u32 = 0x6D2B_79F5;

const TWO_POW_32: f64 = 4_294_967_296.0;

/// Advance `state` once.  Returns the value in `[0, 1)` and the next state.
#[inline]
pub fn step(state: u32) -> (f64, u32) {
    let next = state.wrapping_add(MULBERRY_INCREMENT);
    let mut t = next;
    t = (t ^ (t >> 15)).wrapping_mul(t | 1);
    t ^= t.wrapping_add((t ^ (t >> 7)).wrapping_mul(t | 61));
    let out = t ^ (t >> 14);
    (out as f64 / TWO_POW_32, next)
}

/// Deterministic generator.  Same seed + same call sequence = same values.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mulberry32 {
    state: u32,
}

impl Mulberry32 {
    /// Signed seeds are reinterpreted bit-for-bit as the 32-bit state.
    pub fn new(seed: i32) -> Self {
        Self { state: seed as u32 }
    }

    pub fn state(&self) -> u32 {
        self.state
    }

    /// Next value in `[0, 1)`.
    #[inline]
    pub fn next_f64(&mut self) -> f64 {
        let (value, next) = step(self.state);
        self.state = next;
        value
    }

    /// Next value scaled to a channel byte: `floor(rng() * 255)`.
    #[inline]
    pub fn next_byte(&mut self) -> u8 {
        (self.next_f64() * 255.0).floor() as u8
    }
}
