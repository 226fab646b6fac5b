//! Seeded pseudo-random sequence for stippling passes.
//!
//! A pass owns its generator, so two passes with the same seed and inputs
//! consume identical sequences in raster order.

/// 64-bit linear congruential generator yielding 31-bit values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StippleRng {
    state: u64,
}

impl StippleRng {
    const MULTIPLIER: u64 = 6364136223846793005;
    const INCREMENT: u64 = 1442695040888963407;

    pub const fn new(seed: u32) -> Self {
        StippleRng { state: seed as u64 }
    }

    /// Restart the sequence from `seed`.
    pub const fn reseed(&mut self, seed: u32) {
        self.state = seed as u64;
    }

    /// Next value in `0..2^31`.
    #[allow(clippy::should_implement_trait)]
    pub const fn next(&mut self) -> u32 {
        self.state = self
            .state
            .wrapping_mul(Self::MULTIPLIER)
            .wrapping_add(Self::INCREMENT);
        (self.state >> 33) as u32
    }

    /// Next value reduced modulo `n`. Always consumes one value; yields 0
    /// when `n` is 0.
    pub const fn below(&mut self, n: u32) -> u32 {
        let value = self.next();
        if n == 0 { 0 } else { value % n }
    }
}
