//! Seeded LCG randomness for deterministic training.
//!
//! Candidate training must be reproducible across retries and process
//! restarts, so everything that needs randomness (shuffles, bootstrap
//! sampling, random thresholds) goes through this small generator instead of
//! an OS-seeded RNG.

/// Linear congruential generator with a fixed multiplier.
#[derive(Debug, Clone)]
pub struct Lcg {
    state: u64,
}

impl Lcg {
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self {
            state: seed.wrapping_add(12345),
        }
    }

    fn next(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1);
        self.state >> 33
    }

    /// Uniform value in `[0, bound)`. `bound` must be non-zero.
    pub fn next_below(&mut self, bound: usize) -> usize {
        (self.next() as usize) % bound.max(1)
    }

    /// Uniform value in `[0, 1)`.
    pub fn next_f32(&mut self) -> f32 {
        (self.next() % 1_000_000) as f32 / 1_000_000.0
    }

    /// Fisher-Yates shuffle.
    pub fn shuffle(&mut self, indices: &mut [usize]) {
        for i in (1..indices.len()).rev() {
            let j = self.next_below(i + 1);
            indices.swap(i, j);
        }
    }
}
