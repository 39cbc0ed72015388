//! Seeded random source used to initialise attractors and orbiters.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Deterministic uniform float generator.
///
/// The same seed always yields the same sequence, so a scene built twice
/// from one seed starts from identical state.
#[derive(Debug, Clone)]
pub struct RandomSource {
    rng: StdRng,
}

impl RandomSource {
    /// Create a source from a seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Uniform value in `[0, 1)`.
    #[inline]
    pub fn unit(&mut self) -> f32 {
        self.rng.gen::<f32>()
    }

    /// Uniform value between `a` and `b`.
    ///
    /// `a == b` is allowed and returns `a`.
    #[inline]
    pub fn range(&mut self, a: f32, b: f32) -> f32 {
        a + (b - a) * self.unit()
    }
}
