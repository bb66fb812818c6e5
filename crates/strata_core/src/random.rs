//! # Deterministic Random Engine
//!
//! Seeded ChaCha8 stream used for reproducible shuffles and picks.
//! Same seed = same sequence, ALWAYS. Not for anything security related.

use rand::{Error, Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// A seeded pseudo-random engine that can be rewound to its seed.
///
/// Implements [`RngCore`], so it can drive
/// [`Sequence::shuffle`](crate::Sequence::shuffle) directly.
#[derive(Clone, Debug)]
pub struct RandomEngine {
    seed: u64,
    rng: ChaCha8Rng,
    invocations: u64,
}

impl RandomEngine {
    /// Creates an engine at the start of `seed`'s stream.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: ChaCha8Rng::seed_from_u64(seed),
            invocations: 0,
        }
    }

    /// The seed this engine restarts from.
    #[inline]
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Number of raw draws since the last reset.
    #[inline]
    #[must_use]
    pub const fn invocations(&self) -> u64 {
        self.invocations
    }

    /// Rewinds to the beginning of the current seed's stream.
    pub fn reset(&mut self) {
        self.rng = ChaCha8Rng::seed_from_u64(self.seed);
        self.invocations = 0;
    }

    /// Switches to `seed` and rewinds.
    pub fn set_seed(&mut self, seed: u64) {
        tracing::debug!(seed, "random engine reseeded");
        self.seed = seed;
        self.reset();
    }

    /// Uniform integer in `[min, max)`.
    ///
    /// # Panics
    ///
    /// Panics if `max <= min`.
    pub fn range_i32(&mut self, min: i32, max: i32) -> i32 {
        assert!(max > min, "Empty range {min}..{max}");
        self.gen_range(min..max)
    }

    /// Uniform float in `[min, max)`.
    pub fn range_f32(&mut self, min: f32, max: f32) -> f32 {
        let unit: f32 = self.gen();
        min + unit * (max - min)
    }

    /// Picks an index with probability proportional to `weights[index]`.
    ///
    /// # Returns
    ///
    /// `None` if the weights are empty or do not sum to a positive value.
    pub fn weighted_index(&mut self, weights: &[f32]) -> Option<usize> {
        let total: f32 = weights.iter().sum();
        if total.is_nan() || total <= 0.0 {
            return None;
        }

        let target = self.range_f32(0.0, total);
        let mut running = 0.0;
        for (index, &weight) in weights.iter().enumerate() {
            running += weight;
            if running > target {
                return Some(index);
            }
        }
        // Rounding left the target past the last partial sum.
        weights.iter().rposition(|&w| w > 0.0)
    }
}

impl RngCore for RandomEngine {
    fn next_u32(&mut self) -> u32 {
        self.invocations += 1;
        self.rng.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.invocations += 1;
        self.rng.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.invocations += 1;
        self.rng.fill_bytes(dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), Error> {
        self.invocations += 1;
        self.rng.try_fill_bytes(dest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_stream() {
        let mut a = RandomEngine::new(42);
        let mut b = RandomEngine::new(42);
        for _ in 0..100 {
            assert_eq!(a.range_i32(0, 1000), b.range_i32(0, 1000));
        }
    }

    #[test]
    fn test_reset_rewinds() {
        let mut engine = RandomEngine::new(7);
        let first: Vec<i32> = (0..10).map(|_| engine.range_i32(-5, 5)).collect();
        assert!(engine.invocations() > 0);

        engine.reset();
        assert_eq!(engine.invocations(), 0);
        let again: Vec<i32> = (0..10).map(|_| engine.range_i32(-5, 5)).collect();
        assert_eq!(first, again);
    }

    #[test]
    fn test_range_f32_bounds() {
        let mut engine = RandomEngine::new(1);
        for _ in 0..1000 {
            let v = engine.range_f32(-2.0, 3.0);
            assert!((-2.0..3.0).contains(&v));
        }
    }

    #[test]
    fn test_weighted_index_skips_zero_weights() {
        let mut engine = RandomEngine::new(9);
        for _ in 0..500 {
            let picked = engine.weighted_index(&[0.0, 1.0, 0.0, 3.0]).unwrap();
            assert!(picked == 1 || picked == 3);
        }
        assert_eq!(engine.weighted_index(&[]), None);
        assert_eq!(engine.weighted_index(&[0.0, 0.0]), None);
    }
}
