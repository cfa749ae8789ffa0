//! Random source for flake generation.
//!
//! Every random attribute in the crate is drawn through a [`SpawnContext`], so
//! one seed reproduces a whole animation and independent lanes can be given
//! independent streams.

use crate::config::ValueRange;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Seeded random stream with helpers for the sampling patterns flakes use.
///
/// ```ignore
/// let mut ctx = SpawnContext::new(None, 0);
/// let speed = ctx.random_in(ValueRange::new(0.9, 1.3));
/// let color = ctx.random_index(palette.len());
/// ```
#[derive(Debug, Clone)]
pub struct SpawnContext {
    rng: SmallRng,
}

impl SpawnContext {
    /// Create a stream from an explicit seed, or from the clock when `None`.
    ///
    /// `salt` separates streams that would otherwise share a seed (for
    /// example the two lanes of continuous mode).
    pub fn new(seed: Option<u64>, salt: u64) -> Self {
        let base = seed.unwrap_or_else(|| {
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_nanos() as u64)
                .unwrap_or(42)
        });
        Self::from_seed(base ^ salt.wrapping_mul(0x9E37_79B9_7F4A_7C15))
    }

    /// Deterministic stream.
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// Random f32 between 0.0 and 1.0.
    #[inline]
    pub fn random(&mut self) -> f32 {
        self.rng.gen()
    }

    /// Uniform value between `min` and `max`.
    ///
    /// Equal bounds return `min` without consuming randomness. Reversed
    /// bounds are sampled as given rather than rejected.
    #[inline]
    pub fn random_range(&mut self, min: f32, max: f32) -> f32 {
        if min == max {
            return min;
        }
        self.random() * (max - min) + min
    }

    #[inline]
    pub fn random_in(&mut self, range: ValueRange) -> f32 {
        self.random_range(range.min, range.max)
    }

    #[inline]
    pub fn random_bool(&mut self) -> bool {
        self.rng.gen_bool(0.5)
    }

    /// Uniform index in `[0, len)`; `0` when `len` is zero.
    #[inline]
    pub fn random_index(&mut self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        self.rng.gen_range(0..len)
    }

    /// `N` independent values in `[min, max]`.
    pub fn random_array<const N: usize>(&mut self, min: f32, max: f32) -> [f32; N] {
        std::array::from_fn(|_| self.random_range(min, max))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equal_bounds_are_deterministic() {
        let mut ctx = SpawnContext::from_seed(1);
        for _ in 0..10 {
            assert_eq!(ctx.random_range(3.5, 3.5), 3.5);
        }
    }

    #[test]
    fn test_range_bounds() {
        let mut ctx = SpawnContext::from_seed(7);
        for _ in 0..1000 {
            let v = ctx.random_range(-20.0, 20.0);
            assert!((-20.0..=20.0).contains(&v));
        }
    }

    #[test]
    fn test_index_bounds() {
        let mut ctx = SpawnContext::from_seed(7);
        assert_eq!(ctx.random_index(0), 0);
        for _ in 0..1000 {
            assert!(ctx.random_index(10) < 10);
        }
    }

    #[test]
    fn test_same_seed_same_stream() {
        let mut a = SpawnContext::from_seed(99);
        let mut b = SpawnContext::from_seed(99);
        let xs: [f32; 5] = a.random_array(-5.0, 5.0);
        let ys: [f32; 5] = b.random_array(-5.0, 5.0);
        assert_eq!(xs, ys);
    }

    #[test]
    fn test_salt_separates_streams() {
        let mut a = SpawnContext::new(Some(5), 1);
        let mut b = SpawnContext::new(Some(5), 2);
        let xs: [f32; 8] = a.random_array(0.0, 1.0);
        let ys: [f32; 8] = b.random_array(0.0, 1.0);
        assert_ne!(xs, ys);
    }
}
