//! Size variant tables.
//!
//! Flakes pick one of a small number of pre-sized tiles instead of getting a
//! unique size each, which keeps the atlas bounded no matter how many flakes
//! are animated.

use crate::config::{FlakeSize, ValueRange};
use crate::spawn::SpawnContext;

/// Steps per axis for size tables.
pub const SIZE_STEPS: usize = 10;

/// One tile size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizeVariant {
    pub width: f32,
    pub height: f32,
    /// Corner radius; only used by rounded-rect tiles.
    pub radius: f32,
}

/// Default corner radius range for a base flake size.
pub fn default_radius_range(flake: FlakeSize) -> ValueRange {
    ValueRange::new(0.0, flake.width.max(flake.height) / 2.0)
}

/// `steps × steps` width/height combinations for the fall variant.
///
/// Multipliers follow `1 - variation * (i / (steps - 1))²`, so most tiles
/// stay near full size and a tail reaches down to `1 - variation`.
pub fn fall_size_table(
    flake: FlakeSize,
    variation: f32,
    radius_range: ValueRange,
    steps: usize,
    ctx: &mut SpawnContext,
) -> Vec<SizeVariant> {
    let mut table = Vec::with_capacity(steps * steps);
    for i in 0..steps {
        for j in 0..steps {
            let width_scale = -step_fraction(i, steps).powi(2);
            let height_scale = -step_fraction(j, steps).powi(2);
            table.push(SizeVariant {
                width: flake.width * (1.0 + variation * width_scale),
                height: flake.height * (1.0 + variation * height_scale),
                radius: ctx.random_in(radius_range),
            });
        }
    }
    table
}

/// `steps` uniformly scaled sizes for the radial variant, from
/// `1 - variation` to `1 + variation`.
pub fn blast_size_table(flake: FlakeSize, variation: f32, radius: f32, steps: usize) -> Vec<SizeVariant> {
    (0..steps)
        .map(|i| {
            let scale = -1.0 + 2.0 * step_fraction(i, steps);
            let multiplier = 1.0 + variation * scale;
            SizeVariant {
                width: flake.width * multiplier,
                height: flake.height * multiplier,
                radius,
            }
        })
        .collect()
}

fn step_fraction(i: usize, steps: usize) -> f32 {
    if steps <= 1 {
        0.0
    } else {
        i as f32 / (steps - 1) as f32
    }
}

/// Largest tile width and height in the table.
pub fn max_extent(table: &[SizeVariant]) -> (f32, f32) {
    table.iter().fold((0.0f32, 0.0f32), |(w, h), size| (w.max(size.width), h.max(size.height)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const FLAKE: FlakeSize = FlakeSize::new(8.0, 16.0);

    #[test]
    fn test_fall_table_without_variation_is_uniform() {
        let mut ctx = SpawnContext::from_seed(1);
        let table = fall_size_table(FLAKE, 0.0, ValueRange::new(0.0, 0.0), SIZE_STEPS, &mut ctx);
        assert_eq!(table.len(), 100);
        assert!(table.iter().all(|s| s.width == 8.0 && s.height == 16.0 && s.radius == 0.0));
    }

    #[test]
    fn test_fall_table_skews_large() {
        let mut ctx = SpawnContext::from_seed(1);
        let table = fall_size_table(FLAKE, 0.5, default_radius_range(FLAKE), SIZE_STEPS, &mut ctx);
        // First entry is full size, last entry is the minimum on both axes.
        assert_eq!(table[0].width, 8.0);
        assert!((table[99].width - 4.0).abs() < 1e-5);
        assert!((table[99].height - 8.0).abs() < 1e-5);
        // Quadratic skew: more than half the widths are above the midpoint.
        let above_mid = table.iter().filter(|s| s.width > 6.0).count();
        assert!(above_mid > 50, "only {above_mid} tiles above midpoint");
        assert!(table.iter().all(|s| (0.0..=8.0).contains(&s.radius)));
    }

    #[test]
    fn test_blast_table_is_linear() {
        let table = blast_size_table(FLAKE, 0.5, 0.0, SIZE_STEPS);
        assert_eq!(table.len(), 10);
        assert!((table[0].width - 4.0).abs() < 1e-5);
        assert!((table[9].width - 12.0).abs() < 1e-5);
        assert!((table[9].height - 24.0).abs() < 1e-5);
        for pair in table.windows(2) {
            assert!(pair[1].width > pair[0].width);
        }
    }

    #[test]
    fn test_out_of_range_variation_is_accepted() {
        let table = blast_size_table(FLAKE, 2.0, 0.0, SIZE_STEPS);
        assert!(table[0].width < 0.0);
    }

    #[test]
    fn test_max_extent() {
        let table = blast_size_table(FLAKE, 0.5, 0.0, SIZE_STEPS);
        assert_eq!(max_extent(&table), (12.0, 24.0));
    }
}
