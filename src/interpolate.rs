//! Piecewise-linear keyframe interpolation.
//!
//! Every motion formula in the crate is expressed as "map this progress value
//! through these keyframes". [`interpolate`] picks the keyframe segment that
//! contains the input (or the first/last segment when the input lies outside
//! the keyframes) and linearly maps it; [`Extrapolation`] decides what happens
//! when the mapped value leaves the segment's output range.

/// Behaviour of [`interpolate`] outside the keyframe range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Extrapolation {
    /// Continue the edge segment's slope.
    #[default]
    Extend,
    /// Pin to the nearest edge output.
    Clamp,
    /// Return the input value unchanged.
    Identity,
}

/// Map `x` through `input → output` keyframes.
///
/// `input` must be non-decreasing and the same length as `output`, with at
/// least two entries. Shorter tables return the first output (or `x` when both
/// are empty).
pub fn interpolate(x: f32, input: &[f32], output: &[f32], extrapolation: Extrapolation) -> f32 {
    let len = input.len().min(output.len());
    match len {
        0 => return x,
        1 => return output[0],
        _ => {}
    }

    let mut i = 1;
    while i < len - 1 && x >= input[i] {
        i += 1;
    }

    let (in0, in1) = (input[i - 1], input[i]);
    let (out0, out1) = (output[i - 1], output[i]);

    let span = in1 - in0;
    if span == 0.0 {
        return out0;
    }

    let value = out0 + (x - in0) / span * (out1 - out0);
    let direction = if out1 >= out0 { 1.0 } else { -1.0 };

    let below = direction * value < direction * out0;
    let above = direction * value > direction * out1;
    if !below && !above {
        return value;
    }

    match extrapolation {
        Extrapolation::Extend => value,
        Extrapolation::Identity => x,
        Extrapolation::Clamp => {
            if below {
                out0
            } else {
                out1
            }
        }
    }
}

/// Shorthand for the two-keyframe clamped case used throughout the motion models.
#[inline]
pub fn lerp_clamped(x: f32, from: f32, to: f32, out_from: f32, out_to: f32) -> f32 {
    interpolate(x, &[from, to], &[out_from, out_to], Extrapolation::Clamp)
}

/// `chunks` values evenly spaced from `lower` to `upper`, both inclusive.
pub fn evenly_distributed(lower: f32, upper: f32, chunks: usize) -> Vec<f32> {
    match chunks {
        0 => Vec::new(),
        1 => vec![lower],
        _ => {
            let step = (upper - lower) / (chunks - 1) as f32;
            (0..chunks).map(|i| lower + step * i as f32).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_inside_range() {
        let v = interpolate(1.5, &[1.0, 2.0], &[0.0, 100.0], Extrapolation::Clamp);
        assert!((v - 50.0).abs() < 1e-4);
    }

    #[test]
    fn test_clamp_both_sides() {
        assert_eq!(interpolate(0.05, &[0.1, 1.0], &[30.0, 60.0], Extrapolation::Clamp), 30.0);
        assert_eq!(interpolate(1.5, &[0.1, 1.0], &[30.0, 60.0], Extrapolation::Clamp), 60.0);
    }

    #[test]
    fn test_clamp_decreasing_output() {
        assert_eq!(interpolate(3.0, &[1.0, 2.0], &[1.0, 0.0], Extrapolation::Clamp), 0.0);
        assert_eq!(interpolate(0.0, &[1.0, 2.0], &[1.0, 0.0], Extrapolation::Clamp), 1.0);
    }

    #[test]
    fn test_extend() {
        let v = interpolate(2.0, &[0.0, 1.0], &[0.0, 10.0], Extrapolation::Extend);
        assert!((v - 20.0).abs() < 1e-4);
    }

    #[test]
    fn test_identity_returns_input() {
        let v = interpolate(0.2, &[0.5, 1.0], &[0.0, 1.0], Extrapolation::Identity);
        assert!((v - 0.2).abs() < 1e-6);
        let inside = interpolate(0.75, &[0.5, 1.0], &[0.0, 1.0], Extrapolation::Identity);
        assert!((inside - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_multi_segment_fade() {
        let input = [1.0, 1.9, 2.0];
        let output = [1.0, 0.0, 0.0];
        assert_eq!(interpolate(1.0, &input, &output, Extrapolation::Clamp), 1.0);
        assert!((interpolate(1.45, &input, &output, Extrapolation::Clamp) - 0.5).abs() < 1e-4);
        assert_eq!(interpolate(1.95, &input, &output, Extrapolation::Clamp), 0.0);
        assert_eq!(interpolate(2.0, &input, &output, Extrapolation::Clamp), 0.0);
    }

    #[test]
    fn test_degenerate_segment() {
        assert_eq!(interpolate(5.0, &[1.0, 1.0], &[3.0, 4.0], Extrapolation::Extend), 3.0);
    }

    #[test]
    fn test_evenly_distributed() {
        assert_eq!(evenly_distributed(1.0, 2.0, 5), vec![1.0, 1.25, 1.5, 1.75, 2.0]);
        assert_eq!(evenly_distributed(1.0, 2.0, 1), vec![1.0]);
        assert!(evenly_distributed(1.0, 2.0, 0).is_empty());
    }

    proptest! {
        #[test]
        fn test_clamped_stays_within_outputs(
            x in -10.0f32..10.0,
            a in -100.0f32..100.0,
            b in -100.0f32..100.0,
        ) {
            let v = interpolate(x, &[0.0, 1.0], &[a, b], Extrapolation::Clamp);
            prop_assert!(v >= a.min(b) - 1e-3 && v <= a.max(b) + 1e-3);
        }
    }
}
