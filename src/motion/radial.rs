//! Radial blast motion.
//!
//! Flakes burst from a single center to targets on a golden-angle spiral, so
//! any count fills the disc evenly without clumping. Blast and fall have
//! their own progress values in `[0, 1]`; the fall pulls every flake down
//! past the bottom of the container with a little sideways jiggle.

use super::{flip_scale, FlakeTransform};
use crate::interpolate::{interpolate, lerp_clamped, Extrapolation};
use crate::particles::{BlastParticle, BLAST_WAYPOINTS};
use crate::sizes::SizeVariant;
use glam::Vec2;
use std::sync::Arc;

/// Angle between consecutive spiral targets, in degrees.
pub const GOLDEN_ANGLE_DEGREES: f32 = 137.5;
/// Fall progress at which the sideways jiggle begins.
const JIGGLE_START: f32 = 0.1;

/// Spiral target for flake `index` of `count` around `center`.
pub fn golden_angle_target(index: usize, count: usize, center: Vec2, max_radius: f32) -> Vec2 {
    if count == 0 {
        return center;
    }
    let radius = ((index + 1) as f32 / count as f32).sqrt() * max_radius;
    let angle = ((index as f32 * GOLDEN_ANGLE_DEGREES) % 360.0).to_radians();
    center + radius * Vec2::new(angle.cos(), angle.sin())
}

/// Everything a frame needs to place radial flakes.
#[derive(Debug, Clone)]
pub struct BlastScene {
    pub particles: Vec<BlastParticle>,
    /// Effective blast center for this cycle.
    pub center: Vec2,
    pub radius: f32,
    pub sizes: Arc<[SizeVariant]>,
    pub container: Vec2,
    pub fade_out: bool,
    targets: Vec<Vec2>,
    jiggle_keys: [f32; BLAST_WAYPOINTS + 2],
}

impl BlastScene {
    pub fn new(
        particles: Vec<BlastParticle>,
        center: Vec2,
        radius: f32,
        sizes: Arc<[SizeVariant]>,
        container: Vec2,
        fade_out: bool,
    ) -> Self {
        let count = particles.len();
        let targets = (0..count)
            .map(|i| golden_angle_target(i, count, center, radius))
            .collect();

        let mut jiggle_keys = [0.0; BLAST_WAYPOINTS + 2];
        jiggle_keys[1] = JIGGLE_START;
        for k in 0..BLAST_WAYPOINTS {
            jiggle_keys[k + 2] =
                JIGGLE_START + (k + 1) as f32 * (1.0 - JIGGLE_START) / BLAST_WAYPOINTS as f32;
        }

        Self {
            particles,
            center,
            radius,
            sizes,
            container,
            fade_out,
            targets,
            jiggle_keys,
        }
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Spiral target of flake `index`.
    pub fn target(&self, index: usize) -> Vec2 {
        self.targets[index]
    }

    /// Center of flake `index`.
    pub fn translation(&self, index: usize, blast: f32, fall: f32) -> Vec2 {
        let piece = &self.particles[index];
        let target = self.targets[index];

        let delayed = interpolate(blast, &[piece.delay_blast, 1.0], &[0.0, 1.0], Extrapolation::Identity);
        let mut position = target - (target - self.center) * (1.0 - delayed);

        let fall_distance = (self.container.y - self.center.y + self.radius) * piece.random_speed;
        position += Vec2::new(0.0, fall * fall_distance);
        position += fall * piece.random_offset;

        let mut jiggle_values = [0.0; BLAST_WAYPOINTS + 2];
        jiggle_values[2..].copy_from_slice(&piece.random_xs);
        position.x += interpolate(fall, &self.jiggle_keys, &jiggle_values, Extrapolation::Extend);

        position
    }

    /// Sprite transform for flake `index`.
    pub fn flake_transform(&self, index: usize, blast: f32, fall: f32) -> FlakeTransform {
        let piece = &self.particles[index];
        let direction = if piece.clockwise { 1.0 } else { -1.0 };
        let rz = piece.initial_rotation + lerp_clamped(fall, 0.0, 1.0, 0.0, direction * piece.max_rotation.z);
        let rx = piece.initial_rotation + lerp_clamped(fall, 0.0, 1.0, 0.0, direction * piece.max_rotation.x);

        let half_size = self
            .sizes
            .get(piece.size_index)
            .map(|size| Vec2::new(size.width, size.height) / 2.0)
            .unwrap_or(Vec2::ZERO);

        FlakeTransform::around_center(rz, flip_scale(blast, rx), self.translation(index, blast, fall), half_size)
    }

    /// Append every flake's transform to `out`.
    pub fn extend_transforms(&self, blast: f32, fall: f32, out: &mut Vec<FlakeTransform>) {
        out.extend((0..self.len()).map(|i| self.flake_transform(i, blast, fall)));
    }

    /// Global opacity for the given fall progress.
    pub fn opacity(&self, fall: f32) -> f32 {
        if self.fade_out {
            lerp_clamped(fall, 0.0, 1.0, 1.0, 0.0)
        } else {
            1.0
        }
    }
}
