//! Fall / cannon motion.
//!
//! Progress runs over `[0, 2]`. With cannons, `[0, 1)` is the blast phase:
//! each flake waits until its own threshold, then flies from its cannon to its
//! grid slot. `[1, 2]` is the fall: flakes drop past the bottom of the
//! container while drifting between their horizontal waypoints. Without
//! cannons the animation starts at `1`.

use super::{flip_scale, FlakeTransform};
use crate::interpolate::{evenly_distributed, interpolate, lerp_clamped, Extrapolation};
use crate::layout::GridLayout;
use crate::particles::{FallParticle, FALL_WAYPOINTS};
use crate::sizes::SizeVariant;
use glam::Vec2;
use std::sync::Arc;

/// Progress at which the fall ends.
pub const END_PROGRESS: f32 = 2.0;
/// Progress at which the blast phase hands over to the fall.
pub const FALL_START: f32 = 1.0;

/// Everything a frame needs to place fall flakes. Replaced whole on every
/// restart or loop, never edited.
#[derive(Debug, Clone)]
pub struct FallScene {
    pub particles: Vec<FallParticle>,
    pub layout: GridLayout,
    /// Effective cannon positions for this cycle.
    pub cannons: Vec<Vec2>,
    pub sizes: Arc<[SizeVariant]>,
    pub container: Vec2,
    pub fade_out: bool,
    positions: Vec<Vec2>,
    waypoints: Vec<f32>,
}

impl FallScene {
    pub fn new(
        particles: Vec<FallParticle>,
        layout: GridLayout,
        cannons: Vec<Vec2>,
        sizes: Arc<[SizeVariant]>,
        container: Vec2,
        fade_out: bool,
    ) -> Self {
        let positions = layout.positions();
        Self {
            particles,
            layout,
            cannons,
            sizes,
            container,
            fade_out,
            positions,
            waypoints: evenly_distributed(FALL_START, END_PROGRESS, FALL_WAYPOINTS),
        }
    }

    #[inline]
    pub fn has_cannons(&self) -> bool {
        !self.cannons.is_empty()
    }

    /// `0` with cannons, `1` without.
    #[inline]
    pub fn initial_progress(&self) -> f32 {
        if self.has_cannons() {
            0.0
        } else {
            FALL_START
        }
    }

    /// Number of drawable flakes. Layout and particles always agree, but a
    /// degenerate container can collapse the layout.
    pub fn len(&self) -> usize {
        self.particles.len().min(self.positions.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Center of flake `index` at `progress`.
    pub fn translation(&self, index: usize, progress: f32) -> Vec2 {
        let piece = &self.particles[index];
        let slot = self.positions[index];
        let offset = self.layout.vertical_offset;
        let rest_y = slot.y + piece.random_offset.y + piece.initial_random_y + offset;

        if progress < FALL_START && self.has_cannons() {
            let cannon = self.cannons[index % self.cannons.len()];
            let target = Vec2::new(slot.x + piece.random_offset.x + piece.random_xs[0], rest_y);
            return Vec2::new(
                lerp_clamped(progress, piece.blast_threshold, FALL_START, cannon.x, target.x),
                lerp_clamped(progress, piece.blast_threshold, FALL_START, cannon.y, target.y),
            );
        }

        let max_y_movement = -offset + self.container.y * 1.5;
        let drop = lerp_clamped(progress, FALL_START, END_PROGRESS, 0.0, max_y_movement * piece.random_speed);
        let drift = interpolate(progress, &self.waypoints, &piece.random_xs, Extrapolation::Clamp);
        Vec2::new(slot.x + piece.random_offset.x + drift, rest_y + drop)
    }

    /// Sprite transform for flake `index` at `progress`.
    pub fn flake_transform(&self, index: usize, progress: f32) -> FlakeTransform {
        let piece = &self.particles[index];
        let direction = if piece.clockwise { 1.0 } else { -1.0 };
        let start = self.initial_progress();
        let rz = piece.initial_rotation
            + lerp_clamped(progress, start, END_PROGRESS, 0.0, direction * piece.max_rotation.z);
        let rx = piece.initial_rotation
            + lerp_clamped(progress, start, END_PROGRESS, 0.0, direction * piece.max_rotation.x);

        let half_size = self
            .sizes
            .get(piece.size_index)
            .map(|size| Vec2::new(size.width, size.height) / 2.0)
            .unwrap_or(Vec2::ZERO);

        FlakeTransform::around_center(rz, flip_scale(progress, rx), self.translation(index, progress), half_size)
    }

    /// Append every flake's transform to `out`.
    pub fn extend_transforms(&self, progress: f32, out: &mut Vec<FlakeTransform>) {
        out.extend((0..self.len()).map(|i| self.flake_transform(i, progress)));
    }

    /// Global opacity at `progress`.
    pub fn opacity(&self, progress: f32) -> f32 {
        if !self.fade_out {
            return 1.0;
        }
        interpolate(progress, &[1.0, 1.9, 2.0], &[1.0, 0.0, 0.0], Extrapolation::Clamp)
    }
}
