//! Randomized flake descriptors.
//!
//! A descriptor holds everything random about one flake for one animation
//! cycle. Descriptors are never mutated: each restart or loop produces a new
//! array through [`FallParticle::generate`] / [`BlastParticle::generate`].

use crate::config::{OffsetRanges, RotationRanges, ValueRange, RANDOM_INITIAL_Y_JIGGLE};
use crate::interpolate::lerp_clamped;
use crate::spawn::SpawnContext;
use glam::Vec2;
use std::f32::consts::PI;
use std::time::Duration;

/// Horizontal waypoints per fall flake.
pub const FALL_WAYPOINTS: usize = 5;
/// Horizontal waypoints per radial flake.
pub const BLAST_WAYPOINTS: usize = 6;
/// Waypoint amplitude for radial flakes.
pub const BLAST_RANDOM_X: f32 = 5.0;

/// Sampling inputs shared by both particle kinds.
#[derive(Debug, Clone, Copy)]
pub struct ParticleRanges {
    pub count: usize,
    pub color_count: usize,
    pub size_count: usize,
    pub rotation: RotationRanges,
    pub speed: ValueRange,
    pub offset: OffsetRanges,
}

/// Per-axis peak rotation in radians.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaxRotation {
    pub x: f32,
    pub z: f32,
}

/// Descriptor for one flake of the fall / cannon variant.
#[derive(Debug, Clone, PartialEq)]
pub struct FallParticle {
    pub clockwise: bool,
    pub max_rotation: MaxRotation,
    pub color_index: usize,
    pub size_index: usize,
    pub random_xs: [f32; FALL_WAYPOINTS],
    pub initial_random_y: f32,
    /// Blast progress at which this flake leaves its cannon.
    pub blast_threshold: f32,
    pub initial_rotation: f32,
    pub random_speed: f32,
    pub random_offset: Vec2,
}

/// Descriptor for one flake of the radial blast variant.
#[derive(Debug, Clone, PartialEq)]
pub struct BlastParticle {
    pub clockwise: bool,
    pub max_rotation: MaxRotation,
    pub color_index: usize,
    pub size_index: usize,
    pub random_xs: [f32; BLAST_WAYPOINTS],
    pub initial_random_y: f32,
    /// Blast progress this flake waits for before expanding.
    pub delay_blast: f32,
    pub initial_rotation: f32,
    pub random_speed: f32,
    pub random_offset: Vec2,
}

/// Waypoint amplitude for a fall of the given duration: 5px at 0ms growing to
/// 50px at 8s, clamped.
pub fn max_random_x(fall_duration: Duration) -> f32 {
    lerp_clamped(fall_duration.as_millis() as f32, 0.0, 8000.0, 5.0, 50.0)
}

fn max_rotation(ctx: &mut SpawnContext, ranges: &RotationRanges) -> MaxRotation {
    MaxRotation {
        x: ctx.random_in(ranges.x),
        z: ctx.random_in(ranges.z),
    }
}

fn offset(ctx: &mut SpawnContext, ranges: &OffsetRanges) -> Vec2 {
    Vec2::new(ctx.random_in(ranges.x), ctx.random_in(ranges.y))
}

impl FallParticle {
    /// Sample `ranges.count` fresh descriptors.
    pub fn generate(
        ctx: &mut SpawnContext,
        ranges: &ParticleRanges,
        fall_duration: Duration,
    ) -> Vec<FallParticle> {
        let amplitude = max_random_x(fall_duration);
        (0..ranges.count)
            .map(|_| FallParticle {
                clockwise: ctx.random_bool(),
                max_rotation: max_rotation(ctx, &ranges.rotation),
                color_index: ctx.random_index(ranges.color_count),
                size_index: ctx.random_index(ranges.size_count),
                random_xs: ctx.random_array(-amplitude, amplitude),
                initial_random_y: ctx.random_range(-RANDOM_INITIAL_Y_JIGGLE, RANDOM_INITIAL_Y_JIGGLE),
                blast_threshold: ctx.random_range(0.0, 0.3),
                initial_rotation: ctx.random_range(0.1 * PI, PI),
                random_speed: ctx.random_in(ranges.speed),
                random_offset: offset(ctx, &ranges.offset),
            })
            .collect()
    }
}

impl BlastParticle {
    /// Sample `ranges.count` fresh descriptors.
    pub fn generate(ctx: &mut SpawnContext, ranges: &ParticleRanges) -> Vec<BlastParticle> {
        (0..ranges.count)
            .map(|_| BlastParticle {
                clockwise: ctx.random_bool(),
                max_rotation: max_rotation(ctx, &ranges.rotation),
                color_index: ctx.random_index(ranges.color_count),
                size_index: ctx.random_index(ranges.size_count),
                random_xs: ctx.random_array(-BLAST_RANDOM_X, BLAST_RANDOM_X),
                initial_random_y: ctx.random_range(-RANDOM_INITIAL_Y_JIGGLE, RANDOM_INITIAL_Y_JIGGLE),
                delay_blast: ctx.random_range(0.0, 0.6),
                initial_rotation: ctx.random_range(0.1 * PI, PI),
                random_speed: ctx.random_in(ranges.speed),
                random_offset: offset(ctx, &ranges.offset),
            })
            .collect()
    }
}
