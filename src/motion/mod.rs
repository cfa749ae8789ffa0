//! Per-flake motion models.
//!
//! Both variants are pure functions of an immutable scene snapshot and the
//! current progress value(s). Nothing here holds mutable state, so a frame can
//! be evaluated from any thread while the controller swaps in a new scene.
//!
//! - [`fall`]: single progress in `[0, 2]`, optional cannon blast phase
//! - [`radial`]: separate blast and fall progress, golden-angle spread

pub mod fall;
pub mod radial;

use bytemuck::{Pod, Zeroable};
use glam::Vec2;

pub use fall::FallScene;
pub use radial::BlastScene;

/// Rotation-scale-translation transform for one sprite.
///
/// Maps a tile-local point `(u, v)` to `(scos*u - ssin*v + tx, ssin*u + scos*v + ty)`.
/// Layout matches a 16-byte instance attribute.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct FlakeTransform {
    pub scos: f32,
    pub ssin: f32,
    pub tx: f32,
    pub ty: f32,
}

impl FlakeTransform {
    /// Rotate by `rotation` radians and scale by `scale` around the tile
    /// center, then place that center at `center`.
    pub fn around_center(rotation: f32, scale: f32, center: Vec2, half_size: Vec2) -> Self {
        let scos = rotation.cos() * scale;
        let ssin = rotation.sin() * scale;
        Self {
            scos,
            ssin,
            tx: center.x - scos * half_size.x + ssin * half_size.y,
            ty: center.y - ssin * half_size.x - scos * half_size.y,
        }
    }

    /// Where the tile-local point lands on screen.
    #[inline]
    pub fn apply(&self, local: Vec2) -> Vec2 {
        Vec2::new(
            self.scos * local.x - self.ssin * local.y + self.tx,
            self.ssin * local.x + self.scos * local.y + self.ty,
        )
    }

    /// Effective uniform scale.
    #[inline]
    pub fn scale(&self) -> f32 {
        (self.scos * self.scos + self.ssin * self.ssin).sqrt()
    }
}

/// Scale shared by both variants: grows in over the first fifth of the blast,
/// then flips with the x-axis rotation.
#[inline]
pub(crate) fn flip_scale(blast_progress: f32, rotation_x: f32) -> f32 {
    let grow = crate::interpolate::interpolate(
        blast_progress,
        &[0.0, 0.2, 1.0],
        &[0.0, 1.0, 1.0],
        crate::interpolate::Extrapolation::Clamp,
    );
    grow * rotation_x.cos().abs()
}
