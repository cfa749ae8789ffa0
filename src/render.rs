//! CPU reference renderer.
//!
//! Draws a [`FrameBatch`] into an `RgbaImage` by inverse-mapping every covered
//! pixel into its atlas tile. Nearest sampling and straight-alpha "over"
//! blending; slow, but exact enough to test motion and to write PNG frames
//! without a GPU.

use crate::config::Color;
use crate::motion::FlakeTransform;
use crate::sprite::{FrameBatch, SourceRect, SpriteBatchRenderer};
use crate::textures::Atlas;
use glam::Vec2;
use image::{Rgba, RgbaImage};
use std::path::Path;

/// Renders frames into an in-memory image.
#[derive(Debug, Clone)]
pub struct SoftwareRenderer {
    target: RgbaImage,
    background: Rgba<u8>,
}

impl SoftwareRenderer {
    /// Transparent canvas of the given size.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            target: RgbaImage::new(width, height),
            background: Rgba([0, 0, 0, 0]),
        }
    }

    /// Fill color used by [`clear`](Self::clear).
    pub fn with_background(mut self, color: Color) -> Self {
        self.background = Rgba(color.0);
        self.clear();
        self
    }

    pub fn clear(&mut self) {
        for pixel in self.target.pixels_mut() {
            *pixel = self.background;
        }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.target
    }

    /// Write the current canvas as an image file; format follows the extension.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), image::ImageError> {
        self.target.save(path)
    }

    fn draw_sprite(&mut self, atlas: &Atlas, source: &SourceRect, transform: &FlakeTransform, opacity: f32) {
        if opacity <= 0.0 || source.width <= 0.0 || source.height <= 0.0 {
            return;
        }
        let det = transform.scos * transform.scos + transform.ssin * transform.ssin;
        if det < 1e-8 {
            return;
        }

        let corners = [
            transform.apply(Vec2::ZERO),
            transform.apply(Vec2::new(source.width, 0.0)),
            transform.apply(Vec2::new(0.0, source.height)),
            transform.apply(Vec2::new(source.width, source.height)),
        ];
        let min = corners.iter().fold(Vec2::splat(f32::MAX), |acc, c| acc.min(*c));
        let max = corners.iter().fold(Vec2::splat(f32::MIN), |acc, c| acc.max(*c));

        let (width, height) = self.target.dimensions();
        let x0 = min.x.floor().max(0.0) as u32;
        let y0 = min.y.floor().max(0.0) as u32;
        let x1 = (max.x.ceil().max(0.0) as u32).min(width);
        let y1 = (max.y.ceil().max(0.0) as u32).min(height);

        for py in y0..y1 {
            for px in x0..x1 {
                let dx = px as f32 + 0.5 - transform.tx;
                let dy = py as f32 + 0.5 - transform.ty;
                let u = (transform.scos * dx + transform.ssin * dy) / det;
                let v = (-transform.ssin * dx + transform.scos * dy) / det;
                if u < 0.0 || v < 0.0 || u >= source.width || v >= source.height {
                    continue;
                }

                let sx = (source.x + u) as u32;
                let sy = (source.y + v) as u32;
                let Some(texel) = atlas.image.get_pixel_checked(sx, sy) else {
                    continue;
                };
                let alpha = texel[3] as f32 / 255.0 * opacity;
                if alpha <= 0.0 {
                    continue;
                }
                let dst = self.target.get_pixel_mut(px, py);
                *dst = blend_over(*texel, alpha, *dst);
            }
        }
    }
}

impl SpriteBatchRenderer for SoftwareRenderer {
    fn draw_batch(&mut self, atlas: &Atlas, batch: &FrameBatch) {
        for (source, transform, opacity) in batch.sprites() {
            self.draw_sprite(atlas, source, transform, opacity);
        }
    }
}

fn blend_over(src: Rgba<u8>, src_alpha: f32, dst: Rgba<u8>) -> Rgba<u8> {
    let dst_alpha = dst[3] as f32 / 255.0;
    let out_alpha = src_alpha + dst_alpha * (1.0 - src_alpha);
    if out_alpha <= 0.0 {
        return Rgba([0, 0, 0, 0]);
    }
    let mut out = [0u8; 4];
    for channel in 0..3 {
        let value = (src[channel] as f32 * src_alpha + dst[channel] as f32 * dst_alpha * (1.0 - src_alpha))
            / out_alpha;
        out[channel] = value.round().clamp(0.0, 255.0) as u8;
    }
    out[3] = (out_alpha * 255.0).round() as u8;
    Rgba(out)
}
