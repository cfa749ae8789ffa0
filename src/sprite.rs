//! Sprite batch assembly.
//!
//! A frame is one [`FrameBatch`]: for every flake, the atlas tile to sample
//! ([`SourceRect`]) and where to put it ([`FlakeTransform`]). Any backend that
//! can draw textured quads from those two arrays implements
//! [`SpriteBatchRenderer`]; the crate ships a CPU one in
//! [`render`](crate::render).

use crate::motion::FlakeTransform;
use crate::textures::Atlas;
use bytemuck::{Pod, Zeroable};

/// Atlas region in pixels.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct SourceRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Consecutive sprites drawn with one opacity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OpacityRun {
    pub start: usize,
    pub len: usize,
    pub opacity: f32,
}

/// Draw commands for one frame.
///
/// `sources` and `transforms` are parallel arrays. `runs` partitions them by
/// opacity: one run per animation lane, so a single-lane animation has one.
#[derive(Debug, Clone, Default)]
pub struct FrameBatch {
    pub sources: Vec<SourceRect>,
    pub transforms: Vec<FlakeTransform>,
    pub runs: Vec<OpacityRun>,
}

impl FrameBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop all commands, keeping allocations.
    pub fn clear(&mut self) {
        self.sources.clear();
        self.transforms.clear();
        self.runs.clear();
    }

    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    /// Close a run covering everything appended since `start`.
    pub fn push_run(&mut self, start: usize, opacity: f32) {
        let len = self.transforms.len().saturating_sub(start);
        if len > 0 {
            self.runs.push(OpacityRun { start, len, opacity });
        }
    }

    /// Iterate `(source, transform, opacity)` for every sprite.
    pub fn sprites(&self) -> impl Iterator<Item = (&SourceRect, &FlakeTransform, f32)> + '_ {
        self.runs.iter().flat_map(move |run| {
            let end = run.start + run.len;
            self.sources[run.start..end]
                .iter()
                .zip(&self.transforms[run.start..end])
                .map(move |(source, transform)| (source, transform, run.opacity))
        })
    }
}

/// Append the atlas tile of every `(color_index, size_index)` pair.
pub fn assemble_sprites<I>(atlas: &Atlas, tiles: I, out: &mut Vec<SourceRect>)
where
    I: IntoIterator<Item = (usize, usize)>,
{
    out.extend(tiles.into_iter().map(|(color, size)| atlas.tile(color, size)));
}

/// Draws a whole frame from one atlas in a single pass.
pub trait SpriteBatchRenderer {
    fn draw_batch(&mut self, atlas: &Atlas, batch: &FrameBatch);
}
