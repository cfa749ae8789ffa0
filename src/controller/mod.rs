//! Animation controllers.
//!
//! A controller owns the timeline of one animation: its progress value(s),
//! the running tween, the current particle scene, and the event channel.
//! Application code drives it through [`Controls`]; the render pass drives it
//! through [`FrameSource`]. Both sides only need `&self`, so a controller is
//! shared by cloning it (all clones refer to the same animation).
//!
//! - [`ConfettiController`]: fall, optionally blasting out of cannons first
//! - [`BlastController`]: radial burst from one point
//! - [`ContinuousController`]: two staggered fall lanes for endless confetti

mod blast;
mod continuous;
mod fall;

pub use blast::BlastController;
pub use continuous::ContinuousController;
pub use fall::ConfettiController;

use crate::config::{FlakeOptions, FlakeTexture, ValueRange};
use crate::error::TextureError;
use crate::sizes::SizeVariant;
use crate::sprite::FrameBatch;
use crate::textures::{Atlas, TextureBuilder, TextureSource};
use std::sync::Arc;
use std::time::Duration;

/// Playback operations. Calls that make no sense in the current state (pause
/// before start, resume while running) are ignored.
pub trait Controls {
    /// Value that can replace the configured origin for one run.
    type Overrides;

    /// Regenerate the flakes and play from the start. `None` clears any
    /// override from an earlier restart.
    fn restart(&self, overrides: Option<Self::Overrides>);

    /// Freeze in place.
    fn pause(&self);

    /// Continue a paused animation over the remaining distance.
    fn resume(&self);

    /// Stop and rewind to the initial progress without regenerating.
    fn reset(&self);

    fn is_running(&self) -> bool;
}

/// Render-pass side of a controller.
pub trait FrameSource: Send + Sync {
    /// Advance the timeline by `dt`.
    fn tick(&self, dt: Duration);

    /// Append this frame's sprites to `batch`.
    fn write_frame(&self, batch: &mut FrameBatch);

    /// Atlas every sprite in [`write_frame`](Self::write_frame) refers to.
    fn atlas(&self) -> Arc<Atlas>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Phase {
    /// Never started, or rewound by `reset`.
    Idle,
    Running,
    Paused,
    /// Played to the end without looping.
    Finished,
}

/// Segment tags reported by controller tweens.
pub(crate) const BLAST_DONE: u32 = 1;
pub(crate) const FALL_DONE: u32 = 2;

/// Corner radius range for rounded-rect tiles.
pub(crate) fn radius_range(flakes: &FlakeOptions) -> ValueRange {
    match &flakes.texture {
        FlakeTexture::Rect {
            radius_range: Some(range),
        } => *range,
        _ => crate::sizes::default_radius_range(flakes.flake_size),
    }
}

/// Load the texture source and rasterize the atlas.
pub(crate) fn build_atlas<B>(
    builder: &B,
    flakes: &FlakeOptions,
    sizes: Arc<[SizeVariant]>,
) -> Result<Arc<Atlas>, TextureError>
where
    B: TextureBuilder + ?Sized,
{
    let source = TextureSource::load(&flakes.texture)?;
    Ok(Arc::new(builder.build(&flakes.colors, sizes, &source)?))
}
