//! # Flurry - batched confetti particle engine
//!
//! Procedural confetti: every flake's path is a pure function of its random
//! seed and one or two progress values, so a frame is evaluated from scratch
//! and drawn as a single atlas sprite batch.
//!
//! Flurry handles the layout, randomness, motion curves and atlas building so
//! you only pick a variant, configure it, and drive it from your render loop.
//!
//! ## Quick Start
//!
//! ```ignore
//! use flurry::prelude::*;
//!
//! fn main() -> Result<(), ConfettiError> {
//!     let confetti = ConfettiController::new(
//!         ConfettiConfig::new()
//!             .with_container(390.0, 844.0)
//!             .with_count(150)
//!             .with_autoplay(false),
//!     )?;
//!     confetti.restart(None);
//!
//!     let atlas = confetti.atlas();
//!     let mut renderer = SoftwareRenderer::new(390, 844);
//!     let mut batch = FrameBatch::new();
//!     for _ in 0..120 {
//!         confetti.tick(std::time::Duration::from_millis(16));
//!         batch.clear();
//!         confetti.write_frame(&mut batch);
//!         renderer.clear();
//!         renderer.draw_batch(&atlas, &batch);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Variants
//!
//! | Controller | Motion |
//! |------------|--------|
//! | [`ConfettiController`] | Grid of flakes falling through the container, optionally blasted out of cannons first |
//! | [`BlastController`] | Radial burst onto a golden-angle spiral, then a fall |
//! | [`ContinuousController`] | Two staggered looping fall lanes |
//!
//! ## Threads
//!
//! Controllers are cheap to clone and every operation takes `&self`. The
//! render pass calls [`FrameSource::tick`] and [`FrameSource::write_frame`];
//! the application calls [`Controls`] methods from any thread and drains
//! [`AnimationEvent`]s from the controller's channel.
//!
//! ## Textures
//!
//! Flakes are rounded rectangles tinted from the palette by default. An image
//! file or (with the `svg` feature) an SVG document can be used instead; see
//! [`FlakeTexture`].

pub mod config;
pub mod controller;
pub mod easing;
pub mod error;
pub mod events;
pub mod interpolate;
pub mod layout;
pub mod motion;
pub mod particles;
pub mod progress;
pub mod render;
pub mod sizes;
pub mod spawn;
pub mod sprite;
pub mod textures;
pub mod tween;

pub use bytemuck;
pub use config::{BlastConfig, Color, ConfettiConfig, FlakeOptions, FlakeSize, FlakeTexture, ValueRange};
pub use controller::{BlastController, ConfettiController, ContinuousController, Controls, FrameSource};
pub use easing::Easing;
pub use error::{ConfettiError, ConfigError, TextureError};
pub use events::AnimationEvent;
pub use glam::Vec2;
pub use motion::{BlastScene, FallScene, FlakeTransform};
pub use render::SoftwareRenderer;
pub use spawn::SpawnContext;
pub use sprite::{FrameBatch, SourceRect, SpriteBatchRenderer};
pub use textures::{Atlas, RasterTextureBuilder, TextureBuilder, TextureSource};

/// Convenient re-exports for common usage.
///
/// ```ignore
/// use flurry::prelude::*;
/// ```
///
/// This imports:
/// - the three controllers and the [`Controls`] / [`FrameSource`] traits
/// - [`ConfettiConfig`], [`BlastConfig`] and the flake option types
/// - [`FrameBatch`], [`SpriteBatchRenderer`] and [`SoftwareRenderer`]
/// - [`Vec2`]
pub mod prelude {
    pub use crate::config::{
        BlastConfig, Color, ConfettiConfig, FlakeOptions, FlakeSize, FlakeTexture, RangeConfig,
        ValueRange,
    };
    pub use crate::controller::{
        BlastController, ConfettiController, ContinuousController, Controls, FrameSource,
    };
    pub use crate::easing::Easing;
    pub use crate::error::ConfettiError;
    pub use crate::events::AnimationEvent;
    pub use crate::render::SoftwareRenderer;
    pub use crate::sprite::{FrameBatch, SpriteBatchRenderer};
    pub use crate::textures::Atlas;
    pub use glam::Vec2;
}
