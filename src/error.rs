//! Error types for Flurry.
//!
//! Animation itself never fails: degenerate input produces an empty frame.
//! Errors only surface while loading configuration or building the flake
//! atlas, before any animation runs.

use thiserror::Error;

/// Errors that can occur while building a flake atlas.
#[derive(Debug, Error)]
pub enum TextureError {
    /// Failed to decode an image file.
    #[error("failed to load image: {0}")]
    ImageLoad(#[from] image::ImageError),
    /// Failed to read a texture file from disk.
    #[error("failed to read texture file: {0}")]
    Io(#[from] std::io::Error),
    /// The SVG document could not be parsed.
    #[error("failed to parse SVG: {0}")]
    Svg(String),
    /// SVG textures were requested but the `svg` feature is disabled.
    #[error("SVG flake textures require the `svg` feature")]
    SvgUnsupported,
    /// The atlas would have zero width or height.
    #[error("atlas has no tiles ({colors} colors x {variants} size variants)")]
    EmptyAtlas {
        /// Number of palette colors.
        colors: usize,
        /// Number of size variants.
        variants: usize,
    },
}

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    /// The configuration is not valid JSON for the expected shape.
    #[error("invalid config: {0}")]
    Json(#[from] serde_json::Error),
    /// A palette entry is not a `#RRGGBB` / `#RRGGBBAA` color.
    #[error("invalid color `{0}`, expected #RRGGBB or #RRGGBBAA")]
    InvalidColor(String),
}

/// Errors that can occur when constructing an animation controller.
#[derive(Debug, Error)]
pub enum ConfettiError {
    /// Atlas construction failed.
    #[error("texture error: {0}")]
    Texture(#[from] TextureError),
    /// Configuration could not be loaded.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}
