//! Flake atlas construction.
//!
//! Every flake is drawn from one atlas image laid out as a grid: one column
//! per size variant, one row per palette color. Cells are sized to the
//! largest variant so a tile's source rectangle is just
//! `(size_index * cell_width, color_index * cell_height, width, height)`.
//!
//! # Texture Modes
//!
//! - **Rect** (default): anti-aliased rounded rectangles, one row per color
//! - **Image**: a raster image scaled into each size variant, single row
//! - **Svg**: an SVG rasterized per size variant, optionally tinted per color
//!   (requires the `svg` feature)
//!
//! ```ignore
//! let source = TextureSource::load(&config.flakes.texture)?;
//! let atlas = RasterTextureBuilder.build(&config.flakes.colors, sizes, &source)?;
//! let rect = atlas.tile(color_index, size_index);
//! ```

use crate::config::{Color, FlakeTexture};
use crate::error::TextureError;
use crate::sizes::SizeVariant;
use crate::sprite::SourceRect;
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Pixel data a tile is drawn from.
pub enum TextureSource {
    /// Rounded rectangle using each variant's corner radius.
    Rect,
    /// Static image, scaled per variant.
    Image(RgbaImage),
    /// Parsed SVG document.
    #[cfg(feature = "svg")]
    Svg { tree: usvg::Tree, tint: bool },
}

impl fmt::Debug for TextureSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextureSource::Rect => f.write_str("Rect"),
            TextureSource::Image(image) => write!(f, "Image({}x{})", image.width(), image.height()),
            #[cfg(feature = "svg")]
            TextureSource::Svg { tint, .. } => write!(f, "Svg {{ tint: {tint} }}"),
        }
    }
}

impl TextureSource {
    /// Load whatever the texture mode refers to.
    pub fn load(texture: &FlakeTexture) -> Result<Self, TextureError> {
        match texture {
            FlakeTexture::Rect { .. } => Ok(TextureSource::Rect),
            FlakeTexture::Image { path } => Self::from_image_file(path),
            FlakeTexture::Svg { path, tint } => {
                let data = std::fs::read(path)?;
                Self::from_svg_data(&data, *tint)
            }
        }
    }

    pub fn from_image_file<P: AsRef<Path>>(path: P) -> Result<Self, TextureError> {
        let image = image::open(path.as_ref())?.into_rgba8();
        Ok(TextureSource::Image(image))
    }

    /// Parse an SVG document.
    #[cfg(feature = "svg")]
    pub fn from_svg_data(data: &[u8], tint: bool) -> Result<Self, TextureError> {
        let tree = usvg::Tree::from_data(data, &usvg::Options::default())
            .map_err(|e| TextureError::Svg(e.to_string()))?;
        Ok(TextureSource::Svg { tree, tint })
    }

    #[cfg(not(feature = "svg"))]
    pub fn from_svg_data(_data: &[u8], _tint: bool) -> Result<Self, TextureError> {
        Err(TextureError::SvgUnsupported)
    }

    /// Whether tiles differ per palette color.
    pub fn uses_palette(&self) -> bool {
        match self {
            TextureSource::Rect => true,
            TextureSource::Image(_) => false,
            #[cfg(feature = "svg")]
            TextureSource::Svg { tint, .. } => *tint,
        }
    }
}

/// Grid of flake tiles in one image.
#[derive(Debug, Clone)]
pub struct Atlas {
    pub image: RgbaImage,
    pub cell_width: u32,
    pub cell_height: u32,
    color_rows: usize,
    sizes: Arc<[SizeVariant]>,
}

impl Atlas {
    pub fn color_rows(&self) -> usize {
        self.color_rows
    }

    pub fn sizes(&self) -> &Arc<[SizeVariant]> {
        &self.sizes
    }

    /// Source rectangle for a color and size. Out-of-range indices wrap, so a
    /// single-row atlas serves every color index.
    pub fn tile(&self, color_index: usize, size_index: usize) -> SourceRect {
        if self.sizes.is_empty() || self.color_rows == 0 {
            return SourceRect::default();
        }
        let column = size_index % self.sizes.len();
        let row = color_index % self.color_rows;
        let size = &self.sizes[column];
        SourceRect {
            x: (column as u32 * self.cell_width) as f32,
            y: (row as u32 * self.cell_height) as f32,
            width: size.width.max(0.0),
            height: size.height.max(0.0),
        }
    }
}

/// Rasterizes a palette × size-variant grid into an [`Atlas`].
///
/// Implementations must be pure in their inputs: the same colors, sizes and
/// source always give the same atlas.
pub trait TextureBuilder {
    fn build(
        &self,
        colors: &[Color],
        sizes: Arc<[SizeVariant]>,
        source: &TextureSource,
    ) -> Result<Atlas, TextureError>;
}

/// CPU rasterizer backed by `image` (and `resvg` for SVG sources).
#[derive(Debug, Clone, Copy, Default)]
pub struct RasterTextureBuilder;

impl TextureBuilder for RasterTextureBuilder {
    fn build(
        &self,
        colors: &[Color],
        sizes: Arc<[SizeVariant]>,
        source: &TextureSource,
    ) -> Result<Atlas, TextureError> {
        let color_rows = if source.uses_palette() { colors.len() } else { 1 };
        if color_rows == 0 || sizes.is_empty() {
            return Err(TextureError::EmptyAtlas {
                colors: color_rows,
                variants: sizes.len(),
            });
        }

        let (max_width, max_height) = crate::sizes::max_extent(&sizes);
        let cell_width = (max_width.ceil() as u32).max(1);
        let cell_height = (max_height.ceil() as u32).max(1);
        let mut image = RgbaImage::new(cell_width * sizes.len() as u32, cell_height * color_rows as u32);

        log::trace!(
            "building {}x{} atlas: {} colors x {} variants, cell {}x{}",
            image.width(),
            image.height(),
            color_rows,
            sizes.len(),
            cell_width,
            cell_height
        );

        for (column, size) in sizes.iter().enumerate() {
            let (tile_width, tile_height) = tile_extent(size);
            if tile_width == 0 || tile_height == 0 {
                continue;
            }
            let x = column as u32 * cell_width;

            match source {
                TextureSource::Rect => {
                    for (row, color) in colors.iter().enumerate() {
                        draw_rounded_rect(&mut image, x, row as u32 * cell_height, size, *color);
                    }
                }
                TextureSource::Image(src) => {
                    let tile = imageops::resize(src, tile_width, tile_height, FilterType::Triangle);
                    imageops::replace(&mut image, &tile, x as i64, 0);
                }
                #[cfg(feature = "svg")]
                TextureSource::Svg { tree, tint } => {
                    let tile = rasterize_svg(tree, tile_width, tile_height)?;
                    if *tint {
                        for (row, color) in colors.iter().enumerate() {
                            let mut tinted = tile.clone();
                            apply_tint(&mut tinted, *color);
                            imageops::replace(&mut image, &tinted, x as i64, (row as u32 * cell_height) as i64);
                        }
                    } else {
                        imageops::replace(&mut image, &tile, x as i64, 0);
                    }
                }
            }
        }

        Ok(Atlas {
            image,
            cell_width,
            cell_height,
            color_rows,
            sizes,
        })
    }
}

/// Whole-pixel footprint of a size variant; negative sizes collapse to zero.
fn tile_extent(size: &SizeVariant) -> (u32, u32) {
    (size.width.max(0.0).ceil() as u32, size.height.max(0.0).ceil() as u32)
}

/// Anti-aliased rounded rectangle via a signed distance field, straight alpha.
fn draw_rounded_rect(image: &mut RgbaImage, x0: u32, y0: u32, size: &SizeVariant, color: Color) {
    let (tile_width, tile_height) = tile_extent(size);
    let half_width = size.width / 2.0;
    let half_height = size.height / 2.0;
    let radius = size.radius.clamp(0.0, half_width.min(half_height));
    let [r, g, b, a] = color.0;

    for py in 0..tile_height {
        for px in 0..tile_width {
            let dx = (px as f32 + 0.5 - half_width).abs() - (half_width - radius);
            let dy = (py as f32 + 0.5 - half_height).abs() - (half_height - radius);
            let outside = (dx.max(0.0).powi(2) + dy.max(0.0).powi(2)).sqrt();
            let distance = outside + dx.max(dy).min(0.0) - radius;
            let coverage = (0.5 - distance).clamp(0.0, 1.0);
            if coverage > 0.0 {
                let alpha = (a as f32 * coverage).round() as u8;
                image.put_pixel(x0 + px, y0 + py, Rgba([r, g, b, alpha]));
            }
        }
    }
}

#[cfg(feature = "svg")]
fn rasterize_svg(tree: &usvg::Tree, width: u32, height: u32) -> Result<RgbaImage, TextureError> {
    use tiny_skia::{Pixmap, Transform};

    let mut pixmap = Pixmap::new(width, height)
        .ok_or_else(|| TextureError::Svg(format!("cannot allocate {width}x{height} pixmap")))?;

    // Fit inside the tile, preserving aspect ratio, centered.
    let svg_size = tree.size();
    let scale = (width as f32 / svg_size.width()).min(height as f32 / svg_size.height());
    let offset_x = (width as f32 - svg_size.width() * scale) / 2.0;
    let offset_y = (height as f32 - svg_size.height() * scale) / 2.0;
    let transform = Transform::from_scale(scale, scale).post_translate(offset_x, offset_y);

    resvg::render(tree, transform, &mut pixmap.as_mut());

    let mut pixels = pixmap.take();
    unpremultiply(&mut pixels);
    RgbaImage::from_raw(width, height, pixels)
        .ok_or_else(|| TextureError::Svg("pixmap size mismatch".to_string()))
}

/// tiny-skia renders premultiplied alpha; the atlas is straight alpha.
#[cfg(feature = "svg")]
fn unpremultiply(pixels: &mut [u8]) {
    for chunk in pixels.chunks_exact_mut(4) {
        let a = chunk[3] as f32 / 255.0;
        if a > 0.0 {
            for channel in &mut chunk[..3] {
                *channel = (*channel as f32 / a).min(255.0) as u8;
            }
        }
    }
}

/// Replace color channels with `tint`, keeping the shape's alpha.
#[cfg(feature = "svg")]
fn apply_tint(tile: &mut RgbaImage, tint: Color) {
    let [r, g, b, a] = tint.0;
    for pixel in tile.pixels_mut() {
        if pixel[3] > 0 {
            let alpha = (pixel[3] as u16 * a as u16 / 255) as u8;
            *pixel = Rgba([r, g, b, alpha]);
        }
    }
}
