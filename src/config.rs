//! Configuration for the three animation variants.
//!
//! Every option is independently defaultable, so a JSON document only needs
//! the keys it wants to change:
//!
//! ```ignore
//! let config = ConfettiConfig::from_json_str(r##"{
//!     "count": 300,
//!     "colors": ["#FF5733", "#33FF57"],
//!     "cannons_positions": [[-30.0, 844.0], [420.0, 844.0]],
//!     "fade_out_on_end": true
//! }"##)?;
//! ```
//!
//! Builders follow the same shape in code:
//!
//! ```ignore
//! let config = ConfettiConfig::new()
//!     .with_count(300)
//!     .with_container(390.0, 844.0)
//!     .with_cannons(vec![Vec2::new(-30.0, 844.0)]);
//! ```

use crate::easing::Easing;
use crate::error::ConfigError;
use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;
use std::fmt;
use std::path::Path;
use std::time::Duration;

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_FLAKE_COUNT: usize = 200;
pub const DEFAULT_FLAKE_SIZE: FlakeSize = FlakeSize { width: 8.0, height: 16.0 };
pub const DEFAULT_FALL_DURATION: Duration = Duration::from_millis(8000);
pub const DEFAULT_BLAST_DURATION: Duration = Duration::from_millis(300);
pub const DEFAULT_VERTICAL_SPACING: f32 = 30.0;
pub const DEFAULT_BLAST_RADIUS: f32 = 180.0;
/// Container size used when none is configured.
pub const DEFAULT_CONTAINER: Vec2 = Vec2::new(1280.0, 720.0);
/// Vertical jitter applied to every flake's starting row, in pixels.
pub const RANDOM_INITIAL_Y_JIGGLE: f32 = 20.0;

pub const DEFAULT_COLORS: [&str; 10] = [
    "#FF5733", "#33FF57", "#3357FF", "#F5FF33", "#FF33B5", "#33FFDE", "#FFB733", "#A3FF33",
    "#33A5FF", "#FF33A5",
];

pub const FALL_ROTATION: RotationRanges = RotationRanges {
    x: ValueRange::new(2.0 * PI, 20.0 * PI),
    z: ValueRange::new(2.0 * PI, 20.0 * PI),
};
pub const BLAST_ROTATION: RotationRanges = RotationRanges {
    x: ValueRange::new(PI, 3.0 * PI),
    z: ValueRange::new(PI, 3.0 * PI),
};
pub const DEFAULT_RANDOM_SPEED: ValueRange = ValueRange::new(0.9, 1.3);
pub const FALL_RANDOM_OFFSET: OffsetRanges = OffsetRanges {
    x: ValueRange::new(0.0, 0.0),
    y: ValueRange::new(0.0, 0.0),
};
pub const BLAST_RANDOM_OFFSET: OffsetRanges = OffsetRanges {
    x: ValueRange::new(-50.0, 50.0),
    y: ValueRange::new(0.0, 150.0),
};
pub const CONTINUOUS_RANDOM_SPEED: ValueRange = ValueRange::new(1.0, 1.5);
pub const CONTINUOUS_RANDOM_OFFSET: OffsetRanges = OffsetRanges {
    x: ValueRange::new(-50.0, 50.0),
    y: ValueRange::new(0.0, 150.0),
};

// ============================================================================
// Value types
// ============================================================================

/// Base flake size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlakeSize {
    pub width: f32,
    pub height: f32,
}

impl FlakeSize {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// RGBA palette color, written as `#RRGGBB` or `#RRGGBBAA` in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color(pub [u8; 4]);

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color([r, g, b, 255])
    }

    /// Parse a `#RRGGBB` or `#RRGGBBAA` string.
    pub fn from_hex(hex: &str) -> Result<Self, ConfigError> {
        let invalid = || ConfigError::InvalidColor(hex.to_string());
        let digits = hex.strip_prefix('#').ok_or_else(invalid)?;
        if !matches!(digits.len(), 6 | 8) || !digits.is_ascii() {
            return Err(invalid());
        }
        let mut rgba = [255u8; 4];
        for (slot, chunk) in rgba.iter_mut().zip(digits.as_bytes().chunks(2)) {
            let pair = std::str::from_utf8(chunk).map_err(|_| invalid())?;
            *slot = u8::from_str_radix(pair, 16).map_err(|_| invalid())?;
        }
        Ok(Color(rgba))
    }
}

impl TryFrom<String> for Color {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Color::from_hex(&value)
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b, a] = self.0;
        if a == 255 {
            write!(f, "#{r:02X}{g:02X}{b:02X}")
        } else {
            write!(f, "#{r:02X}{g:02X}{b:02X}{a:02X}")
        }
    }
}

/// Fully resolved `[min, max]` sampling range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    pub min: f32,
    pub max: f32,
}

impl ValueRange {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }
}

/// Partially specified range; missing bounds fall back to variant defaults.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RangeConfig {
    pub min: Option<f32>,
    pub max: Option<f32>,
}

impl RangeConfig {
    pub fn new(min: f32, max: f32) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }

    pub fn resolve(&self, default: ValueRange) -> ValueRange {
        ValueRange {
            min: self.min.unwrap_or(default.min),
            max: self.max.unwrap_or(default.max),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotationRanges {
    pub x: ValueRange,
    pub z: ValueRange,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OffsetRanges {
    pub x: ValueRange,
    pub y: ValueRange,
}

/// Per-axis rotation ranges in radians.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RotationConfig {
    pub x: RangeConfig,
    pub z: RangeConfig,
}

impl RotationConfig {
    pub fn resolve(&self, default: RotationRanges) -> RotationRanges {
        RotationRanges {
            x: self.x.resolve(default.x),
            z: self.z.resolve(default.z),
        }
    }
}

/// Static positional jitter ranges in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OffsetConfig {
    pub x: RangeConfig,
    pub y: RangeConfig,
}

impl OffsetConfig {
    pub fn resolve(&self, default: OffsetRanges) -> OffsetRanges {
        OffsetRanges {
            x: self.x.resolve(default.x),
            y: self.y.resolve(default.y),
        }
    }

    fn is_unset(&self) -> bool {
        *self == OffsetConfig::default()
    }
}

/// How each atlas tile is drawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FlakeTexture {
    /// Solid rounded rectangle in each palette color. Each size variant gets
    /// a corner radius sampled from `radius_range` (default
    /// `[0, max(width, height) / 2]`).
    Rect {
        #[serde(default)]
        radius_range: Option<ValueRange>,
    },
    /// Static raster image scaled into every tile; palette colors are ignored.
    Image { path: String },
    /// SVG document rasterized per size variant, optionally tinted with each
    /// palette color.
    Svg {
        path: String,
        #[serde(default)]
        tint: bool,
    },
}

impl Default for FlakeTexture {
    fn default() -> Self {
        FlakeTexture::Rect { radius_range: None }
    }
}

// ============================================================================
// Shared flake options
// ============================================================================

/// Options shared by every variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlakeOptions {
    /// Number of flakes.
    pub count: usize,
    pub flake_size: FlakeSize,
    /// Relative size spread in `[0, 1]`. Values outside are not rejected and
    /// produce inverted or negative tiles.
    pub size_variation: f32,
    pub colors: Vec<Color>,
    pub texture: FlakeTexture,
    /// Container size; defaults to [`DEFAULT_CONTAINER`].
    pub container: Option<Vec2>,
    #[serde(with = "millis")]
    pub fall_duration: Duration,
    #[serde(with = "millis")]
    pub blast_duration: Duration,
    pub fade_out_on_end: bool,
    pub rotation: RotationConfig,
    pub random_speed: RangeConfig,
    pub random_offset: OffsetConfig,
    /// Timing curve; defaults to [`Easing::EaseInOutQuad`].
    pub easing: Option<Easing>,
    /// Fixed random seed for reproducible runs.
    pub seed: Option<u64>,
}

impl Default for FlakeOptions {
    fn default() -> Self {
        Self {
            count: DEFAULT_FLAKE_COUNT,
            flake_size: DEFAULT_FLAKE_SIZE,
            size_variation: 0.0,
            colors: DEFAULT_COLORS
                .iter()
                .filter_map(|hex| Color::from_hex(hex).ok())
                .collect(),
            texture: FlakeTexture::default(),
            container: None,
            fall_duration: DEFAULT_FALL_DURATION,
            blast_duration: DEFAULT_BLAST_DURATION,
            fade_out_on_end: false,
            rotation: RotationConfig::default(),
            random_speed: RangeConfig::default(),
            random_offset: OffsetConfig::default(),
            easing: None,
            seed: None,
        }
    }
}

impl FlakeOptions {
    pub fn container_size(&self) -> Vec2 {
        self.container.unwrap_or(DEFAULT_CONTAINER)
    }

    pub fn easing(&self) -> Easing {
        self.easing.unwrap_or_default()
    }

    /// Number of atlas color rows. Image and untinted SVG flakes ignore the
    /// palette.
    pub fn color_rows(&self) -> usize {
        match self.texture {
            FlakeTexture::Image { .. } | FlakeTexture::Svg { tint: false, .. } => 1,
            _ => self.colors.len(),
        }
    }
}

macro_rules! flake_option_builders {
    ($ty:ty) => {
        impl $ty {
            /// Set the number of flakes.
            pub fn with_count(mut self, count: usize) -> Self {
                self.flakes.count = count;
                self
            }

            /// Set the base flake size in pixels.
            pub fn with_flake_size(mut self, width: f32, height: f32) -> Self {
                self.flakes.flake_size = FlakeSize::new(width, height);
                self
            }

            /// Set the relative size spread.
            pub fn with_size_variation(mut self, variation: f32) -> Self {
                self.flakes.size_variation = variation;
                self
            }

            /// Replace the palette.
            pub fn with_colors(mut self, colors: Vec<Color>) -> Self {
                self.flakes.colors = colors;
                self
            }

            /// Set the tile drawing mode.
            pub fn with_texture(mut self, texture: FlakeTexture) -> Self {
                self.flakes.texture = texture;
                self
            }

            /// Override the container size.
            pub fn with_container(mut self, width: f32, height: f32) -> Self {
                self.flakes.container = Some(Vec2::new(width, height));
                self
            }

            /// Set the fall phase duration.
            pub fn with_fall_duration(mut self, duration: Duration) -> Self {
                self.flakes.fall_duration = duration;
                self
            }

            /// Set the blast phase duration.
            pub fn with_blast_duration(mut self, duration: Duration) -> Self {
                self.flakes.blast_duration = duration;
                self
            }

            /// Fade flakes out towards the end of the fall.
            pub fn with_fade_out(mut self, fade: bool) -> Self {
                self.flakes.fade_out_on_end = fade;
                self
            }

            /// Set per-axis rotation ranges.
            pub fn with_rotation(mut self, rotation: RotationConfig) -> Self {
                self.flakes.rotation = rotation;
                self
            }

            /// Set the fall speed multiplier range.
            pub fn with_random_speed(mut self, min: f32, max: f32) -> Self {
                self.flakes.random_speed = RangeConfig::new(min, max);
                self
            }

            /// Set the static jitter ranges.
            pub fn with_random_offset(mut self, offset: OffsetConfig) -> Self {
                self.flakes.random_offset = offset;
                self
            }

            /// Set the timing curve.
            pub fn with_easing(mut self, easing: Easing) -> Self {
                self.flakes.easing = Some(easing);
                self
            }

            /// Use a fixed random seed.
            pub fn with_seed(mut self, seed: u64) -> Self {
                self.flakes.seed = Some(seed);
                self
            }

            /// Parse from a JSON document.
            pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
                Ok(serde_json::from_str(json)?)
            }

            /// Load from a JSON file.
            pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
                let json = std::fs::read_to_string(path)?;
                Self::from_json_str(&json)
            }
        }
    };
}

// ============================================================================
// Variant configs
// ============================================================================

/// Configuration for the fall / cannon variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfettiConfig {
    #[serde(flatten)]
    pub flakes: FlakeOptions,
    /// Approximate vertical gap between rows; lower is denser.
    pub vertical_spacing: f32,
    /// Start playing as soon as the controller is created.
    pub autoplay: bool,
    /// Loop forever; defaults to `autoplay`.
    pub is_infinite: Option<bool>,
    /// Points flakes blast out of before falling. Empty = plain fall.
    pub cannons_positions: Vec<Vec2>,
    #[serde(with = "millis")]
    pub auto_start_delay: Duration,
}

impl Default for ConfettiConfig {
    fn default() -> Self {
        Self {
            flakes: FlakeOptions::default(),
            vertical_spacing: DEFAULT_VERTICAL_SPACING,
            autoplay: true,
            is_infinite: None,
            cannons_positions: Vec::new(),
            auto_start_delay: Duration::ZERO,
        }
    }
}

flake_option_builders!(ConfettiConfig);

impl ConfettiConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_infinite(&self) -> bool {
        self.is_infinite.unwrap_or(self.autoplay)
    }

    pub fn with_vertical_spacing(mut self, spacing: f32) -> Self {
        self.vertical_spacing = spacing;
        self
    }

    pub fn with_autoplay(mut self, autoplay: bool) -> Self {
        self.autoplay = autoplay;
        self
    }

    pub fn with_infinite(mut self, infinite: bool) -> Self {
        self.is_infinite = Some(infinite);
        self
    }

    pub fn with_cannons(mut self, cannons: Vec<Vec2>) -> Self {
        self.cannons_positions = cannons;
        self
    }

    pub fn with_auto_start_delay(mut self, delay: Duration) -> Self {
        self.auto_start_delay = delay;
        self
    }

    pub fn rotation_ranges(&self) -> RotationRanges {
        self.flakes.rotation.resolve(FALL_ROTATION)
    }

    pub fn speed_range(&self) -> ValueRange {
        self.flakes.random_speed.resolve(DEFAULT_RANDOM_SPEED)
    }

    pub fn offset_ranges(&self) -> OffsetRanges {
        self.flakes.random_offset.resolve(FALL_RANDOM_OFFSET)
    }

    /// Settings for one lane of continuous mode: infinite, linear, and the
    /// continuous speed/offset defaults unless the caller set their own.
    pub fn continuous_lane(&self) -> Self {
        let mut lane = self.clone();
        lane.is_infinite = Some(true);
        lane.flakes.easing = Some(Easing::Linear);
        if self.flakes.random_speed == RangeConfig::default() {
            lane.flakes.random_speed =
                RangeConfig::new(CONTINUOUS_RANDOM_SPEED.min, CONTINUOUS_RANDOM_SPEED.max);
        }
        if self.flakes.random_offset.is_unset() {
            lane.flakes.random_offset = OffsetConfig {
                x: RangeConfig::new(CONTINUOUS_RANDOM_OFFSET.x.min, CONTINUOUS_RANDOM_OFFSET.x.max),
                y: RangeConfig::new(CONTINUOUS_RANDOM_OFFSET.y.min, CONTINUOUS_RANDOM_OFFSET.y.max),
            };
        }
        lane
    }
}

/// Configuration for the radial blast variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlastConfig {
    #[serde(flatten)]
    pub flakes: FlakeOptions,
    /// Blast center; defaults to `(container_width / 2, 150)`.
    pub blast_position: Option<Vec2>,
    pub blast_radius: f32,
    pub autoplay: bool,
    pub is_infinite: bool,
}

impl Default for BlastConfig {
    fn default() -> Self {
        Self {
            flakes: FlakeOptions::default(),
            blast_position: None,
            blast_radius: DEFAULT_BLAST_RADIUS,
            autoplay: false,
            is_infinite: false,
        }
    }
}

flake_option_builders!(BlastConfig);

impl BlastConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_blast_position(mut self, position: Vec2) -> Self {
        self.blast_position = Some(position);
        self
    }

    pub fn with_blast_radius(mut self, radius: f32) -> Self {
        self.blast_radius = radius;
        self
    }

    pub fn with_autoplay(mut self, autoplay: bool) -> Self {
        self.autoplay = autoplay;
        self
    }

    pub fn with_infinite(mut self, infinite: bool) -> Self {
        self.is_infinite = infinite;
        self
    }

    pub fn blast_center(&self) -> Vec2 {
        self.blast_position
            .unwrap_or_else(|| Vec2::new(self.flakes.container_size().x / 2.0, 150.0))
    }

    pub fn rotation_ranges(&self) -> RotationRanges {
        self.flakes.rotation.resolve(BLAST_ROTATION)
    }

    pub fn speed_range(&self) -> ValueRange {
        self.flakes.random_speed.resolve(DEFAULT_RANDOM_SPEED)
    }

    pub fn offset_ranges(&self) -> OffsetRanges {
        self.flakes.random_offset.resolve(BLAST_RANDOM_OFFSET)
    }
}

/// Durations are written as integer milliseconds.
mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_parse() {
        assert_eq!(Color::from_hex("#FF5733").unwrap(), Color([255, 87, 51, 255]));
        assert_eq!(Color::from_hex("#00000080").unwrap(), Color([0, 0, 0, 128]));
        assert!(Color::from_hex("FF5733").is_err());
        assert!(Color::from_hex("#FF57").is_err());
        assert!(Color::from_hex("#GG5733").is_err());
    }

    #[test]
    fn test_color_display_roundtrip() {
        assert_eq!(Color::rgb(255, 87, 51).to_string(), "#FF5733");
        assert_eq!(Color([1, 2, 3, 4]).to_string(), "#01020304");
    }

    #[test]
    fn test_defaults() {
        let config = ConfettiConfig::default();
        assert_eq!(config.flakes.count, 200);
        assert_eq!(config.flakes.colors.len(), 10);
        assert!(config.autoplay);
        assert!(config.is_infinite());
        assert_eq!(config.speed_range(), ValueRange::new(0.9, 1.3));
        assert_eq!(config.rotation_ranges(), FALL_ROTATION);
    }

    #[test]
    fn test_partial_json() {
        let config = ConfettiConfig::from_json_str(
            r##"{
                "count": 12,
                "colors": ["#FF0000", "#00FF00"],
                "fall_duration": 4000,
                "cannons_positions": [[-30.0, 800.0]],
                "rotation": { "x": { "min": 1.0 } }
            }"##,
        )
        .unwrap();
        assert_eq!(config.flakes.count, 12);
        assert_eq!(config.flakes.colors, vec![Color::rgb(255, 0, 0), Color::rgb(0, 255, 0)]);
        assert_eq!(config.flakes.fall_duration, Duration::from_millis(4000));
        assert_eq!(config.cannons_positions, vec![Vec2::new(-30.0, 800.0)]);
        let rotation = config.rotation_ranges();
        assert_eq!(rotation.x, ValueRange::new(1.0, FALL_ROTATION.x.max));
        assert_eq!(rotation.z, FALL_ROTATION.z);
        assert_eq!(config.vertical_spacing, DEFAULT_VERTICAL_SPACING);
    }

    #[test]
    fn test_invalid_color_rejected() {
        let err = ConfettiConfig::from_json_str(r#"{ "colors": ["red"] }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }

    #[test]
    fn test_texture_json() {
        let config = BlastConfig::from_json_str(
            r#"{ "texture": { "type": "svg", "path": "flake.svg", "tint": true } }"#,
        )
        .unwrap();
        assert_eq!(
            config.flakes.texture,
            FlakeTexture::Svg {
                path: "flake.svg".into(),
                tint: true
            }
        );
    }

    #[test]
    fn test_blast_center_default() {
        let config = BlastConfig::new().with_container(400.0, 800.0);
        assert_eq!(config.blast_center(), Vec2::new(200.0, 150.0));
        assert!(!config.is_infinite);
    }

    #[test]
    fn test_continuous_lane_defaults() {
        let lane = ConfettiConfig::new().continuous_lane();
        assert!(lane.is_infinite());
        assert_eq!(lane.flakes.easing(), Easing::Linear);
        assert_eq!(lane.speed_range(), CONTINUOUS_RANDOM_SPEED);
        assert_eq!(lane.offset_ranges(), CONTINUOUS_RANDOM_OFFSET);

        let custom = ConfettiConfig::new().with_random_speed(2.0, 2.0).continuous_lane();
        assert_eq!(custom.speed_range(), ValueRange::new(2.0, 2.0));
    }
}
