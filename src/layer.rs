use std::fmt;
use std::sync::Arc;

use egui::{Color32, Pos2, Rect, Vec2};
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::GeometryRejected;

/// Frames can never be resized to this size or below (pixels, both axes).
pub const MIN_LAYER_SIZE: f32 = 10.0;

/// A unique identifier for a layer, stable for the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerId(pub Uuid);

impl LayerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for LayerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which of the two geometries of a layer is authoritative
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionMode {
    /// Pixel fields are the ground truth
    Absolute,
    /// Percentages of the target image's size are the ground truth
    #[default]
    Relative,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerKind {
    Frame,
    Logo,
    Text,
}

impl LayerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LayerKind::Frame => "frame",
            LayerKind::Logo => "logo",
            LayerKind::Text => "text",
        }
    }
}

/// Rectangular outline stroked over the image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameLayer {
    pub id: LayerId,
    pub opacity: f32,
    pub position_mode: PositionMode,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub border_width: f32,
    #[serde(with = "hex_color")]
    pub border_color: Color32,
    pub rel_x: f32,
    pub rel_y: f32,
    pub rel_width: f32,
    pub rel_height: f32,
    pub rel_border_width: f32,
}

impl Default for FrameLayer {
    fn default() -> Self {
        Self {
            id: LayerId::new(),
            opacity: 1.0,
            position_mode: PositionMode::Relative,
            x: 50.0,
            y: 50.0,
            width: 300.0,
            height: 200.0,
            border_width: 5.0,
            border_color: Color32::BLACK,
            rel_x: 5.0,
            rel_y: 5.0,
            rel_width: 90.0,
            rel_height: 90.0,
            rel_border_width: 0.5,
        }
    }
}

impl FrameLayer {
    pub fn rect(&self) -> Rect {
        Rect::from_min_size(Pos2::new(self.x, self.y), Vec2::new(self.width, self.height))
    }

    /// Replace the pixel rectangle, refusing anything not larger than [`MIN_LAYER_SIZE`].
    pub fn set_rect(&mut self, rect: Rect) -> Result<(), GeometryRejected> {
        let (width, height) = (rect.width(), rect.height());
        if width <= MIN_LAYER_SIZE || height <= MIN_LAYER_SIZE {
            return Err(GeometryRejected { width, height });
        }
        self.x = rect.min.x;
        self.y = rect.min.y;
        self.width = width;
        self.height = height;
        Ok(())
    }
}

/// Decoded logo raster plus the bytes it was decoded from.
///
/// Shared between layers and never mutated; cloning only bumps reference counts.
#[derive(Clone)]
pub struct LogoAsset {
    raster: Arc<RgbaImage>,
    source: Arc<[u8]>,
}

impl LogoAsset {
    pub fn new(raster: RgbaImage, source: impl Into<Arc<[u8]>>) -> Self {
        Self {
            raster: Arc::new(raster),
            source: source.into(),
        }
    }

    pub fn raster(&self) -> &RgbaImage {
        &self.raster
    }

    /// The original encoded bytes, used when embedding the logo in a preset
    pub fn source(&self) -> &[u8] {
        &self.source
    }

    pub fn width(&self) -> u32 {
        self.raster.width()
    }

    pub fn height(&self) -> u32 {
        self.raster.height()
    }

    /// `height / width` of the native raster
    pub fn aspect_ratio(&self) -> f32 {
        if self.raster.width() == 0 {
            return 1.0;
        }
        self.raster.height() as f32 / self.raster.width() as f32
    }
}

impl PartialEq for LogoAsset {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.raster, &other.raster)
            || (self.raster.dimensions() == other.raster.dimensions()
                && self.raster.as_raw() == other.raster.as_raw())
    }
}

impl fmt::Debug for LogoAsset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogoAsset")
            .field("size", &self.raster.dimensions())
            .field("source_len", &self.source.len())
            .finish()
    }
}

/// Raster logo drawn at a given width; its height follows the asset's aspect ratio
#[derive(Debug, Clone, PartialEq)]
pub struct LogoLayer {
    pub id: LayerId,
    pub opacity: f32,
    pub position_mode: PositionMode,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    height: f32,
    pub rel_x: f32,
    pub rel_y: f32,
    pub rel_width: f32,
    asset: LogoAsset,
}

impl LogoLayer {
    pub fn new(asset: LogoAsset) -> Self {
        let width = 150.0;
        Self {
            id: LayerId::new(),
            opacity: 1.0,
            position_mode: PositionMode::Relative,
            x: 50.0,
            y: 50.0,
            width,
            height: width * asset.aspect_ratio(),
            rel_x: 5.0,
            rel_y: 5.0,
            rel_width: 15.0,
            asset,
        }
    }

    pub fn asset(&self) -> &LogoAsset {
        &self.asset
    }

    /// Cached pixel height, always `width * aspect`
    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn set_width(&mut self, width: f32) {
        self.width = width;
        self.height = width * self.asset.aspect_ratio();
    }

    pub fn rect(&self) -> Rect {
        Rect::from_min_size(Pos2::new(self.x, self.y), Vec2::new(self.width, self.height))
    }
}

/// Single-line text drawn with a baseline-left anchor at (`x`, `y`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextLayer {
    pub id: LayerId,
    pub opacity: f32,
    pub position_mode: PositionMode,
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub font_size: f32,
    pub font_family: String,
    #[serde(with = "hex_color")]
    pub color: Color32,
    pub rel_x: f32,
    pub rel_y: f32,
    pub rel_font_size: f32,
}

impl Default for TextLayer {
    fn default() -> Self {
        Self {
            id: LayerId::new(),
            opacity: 1.0,
            position_mode: PositionMode::Relative,
            text: "Sample Text".to_owned(),
            x: 100.0,
            y: 100.0,
            font_size: 48.0,
            font_family: "Arial".to_owned(),
            color: Color32::BLACK,
            rel_x: 50.0,
            rel_y: 50.0,
            rel_font_size: 5.0,
        }
    }
}

impl TextLayer {
    pub fn anchor(&self) -> Pos2 {
        Pos2::new(self.x, self.y)
    }
}

/// Colors are stored as `#rrggbb` (or `#rrggbbaa` when translucent) in presets.
pub mod hex_color {
    use egui::Color32;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn to_hex(color: Color32) -> String {
        let [r, g, b, a] = color.to_srgba_unmultiplied();
        if a == 255 {
            format!("#{r:02x}{g:02x}{b:02x}")
        } else {
            format!("#{r:02x}{g:02x}{b:02x}{a:02x}")
        }
    }

    pub fn parse(s: &str) -> Option<Color32> {
        let hex = s.trim().strip_prefix('#')?;
        let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
        let short = |i: usize| {
            let c = u8::from_str_radix(hex.get(i..i + 1)?, 16).ok()?;
            Some(c * 17)
        };
        match hex.len() {
            3 => Some(Color32::from_rgb(short(0)?, short(1)?, short(2)?)),
            6 => Some(Color32::from_rgb(channel(0)?, channel(2)?, channel(4)?)),
            8 => Some(Color32::from_rgba_unmultiplied(
                channel(0)?,
                channel(2)?,
                channel(4)?,
                channel(6)?,
            )),
            _ => None,
        }
    }

    pub fn serialize<S: Serializer>(color: &Color32, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&to_hex(*color))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Color32, D::Error> {
        let s = String::deserialize(deserializer)?;
        parse(&s).ok_or_else(|| serde::de::Error::custom(format!("invalid color: {s}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asset(width: u32, height: u32) -> LogoAsset {
        LogoAsset::new(RgbaImage::new(width, height), Vec::new())
    }

    #[test]
    fn test_logo_height_follows_aspect() {
        let mut logo = LogoLayer::new(asset(200, 100));
        assert_eq!(logo.height(), 75.0);

        logo.set_width(40.0);
        assert_eq!(logo.height(), 20.0);
    }

    #[test]
    fn test_frame_set_rect_rejects_small_sizes() {
        let mut frame = FrameLayer::default();
        let before = frame.rect();

        let err = frame
            .set_rect(Rect::from_min_size(Pos2::ZERO, Vec2::new(10.0, 50.0)))
            .unwrap_err();
        assert_eq!(err.width, 10.0);
        assert_eq!(frame.rect(), before);

        frame
            .set_rect(Rect::from_min_size(Pos2::new(1.0, 2.0), Vec2::new(10.5, 11.0)))
            .unwrap();
        assert_eq!(frame.rect().min, Pos2::new(1.0, 2.0));
    }

    #[test]
    fn test_hex_color_parsing() {
        assert_eq!(hex_color::parse("#ff0000"), Some(Color32::from_rgb(255, 0, 0)));
        assert_eq!(hex_color::parse("#fff"), Some(Color32::WHITE));
        assert_eq!(hex_color::parse("00ff00"), None);
        assert_eq!(hex_color::to_hex(Color32::from_rgb(255, 107, 53)), "#ff6b35");
    }
}
