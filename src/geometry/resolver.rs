//! Conversion between pixel-absolute and image-relative layer geometry.
//!
//! Relative values are percentages: `x`, widths, border widths and font sizes
//! are relative to the reference width, `y` and frame heights to the
//! reference height. Everything here is pure except the explicit
//! [`sync_relative_from_absolute`] and [`materialize_relative`] passes.

use egui::{Color32, Pos2, Rect, Vec2};
use image::RgbaImage;
use log::{debug, warn};

use crate::document::Document;
use crate::layer::{FrameLayer, LayerId, LogoAsset, LogoLayer, PositionMode, TextLayer};

/// Size of a raster as a reference for resolution
pub fn image_size(image: &RgbaImage) -> Vec2 {
    Vec2::new(image.width() as f32, image.height() as f32)
}

fn from_percent(percent: f32, total: f32) -> f32 {
    percent / 100.0 * total
}

fn to_percent(value: f32, total: f32) -> f32 {
    value / total * 100.0
}

fn is_degenerate(reference: Vec2) -> bool {
    !(reference.x > 0.0 && reference.y > 0.0)
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedFrame {
    pub id: LayerId,
    pub rect: Rect,
    pub border_width: f32,
    pub border_color: Color32,
    pub opacity: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedLogo {
    pub id: LayerId,
    pub rect: Rect,
    pub opacity: f32,
    pub asset: LogoAsset,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedText {
    pub id: LayerId,
    /// Baseline-left anchor
    pub anchor: Pos2,
    pub text: String,
    pub font_size: f32,
    pub font_family: String,
    pub color: Color32,
    pub opacity: f32,
}

/// Pixel geometry of every layer for one target image, in draw order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedLayers {
    pub frames: Vec<ResolvedFrame>,
    pub logos: Vec<ResolvedLogo>,
    pub texts: Vec<ResolvedText>,
}

/// A layer with both a pixel and a relative geometry
pub trait Resolve {
    type Resolved;

    /// Pixel geometry for a target of size `reference`, from whichever
    /// geometry the position mode selects.
    fn resolve(&self, reference: Vec2) -> Self::Resolved;

    /// Recompute the relative fields from the current pixel fields.
    fn sync_relative(&mut self, reference: Vec2);

    /// Overwrite the pixel fields with the relative geometry resolved against
    /// `reference`. No-op for absolute layers.
    fn materialize(&mut self, reference: Vec2);
}

impl Resolve for FrameLayer {
    type Resolved = ResolvedFrame;

    fn resolve(&self, reference: Vec2) -> ResolvedFrame {
        let (rect, border_width) = match self.position_mode {
            PositionMode::Absolute => (self.rect(), self.border_width),
            PositionMode::Relative => (
                Rect::from_min_size(
                    Pos2::new(
                        from_percent(self.rel_x, reference.x),
                        from_percent(self.rel_y, reference.y),
                    ),
                    Vec2::new(
                        from_percent(self.rel_width, reference.x),
                        from_percent(self.rel_height, reference.y),
                    ),
                ),
                from_percent(self.rel_border_width, reference.x),
            ),
        };
        ResolvedFrame {
            id: self.id,
            rect,
            border_width,
            border_color: self.border_color,
            opacity: self.opacity,
        }
    }

    fn sync_relative(&mut self, reference: Vec2) {
        self.rel_x = to_percent(self.x, reference.x);
        self.rel_y = to_percent(self.y, reference.y);
        self.rel_width = to_percent(self.width, reference.x);
        self.rel_height = to_percent(self.height, reference.y);
        self.rel_border_width = to_percent(self.border_width, reference.x);
    }

    fn materialize(&mut self, reference: Vec2) {
        if self.position_mode == PositionMode::Relative {
            let resolved = self.resolve(reference);
            self.x = resolved.rect.min.x;
            self.y = resolved.rect.min.y;
            self.width = resolved.rect.width();
            self.height = resolved.rect.height();
            self.border_width = resolved.border_width;
        }
    }
}

impl Resolve for LogoLayer {
    type Resolved = ResolvedLogo;

    fn resolve(&self, reference: Vec2) -> ResolvedLogo {
        let rect = match self.position_mode {
            PositionMode::Absolute => self.rect(),
            PositionMode::Relative => {
                let width = from_percent(self.rel_width, reference.x);
                Rect::from_min_size(
                    Pos2::new(
                        from_percent(self.rel_x, reference.x),
                        from_percent(self.rel_y, reference.y),
                    ),
                    Vec2::new(width, width * self.asset().aspect_ratio()),
                )
            }
        };
        ResolvedLogo {
            id: self.id,
            rect,
            opacity: self.opacity,
            asset: self.asset().clone(),
        }
    }

    fn sync_relative(&mut self, reference: Vec2) {
        self.rel_x = to_percent(self.x, reference.x);
        self.rel_y = to_percent(self.y, reference.y);
        self.rel_width = to_percent(self.width, reference.x);
    }

    fn materialize(&mut self, reference: Vec2) {
        if self.position_mode == PositionMode::Relative {
            let resolved = self.resolve(reference);
            self.x = resolved.rect.min.x;
            self.y = resolved.rect.min.y;
            self.set_width(resolved.rect.width());
        }
    }
}

impl Resolve for TextLayer {
    type Resolved = ResolvedText;

    fn resolve(&self, reference: Vec2) -> ResolvedText {
        let (anchor, font_size) = match self.position_mode {
            PositionMode::Absolute => (self.anchor(), self.font_size),
            PositionMode::Relative => (
                Pos2::new(
                    from_percent(self.rel_x, reference.x),
                    from_percent(self.rel_y, reference.y),
                ),
                from_percent(self.rel_font_size, reference.x),
            ),
        };
        ResolvedText {
            id: self.id,
            anchor,
            text: self.text.clone(),
            font_size,
            font_family: self.font_family.clone(),
            color: self.color,
            opacity: self.opacity,
        }
    }

    fn sync_relative(&mut self, reference: Vec2) {
        self.rel_x = to_percent(self.x, reference.x);
        self.rel_y = to_percent(self.y, reference.y);
        self.rel_font_size = to_percent(self.font_size, reference.x);
    }

    fn materialize(&mut self, reference: Vec2) {
        if self.position_mode == PositionMode::Relative {
            let resolved = self.resolve(reference);
            self.x = resolved.anchor.x;
            self.y = resolved.anchor.y;
            self.font_size = resolved.font_size;
        }
    }
}

/// Resolve every layer of `document` against a target of size `reference`.
pub fn resolve_absolute(document: &Document, reference: Vec2) -> ResolvedLayers {
    ResolvedLayers {
        frames: document.frames().iter().map(|f| f.resolve(reference)).collect(),
        logos: document.logos().iter().map(|l| l.resolve(reference)).collect(),
        texts: document.texts().iter().map(|t| t.resolve(reference)).collect(),
    }
}

/// Recompute the relative fields of every layer, whatever its mode, from its
/// pixel fields. Returns false (and leaves the document untouched) for an
/// empty reference.
pub fn sync_relative_from_absolute(document: &mut Document, reference: Vec2) -> bool {
    if is_degenerate(reference) {
        warn!("Skipping relative sync against empty reference {:?}", reference);
        return false;
    }
    document.frames_mut().iter_mut().for_each(|f| f.sync_relative(reference));
    document.logos_mut().iter_mut().for_each(|l| l.sync_relative(reference));
    document.texts_mut().iter_mut().for_each(|t| t.sync_relative(reference));
    debug!("Synced {} layers against {}x{}", document.len(), reference.x, reference.y);
    true
}

/// Write the resolved geometry of every relative layer into its pixel fields.
pub fn materialize_relative(document: &mut Document, reference: Vec2) -> bool {
    if is_degenerate(reference) {
        warn!("Skipping materialize against empty reference {:?}", reference);
        return false;
    }
    document.frames_mut().iter_mut().for_each(|f| f.materialize(reference));
    document.logos_mut().iter_mut().for_each(|l| l.materialize(reference));
    document.texts_mut().iter_mut().for_each(|t| t.materialize(reference));
    true
}
