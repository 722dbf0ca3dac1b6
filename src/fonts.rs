use std::collections::HashMap;
use std::fmt;

use ab_glyph::{Font, FontArc, GlyphId, PxScale, ScaleFont, point};
use egui::Pos2;
use log::debug;

use crate::error::FontError;

/// Family names that map onto the bundled monospace face
const MONOSPACE_FAMILIES: &[&str] = &["monospace", "courier", "courier new", "consolas", "monaco", "menlo"];

/// Measures the advance width of a single line of text.
///
/// Hit-testing text layers only needs this, not full rasterization.
pub trait TextMeasure {
    fn advance_width(&self, text: &str, family: &str, font_size: f32) -> f32;
}

/// Font lookup for text layers.
///
/// Ships with the two faces egui embeds (proportional and monospace); any
/// other family can be registered from font bytes. Unknown families fall
/// back to the proportional face, so rendering never fails on a missing font.
#[derive(Clone)]
pub struct FontBook {
    proportional: FontArc,
    monospace: FontArc,
    families: HashMap<String, FontArc>,
}

impl fmt::Debug for FontBook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FontBook")
            .field("families", &self.families.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl Default for FontBook {
    fn default() -> Self {
        Self::new()
    }
}

impl FontBook {
    pub fn new() -> Self {
        let proportional = FontArc::try_from_slice(epaint_default_fonts::UBUNTU_LIGHT)
            .expect("bundled proportional font is valid");
        let monospace = FontArc::try_from_slice(epaint_default_fonts::HACK_REGULAR)
            .expect("bundled monospace font is valid");
        Self {
            proportional,
            monospace,
            families: HashMap::new(),
        }
    }

    /// Make `family` resolve to the font in `data` (TTF/OTF bytes).
    pub fn register(&mut self, family: &str, data: Vec<u8>) -> Result<(), FontError> {
        let font = FontArc::try_from_vec(data).map_err(|_| FontError {
            family: family.to_owned(),
        })?;
        debug!("Registered font family {family}");
        self.families.insert(family.trim().to_lowercase(), font);
        Ok(())
    }

    /// Resolve a CSS-like family list ("Arial, sans-serif") to a font.
    pub fn font(&self, family: &str) -> &FontArc {
        for name in family.split(',') {
            let name = name.trim().trim_matches(|c| c == '"' || c == '\'').to_lowercase();
            if let Some(font) = self.families.get(&name) {
                return font;
            }
            if MONOSPACE_FAMILIES.contains(&name.as_str()) {
                return &self.monospace;
            }
        }
        &self.proportional
    }

    /// Visit every covered pixel of `text` drawn with its baseline-left corner
    /// at `anchor`. `plot` receives pixel coordinates and coverage in [0, 1].
    pub fn rasterize(
        &self,
        text: &str,
        family: &str,
        font_size: f32,
        anchor: Pos2,
        mut plot: impl FnMut(i64, i64, f32),
    ) {
        if !(font_size > 0.0) || text.is_empty() {
            return;
        }
        let font = self.font(family);
        let scale = PxScale::from(font_size);
        let scaled = font.as_scaled(scale);

        let mut caret = anchor.x;
        let mut previous: Option<GlyphId> = None;
        for ch in text.chars() {
            let id = font.glyph_id(ch);
            if let Some(prev) = previous {
                caret += scaled.kern(prev, id);
            }
            let glyph = id.with_scale_and_position(scale, point(caret, anchor.y));
            if let Some(outlined) = font.outline_glyph(glyph) {
                let bounds = outlined.px_bounds();
                let (left, top) = (bounds.min.x as i64, bounds.min.y as i64);
                outlined.draw(|x, y, coverage| {
                    if coverage > 0.0 {
                        plot(left + x as i64, top + y as i64, coverage.min(1.0));
                    }
                });
            }
            caret += scaled.h_advance(id);
            previous = Some(id);
        }
    }
}

impl TextMeasure for FontBook {
    fn advance_width(&self, text: &str, family: &str, font_size: f32) -> f32 {
        if !(font_size > 0.0) {
            return 0.0;
        }
        let font = self.font(family);
        let scaled = font.as_scaled(PxScale::from(font_size));
        let mut width = 0.0;
        let mut previous: Option<GlyphId> = None;
        for ch in text.chars() {
            let id = font.glyph_id(ch);
            if let Some(prev) = previous {
                width += scaled.kern(prev, id);
            }
            width += scaled.h_advance(id);
            previous = Some(id);
        }
        width
    }
}
