//! CPU compositing of resolved layers onto an RGBA surface.
//!
//! The same [`Renderer::composite`] pass feeds both the on-screen preview and
//! the batch export, so the two can never drift apart. Handle markers and
//! selection outlines come from the separate [`Renderer::draw_decorations`]
//! pass, which only the preview calls.

use egui::{Color32, Rect, Vec2};
use image::{Rgba, RgbaImage};
use tiny_skia::{BlendMode, ColorU8, FilterQuality, Paint, PathBuilder, Pixmap, PixmapPaint, Stroke, Transform};

use crate::fonts::{FontBook, TextMeasure};
use crate::geometry::{ResizeHandle, ResolvedFrame, ResolvedLayers, ResolvedLogo, ResolvedText, text_bounds};
use crate::layer::LayerId;

/// Colors and sizes of the preview-only decoration pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecorationStyle {
    pub handle_size: f32,
    pub handle_color: Color32,
    pub selection_color: Color32,
    pub selection_width: f32,
}

impl Default for DecorationStyle {
    fn default() -> Self {
        Self {
            handle_size: 8.0,
            handle_color: Color32::from_rgb(255, 107, 53),
            selection_color: Color32::from_rgb(30, 144, 255),
            selection_width: 2.0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Renderer {
    fonts: FontBook,
    style: DecorationStyle,
}

impl Renderer {
    pub fn new(fonts: FontBook) -> Self {
        Self {
            fonts,
            style: DecorationStyle::default(),
        }
    }

    pub fn with_style(mut self, style: DecorationStyle) -> Self {
        self.style = style;
        self
    }

    pub fn fonts(&self) -> &FontBook {
        &self.fonts
    }

    pub fn fonts_mut(&mut self) -> &mut FontBook {
        &mut self.fonts
    }

    pub fn style(&self) -> &DecorationStyle {
        &self.style
    }

    pub fn set_style(&mut self, style: DecorationStyle) {
        self.style = style;
    }

    /// Base image plus every layer, undecorated, as a new raster.
    pub fn render(&self, base: &RgbaImage, layers: &ResolvedLayers) -> RgbaImage {
        let mut surface = RgbaImage::new(base.width(), base.height());
        self.composite(&mut surface, base, layers);
        surface
    }

    /// Draw `base` filling the surface, then frames, logos and texts in store order.
    ///
    /// Only resolved pixel geometry is read here.
    pub fn composite(&self, surface: &mut RgbaImage, base: &RgbaImage, layers: &ResolvedLayers) {
        surface.clone_from(base);
        let has_shapes = !layers.frames.is_empty() || !layers.logos.is_empty();
        if let Some(mut pixmap) = has_shapes.then(|| to_pixmap(surface)).flatten() {
            for frame in &layers.frames {
                stroke_frame(&mut pixmap, frame);
            }
            for logo in &layers.logos {
                draw_logo(&mut pixmap, logo);
            }
            write_back(&pixmap, surface);
        }
        for text in &layers.texts {
            self.draw_text(surface, text);
        }
    }

    /// Preview-only pass: the eight handle markers of every frame and an
    /// outline around the selected layer.
    pub fn draw_decorations(&self, surface: &mut RgbaImage, layers: &ResolvedLayers, selection: Option<LayerId>) {
        let style = self.style;
        let Some(mut pixmap) = to_pixmap(surface) else {
            return;
        };
        for frame in &layers.frames {
            for handle in ResizeHandle::ALL {
                let marker = Rect::from_center_size(handle.anchor(frame.rect), Vec2::splat(style.handle_size));
                fill_rect(&mut pixmap, marker, style.handle_color);
            }
        }

        if let Some(bounds) = selection.and_then(|id| self.bounds_of(layers, id)) {
            stroke_rect(
                &mut pixmap,
                bounds.expand(style.selection_width),
                style.selection_width,
                style.selection_color,
                1.0,
            );
        }
        write_back(&pixmap, surface);
    }

    /// Pixel bounds of a resolved layer, text included
    pub fn bounds_of(&self, layers: &ResolvedLayers, id: LayerId) -> Option<Rect> {
        if let Some(frame) = layers.frames.iter().find(|f| f.id == id) {
            return Some(frame.rect.expand(frame.border_width / 2.0));
        }
        if let Some(logo) = layers.logos.iter().find(|l| l.id == id) {
            return Some(logo.rect);
        }
        layers.texts.iter().find(|t| t.id == id).map(|text| {
            let advance = self.fonts.advance_width(&text.text, &text.font_family, text.font_size);
            text_bounds(text.anchor, advance, text.font_size)
        })
    }

    fn draw_text(&self, surface: &mut RgbaImage, text: &ResolvedText) {
        let color = text.color;
        let opacity = text.opacity;
        self.fonts.rasterize(
            &text.text,
            &text.font_family,
            text.font_size,
            text.anchor,
            |x, y, coverage| plot(surface, x, y, color.to_srgba_unmultiplied(), coverage * opacity),
        );
    }
}

fn stroke_frame(pixmap: &mut Pixmap, frame: &ResolvedFrame) {
    stroke_rect(pixmap, frame.rect, frame.border_width, frame.border_color, frame.opacity);
}

/// Scale the native logo raster onto the surface. Only covered surface
/// pixels are touched, whatever the resolved size.
fn draw_logo(pixmap: &mut Pixmap, logo: &ResolvedLogo) {
    let rect = logo.rect;
    if !rect.is_finite() || rect.width() <= 0.0 || rect.height() <= 0.0 {
        return;
    }
    let raster = logo.asset.raster();
    let Some(source) = to_pixmap(raster) else {
        return;
    };

    let transform = Transform::from_row(
        rect.width() / raster.width() as f32,
        0.0,
        0.0,
        rect.height() / raster.height() as f32,
        rect.min.x.round(),
        rect.min.y.round(),
    );
    let paint = PixmapPaint {
        opacity: logo.opacity.clamp(0.0, 1.0),
        blend_mode: BlendMode::SourceOver,
        quality: FilterQuality::Bilinear,
    };
    pixmap.draw_pixmap(0, 0, source.as_ref(), &paint, transform, None);
}

/// Anti-aliased stroke centred on the edges of `rect`, interior untouched.
fn stroke_rect(pixmap: &mut Pixmap, rect: Rect, width: f32, color: Color32, opacity: f32) {
    if !(width > 0.0) || !rect.is_finite() {
        return;
    }
    let Some(bounds) = tiny_skia::Rect::from_ltrb(rect.min.x, rect.min.y, rect.max.x, rect.max.y) else {
        return;
    };
    let path = PathBuilder::from_rect(bounds);
    let stroke = Stroke {
        width,
        ..Stroke::default()
    };
    pixmap.stroke_path(&path, &solid(color, opacity), &stroke, Transform::identity(), None);
}

fn fill_rect(pixmap: &mut Pixmap, rect: Rect, color: Color32) {
    if let Some(bounds) = tiny_skia::Rect::from_ltrb(rect.min.x, rect.min.y, rect.max.x, rect.max.y) {
        pixmap.fill_rect(bounds, &solid(color, 1.0), Transform::identity(), None);
    }
}

fn solid(color: Color32, opacity: f32) -> Paint<'static> {
    let [r, g, b, a] = color.to_srgba_unmultiplied();
    let mut color = tiny_skia::Color::from_rgba8(r, g, b, a);
    color.apply_opacity(opacity.clamp(0.0, 1.0));

    let mut paint = Paint::default();
    paint.set_color(color);
    paint.anti_alias = true;
    paint
}

/// Premultiplied copy of `image`; `None` for an empty raster.
fn to_pixmap(image: &RgbaImage) -> Option<Pixmap> {
    let mut pixmap = Pixmap::new(image.width(), image.height())?;
    for (dst, src) in pixmap.pixels_mut().iter_mut().zip(image.pixels()) {
        let [r, g, b, a] = src.0;
        *dst = ColorU8::from_rgba(r, g, b, a).premultiply();
    }
    Some(pixmap)
}

/// Copy drawn pixels back. Untouched pixels keep their exact straight-alpha value.
fn write_back(pixmap: &Pixmap, image: &mut RgbaImage) {
    for (dst, src) in image.pixels_mut().zip(pixmap.pixels()) {
        let [r, g, b, a] = dst.0;
        if ColorU8::from_rgba(r, g, b, a).premultiply() == *src {
            continue;
        }
        let color = src.demultiply();
        *dst = Rgba([color.red(), color.green(), color.blue(), color.alpha()]);
    }
}

/// Source-over blend of `src` (straight alpha) scaled by `alpha`, clipped to the surface.
fn plot(surface: &mut RgbaImage, x: i64, y: i64, src: [u8; 4], alpha: f32) {
    if x < 0 || y < 0 || x >= surface.width() as i64 || y >= surface.height() as i64 {
        return;
    }
    blend_pixel(surface.get_pixel_mut(x as u32, y as u32), src, alpha);
}

fn blend_pixel(dst: &mut Rgba<u8>, src: [u8; 4], alpha: f32) {
    let sa = src[3] as f32 / 255.0 * alpha.clamp(0.0, 1.0);
    if sa <= 0.0 {
        return;
    }
    let da = dst[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    for i in 0..3 {
        let value = (src[i] as f32 * sa + dst[i] as f32 * da * (1.0 - sa)) / out_a;
        dst[i] = value.round().clamp(0.0, 255.0) as u8;
    }
    dst[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::LogoAsset;
    use egui::Pos2;

    const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

    fn near(pixel: &Rgba<u8>, expected: [u8; 4]) -> bool {
        pixel.0.iter().zip(expected).all(|(a, b)| a.abs_diff(b) <= 2)
    }

    fn white(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]))
    }

    fn frame(rect: Rect, border_width: f32, opacity: f32) -> ResolvedFrame {
        ResolvedFrame {
            id: LayerId::new(),
            rect,
            border_width,
            border_color: Color32::from_rgb(255, 0, 0),
            opacity,
        }
    }

    #[test]
    fn test_blend_opaque_and_half() {
        let mut px = Rgba([255, 255, 255, 255]);
        blend_pixel(&mut px, [0, 0, 0, 255], 1.0);
        assert_eq!(px, Rgba([0, 0, 0, 255]));

        let mut px = Rgba([255, 255, 255, 255]);
        blend_pixel(&mut px, [0, 0, 0, 255], 0.5);
        assert_eq!(px, Rgba([128, 128, 128, 255]));

        let mut px = Rgba([10, 20, 30, 255]);
        blend_pixel(&mut px, [0, 0, 0, 255], 0.0);
        assert_eq!(px, Rgba([10, 20, 30, 255]));
    }

    #[test]
    fn test_frame_stroke_leaves_interior() {
        let renderer = Renderer::default();
        let base = white(100, 100);
        let layers = ResolvedLayers {
            frames: vec![frame(Rect::from_min_size(Pos2::new(20.0, 20.0), Vec2::splat(60.0)), 4.0, 1.0)],
            ..Default::default()
        };
        let out = renderer.render(&base, &layers);
        assert_eq!(out.get_pixel(20, 50), &Rgba([255, 0, 0, 255]));
        assert_eq!(out.get_pixel(18, 50), &Rgba([255, 0, 0, 255]));
        assert_eq!(out.get_pixel(50, 50), &Rgba([255, 255, 255, 255]));
        assert_eq!(out.get_pixel(5, 5), &Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn test_logo_is_scaled_and_clipped() {
        let renderer = Renderer::default();
        let base = white(50, 50);
        let asset = LogoAsset::new(RgbaImage::from_pixel(2, 1, Rgba([0, 0, 255, 255])), Vec::new());
        let layers = ResolvedLayers {
            logos: vec![ResolvedLogo {
                id: LayerId::new(),
                rect: Rect::from_min_size(Pos2::new(-10.0, 40.0), Vec2::new(40.0, 20.0)),
                opacity: 1.0,
                asset,
            }],
            ..Default::default()
        };
        let out = renderer.render(&base, &layers);
        assert!(near(out.get_pixel(0, 45), [0, 0, 255, 255]));
        assert!(near(out.get_pixel(29, 49), [0, 0, 255, 255]));
        assert_eq!(out.get_pixel(31, 45), &WHITE);
        assert_eq!(out.get_pixel(10, 39), &WHITE);
    }

    #[test]
    fn test_hairline_frame_is_visible() {
        let renderer = Renderer::default();
        let base = white(100, 100);
        let layers = ResolvedLayers {
            frames: vec![frame(Rect::from_min_max(Pos2::new(5.0, 5.0), Pos2::new(95.0, 95.0)), 0.5, 1.0)],
            ..Default::default()
        };
        let out = renderer.render(&base, &layers);
        assert!((3..8).any(|x| out.get_pixel(x, 50) != &WHITE));
        assert!((93..98).any(|x| out.get_pixel(x, 50) != &WHITE));
        assert!((3..8).any(|y| out.get_pixel(50, y) != &WHITE));
        assert_eq!(out.get_pixel(50, 50), &WHITE);
    }

    #[test]
    fn test_oversized_logo_only_touches_surface() {
        let renderer = Renderer::default();
        let base = white(50, 50);
        let asset = LogoAsset::new(RgbaImage::from_pixel(2, 1, Rgba([0, 0, 255, 255])), Vec::new());
        let layers = ResolvedLayers {
            logos: vec![ResolvedLogo {
                id: LayerId::new(),
                rect: Rect::from_min_size(Pos2::new(10.0, 10.0), Vec2::new(80_000.0, 40_000.0)),
                opacity: 1.0,
                asset,
            }],
            ..Default::default()
        };
        let out = renderer.render(&base, &layers);
        assert_eq!(out.dimensions(), (50, 50));
        assert!(near(out.get_pixel(49, 49), [0, 0, 255, 255]));
        assert_eq!(out.get_pixel(5, 5), &WHITE);
    }

    #[test]
    fn test_translucent_base_survives_untouched() {
        let renderer = Renderer::default();
        let base = RgbaImage::from_pixel(40, 40, Rgba([200, 100, 50, 77]));
        let layers = ResolvedLayers {
            frames: vec![frame(Rect::from_min_size(Pos2::new(10.0, 10.0), Vec2::splat(20.0)), 2.0, 1.0)],
            ..Default::default()
        };
        let out = renderer.render(&base, &layers);
        assert_eq!(out.get_pixel(20, 20), &Rgba([200, 100, 50, 77]));
        assert_ne!(out.get_pixel(10, 20), &Rgba([200, 100, 50, 77]));
    }

    #[test]
    fn test_text_is_drawn_above_anchor() {
        let renderer = Renderer::default();
        let base = white(200, 80);
        let layers = ResolvedLayers {
            texts: vec![ResolvedText {
                id: LayerId::new(),
                anchor: Pos2::new(10.0, 60.0),
                text: "HELLO".to_owned(),
                font_size: 40.0,
                font_family: "Arial".to_owned(),
                color: Color32::BLACK,
                opacity: 1.0,
            }],
            ..Default::default()
        };
        let out = renderer.render(&base, &layers);
        let dark_above = (0..200).any(|x| (20..60).any(|y| out.get_pixel(x, y)[0] < 128));
        let dark_below = (0..200).any(|x| (61..80).any(|y| out.get_pixel(x, y)[0] < 128));
        assert!(dark_above);
        assert!(!dark_below);
    }

    #[test]
    fn test_decorations_only_when_asked() {
        let renderer = Renderer::default();
        let base = white(100, 100);
        let f = frame(Rect::from_min_size(Pos2::new(20.0, 20.0), Vec2::splat(60.0)), 1.0, 1.0);
        let id = f.id;
        let layers = ResolvedLayers {
            frames: vec![f],
            ..Default::default()
        };
        let plain = renderer.render(&base, &layers);
        let mut decorated = plain.clone();
        renderer.draw_decorations(&mut decorated, &layers, Some(id));

        let handle = renderer.style().handle_color.to_srgba_unmultiplied();
        // Centre of the "n" handle marker, inside the frame but off the stroke.
        assert_eq!(decorated.get_pixel(50, 22).0, handle);
        assert_eq!(plain.get_pixel(50, 22), &Rgba([255, 255, 255, 255]));
        assert_ne!(plain, decorated);
    }
}
