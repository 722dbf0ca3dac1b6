//! Live preview of the layer store over the reference image.

use egui::Vec2;
use image::RgbaImage;
use log::{debug, info};

use crate::document::Document;
use crate::geometry::{image_size, materialize_relative, resolve_absolute, sync_relative_from_absolute};
use crate::layer::LayerId;
use crate::renderer::Renderer;

/// Owns the reference raster and the preview surface.
///
/// Reference loads are numbered; a decode that finishes after a newer load
/// was started is discarded by [`PreviewDriver::accept_reference`].
#[derive(Debug, Default)]
pub struct PreviewDriver {
    reference: Option<RgbaImage>,
    generation: u64,
    surface: RgbaImage,
    dirty: bool,
}

impl PreviewDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reference(&self) -> Option<&RgbaImage> {
        self.reference.as_ref()
    }

    pub fn reference_size(&self) -> Option<Vec2> {
        self.reference.as_ref().map(image_size)
    }

    /// Start a new reference load and return its ticket.
    pub fn begin_reference_load(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    /// Install a decoded reference if `generation` is still the latest load.
    ///
    /// Relative layers get their pixel fields rewritten for the new size
    /// before anything is drawn.
    pub fn accept_reference(&mut self, generation: u64, raster: RgbaImage, document: &mut Document) -> bool {
        if generation != self.generation {
            debug!("Discarding superseded reference load {generation} (latest {})", self.generation);
            return false;
        }
        let size = image_size(&raster);
        info!("Reference image set: {}x{}", raster.width(), raster.height());
        materialize_relative(document, size);
        self.reference = Some(raster);
        self.dirty = true;
        true
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Re-render the preview: sync relative geometry, resolve, composite,
    /// then decorate. `None` without a reference image.
    pub fn render(
        &mut self,
        document: &mut Document,
        renderer: &Renderer,
        selection: Option<LayerId>,
    ) -> Option<&RgbaImage> {
        let reference = self.reference.as_ref()?;
        let size = image_size(reference);
        sync_relative_from_absolute(document, size);
        let layers = resolve_absolute(document, size);
        renderer.composite(&mut self.surface, reference, &layers);
        renderer.draw_decorations(&mut self.surface, &layers, selection);
        self.dirty = false;
        Some(&self.surface)
    }
}
