//! The editor controller.
//!
//! `EditorContext` is the one place application state lives: the layer
//! store, the pointer state machine, the preview driver, the source image
//! set and the renderer. Shell code never touches a layer directly; it goes
//! through the operations here, which keep the two geometries of every
//! layer consistent with the reference image.

use egui::{CursorIcon, Pos2};
use image::RgbaImage;
use log::{debug, info, warn};

use crate::codec::DecodedImage;
use crate::config::EditorConfig;
use crate::document::Document;
use crate::error::{FontError, ValidationError};
use crate::export::{ExportJob, SourceImage};
use crate::geometry::{Resolve, materialize_relative, sync_relative_from_absolute};
use crate::layer::{FrameLayer, LayerId, LayerKind, LogoAsset, LogoLayer, PositionMode, TextLayer};
use crate::preset::{LogoRecord, Preset};
use crate::preview::PreviewDriver;
use crate::renderer::Renderer;
use crate::tools::{PointerOutcome, SelectionTool};

#[derive(Debug)]
pub struct EditorContext {
    document: Document,
    selection: SelectionTool,
    preview: PreviewDriver,
    sources: Vec<SourceImage>,
    renderer: Renderer,
    /// Bumped on every preset load; logo decodes from older loads are dropped
    preset_generation: u64,
}

impl Default for EditorContext {
    fn default() -> Self {
        Self::new(&EditorConfig::default())
    }
}

impl EditorContext {
    pub fn new(config: &EditorConfig) -> Self {
        Self {
            document: Document::new(),
            selection: SelectionTool::with_tolerance(config.handle_tolerance),
            preview: PreviewDriver::new(),
            sources: Vec::new(),
            renderer: Renderer::default().with_style(config.decoration_style()),
            preset_generation: 0,
        }
    }

    pub fn apply_config(&mut self, config: &EditorConfig) {
        self.selection.set_handle_tolerance(config.handle_tolerance);
        self.renderer.set_style(config.decoration_style());
        self.preview.mark_dirty();
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn selection(&self) -> &SelectionTool {
        &self.selection
    }

    pub fn selected(&self) -> Option<LayerId> {
        self.selection.selected()
    }

    pub fn select(&mut self, id: Option<LayerId>) {
        self.selection.set_selected(id);
        self.preview.mark_dirty();
    }

    pub fn preview(&self) -> &PreviewDriver {
        &self.preview
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    /// Make text layers naming `family` draw with the given font file.
    pub fn register_font(&mut self, family: &str, data: Vec<u8>) -> Result<(), FontError> {
        self.renderer.fonts_mut().register(family, data)?;
        info!("Font family {family} available");
        self.preview.mark_dirty();
        Ok(())
    }

    pub fn sources(&self) -> &[SourceImage] {
        &self.sources
    }

    // Layers

    pub fn add_frame(&mut self) -> LayerId {
        let mut frame = FrameLayer::default();
        if let Some(size) = self.preview.reference_size() {
            frame.materialize(size);
        }
        let id = self.document.add_frame(frame);
        self.added(LayerKind::Frame, id)
    }

    pub fn add_text(&mut self) -> LayerId {
        let mut text = TextLayer::default();
        if let Some(size) = self.preview.reference_size() {
            text.materialize(size);
        }
        let id = self.document.add_text(text);
        self.added(LayerKind::Text, id)
    }

    pub fn add_logo(&mut self, asset: LogoAsset) -> LayerId {
        let mut logo = LogoLayer::new(asset);
        if let Some(size) = self.preview.reference_size() {
            logo.materialize(size);
        }
        let id = self.document.add_logo(logo);
        self.added(LayerKind::Logo, id)
    }

    fn added(&mut self, kind: LayerKind, id: LayerId) -> LayerId {
        info!("Added {} layer {id}", kind.as_str());
        self.preview.mark_dirty();
        id
    }

    /// Edit a frame from the controls. Pixel fields are what the controls
    /// change; the relative fields catch up on the next render.
    pub fn update_frame(&mut self, id: LayerId, update: impl FnOnce(&mut FrameLayer)) -> bool {
        let changed = self.document.update_frame(id, update);
        self.touched(changed)
    }

    pub fn update_logo(&mut self, id: LayerId, update: impl FnOnce(&mut LogoLayer)) -> bool {
        let changed = self.document.update_logo(id, |logo| {
            update(logo);
            logo.set_width(logo.width);
        });
        self.touched(changed)
    }

    pub fn update_text(&mut self, id: LayerId, update: impl FnOnce(&mut TextLayer)) -> bool {
        let changed = self.document.update_text(id, update);
        self.touched(changed)
    }

    /// Switch a layer's authoritative geometry without moving it on screen.
    pub fn set_position_mode(&mut self, id: LayerId, mode: PositionMode) -> bool {
        let reference = self.preview.reference_size();
        let changed = match self.document.kind_of(id) {
            Some(LayerKind::Frame) => self.document.update_frame(id, |f| {
                if let Some(size) = reference {
                    f.sync_relative(size);
                }
                f.position_mode = mode;
            }),
            Some(LayerKind::Logo) => self.document.update_logo(id, |l| {
                if let Some(size) = reference {
                    l.sync_relative(size);
                }
                l.position_mode = mode;
            }),
            Some(LayerKind::Text) => self.document.update_text(id, |t| {
                if let Some(size) = reference {
                    t.sync_relative(size);
                }
                t.position_mode = mode;
            }),
            None => false,
        };
        self.touched(changed)
    }

    pub fn remove(&mut self, id: LayerId) -> Option<LayerKind> {
        let kind = self.document.remove(id)?;
        if self.selection.selected() == Some(id) {
            self.selection.set_selected(None);
        }
        if self.selection.session().is_some_and(|s| s.layer_id == id) {
            self.selection.on_pointer_leave();
        }
        info!("Removed {} layer {id}", kind.as_str());
        self.preview.mark_dirty();
        Some(kind)
    }

    fn touched(&mut self, changed: bool) -> bool {
        if changed {
            self.preview.mark_dirty();
        }
        changed
    }

    // Pointer, in reference image pixels

    pub fn pointer_down(&mut self, pos: Pos2) -> bool {
        let before = self.selection.selected();
        let hit = self.selection.on_pointer_down(pos, &self.document, self.renderer.fonts());
        if hit.is_some() || before != self.selection.selected() {
            self.preview.mark_dirty();
        }
        hit.is_some()
    }

    pub fn pointer_move(&mut self, pos: Pos2) -> PointerOutcome {
        let outcome = self.selection.on_pointer_move(pos, &mut self.document);
        if outcome.changed_geometry() {
            self.preview.mark_dirty();
        }
        outcome
    }

    pub fn pointer_up(&mut self) {
        self.selection.on_pointer_up();
    }

    pub fn pointer_leave(&mut self) {
        self.selection.on_pointer_leave();
    }

    pub fn cursor(&self) -> CursorIcon {
        self.selection.cursor()
    }

    // Reference image and preview

    pub fn begin_reference_load(&mut self) -> u64 {
        self.preview.begin_reference_load()
    }

    /// Install a decoded reference image; stale loads are ignored.
    pub fn set_reference(&mut self, generation: u64, image: DecodedImage) -> bool {
        self.preview.accept_reference(generation, image.raster, &mut self.document)
    }

    pub fn needs_render(&self) -> bool {
        self.preview.is_dirty()
    }

    pub fn render_preview(&mut self) -> Option<&RgbaImage> {
        let selection = self.selection.selected();
        self.preview.render(&mut self.document, &self.renderer, selection)
    }

    // Sources and export

    pub fn add_source(&mut self, source: SourceImage) {
        debug!("Queued source image {}", source.name);
        self.sources.push(source);
    }

    pub fn clear_sources(&mut self) {
        self.sources.clear();
    }

    /// Snapshot everything an export needs. Relative geometry is synced
    /// against the reference first so that drags made since the last
    /// render are included.
    pub fn prepare_export(&mut self) -> Result<ExportJob, ValidationError> {
        if self.sources.is_empty() {
            warn!("Export requested without source images");
            return Err(ValidationError::NoSourceImages);
        }
        if self.document.is_empty() {
            warn!("Export requested without layers");
            return Err(ValidationError::NoLayers);
        }
        if let Some(size) = self.preview.reference_size() {
            sync_relative_from_absolute(&mut self.document, size);
        }
        Ok(ExportJob {
            document: self.document.clone(),
            sources: self.sources.clone(),
            renderer: self.renderer.clone(),
        })
    }

    // Presets

    /// Replace the layer store with a preset's frames and texts. The
    /// returned logo records still need decoding; hand each result to
    /// [`EditorContext::push_logo`] with the returned generation.
    pub fn apply_preset(&mut self, preset: Preset) -> (u64, Vec<LogoRecord>) {
        info!("Applying preset {}", preset.name);
        let (mut document, records) = preset.split();
        if let Some(size) = self.preview.reference_size() {
            materialize_relative(&mut document, size);
        }
        self.selection.on_pointer_leave();
        self.selection.set_selected(None);
        self.document.replace(document);
        self.preset_generation += 1;
        self.preview.mark_dirty();
        (self.preset_generation, records)
    }

    /// Append a decoded preset logo unless a newer preset replaced the store.
    pub fn push_logo(&mut self, generation: u64, mut logo: LogoLayer) -> bool {
        if generation != self.preset_generation {
            debug!("Dropping logo {} from superseded preset", logo.id);
            return false;
        }
        if let Some(size) = self.preview.reference_size() {
            logo.materialize(size);
        }
        self.document.add_logo(logo);
        self.preview.mark_dirty();
        true
    }
}
