use crate::layer::{FrameLayer, LayerId, LayerKind, LogoLayer, TextLayer};

/// The layer store: three ordered sequences, drawn frames -> logos -> texts.
///
/// Position within a sequence is the z-order for that type. Layers are only
/// ever appended, mutated in place or removed, never reordered.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    frames: Vec<FrameLayer>,
    logos: Vec<LogoLayer>,
    texts: Vec<TextLayer>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_parts(frames: Vec<FrameLayer>, logos: Vec<LogoLayer>, texts: Vec<TextLayer>) -> Self {
        Self {
            frames,
            logos,
            texts,
        }
    }

    pub fn frames(&self) -> &[FrameLayer] {
        &self.frames
    }

    pub fn logos(&self) -> &[LogoLayer] {
        &self.logos
    }

    pub fn texts(&self) -> &[TextLayer] {
        &self.texts
    }

    pub(crate) fn frames_mut(&mut self) -> &mut [FrameLayer] {
        &mut self.frames
    }

    pub(crate) fn logos_mut(&mut self) -> &mut [LogoLayer] {
        &mut self.logos
    }

    pub(crate) fn texts_mut(&mut self) -> &mut [TextLayer] {
        &mut self.texts
    }

    pub fn len(&self) -> usize {
        self.frames.len() + self.logos.len() + self.texts.len()
    }

    /// True when there is no layer of any kind
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn add_frame(&mut self, frame: FrameLayer) -> LayerId {
        let id = frame.id;
        self.frames.push(frame);
        id
    }

    pub fn add_logo(&mut self, logo: LogoLayer) -> LayerId {
        let id = logo.id;
        self.logos.push(logo);
        id
    }

    pub fn add_text(&mut self, text: TextLayer) -> LayerId {
        let id = text.id;
        self.texts.push(text);
        id
    }

    pub fn frame(&self, id: LayerId) -> Option<&FrameLayer> {
        self.frames.iter().find(|f| f.id == id)
    }

    pub fn frame_mut(&mut self, id: LayerId) -> Option<&mut FrameLayer> {
        self.frames.iter_mut().find(|f| f.id == id)
    }

    pub fn logo(&self, id: LayerId) -> Option<&LogoLayer> {
        self.logos.iter().find(|l| l.id == id)
    }

    pub fn logo_mut(&mut self, id: LayerId) -> Option<&mut LogoLayer> {
        self.logos.iter_mut().find(|l| l.id == id)
    }

    pub fn text(&self, id: LayerId) -> Option<&TextLayer> {
        self.texts.iter().find(|t| t.id == id)
    }

    pub fn text_mut(&mut self, id: LayerId) -> Option<&mut TextLayer> {
        self.texts.iter_mut().find(|t| t.id == id)
    }

    /// Which sequence holds the layer, if any
    pub fn kind_of(&self, id: LayerId) -> Option<LayerKind> {
        if self.frame(id).is_some() {
            Some(LayerKind::Frame)
        } else if self.logo(id).is_some() {
            Some(LayerKind::Logo)
        } else if self.text(id).is_some() {
            Some(LayerKind::Text)
        } else {
            None
        }
    }

    /// Apply `update` to the frame with `id`. Returns false when no such frame exists.
    pub fn update_frame(&mut self, id: LayerId, update: impl FnOnce(&mut FrameLayer)) -> bool {
        self.frame_mut(id).map(update).is_some()
    }

    pub fn update_logo(&mut self, id: LayerId, update: impl FnOnce(&mut LogoLayer)) -> bool {
        self.logo_mut(id).map(update).is_some()
    }

    pub fn update_text(&mut self, id: LayerId, update: impl FnOnce(&mut TextLayer)) -> bool {
        self.text_mut(id).map(update).is_some()
    }

    /// Set the pixel origin of any layer (the baseline anchor for text).
    pub fn set_position(&mut self, id: LayerId, x: f32, y: f32) -> bool {
        if let Some(frame) = self.frame_mut(id) {
            frame.x = x;
            frame.y = y;
        } else if let Some(logo) = self.logo_mut(id) {
            logo.x = x;
            logo.y = y;
        } else if let Some(text) = self.text_mut(id) {
            text.x = x;
            text.y = y;
        } else {
            return false;
        }
        true
    }

    /// Remove a layer of any kind, preserving the order of the others
    pub fn remove(&mut self, id: LayerId) -> Option<LayerKind> {
        if let Some(index) = self.frames.iter().position(|f| f.id == id) {
            self.frames.remove(index);
            Some(LayerKind::Frame)
        } else if let Some(index) = self.logos.iter().position(|l| l.id == id) {
            self.logos.remove(index);
            Some(LayerKind::Logo)
        } else if let Some(index) = self.texts.iter().position(|t| t.id == id) {
            self.texts.remove(index);
            Some(LayerKind::Text)
        } else {
            None
        }
    }

    /// Replace every layer at once (used when a preset is loaded)
    pub fn replace(&mut self, other: Document) {
        *self = other;
    }
}
