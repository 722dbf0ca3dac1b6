use egui::{CursorIcon, Pos2, Rect, Vec2};
use log::{debug, trace};

use crate::document::Document;
use crate::fonts::TextMeasure;
use crate::geometry::{HANDLE_TOLERANCE, ResizeHandle, handle_at, handle_tolerance, text_bounds};
use crate::layer::{LayerId, LayerKind};

/// What a pointer-down landed on
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub layer_id: LayerId,
    pub layer_kind: LayerKind,
    /// Set when the pointer is inside one of a frame's resize zones
    pub handle: Option<ResizeHandle>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragKind {
    /// Pointer offset from the layer origin at press time
    Move { offset: Vec2 },
    /// Pointer position and frame rectangle frozen at press time; every
    /// move is applied to this snapshot, never to the previous frame.
    Resize {
        handle: ResizeHandle,
        start: Pos2,
        initial: Rect,
    },
}

/// An in-progress move or resize, bound to a single layer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragSession {
    pub layer_id: LayerId,
    pub layer_kind: LayerKind,
    pub kind: DragKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum SelectionState {
    #[default]
    Idle,
    Dragging(DragSession),
}

/// Result of feeding a pointer move to the tool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerOutcome {
    /// Nothing changed (idle hover)
    Hover,
    Moved,
    Resized,
    /// The resize would violate the minimum size; geometry kept, session kept
    Rejected,
    /// The target layer disappeared and the session was dropped
    Ended,
}

impl PointerOutcome {
    pub fn changed_geometry(&self) -> bool {
        matches!(self, PointerOutcome::Moved | PointerOutcome::Resized)
    }
}

/// Pointer state machine for moving layers and resizing frames.
///
/// Hit priority: frames topmost-first (resize zones before the body), then
/// logos, then texts, each topmost-first.
#[derive(Debug, Clone)]
pub struct SelectionTool {
    state: SelectionState,
    selected: Option<LayerId>,
    cursor: CursorIcon,
    handle_tolerance: f32,
}

impl Default for SelectionTool {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectionTool {
    pub fn new() -> Self {
        Self::with_tolerance(HANDLE_TOLERANCE)
    }

    pub fn with_tolerance(handle_tolerance: f32) -> Self {
        Self {
            state: SelectionState::Idle,
            selected: None,
            cursor: CursorIcon::Grab,
            handle_tolerance,
        }
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    pub fn session(&self) -> Option<&DragSession> {
        match &self.state {
            SelectionState::Dragging(session) => Some(session),
            SelectionState::Idle => None,
        }
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, SelectionState::Dragging(_))
    }

    /// The last layer hit by a pointer-down
    pub fn selected(&self) -> Option<LayerId> {
        self.selected
    }

    pub fn set_selected(&mut self, id: Option<LayerId>) {
        self.selected = id;
    }

    /// Cursor affordance for the last pointer event
    pub fn cursor(&self) -> CursorIcon {
        self.cursor
    }

    pub fn handle_tolerance(&self) -> f32 {
        self.handle_tolerance
    }

    pub fn set_handle_tolerance(&mut self, tolerance: f32) {
        self.handle_tolerance = tolerance;
    }

    /// Topmost frame handle under `pos`, frames only
    pub fn handle_under(&self, pos: Pos2, doc: &Document) -> Option<(LayerId, ResizeHandle)> {
        doc.frames().iter().rev().find_map(|frame| {
            let tolerance = handle_tolerance(self.handle_tolerance, frame.border_width);
            handle_at(frame.rect(), tolerance, pos).map(|handle| (frame.id, handle))
        })
    }

    /// First layer under `pos` in hit-test order
    pub fn hit_test(&self, pos: Pos2, doc: &Document, measure: &impl TextMeasure) -> Option<Hit> {
        for frame in doc.frames().iter().rev() {
            let rect = frame.rect();
            let tolerance = handle_tolerance(self.handle_tolerance, frame.border_width);
            if let Some(handle) = handle_at(rect, tolerance, pos) {
                return Some(Hit {
                    layer_id: frame.id,
                    layer_kind: LayerKind::Frame,
                    handle: Some(handle),
                });
            }
            if rect.contains(pos) {
                return Some(Hit {
                    layer_id: frame.id,
                    layer_kind: LayerKind::Frame,
                    handle: None,
                });
            }
        }

        if let Some(logo) = doc.logos().iter().rev().find(|logo| logo.rect().contains(pos)) {
            return Some(Hit {
                layer_id: logo.id,
                layer_kind: LayerKind::Logo,
                handle: None,
            });
        }

        doc.texts()
            .iter()
            .rev()
            .find(|text| {
                let advance = measure.advance_width(&text.text, &text.font_family, text.font_size);
                text_bounds(text.anchor(), advance, text.font_size).contains(pos)
            })
            .map(|text| Hit {
                layer_id: text.id,
                layer_kind: LayerKind::Text,
                handle: None,
            })
    }

    /// Start a move or resize session on whatever is under `pos`.
    ///
    /// Ignored while a session is already active.
    pub fn on_pointer_down(&mut self, pos: Pos2, doc: &Document, measure: &impl TextMeasure) -> Option<Hit> {
        if self.is_dragging() {
            return None;
        }

        let Some(hit) = self.hit_test(pos, doc, measure) else {
            self.selected = None;
            return None;
        };

        let kind = match hit.handle {
            Some(handle) => {
                let initial = doc.frame(hit.layer_id).map(|f| f.rect())?;
                self.cursor = handle.cursor_icon();
                DragKind::Resize {
                    handle,
                    start: pos,
                    initial,
                }
            }
            None => {
                let origin = layer_origin(doc, hit.layer_id)?;
                self.cursor = CursorIcon::Grabbing;
                DragKind::Move { offset: pos - origin }
            }
        };

        debug!(
            "Drag started on {} {} ({:?})",
            hit.layer_kind.as_str(),
            hit.layer_id,
            hit.handle.map(|h| h.as_str()).unwrap_or("move")
        );
        self.selected = Some(hit.layer_id);
        self.state = SelectionState::Dragging(DragSession {
            layer_id: hit.layer_id,
            layer_kind: hit.layer_kind,
            kind,
        });
        Some(hit)
    }

    pub fn on_pointer_move(&mut self, pos: Pos2, doc: &mut Document) -> PointerOutcome {
        let session = match self.state {
            SelectionState::Idle => {
                self.cursor = self
                    .handle_under(pos, doc)
                    .map(|(_, handle)| handle.cursor_icon())
                    .unwrap_or(CursorIcon::Grab);
                return PointerOutcome::Hover;
            }
            SelectionState::Dragging(session) => session,
        };

        match session.kind {
            DragKind::Move { offset } => {
                let origin = pos - offset;
                if doc.set_position(session.layer_id, origin.x, origin.y) {
                    PointerOutcome::Moved
                } else {
                    self.end_session("target removed");
                    PointerOutcome::Ended
                }
            }
            DragKind::Resize { handle, start, initial } => {
                let Some(frame) = doc.frame_mut(session.layer_id) else {
                    self.end_session("target removed");
                    return PointerOutcome::Ended;
                };
                match frame.set_rect(handle.apply(initial, pos - start)) {
                    Ok(()) => PointerOutcome::Resized,
                    Err(rejected) => {
                        trace!("{rejected}");
                        PointerOutcome::Rejected
                    }
                }
            }
        }
    }

    pub fn on_pointer_up(&mut self) {
        self.end_session("pointer released");
    }

    pub fn on_pointer_leave(&mut self) {
        self.end_session("pointer left surface");
    }

    fn end_session(&mut self, reason: &str) {
        if let SelectionState::Dragging(session) = self.state {
            debug!("Drag on {} ended: {reason}", session.layer_id);
        }
        self.state = SelectionState::Idle;
        self.cursor = CursorIcon::Grab;
    }
}

/// Pixel origin used for move offsets: top-left for frames and logos,
/// baseline anchor for text.
fn layer_origin(doc: &Document, id: LayerId) -> Option<Pos2> {
    doc.frame(id)
        .map(|f| f.rect().min)
        .or_else(|| doc.logo(id).map(|l| l.rect().min))
        .or_else(|| doc.text(id).map(|t| t.anchor()))
}
