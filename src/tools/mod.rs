mod selection_tool;

pub use selection_tool::{DragKind, DragSession, Hit, PointerOutcome, SelectionState, SelectionTool};
