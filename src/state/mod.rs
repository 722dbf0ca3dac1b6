pub mod context;
mod persistence;

pub use context::EditorContext;
pub use persistence::{KeyValueStore, MemoryStore, PRESETS_KEY, PresetLibrary, StorageStore};
