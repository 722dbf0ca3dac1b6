use std::collections::HashMap;
use std::sync::Arc;

use log::{info, warn};
use parking_lot::Mutex;

use crate::document::Document;
use crate::error::{PresetResult, ValidationError};
use crate::preset::Preset;

/// Storage key holding the JSON array of saved presets
pub const PRESETS_KEY: &str = "overlayPresets";

/// String key-value storage for presets
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: String);
}

/// In-process store. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) {
        self.entries.lock().insert(key.to_owned(), value);
    }
}

/// Adapter over the storage eframe persists between runs
pub struct StorageStore<'a>(pub &'a mut dyn eframe::Storage);

impl KeyValueStore for StorageStore<'_> {
    fn get(&self, key: &str) -> Option<String> {
        self.0.get_string(key)
    }

    fn set(&mut self, key: &str, value: String) {
        self.0.set_string(key, value);
        self.0.flush();
    }
}

/// Named presets stored as one JSON array under [`PRESETS_KEY`]
pub struct PresetLibrary<S> {
    store: S,
}

impl<S: KeyValueStore> PresetLibrary<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Every saved preset, oldest first. A missing key is an empty library.
    pub fn list(&self) -> PresetResult<Vec<Preset>> {
        match self.store.get(PRESETS_KEY) {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(Vec::new()),
        }
    }

    pub fn names(&self) -> PresetResult<Vec<String>> {
        Ok(self.list()?.into_iter().map(|p| p.name).collect())
    }

    /// Append `document` as a new preset. Duplicate names are kept; lookups
    /// by name find the oldest.
    pub fn save(&mut self, name: &str, document: &Document) -> PresetResult<()> {
        if name.trim().is_empty() {
            warn!("Refusing to save preset without a name");
            return Err(ValidationError::EmptyPresetName.into());
        }
        let mut presets = self.list()?;
        presets.push(Preset::from_document(name, document));
        let json = serde_json::to_string(&presets)?;
        self.store.set(PRESETS_KEY, json);
        info!("Saved preset {name} ({} in library)", presets.len());
        Ok(())
    }

    /// Find a preset by exact name, falling back to a 1-based index.
    pub fn load(&self, selector: &str) -> PresetResult<Preset> {
        let mut presets = self.list()?;
        if presets.is_empty() {
            return Err(ValidationError::NoPresets.into());
        }

        let selector = selector.trim();
        let position = presets.iter().position(|p| p.name == selector).or_else(|| {
            selector
                .parse::<usize>()
                .ok()
                .filter(|&n| n >= 1 && n <= presets.len())
                .map(|n| n - 1)
        });

        match position {
            Some(index) => {
                let preset = presets.swap_remove(index);
                info!("Loaded preset {}", preset.name);
                Ok(preset)
            }
            None => Err(ValidationError::PresetNotFound(selector.to_owned()).into()),
        }
    }
}
