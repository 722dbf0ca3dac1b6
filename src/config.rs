use std::path::PathBuf;

use egui::Color32;
use serde::{Deserialize, Serialize};

use crate::geometry::HANDLE_TOLERANCE;
use crate::layer::hex_color;
use crate::renderer::DecorationStyle;

/// User-adjustable editor settings, persisted by eframe between runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)] // settings saved by older versions fill in missing fields
pub struct EditorConfig {
    /// Minimum distance (px) from a frame edge that still grabs a resize handle
    pub handle_tolerance: f32,
    pub handle_marker_size: f32,
    #[serde(with = "hex_color")]
    pub handle_color: Color32,
    #[serde(with = "hex_color")]
    pub selection_color: Color32,
    /// Where batch exports are written
    pub output_dir: PathBuf,
}

impl Default for EditorConfig {
    fn default() -> Self {
        let style = DecorationStyle::default();
        Self {
            handle_tolerance: HANDLE_TOLERANCE,
            handle_marker_size: style.handle_size,
            handle_color: style.handle_color,
            selection_color: style.selection_color,
            output_dir: PathBuf::from("watermarked-images"),
        }
    }
}

impl EditorConfig {
    pub fn decoration_style(&self) -> DecorationStyle {
        DecorationStyle {
            handle_size: self.handle_marker_size,
            handle_color: self.handle_color,
            selection_color: self.selection_color,
            ..DecorationStyle::default()
        }
    }
}
