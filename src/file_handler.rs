use std::path::{Path, PathBuf};
use std::sync::Arc;

use eframe::egui;

use crate::export::{ExportedImage, SourceImage};

/// A TTF/OTF file dropped onto the window
#[derive(Debug, Clone, PartialEq)]
pub struct DroppedFont {
    /// File stem, used as the family name text layers refer to
    pub family: String,
    pub data: Vec<u8>,
}

/// Collects image and font files dropped onto the window.
#[derive(Debug, Default)]
pub struct FileHandler {
    pending: Vec<SourceImage>,
    fonts: Vec<DroppedFont>,
}

impl FileHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pick up newly dropped files. Returns true if any image or font was accepted.
    pub fn check_for_dropped_files(&mut self, ctx: &egui::Context) -> bool {
        let dropped = ctx.input(|i| i.raw.dropped_files.clone());
        let before = self.pending.len() + self.fonts.len();
        for file in &dropped {
            if is_font_file(file) {
                if let Some(source) = read_dropped_file(file) {
                    self.fonts.push(DroppedFont {
                        family: font_family_name(&source.name),
                        data: source.bytes.to_vec(),
                    });
                }
                continue;
            }
            if !is_image_file(file) {
                log::warn!("Dropped file is not a supported image or font: {}", display_name(file));
                continue;
            }
            if let Some(source) = read_dropped_file(file) {
                self.pending.push(source);
            }
        }
        self.pending.len() + self.fonts.len() > before
    }

    /// Hand over every image dropped since the last call
    pub fn take_dropped(&mut self) -> Vec<SourceImage> {
        std::mem::take(&mut self.pending)
    }

    pub fn take_fonts(&mut self) -> Vec<DroppedFont> {
        std::mem::take(&mut self.fonts)
    }

    /// Dim the window and list the files while they hover over it
    pub fn preview_files_being_dropped(&self, ctx: &egui::Context) {
        use egui::{Align2, Color32, Id, LayerId, Order, TextStyle};

        if ctx.input(|i| i.raw.hovered_files.is_empty()) {
            return;
        }
        let text = ctx.input(|i| {
            let mut text = "Dropping files:\n".to_owned();
            for file in &i.raw.hovered_files {
                match &file.path {
                    Some(path) => text += &format!("\n{}", path.display()),
                    None => text += "\n(Path not available)",
                }
            }
            text
        });

        let painter = ctx.layer_painter(LayerId::new(Order::Foreground, Id::new("file_drop_target")));
        let screen_rect = ctx.screen_rect();
        painter.rect_filled(screen_rect, 0.0, Color32::from_black_alpha(192));
        painter.text(
            screen_rect.center(),
            Align2::CENTER_CENTER,
            text,
            TextStyle::Heading.resolve(&ctx.style()),
            Color32::WHITE,
        );
    }
}

fn display_name(file: &egui::DroppedFile) -> String {
    if let Some(name) = file.path.as_deref().and_then(Path::file_name) {
        name.to_string_lossy().into_owned()
    } else if !file.name.is_empty() {
        file.name.clone()
    } else {
        "unknown".to_owned()
    }
}

fn is_image_file(file: &egui::DroppedFile) -> bool {
    if !file.mime.is_empty() {
        return file.mime.starts_with("image/");
    }
    let name = display_name(file);
    match Path::new(&name).extension() {
        Some(ext) => matches!(
            ext.to_string_lossy().to_lowercase().as_str(),
            "png" | "jpg" | "jpeg" | "gif" | "webp" | "bmp"
        ),
        None => false,
    }
}

fn is_font_file(file: &egui::DroppedFile) -> bool {
    let name = display_name(file);
    let by_extension = Path::new(&name)
        .extension()
        .is_some_and(|ext| matches!(ext.to_string_lossy().to_lowercase().as_str(), "ttf" | "otf"));
    by_extension || file.mime.starts_with("font/")
}

/// "Georgia Bold.ttf" registers as "Georgia Bold"
fn font_family_name(file_name: &str) -> String {
    Path::new(file_name)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| file_name.to_owned())
}

fn read_dropped_file(file: &egui::DroppedFile) -> Option<SourceImage> {
    let name = display_name(file);
    if let Some(bytes) = &file.bytes {
        log::info!("Accepted dropped file {name} ({} bytes)", bytes.len());
        return Some(SourceImage {
            name,
            bytes: Arc::clone(bytes),
        });
    }
    let path = file.path.as_ref()?;
    match std::fs::read(path) {
        Ok(bytes) => {
            log::info!("Read dropped file {}", path.display());
            Some(SourceImage::new(name, bytes))
        }
        Err(err) => {
            log::error!("Failed to read dropped file {}: {err}", path.display());
            None
        }
    }
}

/// Write every export under its source filename inside `dir`, creating the
/// directory if needed. Returns the written paths.
pub fn write_outputs(dir: &Path, outputs: &[ExportedImage]) -> std::io::Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;
    let mut written = Vec::with_capacity(outputs.len());
    for output in outputs {
        // Keep only the final path component so a name can't escape `dir`.
        let file_name = Path::new(&output.name)
            .file_name()
            .map(|n| n.to_owned())
            .unwrap_or_else(|| "output.png".into());
        let path = dir.join(file_name);
        std::fs::write(&path, &output.bytes)?;
        written.push(path);
    }
    log::info!("Wrote {} image(s) to {}", written.len(), dir.display());
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_outputs_uses_source_names() {
        let dir = std::env::temp_dir().join(format!("overlay_forge_test_{}", uuid::Uuid::new_v4()));
        let outputs = vec![
            ExportedImage {
                name: "a.png".to_owned(),
                bytes: vec![1, 2, 3],
            },
            ExportedImage {
                name: "../escape.png".to_owned(),
                bytes: vec![4],
            },
        ];
        let written = write_outputs(&dir, &outputs).unwrap();
        assert_eq!(written, vec![dir.join("a.png"), dir.join("escape.png")]);
        assert_eq!(std::fs::read(dir.join("a.png")).unwrap(), vec![1, 2, 3]);
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_font_family_from_file_name() {
        assert_eq!(font_family_name("Georgia.ttf"), "Georgia");
        assert_eq!(font_family_name("Fira Code Retina.otf"), "Fira Code Retina");
        assert_eq!(font_family_name("NoExtension"), "NoExtension");
    }
}
