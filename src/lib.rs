#![warn(clippy::all, rust_2018_idioms)]

pub mod app;
pub mod codec;
pub mod config;
pub mod document;
pub mod error;
pub mod export;
pub mod file_handler;
pub mod fonts;
pub mod geometry;
pub mod input;
pub mod layer;
pub mod panels;
pub mod preset;
pub mod preview;
pub mod renderer;
pub mod state;
pub mod tools;

pub use app::OverlayApp;
pub use codec::{DecodedImage, ImageCodec, PngCodec};
pub use config::EditorConfig;
pub use document::Document;
pub use export::{ExportJob, ExportReport, ExportedImage, SourceImage, export_batch};
pub use fonts::{FontBook, TextMeasure};
pub use layer::{FrameLayer, LayerId, LayerKind, LogoAsset, LogoLayer, PositionMode, TextLayer};
pub use preset::Preset;
pub use renderer::Renderer;
pub use state::{EditorContext, MemoryStore, PresetLibrary};
pub use tools::SelectionTool;
