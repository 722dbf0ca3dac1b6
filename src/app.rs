use std::task::{Context, Poll};

use futures::channel::mpsc::{UnboundedReceiver, UnboundedSender, unbounded};
use futures::executor::{LocalPool, LocalSpawner};
use futures::future::LocalBoxFuture;
use futures::task::{LocalSpawnExt, noop_waker_ref};
use futures::{FutureExt, StreamExt};

use crate::codec::{DecodedImage, ImageCodec, PngCodec};
use crate::config::EditorConfig;
use crate::error::{DecodeError, PresetResult, ValidationError};
use crate::export::{ExportReport, SourceImage};
use crate::file_handler::{FileHandler, write_outputs};
use crate::input::{CanvasTransform, InputEvent, InputHandler};
use crate::layer::{LogoAsset, LogoLayer};
use crate::panels::{central_panel, tools_panel};
use crate::state::{EditorContext, KeyValueStore, MemoryStore, PresetLibrary, StorageStore};

/// Where dropped image files go
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DropTarget {
    /// Batch inputs; the first one also becomes the reference if none is set
    #[default]
    Sources,
    Reference,
    Logo,
}

/// Results sent back from tasks on the local pool
#[derive(Debug)]
enum AppMessage {
    ReferenceDecoded {
        generation: u64,
        result: Result<DecodedImage, DecodeError>,
    },
    LogoDecoded {
        name: String,
        result: Result<LogoAsset, DecodeError>,
    },
    PresetLogo {
        generation: u64,
        result: PresetResult<LogoLayer>,
    },
    ExportProgress(f32),
}

/// Preset commands wait until the end of the frame, when storage is reachable.
#[derive(Debug, Clone, PartialEq)]
pub enum PresetCommand {
    Save(String),
    Load(String),
    Refresh,
}

pub struct OverlayApp {
    config: EditorConfig,
    editor: EditorContext,
    pool: LocalPool,
    spawner: LocalSpawner,
    sender: UnboundedSender<AppMessage>,
    receiver: UnboundedReceiver<AppMessage>,
    /// Running batch, polled once per frame; it suspends after every image
    export: Option<LocalBoxFuture<'static, Result<ExportReport, ValidationError>>>,
    file_handler: FileHandler,
    input: InputHandler,
    texture: Option<egui::TextureHandle>,
    /// Preset store used when eframe has no persistent storage
    fallback_store: MemoryStore,
    pending_preset: Option<PresetCommand>,
    pub(crate) drop_target: DropTarget,
    pub(crate) preset_name: String,
    pub(crate) preset_selector: String,
    pub(crate) preset_names: Vec<String>,
    pub(crate) status: Option<String>,
    pub(crate) export_progress: Option<f32>,
}

impl OverlayApp {
    /// Called once before the first frame.
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let config: EditorConfig = cc
            .storage
            .and_then(|storage| eframe::get_value(storage, eframe::APP_KEY))
            .unwrap_or_default();
        let mut app = Self::with_config(config);
        app.pending_preset = Some(PresetCommand::Refresh);
        app
    }

    pub fn with_config(config: EditorConfig) -> Self {
        let pool = LocalPool::new();
        let spawner = pool.spawner();
        let (sender, receiver) = unbounded();
        Self {
            editor: EditorContext::new(&config),
            config,
            pool,
            spawner,
            sender,
            receiver,
            export: None,
            file_handler: FileHandler::new(),
            input: InputHandler::new(),
            texture: None,
            fallback_store: MemoryStore::new(),
            pending_preset: None,
            drop_target: DropTarget::default(),
            preset_name: String::new(),
            preset_selector: String::new(),
            preset_names: Vec::new(),
            status: None,
            export_progress: None,
        }
    }

    pub fn editor(&self) -> &EditorContext {
        &self.editor
    }

    pub fn editor_mut(&mut self) -> &mut EditorContext {
        &mut self.editor
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: EditorConfig) {
        self.editor.apply_config(&config);
        self.config = config;
    }

    pub fn is_exporting(&self) -> bool {
        self.export.is_some()
    }

    pub(crate) fn set_status(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::info!("{message}");
        self.status = Some(message);
    }

    pub(crate) fn queue_preset(&mut self, command: PresetCommand) {
        self.pending_preset = Some(command);
    }

    fn spawn(&self, task: impl std::future::Future<Output = ()> + 'static) {
        if let Err(err) = self.spawner.spawn_local(task) {
            log::error!("Failed to spawn task: {err}");
        }
    }

    pub(crate) fn load_reference(&mut self, source: SourceImage) {
        let generation = self.editor.begin_reference_load();
        let sender = self.sender.clone();
        self.spawn(async move {
            let result = PngCodec.decode(&source.bytes).await;
            let _ = sender.unbounded_send(AppMessage::ReferenceDecoded { generation, result });
        });
    }

    fn load_logo(&mut self, source: SourceImage) {
        let sender = self.sender.clone();
        self.spawn(async move {
            let result = PngCodec
                .decode(&source.bytes)
                .await
                .map(|decoded| LogoAsset::new(decoded.raster, source.bytes.clone()));
            let _ = sender.unbounded_send(AppMessage::LogoDecoded {
                name: source.name,
                result,
            });
        });
    }

    fn accept_dropped(&mut self, files: Vec<SourceImage>) {
        match self.drop_target {
            DropTarget::Sources => {
                let first = files.first().cloned();
                let count = files.len();
                for file in files {
                    self.editor.add_source(file);
                }
                if let Some(first) = first.filter(|_| self.editor.preview().reference().is_none()) {
                    self.load_reference(first);
                }
                self.set_status(format!("{count} source image(s) added"));
            }
            DropTarget::Reference => {
                if let Some(last) = files.into_iter().last() {
                    self.load_reference(last);
                }
            }
            DropTarget::Logo => {
                for file in files {
                    self.load_logo(file);
                }
            }
        }
    }

    pub(crate) fn start_export(&mut self) {
        if self.is_exporting() {
            return;
        }
        let job = match self.editor.prepare_export() {
            Ok(job) => job,
            Err(err) => {
                self.set_status(err.to_string());
                return;
            }
        };
        self.export_progress = Some(0.0);
        let progress = self.sender.clone();
        let batch = async move {
            job.run(&PngCodec, |fraction| {
                let _ = progress.unbounded_send(AppMessage::ExportProgress(fraction));
            })
            .await
        };
        self.export = Some(batch.boxed_local());
    }

    /// Advance the running batch by one image.
    fn poll_export(&mut self) {
        let Some(batch) = self.export.as_mut() else {
            return;
        };
        let mut cx = Context::from_waker(noop_waker_ref());
        if let Poll::Ready(result) = batch.poll_unpin(&mut cx) {
            self.export = None;
            self.export_progress = None;
            self.finish_export(result);
        }
    }

    fn run_preset_command(&mut self, command: PresetCommand, store: impl KeyValueStore) {
        let mut library = PresetLibrary::new(store);
        match command {
            PresetCommand::Save(name) => match library.save(&name, self.editor.document()) {
                Ok(()) => {
                    self.preset_name.clear();
                    self.set_status(format!("Preset \"{}\" saved", name.trim()));
                }
                Err(err) => self.set_status(err.to_string()),
            },
            PresetCommand::Load(selector) => match library.load(&selector) {
                Ok(preset) => {
                    let name = preset.name.clone();
                    let (generation, records) = self.editor.apply_preset(preset);
                    for record in records {
                        let sender = self.sender.clone();
                        self.spawn(async move {
                            let result = record.into_layer(&PngCodec).await;
                            let _ = sender.unbounded_send(AppMessage::PresetLogo { generation, result });
                        });
                    }
                    self.set_status(format!("Preset \"{name}\" loaded"));
                }
                Err(err) => self.set_status(err.to_string()),
            },
            PresetCommand::Refresh => {}
        }

        match library.names() {
            Ok(names) => self.preset_names = names,
            Err(err) => log::warn!("Could not list presets: {err}"),
        }
    }

    fn drain_messages(&mut self) {
        while let Some(Some(message)) = self.receiver.next().now_or_never() {
            match message {
                AppMessage::ReferenceDecoded { generation, result } => match result {
                    Ok(image) => {
                        self.editor.set_reference(generation, image);
                    }
                    Err(err) => self.set_status(format!("Could not load reference image: {err}")),
                },
                AppMessage::LogoDecoded { name, result } => match result {
                    Ok(asset) => {
                        let id = self.editor.add_logo(asset);
                        self.editor.select(Some(id));
                    }
                    Err(err) => self.set_status(format!("Could not load logo {name}: {err}")),
                },
                AppMessage::PresetLogo { generation, result } => match result {
                    Ok(logo) => {
                        self.editor.push_logo(generation, logo);
                    }
                    Err(err) => log::warn!("Preset logo dropped: {err}"),
                },
                AppMessage::ExportProgress(fraction) if self.is_exporting() => {
                    self.export_progress = Some(fraction)
                }
                AppMessage::ExportProgress(_) => {}
            }
        }
    }

    fn finish_export(&mut self, result: Result<ExportReport, ValidationError>) {
        let report = match result {
            Ok(report) => report,
            Err(err) => {
                self.set_status(err.to_string());
                return;
            }
        };
        match write_outputs(&self.config.output_dir, &report.outputs) {
            Ok(paths) if report.is_complete() => self.set_status(format!(
                "Exported {} image(s) to {}",
                paths.len(),
                self.config.output_dir.display()
            )),
            Ok(paths) => self.set_status(format!(
                "Exported {} image(s), {} failed: {}",
                paths.len(),
                report.failures.len(),
                report
                    .failures
                    .iter()
                    .map(|(name, _)| name.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            )),
            Err(err) => self.set_status(format!("Failed to write exports: {err}")),
        }
    }

    pub(crate) fn handle_canvas_input(&mut self, ctx: &egui::Context, canvas: &CanvasTransform) {
        for event in self.input.process_input(ctx, canvas) {
            match event {
                InputEvent::PointerDown { position } => {
                    self.editor.pointer_down(position);
                }
                InputEvent::PointerMove { position } => {
                    self.editor.pointer_move(position);
                }
                InputEvent::PointerUp => self.editor.pointer_up(),
                InputEvent::PointerLeave => self.editor.pointer_leave(),
            }
        }
    }

    /// Re-render the preview if anything changed and return its texture.
    pub(crate) fn preview_texture(&mut self, ctx: &egui::Context) -> Option<&egui::TextureHandle> {
        if self.editor.needs_render() || self.texture.is_none() {
            if let Some(surface) = self.editor.render_preview() {
                let size = [surface.width() as usize, surface.height() as usize];
                let image = egui::ColorImage::from_rgba_unmultiplied(size, surface.as_raw());
                match &mut self.texture {
                    Some(texture) => texture.set(image, egui::TextureOptions::LINEAR),
                    None => {
                        self.texture = Some(ctx.load_texture("preview", image, egui::TextureOptions::LINEAR));
                    }
                }
            } else {
                self.texture = None;
            }
        }
        self.texture.as_ref()
    }
}

impl eframe::App for OverlayApp {
    /// Called by the framework to save state before shutdown.
    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        eframe::set_value(storage, eframe::APP_KEY, &self.config);
    }

    fn update(&mut self, ctx: &egui::Context, frame: &mut eframe::Frame) {
        self.pool.run_until_stalled();
        self.drain_messages();
        self.poll_export();

        if self.file_handler.check_for_dropped_files(ctx) {
            let files = self.file_handler.take_dropped();
            if !files.is_empty() {
                self.accept_dropped(files);
            }
            for font in self.file_handler.take_fonts() {
                match self.editor.register_font(&font.family, font.data) {
                    Ok(()) => self.set_status(format!("Font \"{}\" ready for text layers", font.family)),
                    Err(err) => self.set_status(err.to_string()),
                }
            }
        }

        tools_panel(self, ctx);
        central_panel(self, ctx);
        self.file_handler.preview_files_being_dropped(ctx);

        if let Some(command) = self.pending_preset.take() {
            match frame.storage_mut() {
                Some(storage) => self.run_preset_command(command, StorageStore(storage)),
                None => {
                    let store = self.fallback_store.clone();
                    self.run_preset_command(command, store);
                }
            }
        }

        // Work spawned this frame should be picked up on the next.
        self.pool.run_until_stalled();
        if self.is_exporting() || self.editor.needs_render() {
            ctx.request_repaint();
        }
    }
}
