use egui::{DragValue, Slider, Ui};

use crate::app::{DropTarget, OverlayApp, PresetCommand};
use crate::layer::{FrameLayer, LayerId, LayerKind, LogoLayer, MIN_LAYER_SIZE, PositionMode, TextLayer};

pub fn tools_panel(app: &mut OverlayApp, ctx: &egui::Context) {
    egui::SidePanel::left("tools_panel")
        .resizable(true)
        .default_width(260.0)
        .show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.heading("Overlay Forge");
                ui.separator();

                inputs_section(app, ui);
                ui.separator();
                layers_section(app, ui);
                ui.separator();
                presets_section(app, ui);
                ui.separator();
                export_section(app, ui);

                if let Some(status) = &app.status {
                    ui.separator();
                    ui.label(status);
                }
            });
        });
}

fn inputs_section(app: &mut OverlayApp, ui: &mut Ui) {
    ui.strong("Dropped images go to");
    ui.horizontal(|ui| {
        ui.radio_value(&mut app.drop_target, DropTarget::Sources, "Batch");
        ui.radio_value(&mut app.drop_target, DropTarget::Reference, "Preview");
        ui.radio_value(&mut app.drop_target, DropTarget::Logo, "Logo");
    });
    ui.small("Dropped .ttf/.otf files become font families named after the file.");

    let count = app.editor().sources().len();
    ui.horizontal(|ui| {
        ui.label(format!("{count} source image(s)"));
        if ui.add_enabled(count > 0, egui::Button::new("Clear")).clicked() {
            app.editor_mut().clear_sources();
        }
    });
    if let Some(reference) = app.editor().preview().reference() {
        ui.label(format!("Preview: {}x{}", reference.width(), reference.height()));
    }
}

fn layers_section(app: &mut OverlayApp, ui: &mut Ui) {
    ui.horizontal(|ui| {
        if ui.button("Add Frame").clicked() {
            let id = app.editor_mut().add_frame();
            app.editor_mut().select(Some(id));
        }
        if ui.button("Add Text").clicked() {
            let id = app.editor_mut().add_text();
            app.editor_mut().select(Some(id));
        }
    });

    let doc = app.editor().document();
    let entries: Vec<(LayerId, String)> = doc
        .frames()
        .iter()
        .enumerate()
        .map(|(i, f)| (f.id, format!("Frame {}", i + 1)))
        .chain(doc.logos().iter().enumerate().map(|(i, l)| (l.id, format!("Logo {}", i + 1))))
        .chain(doc.texts().iter().map(|t| (t.id, format!("Text \"{}\"", t.text))))
        .collect();

    let selected = app.editor().selected();
    for (id, label) in entries {
        if ui.selectable_label(selected == Some(id), label).clicked() {
            app.editor_mut().select(Some(id));
        }
    }

    let Some(id) = selected else {
        return;
    };
    ui.separator();
    match app.editor().document().kind_of(id) {
        Some(LayerKind::Frame) => frame_controls(app, ui, id),
        Some(LayerKind::Logo) => logo_controls(app, ui, id),
        Some(LayerKind::Text) => text_controls(app, ui, id),
        None => {}
    }
    if ui.button("Remove layer").clicked() {
        app.editor_mut().remove(id);
    }
}

fn position_mode_combo(app: &mut OverlayApp, ui: &mut Ui, id: LayerId, current: PositionMode) {
    let mut mode = current;
    egui::ComboBox::from_id_salt(("position_mode", id.0))
        .selected_text(match mode {
            PositionMode::Absolute => "Absolute (fixed pixels)",
            PositionMode::Relative => "Relative (% of image)",
        })
        .show_ui(ui, |ui| {
            ui.selectable_value(&mut mode, PositionMode::Absolute, "Absolute (fixed pixels)");
            ui.selectable_value(&mut mode, PositionMode::Relative, "Relative (% of image)");
        });
    if mode != current {
        app.editor_mut().set_position_mode(id, mode);
    }
}

fn frame_controls(app: &mut OverlayApp, ui: &mut Ui, id: LayerId) {
    let Some(frame) = app.editor().document().frame(id) else {
        return;
    };
    let mut edited: FrameLayer = frame.clone();
    position_mode_combo(app, ui, id, edited.position_mode);

    let mut changed = false;
    ui.horizontal(|ui| {
        ui.label("Width");
        changed |= ui
            .add(DragValue::new(&mut edited.width).range(MIN_LAYER_SIZE + 1.0..=f32::MAX))
            .changed();
        ui.label("Height");
        changed |= ui
            .add(DragValue::new(&mut edited.height).range(MIN_LAYER_SIZE + 1.0..=f32::MAX))
            .changed();
    });
    ui.horizontal(|ui| {
        ui.label("Border");
        changed |= ui.add(DragValue::new(&mut edited.border_width).range(1.0..=50.0)).changed();
        changed |= ui.color_edit_button_srgba(&mut edited.border_color).changed();
    });
    changed |= ui.add(Slider::new(&mut edited.opacity, 0.0..=1.0).text("Opacity")).changed();

    if changed {
        app.editor_mut().update_frame(id, |frame| {
            let mode = frame.position_mode;
            *frame = FrameLayer {
                position_mode: mode,
                ..edited
            };
        });
    }
}

fn logo_controls(app: &mut OverlayApp, ui: &mut Ui, id: LayerId) {
    let Some(logo) = app.editor().document().logo(id) else {
        return;
    };
    let mode = logo.position_mode;
    let mut width = logo.width;
    let mut opacity = logo.opacity;
    position_mode_combo(app, ui, id, mode);

    let mut changed = ui
        .add(Slider::new(&mut width, 50.0..=800.0).text("Width"))
        .changed();
    changed |= ui.add(Slider::new(&mut opacity, 0.0..=1.0).text("Opacity")).changed();

    if changed {
        app.editor_mut().update_logo(id, |logo: &mut LogoLayer| {
            logo.set_width(width);
            logo.opacity = opacity;
        });
    }
}

fn text_controls(app: &mut OverlayApp, ui: &mut Ui, id: LayerId) {
    let Some(text) = app.editor().document().text(id) else {
        return;
    };
    let mut edited: TextLayer = text.clone();
    position_mode_combo(app, ui, id, edited.position_mode);

    let mut changed = ui.text_edit_singleline(&mut edited.text).changed();
    ui.horizontal(|ui| {
        ui.label("Font");
        changed |= ui.text_edit_singleline(&mut edited.font_family).changed();
    });
    ui.horizontal(|ui| {
        ui.label("Size");
        changed |= ui.add(DragValue::new(&mut edited.font_size).range(12.0..=200.0)).changed();
        changed |= ui.color_edit_button_srgba(&mut edited.color).changed();
    });
    changed |= ui.add(Slider::new(&mut edited.opacity, 0.0..=1.0).text("Opacity")).changed();

    if changed {
        app.editor_mut().update_text(id, |text| {
            let mode = text.position_mode;
            *text = TextLayer {
                position_mode: mode,
                ..edited
            };
        });
    }
}

fn presets_section(app: &mut OverlayApp, ui: &mut Ui) {
    ui.strong("Presets");
    ui.horizontal(|ui| {
        ui.text_edit_singleline(&mut app.preset_name);
        if ui.button("Save").clicked() {
            app.queue_preset(PresetCommand::Save(app.preset_name.clone()));
        }
    });
    ui.horizontal(|ui| {
        ui.add(egui::TextEdit::singleline(&mut app.preset_selector).hint_text("name or number"));
        if ui.button("Load").clicked() {
            app.queue_preset(PresetCommand::Load(app.preset_selector.clone()));
        }
    });
    for (index, name) in app.preset_names.iter().enumerate() {
        ui.label(format!("{}. {name}", index + 1));
    }
}

fn export_section(app: &mut OverlayApp, ui: &mut Ui) {
    ui.label(format!("Output folder: {}", app.config().output_dir.display()));
    match app.export_progress {
        Some(progress) => {
            ui.add(egui::ProgressBar::new(progress).show_percentage());
        }
        None => {
            if ui.button("Apply to all images").clicked() {
                app.start_export();
            }
        }
    }
}
