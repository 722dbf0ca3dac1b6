use egui::{Color32, Pos2, Rect, Sense};

use crate::app::OverlayApp;
use crate::input::CanvasTransform;

pub fn central_panel(app: &mut OverlayApp, ctx: &egui::Context) {
    egui::CentralPanel::default().show(ctx, |ui| {
        let available = ui.available_rect_before_wrap();

        let Some((texture_id, image_size)) = app
            .preview_texture(ctx)
            .map(|texture| (texture.id(), texture.size_vec2()))
        else {
            ui.centered_and_justified(|ui| {
                ui.label("Drop photos here to start");
            });
            return;
        };

        let canvas = CanvasTransform::fit(available, image_size);
        let response = ui.allocate_rect(canvas.screen_rect, Sense::click_and_drag());
        ui.painter().image(
            texture_id,
            canvas.screen_rect,
            Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0)),
            Color32::WHITE,
        );

        app.handle_canvas_input(ctx, &canvas);

        if response.hovered() || app.editor().selection().is_dragging() {
            ctx.set_cursor_icon(app.editor().cursor());
        }
    });
}
