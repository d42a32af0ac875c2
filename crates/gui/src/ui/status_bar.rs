use egui::Ui;

use crate::state::AppState;

pub fn show(ui: &mut Ui, state: &AppState, gpu: bool) {
    ui.horizontal(|ui| {
        ui.weak(format!("Mesh: {}", state.mesh.display_name()));

        ui.separator();

        if let Some(err) = &state.last_error {
            ui.colored_label(egui::Color32::from_rgb(255, 120, 100), err);
        } else if let Some(hit) = state.selection {
            ui.label(format!("Selected element {} (triangle {})", hit.element.0, hit.triangle));
        } else {
            ui.weak("Ready");
        }

        // Right-aligned renderer and version
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            ui.weak("QMVision v0.1");
            ui.separator();
            ui.weak(if gpu { "OpenGL" } else { "Software" });
        });
    });
}
