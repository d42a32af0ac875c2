//! Application menu bar and settings window

use eframe::egui;

use crate::state::{AppSettings, AppState, FillMode};
use crate::viewport::ViewportPanel;

/// Show the file menu
pub fn file_menu(ui: &mut egui::Ui, state: &mut AppState) {
    ui.menu_button("File", |ui| {
        if ui.button("Open mesh…").clicked() {
            ui.close_menu();
            if let Some(path) = rfd::FileDialog::new()
                .set_title("Open mesh")
                .add_filter("Mesh JSON", &["json"])
                .pick_file()
            {
                // Failures are logged and shown in the status bar
                let _ = state.open_file(&path);
            }
        }
        if ui.button("Save mesh as…").clicked() {
            ui.close_menu();
            save_mesh(state);
        }
        if ui.button("Show demo mesh").clicked() {
            ui.close_menu();
            if let Err(e) = state.show_demo() {
                tracing::error!("Failed to build demo mesh: {e}");
            }
        }
        ui.separator();
        if ui.button("Quit").clicked() {
            ui.ctx().send_viewport_cmd(egui::ViewportCommand::Close);
        }
    });
}

fn save_mesh(state: &mut AppState) {
    let Some(path) = rfd::FileDialog::new()
        .set_title("Save mesh")
        .add_filter("Mesh JSON", &["json"])
        .set_file_name("mesh.json")
        .save_file()
    else {
        return;
    };
    match state.mesh.model.to_json() {
        Ok(json) => {
            if let Err(e) = std::fs::write(&path, json) {
                tracing::error!("Failed to write mesh: {e}");
                state.last_error = Some(e.to_string());
            } else {
                tracing::info!("Saved mesh to {}", path.display());
            }
        }
        Err(e) => tracing::error!("Failed to serialize mesh: {e}"),
    }
}

/// Show the view menu
pub fn view_menu(ui: &mut egui::Ui, state: &mut AppState, viewport: &mut ViewportPanel) {
    ui.menu_button("View", |ui| {
        if ui.button("Fit to mesh  (F)").clicked() {
            viewport.fit(state);
            ui.close_menu();
        }
        if ui.button("Reset camera  (Home)").clicked() {
            state.camera.reset();
            ui.close_menu();
        }
        ui.separator();
        ui.checkbox(&mut state.settings.overlays.show_edges, "Edge overlay  (E)");
        ui.checkbox(&mut state.settings.overlays.show_node_labels, "Node labels  (L)");
        ui.separator();
        ui.label("Fill");
        for mode in FillMode::all() {
            ui.radio_value(&mut state.settings.viewport.fill_mode, *mode, mode.display_name());
        }
        ui.separator();
        if ui
            .add_enabled(state.selection.is_some(), egui::Button::new("Clear selection  (Esc)"))
            .clicked()
        {
            state.selection = None;
            ui.close_menu();
        }
    });
}

/// Show the settings menu
pub fn settings_menu(ui: &mut egui::Ui, state: &mut AppState) {
    ui.menu_button("Settings", |ui| {
        if ui.button("Preferences…").clicked() {
            state.show_settings_window = true;
            ui.close_menu();
        }
    });
}

/// Show the settings window
pub fn settings_window(ctx: &egui::Context, state: &mut AppState) {
    let mut open = state.show_settings_window;
    egui::Window::new("Preferences")
        .open(&mut open)
        .resizable(true)
        .default_width(340.0)
        .show(ctx, |ui| {
            show_viewport_settings(ui, state);
            show_overlay_settings(ui, state);
            show_input_settings(ui, state);
            ui.separator();
            if ui.button("Reset to defaults").clicked() {
                state.settings = AppSettings::default();
            }
        });
    state.show_settings_window = open;
}

fn show_viewport_settings(ui: &mut egui::Ui, state: &mut AppState) {
    let vp = &mut state.settings.viewport;
    ui.heading("Viewport");
    ui.horizontal(|ui| {
        ui.label("Background");
        ui.color_edit_button_srgb(&mut vp.background_color);
    });
    ui.horizontal(|ui| {
        ui.label("Face color (uniform fill)");
        ui.color_edit_button_rgba_unmultiplied(&mut vp.triangle_color);
    });
    ui.horizontal(|ui| {
        ui.label("Edge color");
        ui.color_edit_button_rgba_unmultiplied(&mut vp.edge_color);
    });
    ui.horizontal(|ui| {
        ui.label("Selection");
        ui.color_edit_button_srgb(&mut vp.highlight_color);
    });
    ui.add_space(10.0);
}

fn show_overlay_settings(ui: &mut egui::Ui, state: &mut AppState) {
    let ov = &mut state.settings.overlays;
    ui.heading("Overlays");
    ui.checkbox(&mut ov.show_edges, "Show edges");
    ui.checkbox(&mut ov.show_node_labels, "Show node ids");
    ui.horizontal(|ui| {
        ui.label("Label size");
        ui.add(
            egui::DragValue::new(&mut ov.label_font_size)
                .speed(0.5)
                .range(6.0..=32.0)
                .suffix(" pt"),
        );
    });
    ui.add_space(10.0);
}

fn show_input_settings(ui: &mut egui::Ui, state: &mut AppState) {
    ui.heading("Input");
    ui.horizontal(|ui| {
        ui.label("Scroll per zoom step");
        ui.add(
            egui::DragValue::new(&mut state.settings.input.scroll_points_per_step)
                .speed(1.0)
                .range(5.0..=500.0)
                .suffix(" pt"),
        );
    });
}
