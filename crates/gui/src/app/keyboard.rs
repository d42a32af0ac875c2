//! Keyboard shortcut handling

use eframe::egui;

use crate::state::AppState;
use crate::viewport::ViewportPanel;

/// Handle keyboard shortcuts for the application
pub fn handle_keyboard(ctx: &egui::Context, state: &mut AppState, viewport: &mut ViewportPanel) {
    // Don't handle shortcuts when a text field is focused
    if ctx.memory(|m| m.focused().is_some()) {
        return;
    }

    ctx.input(|i| {
        // F: fit view to mesh
        if i.key_pressed(egui::Key::F) {
            viewport.fit(state);
        }
        // Home: reset camera
        if i.key_pressed(egui::Key::Home) {
            state.camera.reset();
        }
        // E: toggle edge overlay
        if i.key_pressed(egui::Key::E) {
            state.settings.overlays.show_edges = !state.settings.overlays.show_edges;
        }
        // L: toggle node labels
        if i.key_pressed(egui::Key::L) {
            state.settings.overlays.show_node_labels = !state.settings.overlays.show_node_labels;
        }
        // Escape: clear selection
        if i.key_pressed(egui::Key::Escape) {
            state.selection = None;
        }
    });
}
