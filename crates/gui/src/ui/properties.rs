//! Properties panel: mesh statistics and the picked face

use egui::Ui;
use mesh_model::{Element, ElementKind, MeshModel};

use crate::state::AppState;

pub fn show(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Mesh");
    ui.separator();
    show_mesh_stats(ui, state);

    ui.add_space(10.0);
    ui.heading("Selection");
    ui.separator();

    let Some(hit) = state.selection else {
        ui.add_space(6.0);
        ui.vertical_centered(|ui| {
            ui.weak("Click a face to inspect it");
        });
        return;
    };

    let Some(element) = state.mesh.model.element(hit.element) else {
        ui.weak("Selected face no longer exists");
        return;
    };

    egui::Grid::new("selection_grid")
        .num_columns(2)
        .striped(true)
        .show(ui, |ui| {
            ui.label("Element");
            ui.monospace(hit.element.0.to_string());
            ui.end_row();

            ui.label("Kind");
            ui.label(kind_name(element.kind()));
            ui.end_row();

            ui.label("Triangle");
            ui.monospace(hit.triangle.to_string());
            ui.end_row();

            ui.label("Nodes");
            ui.monospace(node_list(&state.mesh.model, element));
            ui.end_row();
        });

    ui.add_space(6.0);
    if ui.button("Clear selection").clicked() {
        state.selection = None;
    }
}

fn show_mesh_stats(ui: &mut Ui, state: &AppState) {
    let model = &state.mesh.model;
    let quads = model
        .elements()
        .iter()
        .filter(|e| e.kind() == ElementKind::Quad)
        .count();
    let triangles = model.elements().len() - quads;

    egui::Grid::new("mesh_stats_grid")
        .num_columns(2)
        .show(ui, |ui| {
            ui.label("Source");
            ui.label(state.mesh.display_name());
            ui.end_row();

            ui.label("Nodes");
            ui.monospace(model.nodes().len().to_string());
            ui.end_row();

            ui.label("Quads / triangles");
            ui.monospace(format!("{quads} / {triangles}"));
            ui.end_row();

            ui.label("Draw triangles");
            ui.monospace(state.mesh.draw.triangle_count().to_string());
            ui.end_row();

            ui.label("Edges drawn");
            ui.monospace(state.mesh.overlay.len().to_string());
            ui.end_row();

            if let Some(b) = model.bounds() {
                ui.label("Extent");
                ui.monospace(format!("{:.3} x {:.3}", b.width(), b.height()));
                ui.end_row();
            }
        });
}

fn kind_name(kind: ElementKind) -> &'static str {
    match kind {
        ElementKind::Quad => "Quad",
        ElementKind::Triangle => "Triangle",
    }
}

/// External ids of the nodes an element's edges touch, in first-seen order
fn node_list(model: &MeshModel, element: &Element) -> String {
    let mut ids = Vec::new();
    for edge in element.edges().iter().filter_map(|&e| model.edge(e)) {
        for n in [edge.left, edge.right].into_iter().flatten() {
            if let Some(node) = model.node(n) {
                if !ids.contains(&node.id) {
                    ids.push(node.id);
                }
            }
        }
    }
    ids.iter().map(|id| id.to_string()).collect::<Vec<_>>().join(", ")
}
