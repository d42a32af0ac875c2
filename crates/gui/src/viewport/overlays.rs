//! Viewport overlay drawing (node labels, camera info, hints)

use egui::Painter;
use glam::Vec3;

use super::camera::{world_to_screen, OrthoCamera, ViewportSize};
use crate::state::AppState;

/// Above this many visible nodes labels are skipped
const MAX_LABELS: usize = 2000;

/// Draw node ids next to the nodes that are on screen
pub fn draw_node_labels(
    painter: &Painter,
    rect: egui::Rect,
    camera: &OrthoCamera,
    viewport: ViewportSize,
    state: &AppState,
) {
    let ppp = painter.ctx().pixels_per_point();
    let view = camera.view_matrix();
    let proj = camera.projection_matrix(viewport);
    let font = egui::FontId::monospace(state.settings.overlays.label_font_size);
    let color = egui::Color32::from_rgb(210, 210, 220);

    let model = &state.mesh.model;
    let mut drawn = 0;
    for &n in &state.mesh.draw.vertex_nodes {
        let Some(node) = model.node(n) else {
            continue;
        };
        let Some(px) = world_to_screen(
            Vec3::new(node.x as f32, node.y as f32, 0.0),
            &view,
            &proj,
            viewport,
        ) else {
            continue;
        };
        let pos = rect.min + egui::vec2(px.x, px.y) / ppp;
        if !rect.contains(pos) {
            continue;
        }
        painter.text(
            pos + egui::vec2(3.0, -2.0),
            egui::Align2::LEFT_BOTTOM,
            node.id.to_string(),
            font.clone(),
            color,
        );
        drawn += 1;
        if drawn >= MAX_LABELS {
            break;
        }
    }
}

pub fn draw_camera_info(
    painter: &Painter,
    rect: egui::Rect,
    camera: &OrthoCamera,
    cursor_world: Option<glam::DVec2>,
) {
    let overlay_rect = egui::Rect::from_min_size(
        egui::pos2(rect.right() - 170.0, rect.top() + 4.0),
        egui::vec2(166.0, 44.0),
    );
    painter.rect_filled(
        overlay_rect,
        4.0,
        egui::Color32::from_rgba_premultiplied(0, 0, 0, 140),
    );
    let cursor = match cursor_world {
        Some(w) => format!("({:.3}, {:.3})", w.x, w.y),
        None => "-".to_string(),
    };
    painter.text(
        overlay_rect.min + egui::vec2(6.0, 4.0),
        egui::Align2::LEFT_TOP,
        format!(
            "Zoom: {:.3} px/u\nCenter: ({:.2}, {:.2})\nCursor: {cursor}",
            camera.zoom, camera.center.x, camera.center.y,
        ),
        egui::FontId::monospace(10.0),
        egui::Color32::from_rgb(160, 160, 170),
    );
}

pub fn draw_navigation_hint(painter: &Painter, rect: egui::Rect) {
    painter.text(
        egui::pos2(rect.center().x, rect.bottom() - 20.0),
        egui::Align2::CENTER_BOTTOM,
        "Drag with right or middle button to pan, scroll to zoom, click a face to pick it",
        egui::FontId::proportional(11.0),
        egui::Color32::from_rgb(100, 100, 110),
    );
}
