//! Software rendering for the viewport
//!
//! Used when no GL context is available. Faces and edges are tessellated by
//! egui's painter from the same CPU buffers the GL path uploads.

use egui::{Color32, Pos2, Rect, Stroke, Ui};
use glam::DVec2;

use super::camera::{OrthoCamera, ViewportSize};
use crate::state::{AppState, FillMode};

fn color_from_rgba(c: [f32; 4]) -> Color32 {
    Color32::from_rgba_unmultiplied(
        (c[0] * 255.0) as u8,
        (c[1] * 255.0) as u8,
        (c[2] * 255.0) as u8,
        (c[3] * 255.0) as u8,
    )
}

/// Map a world point to a position inside `rect`
fn to_screen(
    camera: &OrthoCamera,
    rect: Rect,
    viewport: ViewportSize,
    ppp: f32,
    p: [f32; 3],
) -> Option<Pos2> {
    let px = camera.project(DVec2::new(p[0] as f64, p[1] as f64), viewport)?;
    Some(rect.min + egui::vec2(px.x as f32, px.y as f32) / ppp)
}

/// Paint the viewport using egui's painter
pub fn paint_viewport(
    ui: &Ui,
    rect: Rect,
    camera: &OrthoCamera,
    viewport: ViewportSize,
    state: &AppState,
) {
    let painter = ui.painter_at(rect);
    let ppp = ui.ctx().pixels_per_point();
    let settings = &state.settings;

    // Background
    let bg = &settings.viewport.background_color;
    painter.rect_filled(rect, 0.0, Color32::from_rgb(bg[0], bg[1], bg[2]));

    let draw = &state.mesh.draw;
    if !draw.is_empty() {
        let uniform = color_from_rgba(settings.viewport.triangle_color);
        let mut mesh = egui::Mesh::default();
        for (p, c) in draw.positions.iter().zip(&draw.colors) {
            let pos = to_screen(camera, rect, viewport, ppp, *p).unwrap_or(rect.min);
            let color = match settings.viewport.fill_mode {
                FillMode::ElementType => color_from_rgba(*c),
                FillMode::Uniform => uniform,
            };
            mesh.colored_vertex(pos, color);
        }
        mesh.indices.extend_from_slice(&draw.indices);
        painter.add(egui::Shape::mesh(mesh));
    }

    // Selected face
    if let Some(hit) = state.selection {
        let hl = settings.viewport.highlight_color;
        let color = Color32::from_rgb(hl[0], hl[1], hl[2]);
        for t in draw.triangles_of(hit.element) {
            let Some(corners) = draw.triangle_positions(t) else {
                continue;
            };
            let pts: Vec<Pos2> = corners
                .iter()
                .filter_map(|p| to_screen(camera, rect, viewport, ppp, *p))
                .collect();
            if pts.len() == 3 {
                painter.add(egui::Shape::convex_polygon(pts, color, Stroke::NONE));
            }
        }
    }

    if settings.overlays.show_edges {
        let stroke = Stroke::new(1.0, color_from_rgba(settings.viewport.edge_color));
        for [a, b] in &state.mesh.overlay.segments {
            if let (Some(a), Some(b)) = (
                to_screen(camera, rect, viewport, ppp, *a),
                to_screen(camera, rect, viewport, ppp, *b),
            ) {
                painter.line_segment([a, b], stroke);
            }
        }
    }
}
