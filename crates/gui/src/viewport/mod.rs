//! 2D mesh viewport panel with OpenGL rendering

mod gl_picker;
mod gl_renderer;
mod gpu;
mod overlays;
mod renderer;
pub use qmvision_gui_lib::viewport::{camera, edge, mesh, picking};

use std::sync::{Arc, Mutex};

use egui::Ui;
use glam::{DVec2, Vec2};

use crate::state::AppState;
use camera::ViewportSize;
use edge::EdgeOverlay;
use gl_renderer::{GlRenderer, RenderParams};
use mesh::DrawBuffer;
use picking::{PickHit, PickingEngine, SoftwarePickTarget};

/// CPU buffers handed to the paint callback, shared until the mesh changes
pub struct MeshBuffers {
    pub revision: u64,
    pub draw: DrawBuffer,
    pub overlay: EdgeOverlay,
}

/// Viewport panel: camera input, face picking and rendering
pub struct ViewportPanel {
    gl_renderer: Option<Arc<Mutex<GlRenderer>>>,
    /// Used for picking when there is no GL renderer
    software_picker: PickingEngine<SoftwarePickTarget>,
    buffers: Arc<MeshBuffers>,
    /// Physical size of the viewport in the last frame
    last_size: ViewportSize,
}

impl ViewportPanel {
    pub fn new() -> Self {
        Self {
            gl_renderer: None,
            software_picker: PickingEngine::new(SoftwarePickTarget::new()),
            buffers: Arc::new(MeshBuffers {
                revision: 0,
                draw: DrawBuffer::default(),
                overlay: EdgeOverlay::default(),
            }),
            last_size: ViewportSize::new(0, 0),
        }
    }

    /// Initialize GL renderer (must be called with a GL context).
    /// On failure the panel keeps using the software renderer.
    pub fn init_gl(&mut self, gl: &glow::Context) {
        match GlRenderer::new(gl) {
            Ok(renderer) => self.gl_renderer = Some(Arc::new(Mutex::new(renderer))),
            Err(e) => tracing::error!("GL renderer unavailable, falling back to software: {e}"),
        }
    }

    /// Release GL resources (called when the app exits)
    pub fn destroy_gl(&mut self, gl: &glow::Context) {
        if let Some(renderer) = self.gl_renderer.take() {
            if let Ok(mut r) = renderer.lock() {
                r.destroy(gl);
            }
        }
    }

    pub fn has_gl(&self) -> bool {
        self.gl_renderer.is_some()
    }

    pub fn fit(&mut self, state: &mut AppState) {
        if let Some(bounds) = state.mesh.model.bounds() {
            state.camera.fit_to_bounds(&bounds, self.last_size);
        }
    }

    pub fn show(&mut self, ui: &mut Ui, state: &mut AppState) {
        let (rect, response) =
            ui.allocate_exact_size(ui.available_size(), egui::Sense::click_and_drag());
        let ppp = ui.ctx().pixels_per_point();
        let viewport = ViewportSize::new(
            (rect.width() * ppp).round().max(0.0) as u32,
            (rect.height() * ppp).round().max(0.0) as u32,
        );
        self.last_size = viewport;

        // ── Fit after load (needs the real viewport size) ───────
        if state.fit_requested && !viewport.is_empty() {
            self.fit(state);
            state.fit_requested = false;
        }

        self.refresh_buffers(state);
        self.collect_pick_outcome(state);

        // ── Camera controls ─────────────────────────────────────
        self.handle_camera(&response, ui, rect, viewport, state);

        // ── Face selection via click ────────────────────────────
        if response.clicked() {
            if let Some(pos) = response.interact_pointer_pos() {
                let pixel = to_pixel(pos, rect, ppp);
                self.pick(pixel, viewport, state);
                ui.ctx().request_repaint();
            }
        }

        if !ui.is_rect_visible(rect) {
            return;
        }

        self.render(ui, rect, viewport, state);

        // ── Overlays ────────────────────────────────────────────
        let painter = ui.painter_at(rect);
        if state.settings.overlays.show_node_labels {
            overlays::draw_node_labels(&painter, rect, &state.camera, viewport, state);
        }
        let cursor_world = response
            .hover_pos()
            .map(|p| state.camera.screen_to_world(to_pixel(p, rect, ppp).as_dvec2(), viewport));
        overlays::draw_camera_info(&painter, rect, &state.camera, cursor_world);
        if state.mesh.draw.is_empty() {
            overlays::draw_navigation_hint(&painter, rect);
        }
    }

    /// Share a fresh copy of the CPU buffers when the mesh changed
    fn refresh_buffers(&mut self, state: &AppState) {
        if self.buffers.revision == state.mesh.revision {
            return;
        }
        self.buffers = Arc::new(MeshBuffers {
            revision: state.mesh.revision,
            draw: state.mesh.draw.clone(),
            overlay: state.mesh.overlay.clone(),
        });
    }

    /// Apply the result of a pick the paint callback ran last frame
    fn collect_pick_outcome(&mut self, state: &mut AppState) {
        let Some(renderer) = &self.gl_renderer else {
            return;
        };
        let Ok(mut r) = renderer.lock() else {
            return;
        };
        let Some(outcome) = r.take_pick_outcome() else {
            return;
        };
        if outcome.revision != state.mesh.revision {
            tracing::debug!("dropping pick against stale mesh revision {}", outcome.revision);
            return;
        }
        match outcome.result {
            Ok(hit) => {
                state.selection = hit.and_then(|t| PickHit::resolve(&state.mesh.draw, t));
                log_selection(state.selection);
            }
            Err(e) => {
                tracing::error!("Pick failed: {e}");
                state.selection = None;
            }
        }
    }

    fn pick(&mut self, pixel: Vec2, viewport: ViewportSize, state: &mut AppState) {
        if let Some(renderer) = &self.gl_renderer {
            if let Ok(mut r) = renderer.lock() {
                r.request_pick(pixel);
            }
            return;
        }

        let result = self.software_picker.pick_hit(
            &state.mesh.draw,
            &state.camera.view_matrix(),
            &state.camera.projection_matrix(viewport),
            viewport,
            pixel,
        );
        match result {
            Ok(hit) => {
                state.selection = hit;
                log_selection(hit);
            }
            Err(e) => {
                tracing::error!("Pick failed: {e}");
                state.selection = None;
            }
        }
    }

    fn handle_camera(
        &mut self,
        response: &egui::Response,
        ui: &Ui,
        rect: egui::Rect,
        viewport: ViewportSize,
        state: &mut AppState,
    ) {
        let ppp = ui.ctx().pixels_per_point();

        // Pan with secondary or middle drag
        if response.dragged_by(egui::PointerButton::Secondary)
            || response.dragged_by(egui::PointerButton::Middle)
        {
            let delta = response.drag_delta() * ppp;
            state.camera.pan(delta.x as f64, delta.y as f64);
        }

        // Scroll zoom around the cursor
        if response.hovered() {
            let scroll = ui.input(|i| i.smooth_scroll_delta.y);
            if scroll.abs() > 0.1 {
                let per_step = state.settings.input.scroll_points_per_step.max(1.0);
                let steps = (scroll / per_step) as f64;
                let anchor = response
                    .hover_pos()
                    .map(|p| to_pixel(p, rect, ppp).as_dvec2())
                    .unwrap_or(DVec2::new(
                        viewport.width as f64 * 0.5,
                        viewport.height as f64 * 0.5,
                    ));
                state.camera.zoom_at(anchor, steps, viewport);
            }
        }
    }

    fn render(&self, ui: &mut Ui, rect: egui::Rect, viewport: ViewportSize, state: &AppState) {
        let Some(gl_renderer) = &self.gl_renderer else {
            // Fallback: egui painter rendering
            renderer::paint_viewport(ui, rect, &state.camera, viewport, state);
            return;
        };

        let settings = &state.settings;
        let highlight: Vec<usize> = state
            .selection
            .map(|hit| self.buffers.draw.triangles_of(hit.element).collect())
            .unwrap_or_default();
        let hl = settings.viewport.highlight_color;
        let params = RenderParams {
            size: viewport,
            view: state.camera.view_matrix(),
            proj: state.camera.projection_matrix(viewport),
            bg_color: settings.viewport.background_color,
            fill_mode: settings.viewport.fill_mode,
            face_color: settings.viewport.triangle_color,
            edge_color: settings.viewport.edge_color,
            show_edges: settings.overlays.show_edges,
            highlight,
            highlight_color: [hl[0] as f32 / 255.0, hl[1] as f32 / 255.0, hl[2] as f32 / 255.0, 1.0],
        };

        let renderer = gl_renderer.clone();
        let buffers = self.buffers.clone();
        let repaint = ui.ctx().clone();

        let callback = egui::PaintCallback {
            rect,
            callback: Arc::new(egui_glow::CallbackFn::new(move |info, painter| {
                let gl = painter.gl();
                let vp = info.viewport_in_pixels();
                let origin = [vp.left_px, vp.from_bottom_px];

                if let Ok(mut r) = renderer.lock() {
                    r.sync_mesh(gl, &buffers);
                    r.run_pending_pick(gl, &buffers, &params, painter.intermediate_fbo());
                    if r.has_pick_outcome() {
                        repaint.request_repaint();
                    }
                    r.paint(gl, origin, &params);
                }
            })),
        };

        ui.painter().add(callback);
    }
}

impl Default for ViewportPanel {
    fn default() -> Self {
        Self::new()
    }
}

/// Pointer position (points) to a viewport pixel (top-left origin)
fn to_pixel(pos: egui::Pos2, rect: egui::Rect, ppp: f32) -> Vec2 {
    let local = (pos - rect.min) * ppp;
    Vec2::new(local.x, local.y)
}

fn log_selection(hit: Option<PickHit>) {
    match hit {
        Some(hit) => tracing::info!(
            triangle = hit.triangle,
            element = hit.element.0,
            "Picked face"
        ),
        None => tracing::debug!("pick missed"),
    }
}
