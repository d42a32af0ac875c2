//! Headless viewer harness: drives mesh loading, camera input and picking
//! without a window, using the software pick backend.

use glam::{DVec2, Vec2, Vec3};
use mesh_model::{MeshModel, NodeId};

use crate::error::{LoadError, PickError};
use crate::state::MeshState;
use crate::viewport::camera::{world_to_screen, OrthoCamera, ViewportSize};
use crate::viewport::picking::{PickHit, PickingEngine, SoftwarePickTarget};

/// Headless stand-in for the viewport panel
pub struct ViewerHarness {
    pub mesh: MeshState,
    pub camera: OrthoCamera,
    pub viewport: ViewportSize,
    pub selection: Option<PickHit>,
    picker: PickingEngine<SoftwarePickTarget>,
}

impl ViewerHarness {
    /// Create an empty harness with a `width` x `height` viewport
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            mesh: MeshState::default(),
            camera: OrthoCamera::new(),
            viewport: ViewportSize::new(width, height),
            selection: None,
            picker: PickingEngine::new(SoftwarePickTarget::new()),
        }
    }

    // ── Mesh ──────────────────────────────────────────────────

    /// Show `model` and fit the view, like opening a file
    pub fn load_model(&mut self, model: MeshModel) -> Result<(), LoadError> {
        self.mesh.set_model(model, None)?;
        self.selection = None;
        self.fit();
        Ok(())
    }

    pub fn load_json(&mut self, json: &str) -> Result<(), LoadError> {
        let model = MeshModel::from_json(json)?;
        self.load_model(model)
    }

    // ── Camera input ──────────────────────────────────────────

    pub fn fit(&mut self) {
        if let Some(bounds) = self.mesh.model.bounds() {
            self.camera.fit_to_bounds(&bounds, self.viewport);
        }
    }

    /// Drag by a pixel delta
    pub fn drag(&mut self, dx: f64, dy: f64) {
        self.camera.pan(dx, dy);
    }

    /// Scroll `steps` wheel detents at pixel `(x, y)`
    pub fn scroll(&mut self, x: f64, y: f64, steps: f64) {
        self.camera.zoom_at(DVec2::new(x, y), steps, self.viewport);
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.viewport = ViewportSize::new(width, height);
    }

    // ── Picking ───────────────────────────────────────────────

    /// Click at pixel `(x, y)` and select whatever face is under it
    pub fn click(&mut self, x: f32, y: f32) -> Result<Option<PickHit>, PickError> {
        let hit = self.picker.pick_hit(
            &self.mesh.draw,
            &self.camera.view_matrix(),
            &self.camera.projection_matrix(self.viewport),
            self.viewport,
            Vec2::new(x, y),
        )?;
        self.selection = hit;
        Ok(hit)
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn world_at(&self, x: f64, y: f64) -> DVec2 {
        self.camera.screen_to_world(DVec2::new(x, y), self.viewport)
    }

    /// Pixel position of node `id`, if it exists and is in the depth range
    pub fn screen_of_node(&self, id: NodeId) -> Option<Vec2> {
        let node = self.mesh.model.node(self.mesh.model.find_node(id)?)?;
        world_to_screen(
            Vec3::new(node.x as f32, node.y as f32, 0.0),
            &self.camera.view_matrix(),
            &self.camera.projection_matrix(self.viewport),
            self.viewport,
        )
    }

    pub fn triangle_count(&self) -> usize {
        self.mesh.draw.triangle_count()
    }

    pub fn segment_count(&self) -> usize {
        self.mesh.overlay.len()
    }

    /// Number of pick-target allocations so far
    pub fn pick_target_allocations(&self) -> usize {
        self.picker.backend().allocations()
    }
}

impl Default for ViewerHarness {
    fn default() -> Self {
        Self::new(800, 600)
    }
}
