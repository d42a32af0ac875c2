// Library crate: exposes the testable viewer core for integration tests.
// GL resources and the egui shell (app, ui, GL renderer) stay in the binary crate.

pub mod error;
pub mod fixtures;
pub mod harness;
pub mod state;

/// Viewer core: draw-buffer synthesis, camera math and color-ID picking.
/// GPU upload and the GL pick pass live in the binary crate.
pub mod viewport {
    pub mod camera;
    pub mod edge;
    pub mod mesh;
    pub mod picking;
}
