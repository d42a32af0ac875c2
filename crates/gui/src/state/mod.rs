pub mod mesh;
pub mod settings;

use std::path::Path;

pub use mesh::MeshState;
pub use settings::{AppSettings, FillMode};

use crate::error::LoadError;
use crate::viewport::camera::OrthoCamera;
use crate::viewport::mesh::TopologyError;
use crate::viewport::picking::PickHit;
use mesh_model::MeshModel;

/// Combined application state
pub struct AppState {
    pub mesh: MeshState,
    pub camera: OrthoCamera,
    /// Face under the last pick, if any
    pub selection: Option<PickHit>,
    pub settings: AppSettings,
    /// Fit the camera to the mesh on the next frame (needs the viewport size)
    pub fit_requested: bool,
    /// Show settings window
    pub show_settings_window: bool,
    /// Last load failure, shown in the status bar
    pub last_error: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::with_settings(AppSettings::load())
    }
}

impl AppState {
    pub fn with_settings(settings: AppSettings) -> Self {
        Self {
            mesh: MeshState::default(),
            camera: OrthoCamera::new(),
            selection: None,
            settings,
            fit_requested: false,
            show_settings_window: false,
            last_error: None,
        }
    }

    /// Show `model`, dropping the selection and fitting the view to it
    pub fn show_model(&mut self, model: MeshModel) -> Result<(), TopologyError> {
        self.mesh.set_model(model, None)?;
        self.after_load();
        Ok(())
    }

    /// Show the built-in demo grid
    pub fn show_demo(&mut self) -> Result<(), TopologyError> {
        let (cols, rows) = crate::fixtures::DEMO_GRID;
        self.show_model(crate::fixtures::demo_mesh(cols, rows))
    }

    pub fn open_file(&mut self, path: &Path) -> Result<(), LoadError> {
        match self.mesh.load_file(path) {
            Ok(()) => {
                self.after_load();
                Ok(())
            }
            Err(e) => {
                tracing::error!("Failed to open {}: {e}", path.display());
                self.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    fn after_load(&mut self) {
        self.selection = None;
        self.fit_requested = true;
        self.last_error = None;
    }
}
