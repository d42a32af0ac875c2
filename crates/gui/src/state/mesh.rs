use std::path::{Path, PathBuf};

use mesh_model::MeshModel;

use crate::error::LoadError;
use crate::viewport::edge::{build_edge_overlay, EdgeOverlay};
use crate::viewport::mesh::{build_draw_buffer, DrawBuffer, TopologyError};

/// The loaded mesh and the CPU buffers derived from it
#[derive(Debug, Default)]
pub struct MeshState {
    pub model: MeshModel,
    pub draw: DrawBuffer,
    pub overlay: EdgeOverlay,
    /// Bumped whenever the buffers change; GPU copies compare against it
    pub revision: u64,
    /// File the model came from, `None` for generated meshes
    pub source: Option<PathBuf>,
}

impl MeshState {
    /// Replace the model. On error the previous model and buffers stay in place.
    pub fn set_model(&mut self, model: MeshModel, source: Option<PathBuf>) -> Result<(), TopologyError> {
        let draw = build_draw_buffer(&model)?;
        let overlay = build_edge_overlay(&model);
        tracing::info!(
            nodes = model.nodes().len(),
            elements = model.elements().len(),
            triangles = draw.triangle_count(),
            segments = overlay.len(),
            "Mesh loaded"
        );
        self.model = model;
        self.draw = draw;
        self.overlay = overlay;
        self.source = source;
        self.revision += 1;
        Ok(())
    }

    /// Read a JSON mesh document from disk
    pub fn load_file(&mut self, path: &Path) -> Result<(), LoadError> {
        let json = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let model = MeshModel::from_json(&json)?;
        self.set_model(model, Some(path.to_path_buf()))?;
        Ok(())
    }

    /// Rebuild the buffers after the model was edited in place
    pub fn rebuild(&mut self) -> Result<(), TopologyError> {
        self.draw = build_draw_buffer(&self.model)?;
        self.overlay = build_edge_overlay(&self.model);
        self.revision += 1;
        Ok(())
    }

    pub fn clear(&mut self) {
        self.model.clear();
        self.draw = DrawBuffer::default();
        self.overlay = EdgeOverlay::default();
        self.source = None;
        self.revision += 1;
    }

    pub fn display_name(&self) -> String {
        self.source
            .as_ref()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "demo mesh".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    #[test]
    fn test_set_model_bumps_revision() {
        let mut s = MeshState::default();
        s.set_model(fixtures::unit_square_quad(), None).unwrap();
        assert_eq!(s.revision, 1);
        assert_eq!(s.draw.triangle_count(), 2);
        assert_eq!(s.overlay.len(), 4);

        s.set_model(fixtures::quad_with_triangle(), None).unwrap();
        assert_eq!(s.revision, 2);
        assert_eq!(s.draw.triangle_count(), 3);
    }

    #[test]
    fn test_rebuild_follows_moved_node() {
        let mut s = MeshState::default();
        s.set_model(fixtures::unit_square_quad(), None).unwrap();
        let n = s.model.find_node(3).unwrap();
        assert!(s.model.set_node_position(n, 2.0, 2.0));
        s.rebuild().unwrap();

        assert_eq!(s.draw.positions[2], [2.0, 2.0, 0.0]);
        assert_eq!(s.revision, 2);
    }

    #[test]
    fn test_missing_file_keeps_previous_mesh() {
        let mut s = MeshState::default();
        s.set_model(fixtures::unit_square_quad(), None).unwrap();
        let err = s
            .load_file(Path::new("/nonexistent/qmvision/mesh.json"))
            .unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
        assert_eq!(s.revision, 1);
        assert_eq!(s.draw.triangle_count(), 2);
    }

    #[test]
    fn test_clear() {
        let mut s = MeshState::default();
        s.set_model(fixtures::demo_mesh(2, 2), None).unwrap();
        s.clear();
        assert!(s.draw.is_empty());
        assert!(s.overlay.is_empty());
        assert!(s.model.bounds().is_none());
        assert_eq!(s.display_name(), "demo mesh");
    }
}
