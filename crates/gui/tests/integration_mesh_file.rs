//! Integration tests for loading mesh documents from disk.

use std::path::PathBuf;

use qmvision_gui_lib::error::LoadError;
use qmvision_gui_lib::fixtures::{demo_mesh, UNIT_SQUARE_JSON};
use qmvision_gui_lib::harness::ViewerHarness;
use qmvision_gui_lib::state::{AppSettings, AppState, MeshState};

fn temp_file(name: &str, contents: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("qmvision_it_{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

#[test]
fn test_load_unit_square_from_disk() {
    let path = temp_file("unit_square.json", UNIT_SQUARE_JSON);
    let mut mesh = MeshState::default();
    mesh.load_file(&path).unwrap();

    assert_eq!(mesh.draw.triangle_count(), 2);
    assert_eq!(mesh.overlay.len(), 4);
    assert_eq!(mesh.display_name(), "unit_square.json");
    assert_eq!(mesh.source.as_deref(), Some(path.as_path()));
}

#[test]
fn test_saved_document_loads_back() {
    let model = demo_mesh(5, 3);
    let path = temp_file("demo.json", &model.to_json().unwrap());

    let mut mesh = MeshState::default();
    mesh.load_file(&path).unwrap();
    assert_eq!(mesh.model.to_document(), model.to_document());
}

#[test]
fn test_invalid_json_is_reported() {
    let path = temp_file("broken.json", "{ \"nodes\": [ ");
    let mut mesh = MeshState::default();
    let err = mesh.load_file(&path).unwrap_err();
    assert!(matches!(err, LoadError::Mesh(_)));
    assert_eq!(mesh.revision, 0);
}

#[test]
fn test_dangling_node_reference_is_reported() {
    let json = r#"{
      "nodes": [{"id": 1, "x": 0.0, "y": 0.0}],
      "edges": [{"left": 1, "right": 9}],
      "elements": []
    }"#;
    let path = temp_file("dangling.json", json);
    let err = MeshState::default().load_file(&path).unwrap_err();
    assert!(matches!(err, LoadError::Mesh(_)));
}

#[test]
fn test_failed_open_keeps_current_mesh() {
    let mut state = AppState::with_settings(AppSettings::default());
    state.show_model(demo_mesh(2, 2)).unwrap();
    let triangles = state.mesh.draw.triangle_count();

    let missing = std::env::temp_dir().join("qmvision_missing_mesh.json");
    assert!(state.open_file(&missing).is_err());
    assert!(state.last_error.is_some());
    assert_eq!(state.mesh.draw.triangle_count(), triangles);
}

#[test]
fn test_harness_load_json_fits_view() {
    let mut h = ViewerHarness::new(300, 300);
    h.load_json(UNIT_SQUARE_JSON).unwrap();
    assert_eq!(h.triangle_count(), 2);
    assert_eq!(h.segment_count(), 4);

    let p = h.screen_of_node(1).unwrap();
    let q = h.screen_of_node(3).unwrap();
    // Node 1 is bottom-left, node 3 top-right on screen
    assert!(p.x < q.x && p.y > q.y);
}
