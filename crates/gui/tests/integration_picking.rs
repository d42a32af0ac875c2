//! Integration tests for camera input and color-ID picking through the headless harness.

use approx::assert_relative_eq;
use glam::DVec2;
use mesh_model::ElementKind;
use qmvision_gui_lib::fixtures::*;
use qmvision_gui_lib::harness::ViewerHarness;
use qmvision_gui_lib::viewport::camera::FIT_MARGIN;

#[test]
fn test_click_picks_face_under_cursor() {
    let mut h = ViewerHarness::new(400, 300);
    h.load_model(quad_with_triangle()).unwrap();

    // Apex side of the triangle, right of the shared edge
    let target = h.camera.project(DVec2::new(1.6, 0.5), h.viewport).unwrap();
    let hit = h.click(target.x as f32, target.y as f32).unwrap().unwrap();
    let kind = h.mesh.model.element(hit.element).unwrap().kind();
    assert_eq!(kind, ElementKind::Triangle);
    assert_eq!(h.selection, Some(hit));

    // Inside the quad, near its lower-left corner
    let target = h.camera.project(DVec2::new(0.2, 0.1), h.viewport).unwrap();
    let hit = h.click(target.x as f32, target.y as f32).unwrap().unwrap();
    assert_eq!(hit.element.0, 0);
    assert_eq!(hit.triangle, 0);
}

#[test]
fn test_click_outside_clears_selection() {
    let mut h = ViewerHarness::new(400, 300);
    h.load_model(unit_square_quad()).unwrap();
    let center = h.camera.project(DVec2::new(0.5, 0.4), h.viewport).unwrap();
    assert!(h.click(center.x as f32, center.y as f32).unwrap().is_some());

    // Top-left corner of the viewport is margin after a fit
    assert!(h.click(1.0, 1.0).unwrap().is_none());
    assert!(h.selection.is_none());
}

#[test]
fn test_pick_follows_pan_and_zoom() {
    let mut h = ViewerHarness::new(640, 480);
    h.load_model(demo_mesh(6, 4)).unwrap();

    h.drag(35.0, -20.0);
    h.scroll(100.0, 380.0, 4.0);
    h.scroll(500.0, 90.0, -2.5);

    // Click each on-screen triangle at its centroid; it must come back
    let mut checked = 0;
    for t in 0..h.triangle_count() {
        let [a, b, c] = h.mesh.draw.triangle_positions(t).unwrap();
        let centroid = DVec2::new(
            (a[0] + b[0] + c[0]) as f64 / 3.0,
            (a[1] + b[1] + c[1]) as f64 / 3.0,
        );
        let p = h.camera.project(centroid, h.viewport).unwrap();
        if p.x < 1.0 || p.y < 1.0 || p.x > 639.0 || p.y > 479.0 {
            continue;
        }
        let hit = h.click(p.x as f32, p.y as f32).unwrap();
        assert_eq!(hit.map(|hit| hit.triangle), Some(t), "centroid of triangle {t} at {p:?}");
        checked += 1;
    }
    assert!(checked >= 10, "only {checked} triangles on screen");
}

#[test]
fn test_fit_shows_whole_mesh() {
    let mut h = ViewerHarness::new(800, 400);
    h.load_model(demo_mesh(10, 5)).unwrap();

    assert_relative_eq!(h.camera.center.x, 5.0, epsilon = 1e-9);
    assert_relative_eq!(h.camera.center.y, 2.5, epsilon = 1e-9);
    let expected = (800.0 / (10.0 * FIT_MARGIN)).min(400.0 / (5.0 * FIT_MARGIN));
    assert_relative_eq!(h.camera.zoom, expected, epsilon = 1e-9);

    // Every node projects inside the viewport
    for node in h.mesh.model.nodes() {
        let p = h.screen_of_node(node.id).unwrap();
        assert!(p.x >= 0.0 && p.x <= 800.0 && p.y >= 0.0 && p.y <= 400.0);
    }
}

#[test]
fn test_resize_reallocates_pick_target() {
    let mut h = ViewerHarness::new(200, 200);
    h.load_model(unit_square_quad()).unwrap();
    h.click(100.0, 100.0).unwrap();
    h.click(90.0, 110.0).unwrap();
    assert_eq!(h.pick_target_allocations(), 1);

    h.resize(320, 240);
    h.fit();
    h.click(160.0, 120.0).unwrap();
    assert_eq!(h.pick_target_allocations(), 2);
}

#[test]
fn test_pick_on_empty_mesh() {
    let mut h = ViewerHarness::new(200, 200);
    assert!(h.click(100.0, 100.0).unwrap().is_none());
    assert_eq!(h.pick_target_allocations(), 0);
}
