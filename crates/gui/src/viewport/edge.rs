//! Wireframe overlay: one line segment per undirected mesh edge

use std::collections::HashSet;

use mesh_model::{MeshModel, NodeId};

/// Deduplicated edge segments, in first-seen order
#[derive(Debug, Clone, Default)]
pub struct EdgeOverlay {
    /// Segment endpoints in world units, z = 0
    pub segments: Vec<[[f32; 3]; 2]>,
    /// Canonical `(smaller id, larger id)` node pair of each segment
    pub keys: Vec<(NodeId, NodeId)>,
}

impl EdgeOverlay {
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Two vertices per segment
    pub fn vertex_count(&self) -> usize {
        self.segments.len() * 2
    }
}

/// Collect every edge of every element, collapsing `(a, b)` and `(b, a)`.
///
/// Degenerate edges (a missing endpoint or both ends on one node) and
/// dangling references are skipped.
pub fn build_edge_overlay(model: &MeshModel) -> EdgeOverlay {
    let mut seen: HashSet<(NodeId, NodeId)> = HashSet::new();
    let mut overlay = EdgeOverlay::default();

    for element in model.elements() {
        for &e in element.edges() {
            let Some((a, b)) = model.edge(e).and_then(|edge| edge.endpoints()) else {
                continue;
            };
            let (Some(na), Some(nb)) = (model.node(a), model.node(b)) else {
                continue;
            };
            if na.id == nb.id {
                continue;
            }

            let (lo, hi) = if na.id <= nb.id { (na, nb) } else { (nb, na) };
            if !seen.insert((lo.id, hi.id)) {
                continue;
            }
            overlay.keys.push((lo.id, hi.id));
            overlay.segments.push([
                [lo.x as f32, lo.y as f32, 0.0],
                [hi.x as f32, hi.y as f32, 0.0],
            ]);
        }
    }

    overlay
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use mesh_model::Edge;

    #[test]
    fn test_shared_edge_collapses() {
        let m = fixtures::quad_with_triangle();
        let overlay = build_edge_overlay(&m);
        // 4 quad sides + 2 new triangle sides; the shared side appears once
        assert_eq!(overlay.len(), 6);
        assert_eq!(overlay.vertex_count(), 12);
    }

    #[test]
    fn test_reversed_duplicate_edges_collapse() {
        let mut m = mesh_model::MeshModel::new();
        let a = m.add_node(1, 0.0, 0.0).unwrap();
        let b = m.add_node(2, 1.0, 0.0).unwrap();
        let c = m.add_node(3, 0.0, 1.0).unwrap();
        let ab = m.add_edge(a, b);
        let bc = m.add_edge(b, c);
        let ca = m.add_edge(c, a);
        let ba = m.add_edge(b, a);
        let cb = m.add_edge(c, b);
        let ac = m.add_edge(a, c);
        m.add_triangle([ab, bc, ca]);
        m.add_triangle([ba, cb, ac]);

        let overlay = build_edge_overlay(&m);
        assert_eq!(overlay.keys, vec![(1, 2), (2, 3), (1, 3)]);
    }

    #[test]
    fn test_segments_use_canonical_order() {
        let m = fixtures::quad_with_triangle();
        let overlay = build_edge_overlay(&m);
        for (key, seg) in overlay.keys.iter().zip(&overlay.segments) {
            assert!(key.0 < key.1);
            let lo = m.node(m.find_node(key.0).unwrap()).unwrap();
            assert_eq!(seg[0], [lo.x as f32, lo.y as f32, 0.0]);
        }
    }

    #[test]
    fn test_degenerate_edges_skipped() {
        let mut m = fixtures::unit_square_quad();
        let n = m.find_node(2).unwrap();
        let broken = m.push_edge(Edge {
            left: None,
            right: Some(n),
        });
        m.push_element(mesh_model::Element::Triangle {
            edges: vec![broken],
        });

        let overlay = build_edge_overlay(&m);
        assert_eq!(overlay.len(), 4);
    }

    #[test]
    fn test_self_loop_edge_skipped() {
        let mut m = mesh_model::MeshModel::new();
        let a = m.add_node(1, 0.0, 0.0).unwrap();
        let b = m.add_node(2, 1.0, 0.0).unwrap();
        let ab = m.add_edge(a, b);
        let aa = m.add_edge(a, a);
        m.add_triangle([ab, aa, ab]);

        let overlay = build_edge_overlay(&m);
        assert_eq!(overlay.keys, vec![(1, 2)]);
        assert!(overlay.segments.iter().all(|[p, q]| p != q));
    }

    #[test]
    fn test_one_segment_per_pair_on_grid() {
        let m = fixtures::demo_mesh(4, 3);
        let overlay = build_edge_overlay(&m);
        let unique: HashSet<_> = overlay.keys.iter().collect();
        assert_eq!(unique.len(), overlay.len());
        // Every edge in the grid fixture is referenced by some element
        assert_eq!(overlay.len(), m.edges().len());
    }
}
