//! Indexed draw buffers synthesized from mesh topology.
//!
//! Every distinct node gets exactly one vertex slot, in first-seen order.
//! Quads are fan-split along their `n0-n2` diagonal; triangles pass through.

use std::collections::HashMap;

use mesh_model::{EdgeIndex, Element, ElementIndex, MeshModel, NodeIndex};
use thiserror::Error;

/// Vertex color for nodes first introduced by a quad
pub const QUAD_VERTEX_COLOR: [f32; 4] = [0.2, 0.7, 1.0, 1.0];
/// Vertex color for nodes first introduced by a triangle
pub const TRIANGLE_VERTEX_COLOR: [f32; 4] = [0.8, 0.2, 0.2, 1.0];

const MAX_VERTICES: usize = u32::MAX as usize;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TopologyError {
    #[error("mesh needs {vertices} vertex slots, more than a 32-bit index can address")]
    IndexOverflow { vertices: usize },
}

/// CPU-side triangle mesh ready for indexed rendering
#[derive(Debug, Clone, Default)]
pub struct DrawBuffer {
    /// One position per vertex slot, z = 0
    pub positions: Vec<[f32; 3]>,
    /// One RGBA color per vertex slot
    pub colors: Vec<[f32; 4]>,
    /// Three indices per triangle
    pub indices: Vec<u32>,
    /// Node behind each vertex slot
    pub vertex_nodes: Vec<NodeIndex>,
    /// Element each triangle was cut from
    pub triangle_elements: Vec<ElementIndex>,
}

impl DrawBuffer {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Vertex slots of triangle `t`
    pub fn triangle(&self, t: usize) -> Option<[u32; 3]> {
        let tri = self.indices.get(t * 3..t * 3 + 3)?;
        Some([tri[0], tri[1], tri[2]])
    }

    pub fn triangle_positions(&self, t: usize) -> Option<[[f32; 3]; 3]> {
        let [a, b, c] = self.triangle(t)?;
        Some([
            *self.positions.get(a as usize)?,
            *self.positions.get(b as usize)?,
            *self.positions.get(c as usize)?,
        ])
    }

    /// All triangles cut from element `element`
    pub fn triangles_of(&self, element: ElementIndex) -> impl Iterator<Item = usize> + '_ {
        self.triangle_elements
            .iter()
            .enumerate()
            .filter(move |(_, e)| **e == element)
            .map(|(t, _)| t)
    }
}

/// Build the fill buffer for every well-formed element of `model`.
///
/// Malformed elements are skipped and reported at debug level.
pub fn build_draw_buffer(model: &MeshModel) -> Result<DrawBuffer, TopologyError> {
    build_with_limit(model, MAX_VERTICES)
}

fn build_with_limit(model: &MeshModel, max_vertices: usize) -> Result<DrawBuffer, TopologyError> {
    let mut builder = Builder {
        model,
        max_vertices,
        slots: HashMap::new(),
        buffer: DrawBuffer::default(),
    };
    let mut skipped = 0usize;

    for (i, element) in model.elements().iter().enumerate() {
        let index = ElementIndex(i);
        match element {
            Element::Quad { edges } => match quad_loop(model, edges) {
                Some([n0, n1, n2, n3]) => {
                    builder.emit([n0, n1, n2], QUAD_VERTEX_COLOR, index)?;
                    builder.emit([n0, n2, n3], QUAD_VERTEX_COLOR, index)?;
                }
                None => {
                    skipped += 1;
                    tracing::debug!(element = i, "quad boundary does not close in 4 steps, skipped");
                }
            },
            Element::Triangle { edges } => match triangle_nodes(model, edges) {
                Some(nodes) => builder.emit(nodes, TRIANGLE_VERTEX_COLOR, index)?,
                None => {
                    skipped += 1;
                    tracing::debug!(element = i, "triangle has fewer than 3 distinct nodes, skipped");
                }
            },
        }
    }

    if skipped > 0 {
        tracing::info!("Skipped {skipped} malformed element(s) while building draw buffer");
    }

    let buffer = builder.buffer;
    tracing::debug!(
        vertices = buffer.vertex_count(),
        triangles = buffer.triangle_count(),
        "draw buffer built"
    );
    Ok(buffer)
}

struct Builder<'a> {
    model: &'a MeshModel,
    max_vertices: usize,
    slots: HashMap<NodeIndex, u32>,
    buffer: DrawBuffer,
}

impl Builder<'_> {
    fn emit(
        &mut self,
        nodes: [NodeIndex; 3],
        color: [f32; 4],
        element: ElementIndex,
    ) -> Result<(), TopologyError> {
        for node in nodes {
            let slot = self.slot(node, color)?;
            self.buffer.indices.push(slot);
        }
        self.buffer.triangle_elements.push(element);
        Ok(())
    }

    fn slot(&mut self, node: NodeIndex, color: [f32; 4]) -> Result<u32, TopologyError> {
        if let Some(&slot) = self.slots.get(&node) {
            return Ok(slot);
        }

        let next = self.buffer.positions.len();
        if next >= self.max_vertices {
            return Err(TopologyError::IndexOverflow { vertices: next + 1 });
        }
        let slot = u32::try_from(next).map_err(|_| TopologyError::IndexOverflow { vertices: next + 1 })?;

        // Callers only hand over nodes they resolved against the model.
        let (x, y) = self
            .model
            .node(node)
            .map(|n| (n.x as f32, n.y as f32))
            .unwrap_or_default();
        self.buffer.positions.push([x, y, 0.0]);
        self.buffer.colors.push(color);
        self.buffer.vertex_nodes.push(node);
        self.slots.insert(node, slot);
        Ok(slot)
    }
}

/// Counter-clockwise boundary loop `[n0, n1, n2, n3]` of a quad.
///
/// The walk starts at the left node of the first edge and follows unused
/// incident edges. It must come back to the start after exactly four steps
/// through four distinct nodes. A clockwise loop is reversed keeping `n0` first.
pub fn quad_loop(model: &MeshModel, edges: &[EdgeIndex]) -> Option<[NodeIndex; 4]> {
    let ends = resolved_endpoints(model, edges)?;
    let start = ends.first()?.0;

    let mut used = vec![false; ends.len()];
    let mut nodes = vec![start];
    let mut current = start;
    for _ in 0..4 {
        let (i, next) = ends.iter().enumerate().find_map(|(i, &(a, b))| {
            if used[i] {
                None
            } else if a == current {
                Some((i, b))
            } else if b == current {
                Some((i, a))
            } else {
                None
            }
        })?;
        used[i] = true;
        current = next;
        if current == start {
            break;
        }
        nodes.push(current);
    }

    if current != start || nodes.len() != 4 {
        return None;
    }
    let quad = [nodes[0], nodes[1], nodes[2], nodes[3]];
    if (1..4).any(|i| quad[..i].contains(&quad[i])) {
        return None;
    }

    if signed_area(model, &quad) < 0.0 {
        Some([quad[0], quad[3], quad[2], quad[1]])
    } else {
        Some(quad)
    }
}

/// First three distinct nodes of a triangle's edges, left endpoint before right
pub fn triangle_nodes(model: &MeshModel, edges: &[EdgeIndex]) -> Option<[NodeIndex; 3]> {
    let mut found: Vec<NodeIndex> = Vec::with_capacity(3);
    for edge in edges.iter().filter_map(|&e| model.edge(e)) {
        for node in [edge.left, edge.right].into_iter().flatten() {
            if model.node(node).is_none() || found.contains(&node) {
                continue;
            }
            found.push(node);
            if found.len() == 3 {
                return Some([found[0], found[1], found[2]]);
            }
        }
    }
    None
}

/// Endpoints of every edge, or `None` if any edge is dangling or degenerate
fn resolved_endpoints(model: &MeshModel, edges: &[EdgeIndex]) -> Option<Vec<(NodeIndex, NodeIndex)>> {
    edges
        .iter()
        .map(|&e| {
            let (a, b) = model.edge(e)?.endpoints()?;
            model.node(a)?;
            model.node(b)?;
            Some((a, b))
        })
        .collect()
}

fn signed_area(model: &MeshModel, nodes: &[NodeIndex]) -> f64 {
    let pts: Vec<(f64, f64)> = nodes
        .iter()
        .filter_map(|&n| model.node(n))
        .map(|n| (n.x, n.y))
        .collect();
    let mut twice = 0.0;
    for i in 0..pts.len() {
        let (x0, y0) = pts[i];
        let (x1, y1) = pts[(i + 1) % pts.len()];
        twice += x0 * y1 - x1 * y0;
    }
    0.5 * twice
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use mesh_model::{Edge, ElementKind};

    #[test]
    fn test_quad_fan_triangulation() {
        let m = fixtures::unit_square_quad();
        let buf = build_draw_buffer(&m).unwrap();

        assert_eq!(buf.vertex_count(), 4);
        assert_eq!(buf.triangle_count(), 2);
        // Slots follow first-seen order n0, n1, n2, n3
        assert_eq!(buf.indices, vec![0, 1, 2, 0, 2, 3]);
        assert_eq!(buf.positions[1], [1.0, 0.0, 0.0]);
        assert_eq!(buf.positions[3], [0.0, 1.0, 0.0]);
        assert!(buf.colors.iter().all(|c| *c == QUAD_VERTEX_COLOR));
    }

    #[test]
    fn test_clockwise_quad_is_reoriented() {
        let mut m = MeshModel::new();
        let a = m.add_node(1, 0.0, 0.0).unwrap();
        let b = m.add_node(2, 0.0, 1.0).unwrap();
        let c = m.add_node(3, 1.0, 1.0).unwrap();
        let d = m.add_node(4, 1.0, 0.0).unwrap();
        let e0 = m.add_edge(a, b);
        let e1 = m.add_edge(b, c);
        let e2 = m.add_edge(c, d);
        let e3 = m.add_edge(d, a);
        m.add_quad([e0, e1, e2, e3]);

        let lp = quad_loop(&m, m.elements()[0].edges()).unwrap();
        assert_eq!(lp, [a, d, c, b]);
    }

    #[test]
    fn test_quad_with_shuffled_edges() {
        let mut m = MeshModel::new();
        let a = m.add_node(1, 0.0, 0.0).unwrap();
        let b = m.add_node(2, 2.0, 0.0).unwrap();
        let c = m.add_node(3, 2.0, 1.0).unwrap();
        let d = m.add_node(4, 0.0, 1.0).unwrap();
        let top = m.add_edge(d, c);
        let left = m.add_edge(a, d);
        let base = m.add_edge(a, b);
        let right = m.add_edge(c, b);
        m.add_quad([top, right, base, left]);

        // Walk starts at `top.left` = d and runs d, c, b, a (clockwise), then flips
        assert_eq!(quad_loop(&m, m.elements()[0].edges()), Some([d, a, b, c]));
    }

    #[test]
    fn test_malformed_quad_contributes_nothing() {
        let m = fixtures::malformed_quad();
        let buf = build_draw_buffer(&m).unwrap();
        assert_eq!(buf.vertex_count(), 0);
        assert_eq!(buf.triangle_count(), 0);
        assert!(buf.colors.is_empty());
    }

    #[test]
    fn test_quad_with_degenerate_edge_skipped() {
        let mut m = fixtures::unit_square_quad();
        let lone = m.find_node(1).unwrap();
        let broken = m.push_edge(Edge {
            left: Some(lone),
            right: None,
        });
        let e = m.elements()[0].edges().to_vec();
        m.add_quad([e[0], e[1], e[2], broken]);

        let buf = build_draw_buffer(&m).unwrap();
        assert_eq!(buf.triangle_count(), 2);
        assert_eq!(buf.triangle_elements, vec![ElementIndex(0), ElementIndex(0)]);
    }

    #[test]
    fn test_triangle_node_order() {
        let mut m = MeshModel::new();
        let a = m.add_node(1, 0.0, 0.0).unwrap();
        let b = m.add_node(2, 1.0, 0.0).unwrap();
        let c = m.add_node(3, 0.0, 1.0).unwrap();
        let e0 = m.add_edge(b, a);
        let e1 = m.add_edge(c, b);
        let e2 = m.add_edge(a, c);
        m.add_triangle([e0, e1, e2]);

        assert_eq!(triangle_nodes(&m, m.elements()[0].edges()), Some([b, a, c]));
        let buf = build_draw_buffer(&m).unwrap();
        assert_eq!(buf.indices, vec![0, 1, 2]);
        assert_eq!(buf.vertex_nodes, vec![b, a, c]);
        assert!(buf.colors.iter().all(|c| *c == TRIANGLE_VERTEX_COLOR));
    }

    #[test]
    fn test_triangle_with_two_nodes_skipped() {
        let mut m = MeshModel::new();
        let a = m.add_node(1, 0.0, 0.0).unwrap();
        let b = m.add_node(2, 1.0, 0.0).unwrap();
        let e0 = m.add_edge(a, b);
        let e1 = m.add_edge(b, a);
        m.push_element(Element::Triangle { edges: vec![e0, e1] });

        let buf = build_draw_buffer(&m).unwrap();
        assert!(buf.is_empty());
        assert_eq!(buf.vertex_count(), 0);
    }

    #[test]
    fn test_shared_nodes_keep_first_color() {
        let m = fixtures::quad_with_triangle();
        let buf = build_draw_buffer(&m).unwrap();

        // 4 quad corners + 1 apex
        assert_eq!(buf.vertex_count(), 5);
        assert_eq!(buf.triangle_count(), 3);
        assert_eq!(buf.colors.iter().filter(|c| **c == QUAD_VERTEX_COLOR).count(), 4);
        assert_eq!(buf.colors.iter().filter(|c| **c == TRIANGLE_VERTEX_COLOR).count(), 1);

        let kinds: Vec<ElementKind> = buf
            .triangle_elements
            .iter()
            .map(|&e| m.element(e).unwrap().kind())
            .collect();
        assert_eq!(kinds, vec![ElementKind::Quad, ElementKind::Quad, ElementKind::Triangle]);
    }

    #[test]
    fn test_vertex_uniqueness_on_grid() {
        let m = fixtures::demo_mesh(6, 4);
        let buf = build_draw_buffer(&m).unwrap();

        let mut seen = std::collections::HashSet::new();
        assert!(buf.vertex_nodes.iter().all(|n| seen.insert(*n)));
        assert_eq!(buf.vertex_count(), m.nodes().len());
    }

    #[test]
    fn test_index_bounds_on_grid() {
        let m = fixtures::demo_mesh(5, 3);
        let buf = build_draw_buffer(&m).unwrap();

        assert_eq!(buf.positions.len(), buf.colors.len());
        assert_eq!(buf.indices.len() % 3, 0);
        assert!(buf.indices.iter().all(|&i| (i as usize) < buf.vertex_count()));
        assert_eq!(buf.triangle_elements.len(), buf.triangle_count());
    }

    #[test]
    fn test_overflow_is_reported() {
        let m = fixtures::unit_square_quad();
        let err = build_with_limit(&m, 3).unwrap_err();
        assert_eq!(err, TopologyError::IndexOverflow { vertices: 4 });
    }

    #[test]
    fn test_sparse_node_ids() {
        let mut m = MeshModel::new();
        let a = m.add_node(1000, 0.0, 0.0).unwrap();
        let b = m.add_node(7, 1.0, 0.0).unwrap();
        let c = m.add_node(42, 0.0, 1.0).unwrap();
        let e0 = m.add_edge(a, b);
        let e1 = m.add_edge(b, c);
        let e2 = m.add_edge(c, a);
        m.add_triangle([e0, e1, e2]);

        let buf = build_draw_buffer(&m).unwrap();
        assert_eq!(buf.vertex_count(), 3);
    }
}
