//! Factory functions for test meshes and the built-in demo mesh.

use std::collections::HashMap;

use mesh_model::{EdgeIndex, MeshModel, NodeIndex};

/// The unit square as a JSON mesh document
pub const UNIT_SQUARE_JSON: &str = r#"{
  "nodes": [
    {"id": 1, "x": 0.0, "y": 0.0},
    {"id": 2, "x": 1.0, "y": 0.0},
    {"id": 3, "x": 1.0, "y": 1.0},
    {"id": 4, "x": 0.0, "y": 1.0}
  ],
  "edges": [
    {"left": 1, "right": 2},
    {"left": 2, "right": 3},
    {"left": 3, "right": 4},
    {"left": 4, "right": 1}
  ],
  "elements": [
    {"type": "quad", "edges": [0, 1, 2, 3]}
  ]
}"#;

/// Builder that hands out one edge per undirected node pair
struct GridBuilder {
    model: MeshModel,
    edges: HashMap<(NodeIndex, NodeIndex), EdgeIndex>,
}

impl GridBuilder {
    fn new() -> Self {
        Self {
            model: MeshModel::new(),
            edges: HashMap::new(),
        }
    }

    fn node(&mut self, id: u32, x: f64, y: f64) -> NodeIndex {
        // Fixture ids are unique; a repeat hands back the existing node.
        match self.model.add_node(id, x, y) {
            Ok(n) => n,
            Err(_) => self.model.find_node(id).unwrap_or(NodeIndex(0)),
        }
    }

    fn edge(&mut self, a: NodeIndex, b: NodeIndex) -> EdgeIndex {
        let key = if a <= b { (a, b) } else { (b, a) };
        if let Some(&e) = self.edges.get(&key) {
            return e;
        }
        let e = self.model.add_edge(a, b);
        self.edges.insert(key, e);
        e
    }
}

/// One CCW quad over the unit square, nodes 1..=4 at its corners
pub fn unit_square_quad() -> MeshModel {
    unit_square_builder().model
}

fn unit_square_builder() -> GridBuilder {
    let mut g = GridBuilder::new();
    let a = g.node(1, 0.0, 0.0);
    let b = g.node(2, 1.0, 0.0);
    let c = g.node(3, 1.0, 1.0);
    let d = g.node(4, 0.0, 1.0);
    let e = [g.edge(a, b), g.edge(b, c), g.edge(c, d), g.edge(d, a)];
    g.model.add_quad(e);
    g
}

/// A "quad" whose boundary closes after three steps; its nodes belong to nothing else
pub fn malformed_quad() -> MeshModel {
    let mut g = GridBuilder::new();
    let a = g.node(1, 0.0, 0.0);
    let b = g.node(2, 1.0, 0.0);
    let c = g.node(3, 0.5, 1.0);
    let e = [g.edge(a, b), g.edge(b, c), g.edge(c, a)];
    g.model.push_element(mesh_model::Element::Quad { edges: e.to_vec() });
    g.model
}

/// Unit square quad plus a triangle sharing its right side, apex at (2, 0.5)
pub fn quad_with_triangle() -> MeshModel {
    let mut g = unit_square_builder();
    let b = NodeIndex(1);
    let c = NodeIndex(2);
    let apex = g.node(5, 2.0, 0.5);
    let e = [g.edge(b, c), g.edge(c, apex), g.edge(apex, b)];
    g.model.add_triangle(e);
    g.model
}

/// Columns and rows of the start-up demo mesh
pub const DEMO_GRID: (usize, usize) = (12, 8);

/// `cols` x `rows` grid of unit cells. Every third cell is split into two
/// triangles along its rising diagonal, the rest are quads.
pub fn demo_mesh(cols: usize, rows: usize) -> MeshModel {
    let mut g = GridBuilder::new();
    let mut grid = Vec::with_capacity((cols + 1) * (rows + 1));
    for j in 0..=rows {
        for i in 0..=cols {
            let id = (grid.len() + 1) as u32;
            grid.push(g.node(id, i as f64, j as f64));
        }
    }
    let at = |i: usize, j: usize| grid[j * (cols + 1) + i];

    for j in 0..rows {
        for i in 0..cols {
            let (a, b, c, d) = (at(i, j), at(i + 1, j), at(i + 1, j + 1), at(i, j + 1));
            if (i + j) % 3 == 0 {
                let diag = g.edge(a, c);
                let lower = [g.edge(a, b), g.edge(b, c), diag];
                let upper = [diag, g.edge(c, d), g.edge(d, a)];
                g.model.add_triangle(lower);
                g.model.add_triangle(upper);
            } else {
                let e = [g.edge(a, b), g.edge(b, c), g.edge(c, d), g.edge(d, a)];
                g.model.add_quad(e);
            }
        }
    }
    g.model
}
