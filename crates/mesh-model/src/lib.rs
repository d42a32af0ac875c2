//! Mesh model shared between the mesh generator and the viewer.
//!
//! Nodes, edges and elements live in flat arenas and refer to each other by
//! stable index. Nothing owns anything else, so dropping a `MeshModel` tears
//! the whole graph down at once.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// External node identity as assigned by the mesh generator (1-based)
pub type NodeId = u32;

/// Position of a node in the model's node arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeIndex(pub usize);

/// Position of an edge in the model's edge arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeIndex(pub usize);

/// Position of an element in the model's element list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementIndex(pub usize);

#[derive(Debug, Error)]
pub enum MeshError {
    #[error("edge {edge} references unknown node id {id}")]
    UnknownNode { edge: usize, id: NodeId },
    #[error("element {element} references unknown edge {edge}")]
    UnknownEdge { element: usize, edge: usize },
    #[error("node id {0} is used more than once")]
    DuplicateNodeId(NodeId),
    #[error("invalid mesh document: {0}")]
    Json(#[from] serde_json::Error),
}

/// Mesh vertex
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: NodeId,
    pub x: f64,
    pub y: f64,
}

/// Segment between two nodes. A missing endpoint marks a degenerate edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub left: Option<NodeIndex>,
    pub right: Option<NodeIndex>,
}

impl Edge {
    pub fn new(left: NodeIndex, right: NodeIndex) -> Self {
        Self {
            left: Some(left),
            right: Some(right),
        }
    }

    /// Both endpoints, or `None` for a degenerate edge
    pub fn endpoints(&self) -> Option<(NodeIndex, NodeIndex)> {
        Some((self.left?, self.right?))
    }

    /// The endpoint opposite `node`, if `node` is one of the endpoints
    pub fn other(&self, node: NodeIndex) -> Option<NodeIndex> {
        let (a, b) = self.endpoints()?;
        if a == node {
            Some(b)
        } else if b == node {
            Some(a)
        } else {
            None
        }
    }
}

/// Shape tag of an element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Triangle,
    Quad,
}

/// Mesh face, described by the edges that bound it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Element {
    Triangle { edges: Vec<EdgeIndex> },
    Quad { edges: Vec<EdgeIndex> },
}

impl Element {
    pub fn kind(&self) -> ElementKind {
        match self {
            Element::Triangle { .. } => ElementKind::Triangle,
            Element::Quad { .. } => ElementKind::Quad,
        }
    }

    pub fn edges(&self) -> &[EdgeIndex] {
        match self {
            Element::Triangle { edges } | Element::Quad { edges } => edges,
        }
    }
}

/// Axis-aligned 2D bounding box in world units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn center(&self) -> (f64, f64) {
        (
            0.5 * (self.min_x + self.max_x),
            0.5 * (self.min_y + self.max_y),
        )
    }
}

/// Complete mesh state: node, edge and element arenas
#[derive(Debug, Clone, Default)]
pub struct MeshModel {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    elements: Vec<Element>,
    by_id: HashMap<NodeId, NodeIndex>,
}

impl MeshModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, id: NodeId, x: f64, y: f64) -> Result<NodeIndex, MeshError> {
        if self.by_id.contains_key(&id) {
            return Err(MeshError::DuplicateNodeId(id));
        }
        let index = NodeIndex(self.nodes.len());
        self.nodes.push(Node { id, x, y });
        self.by_id.insert(id, index);
        Ok(index)
    }

    pub fn add_edge(&mut self, left: NodeIndex, right: NodeIndex) -> EdgeIndex {
        self.push_edge(Edge::new(left, right))
    }

    /// Insert an edge as-is, including degenerate ones
    pub fn push_edge(&mut self, edge: Edge) -> EdgeIndex {
        let index = EdgeIndex(self.edges.len());
        self.edges.push(edge);
        index
    }

    pub fn add_triangle(&mut self, edges: [EdgeIndex; 3]) -> ElementIndex {
        self.push_element(Element::Triangle {
            edges: edges.to_vec(),
        })
    }

    pub fn add_quad(&mut self, edges: [EdgeIndex; 4]) -> ElementIndex {
        self.push_element(Element::Quad {
            edges: edges.to_vec(),
        })
    }

    pub fn push_element(&mut self, element: Element) -> ElementIndex {
        let index = ElementIndex(self.elements.len());
        self.elements.push(element);
        index
    }

    pub fn node(&self, index: NodeIndex) -> Option<&Node> {
        self.nodes.get(index.0)
    }

    pub fn edge(&self, index: EdgeIndex) -> Option<&Edge> {
        self.edges.get(index.0)
    }

    pub fn element(&self, index: ElementIndex) -> Option<&Element> {
        self.elements.get(index.0)
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// Arena index of the node with external identity `id`
    pub fn find_node(&self, id: NodeId) -> Option<NodeIndex> {
        self.by_id.get(&id).copied()
    }

    /// Move a node in place (remeshing smooths positions without changing topology)
    pub fn set_node_position(&mut self, index: NodeIndex, x: f64, y: f64) -> bool {
        match self.nodes.get_mut(index.0) {
            Some(node) => {
                node.x = x;
                node.y = y;
                true
            }
            None => false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.edges.clear();
        self.elements.clear();
        self.by_id.clear();
    }

    /// Extreme node coordinates, or `None` for a model without nodes
    pub fn bounds(&self) -> Option<Bounds> {
        let first = self.nodes.first()?;
        let init = Bounds {
            min_x: first.x,
            min_y: first.y,
            max_x: first.x,
            max_y: first.y,
        };
        Some(self.nodes.iter().fold(init, |b, n| Bounds {
            min_x: b.min_x.min(n.x),
            min_y: b.min_y.min(n.y),
            max_x: b.max_x.max(n.x),
            max_y: b.max_y.max(n.y),
        }))
    }

    /// Parse a JSON mesh document and resolve its references
    pub fn from_json(json: &str) -> Result<Self, MeshError> {
        let doc: MeshDocument = serde_json::from_str(json)?;
        Self::from_document(doc)
    }

    pub fn to_json(&self) -> Result<String, MeshError> {
        Ok(serde_json::to_string_pretty(&self.to_document())?)
    }

    pub fn from_document(doc: MeshDocument) -> Result<Self, MeshError> {
        let mut model = MeshModel::new();
        for n in &doc.nodes {
            model.add_node(n.id, n.x, n.y)?;
        }

        let resolve = |model: &MeshModel, edge: usize, id: Option<NodeId>| match id {
            Some(id) => model
                .find_node(id)
                .map(Some)
                .ok_or(MeshError::UnknownNode { edge, id }),
            None => Ok(None),
        };
        for (i, e) in doc.edges.iter().enumerate() {
            let left = resolve(&model, i, e.left)?;
            let right = resolve(&model, i, e.right)?;
            model.push_edge(Edge { left, right });
        }

        let edge_count = model.edges.len();
        for (i, element) in doc.elements.into_iter().enumerate() {
            if let Some(bad) = element.edges().iter().find(|e| e.0 >= edge_count) {
                return Err(MeshError::UnknownEdge {
                    element: i,
                    edge: bad.0,
                });
            }
            model.push_element(element);
        }

        Ok(model)
    }

    pub fn to_document(&self) -> MeshDocument {
        let id_of = |n: Option<NodeIndex>| n.and_then(|n| self.node(n)).map(|n| n.id);
        MeshDocument {
            nodes: self
                .nodes
                .iter()
                .map(|n| NodeRecord {
                    id: n.id,
                    x: n.x,
                    y: n.y,
                })
                .collect(),
            edges: self
                .edges
                .iter()
                .map(|e| EdgeRecord {
                    left: id_of(e.left),
                    right: id_of(e.right),
                })
                .collect(),
            elements: self.elements.clone(),
        }
    }
}

// ── Interchange format ───────────────────────────────────────

/// On-disk mesh layout: edges name nodes by id, elements name edges by position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshDocument {
    pub nodes: Vec<NodeRecord>,
    pub edges: Vec<EdgeRecord>,
    pub elements: Vec<Element>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: NodeId,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeRecord {
    #[serde(default)]
    pub left: Option<NodeId>,
    #[serde(default)]
    pub right: Option<NodeId>,
}
