//! Error types shared by the viewer core and the GL shell

use std::path::PathBuf;

use mesh_model::MeshError;
use thiserror::Error;

use crate::viewport::mesh::TopologyError;

/// Failure to create or use a GPU resource. Fatal for the operation in progress.
#[derive(Debug, Error)]
pub enum GpuError {
    #[error("failed to create {what}: {reason}")]
    CreateResource { what: &'static str, reason: String },
    #[error("{stage} shader failed to build: {log}")]
    Shader { stage: &'static str, log: String },
    #[error("offscreen framebuffer incomplete (status 0x{0:x})")]
    IncompleteFramebuffer(u32),
    #[error("pixel ({x}, {y}) is outside the {width}x{height} pick target")]
    ReadOutOfBounds { x: u32, y: u32, width: u32, height: u32 },
}

#[derive(Debug, Error)]
pub enum PickError {
    #[error("{0} triangles exceed the 24-bit pick id range")]
    TooManyTriangles(usize),
    #[error(transparent)]
    Gpu(#[from] GpuError),
}

/// Failure to bring a mesh file into the viewer
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Mesh(#[from] MeshError),
    #[error(transparent)]
    Topology(#[from] TopologyError),
}
