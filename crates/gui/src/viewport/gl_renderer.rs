use glam::{Mat4, Vec2};
use glow::HasContext;

use super::camera::ViewportSize;
use super::gl_picker::{GlPickPass, PICK_FRAG, PICK_VERT};
use super::gpu::{
    compile_program, set_uniform_f32, set_uniform_mat4, set_uniform_vec4, GpuLines, GpuMesh,
    PickTarget,
};
use super::picking::PickingEngine;
use super::MeshBuffers;
use crate::error::{GpuError, PickError};
use crate::state::FillMode;

// ── Render parameters ────────────────────────────────────────

/// Parameters for rendering the viewport
pub struct RenderParams {
    pub size: ViewportSize,
    pub view: Mat4,
    pub proj: Mat4,
    /// Background color RGB
    pub bg_color: [u8; 3],
    pub fill_mode: FillMode,
    pub face_color: [f32; 4],
    pub edge_color: [f32; 4],
    pub show_edges: bool,
    /// Triangles of the selected face
    pub highlight: Vec<usize>,
    pub highlight_color: [f32; 4],
}

/// Outcome of a deferred pick, tagged with the mesh revision it ran against
pub struct PickOutcome {
    pub revision: u64,
    pub result: Result<Option<usize>, PickError>,
}

// ── Main GL renderer ─────────────────────────────────────────

pub struct GlRenderer {
    mesh_program: glow::Program,
    line_program: glow::Program,
    pick_program: glow::Program,
    mesh: Option<GpuMesh>,
    lines: Option<GpuLines>,
    pick_target: Option<PickTarget>,
    /// Revision of the uploaded buffers
    synced_revision: Option<u64>,
    /// Pixel (top-left origin) waiting to be picked in the next paint
    pending_pick: Option<Vec2>,
    outcome: Option<PickOutcome>,
}

impl GlRenderer {
    pub fn new(gl: &glow::Context) -> Result<Self, GpuError> {
        let mesh_program = compile_program(gl, MESH_VERT, MESH_FRAG)?;
        let line_program = match compile_program(gl, LINE_VERT, LINE_FRAG) {
            Ok(p) => p,
            Err(e) => {
                unsafe { gl.delete_program(mesh_program) };
                return Err(e);
            }
        };
        let pick_program = match compile_program(gl, PICK_VERT, PICK_FRAG) {
            Ok(p) => p,
            Err(e) => {
                unsafe {
                    gl.delete_program(mesh_program);
                    gl.delete_program(line_program);
                }
                return Err(e);
            }
        };

        Ok(Self {
            mesh_program,
            line_program,
            pick_program,
            mesh: None,
            lines: None,
            pick_target: None,
            synced_revision: None,
            pending_pick: None,
            outcome: None,
        })
    }

    /// Replace the GPU copies when `buffers` is a newer revision
    pub fn sync_mesh(&mut self, gl: &glow::Context, buffers: &MeshBuffers) {
        if self.synced_revision == Some(buffers.revision) {
            return;
        }
        self.synced_revision = Some(buffers.revision);

        if let Some(old) = self.mesh.take() {
            old.destroy(gl);
        }
        if let Some(old) = self.lines.take() {
            old.destroy(gl);
        }

        if !buffers.draw.is_empty() {
            match GpuMesh::upload(gl, &buffers.draw) {
                Ok(m) => self.mesh = Some(m),
                Err(e) => tracing::error!("Mesh upload failed: {e}"),
            }
        }
        if !buffers.overlay.is_empty() {
            match GpuLines::upload(gl, &buffers.overlay) {
                Ok(l) => self.lines = Some(l),
                Err(e) => tracing::error!("Edge overlay upload failed: {e}"),
            }
        }
        tracing::debug!(revision = buffers.revision, "GPU buffers synced");
    }

    /// Queue a pick at `pixel`; it runs during the next [`paint`](Self::paint)
    pub fn request_pick(&mut self, pixel: Vec2) {
        self.pending_pick = Some(pixel);
    }

    pub fn has_pick_outcome(&self) -> bool {
        self.outcome.is_some()
    }

    pub fn take_pick_outcome(&mut self) -> Option<PickOutcome> {
        self.outcome.take()
    }

    /// Run the queued pick, if any, against the uploaded mesh
    pub fn run_pending_pick(
        &mut self,
        gl: &glow::Context,
        buffers: &MeshBuffers,
        params: &RenderParams,
        restore_fbo: Option<glow::Framebuffer>,
    ) {
        let Some(pixel) = self.pending_pick.take() else {
            return;
        };
        let result = match &self.mesh {
            Some(mesh) if self.synced_revision == Some(buffers.revision) => {
                let pass = GlPickPass::new(
                    gl,
                    self.pick_program,
                    mesh,
                    &mut self.pick_target,
                    restore_fbo,
                );
                PickingEngine::new(pass).pick(
                    &buffers.draw,
                    &params.view,
                    &params.proj,
                    params.size,
                    pixel,
                )
            }
            _ => Ok(None),
        };
        self.outcome = Some(PickOutcome {
            revision: buffers.revision,
            result,
        });
    }

    /// Render the mesh. `origin` is the viewport corner, y counted from the framebuffer bottom.
    pub fn paint(&self, gl: &glow::Context, origin: [i32; 2], params: &RenderParams) {
        let [x, y] = origin;
        let (w, h) = (params.size.width as i32, params.size.height as i32);
        let mvp = params.proj * params.view;

        unsafe {
            gl.viewport(x, y, w, h);
            gl.scissor(x, y, w, h);
            gl.enable(glow::SCISSOR_TEST);

            // Clear viewport area with configured background color
            gl.clear_color(
                params.bg_color[0] as f32 / 255.0,
                params.bg_color[1] as f32 / 255.0,
                params.bg_color[2] as f32 / 255.0,
                1.0,
            );
            gl.clear(glow::COLOR_BUFFER_BIT | glow::DEPTH_BUFFER_BIT);
            gl.disable(glow::DEPTH_TEST);
            gl.disable(glow::CULL_FACE);

            if let Some(ref mesh) = self.mesh {
                gl.use_program(Some(self.mesh_program));
                set_uniform_mat4(gl, self.mesh_program, "u_mvp", &mvp);
                let uniform = match params.fill_mode {
                    FillMode::ElementType => 0.0,
                    FillMode::Uniform => 1.0,
                };
                set_uniform_f32(gl, self.mesh_program, "u_uniform", uniform);
                set_uniform_vec4(gl, self.mesh_program, "u_color", params.face_color);
                mesh.draw(gl);

                if !params.highlight.is_empty() {
                    set_uniform_f32(gl, self.mesh_program, "u_uniform", 1.0);
                    set_uniform_vec4(gl, self.mesh_program, "u_color", params.highlight_color);
                    mesh.bind(gl);
                    for &t in &params.highlight {
                        if t < mesh.triangle_count() {
                            mesh.draw_triangle_bound(gl, t);
                        }
                    }
                    gl.bind_vertex_array(None);
                }
            }

            if params.show_edges {
                if let Some(ref lines) = self.lines {
                    gl.use_program(Some(self.line_program));
                    set_uniform_mat4(gl, self.line_program, "u_mvp", &mvp);
                    set_uniform_vec4(gl, self.line_program, "u_color", params.edge_color);
                    lines.draw(gl);
                }
            }

            gl.disable(glow::SCISSOR_TEST);
            gl.use_program(None);
        }
    }

    pub fn destroy(&mut self, gl: &glow::Context) {
        unsafe {
            gl.delete_program(self.mesh_program);
            gl.delete_program(self.line_program);
            gl.delete_program(self.pick_program);
        }
        if let Some(mesh) = self.mesh.take() {
            mesh.destroy(gl);
        }
        if let Some(lines) = self.lines.take() {
            lines.destroy(gl);
        }
        if let Some(target) = self.pick_target.take() {
            target.destroy(gl);
        }
        self.synced_revision = None;
    }
}

// ── Shaders ──────────────────────────────────────────────────

const MESH_VERT: &str = r#"#version 330 core
uniform mat4 u_mvp;

layout(location = 0) in vec3 a_position;
layout(location = 1) in vec4 a_color;

out vec4 v_color;

void main() {
    gl_Position = u_mvp * vec4(a_position, 1.0);
    v_color = a_color;
}
"#;

// u_uniform = 1 selects the flat u_color (uniform fill, highlight)
const MESH_FRAG: &str = r#"#version 330 core
uniform vec4 u_color;
uniform float u_uniform;

in vec4 v_color;
out vec4 frag_color;

void main() {
    frag_color = mix(v_color, u_color, u_uniform);
}
"#;

const LINE_VERT: &str = r#"#version 330 core
uniform mat4 u_mvp;

layout(location = 0) in vec3 a_position;

void main() {
    gl_Position = u_mvp * vec4(a_position, 1.0);
}
"#;

const LINE_FRAG: &str = r#"#version 330 core
uniform vec4 u_color;
out vec4 frag_color;

void main() {
    frag_color = u_color;
}
"#;
