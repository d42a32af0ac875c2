//! GL implementation of the pick pass

use glam::Mat4;
use glow::HasContext;

use super::camera::ViewportSize;
use super::gpu::{set_uniform_mat4, GpuMesh, PickTarget};
use super::mesh::DrawBuffer;
use super::picking::{decode_pick_id, PickBackend, NO_HIT_COLOR};
use crate::error::GpuError;

// Position only; the color attribute of the fill VAO is ignored
pub const PICK_VERT: &str = r#"#version 330 core
uniform mat4 u_mvp;

layout(location = 0) in vec3 a_position;

void main() {
    gl_Position = u_mvp * vec4(a_position, 1.0);
}
"#;

// Same channel order as `encode_pick_id`: R holds the high byte
pub const PICK_FRAG: &str = r#"#version 330 core
uniform uint u_id;
out vec4 frag_color;

void main() {
    uint r = (u_id >> 16u) & 255u;
    uint g = (u_id >> 8u) & 255u;
    uint b = u_id & 255u;
    frag_color = vec4(float(r), float(g), float(b), 255.0) / 255.0;
}
"#;

/// Renders triangle ids into the offscreen [`PickTarget`] with the pick program.
///
/// Lives for one pick. Depth test, blending and dithering are off so the
/// stored bytes are exactly the encoded ids and the last triangle drawn wins.
pub struct GlPickPass<'a> {
    gl: &'a glow::Context,
    program: glow::Program,
    mesh: &'a GpuMesh,
    target: &'a mut Option<PickTarget>,
    /// Framebuffer to rebind when the pass ends (egui's intermediate FBO, if any)
    restore_fbo: Option<glow::Framebuffer>,
    /// `u_id`, looked up once in `begin`
    id_location: Option<glow::UniformLocation>,
}

impl<'a> GlPickPass<'a> {
    pub fn new(
        gl: &'a glow::Context,
        program: glow::Program,
        mesh: &'a GpuMesh,
        target: &'a mut Option<PickTarget>,
        restore_fbo: Option<glow::Framebuffer>,
    ) -> Self {
        Self {
            gl,
            program,
            mesh,
            target,
            restore_fbo,
            id_location: None,
        }
    }
}

impl PickBackend for GlPickPass<'_> {
    fn begin(&mut self, viewport: ViewportSize, view: &Mat4, proj: &Mat4) -> Result<(), GpuError> {
        let gl = self.gl;
        let fbo = PickTarget::ensure(self.target, gl, viewport.width, viewport.height)?.framebuffer();

        unsafe {
            gl.bind_framebuffer(glow::FRAMEBUFFER, Some(fbo));
            gl.viewport(0, 0, viewport.width as i32, viewport.height as i32);
            gl.disable(glow::SCISSOR_TEST);
            gl.disable(glow::DEPTH_TEST);
            gl.disable(glow::BLEND);
            gl.disable(glow::DITHER);

            let [r, g, b, a] = NO_HIT_COLOR.map(|c| c as f32 / 255.0);
            gl.clear_color(r, g, b, a);
            gl.clear(glow::COLOR_BUFFER_BIT | glow::DEPTH_BUFFER_BIT);

            gl.use_program(Some(self.program));
            set_uniform_mat4(gl, self.program, "u_mvp", &(*proj * *view));
            self.id_location = gl.get_uniform_location(self.program, "u_id");
            self.mesh.bind(gl);
        }
        Ok(())
    }

    fn draw_triangle(
        &mut self,
        _buffer: &DrawBuffer,
        triangle: usize,
        color: [u8; 4],
    ) -> Result<(), GpuError> {
        if triangle >= self.mesh.triangle_count() {
            return Ok(());
        }
        let id = decode_pick_id([color[0], color[1], color[2]]).unwrap_or(0);
        unsafe {
            self.gl.uniform_1_u32(self.id_location.as_ref(), id);
            self.mesh.draw_triangle_bound(self.gl, triangle);
        }
        Ok(())
    }

    fn read_pixel(&mut self, x: u32, y: u32) -> Result<[u8; 4], GpuError> {
        let (width, height) = self.target.as_ref().map(|t| t.size()).unwrap_or_default();
        if x >= width || y >= height {
            return Err(GpuError::ReadOutOfBounds { x, y, width, height });
        }

        let mut pixel = [0u8; 4];
        unsafe {
            self.gl.pixel_store_i32(glow::PACK_ALIGNMENT, 1);
            self.gl.read_pixels(
                x as i32,
                y as i32,
                1,
                1,
                glow::RGBA,
                glow::UNSIGNED_BYTE,
                glow::PixelPackData::Slice(Some(&mut pixel[..])),
            );
        }
        Ok(pixel)
    }

    fn end(&mut self) {
        self.id_location = None;
        unsafe {
            self.gl.bind_vertex_array(None);
            self.gl.use_program(None);
            self.gl.bind_framebuffer(glow::FRAMEBUFFER, self.restore_fbo);
            self.gl.enable(glow::DITHER);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::viewport::picking::{encode_pick_id, MAX_PICK_ID};

    /// CPU copy of the packing in `PICK_FRAG`
    fn shader_pack(id: u32) -> [u8; 4] {
        [((id >> 16) & 255) as u8, ((id >> 8) & 255) as u8, (id & 255) as u8, 255]
    }

    #[test]
    fn test_pick_shader_packing_matches_encoder() {
        for id in [1, 2, 255, 256, 65_535, 65_536, 0x12_34_56, MAX_PICK_ID] {
            assert_eq!(shader_pack(id), encode_pick_id(id), "id {id}");
            assert_eq!(decode_pick_id([shader_pack(id)[0], shader_pack(id)[1], shader_pack(id)[2]]), Some(id));
        }
        for (shift, channel) in [("u_id >> 16u", "uint r"), ("u_id >> 8u", "uint g")] {
            let line = PICK_FRAG.lines().find(|l| l.contains(channel)).unwrap();
            assert!(line.contains(shift), "{line}");
        }
    }

    #[test]
    fn test_pick_program_writes_only_the_id() {
        assert!(PICK_FRAG.contains("uniform uint u_id;"));
        assert!(!PICK_FRAG.contains("v_color"));
        assert!(PICK_VERT.contains("layout(location = 0) in vec3 a_position;"));
        assert!(!PICK_VERT.contains("location = 1"));
    }
}
