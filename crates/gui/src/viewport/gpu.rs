//! GPU resource handles: fill mesh, edge lines and the offscreen pick target.
//!
//! Every handle is created by a fallible constructor and released by an
//! explicit `destroy`. Nothing here is reference counted.

use glow::HasContext;

use crate::error::GpuError;
use super::edge::EdgeOverlay;
use super::mesh::DrawBuffer;

fn create_err(what: &'static str) -> impl FnOnce(String) -> GpuError {
    move |reason| GpuError::CreateResource { what, reason }
}

/// Create `N` buffers, releasing the ones already made if any creation fails
fn create_buffers<const N: usize>(gl: &glow::Context) -> Result<[glow::Buffer; N], GpuError> {
    let mut made = Vec::with_capacity(N);
    for _ in 0..N {
        match unsafe { gl.create_buffer() } {
            Ok(b) => made.push(b),
            Err(reason) => {
                for b in made {
                    unsafe { gl.delete_buffer(b) };
                }
                return Err(GpuError::CreateResource { what: "buffer", reason });
            }
        }
    }
    made.try_into()
        .map_err(|_| GpuError::CreateResource { what: "buffer", reason: "count mismatch".into() })
}

// ── Fill mesh ────────────────────────────────────────────────

/// Indexed triangles: position VBO, color VBO and IBO behind one VAO
pub struct GpuMesh {
    vao: glow::VertexArray,
    positions: glow::Buffer,
    colors: glow::Buffer,
    ibo: glow::Buffer,
    index_count: i32,
}

impl GpuMesh {
    pub fn upload(gl: &glow::Context, data: &DrawBuffer) -> Result<Self, GpuError> {
        let vao = unsafe { gl.create_vertex_array() }.map_err(create_err("vertex array"))?;
        let [positions, colors, ibo] = match create_buffers::<3>(gl) {
            Ok(b) => b,
            Err(e) => {
                unsafe { gl.delete_vertex_array(vao) };
                return Err(e);
            }
        };

        unsafe {
            gl.bind_vertex_array(Some(vao));

            gl.bind_buffer(glow::ARRAY_BUFFER, Some(positions));
            gl.buffer_data_u8_slice(
                glow::ARRAY_BUFFER,
                bytemuck::cast_slice(&data.positions),
                glow::STATIC_DRAW,
            );
            // position: location 0
            gl.enable_vertex_attrib_array(0);
            gl.vertex_attrib_pointer_f32(0, 3, glow::FLOAT, false, 3 * 4, 0);

            gl.bind_buffer(glow::ARRAY_BUFFER, Some(colors));
            gl.buffer_data_u8_slice(
                glow::ARRAY_BUFFER,
                bytemuck::cast_slice(&data.colors),
                glow::STATIC_DRAW,
            );
            // color: location 1
            gl.enable_vertex_attrib_array(1);
            gl.vertex_attrib_pointer_f32(1, 4, glow::FLOAT, false, 4 * 4, 0);

            gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(ibo));
            gl.buffer_data_u8_slice(
                glow::ELEMENT_ARRAY_BUFFER,
                bytemuck::cast_slice(&data.indices),
                glow::STATIC_DRAW,
            );

            gl.bind_vertex_array(None);
            gl.bind_buffer(glow::ARRAY_BUFFER, None);
        }

        Ok(Self {
            vao,
            positions,
            colors,
            ibo,
            index_count: data.indices.len() as i32,
        })
    }

    pub fn triangle_count(&self) -> usize {
        self.index_count as usize / 3
    }

    pub unsafe fn draw(&self, gl: &glow::Context) {
        gl.bind_vertex_array(Some(self.vao));
        gl.draw_elements(glow::TRIANGLES, self.index_count, glow::UNSIGNED_INT, 0);
        gl.bind_vertex_array(None);
    }

    /// Draw only triangle `t`. The VAO must already be bound.
    pub unsafe fn draw_triangle_bound(&self, gl: &glow::Context, t: usize) {
        gl.draw_elements(glow::TRIANGLES, 3, glow::UNSIGNED_INT, (t * 3 * 4) as i32);
    }

    pub unsafe fn bind(&self, gl: &glow::Context) {
        gl.bind_vertex_array(Some(self.vao));
    }

    pub fn destroy(self, gl: &glow::Context) {
        unsafe {
            gl.delete_vertex_array(self.vao);
            gl.delete_buffer(self.positions);
            gl.delete_buffer(self.colors);
            gl.delete_buffer(self.ibo);
        }
    }
}

// ── Edge lines ───────────────────────────────────────────────

pub struct GpuLines {
    vao: glow::VertexArray,
    vbo: glow::Buffer,
    vertex_count: i32,
}

impl GpuLines {
    pub fn upload(gl: &glow::Context, overlay: &EdgeOverlay) -> Result<Self, GpuError> {
        let vao = unsafe { gl.create_vertex_array() }.map_err(create_err("vertex array"))?;
        let [vbo] = match create_buffers::<1>(gl) {
            Ok(b) => b,
            Err(e) => {
                unsafe { gl.delete_vertex_array(vao) };
                return Err(e);
            }
        };

        unsafe {
            gl.bind_vertex_array(Some(vao));
            gl.bind_buffer(glow::ARRAY_BUFFER, Some(vbo));
            gl.buffer_data_u8_slice(
                glow::ARRAY_BUFFER,
                bytemuck::cast_slice(&overlay.segments),
                glow::STATIC_DRAW,
            );
            gl.enable_vertex_attrib_array(0);
            gl.vertex_attrib_pointer_f32(0, 3, glow::FLOAT, false, 3 * 4, 0);
            gl.bind_vertex_array(None);
            gl.bind_buffer(glow::ARRAY_BUFFER, None);
        }

        Ok(Self {
            vao,
            vbo,
            vertex_count: overlay.vertex_count() as i32,
        })
    }

    pub unsafe fn draw(&self, gl: &glow::Context) {
        gl.bind_vertex_array(Some(self.vao));
        gl.draw_arrays(glow::LINES, 0, self.vertex_count);
        gl.bind_vertex_array(None);
    }

    pub fn destroy(self, gl: &glow::Context) {
        unsafe {
            gl.delete_vertex_array(self.vao);
            gl.delete_buffer(self.vbo);
        }
    }
}

// ── Pick target ──────────────────────────────────────────────

/// Offscreen framebuffer: RGBA8 color plus DEPTH24_STENCIL8
pub struct PickTarget {
    fbo: glow::Framebuffer,
    color: glow::Renderbuffer,
    depth: glow::Renderbuffer,
    width: u32,
    height: u32,
}

impl PickTarget {
    /// Make `slot` hold a complete target of `width` x `height`, reusing it when the size matches
    pub fn ensure<'a>(
        slot: &'a mut Option<PickTarget>,
        gl: &glow::Context,
        width: u32,
        height: u32,
    ) -> Result<&'a PickTarget, GpuError> {
        let stale = slot.as_ref().is_some_and(|t| t.size() != (width, height));
        if stale {
            if let Some(old) = slot.take() {
                tracing::debug!(width, height, "resizing pick target");
                old.destroy(gl);
            }
        }
        if slot.is_none() {
            *slot = Some(Self::create(gl, width, height)?);
        }
        slot.as_ref().ok_or(GpuError::CreateResource {
            what: "pick target",
            reason: "missing after creation".into(),
        })
    }

    fn create(gl: &glow::Context, width: u32, height: u32) -> Result<Self, GpuError> {
        unsafe {
            let fbo = gl.create_framebuffer().map_err(create_err("framebuffer"))?;
            let color = match gl.create_renderbuffer() {
                Ok(rb) => rb,
                Err(reason) => {
                    gl.delete_framebuffer(fbo);
                    return Err(GpuError::CreateResource { what: "color renderbuffer", reason });
                }
            };
            let depth = match gl.create_renderbuffer() {
                Ok(rb) => rb,
                Err(reason) => {
                    gl.delete_renderbuffer(color);
                    gl.delete_framebuffer(fbo);
                    return Err(GpuError::CreateResource { what: "depth renderbuffer", reason });
                }
            };
            let target = Self { fbo, color, depth, width, height };

            gl.bind_renderbuffer(glow::RENDERBUFFER, Some(color));
            gl.renderbuffer_storage(glow::RENDERBUFFER, glow::RGBA8, width as i32, height as i32);
            gl.bind_renderbuffer(glow::RENDERBUFFER, Some(depth));
            gl.renderbuffer_storage(
                glow::RENDERBUFFER,
                glow::DEPTH24_STENCIL8,
                width as i32,
                height as i32,
            );
            gl.bind_renderbuffer(glow::RENDERBUFFER, None);

            gl.bind_framebuffer(glow::FRAMEBUFFER, Some(fbo));
            gl.framebuffer_renderbuffer(
                glow::FRAMEBUFFER,
                glow::COLOR_ATTACHMENT0,
                glow::RENDERBUFFER,
                Some(color),
            );
            gl.framebuffer_renderbuffer(
                glow::FRAMEBUFFER,
                glow::DEPTH_STENCIL_ATTACHMENT,
                glow::RENDERBUFFER,
                Some(depth),
            );
            let status = gl.check_framebuffer_status(glow::FRAMEBUFFER);
            gl.bind_framebuffer(glow::FRAMEBUFFER, None);

            if status != glow::FRAMEBUFFER_COMPLETE {
                target.destroy(gl);
                return Err(GpuError::IncompleteFramebuffer(status));
            }
            tracing::debug!(width, height, "pick target created");
            Ok(target)
        }
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn framebuffer(&self) -> glow::Framebuffer {
        self.fbo
    }

    pub fn destroy(self, gl: &glow::Context) {
        unsafe {
            gl.delete_framebuffer(self.fbo);
            gl.delete_renderbuffer(self.color);
            gl.delete_renderbuffer(self.depth);
        }
    }
}

// ── Shader compilation ───────────────────────────────────────

pub fn compile_program(
    gl: &glow::Context,
    vert_src: &str,
    frag_src: &str,
) -> Result<glow::Program, GpuError> {
    unsafe {
        let program = gl.create_program().map_err(create_err("program"))?;

        let mut shaders = Vec::with_capacity(2);
        for (stage, kind, src) in [
            ("vertex", glow::VERTEX_SHADER, vert_src),
            ("fragment", glow::FRAGMENT_SHADER, frag_src),
        ] {
            let shader = match gl.create_shader(kind) {
                Ok(s) => s,
                Err(reason) => {
                    release(gl, program, &shaders);
                    return Err(GpuError::CreateResource { what: "shader", reason });
                }
            };
            shaders.push(shader);
            gl.shader_source(shader, src);
            gl.compile_shader(shader);
            if !gl.get_shader_compile_status(shader) {
                let log = gl.get_shader_info_log(shader);
                release(gl, program, &shaders);
                return Err(GpuError::Shader { stage, log });
            }
            gl.attach_shader(program, shader);
        }

        gl.link_program(program);
        if !gl.get_program_link_status(program) {
            let log = gl.get_program_info_log(program);
            release(gl, program, &shaders);
            return Err(GpuError::Shader { stage: "link", log });
        }

        for shader in shaders {
            gl.detach_shader(program, shader);
            gl.delete_shader(shader);
        }
        Ok(program)
    }
}

unsafe fn release(gl: &glow::Context, program: glow::Program, shaders: &[glow::Shader]) {
    for &shader in shaders {
        gl.delete_shader(shader);
    }
    gl.delete_program(program);
}

// ── Uniform setters ──────────────────────────────────────────

pub fn set_uniform_mat4(gl: &glow::Context, program: glow::Program, name: &str, mat: &glam::Mat4) {
    unsafe {
        let loc = gl.get_uniform_location(program, name);
        gl.uniform_matrix_4_f32_slice(loc.as_ref(), false, &mat.to_cols_array());
    }
}

pub fn set_uniform_vec4(gl: &glow::Context, program: glow::Program, name: &str, v: [f32; 4]) {
    unsafe {
        let loc = gl.get_uniform_location(program, name);
        gl.uniform_4_f32(loc.as_ref(), v[0], v[1], v[2], v[3]);
    }
}

pub fn set_uniform_f32(gl: &glow::Context, program: glow::Program, name: &str, v: f32) {
    unsafe {
        let loc = gl.get_uniform_location(program, name);
        gl.uniform_1_f32(loc.as_ref(), v);
    }
}
