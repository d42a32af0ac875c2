//! Color-ID face picking.
//!
//! Every triangle is drawn into an offscreen target in a flat color that
//! encodes `triangle + 1` in its RGB channels. Reading back the single pixel
//! under the pointer and decoding it yields the triangle, or nothing when the
//! pixel still holds the clear color.

use glam::{Mat4, Vec2, Vec4};
use mesh_model::ElementIndex;

use super::camera::ViewportSize;
use super::mesh::DrawBuffer;
use crate::error::{GpuError, PickError};

/// Largest id that fits the 24 RGB bits
pub const MAX_PICK_ID: u32 = (1 << 24) - 1;
/// Clear color of the pick target: id 0, no primitive
pub const NO_HIT_COLOR: [u8; 4] = [0, 0, 0, 0];

/// RGBA8 color carrying `id` in its RGB channels (alpha is opaque)
pub fn encode_pick_id(id: u32) -> [u8; 4] {
    [
        ((id >> 16) & 0xff) as u8,
        ((id >> 8) & 0xff) as u8,
        (id & 0xff) as u8,
        0xff,
    ]
}

/// Inverse of [`encode_pick_id`]; `None` for the background value 0
pub fn decode_pick_id(rgb: [u8; 3]) -> Option<u32> {
    let id = (u32::from(rgb[0]) << 16) | (u32::from(rgb[1]) << 8) | u32::from(rgb[2]);
    (id != 0).then_some(id)
}

/// Pick id of triangle `t`. Callers keep `t < MAX_PICK_ID`.
pub fn pick_id_for_triangle(t: usize) -> u32 {
    t as u32 + 1
}

/// Triangle behind a decoded pick id
pub fn triangle_for_pick_id(id: u32) -> usize {
    (id - 1) as usize
}

/// Offscreen stage of a pick. Targets are addressed bottom-up like a GL framebuffer.
pub trait PickBackend {
    /// Prepare a target of `viewport` size and clear it to [`NO_HIT_COLOR`].
    /// A target of unchanged size is reused.
    fn begin(&mut self, viewport: ViewportSize, view: &Mat4, proj: &Mat4) -> Result<(), GpuError>;

    /// Fill triangle `triangle` of `buffer` with the flat `color`
    fn draw_triangle(
        &mut self,
        buffer: &DrawBuffer,
        triangle: usize,
        color: [u8; 4],
    ) -> Result<(), GpuError>;

    /// Read one RGBA8 pixel, `y` counted from the bottom row
    fn read_pixel(&mut self, x: u32, y: u32) -> Result<[u8; 4], GpuError>;

    /// Release per-pick state (bindings); the target itself stays for reuse
    fn end(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PickState {
    #[default]
    Idle,
    Rendering,
    ReadBack,
}

/// Picked triangle and the element it was cut from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PickHit {
    pub triangle: usize,
    pub element: ElementIndex,
}

impl PickHit {
    pub fn resolve(buffer: &DrawBuffer, triangle: usize) -> Option<Self> {
        let element = *buffer.triangle_elements.get(triangle)?;
        Some(Self { triangle, element })
    }
}

/// Drives a [`PickBackend`] through one pick at a time
pub struct PickingEngine<B> {
    backend: B,
    state: PickState,
}

impl<B: PickBackend> PickingEngine<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            state: PickState::Idle,
        }
    }

    pub fn state(&self) -> PickState {
        self.state
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn into_backend(self) -> B {
        self.backend
    }

    /// Triangle under `pixel` (top-left origin), or `None` for a miss.
    ///
    /// `view` and `proj` must be the matrices the frame was rendered with.
    pub fn pick(
        &mut self,
        buffer: &DrawBuffer,
        view: &Mat4,
        proj: &Mat4,
        viewport: ViewportSize,
        pixel: Vec2,
    ) -> Result<Option<usize>, PickError> {
        if buffer.is_empty() || viewport.is_empty() || !viewport.contains(pixel) {
            return Ok(None);
        }
        let count = buffer.triangle_count();
        if count > MAX_PICK_ID as usize {
            return Err(PickError::TooManyTriangles(count));
        }

        let result = self.run(buffer, view, proj, viewport, pixel, count);
        self.state = PickState::Idle;
        if let Err(err) = &result {
            tracing::warn!("pick failed: {err}");
        }
        result
    }

    /// Like [`pick`](Self::pick), resolved to the owning element
    pub fn pick_hit(
        &mut self,
        buffer: &DrawBuffer,
        view: &Mat4,
        proj: &Mat4,
        viewport: ViewportSize,
        pixel: Vec2,
    ) -> Result<Option<PickHit>, PickError> {
        let triangle = self.pick(buffer, view, proj, viewport, pixel)?;
        Ok(triangle.and_then(|t| PickHit::resolve(buffer, t)))
    }

    fn run(
        &mut self,
        buffer: &DrawBuffer,
        view: &Mat4,
        proj: &Mat4,
        viewport: ViewportSize,
        pixel: Vec2,
        count: usize,
    ) -> Result<Option<usize>, PickError> {
        self.state = PickState::Rendering;
        if let Err(err) = self.backend.begin(viewport, view, proj) {
            self.backend.end();
            return Err(err.into());
        }

        let drawn = (0..count).try_for_each(|t| {
            self.backend
                .draw_triangle(buffer, t, encode_pick_id(pick_id_for_triangle(t)))
        });
        if let Err(err) = drawn {
            self.backend.end();
            return Err(err.into());
        }

        self.state = PickState::ReadBack;
        let x = pixel.x as u32;
        let y = viewport.height - 1 - pixel.y as u32;
        let read = self.backend.read_pixel(x, y);
        self.backend.end();

        let [r, g, b, _] = read?;
        let triangle = decode_pick_id([r, g, b]).map(triangle_for_pick_id);
        tracing::debug!(x, y, ?triangle, "pick read back");
        Ok(triangle)
    }
}

// ── CPU backend ──────────────────────────────────────────────

/// CPU rasterizer with the same contract as the GL pick pass.
///
/// Samples pixel centers with edge functions; either winding is filled and
/// later triangles overwrite earlier ones.
#[derive(Debug, Default)]
pub struct SoftwarePickTarget {
    width: u32,
    height: u32,
    /// Rows bottom-up
    pixels: Vec<[u8; 4]>,
    view_proj: Mat4,
    allocations: usize,
}

impl SoftwarePickTarget {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Number of times the pixel store was (re)allocated
    pub fn allocations(&self) -> usize {
        self.allocations
    }

    fn to_pixel(&self, p: [f32; 3]) -> Option<Vec2> {
        let clip = self.view_proj * Vec4::new(p[0], p[1], p[2], 1.0);
        if clip.w <= 0.0 {
            return None;
        }
        let ndc = clip.truncate() / clip.w;
        Some(Vec2::new(
            (ndc.x * 0.5 + 0.5) * self.width as f32,
            (ndc.y * 0.5 + 0.5) * self.height as f32,
        ))
    }
}

fn edge_fn(a: Vec2, b: Vec2, p: Vec2) -> f32 {
    (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x)
}

impl PickBackend for SoftwarePickTarget {
    fn begin(&mut self, viewport: ViewportSize, view: &Mat4, proj: &Mat4) -> Result<(), GpuError> {
        if (self.width, self.height) != (viewport.width, viewport.height) {
            self.width = viewport.width;
            self.height = viewport.height;
            self.pixels = vec![NO_HIT_COLOR; viewport.width as usize * viewport.height as usize];
            self.allocations += 1;
        } else {
            self.pixels.fill(NO_HIT_COLOR);
        }
        self.view_proj = *proj * *view;
        Ok(())
    }

    fn draw_triangle(
        &mut self,
        buffer: &DrawBuffer,
        triangle: usize,
        color: [u8; 4],
    ) -> Result<(), GpuError> {
        let Some(corners) = buffer.triangle_positions(triangle) else {
            return Ok(());
        };
        let (Some(a), Some(b), Some(c)) = (
            self.to_pixel(corners[0]),
            self.to_pixel(corners[1]),
            self.to_pixel(corners[2]),
        ) else {
            return Ok(());
        };

        let area = edge_fn(a, b, c);
        if area == 0.0 {
            return Ok(());
        }

        let lo = a.min(b).min(c).floor().max(Vec2::ZERO);
        let hi = a.max(b).max(c).ceil().min(Vec2::new(self.width as f32, self.height as f32));
        if lo.x >= hi.x || lo.y >= hi.y {
            return Ok(());
        }

        for py in lo.y as u32..hi.y as u32 {
            for px in lo.x as u32..hi.x as u32 {
                let p = Vec2::new(px as f32 + 0.5, py as f32 + 0.5);
                let w0 = edge_fn(b, c, p);
                let w1 = edge_fn(c, a, p);
                let w2 = edge_fn(a, b, p);
                let inside = if area > 0.0 {
                    w0 >= 0.0 && w1 >= 0.0 && w2 >= 0.0
                } else {
                    w0 <= 0.0 && w1 <= 0.0 && w2 <= 0.0
                };
                if inside {
                    self.pixels[(py * self.width + px) as usize] = color;
                }
            }
        }
        Ok(())
    }

    fn read_pixel(&mut self, x: u32, y: u32) -> Result<[u8; 4], GpuError> {
        if x >= self.width || y >= self.height {
            return Err(GpuError::ReadOutOfBounds {
                x,
                y,
                width: self.width,
                height: self.height,
            });
        }
        Ok(self.pixels[(y * self.width + x) as usize])
    }

    fn end(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use crate::viewport::camera::OrthoCamera;
    use crate::viewport::mesh::build_draw_buffer;
    use glam::DVec2;

    fn square_setup() -> (DrawBuffer, OrthoCamera, ViewportSize) {
        let buf = build_draw_buffer(&fixtures::unit_square_quad()).unwrap();
        let cam = OrthoCamera {
            center: DVec2::new(0.5, 0.5),
            zoom: 100.0,
        };
        (buf, cam, ViewportSize::new(200, 200))
    }

    fn pick_at(
        engine: &mut PickingEngine<SoftwarePickTarget>,
        buf: &DrawBuffer,
        cam: &OrthoCamera,
        vp: ViewportSize,
        x: f32,
        y: f32,
    ) -> Option<usize> {
        engine
            .pick(buf, &cam.view_matrix(), &cam.projection_matrix(vp), vp, Vec2::new(x, y))
            .unwrap()
    }

    #[test]
    fn test_encode_decode_full_range() {
        for id in 1..=MAX_PICK_ID {
            let [r, g, b, a] = encode_pick_id(id);
            assert_eq!(a, 0xff);
            assert_eq!(decode_pick_id([r, g, b]), Some(id));
        }
    }

    #[test]
    fn test_background_decodes_to_none() {
        assert_eq!(decode_pick_id([0, 0, 0]), None);
        let [r, g, b, _] = NO_HIT_COLOR;
        assert_eq!(decode_pick_id([r, g, b]), None);
    }

    #[test]
    fn test_encoding_channel_order() {
        assert_eq!(encode_pick_id(0x123456), [0x12, 0x34, 0x56, 0xff]);
        assert_eq!(pick_id_for_triangle(0), 1);
        assert_eq!(triangle_for_pick_id(1), 0);
    }

    #[test]
    fn test_pick_inside_each_triangle() {
        let (buf, cam, vp) = square_setup();
        let mut engine = PickingEngine::new(SoftwarePickTarget::new());

        // World (0.6, 0.1): below the diagonal; only hits with the y flip
        assert_eq!(pick_at(&mut engine, &buf, &cam, vp, 110.0, 140.0), Some(0));
        // World (0.1, 0.2): above the diagonal
        assert_eq!(pick_at(&mut engine, &buf, &cam, vp, 60.0, 130.0), Some(1));
        assert_eq!(engine.state(), PickState::Idle);
    }

    #[test]
    fn test_pick_outside_mesh() {
        let (buf, cam, vp) = square_setup();
        let mut engine = PickingEngine::new(SoftwarePickTarget::new());
        assert_eq!(pick_at(&mut engine, &buf, &cam, vp, 10.0, 10.0), None);
    }

    #[test]
    fn test_pick_preconditions() {
        let (buf, cam, vp) = square_setup();
        let mut engine = PickingEngine::new(SoftwarePickTarget::new());

        let empty = DrawBuffer::default();
        assert_eq!(pick_at(&mut engine, &empty, &cam, vp, 100.0, 100.0), None);
        assert_eq!(pick_at(&mut engine, &buf, &cam, vp, 200.0, 100.0), None);
        assert_eq!(pick_at(&mut engine, &buf, &cam, vp, -1.0, 100.0), None);
        let zero = ViewportSize::new(0, 200);
        assert_eq!(pick_at(&mut engine, &buf, &cam, zero, 0.0, 0.0), None);
        // Nothing was rendered
        assert_eq!(engine.backend().allocations(), 0);
    }

    #[test]
    fn test_target_reused_until_resize() {
        let (buf, cam, vp) = square_setup();
        let mut engine = PickingEngine::new(SoftwarePickTarget::new());

        pick_at(&mut engine, &buf, &cam, vp, 110.0, 140.0);
        pick_at(&mut engine, &buf, &cam, vp, 60.0, 130.0);
        assert_eq!(engine.backend().allocations(), 1);

        let bigger = ViewportSize::new(300, 250);
        pick_at(&mut engine, &buf, &cam, bigger, 5.0, 5.0);
        assert_eq!(engine.backend().allocations(), 2);
        assert_eq!(engine.backend().size(), (300, 250));
    }

    #[test]
    fn test_stale_hit_cleared_between_picks() {
        let (buf, mut cam, vp) = square_setup();
        let mut engine = PickingEngine::new(SoftwarePickTarget::new());
        assert!(pick_at(&mut engine, &buf, &cam, vp, 100.0, 100.0).is_some());

        // Move the mesh off screen: the same pixel now misses
        cam.center = DVec2::new(50.0, 50.0);
        assert_eq!(pick_at(&mut engine, &buf, &cam, vp, 100.0, 100.0), None);
    }

    #[test]
    fn test_last_drawn_triangle_wins() {
        let mut m = mesh_model::MeshModel::new();
        let a = m.add_node(1, 0.0, 0.0).unwrap();
        let b = m.add_node(2, 1.0, 0.0).unwrap();
        let c = m.add_node(3, 0.0, 1.0).unwrap();
        let ab = m.add_edge(a, b);
        let bc = m.add_edge(b, c);
        let ca = m.add_edge(c, a);
        m.add_triangle([ab, bc, ca]);
        m.add_triangle([ca, ab, bc]);
        let buf = build_draw_buffer(&m).unwrap();
        assert_eq!(buf.triangle_count(), 2);

        let cam = OrthoCamera {
            center: DVec2::new(0.5, 0.5),
            zoom: 100.0,
        };
        let vp = ViewportSize::new(200, 200);
        let mut engine = PickingEngine::new(SoftwarePickTarget::new());
        // World (0.2, 0.2)
        assert_eq!(pick_at(&mut engine, &buf, &cam, vp, 70.0, 130.0), Some(1));
    }

    #[test]
    fn test_pick_hit_resolves_element() {
        let buf = build_draw_buffer(&fixtures::quad_with_triangle()).unwrap();
        let cam = OrthoCamera {
            center: DVec2::new(1.0, 0.5),
            zoom: 100.0,
        };
        let vp = ViewportSize::new(300, 200);
        let mut engine = PickingEngine::new(SoftwarePickTarget::new());

        // World (1.5, 0.5) lies in the triangle right of the quad
        let px = cam
            .project(DVec2::new(1.5, 0.5), vp)
            .unwrap()
            .as_vec2();
        let hit = engine
            .pick_hit(&buf, &cam.view_matrix(), &cam.projection_matrix(vp), vp, px)
            .unwrap()
            .unwrap();
        assert_eq!(hit, PickHit { triangle: 2, element: ElementIndex(1) });
    }

    /// Backend that fails at a chosen stage
    struct FailingBackend {
        fail_on_read: bool,
        ended: usize,
    }

    impl PickBackend for FailingBackend {
        fn begin(&mut self, _: ViewportSize, _: &Mat4, _: &Mat4) -> Result<(), GpuError> {
            if self.fail_on_read {
                Ok(())
            } else {
                Err(GpuError::IncompleteFramebuffer(0x8cd6))
            }
        }

        fn draw_triangle(&mut self, _: &DrawBuffer, _: usize, _: [u8; 4]) -> Result<(), GpuError> {
            Ok(())
        }

        fn read_pixel(&mut self, x: u32, y: u32) -> Result<[u8; 4], GpuError> {
            Err(GpuError::ReadOutOfBounds { x, y, width: 0, height: 0 })
        }

        fn end(&mut self) {
            self.ended += 1;
        }
    }

    #[test]
    fn test_backend_failure_returns_to_idle() {
        let (buf, cam, vp) = square_setup();
        let view = cam.view_matrix();
        let proj = cam.projection_matrix(vp);

        let mut engine = PickingEngine::new(FailingBackend { fail_on_read: false, ended: 0 });
        let err = engine.pick(&buf, &view, &proj, vp, Vec2::new(100.0, 100.0)).unwrap_err();
        assert!(matches!(err, PickError::Gpu(GpuError::IncompleteFramebuffer(_))));
        assert_eq!(engine.state(), PickState::Idle);
        assert_eq!(engine.backend().ended, 1);

        let mut engine = PickingEngine::new(FailingBackend { fail_on_read: true, ended: 0 });
        let err = engine.pick(&buf, &view, &proj, vp, Vec2::new(100.0, 100.0)).unwrap_err();
        assert!(matches!(err, PickError::Gpu(GpuError::ReadOutOfBounds { .. })));
        assert_eq!(engine.state(), PickState::Idle);
        assert_eq!(engine.backend().ended, 1);
    }
}
