use glam::{DMat4, DVec2, DVec3, DVec4, Mat4, Vec2, Vec3, Vec4};
use mesh_model::Bounds;

/// Zoom limits in pixels per world unit
pub const MIN_ZOOM: f64 = 1e-4;
pub const MAX_ZOOM: f64 = 1e4;
/// Zoom factor per wheel detent
pub const ZOOM_STEP: f64 = 1.1;
/// Padding applied by fit-to-bounds
pub const FIT_MARGIN: f64 = 1.1;
/// Smallest bounding-box extent considered by fit-to-bounds
pub const MIN_FIT_EXTENT: f64 = 1e-6;

/// Viewport size in physical pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewportSize {
    pub width: u32,
    pub height: u32,
}

impl ViewportSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn contains(&self, pixel: Vec2) -> bool {
        pixel.x >= 0.0
            && pixel.y >= 0.0
            && pixel.x < self.width as f32
            && pixel.y < self.height as f32
    }
}

/// 2D orthographic camera: a world-space center and a zoom factor.
///
/// The viewport is passed into every call that needs it; nothing derived
/// from its size is stored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrthoCamera {
    /// World point at the viewport center
    pub center: DVec2,
    /// Pixels per world unit
    pub zoom: f64,
}

impl Default for OrthoCamera {
    fn default() -> Self {
        Self::new()
    }
}

impl OrthoCamera {
    pub fn new() -> Self {
        Self {
            center: DVec2::ZERO,
            zoom: 1.0,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn world_per_pixel(&self) -> f64 {
        1.0 / self.zoom
    }

    /// Half the visible width and height in world units
    pub fn half_extents(&self, viewport: ViewportSize) -> DVec2 {
        DVec2::new(
            0.5 * viewport.width as f64 / self.zoom,
            0.5 * viewport.height as f64 / self.zoom,
        )
    }

    pub fn visible_bounds(&self, viewport: ViewportSize) -> Bounds {
        let half = self.half_extents(viewport);
        Bounds {
            min_x: self.center.x - half.x,
            min_y: self.center.y - half.y,
            max_x: self.center.x + half.x,
            max_y: self.center.y + half.y,
        }
    }

    /// Drag the scene by a pixel delta (screen y grows downward)
    pub fn pan(&mut self, dx: f64, dy: f64) {
        let wpp = self.world_per_pixel();
        self.center.x -= dx * wpp;
        self.center.y += dy * wpp;
    }

    /// Zoom by `1.1^wheel_steps` keeping the world point under `pixel` fixed
    pub fn zoom_at(&mut self, pixel: DVec2, wheel_steps: f64, viewport: ViewportSize) {
        if !wheel_steps.is_finite() || !pixel.is_finite() {
            return;
        }
        let before = self.screen_to_world(pixel, viewport);
        self.zoom = (self.zoom * ZOOM_STEP.powf(wheel_steps)).clamp(MIN_ZOOM, MAX_ZOOM);
        let after = self.screen_to_world(pixel, viewport);
        self.center += before - after;
    }

    /// Center on `bounds` and zoom so it fits with a 10% margin
    pub fn fit_to_bounds(&mut self, bounds: &Bounds, viewport: ViewportSize) {
        let (cx, cy) = bounds.center();
        self.center = DVec2::new(cx, cy);

        let world_w = bounds.width().max(MIN_FIT_EXTENT);
        let world_h = bounds.height().max(MIN_FIT_EXTENT);
        let fit_x = if viewport.width > 0 {
            viewport.width as f64 / (world_w * FIT_MARGIN)
        } else {
            self.zoom
        };
        let fit_y = if viewport.height > 0 {
            viewport.height as f64 / (world_h * FIT_MARGIN)
        } else {
            self.zoom
        };
        self.zoom = fit_x.min(fit_y).clamp(MIN_ZOOM, MAX_ZOOM);
    }

    /// Pixel (top-left origin, y down) to world coordinates
    pub fn screen_to_world(&self, pixel: DVec2, viewport: ViewportSize) -> DVec2 {
        if viewport.is_empty() {
            return self.center;
        }
        let ndc = DVec2::new(
            2.0 * pixel.x / viewport.width as f64 - 1.0,
            1.0 - 2.0 * pixel.y / viewport.height as f64,
        );
        self.center + ndc * self.half_extents(viewport)
    }

    /// World to pixel using the camera's own f64 transforms
    pub fn project(&self, world: DVec2, viewport: ViewportSize) -> Option<DVec2> {
        let clip = self.projection_f64(viewport)
            * self.view_f64()
            * DVec4::new(world.x, world.y, 0.0, 1.0);
        ndc_to_pixel(clip, viewport)
    }

    fn view_f64(&self) -> DMat4 {
        DMat4::from_translation(DVec3::new(-self.center.x, -self.center.y, 0.0))
    }

    fn projection_f64(&self, viewport: ViewportSize) -> DMat4 {
        let half = self.half_extents(viewport);
        DMat4::orthographic_rh_gl(-half.x, half.x, -half.y, half.y, -1.0, 1.0)
    }

    /// View matrix (world -> camera): translation by -center
    pub fn view_matrix(&self) -> Mat4 {
        self.view_f64().as_mat4()
    }

    /// Projection matrix (camera -> clip), symmetric around the center
    pub fn projection_matrix(&self, viewport: ViewportSize) -> Mat4 {
        self.projection_f64(viewport).as_mat4()
    }

    pub fn view_projection(&self, viewport: ViewportSize) -> Mat4 {
        (self.projection_f64(viewport) * self.view_f64()).as_mat4()
    }
}

/// Project a world point to pixel coordinates (top-left origin).
///
/// Returns `None` for points behind the camera or outside the depth range.
pub fn world_to_screen(point: Vec3, view: &Mat4, proj: &Mat4, viewport: ViewportSize) -> Option<Vec2> {
    let clip = *proj * *view * Vec4::new(point.x, point.y, point.z, 1.0);
    ndc_to_pixel(clip.as_dvec4(), viewport).map(|p| p.as_vec2())
}

fn ndc_to_pixel(clip: DVec4, viewport: ViewportSize) -> Option<DVec2> {
    if clip.w <= 0.0 {
        return None;
    }
    let ndc = clip.truncate() / clip.w;
    if !(-1.0..=1.0).contains(&ndc.z) {
        return None;
    }
    Some(DVec2::new(
        (ndc.x * 0.5 + 0.5) * viewport.width as f64,
        (1.0 - (ndc.y * 0.5 + 0.5)) * viewport.height as f64,
    ))
}
