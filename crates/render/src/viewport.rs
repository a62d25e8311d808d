use materia_scene::PerspectiveCamera;

/// Upper bound on the pixel ratio used for the drawing buffer.
pub const MAX_PIXEL_RATIO: f32 = 2.0;

/// Logical window size plus the display's reported device pixel ratio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
    pub device_pixel_ratio: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1280.0, 720.0, 1.0)
    }
}

impl Viewport {
    pub fn new(width: f32, height: f32, device_pixel_ratio: f32) -> Self {
        Self {
            width,
            height,
            device_pixel_ratio,
        }
    }

    /// From a window's physical size and scale factor.
    pub fn from_physical(width: u32, height: u32, scale_factor: f64) -> Self {
        let scale = if scale_factor > 0.0 { scale_factor } else { 1.0 };
        Self::new(
            (width as f64 / scale) as f32,
            (height as f64 / scale) as f32,
            scale as f32,
        )
    }

    /// Pixel ratio actually rendered at: `min(device_pixel_ratio, 2)`.
    pub fn pixel_ratio(&self) -> f32 {
        if self.device_pixel_ratio > 0.0 {
            self.device_pixel_ratio.min(MAX_PIXEL_RATIO)
        } else {
            1.0
        }
    }

    /// A minimised window reports a zero dimension.
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    pub fn aspect(&self) -> f32 {
        if self.is_empty() {
            1.0
        } else {
            self.width / self.height
        }
    }

    /// Physical size of the offscreen drawing buffer, at least 1x1.
    pub fn drawing_buffer_size(&self) -> (u32, u32) {
        let r = self.pixel_ratio();
        (
            (self.width * r).round().max(1.0) as u32,
            (self.height * r).round().max(1.0) as u32,
        )
    }

    /// Store a new size. Returns whether anything changed.
    pub fn resize(&mut self, width: f32, height: f32, device_pixel_ratio: f32) -> bool {
        let next = Self::new(width, height, device_pixel_ratio);
        if next == *self {
            return false;
        }
        *self = next;
        true
    }
}

/// Resize handler: record the new viewport and refit the camera.
///
/// Returns `true` when the caller must also resize its render targets.
/// Zero-sized viewports are recorded but leave the camera untouched.
pub fn apply_resize(viewport: &mut Viewport, camera: &mut PerspectiveCamera, next: Viewport) -> bool {
    if !viewport.resize(next.width, next.height, next.device_pixel_ratio) {
        return false;
    }
    if viewport.is_empty() {
        tracing::debug!("viewport minimised");
        return false;
    }
    camera.aspect = viewport.aspect();
    camera.update_projection_matrix();
    let (bw, bh) = viewport.drawing_buffer_size();
    tracing::debug!(
        width = viewport.width,
        height = viewport.height,
        pixel_ratio = viewport.pixel_ratio(),
        buffer_width = bw,
        buffer_height = bh,
        "viewport resized"
    );
    true
}
