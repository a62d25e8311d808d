use glam::{Mat4, Vec3};

/// Perspective camera looking at a target point.
///
/// The projection matrix is cached: after changing `fov`, `aspect`, `near`
/// or `far`, call [`PerspectiveCamera::update_projection_matrix`].
#[derive(Debug, Clone)]
pub struct PerspectiveCamera {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    projection: Mat4,
}

impl Default for PerspectiveCamera {
    fn default() -> Self {
        let mut camera = Self::new(75.0, 16.0 / 9.0, 0.1, 100.0);
        camera.position = Vec3::new(1.0, 1.0, 2.0);
        camera
    }
}

impl PerspectiveCamera {
    pub fn new(fov: f32, aspect: f32, near: f32, far: f32) -> Self {
        let mut camera = Self {
            position: Vec3::Z,
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov,
            aspect,
            near,
            far,
            projection: Mat4::IDENTITY,
        };
        camera.update_projection_matrix();
        camera
    }

    pub fn update_projection_matrix(&mut self) {
        self.projection = Mat4::perspective_rh(
            self.fov.to_radians(),
            self.aspect.max(f32::EPSILON),
            self.near,
            self.far,
        );
    }

    pub fn look_at(&mut self, target: Vec3) {
        self.target = target;
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        self.projection
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view_matrix()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_camera() {
        let cam = PerspectiveCamera::default();
        assert_eq!(cam.position, Vec3::new(1.0, 1.0, 2.0));
        assert_eq!(cam.fov, 75.0);
        let vp = cam.view_projection();
        assert!(!vp.col(0).x.is_nan());
    }

    #[test]
    fn projection_is_cached_until_updated() {
        let mut cam = PerspectiveCamera::default();
        let before = cam.projection_matrix();
        cam.aspect = 1.0;
        assert_eq!(cam.projection_matrix(), before);
        cam.update_projection_matrix();
        assert_ne!(cam.projection_matrix(), before);
        assert_eq!(
            cam.projection_matrix(),
            Mat4::perspective_rh(75f32.to_radians(), 1.0, 0.1, 100.0)
        );
    }

    #[test]
    fn target_projects_to_screen_centre() {
        let cam = PerspectiveCamera::default();
        let clip = cam.view_projection() * cam.target.extend(1.0);
        let ndc = clip.truncate() / clip.w;
        assert!(ndc.x.abs() < 1e-5 && ndc.y.abs() < 1e-5);
    }
}
