use std::f32::consts::{PI, TAU};

use glam::{Vec2, Vec3};
use materia_scene::{ControlsConfig, PerspectiveCamera};

use crate::action::Action;

const EPS: f32 = 1e-6;

/// Orbit controls: the camera circles `target` on a sphere.
///
/// Gestures accumulate into a pending spherical delta, pan offset and dolly
/// scale. [`OrbitControls::update`] applies them once per frame. With
/// damping on, each update applies `damping_factor` of what is pending and
/// keeps the rest, so motion eases out over subsequent frames.
#[derive(Debug, Clone)]
pub struct OrbitControls {
    pub target: Vec3,
    pub enable_damping: bool,
    pub damping_factor: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub min_polar_angle: f32,
    pub max_polar_angle: f32,

    /// Pending (azimuth, polar) change in radians.
    spherical_delta: Vec2,
    pan_offset: Vec3,
    scale: f32,
}

impl Default for OrbitControls {
    fn default() -> Self {
        Self::new(Vec3::ZERO)
    }
}

impl OrbitControls {
    pub fn new(target: Vec3) -> Self {
        Self {
            target,
            enable_damping: false,
            damping_factor: 0.05,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            pan_speed: 1.0,
            min_distance: 0.0,
            max_distance: f32::INFINITY,
            min_polar_angle: 0.0,
            max_polar_angle: PI,
            spherical_delta: Vec2::ZERO,
            pan_offset: Vec3::ZERO,
            scale: 1.0,
        }
    }

    pub fn from_config(target: Vec3, config: &ControlsConfig) -> Self {
        Self::new(target).with_damping(config.enable_damping, config.damping_factor)
    }

    pub fn with_damping(mut self, enable: bool, factor: f32) -> Self {
        self.enable_damping = enable;
        self.damping_factor = factor;
        self
    }

    /// Whether any gesture is still being eased in.
    pub fn is_settling(&self) -> bool {
        self.spherical_delta.length_squared() > EPS * EPS
            || self.pan_offset.length_squared() > EPS * EPS
            || (self.scale - 1.0).abs() > EPS
    }

    /// Queue a gesture. `viewport_height` is in the same units as the deltas.
    pub fn handle(&mut self, action: Action, camera: &PerspectiveCamera, viewport_height: f32) {
        let h = viewport_height.max(1.0);
        match action {
            Action::Rotate(d) => {
                let d = d * self.rotate_speed;
                self.rotate_left(TAU * d.x / h);
                self.rotate_up(TAU * d.y / h);
            }
            Action::Pan(d) => self.pan(d * self.pan_speed, camera, h),
            Action::Dolly(notches) => {
                self.scale *= 0.95f32.powf(self.zoom_speed * notches);
            }
            Action::Noop => {}
        }
    }

    fn rotate_left(&mut self, angle: f32) {
        self.spherical_delta.x -= angle;
    }

    fn rotate_up(&mut self, angle: f32) {
        self.spherical_delta.y -= angle;
    }

    fn pan(&mut self, delta: Vec2, camera: &PerspectiveCamera, height: f32) {
        let offset = camera.position - self.target;
        // World units covered by the visible half-height at the target.
        let target_distance = offset.length() * (camera.fov.to_radians() / 2.0).tan();
        let forward = (-offset).normalize_or_zero();
        let right = forward.cross(camera.up).normalize_or_zero();
        let up = right.cross(forward);
        self.pan_offset -= right * (2.0 * delta.x * target_distance / height);
        self.pan_offset += up * (2.0 * delta.y * target_distance / height);
    }

    /// Step the controls once and move the camera. Returns whether the
    /// camera moved.
    pub fn update(&mut self, camera: &mut PerspectiveCamera) -> bool {
        let before = camera.position;
        let offset = camera.position - self.target;
        let radius = offset.length();
        let mut theta = offset.x.atan2(offset.z);
        let mut phi = if radius > 0.0 {
            (offset.y / radius).clamp(-1.0, 1.0).acos()
        } else {
            0.0
        };

        let f = if self.enable_damping {
            self.damping_factor
        } else {
            1.0
        };
        theta += self.spherical_delta.x * f;
        phi += self.spherical_delta.y * f;
        phi = phi
            .clamp(self.min_polar_angle, self.max_polar_angle)
            .clamp(EPS, PI - EPS);

        let radius = (radius * self.scale).clamp(self.min_distance, self.max_distance);
        self.target += self.pan_offset * f;

        let new_offset = Vec3::new(
            radius * phi.sin() * theta.sin(),
            radius * phi.cos(),
            radius * phi.sin() * theta.cos(),
        );
        camera.position = self.target + new_offset;
        camera.look_at(self.target);

        if self.enable_damping {
            self.spherical_delta *= 1.0 - self.damping_factor;
            self.pan_offset *= 1.0 - self.damping_factor;
        } else {
            self.spherical_delta = Vec2::ZERO;
            self.pan_offset = Vec3::ZERO;
        }
        self.scale = 1.0;

        let moved = (camera.position - before).length_squared() > EPS * EPS;
        if moved {
            tracing::trace!(position = ?camera.position, "orbit camera moved");
        }
        moved
    }
}
