use glam::{EulerRot, Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Spatial transform: position, XYZ Euler rotation (radians), scale.
///
/// Rotation is kept as Euler angles rather than a quaternion so that per-axis
/// writes (`rotation.y = 0.1 * t`) stay exact and readable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    /// Rotation as a quaternion, applying X then Y then Z in the object's frame.
    pub fn quat(&self) -> Quat {
        Quat::from_euler(
            EulerRot::XYZ,
            self.rotation.x,
            self.rotation.y,
            self.rotation.z,
        )
    }

    /// Local-to-world matrix.
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.quat(), self.position)
    }
}

/// Color space a texture's texels are encoded in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorSpace {
    /// Non-color data (normals, roughness, masks).
    #[default]
    Linear,
    /// Color data authored in sRGB.
    Srgb,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transform_default_is_identity() {
        let t = Transform::default();
        assert_eq!(t.position, Vec3::ZERO);
        assert_eq!(t.rotation, Vec3::ZERO);
        assert_eq!(t.scale, Vec3::ONE);
        assert!(t.matrix().abs_diff_eq(Mat4::IDENTITY, 1e-6));
    }

    #[test]
    fn matrix_carries_translation() {
        let t = Transform::from_position(Vec3::new(-1.5, 0.0, 0.0));
        let p = t.matrix().transform_point3(Vec3::ZERO);
        assert!(p.abs_diff_eq(Vec3::new(-1.5, 0.0, 0.0), 1e-6));
    }

    #[test]
    fn rotation_about_y_turns_x_into_minus_z() {
        let t = Transform {
            rotation: Vec3::new(0.0, std::f32::consts::FRAC_PI_2, 0.0),
            ..Transform::default()
        };
        let v = t.matrix().transform_vector3(Vec3::X);
        assert!(v.abs_diff_eq(Vec3::NEG_Z, 1e-6));
    }

    #[test]
    fn color_space_defaults_to_linear() {
        assert_eq!(ColorSpace::default(), ColorSpace::Linear);
    }
}
