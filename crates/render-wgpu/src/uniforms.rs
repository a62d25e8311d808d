//! CPU mirrors of the shader uniform blocks and the vertex layout.
//!
//! Every block is built from whole `vec4`s so the Rust and WGSL layouts agree
//! without padding fields.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use materia_scene::{Geometry, Material, PerspectiveCamera};

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub(crate) struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex {
    pub const ATTRIBUTES: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x2];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Interleave a geometry's attribute streams.
pub(crate) fn interleave(geometry: &Geometry) -> Vec<Vertex> {
    geometry
        .positions
        .iter()
        .zip(&geometry.normals)
        .zip(&geometry.uvs)
        .map(|((p, n), uv)| Vertex {
            position: *p,
            normal: *n,
            uv: *uv,
        })
        .collect()
}

/// Environment state as seen by the shaders.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct EnvironmentInfo {
    pub has_environment: bool,
    pub mip_count: u32,
    pub has_background: bool,
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub(crate) struct FrameUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub inv_view_proj: [[f32; 4]; 4],
    pub camera_pos: [f32; 4],
    /// has_environment, environment mip count, has_background, unused.
    pub env: [f32; 4],
}

impl FrameUniforms {
    pub fn new(camera: &PerspectiveCamera, env: EnvironmentInfo) -> Self {
        let view_proj = camera.view_projection();
        Self {
            view_proj: view_proj.to_cols_array_2d(),
            inv_view_proj: view_proj.inverse().to_cols_array_2d(),
            camera_pos: camera.position.extend(1.0).to_array(),
            env: [
                flag(env.has_environment),
                env.mip_count.max(1) as f32,
                flag(env.has_background),
                0.0,
            ],
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub(crate) struct ObjectUniforms {
    pub model: [[f32; 4]; 4],
    pub normal_matrix: [[f32; 4]; 4],
}

impl ObjectUniforms {
    pub fn new(model: Mat4) -> Self {
        Self {
            model: model.to_cols_array_2d(),
            normal_matrix: model.inverse().transpose().to_cols_array_2d(),
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub(crate) struct MaterialUniforms {
    /// rgb + opacity
    pub color: [f32; 4],
    /// metalness, roughness, ao intensity, env intensity
    pub pbr: [f32; 4],
    /// clearcoat, clearcoat roughness, sheen, sheen roughness
    pub layers: [f32; 4],
    pub sheen_color: [f32; 4],
    /// iridescence, iridescence ior, thickness min, thickness max (nm)
    pub iridescence: [f32; 4],
    /// transmission, ior, thickness, displacement scale
    pub transmission: [f32; 4],
    /// normal scale xy, displacement bias, unused
    pub normal: [f32; 4],
    /// map, ao, displacement, metalness present
    pub maps_a: [f32; 4],
    /// roughness, normal, alpha present; transparent
    pub maps_b: [f32; 4],
}

impl MaterialUniforms {
    /// Pack `material`. `present` says which map slots have GPU data, in
    /// [`materia_scene::MaterialMaps::slots`] order.
    pub fn new(material: &Material, present: [bool; 7]) -> Self {
        let m = material;
        Self {
            color: rgb_a(m.color, m.opacity),
            pbr: [
                m.metalness,
                m.roughness,
                m.ao_map_intensity,
                m.env_map_intensity,
            ],
            layers: [
                m.clearcoat,
                m.clearcoat_roughness,
                m.sheen,
                m.sheen_roughness,
            ],
            sheen_color: rgb_a(m.sheen_color, 0.0),
            iridescence: [
                m.iridescence,
                m.iridescence_ior,
                m.iridescence_thickness_range[0],
                m.iridescence_thickness_range[1],
            ],
            transmission: [m.transmission, m.ior, m.thickness, m.displacement_scale],
            normal: [
                m.normal_scale.x,
                m.normal_scale.y,
                m.displacement_bias,
                0.0,
            ],
            maps_a: [
                flag(present[0]),
                flag(present[1]),
                flag(present[2]),
                flag(present[3]),
            ],
            maps_b: [
                flag(present[4]),
                flag(present[5]),
                flag(present[6]),
                flag(m.transparent),
            ],
        }
    }
}

fn rgb_a(rgb: Vec3, a: f32) -> [f32; 4] {
    rgb.extend(a).to_array()
}

fn flag(b: bool) -> f32 {
    if b { 1.0 } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;
    use materia_common::Transform;

    #[test]
    fn uniform_blocks_are_vec4_aligned() {
        assert_eq!(std::mem::size_of::<FrameUniforms>(), 160);
        assert_eq!(std::mem::size_of::<ObjectUniforms>(), 128);
        assert_eq!(std::mem::size_of::<MaterialUniforms>(), 9 * 16);
        assert_eq!(std::mem::size_of::<Vertex>(), 32);
    }

    #[test]
    fn material_packing() {
        let mut m = Material::demo();
        m.roughness = 0.25;
        m.transparent = true;
        m.opacity = 0.5;
        let u = MaterialUniforms::new(&m, [true, false, false, false, false, true, false]);
        assert_eq!(u.color, [1.0, 1.0, 1.0, 0.5]);
        assert_eq!(u.pbr[0], 1.0);
        assert_eq!(u.pbr[1], 0.25);
        assert_eq!(u.iridescence[3], 400.0);
        assert_eq!(u.transmission[1], 1.5);
        assert_eq!(u.maps_a, [1.0, 0.0, 0.0, 0.0]);
        assert_eq!(u.maps_b, [0.0, 1.0, 0.0, 1.0]);
    }

    #[test]
    fn frame_inverse_undoes_view_projection() {
        let camera = PerspectiveCamera::default();
        let u = FrameUniforms::new(
            &camera,
            EnvironmentInfo {
                has_environment: true,
                mip_count: 12,
                has_background: false,
            },
        );
        assert_eq!(u.env, [1.0, 12.0, 0.0, 0.0]);
        let vp = Mat4::from_cols_array_2d(&u.view_proj);
        let inv = Mat4::from_cols_array_2d(&u.inv_view_proj);
        let p = Vec4::new(0.3, -0.2, 0.5, 1.0);
        let back = inv * (vp * p);
        assert!((back / back.w).abs_diff_eq(p, 1e-4));
    }

    #[test]
    fn normal_matrix_keeps_normals_perpendicular_under_scale() {
        let mut t = Transform::default();
        t.scale = Vec3::new(2.0, 1.0, 1.0);
        t.rotation.y = 0.7;
        let u = ObjectUniforms::new(t.matrix());
        let model = Mat4::from_cols_array_2d(&u.model);
        let nm = Mat4::from_cols_array_2d(&u.normal_matrix);
        // Tangent (1, -1, 0) on a surface with normal (1, 1, 0).
        let tangent = model.transform_vector3(Vec3::new(1.0, -1.0, 0.0));
        let normal = nm.transform_vector3(Vec3::new(1.0, 1.0, 0.0));
        assert!(tangent.dot(normal).abs() < 1e-5);
    }

    #[test]
    fn interleave_keeps_vertex_order() {
        let g = Geometry::plane(1.0, 1.0, 1, 1);
        let v = interleave(&g);
        assert_eq!(v.len(), 4);
        assert_eq!(v[3].position, g.positions[3]);
        assert_eq!(v[3].uv, g.uvs[3]);
    }
}
