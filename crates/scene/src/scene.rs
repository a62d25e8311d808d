use std::rc::Rc;
use std::sync::Arc;

use glam::Vec3;
use materia_assets::EnvironmentMap;
use materia_common::Transform;

use crate::frame_loop::Spin;
use crate::geometry::Geometry;
use crate::material::{Material, SharedMaterial};
use crate::mesh::Mesh;

/// The scene graph: meshes that all share one material, plus the optional
/// environment used as background and as reflection source.
#[derive(Debug)]
pub struct Scene {
    material: SharedMaterial,
    meshes: Vec<Mesh>,
    background: Option<Arc<EnvironmentMap>>,
    environment: Option<Arc<EnvironmentMap>>,
}

impl Scene {
    /// Empty scene owning `material`.
    pub fn new(material: Material) -> Self {
        Self {
            material: SharedMaterial::new(material),
            meshes: Vec::new(),
            background: None,
            environment: None,
        }
    }

    /// Sphere, plane and torus side by side, all on `material`.
    pub fn demo(material: Material) -> Self {
        let mut scene = Self::new(material);
        scene.add_mesh(
            "sphere",
            Rc::new(Geometry::sphere(0.5, 16, 16)),
            Vec3::new(-1.5, 0.0, 0.0),
        );
        scene.add_mesh(
            "plane",
            Rc::new(Geometry::plane(1.0, 1.0, 100, 100)),
            Vec3::ZERO,
        );
        scene.add_mesh(
            "torus",
            Rc::new(Geometry::torus(0.3, 0.2, 16, 32)),
            Vec3::new(1.5, 0.0, 0.0),
        );
        scene
    }

    /// Add a mesh on the scene's material. Returns its index.
    pub fn add_mesh(&mut self, name: &str, geometry: Rc<Geometry>, position: Vec3) -> usize {
        self.meshes.push(Mesh::new(
            name,
            geometry,
            self.material.clone(),
            Transform::from_position(position),
        ));
        tracing::debug!(name, "mesh added");
        self.meshes.len() - 1
    }

    pub fn material(&self) -> &SharedMaterial {
        &self.material
    }

    pub fn meshes(&self) -> &[Mesh] {
        &self.meshes
    }

    pub fn mesh(&self, name: &str) -> Option<&Mesh> {
        self.meshes.iter().find(|m| m.name == name)
    }

    pub fn mesh_mut(&mut self, name: &str) -> Option<&mut Mesh> {
        self.meshes.iter_mut().find(|m| m.name == name)
    }

    pub fn background(&self) -> Option<&Arc<EnvironmentMap>> {
        self.background.as_ref()
    }

    pub fn environment(&self) -> Option<&Arc<EnvironmentMap>> {
        self.environment.as_ref()
    }

    pub fn set_background(&mut self, env: Option<Arc<EnvironmentMap>>) {
        self.background = env;
    }

    pub fn set_environment(&mut self, env: Option<Arc<EnvironmentMap>>) {
        self.environment = env;
    }

    /// Use `env` both as the visible background and as the reflection source.
    pub fn install_environment(&mut self, env: Arc<EnvironmentMap>) {
        self.background = Some(env.clone());
        self.environment = Some(env);
    }

    /// Set every mesh's rotation for elapsed time `t`.
    pub fn animate(&mut self, spin: &Spin, t: f32) {
        for mesh in &mut self.meshes {
            spin.apply(&mut mesh.transform, t);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_has_three_meshes_in_a_row() {
        let scene = Scene::demo(Material::demo());
        let names: Vec<&str> = scene.meshes().iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["sphere", "plane", "torus"]);
        assert_eq!(scene.mesh("sphere").unwrap().transform.position.x, -1.5);
        assert_eq!(scene.mesh("plane").unwrap().transform.position, Vec3::ZERO);
        assert_eq!(scene.mesh("torus").unwrap().transform.position.x, 1.5);
    }

    #[test]
    fn all_meshes_share_one_material() {
        let scene = Scene::demo(Material::demo());
        for mesh in scene.meshes() {
            assert!(mesh.material.ptr_eq(scene.material()));
        }
        // scene + three meshes
        assert_eq!(scene.material().ref_count(), 4);
    }

    #[test]
    fn material_edit_is_seen_by_every_mesh() {
        let scene = Scene::demo(Material::demo());
        scene.material().borrow_mut().metalness = 0.3;
        for mesh in scene.meshes() {
            assert_eq!(mesh.material.borrow().metalness, 0.3);
            assert_eq!(*mesh.material.borrow(), *scene.material().borrow());
        }
    }

    #[test]
    fn environment_starts_unset() {
        let scene = Scene::demo(Material::demo());
        assert!(scene.background().is_none());
        assert!(scene.environment().is_none());
    }

    #[test]
    fn install_environment_sets_both_slots() {
        let mut scene = Scene::demo(Material::demo());
        let env = Arc::new(EnvironmentMap::from_rgb32f(2, 1, &[1.0; 6]));
        scene.install_environment(env.clone());
        assert!(Arc::ptr_eq(scene.background().unwrap(), &env));
        assert!(Arc::ptr_eq(scene.environment().unwrap(), &env));
    }

    #[test]
    fn animate_is_a_function_of_time_only() {
        let mut scene = Scene::demo(Material::demo());
        let spin = Spin::default();
        scene.animate(&spin, 5.0);
        scene.animate(&spin, 5.0);
        let r = scene.mesh("plane").unwrap().transform.rotation;
        assert!((r.y - 0.5).abs() < 1e-6);
        assert!((r.x + 0.75).abs() < 1e-6);
    }
}
