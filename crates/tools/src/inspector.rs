use materia_assets::{TextureHandle, TextureLibrary, TextureState};
use materia_scene::Scene;

/// Read-only queries against the scene and asset state for debugging and
/// the desktop side panel.
pub struct SceneInspector;

impl SceneInspector {
    pub fn summary(scene: &Scene) -> SceneSummary {
        let material = scene.material().borrow();
        SceneSummary {
            mesh_count: scene.meshes().len(),
            triangle_count: scene
                .meshes()
                .iter()
                .map(|m| m.geometry.triangle_count())
                .sum(),
            metalness: material.metalness,
            roughness: material.roughness,
            environment: scene.environment().map(|e| (e.width(), e.height())),
            has_background: scene.background().is_some(),
        }
    }

    pub fn inspect_mesh(scene: &Scene, name: &str) -> Option<MeshInfo> {
        scene.mesh(name).map(|mesh| MeshInfo {
            name: mesh.name.clone(),
            position: mesh.transform.position.to_array(),
            rotation: mesh.transform.rotation.to_array(),
            vertex_count: mesh.geometry.vertex_count(),
            triangle_count: mesh.geometry.triangle_count(),
        })
    }

    pub fn textures(library: &TextureLibrary) -> TextureSummary {
        let mut summary = TextureSummary {
            total: library.len(),
            ..TextureSummary::default()
        };
        for handle in (0..library.len() as u32).map(TextureHandle) {
            match library.state(handle) {
                Some(TextureState::Ready(_)) => summary.ready += 1,
                Some(TextureState::Pending) => summary.pending += 1,
                Some(TextureState::Failed) => summary.failed += 1,
                None => {}
            }
        }
        summary
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneSummary {
    pub mesh_count: usize,
    pub triangle_count: usize,
    pub metalness: f32,
    pub roughness: f32,
    pub environment: Option<(u32, u32)>,
    pub has_background: bool,
}

impl std::fmt::Display for SceneSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Scene: meshes={} triangles={} metalness={:.3} roughness={:.3}",
            self.mesh_count, self.triangle_count, self.metalness, self.roughness
        )?;
        match self.environment {
            Some((w, h)) => write!(f, " environment={w}x{h}"),
            None => write!(f, " environment=none"),
        }
    }
}

/// Detailed info about a single mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshInfo {
    pub name: String,
    pub position: [f32; 3],
    pub rotation: [f32; 3],
    pub vertex_count: usize,
    pub triangle_count: usize,
}

impl std::fmt::Display for MeshInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} pos=({:.2}, {:.2}, {:.2}) rot=({:.3}, {:.3}, {:.3}) verts={} tris={}",
            self.name,
            self.position[0],
            self.position[1],
            self.position[2],
            self.rotation[0],
            self.rotation[1],
            self.rotation[2],
            self.vertex_count,
            self.triangle_count,
        )
    }
}

/// Load state counts across the texture library.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TextureSummary {
    pub total: usize,
    pub ready: usize,
    pub pending: usize,
    pub failed: usize,
}

impl std::fmt::Display for TextureSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Textures: {} ready, {} pending, {} failed (of {})",
            self.ready, self.pending, self.failed, self.total
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use materia_assets::AssetLoader;
    use materia_scene::{Material, Spin};

    #[test]
    fn summary_of_demo_scene() {
        let scene = Scene::demo(Material::demo());
        let summary = SceneInspector::summary(&scene);
        assert_eq!(summary.mesh_count, 3);
        assert_eq!(summary.triangle_count, 480 + 20_000 + 1024);
        assert_eq!(summary.environment, None);
        assert!(!summary.has_background);
        let s = summary.to_string();
        assert!(s.contains("meshes=3"));
        assert!(s.contains("environment=none"));
    }

    #[test]
    fn inspect_mesh_found() {
        let mut scene = Scene::demo(Material::demo());
        scene.animate(&Spin::default(), 2.0);
        let info = SceneInspector::inspect_mesh(&scene, "torus").unwrap();
        assert_eq!(info.position, [1.5, 0.0, 0.0]);
        assert!((info.rotation[1] - 0.2).abs() < 1e-6);
        assert_eq!(info.vertex_count, 17 * 33);
        assert!(info.to_string().starts_with("torus"));
    }

    #[test]
    fn inspect_mesh_not_found() {
        let scene = Scene::demo(Material::demo());
        assert!(SceneInspector::inspect_mesh(&scene, "cube").is_none());
    }

    #[test]
    fn texture_summary_counts_pending() {
        let mut loader: AssetLoader<()> = AssetLoader::new("nowhere").unwrap();
        loader.load_texture("a", "a.png", Default::default());
        loader.load_texture("b", "b.png", Default::default());
        let summary = SceneInspector::textures(loader.textures());
        assert_eq!(summary.total, 2);
        assert_eq!(summary.ready, 0);
        assert_eq!(summary.pending + summary.failed, 2);
    }
}
