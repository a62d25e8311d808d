use std::fmt::Write;

use materia_scene::{PerspectiveCamera, Scene};

/// Renderer-agnostic interface.
///
/// A renderer reads the scene and the camera and produces output. It never
/// mutates either; the frame loop and the controls own those.
pub trait Renderer {
    /// The output type produced by this renderer.
    type Output;

    /// Render one frame of `scene` as seen from `camera`.
    fn render(&self, scene: &Scene, camera: &PerspectiveCamera) -> Self::Output;
}

/// Plain-text renderer for headless runs, logging and tests.
#[derive(Debug, Default)]
pub struct DebugTextRenderer;

impl DebugTextRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl Renderer for DebugTextRenderer {
    type Output = String;

    fn render(&self, scene: &Scene, camera: &PerspectiveCamera) -> String {
        let mut out = String::new();
        let material = scene.material().borrow();
        let _ = writeln!(out, "=== Scene ({} meshes) ===", scene.meshes().len());
        let _ = writeln!(
            out,
            "Material: metalness={:.3} roughness={:.3}",
            material.metalness, material.roughness
        );
        let env = match scene.environment() {
            Some(env) => format!("{}x{} ({} mips)", env.width(), env.height(), env.mip_count()),
            None => "none".to_string(),
        };
        let _ = writeln!(
            out,
            "Environment: {env} background={}",
            if scene.background().is_some() { "set" } else { "none" }
        );
        let p = camera.position;
        let t = camera.target;
        let _ = writeln!(
            out,
            "Camera: eye=({:.2}, {:.2}, {:.2}) target=({:.2}, {:.2}, {:.2}) fov={:.0} aspect={:.3}",
            p.x, p.y, p.z, t.x, t.y, t.z, camera.fov, camera.aspect
        );

        for mesh in scene.meshes() {
            let pos = mesh.transform.position;
            let rot = mesh.transform.rotation;
            let _ = writeln!(
                out,
                "  {:<6} pos=({:.2}, {:.2}, {:.2}) rot=({:.3}, {:.3}, {:.3}) tris={}",
                mesh.name,
                pos.x,
                pos.y,
                pos.z,
                rot.x,
                rot.y,
                rot.z,
                mesh.geometry.triangle_count()
            );
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use materia_scene::Material;

    #[test]
    fn empty_scene() {
        let scene = Scene::new(Material::demo());
        let output = DebugTextRenderer::new().render(&scene, &PerspectiveCamera::default());
        assert!(output.contains("0 meshes"));
        assert!(output.contains("Environment: none"));
    }

    #[test]
    fn demo_scene_lists_meshes() {
        let mut scene = Scene::demo(Material::demo());
        scene.animate(&materia_scene::Spin::default(), 10.0);
        let output = DebugTextRenderer::new().render(&scene, &PerspectiveCamera::default());
        assert!(output.contains("3 meshes"));
        assert!(output.contains("metalness=1.000 roughness=1.000"));
        assert!(output.contains("sphere"));
        assert!(output.contains("torus"));
        assert!(output.contains("rot=(-1.500, 1.000, 0.000)"));
    }

    #[test]
    fn camera_line() {
        let scene = Scene::new(Material::demo());
        let output = DebugTextRenderer::new().render(&scene, &PerspectiveCamera::default());
        assert!(output.contains("eye=(1.00, 1.00, 2.00)"));
        assert!(output.contains("fov=75"));
    }
}
