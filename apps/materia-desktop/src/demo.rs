use std::path::PathBuf;

use glam::Vec2;
use materia_assets::{AssetError, AssetLoader};
use materia_input::{Button, OrbitControls, PointerTracker};
use materia_render::{Viewport, apply_resize};
use materia_scene::{
    CancelHandle, Clock, DemoConfig, FrameLoop, FrameTick, PerspectiveCamera, Scene,
};
use materia_tools::{ParameterPanel, SceneInspector};

/// Everything the viewer owns apart from the GPU: scene, camera, controls,
/// panel and the in-flight asset loads.
pub struct Demo {
    scene: Scene,
    camera: PerspectiveCamera,
    controls: OrbitControls,
    pointer: PointerTracker,
    frame_loop: FrameLoop,
    panel: ParameterPanel,
    viewport: Viewport,
    loader: AssetLoader<Scene>,
    show_inspector: bool,
}

impl Demo {
    pub fn bootstrap(
        config: &DemoConfig,
        assets_dir: impl Into<PathBuf>,
        viewport: Viewport,
    ) -> Result<Self, AssetError> {
        Self::bootstrap_with_clock(config, assets_dir, viewport, Clock::new())
    }

    /// Wire up the scene and start every asset load. Loads finish in the
    /// background and land on the next [`Demo::frame`].
    pub fn bootstrap_with_clock(
        config: &DemoConfig,
        assets_dir: impl Into<PathBuf>,
        viewport: Viewport,
        clock: Clock,
    ) -> Result<Self, AssetError> {
        let mut loader = AssetLoader::new(assets_dir)?;
        loader.load_manifest_textures(&config.assets);

        let mut material = config.material.clone();
        material.maps = config.maps.resolve(loader.textures());
        let scene = Scene::demo(material);

        loader.load_environment(&config.assets.environment, |scene: &mut Scene, env| {
            scene.install_environment(env);
        });

        let camera = config.camera.build(viewport.aspect());
        let controls = OrbitControls::from_config(config.camera.target, &config.controls);

        tracing::info!(
            root = %loader.root().display(),
            meshes = scene.meshes().len(),
            pending = loader.in_flight(),
            "scene bootstrapped"
        );

        Ok(Self {
            scene,
            camera,
            controls,
            pointer: PointerTracker::new(),
            frame_loop: FrameLoop::new(clock, config.spin),
            panel: ParameterPanel::new(config.panel.clone()),
            viewport,
            loader,
            show_inspector: false,
        })
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn camera(&self) -> &PerspectiveCamera {
        &self.camera
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn loader(&self) -> &AssetLoader<Scene> {
        &self.loader
    }

    pub fn panel(&self) -> &ParameterPanel {
        &self.panel
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.frame_loop.cancel_handle()
    }

    /// Apply finished loads, animate the meshes and step the controls.
    /// `None` once the loop has been cancelled.
    pub fn frame(&mut self) -> Option<FrameTick> {
        self.loader.poll(&mut self.scene);
        let tick = self.frame_loop.tick(&mut self.scene)?;
        self.controls.update(&mut self.camera);
        Some(tick)
    }

    pub fn resize(&mut self, next: Viewport) -> bool {
        apply_resize(&mut self.viewport, &mut self.camera, next)
    }

    pub fn pointer_button(&mut self, button: Button, pressed: bool) {
        if pressed {
            self.pointer.press(button);
        } else {
            self.pointer.release(button);
        }
    }

    /// Cursor position in logical pixels.
    pub fn pointer_moved(&mut self, position: Vec2) {
        let action = self.pointer.moved(position);
        self.controls
            .handle(action, &self.camera, self.viewport.height);
    }

    pub fn pointer_left(&mut self) {
        self.pointer.reset();
    }

    pub fn wheel(&mut self, notches: f32) {
        let action = self.pointer.wheel(notches);
        self.controls
            .handle(action, &self.camera, self.viewport.height);
    }

    pub fn toggle_inspector(&mut self) {
        self.show_inspector = !self.show_inspector;
    }

    /// Draw the material panel and, if toggled on, the inspector. Returns
    /// whether a slider changed the material.
    pub fn draw_ui(&mut self, ctx: &egui::Context) -> bool {
        let changed = self.panel.show(ctx, self.scene.material());
        if !self.show_inspector {
            return changed;
        }

        let summary = SceneInspector::summary(&self.scene);
        let textures = SceneInspector::textures(self.loader.textures());
        egui::SidePanel::left("inspector")
            .default_width(280.0)
            .show(ctx, |ui| {
                ui.heading("Materia");
                ui.separator();
                ui.label(format!("Frame: {}", self.frame_loop.frame()));
                ui.label(summary.to_string());
                ui.label(textures.to_string());
                ui.label(format!(
                    "Camera: ({:.2}, {:.2}, {:.2})",
                    self.camera.position.x, self.camera.position.y, self.camera.position.z
                ));
                ui.separator();
                for mesh in self.scene.meshes() {
                    if let Some(info) = SceneInspector::inspect_mesh(&self.scene, &mesh.name) {
                        ui.label(info.to_string());
                    }
                }
                ui.separator();
                ui.small("F1: Toggle Inspector | LMB: Orbit | RMB: Pan | Wheel: Zoom");
            });
        changed
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::time::Duration;

    use materia_scene::MaterialProperty;

    use super::*;

    fn write_hdr(dir: &Path, rel: &str) {
        let path = dir.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        let mut bytes = b"#?RADIANCE\nFORMAT=32-bit_rle_rgbe\n\n-Y 1 +X 2\n".to_vec();
        bytes.extend_from_slice(&[128, 128, 128, 128, 128, 128, 128, 128]);
        std::fs::write(path, bytes).unwrap();
    }

    fn demo(root: &Path) -> Demo {
        Demo::bootstrap_with_clock(
            &DemoConfig::default(),
            root,
            Viewport::default(),
            Clock::manual(),
        )
        .unwrap()
    }

    #[test]
    fn meshes_follow_elapsed_time() {
        let dir = tempfile::tempdir().unwrap();
        let mut demo = demo(dir.path());
        demo.frame_loop.clock_mut().advance(Duration::from_secs(10));
        demo.frame().unwrap();
        for mesh in demo.scene().meshes() {
            assert!((mesh.transform.rotation.y - 1.0).abs() < 1e-5);
            assert!((mesh.transform.rotation.x + 1.5).abs() < 1e-5);
        }
    }

    #[test]
    fn missing_environment_leaves_scene_unlit() {
        let dir = tempfile::tempdir().unwrap();
        let mut demo = demo(dir.path());
        let outcomes = demo.loader.flush(&mut demo.scene, Duration::from_secs(5));
        assert!(!outcomes.is_empty());
        assert!(outcomes.iter().all(|o| !o.is_ok()));
        assert!(demo.frame().is_some());
        assert!(demo.scene().environment().is_none());
        assert!(demo.scene().background().is_none());
    }

    #[test]
    fn environment_becomes_background_and_reflection() {
        let dir = tempfile::tempdir().unwrap();
        write_hdr(dir.path(), "textures/environmentMap/2k.hdr");
        let mut demo = demo(dir.path());
        demo.loader.flush(&mut demo.scene, Duration::from_secs(5));
        let env = demo.scene().environment().unwrap();
        let bg = demo.scene().background().unwrap();
        assert!(std::sync::Arc::ptr_eq(env, bg));
        assert_eq!((env.width(), env.height()), (2, 1));
    }

    #[test]
    fn resize_updates_camera_aspect() {
        let dir = tempfile::tempdir().unwrap();
        let mut demo = demo(dir.path());
        assert!(demo.resize(Viewport::new(800.0, 400.0, 3.0)));
        assert_eq!(demo.camera().aspect, 2.0);
        assert_eq!(demo.viewport().pixel_ratio(), 2.0);
        assert!(!demo.resize(Viewport::new(800.0, 400.0, 3.0)));
    }

    #[test]
    fn drag_orbits_camera_over_frames() {
        let dir = tempfile::tempdir().unwrap();
        let mut demo = demo(dir.path());
        let start = demo.camera().position;
        demo.pointer_moved(Vec2::new(100.0, 100.0));
        demo.pointer_button(Button::Primary, true);
        demo.pointer_moved(Vec2::new(160.0, 100.0));
        demo.pointer_button(Button::Primary, false);
        demo.frame().unwrap();
        let first = demo.camera().position;
        assert_ne!(first, start);
        demo.frame().unwrap();
        // Damping keeps the camera moving after the drag ends.
        assert_ne!(demo.camera().position, first);
        assert!((demo.camera().position.length() - start.length()).abs() < 1e-4);
    }

    #[test]
    fn hover_does_not_move_camera() {
        let dir = tempfile::tempdir().unwrap();
        let mut demo = demo(dir.path());
        let start = demo.camera().position;
        demo.pointer_moved(Vec2::new(10.0, 10.0));
        demo.pointer_moved(Vec2::new(90.0, 50.0));
        demo.frame().unwrap();
        assert!(demo.camera().position.abs_diff_eq(start, 1e-5));
    }

    #[test]
    fn panel_writes_are_seen_by_every_mesh() {
        let dir = tempfile::tempdir().unwrap();
        let demo = demo(dir.path());
        let applied = demo
            .panel()
            .set(demo.scene().material(), MaterialProperty::Metalness, 0.4);
        assert_eq!(applied, Some(0.4));
        for mesh in demo.scene().meshes() {
            assert_eq!(mesh.material.borrow().metalness, 0.4);
        }
    }

    #[test]
    fn cancelled_loop_stops_ticking() {
        let dir = tempfile::tempdir().unwrap();
        let mut demo = demo(dir.path());
        assert!(demo.frame().is_some());
        demo.cancel_handle().cancel();
        assert!(demo.frame().is_none());
    }
}
