use std::fmt;
use std::path::Path;
use std::time::Duration;

use materia_assets::{AssetError, AssetLoader, LoadOutcome};
use materia_input::OrbitControls;
use materia_render::{DebugTextRenderer, Renderer};
use materia_scene::{Clock, DemoConfig, FrameLoop, Scene};
use materia_tools::{SceneInspector, TextureSummary};

/// Build the stock scene and wait up to `timeout` for its loads to settle.
fn build_scene(
    config: &DemoConfig,
    assets_dir: &Path,
    timeout: Duration,
) -> Result<(Scene, AssetLoader<Scene>, Vec<LoadOutcome>), AssetError> {
    let mut loader = AssetLoader::new(assets_dir)?;
    loader.load_manifest_textures(&config.assets);
    let mut material = config.material.clone();
    material.maps = config.maps.resolve(loader.textures());
    let mut scene = Scene::demo(material);
    loader.load_environment(&config.assets.environment, |scene: &mut Scene, env| {
        scene.install_environment(env);
    });
    let outcomes = loader.flush(&mut scene, timeout);
    Ok((scene, loader, outcomes))
}

/// Run `frames` ticks of the frame loop at `fps` on a manual clock and
/// return the debug text of the final frame.
pub fn simulate(
    config: &DemoConfig,
    assets_dir: &Path,
    frames: u64,
    fps: f32,
    timeout: Duration,
) -> anyhow::Result<String> {
    anyhow::ensure!(fps.is_finite() && fps > 0.0, "fps must be positive, got {fps}");
    let (mut scene, _loader, _) = build_scene(config, assets_dir, timeout)?;
    let mut camera = config.camera.build(16.0 / 9.0);
    let mut controls = OrbitControls::from_config(config.camera.target, &config.controls);
    let mut frame_loop = FrameLoop::new(Clock::manual(), config.spin);

    // Frame i lands at exactly i / fps so rounding never accumulates.
    let mut elapsed = Duration::ZERO;
    for i in 1..=frames {
        let next = Duration::from_secs_f64(i as f64 / fps as f64);
        frame_loop.clock_mut().advance(next.saturating_sub(elapsed));
        elapsed = next;
        if frame_loop.tick(&mut scene).is_none() {
            break;
        }
        controls.update(&mut camera);
    }
    tracing::debug!(frames = frame_loop.frame(), "simulation finished");

    Ok(DebugTextRenderer::new().render(&scene, &camera))
}

/// Per-asset outcomes of a full load.
#[derive(Debug)]
pub struct AssetReport {
    pub outcomes: Vec<LoadOutcome>,
    /// Loads (textures or environment) still running when the report was taken.
    pub pending: usize,
    pub textures: TextureSummary,
    pub environment_installed: bool,
}

impl AssetReport {
    pub fn new(loader: &AssetLoader<Scene>, scene: &Scene, outcomes: Vec<LoadOutcome>) -> Self {
        Self {
            outcomes,
            pending: loader.in_flight(),
            textures: SceneInspector::textures(loader.textures()),
            environment_installed: scene.environment().is_some(),
        }
    }

    /// Failed loads plus loads that never finished.
    pub fn failures(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.is_ok()).count() + self.pending
    }
}

impl fmt::Display for AssetReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for outcome in &self.outcomes {
            match &outcome.error {
                None => writeln!(f, "  ok      {}", outcome.path.display())?,
                Some(e) => writeln!(f, "  FAILED  {}: {e}", outcome.path.display())?,
            }
        }
        if self.pending > 0 {
            writeln!(f, "  PENDING {} load(s) still running", self.pending)?;
        }
        writeln!(f, "{}", self.textures)?;
        write!(
            f,
            "Environment: {}",
            if self.environment_installed { "installed" } else { "missing" }
        )
    }
}

pub fn check_assets(
    config: &DemoConfig,
    assets_dir: &Path,
    timeout: Duration,
) -> Result<AssetReport, AssetError> {
    let (scene, loader, outcomes) = build_scene(config, assets_dir, timeout)?;
    Ok(AssetReport::new(&loader, &scene, outcomes))
}

#[cfg(test)]
mod tests {
    use super::*;

    const WAIT: Duration = Duration::from_secs(10);

    fn write_hdr(dir: &Path, rel: &str) {
        let path = dir.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        let mut bytes = b"#?RADIANCE\nFORMAT=32-bit_rle_rgbe\n\n-Y 1 +X 2\n".to_vec();
        bytes.extend_from_slice(&[128, 128, 128, 128, 128, 128, 128, 128]);
        std::fs::write(path, bytes).unwrap();
    }

    #[test]
    fn simulate_ten_seconds_spins_meshes() {
        let dir = tempfile::tempdir().unwrap();
        let text = simulate(&DemoConfig::default(), dir.path(), 600, 60.0, WAIT).unwrap();
        assert!(text.contains("=== Scene (3 meshes) ==="));
        assert!(text.contains("Environment: none background=none"));
        let sphere = text.lines().find(|l| l.trim_start().starts_with("sphere")).unwrap();
        assert!(sphere.contains("rot=(-1.500, 1.000, 0.000)"), "{sphere}");
    }

    #[test]
    fn simulate_below_one_fps_covers_full_duration() {
        let dir = tempfile::tempdir().unwrap();
        // Ten seconds at half a frame per second.
        let text = simulate(&DemoConfig::default(), dir.path(), 5, 0.5, WAIT).unwrap();
        let sphere = text.lines().find(|l| l.trim_start().starts_with("sphere")).unwrap();
        assert!(sphere.contains("rot=(-1.500, 1.000, 0.000)"), "{sphere}");
    }

    #[test]
    fn simulate_rejects_non_positive_fps() {
        let dir = tempfile::tempdir().unwrap();
        assert!(simulate(&DemoConfig::default(), dir.path(), 5, 0.0, WAIT).is_err());
    }

    #[test]
    fn simulate_with_environment_reports_it() {
        let dir = tempfile::tempdir().unwrap();
        write_hdr(dir.path(), "textures/environmentMap/2k.hdr");
        let text = simulate(&DemoConfig::default(), dir.path(), 1, 60.0, WAIT).unwrap();
        assert!(text.contains("Environment: 2x1 (2 mips) background=set"), "{text}");
    }

    #[test]
    fn check_assets_reports_every_failure() {
        let dir = tempfile::tempdir().unwrap();
        let config = DemoConfig::default();
        let report = check_assets(&config, dir.path(), WAIT).unwrap();
        assert_eq!(report.outcomes.len(), config.assets.textures.len() + 1);
        assert_eq!(report.failures(), report.outcomes.len());
        assert_eq!(report.textures.failed, config.assets.textures.len());
        assert!(!report.environment_installed);
        assert!(report.to_string().contains("FAILED"));
    }

    #[test]
    fn check_assets_installs_environment() {
        let dir = tempfile::tempdir().unwrap();
        write_hdr(dir.path(), "textures/environmentMap/2k.hdr");
        let report = check_assets(&DemoConfig::default(), dir.path(), WAIT).unwrap();
        assert!(report.environment_installed);
        assert_eq!(report.failures(), report.outcomes.len() - 1);
    }

    #[test]
    fn unfinished_environment_load_counts_as_failure() {
        let dir = tempfile::tempdir().unwrap();
        write_hdr(dir.path(), "env.hdr");
        let mut loader: AssetLoader<Scene> = AssetLoader::new(dir.path()).unwrap();
        loader.load_environment("env.hdr", |scene: &mut Scene, env| {
            scene.install_environment(env);
        });
        let scene = Scene::demo(materia_scene::Material::demo());
        // Nothing has been polled, so the request is still outstanding.
        let report = AssetReport::new(&loader, &scene, Vec::new());
        assert_eq!(report.pending, 1);
        assert_eq!(report.failures(), 1);
        assert!(!report.environment_installed);
        assert!(report.to_string().contains("PENDING 1"));
    }

    #[test]
    fn zero_timeout_leaves_nothing_uncounted() {
        let dir = tempfile::tempdir().unwrap();
        let config = DemoConfig::default();
        let report = check_assets(&config, dir.path(), Duration::ZERO).unwrap();
        let requested = config.assets.textures.len() + 1;
        assert_eq!(report.outcomes.len() + report.pending, requested);
        assert_eq!(report.failures(), requested);
    }
}
