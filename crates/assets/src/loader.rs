use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::{Duration, Instant};

use materia_common::ColorSpace;

use crate::environment::EnvironmentMap;
use crate::manifest::AssetManifest;
use crate::texture::{TextureData, TextureHandle, TextureLibrary};
use crate::AssetError;

/// Opaque identifier for an in-flight environment map request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(u64);

/// Runs on the polling thread once the environment map has decoded.
/// Never invoked if the load fails.
pub type EnvironmentCallback<C> = Box<dyn FnOnce(&mut C, Arc<EnvironmentMap>)>;

/// Result of one finished load, reported by [`AssetLoader::poll`].
#[derive(Debug, Clone, PartialEq)]
pub struct LoadOutcome {
    pub path: PathBuf,
    /// `None` on success, otherwise the error message.
    pub error: Option<String>,
}

impl LoadOutcome {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

enum Completed {
    Texture {
        handle: TextureHandle,
        path: PathBuf,
        result: Result<TextureData, AssetError>,
    },
    Environment {
        id: RequestId,
        path: PathBuf,
        result: Result<EnvironmentMap, AssetError>,
    },
}

/// Non-blocking asset loader.
///
/// Decodes run as blocking tasks on a small tokio runtime owned by the
/// loader and deliver their results via a channel. `poll` drains the
/// channel on the caller's thread: textures land in the [`TextureLibrary`],
/// environment maps are handed to the callback registered with the request.
/// `C` is the context those callbacks mutate (the scene, in the viewer).
pub struct AssetLoader<C> {
    root: PathBuf,
    runtime: tokio::runtime::Runtime,
    textures: TextureLibrary,
    callbacks: BTreeMap<RequestId, EnvironmentCallback<C>>,
    result_tx: Sender<Completed>,
    result_rx: Receiver<Completed>,
    next_id: u64,
    in_flight: usize,
}

impl<C> AssetLoader<C> {
    /// Create a loader resolving relative paths against `root`.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, AssetError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("asset-loader")
            .build()
            .map_err(AssetError::Runtime)?;
        let (tx, rx) = mpsc::channel();
        Ok(Self {
            root: root.into(),
            runtime,
            textures: TextureLibrary::new(),
            callbacks: BTreeMap::new(),
            result_tx: tx,
            result_rx: rx,
            next_id: 0,
            in_flight: 0,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn textures(&self) -> &TextureLibrary {
        &self.textures
    }

    /// Number of requests whose result has not been polled yet.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Request every texture listed in the manifest.
    pub fn load_manifest_textures(&mut self, manifest: &AssetManifest) -> Vec<TextureHandle> {
        manifest
            .textures
            .iter()
            .map(|entry| self.load_texture(&entry.key, &entry.path, entry.color_space))
            .collect()
    }

    /// Request a texture. The handle is usable immediately; its data appears
    /// in the library once a later `poll` picks up the decode.
    pub fn load_texture(
        &mut self,
        key: &str,
        path: impl AsRef<Path>,
        color_space: ColorSpace,
    ) -> TextureHandle {
        let full = self.root.join(path.as_ref());
        let handle = self
            .textures
            .insert_pending(key, full.clone(), color_space);
        tracing::debug!(key, path = %full.display(), "loading texture");

        let job_path = full.clone();
        self.dispatch(
            full,
            move || TextureData::decode(&job_path, color_space),
            move |path, result| Completed::Texture {
                handle,
                path,
                result,
            },
        );
        handle
    }

    /// Request an environment map; `on_loaded` runs during a later `poll`
    /// if and only if the decode succeeds.
    pub fn load_environment(
        &mut self,
        path: impl AsRef<Path>,
        on_loaded: impl FnOnce(&mut C, Arc<EnvironmentMap>) + 'static,
    ) -> RequestId {
        let id = RequestId(self.next_id);
        self.next_id += 1;
        let full = self.root.join(path.as_ref());
        tracing::debug!(path = %full.display(), "loading environment map");
        self.callbacks.insert(id, Box::new(on_loaded));

        let job_path = full.clone();
        self.dispatch(
            full,
            move || EnvironmentMap::decode(&job_path),
            move |path, result| Completed::Environment { id, path, result },
        );
        id
    }

    /// Run `job` on the blocking pool and send whatever it produced, or the
    /// reason it died, back to the polling thread.
    fn dispatch<T: Send + 'static>(
        &mut self,
        path: PathBuf,
        job: impl FnOnce() -> Result<T, AssetError> + Send + 'static,
        finish: impl FnOnce(PathBuf, Result<T, AssetError>) -> Completed + Send + 'static,
    ) {
        let tx = self.result_tx.clone();
        let task = self.runtime.spawn_blocking(job);
        self.runtime.spawn(async move {
            let result = match task.await {
                Ok(result) => result,
                Err(e) => Err(AssetError::Task {
                    path: path.clone(),
                    reason: e.to_string(),
                }),
            };
            let _ = tx.send(finish(path, result));
        });
        self.in_flight += 1;
    }

    /// Apply every finished load without blocking.
    pub fn poll(&mut self, ctx: &mut C) -> Vec<LoadOutcome> {
        let mut outcomes = Vec::new();
        while let Ok(done) = self.result_rx.try_recv() {
            outcomes.push(self.apply(ctx, done));
        }
        outcomes
    }

    /// Block until every in-flight request has finished or `timeout` passes.
    pub fn flush(&mut self, ctx: &mut C, timeout: Duration) -> Vec<LoadOutcome> {
        let deadline = Instant::now() + timeout;
        let mut outcomes = Vec::new();
        while self.in_flight > 0 {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.result_rx.recv_timeout(remaining) {
                Ok(done) => outcomes.push(self.apply(ctx, done)),
                Err(RecvTimeoutError::Timeout) => {
                    tracing::warn!(in_flight = self.in_flight, "asset flush timed out");
                    break;
                }
                // The loader holds a sender, so this cannot happen while it lives.
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        outcomes
    }

    fn apply(&mut self, ctx: &mut C, done: Completed) -> LoadOutcome {
        self.in_flight = self.in_flight.saturating_sub(1);
        match done {
            Completed::Texture {
                handle,
                path,
                result,
            } => match result {
                Ok(data) => {
                    tracing::debug!(
                        path = %path.display(),
                        width = data.width,
                        height = data.height,
                        "texture ready"
                    );
                    self.textures.complete(handle, Some(data));
                    LoadOutcome { path, error: None }
                }
                Err(e) => {
                    tracing::warn!("texture load failed: {e}");
                    self.textures.complete(handle, None);
                    LoadOutcome {
                        path,
                        error: Some(e.to_string()),
                    }
                }
            },
            Completed::Environment { id, path, result } => {
                let callback = self.callbacks.remove(&id);
                match result {
                    Ok(env) => {
                        tracing::info!(
                            path = %path.display(),
                            width = env.width(),
                            height = env.height(),
                            "environment map ready"
                        );
                        if let Some(callback) = callback {
                            callback(ctx, Arc::new(env));
                        }
                        LoadOutcome { path, error: None }
                    }
                    Err(e) => {
                        tracing::warn!("environment map load failed: {e}");
                        LoadOutcome {
                            path,
                            error: Some(e.to_string()),
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::texture::TextureState;

    const WAIT: Duration = Duration::from_secs(10);

    #[derive(Default)]
    struct Ctx {
        env: Option<Arc<EnvironmentMap>>,
        calls: usize,
    }

    fn write_png(dir: &Path, rel: &str) {
        let path = dir.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        image::RgbaImage::from_pixel(4, 4, image::Rgba([200, 100, 50, 255]))
            .save(path)
            .unwrap();
    }

    fn write_hdr(dir: &Path, rel: &str) {
        let path = dir.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        let mut bytes = b"#?RADIANCE\nFORMAT=32-bit_rle_rgbe\n\n-Y 1 +X 2\n".to_vec();
        bytes.extend_from_slice(&[128, 128, 128, 128, 128, 128, 128, 128]);
        std::fs::write(path, bytes).unwrap();
    }

    #[test]
    fn texture_handle_exists_before_decode_finishes() {
        let dir = tempfile::tempdir().unwrap();
        write_png(dir.path(), "a.png");
        let mut loader: AssetLoader<Ctx> = AssetLoader::new(dir.path()).unwrap();
        let h = loader.load_texture("a", "a.png", ColorSpace::Srgb);
        assert!(loader.textures().state(h).is_some());
        assert_eq!(loader.in_flight(), 1);

        let mut ctx = Ctx::default();
        let outcomes = loader.flush(&mut ctx, WAIT);
        assert_eq!(outcomes.len(), 1);
        assert!(outcomes[0].is_ok());
        assert_eq!(loader.in_flight(), 0);
        let data = loader.textures().get(h).unwrap();
        assert_eq!((data.width, data.height), (4, 4));
        assert_eq!(data.color_space, ColorSpace::Srgb);
    }

    #[test]
    fn missing_texture_is_reported_and_left_unset() {
        let dir = tempfile::tempdir().unwrap();
        let mut loader: AssetLoader<Ctx> = AssetLoader::new(dir.path()).unwrap();
        let h = loader.load_texture("gone", "textures/door/color.jpg", ColorSpace::Srgb);
        let outcomes = loader.flush(&mut Ctx::default(), WAIT);
        assert_eq!(outcomes.len(), 1);
        assert!(!outcomes[0].is_ok());
        assert!(loader.textures().get(h).is_none());
        assert!(matches!(loader.textures().state(h), Some(TextureState::Failed)));
    }

    #[test]
    fn environment_callback_runs_on_success() {
        let dir = tempfile::tempdir().unwrap();
        write_hdr(dir.path(), "env/2k.hdr");
        let mut loader: AssetLoader<Ctx> = AssetLoader::new(dir.path()).unwrap();
        loader.load_environment("env/2k.hdr", |ctx: &mut Ctx, env| {
            ctx.env = Some(env);
            ctx.calls += 1;
        });

        let mut ctx = Ctx::default();
        let outcomes = loader.flush(&mut ctx, WAIT);
        assert!(outcomes.iter().all(LoadOutcome::is_ok));
        assert_eq!(ctx.calls, 1);
        assert_eq!(ctx.env.as_ref().unwrap().width(), 2);
    }

    #[test]
    fn environment_callback_never_fires_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let mut loader: AssetLoader<Ctx> = AssetLoader::new(dir.path()).unwrap();
        loader.load_environment("textures/environmentMap/2k.hdr", |ctx: &mut Ctx, env| {
            ctx.env = Some(env);
            ctx.calls += 1;
        });

        let mut ctx = Ctx::default();
        let outcomes = loader.flush(&mut ctx, WAIT);
        assert_eq!(outcomes.len(), 1);
        assert!(outcomes[0].error.is_some());
        assert_eq!(ctx.calls, 0);
        assert!(ctx.env.is_none());
        assert_eq!(loader.in_flight(), 0);
    }

    #[test]
    fn manifest_textures_resolve_against_root() {
        let dir = tempfile::tempdir().unwrap();
        write_png(dir.path(), "textures/matcaps/1.png");
        let manifest = AssetManifest::default();
        let mut loader: AssetLoader<Ctx> = AssetLoader::new(dir.path()).unwrap();
        let handles = loader.load_manifest_textures(&manifest);
        assert_eq!(handles.len(), manifest.textures.len());

        let outcomes = loader.flush(&mut Ctx::default(), WAIT);
        assert_eq!(outcomes.len(), manifest.textures.len());
        assert_eq!(outcomes.iter().filter(|o| o.is_ok()).count(), 1);
        let matcap = loader.textures().find("matcap").unwrap();
        assert!(loader.textures().get(matcap).is_some());
        assert_eq!(
            loader.textures().path(matcap).unwrap(),
            dir.path().join("textures/matcaps/1.png")
        );
    }

    #[test]
    fn panicking_decode_is_reported_as_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.png");
        let mut loader: AssetLoader<Ctx> = AssetLoader::new(dir.path()).unwrap();
        let handle = loader
            .textures
            .insert_pending("broken", path.clone(), ColorSpace::Srgb);
        loader.dispatch(
            path,
            || -> Result<TextureData, AssetError> { panic!("decoder crashed") },
            move |path, result| Completed::Texture {
                handle,
                path,
                result,
            },
        );

        let outcomes = loader.flush(&mut Ctx::default(), WAIT);
        assert_eq!(outcomes.len(), 1);
        assert!(outcomes[0].error.as_deref().unwrap().contains("broken.png"));
        assert_eq!(loader.in_flight(), 0);
        assert!(matches!(loader.textures().state(handle), Some(TextureState::Failed)));
    }

    #[test]
    fn poll_without_completions_is_empty() {
        let mut loader: AssetLoader<Ctx> = AssetLoader::new("static").unwrap();
        assert!(loader.poll(&mut Ctx::default()).is_empty());
    }
}
