use std::path::{Path, PathBuf};

use glam::Vec3;
use materia_assets::{AssetManifest, TextureHandle, TextureLibrary};
use serde::{Deserialize, Serialize};

use crate::camera::PerspectiveCamera;
use crate::frame_loop::Spin;
use crate::material::{Material, MaterialMaps, MaterialProperty};

/// Errors from loading or validating a [`DemoConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Texture keys (from the asset manifest) bound to material map slots.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapBindings {
    pub map: Option<String>,
    pub ao_map: Option<String>,
    pub displacement_map: Option<String>,
    pub metalness_map: Option<String>,
    pub roughness_map: Option<String>,
    pub normal_map: Option<String>,
    pub alpha_map: Option<String>,
}

impl MapBindings {
    /// Resolve keys to library handles. Unknown keys are logged and skipped.
    pub fn resolve(&self, library: &TextureLibrary) -> MaterialMaps {
        let lookup = |key: &Option<String>| -> Option<TextureHandle> {
            let key = key.as_deref()?;
            let handle = library.find(key);
            if handle.is_none() {
                tracing::warn!(key, "material map refers to unknown texture");
            }
            handle
        };
        MaterialMaps {
            map: lookup(&self.map),
            ao_map: lookup(&self.ao_map),
            displacement_map: lookup(&self.displacement_map),
            metalness_map: lookup(&self.metalness_map),
            roughness_map: lookup(&self.roughness_map),
            normal_map: lookup(&self.normal_map),
            alpha_map: lookup(&self.alpha_map),
        }
    }
}

/// One panel slider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SliderConfig {
    pub property: MaterialProperty,
    pub min: f32,
    pub max: f32,
    pub step: f32,
}

impl SliderConfig {
    pub fn unit(property: MaterialProperty) -> Self {
        Self {
            property,
            min: 0.0,
            max: 1.0,
            step: 0.001,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vec3,
    pub target: Vec3,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov: 75.0,
            near: 0.1,
            far: 100.0,
            position: Vec3::new(1.0, 1.0, 2.0),
            target: Vec3::ZERO,
        }
    }
}

impl CameraConfig {
    pub fn build(&self, aspect: f32) -> PerspectiveCamera {
        let mut camera = PerspectiveCamera::new(self.fov, aspect, self.near, self.far);
        camera.position = self.position;
        camera.look_at(self.target);
        camera
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlsConfig {
    pub enable_damping: bool,
    pub damping_factor: f32,
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            enable_damping: true,
            damping_factor: 0.05,
        }
    }
}

/// Everything the viewer can be told from a YAML file. Every field has a
/// default, so an empty file (or no file) reproduces the stock scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    pub assets: AssetManifest,
    pub material: Material,
    pub maps: MapBindings,
    pub panel: Vec<SliderConfig>,
    pub camera: CameraConfig,
    pub controls: ControlsConfig,
    pub spin: Spin,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            assets: AssetManifest::default(),
            material: Material::demo(),
            maps: MapBindings::default(),
            panel: vec![
                SliderConfig::unit(MaterialProperty::Metalness),
                SliderConfig::unit(MaterialProperty::Roughness),
            ],
            camera: CameraConfig::default(),
            controls: ControlsConfig::default(),
            spin: Spin::default(),
        }
    }
}

impl DemoConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml_str(&text)?;
        tracing::info!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        // An empty document deserialises as unit, not as an empty map.
        let config: Self = if text.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(text)?
        };
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for s in &self.panel {
            if s.min.is_nan() || s.max.is_nan() || s.min >= s.max {
                return Err(ConfigError::Invalid(format!(
                    "slider {} has min {} >= max {}",
                    s.property.label(),
                    s.min,
                    s.max
                )));
            }
            if s.step.is_nan() || s.step <= 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "slider {} has non-positive step {}",
                    s.property.label(),
                    s.step
                )));
            }
        }
        let c = &self.camera;
        if c.fov.is_nan() || c.fov <= 0.0 || c.fov >= 180.0 {
            return Err(ConfigError::Invalid(format!("camera fov {} out of (0, 180)", c.fov)));
        }
        if c.near.is_nan() || c.far.is_nan() || c.near <= 0.0 || c.near >= c.far {
            return Err(ConfigError::Invalid(format!(
                "camera near {} must be positive and below far {}",
                c.near, c.far
            )));
        }
        let d = self.controls.damping_factor;
        if d.is_nan() || d <= 0.0 || d > 1.0 {
            return Err(ConfigError::Invalid(format!(
                "damping factor {d} out of (0, 1]"
            )));
        }
        Ok(())
    }
}
