use std::path::{Path, PathBuf};

use materia_common::ColorSpace;
use serde::{Deserialize, Serialize};

/// One texture the viewer requests at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextureEntry {
    /// Name the material configuration refers to.
    pub key: String,
    /// Path relative to the assets root.
    pub path: PathBuf,
    #[serde(default)]
    pub color_space: ColorSpace,
}

impl TextureEntry {
    pub fn new(key: &str, path: &str, color_space: ColorSpace) -> Self {
        Self {
            key: key.into(),
            path: PathBuf::from(path),
            color_space,
        }
    }
}

/// Every file the viewer loads, relative to the assets root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetManifest {
    pub textures: Vec<TextureEntry>,
    pub environment: PathBuf,
}

impl Default for AssetManifest {
    fn default() -> Self {
        use ColorSpace::{Linear, Srgb};
        Self {
            textures: vec![
                TextureEntry::new("door_color", "textures/door/color.jpg", Srgb),
                TextureEntry::new("door_alpha", "textures/door/alpha.jpg", Linear),
                TextureEntry::new(
                    "door_ambient_occlusion",
                    "textures/door/ambientOcclusion.jpg",
                    Linear,
                ),
                TextureEntry::new("door_height", "textures/door/height.jpg", Linear),
                TextureEntry::new("door_normal", "textures/door/normal.jpg", Linear),
                TextureEntry::new("door_metalness", "textures/door/metalness.jpg", Linear),
                TextureEntry::new("door_roughness", "textures/door/roughness.jpg", Linear),
                TextureEntry::new("matcap", "textures/matcaps/1.png", Srgb),
                TextureEntry::new("gradient", "textures/gradients/3.jpg", Linear),
            ],
            environment: PathBuf::from("textures/environmentMap/2k.hdr"),
        }
    }
}

impl AssetManifest {
    pub fn texture(&self, key: &str) -> Option<&TextureEntry> {
        self.textures.iter().find(|t| t.key == key)
    }

    /// Absolute environment map path under `root`.
    pub fn environment_path(&self, root: &Path) -> PathBuf {
        root.join(&self.environment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_manifest_lists_door_set() {
        let m = AssetManifest::default();
        assert_eq!(m.textures.len(), 9);
        assert_eq!(m.texture("door_color").unwrap().color_space, ColorSpace::Srgb);
        assert_eq!(m.texture("matcap").unwrap().color_space, ColorSpace::Srgb);
        assert_eq!(m.texture("door_normal").unwrap().color_space, ColorSpace::Linear);
        assert!(m.texture("missing").is_none());
    }

    #[test]
    fn keys_are_unique() {
        let m = AssetManifest::default();
        let mut keys: Vec<&str> = m.textures.iter().map(|t| t.key.as_str()).collect();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), m.textures.len());
    }

    #[test]
    fn environment_path_is_rooted() {
        let m = AssetManifest::default();
        let p = m.environment_path(Path::new("static"));
        assert_eq!(p, Path::new("static/textures/environmentMap/2k.hdr"));
    }
}
