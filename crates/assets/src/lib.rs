//! Asset pipeline: manifest, texture library, non-blocking loads.
//!
//! Textures and the HDR environment map are decoded on a background tokio
//! runtime. Results travel back over a channel and are applied on the thread
//! that calls [`AssetLoader::poll`], so the scene never sees a half-loaded
//! asset.
//!
//! # Invariants
//! - A texture handle is valid from the moment the load is requested.
//! - A failed load never panics the caller; it is logged and left unset.

mod environment;
mod loader;
mod manifest;
mod texture;

use std::path::PathBuf;

pub use environment::{EnvironmentMap, MipLevel};
pub use loader::{AssetLoader, EnvironmentCallback, LoadOutcome, RequestId};
pub use manifest::{AssetManifest, TextureEntry};
pub use texture::{TextureData, TextureHandle, TextureLibrary, TextureState};

/// Errors from asset operations.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("image {path} is empty")]
    Empty { path: PathBuf },
    #[error("decode task for {path} failed: {reason}")]
    Task { path: PathBuf, reason: String },
    #[error("failed to start asset runtime: {0}")]
    Runtime(#[source] std::io::Error),
}

pub fn crate_info() -> &'static str {
    "materia-assets v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("assets"));
    }
}
