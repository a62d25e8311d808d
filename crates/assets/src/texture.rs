use std::path::{Path, PathBuf};
use std::sync::Arc;

use materia_common::ColorSpace;

use crate::AssetError;

/// Decoded RGBA8 image.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureData {
    pub width: u32,
    pub height: u32,
    pub color_space: ColorSpace,
    pub pixels: Vec<u8>,
}

impl TextureData {
    /// Decode an image file into tightly packed RGBA8.
    pub fn decode(path: &Path, color_space: ColorSpace) -> Result<Self, AssetError> {
        let img = image::open(path).map_err(|source| AssetError::Decode {
            path: path.to_path_buf(),
            source,
        })?;
        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();
        if width == 0 || height == 0 {
            return Err(AssetError::Empty {
                path: path.to_path_buf(),
            });
        }
        Ok(Self {
            width,
            height,
            color_space,
            pixels: rgba.into_raw(),
        })
    }

    pub fn bytes_per_row(&self) -> u32 {
        self.width * 4
    }
}

/// Handle to a texture slot in the [`TextureLibrary`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureHandle(pub u32);

/// Load state of a texture slot.
#[derive(Debug, Clone)]
pub enum TextureState {
    Pending,
    Ready(Arc<TextureData>),
    Failed,
}

#[derive(Debug)]
struct TextureSlot {
    key: String,
    path: PathBuf,
    color_space: ColorSpace,
    state: TextureState,
}

/// Owns every texture requested by the viewer for the program lifetime.
///
/// `revision` increases each time a slot changes state; consumers that cache
/// GPU copies compare it to decide whether to refresh.
#[derive(Debug, Default)]
pub struct TextureLibrary {
    slots: Vec<TextureSlot>,
    revision: u64,
}

impl TextureLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert_pending(
        &mut self,
        key: &str,
        path: PathBuf,
        color_space: ColorSpace,
    ) -> TextureHandle {
        let handle = TextureHandle(self.slots.len() as u32);
        self.slots.push(TextureSlot {
            key: key.to_string(),
            path,
            color_space,
            state: TextureState::Pending,
        });
        handle
    }

    pub(crate) fn complete(&mut self, handle: TextureHandle, data: Option<TextureData>) {
        if let Some(slot) = self.slots.get_mut(handle.0 as usize) {
            slot.state = match data {
                Some(data) => TextureState::Ready(Arc::new(data)),
                None => TextureState::Failed,
            };
            self.revision += 1;
        }
    }

    /// Decoded texture data, if the load has finished successfully.
    pub fn get(&self, handle: TextureHandle) -> Option<&Arc<TextureData>> {
        match &self.slots.get(handle.0 as usize)?.state {
            TextureState::Ready(data) => Some(data),
            _ => None,
        }
    }

    pub fn state(&self, handle: TextureHandle) -> Option<&TextureState> {
        self.slots.get(handle.0 as usize).map(|s| &s.state)
    }

    /// Look up a handle by manifest key.
    pub fn find(&self, key: &str) -> Option<TextureHandle> {
        self.slots
            .iter()
            .position(|s| s.key == key)
            .map(|i| TextureHandle(i as u32))
    }

    pub fn key(&self, handle: TextureHandle) -> Option<&str> {
        self.slots.get(handle.0 as usize).map(|s| s.key.as_str())
    }

    pub fn path(&self, handle: TextureHandle) -> Option<&Path> {
        self.slots.get(handle.0 as usize).map(|s| s.path.as_path())
    }

    pub fn color_space(&self, handle: TextureHandle) -> Option<ColorSpace> {
        self.slots.get(handle.0 as usize).map(|s| s.color_space)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Number of slots whose decode has not finished yet.
    pub fn pending_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|s| matches!(s.state, TextureState::Pending))
            .count()
    }
}
