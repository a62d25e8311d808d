use std::collections::HashMap;
use std::sync::Arc;

use half::f16;
use materia_assets::{EnvironmentMap, MipLevel, TextureData, TextureHandle, TextureLibrary};
use materia_common::ColorSpace;

/// A texture and the view the bind groups use.
pub(crate) struct GpuTexture {
    _texture: wgpu::Texture,
    pub view: wgpu::TextureView,
}

pub(crate) fn texture_format(color_space: ColorSpace) -> wgpu::TextureFormat {
    match color_space {
        ColorSpace::Srgb => wgpu::TextureFormat::Rgba8UnormSrgb,
        ColorSpace::Linear => wgpu::TextureFormat::Rgba8Unorm,
    }
}

fn upload_rgba8(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    label: &str,
    width: u32,
    height: u32,
    format: wgpu::TextureFormat,
    pixels: &[u8],
) -> GpuTexture {
    let size = wgpu::Extent3d {
        width,
        height,
        depth_or_array_layers: 1,
    };
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        pixels,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(width * 4),
            rows_per_image: Some(height),
        },
        size,
    );
    let view = texture.create_view(&Default::default());
    GpuTexture {
        _texture: texture,
        view,
    }
}

fn upload_texture_data(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    label: &str,
    data: &TextureData,
) -> GpuTexture {
    upload_rgba8(
        device,
        queue,
        label,
        data.width,
        data.height,
        texture_format(data.color_space),
        &data.pixels,
    )
}

/// GPU copies of the library's decoded textures, plus a white fallback
/// bound wherever a slot is empty, pending or failed.
pub(crate) struct TextureCache {
    uploaded: HashMap<TextureHandle, GpuTexture>,
    revision: Option<u64>,
    fallback: GpuTexture,
}

impl TextureCache {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        let fallback = upload_rgba8(
            device,
            queue,
            "fallback_texture",
            1,
            1,
            wgpu::TextureFormat::Rgba8Unorm,
            &[255, 255, 255, 255],
        );
        Self {
            uploaded: HashMap::new(),
            revision: None,
            fallback,
        }
    }

    /// Upload any textures that finished decoding since the last call.
    /// Returns whether anything new was uploaded.
    pub fn sync(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, library: &TextureLibrary) -> bool {
        if self.revision == Some(library.revision()) {
            return false;
        }
        self.revision = Some(library.revision());
        let mut changed = false;
        for handle in (0..library.len() as u32).map(TextureHandle) {
            if self.uploaded.contains_key(&handle) {
                continue;
            }
            if let Some(data) = library.get(handle) {
                let label = library.key(handle).unwrap_or("texture");
                self.uploaded
                    .insert(handle, upload_texture_data(device, queue, label, data));
                tracing::debug!(key = label, width = data.width, height = data.height, "texture uploaded");
                changed = true;
            }
        }
        changed
    }

    pub fn is_uploaded(&self, handle: Option<TextureHandle>) -> bool {
        handle.is_some_and(|h| self.uploaded.contains_key(&h))
    }

    pub fn view(&self, handle: Option<TextureHandle>) -> &wgpu::TextureView {
        handle
            .and_then(|h| self.uploaded.get(&h))
            .map_or(&self.fallback.view, |t| &t.view)
    }
}

/// Convert one mip level to half floats, saturating at the f16 range.
pub(crate) fn level_to_f16(level: &MipLevel) -> Vec<[f16; 4]> {
    level
        .texels
        .iter()
        .map(|t| t.map(|c| f16::from_f32(c.clamp(-f16::MAX.to_f32(), f16::MAX.to_f32()))))
        .collect()
}

/// An environment map resident on the GPU as `Rgba16Float` with its full
/// mip chain.
pub(crate) struct GpuEnvironment {
    source: Option<Arc<EnvironmentMap>>,
    mip_count: u32,
    _texture: wgpu::Texture,
    pub view: wgpu::TextureView,
}

impl GpuEnvironment {
    pub fn upload(device: &wgpu::Device, queue: &wgpu::Queue, env: &Arc<EnvironmentMap>) -> Self {
        let mut gpu = Self::from_levels(device, queue, "environment_map", env.levels());
        gpu.source = Some(env.clone());
        tracing::debug!(
            width = env.width(),
            height = env.height(),
            mips = env.mip_count(),
            "environment uploaded"
        );
        gpu
    }

    /// 1x1 black stand-in bound while no environment is set.
    pub fn empty(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        let level = MipLevel {
            width: 1,
            height: 1,
            texels: vec![[0.0, 0.0, 0.0, 1.0]],
        };
        Self::from_levels(device, queue, "empty_environment", std::slice::from_ref(&level))
    }

    fn from_levels(device: &wgpu::Device, queue: &wgpu::Queue, label: &str, levels: &[MipLevel]) -> Self {
        let base = &levels[0];
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: base.width,
                height: base.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: levels.len() as u32,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba16Float,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        for (mip, level) in levels.iter().enumerate() {
            let texels = level_to_f16(level);
            queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    texture: &texture,
                    mip_level: mip as u32,
                    origin: wgpu::Origin3d::ZERO,
                    aspect: wgpu::TextureAspect::All,
                },
                bytemuck::cast_slice(&texels),
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(level.width * 8),
                    rows_per_image: Some(level.height),
                },
                wgpu::Extent3d {
                    width: level.width,
                    height: level.height,
                    depth_or_array_layers: 1,
                },
            );
        }
        let view = texture.create_view(&Default::default());
        Self {
            source: None,
            mip_count: levels.len() as u32,
            _texture: texture,
            view,
        }
    }

    pub fn mip_count(&self) -> u32 {
        self.mip_count
    }

    pub fn is_for(&self, env: Option<&Arc<EnvironmentMap>>) -> bool {
        match (&self.source, env) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_follow_color_space() {
        assert_eq!(texture_format(ColorSpace::Srgb), wgpu::TextureFormat::Rgba8UnormSrgb);
        assert_eq!(texture_format(ColorSpace::Linear), wgpu::TextureFormat::Rgba8Unorm);
    }

    #[test]
    fn half_conversion_saturates() {
        let level = MipLevel {
            width: 2,
            height: 1,
            texels: vec![[0.5, 1.0, 2.0, 1.0], [1.0e6, 0.0, -1.0e6, 1.0]],
        };
        let out = level_to_f16(&level);
        assert_eq!(out[0][0].to_f32(), 0.5);
        assert_eq!(out[0][2].to_f32(), 2.0);
        assert_eq!(out[1][0], f16::MAX);
        assert_eq!(out[1][2], -f16::MAX);
        assert!(out.iter().flatten().all(|h| h.is_finite()));
    }

    #[test]
    fn half_texels_pack_to_eight_bytes() {
        let level = MipLevel {
            width: 3,
            height: 1,
            texels: vec![[1.0; 4]; 3],
        };
        let texels = level_to_f16(&level);
        let bytes: &[u8] = bytemuck::cast_slice(&texels);
        assert_eq!(bytes.len(), 3 * 8);
    }
}
