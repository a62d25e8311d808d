use std::path::Path;

use crate::AssetError;

/// One level of the environment mip chain, linear RGBA f32.
#[derive(Debug, Clone, PartialEq)]
pub struct MipLevel {
    pub width: u32,
    pub height: u32,
    pub texels: Vec<[f32; 4]>,
}

impl MipLevel {
    fn texel(&self, x: u32, y: u32) -> [f32; 4] {
        let x = x.min(self.width - 1);
        let y = y.min(self.height - 1);
        self.texels[(y * self.width + x) as usize]
    }

    /// Box-filter down to half resolution (never below 1x1).
    fn downsample(&self) -> MipLevel {
        let width = (self.width / 2).max(1);
        let height = (self.height / 2).max(1);
        let mut texels = Vec::with_capacity((width * height) as usize);
        for y in 0..height {
            for x in 0..width {
                let (sx, sy) = (x * 2, y * 2);
                let taps = [
                    self.texel(sx, sy),
                    self.texel(sx + 1, sy),
                    self.texel(sx, sy + 1),
                    self.texel(sx + 1, sy + 1),
                ];
                let mut sum = [0.0f32; 4];
                for tap in &taps {
                    for (s, c) in sum.iter_mut().zip(tap) {
                        *s += c;
                    }
                }
                texels.push(sum.map(|s| s * 0.25));
            }
        }
        MipLevel {
            width,
            height,
            texels,
        }
    }
}

/// Equirectangular HDR environment with a full mip chain.
///
/// Level 0 is the decoded image; each further level halves both axes. The
/// renderer picks coarser levels for rougher surfaces.
#[derive(Debug, Clone, PartialEq)]
pub struct EnvironmentMap {
    levels: Vec<MipLevel>,
}

impl EnvironmentMap {
    /// Build from packed RGB f32 texels (row-major, top row first).
    pub fn from_rgb32f(width: u32, height: u32, rgb: &[f32]) -> Self {
        debug_assert_eq!(rgb.len(), (width * height * 3) as usize);
        let base = MipLevel {
            width: width.max(1),
            height: height.max(1),
            texels: rgb.chunks_exact(3).map(|c| [c[0], c[1], c[2], 1.0]).collect(),
        };
        let count = mip_count(base.width, base.height);
        let mut levels = Vec::with_capacity(count as usize);
        levels.push(base);
        while levels.len() < count as usize {
            let next = levels[levels.len() - 1].downsample();
            levels.push(next);
        }
        Self { levels }
    }

    /// Decode a Radiance `.hdr` file.
    pub fn decode(path: &Path) -> Result<Self, AssetError> {
        let img = image::open(path).map_err(|source| AssetError::Decode {
            path: path.to_path_buf(),
            source,
        })?;
        let rgb = img.into_rgb32f();
        let (width, height) = rgb.dimensions();
        if width == 0 || height == 0 {
            return Err(AssetError::Empty {
                path: path.to_path_buf(),
            });
        }
        tracing::debug!(width, height, "decoded environment map");
        Ok(Self::from_rgb32f(width, height, rgb.as_raw()))
    }

    pub fn width(&self) -> u32 {
        self.levels[0].width
    }

    pub fn height(&self) -> u32 {
        self.levels[0].height
    }

    pub fn levels(&self) -> &[MipLevel] {
        &self.levels
    }

    pub fn mip_count(&self) -> u32 {
        self.levels.len() as u32
    }
}

/// Number of levels down to 1x1 along the longest axis.
fn mip_count(width: u32, height: u32) -> u32 {
    32 - width.max(height).max(1).leading_zeros()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn mip_count_matches_longest_axis() {
        assert_eq!(mip_count(1, 1), 1);
        assert_eq!(mip_count(2048, 1024), 12);
        assert_eq!(mip_count(5, 3), 3);
    }

    #[test]
    fn chain_ends_at_one_texel() {
        let rgb = vec![1.0f32; 8 * 4 * 3];
        let env = EnvironmentMap::from_rgb32f(8, 4, &rgb);
        assert_eq!(env.mip_count(), 4);
        let last = env.levels().last().unwrap();
        assert_eq!((last.width, last.height), (1, 1));
        assert_eq!(env.levels()[1].width, 4);
        assert_eq!(env.levels()[1].height, 2);
    }

    #[test]
    fn downsample_averages() {
        // 2x2: one bright texel, three dark.
        let rgb = vec![4.0, 4.0, 4.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0];
        let env = EnvironmentMap::from_rgb32f(2, 2, &rgb);
        let top = &env.levels()[1];
        assert_eq!(top.texels, vec![[1.0, 1.0, 1.0, 1.0]]);
    }

    #[test]
    fn decode_flat_radiance_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("env.hdr");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(b"#?RADIANCE\nFORMAT=32-bit_rle_rgbe\n\n-Y 2 +X 4\n")
            .unwrap();
        // Scanlines shorter than 8 texels are stored flat; exponent 129 => 2^1.
        for _ in 0..8 {
            f.write_all(&[128, 64, 32, 129]).unwrap();
        }
        drop(f);

        let env = EnvironmentMap::decode(&path).unwrap();
        assert_eq!((env.width(), env.height()), (4, 2));
        let t = env.levels()[0].texels[0];
        assert!(t[0] > t[1] && t[1] > t[2]);
        assert_eq!(t[3], 1.0);
    }

    #[test]
    fn decode_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = EnvironmentMap::decode(&dir.path().join("2k.hdr"));
        assert!(matches!(result, Err(AssetError::Decode { .. })));
    }
}
