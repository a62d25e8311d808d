use std::f32::consts::{PI, TAU};

use glam::Vec3;

/// Immutable triangle mesh data: per-vertex position, normal and uv plus a
/// counter-clockwise u32 index list.
///
/// UVs put (0, 0) at the bottom-left of the image; the renderer flips v
/// when sampling.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Geometry {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
}

impl Geometry {
    fn with_capacity(vertices: usize, indices: usize) -> Self {
        Self {
            positions: Vec::with_capacity(vertices),
            normals: Vec::with_capacity(vertices),
            uvs: Vec::with_capacity(vertices),
            indices: Vec::with_capacity(indices),
        }
    }

    fn push_vertex(&mut self, position: Vec3, normal: Vec3, uv: [f32; 2]) {
        self.positions.push(position.to_array());
        self.normals.push(normal.to_array());
        self.uvs.push(uv);
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// UV sphere centred at the origin, poles on the Y axis.
    pub fn sphere(radius: f32, width_segments: u32, height_segments: u32) -> Self {
        let ws = width_segments.max(3);
        let hs = height_segments.max(2);
        let mut g = Self::with_capacity(
            ((ws + 1) * (hs + 1)) as usize,
            (ws * (hs - 1) * 6) as usize,
        );

        for iy in 0..=hs {
            let v = iy as f32 / hs as f32;
            let theta = v * PI;
            for ix in 0..=ws {
                let u = ix as f32 / ws as f32;
                let phi = u * TAU;
                let p = Vec3::new(
                    -radius * phi.cos() * theta.sin(),
                    radius * theta.cos(),
                    radius * phi.sin() * theta.sin(),
                );
                g.push_vertex(p, p.normalize_or_zero(), [u, 1.0 - v]);
            }
        }

        let row = ws + 1;
        for iy in 0..hs {
            for ix in 0..ws {
                let a = iy * row + ix + 1;
                let b = iy * row + ix;
                let c = (iy + 1) * row + ix;
                let d = (iy + 1) * row + ix + 1;
                // Pole rows collapse to a single triangle per segment.
                if iy != 0 {
                    g.indices.extend_from_slice(&[a, b, d]);
                }
                if iy != hs - 1 {
                    g.indices.extend_from_slice(&[b, c, d]);
                }
            }
        }
        g
    }

    /// Plane in XY facing +Z, centred at the origin.
    pub fn plane(width: f32, height: f32, width_segments: u32, height_segments: u32) -> Self {
        let gx = width_segments.max(1);
        let gy = height_segments.max(1);
        let mut g = Self::with_capacity(
            ((gx + 1) * (gy + 1)) as usize,
            (gx * gy * 6) as usize,
        );
        let seg_w = width / gx as f32;
        let seg_h = height / gy as f32;

        for iy in 0..=gy {
            let y = iy as f32 * seg_h - height / 2.0;
            for ix in 0..=gx {
                let x = ix as f32 * seg_w - width / 2.0;
                g.push_vertex(
                    Vec3::new(x, -y, 0.0),
                    Vec3::Z,
                    [ix as f32 / gx as f32, 1.0 - iy as f32 / gy as f32],
                );
            }
        }

        let row = gx + 1;
        for iy in 0..gy {
            for ix in 0..gx {
                let a = ix + row * iy;
                let b = ix + row * (iy + 1);
                let c = ix + 1 + row * (iy + 1);
                let d = ix + 1 + row * iy;
                g.indices.extend_from_slice(&[a, b, d, b, c, d]);
            }
        }
        g
    }

    /// Torus around the Z axis; `radius` to the tube centre, `tube` the
    /// tube radius.
    pub fn torus(radius: f32, tube: f32, radial_segments: u32, tubular_segments: u32) -> Self {
        let rs = radial_segments.max(3);
        let ts = tubular_segments.max(3);
        let mut g = Self::with_capacity(
            ((rs + 1) * (ts + 1)) as usize,
            (rs * ts * 6) as usize,
        );

        for j in 0..=rs {
            let v = j as f32 / rs as f32 * TAU;
            for i in 0..=ts {
                let u = i as f32 / ts as f32 * TAU;
                let p = Vec3::new(
                    (radius + tube * v.cos()) * u.cos(),
                    (radius + tube * v.cos()) * u.sin(),
                    tube * v.sin(),
                );
                let centre = Vec3::new(radius * u.cos(), radius * u.sin(), 0.0);
                g.push_vertex(
                    p,
                    (p - centre).normalize_or_zero(),
                    [i as f32 / ts as f32, j as f32 / rs as f32],
                );
            }
        }

        let row = ts + 1;
        for j in 1..=rs {
            for i in 1..=ts {
                let a = row * j + i - 1;
                let b = row * (j - 1) + i - 1;
                let c = row * (j - 1) + i;
                let d = row * j + i;
                g.indices.extend_from_slice(&[a, b, d, b, c, d]);
            }
        }
        g
    }
}
