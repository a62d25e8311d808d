//! wgpu render backend for the material viewer.
//!
//! Draws the equirectangular background, then every mesh with the shared
//! PBR material lit by the environment map, into an offscreen target sized
//! by the capped pixel ratio; the result is scaled onto the output view.
//!
//! # Invariants
//! - The renderer reads the scene, camera and texture library; it never
//!   mutates them.
//! - A slot whose texture is missing, pending or failed samples a neutral
//!   fallback and is flagged absent to the shader.
//! - With no environment set, meshes receive no light and the background
//!   clears to black.

mod gpu;
mod shaders;
mod target;
mod textures;
mod uniforms;

pub use gpu::PbrRenderer;
