//! Rendering adapter: renderer-agnostic interface.
//!
//! # Invariants
//! - Renderers read the scene and camera; they never mutate them.
//! - The drawing buffer is the logical viewport scaled by a pixel ratio
//!   capped at [`MAX_PIXEL_RATIO`].

mod renderer;
mod viewport;

pub use renderer::{DebugTextRenderer, Renderer};
pub use viewport::{MAX_PIXEL_RATIO, Viewport, apply_resize};

pub fn crate_info() -> &'static str {
    "materia-render v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("render"));
    }
}
