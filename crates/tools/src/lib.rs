//! Developer tooling: the material parameter panel and a read-only scene
//! inspector.
//!
//! # Invariants
//! - The panel is the only writer of the shared material at runtime, and
//!   writes only values inside each slider's range on its step grid.
//! - The inspector never mutates anything it looks at.

mod inspector;
mod panel;

pub use inspector::{MeshInfo, SceneInspector, SceneSummary, TextureSummary};
pub use panel::{ParameterPanel, quantize};

pub fn crate_info() -> &'static str {
    "materia-tools v0.1.0"
}
