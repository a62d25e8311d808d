//! Shared types for the materia viewer.

mod types;

pub use types::{ColorSpace, Transform};
