//! Camera input: raw pointer events are mapped to [`Action`]s, which the
//! damped [`OrbitControls`] integrate into camera motion once per frame.
//!
//! # Invariants
//! - Controls never touch the scene, only the camera.
//! - Input accumulates between frames; `update` consumes it.

pub mod action;
pub mod orbit;
pub mod pointer;

pub use action::Action;
pub use orbit::OrbitControls;
pub use pointer::{Button, PointerTracker};
