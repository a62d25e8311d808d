//! Scene model: one shared PBR material on three primitive meshes, a
//! perspective camera, a monotonic clock, and the per-frame update.
//!
//! # Invariants
//! - A scene owns exactly one material; every mesh refers to it.
//! - Mesh rotation is a pure function of elapsed time, never accumulated.
//! - Scene state is confined to the thread that created it.

pub mod camera;
pub mod clock;
pub mod config;
pub mod frame_loop;
pub mod geometry;
pub mod material;
pub mod mesh;
pub mod scene;

pub use camera::PerspectiveCamera;
pub use clock::Clock;
pub use config::{CameraConfig, ConfigError, ControlsConfig, DemoConfig, MapBindings, SliderConfig};
pub use frame_loop::{CancelHandle, FrameLoop, FrameTick, LoopState, Spin};
pub use geometry::Geometry;
pub use material::{Material, MaterialMaps, MaterialProperty, SharedMaterial, Side};
pub use mesh::Mesh;
pub use scene::Scene;
