use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use glam::Vec3;
use materia_common::Transform;
use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::scene::Scene;

/// Angular rates (radians per second) applied to every mesh.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Spin {
    pub x_rate: f32,
    pub y_rate: f32,
}

impl Default for Spin {
    fn default() -> Self {
        Self {
            x_rate: -0.15,
            y_rate: 0.1,
        }
    }
}

impl Spin {
    /// Euler rotation at elapsed time `t`. Z is left untouched by `apply`.
    pub fn rotation_at(&self, t: f32) -> Vec3 {
        Vec3::new(self.x_rate * t, self.y_rate * t, 0.0)
    }

    /// Overwrite X and Y rotation from `t` alone.
    pub fn apply(&self, transform: &mut Transform, t: f32) {
        let r = self.rotation_at(t);
        transform.rotation.x = r.x;
        transform.rotation.y = r.y;
    }
}

/// Loop lifecycle. There is no way back from `Cancelled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    Cancelled,
}

/// Cloneable handle that stops a [`FrameLoop`] from outside.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// What one tick observed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTick {
    /// Frames completed including this one.
    pub frame: u64,
    /// Seconds since the loop started.
    pub elapsed: f32,
    /// Seconds since the previous tick.
    pub delta: f32,
}

/// Per-frame scene update.
///
/// `tick` reads the clock and writes each mesh's rotation from the elapsed
/// time. The host then steps the camera controls, draws, and schedules the
/// next frame; once the handle is cancelled `tick` returns `None` and the
/// host should stop scheduling.
#[derive(Debug)]
pub struct FrameLoop {
    clock: Clock,
    spin: Spin,
    cancel: CancelHandle,
    frame: u64,
    last_elapsed: f32,
}

impl FrameLoop {
    pub fn new(clock: Clock, spin: Spin) -> Self {
        Self {
            clock,
            spin,
            cancel: CancelHandle::default(),
            frame: 0,
            last_elapsed: 0.0,
        }
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    pub fn state(&self) -> LoopState {
        if self.cancel.is_cancelled() {
            LoopState::Cancelled
        } else {
            LoopState::Running
        }
    }

    pub fn clock_mut(&mut self) -> &mut Clock {
        &mut self.clock
    }

    pub fn spin(&self) -> Spin {
        self.spin
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn tick(&mut self, scene: &mut Scene) -> Option<FrameTick> {
        if self.state() == LoopState::Cancelled {
            return None;
        }
        let elapsed = self.clock.elapsed_secs();
        scene.animate(&self.spin, elapsed);

        self.frame += 1;
        let delta = elapsed - self.last_elapsed;
        self.last_elapsed = elapsed;
        tracing::trace!(frame = self.frame, elapsed, "frame tick");
        Some(FrameTick {
            frame: self.frame,
            elapsed,
            delta,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::Material;
    use std::time::Duration;

    fn run_to(seconds: f32, frames: u32) -> Scene {
        let mut scene = Scene::demo(Material::demo());
        let mut frame_loop = FrameLoop::new(Clock::manual(), Spin::default());
        let step = Duration::from_secs_f32(seconds / frames as f32);
        frame_loop.tick(&mut scene);
        for _ in 0..frames {
            frame_loop.clock_mut().advance(step);
            frame_loop.tick(&mut scene);
        }
        scene
    }

    #[test]
    fn rotation_after_ten_seconds() {
        let scene = run_to(10.0, 600);
        let sphere = scene.mesh("sphere").unwrap();
        assert!((sphere.transform.rotation.y - 1.0).abs() < 1e-3);
        assert!((sphere.transform.rotation.x + 1.5).abs() < 1e-3);
    }

    #[test]
    fn rotation_independent_of_frame_rate() {
        let slow = run_to(4.0, 20);
        let fast = run_to(4.0, 1000);
        for (a, b) in slow.meshes().iter().zip(fast.meshes()) {
            assert!((a.transform.rotation - b.transform.rotation).abs().max_element() < 1e-3);
        }
    }

    #[test]
    fn every_mesh_gets_the_same_rotation() {
        let scene = run_to(3.0, 30);
        let expected = Spin::default().rotation_at(3.0);
        for mesh in scene.meshes() {
            assert!((mesh.transform.rotation.y - expected.y).abs() < 1e-4, "{}", mesh.name);
            assert!((mesh.transform.rotation.x - expected.x).abs() < 1e-4, "{}", mesh.name);
        }
    }

    #[test]
    fn spin_keeps_position_and_z() {
        let mut t = Transform::from_position(Vec3::new(1.5, 0.0, 0.0));
        t.rotation.z = 0.3;
        Spin::default().apply(&mut t, 2.0);
        assert_eq!(t.position, Vec3::new(1.5, 0.0, 0.0));
        assert_eq!(t.rotation.z, 0.3);
        assert!((t.rotation.y - 0.2).abs() < 1e-6);
    }

    #[test]
    fn ticks_report_frame_and_delta() {
        let mut scene = Scene::demo(Material::demo());
        let mut frame_loop = FrameLoop::new(Clock::manual(), Spin::default());
        let first = frame_loop.tick(&mut scene).unwrap();
        assert_eq!(first.frame, 1);
        assert_eq!(first.elapsed, 0.0);
        frame_loop.clock_mut().advance(Duration::from_millis(250));
        let second = frame_loop.tick(&mut scene).unwrap();
        assert_eq!(second.frame, 2);
        assert!((second.delta - 0.25).abs() < 1e-6);
    }

    #[test]
    fn cancel_stops_the_loop() {
        let mut scene = Scene::demo(Material::demo());
        let mut frame_loop = FrameLoop::new(Clock::manual(), Spin::default());
        let handle = frame_loop.cancel_handle();
        assert_eq!(frame_loop.state(), LoopState::Running);
        assert!(frame_loop.tick(&mut scene).is_some());

        handle.cancel();
        assert_eq!(frame_loop.state(), LoopState::Cancelled);
        frame_loop.clock_mut().advance(Duration::from_secs(1));
        assert!(frame_loop.tick(&mut scene).is_none());
        assert_eq!(frame_loop.frame(), 1);
        assert_eq!(scene.mesh("torus").unwrap().transform.rotation.y, 0.0);
    }
}
