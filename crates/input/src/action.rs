use glam::Vec2;

/// A camera gesture, independent of the windowing backend.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    /// Orbit around the target by a pointer delta in logical pixels.
    Rotate(Vec2),
    /// Slide the target in the view plane by a pointer delta in logical pixels.
    Pan(Vec2),
    /// Wheel notches; positive moves towards the target.
    Dolly(f32),
    /// Nothing bound to this input.
    Noop,
}

impl Action {
    pub fn is_noop(&self) -> bool {
        match self {
            Action::Rotate(d) | Action::Pan(d) => *d == Vec2::ZERO,
            Action::Dolly(d) => *d == 0.0,
            Action::Noop => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_deltas_are_noops() {
        assert!(Action::Rotate(Vec2::ZERO).is_noop());
        assert!(Action::Pan(Vec2::ZERO).is_noop());
        assert!(Action::Dolly(0.0).is_noop());
        assert!(Action::Noop.is_noop());
    }

    #[test]
    fn non_zero_deltas_are_not() {
        assert!(!Action::Rotate(Vec2::new(1.0, 0.0)).is_noop());
        assert!(!Action::Dolly(-1.0).is_noop());
    }
}
