use glam::Vec2;

use crate::action::Action;

/// Pointer buttons the controls care about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    Primary,
    Secondary,
    Middle,
}

/// Turns press/move/release/wheel events into camera [`Action`]s.
///
/// Primary drag rotates, secondary drag pans; positions are logical pixels.
#[derive(Debug, Default)]
pub struct PointerTracker {
    rotating: bool,
    panning: bool,
    last: Option<Vec2>,
}

impl PointerTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&mut self, button: Button) {
        match button {
            Button::Primary => self.rotating = true,
            Button::Secondary => self.panning = true,
            Button::Middle => {}
        }
    }

    pub fn release(&mut self, button: Button) {
        match button {
            Button::Primary => self.rotating = false,
            Button::Secondary => self.panning = false,
            Button::Middle => {}
        }
    }

    /// Forget any drag, e.g. when the pointer leaves the window.
    pub fn reset(&mut self) {
        self.rotating = false;
        self.panning = false;
        self.last = None;
    }

    pub fn is_dragging(&self) -> bool {
        self.rotating || self.panning
    }

    pub fn moved(&mut self, position: Vec2) -> Action {
        let delta = self.last.map_or(Vec2::ZERO, |last| position - last);
        self.last = Some(position);
        if self.rotating {
            Action::Rotate(delta)
        } else if self.panning {
            Action::Pan(delta)
        } else {
            Action::Noop
        }
    }

    /// Wheel input in notches; positive is away from the user.
    pub fn wheel(&mut self, notches: f32) -> Action {
        Action::Dolly(notches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hover_without_buttons_is_noop() {
        let mut p = PointerTracker::new();
        assert_eq!(p.moved(Vec2::new(10.0, 10.0)), Action::Noop);
        assert_eq!(p.moved(Vec2::new(20.0, 10.0)), Action::Noop);
    }

    #[test]
    fn primary_drag_rotates_by_delta() {
        let mut p = PointerTracker::new();
        p.moved(Vec2::new(10.0, 10.0));
        p.press(Button::Primary);
        assert_eq!(p.moved(Vec2::new(15.0, 8.0)), Action::Rotate(Vec2::new(5.0, -2.0)));
        p.release(Button::Primary);
        assert!(!p.is_dragging());
    }

    #[test]
    fn secondary_drag_pans() {
        let mut p = PointerTracker::new();
        p.moved(Vec2::ZERO);
        p.press(Button::Secondary);
        assert_eq!(p.moved(Vec2::new(0.0, 3.0)), Action::Pan(Vec2::new(0.0, 3.0)));
    }

    #[test]
    fn first_move_after_reset_has_no_jump() {
        let mut p = PointerTracker::new();
        p.press(Button::Primary);
        p.reset();
        p.press(Button::Primary);
        assert!(p.moved(Vec2::new(500.0, 500.0)).is_noop());
    }

    #[test]
    fn wheel_dollies() {
        let mut p = PointerTracker::new();
        assert_eq!(p.wheel(1.0), Action::Dolly(1.0));
    }
}
