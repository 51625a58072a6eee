use glam::Vec2;

/// A camera manipulation request, independent of the windowing system.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlInput {
    /// Orbit around the target by a pointer delta in pixels.
    Rotate { dx: f32, dy: f32 },
    /// Slide camera and target sideways by a pointer delta in pixels.
    Pan { dx: f32, dy: f32 },
    /// Dolly towards (positive) or away from (negative) the target, in wheel steps.
    Zoom { delta: f32 },
}

/// Pointer buttons the controls care about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
}

/// Turns button/cursor/wheel events into [`ControlInput`]s.
///
/// Primary drag rotates, secondary drag pans, middle drag dollies, the wheel
/// zooms. Only one drag is active at a time; the first pressed button wins.
#[derive(Debug, Default)]
pub struct PointerTracker {
    dragging: Option<PointerButton>,
    last: Option<Vec2>,
}

impl PointerTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dragging(&self) -> Option<PointerButton> {
        self.dragging
    }

    pub fn button(&mut self, button: PointerButton, pressed: bool) {
        match (pressed, self.dragging) {
            (true, None) => self.dragging = Some(button),
            (false, Some(active)) if active == button => self.dragging = None,
            _ => {}
        }
    }

    /// Cursor moved to `(x, y)` in physical pixels.
    pub fn cursor_moved(&mut self, x: f32, y: f32) -> Option<ControlInput> {
        let pos = Vec2::new(x, y);
        let prev = self.last.replace(pos)?;
        let delta = pos - prev;
        if delta == Vec2::ZERO {
            return None;
        }
        let input = match self.dragging? {
            PointerButton::Primary => ControlInput::Rotate {
                dx: delta.x,
                dy: delta.y,
            },
            PointerButton::Secondary => ControlInput::Pan {
                dx: delta.x,
                dy: delta.y,
            },
            // Dragging up dollies in.
            PointerButton::Middle => ControlInput::Zoom {
                delta: -delta.y / 10.0,
            },
        };
        tracing::trace!(?input, "pointer drag");
        Some(input)
    }

    pub fn cursor_left(&mut self) {
        self.last = None;
    }

    /// Wheel scrolled by `lines` (positive = away from the user).
    pub fn wheel(&mut self, lines: f32) -> Option<ControlInput> {
        (lines != 0.0).then_some(ControlInput::Zoom { delta: lines })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn moving_without_button_produces_nothing() {
        let mut t = PointerTracker::new();
        assert_eq!(t.cursor_moved(10.0, 10.0), None);
        assert_eq!(t.cursor_moved(20.0, 10.0), None);
    }

    #[test]
    fn primary_drag_rotates() {
        let mut t = PointerTracker::new();
        t.cursor_moved(10.0, 10.0);
        t.button(PointerButton::Primary, true);
        assert_eq!(
            t.cursor_moved(15.0, 8.0),
            Some(ControlInput::Rotate { dx: 5.0, dy: -2.0 })
        );
        t.button(PointerButton::Primary, false);
        assert_eq!(t.dragging(), None);
        assert_eq!(t.cursor_moved(30.0, 8.0), None);
    }

    #[test]
    fn secondary_drag_pans() {
        let mut t = PointerTracker::new();
        t.cursor_moved(0.0, 0.0);
        t.button(PointerButton::Secondary, true);
        assert_eq!(
            t.cursor_moved(3.0, 4.0),
            Some(ControlInput::Pan { dx: 3.0, dy: 4.0 })
        );
    }

    #[test]
    fn first_button_wins() {
        let mut t = PointerTracker::new();
        t.button(PointerButton::Primary, true);
        t.button(PointerButton::Secondary, true);
        assert_eq!(t.dragging(), Some(PointerButton::Primary));
        t.button(PointerButton::Secondary, false);
        assert_eq!(t.dragging(), Some(PointerButton::Primary));
    }

    #[test]
    fn leaving_window_resets_anchor() {
        let mut t = PointerTracker::new();
        t.button(PointerButton::Primary, true);
        t.cursor_moved(0.0, 0.0);
        t.cursor_left();
        assert_eq!(t.cursor_moved(100.0, 100.0), None);
    }

    #[test]
    fn wheel_zooms() {
        let mut t = PointerTracker::new();
        assert_eq!(t.wheel(0.0), None);
        assert_eq!(t.wheel(1.5), Some(ControlInput::Zoom { delta: 1.5 }));
    }
}
