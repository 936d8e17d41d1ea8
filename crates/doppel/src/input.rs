//! # Input Tracking
//!
//! The host samples its devices once per frame into an [`InputFrame`]. The
//! [`InputTracker`] compares it with the previous frame to produce press
//! edges and a mouse delta.

use glam::Vec2;

use crate::character::MovementInput;

/// Logical actions bound by the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Key {
    /// W
    Forward,
    /// S
    Backward,
    /// A
    Left,
    /// D
    Right,
    /// Space
    Jump,
    /// Left shift
    Sprint,
    /// E
    Interact,
    /// F
    Throw,
    /// Left mouse button
    UseRemote,
    /// Enter
    DismissNote,
    /// Escape
    Pause,
}

impl Key {
    /// Number of keys.
    pub const COUNT: usize = 11;

    /// Every key, in discriminant order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::Forward,
        Self::Backward,
        Self::Left,
        Self::Right,
        Self::Jump,
        Self::Sprint,
        Self::Interact,
        Self::Throw,
        Self::UseRemote,
        Self::DismissNote,
        Self::Pause,
    ];

    #[inline]
    const fn index(self) -> usize {
        self as usize
    }
}

/// Raw device state for one frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct InputFrame {
    down: [bool; Key::COUNT],
    cursor: Option<Vec2>,
}

impl InputFrame {
    /// Nothing pressed, no cursor sample.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `key` as held.
    #[must_use]
    pub fn with(mut self, key: Key) -> Self {
        self.down[key.index()] = true;
        self
    }

    /// Attaches a cursor position (window pixels, y down).
    #[must_use]
    pub fn with_cursor(mut self, x: f32, y: f32) -> Self {
        self.cursor = Some(Vec2::new(x, y));
        self
    }

    /// Sets the held state of `key`.
    pub fn set(&mut self, key: Key, down: bool) {
        self.down[key.index()] = down;
    }

    /// Sets the cursor position.
    pub fn set_cursor(&mut self, position: Option<Vec2>) {
        self.cursor = position;
    }

    /// True if `key` is held.
    #[must_use]
    pub const fn is_down(&self, key: Key) -> bool {
        self.down[key.index()]
    }
}

/// Derived input for one frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct InputState {
    down: [bool; Key::COUNT],
    pressed: [bool; Key::COUNT],
    /// Cursor motion in pixels, positive `y` looks up.
    pub mouse_delta: Vec2,
}

impl InputState {
    /// True while `key` is held.
    #[must_use]
    pub const fn is_down(&self, key: Key) -> bool {
        self.down[key.index()]
    }

    /// True only on the frame `key` went down.
    #[must_use]
    pub const fn pressed(&self, key: Key) -> bool {
        self.pressed[key.index()]
    }

    /// Movement keys and the jump edge.
    #[must_use]
    pub const fn movement(&self) -> MovementInput {
        MovementInput {
            forward: self.is_down(Key::Forward),
            backward: self.is_down(Key::Backward),
            left: self.is_down(Key::Left),
            right: self.is_down(Key::Right),
            jump: self.pressed(Key::Jump),
        }
    }
}

/// Turns consecutive frames into edges and deltas.
#[derive(Clone, Debug, Default)]
pub struct InputTracker {
    previous: [bool; Key::COUNT],
    last_cursor: Option<Vec2>,
}

impl InputTracker {
    /// Fresh tracker: every key up, no cursor history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumes one frame.
    ///
    /// The first cursor sample yields a zero delta, so the camera does not
    /// jump when the cursor is first captured.
    pub fn update(&mut self, frame: &InputFrame) -> InputState {
        let mut state = InputState {
            down: frame.down,
            ..InputState::default()
        };
        for key in Key::ALL {
            let i = key.index();
            state.pressed[i] = frame.down[i] && !self.previous[i];
        }
        self.previous = frame.down;

        if let Some(cursor) = frame.cursor {
            if let Some(last) = self.last_cursor {
                state.mouse_delta = Vec2::new(cursor.x - last.x, last.y - cursor.y);
            }
            self.last_cursor = Some(cursor);
        }
        state
    }

    /// Forgets cursor history (after the cursor was released).
    pub fn reset_cursor(&mut self) {
        self.last_cursor = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_press_edge_fires_once() {
        let mut tracker = InputTracker::new();
        let held = InputFrame::new().with(Key::Interact);

        assert!(tracker.update(&held).pressed(Key::Interact));
        for _ in 0..10 {
            let state = tracker.update(&held);
            assert!(state.is_down(Key::Interact));
            assert!(!state.pressed(Key::Interact));
        }
        tracker.update(&InputFrame::new());
        assert!(tracker.update(&held).pressed(Key::Interact));
    }

    #[test]
    fn test_first_cursor_sample_has_no_delta() {
        let mut tracker = InputTracker::new();
        let first = tracker.update(&InputFrame::new().with_cursor(400.0, 300.0));
        assert_eq!(first.mouse_delta, Vec2::ZERO);

        let second = tracker.update(&InputFrame::new().with_cursor(410.0, 290.0));
        assert_eq!(second.mouse_delta, Vec2::new(10.0, 10.0));
    }

    #[test]
    fn test_missing_cursor_keeps_history() {
        let mut tracker = InputTracker::new();
        tracker.update(&InputFrame::new().with_cursor(0.0, 0.0));
        tracker.update(&InputFrame::new());
        let state = tracker.update(&InputFrame::new().with_cursor(5.0, 0.0));
        assert_eq!(state.mouse_delta, Vec2::new(5.0, 0.0));
    }

    #[test]
    fn test_movement_mapping() {
        let mut tracker = InputTracker::new();
        let frame = InputFrame::new().with(Key::Forward).with(Key::Left).with(Key::Jump);
        let movement = tracker.update(&frame).movement();
        assert!(movement.forward && movement.left && movement.jump);
        assert!(!movement.backward && !movement.right);

        // Jump is an edge, direction keys are levels
        let movement = tracker.update(&frame).movement();
        assert!(movement.forward && !movement.jump);
    }
}
