//! Keyboard and mouse state, sampled once per frame by the draw loop.

use std::collections::HashSet;

pub use winit::keyboard::KeyCode;

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

impl From<winit::event::MouseButton> for MouseButton {
    fn from(button: winit::event::MouseButton) -> Self {
        match button {
            winit::event::MouseButton::Right => MouseButton::Right,
            winit::event::MouseButton::Middle => MouseButton::Middle,
            _ => MouseButton::Left,
        }
    }
}

/// Current keyboard and mouse state.
///
/// Events accumulate between frames; `begin_frame` clears the per-frame
/// deltas after the draw loop has consumed them.
#[derive(Debug, Default)]
pub struct InputState {
    /// Currently held keys.
    pressed_keys: HashSet<KeyCode>,
    /// Currently held mouse buttons.
    pressed_buttons: HashSet<MouseButton>,
    /// Last reported cursor position.
    mouse_position: (f32, f32),
    /// Cursor movement accumulated since the last `begin_frame`.
    mouse_delta: (f32, f32),
    /// First cursor event has not arrived yet; its delta is discarded so
    /// the camera does not jump to wherever the cursor happened to be.
    awaiting_first_mouse: bool,
}

impl InputState {
    pub fn new() -> Self {
        Self {
            awaiting_first_mouse: true,
            ..Self::default()
        }
    }

    /// Clear per-frame deltas. Called once per draw-loop iteration after
    /// the camera has been updated.
    pub fn begin_frame(&mut self) {
        self.mouse_delta = (0.0, 0.0);
    }

    /// Record a key press.
    pub fn on_key_pressed(&mut self, key: KeyCode) {
        self.pressed_keys.insert(key);
    }

    /// Record a key release.
    pub fn on_key_released(&mut self, key: KeyCode) {
        self.pressed_keys.remove(&key);
    }

    /// Record a mouse button press.
    pub fn on_mouse_pressed(&mut self, button: MouseButton) {
        self.pressed_buttons.insert(button);
    }

    /// Record a mouse button release.
    pub fn on_mouse_released(&mut self, button: MouseButton) {
        self.pressed_buttons.remove(&button);
    }

    /// Record cursor movement.
    pub fn on_mouse_moved(&mut self, x: f32, y: f32) {
        if self.awaiting_first_mouse {
            self.awaiting_first_mouse = false;
        } else {
            self.mouse_delta.0 += x - self.mouse_position.0;
            self.mouse_delta.1 += y - self.mouse_position.1;
        }
        self.mouse_position = (x, y);
    }

    /// Whether a key is currently held.
    pub fn is_key_pressed(&self, key: KeyCode) -> bool {
        self.pressed_keys.contains(&key)
    }

    /// Whether a mouse button is currently held.
    pub fn is_mouse_pressed(&self, button: MouseButton) -> bool {
        self.pressed_buttons.contains(&button)
    }

    /// Cursor movement since the last `begin_frame`.
    pub fn mouse_delta(&self) -> (f32, f32) {
        self.mouse_delta
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_state_tracks_press_and_release() {
        let mut input = InputState::new();
        assert!(!input.is_key_pressed(KeyCode::KeyW));

        input.on_key_pressed(KeyCode::KeyW);
        assert!(input.is_key_pressed(KeyCode::KeyW));

        input.on_key_released(KeyCode::KeyW);
        assert!(!input.is_key_pressed(KeyCode::KeyW));
    }

    #[test]
    fn first_mouse_event_produces_no_delta() {
        let mut input = InputState::new();
        input.on_mouse_moved(400.0, 300.0);
        assert_eq!(input.mouse_delta(), (0.0, 0.0));

        input.on_mouse_moved(410.0, 295.0);
        assert_eq!(input.mouse_delta(), (10.0, -5.0));
    }

    #[test]
    fn begin_frame_clears_delta() {
        let mut input = InputState::new();
        input.on_mouse_moved(0.0, 0.0);
        input.on_mouse_moved(5.0, 5.0);
        assert_ne!(input.mouse_delta(), (0.0, 0.0));

        input.begin_frame();
        assert_eq!(input.mouse_delta(), (0.0, 0.0));
    }
}
