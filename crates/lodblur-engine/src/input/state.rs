use std::collections::HashSet;

use super::frame::InputFrame;
use super::types::{InputEvent, Key, KeyState, PinchPhase};

/// Current input state for a single window.
///
/// Per-frame transitions are recorded into an `InputFrame`.
#[derive(Debug)]
pub struct InputState {
    /// Whether the window is focused.
    pub focused: bool,

    /// Set of currently held keys.
    pub keys_down: HashSet<Key>,

    /// Absolute scale of the pinch in progress; 1.0 when idle.
    pub pinch_scale: f32,
}

impl Default for InputState {
    fn default() -> Self {
        Self {
            focused: false,
            keys_down: HashSet::new(),
            pinch_scale: 1.0,
        }
    }
}

impl InputState {
    /// Applies a platform-agnostic input event to the current state and writes deltas to `frame`.
    pub fn apply_event(&mut self, frame: &mut InputFrame, ev: InputEvent) {
        match &ev {
            InputEvent::Focused(f) => {
                self.focused = *f;
                if !*f {
                    // On focus loss, clear held keys so nothing stays stuck.
                    self.keys_down.clear();
                }
            }

            InputEvent::Key { key, state, .. } => match state {
                KeyState::Pressed => {
                    if self.keys_down.insert(*key) {
                        frame.keys_pressed.insert(*key);
                    }
                }
                KeyState::Released => {
                    if self.keys_down.remove(key) {
                        frame.keys_released.insert(*key);
                    }
                }
            },

            InputEvent::Pinch(p) => match p.phase {
                PinchPhase::Began | PinchPhase::Changed => self.pinch_scale = p.scale,
                PinchPhase::Ended => self.pinch_scale = 1.0,
            },

            InputEvent::MouseWheel(_) => {}
        }

        frame.push_event(ev);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::PinchEvent;

    fn pinch(phase: PinchPhase, scale: f32) -> InputEvent {
        InputEvent::Pinch(PinchEvent { phase, scale })
    }

    #[test]
    fn pinch_scale_tracks_gesture_and_resets_on_end() {
        let mut state = InputState::default();
        let mut frame = InputFrame::default();

        state.apply_event(&mut frame, pinch(PinchPhase::Began, 1.0));
        state.apply_event(&mut frame, pinch(PinchPhase::Changed, 1.5));
        assert_eq!(state.pinch_scale, 1.5);

        state.apply_event(&mut frame, pinch(PinchPhase::Ended, 1.5));
        assert_eq!(state.pinch_scale, 1.0);
        assert_eq!(frame.pinches().count(), 3);
    }

    #[test]
    fn repeated_press_records_one_transition() {
        let mut state = InputState::default();
        let mut frame = InputFrame::default();
        let press = InputEvent::Key { key: Key::R, state: KeyState::Pressed, repeat: false };

        state.apply_event(&mut frame, press.clone());
        state.apply_event(&mut frame, press);
        assert_eq!(frame.keys_pressed.len(), 1);
        assert!(state.keys_down.contains(&Key::R));
    }

    #[test]
    fn focus_loss_releases_keys() {
        let mut state = InputState::default();
        let mut frame = InputFrame::default();
        state.apply_event(
            &mut frame,
            InputEvent::Key { key: Key::Escape, state: KeyState::Pressed, repeat: false },
        );
        state.apply_event(&mut frame, InputEvent::Focused(false));
        assert!(state.keys_down.is_empty());
    }
}
