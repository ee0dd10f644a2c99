use std::collections::HashSet;

use super::types::{InputEvent, Key, PinchEvent};

/// Per-frame input deltas.
///
/// `InputState` provides the current state (held keys, active pinch).
/// `InputFrame` provides events and transition sets for the current frame.
#[derive(Debug, Default)]
pub struct InputFrame {
    /// Raw events in arrival order.
    pub events: Vec<InputEvent>,

    /// Keys pressed this frame.
    pub keys_pressed: HashSet<Key>,

    /// Keys released this frame.
    pub keys_released: HashSet<Key>,
}

impl InputFrame {
    pub fn clear(&mut self) {
        self.events.clear();
        self.keys_pressed.clear();
        self.keys_released.clear();
    }

    pub fn push_event(&mut self, ev: InputEvent) {
        self.events.push(ev);
    }

    /// Pinch samples received this frame, in arrival order.
    pub fn pinches(&self) -> impl Iterator<Item = PinchEvent> + '_ {
        self.events.iter().filter_map(|ev| match ev {
            InputEvent::Pinch(p) => Some(*p),
            _ => None,
        })
    }

    /// Sum of vertical wheel motion this frame, in lines.
    pub fn wheel_lines(&self) -> f32 {
        self.events
            .iter()
            .filter_map(|ev| match ev {
                InputEvent::MouseWheel(d) => Some(d.lines_y()),
                _ => None,
            })
            .sum()
    }
}
