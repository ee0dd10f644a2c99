use std::fmt;

/// Keyboard key identifier.
///
/// Only keys the demo reacts to are named; everything else maps to
/// `Key::Unknown` with the platform key code.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Key {
    Escape,
    R,
    Equal,
    Minus,
    Unknown(u32),
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum KeyState {
    Pressed,
    Released,
}

/// Mouse wheel delta.
///
/// `Line` corresponds to "scroll lines" style input; `Pixel` is high precision.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum MouseWheelDelta {
    Line { x: f32, y: f32 },
    Pixel { x: f32, y: f32 },
}

impl MouseWheelDelta {
    /// Vertical component expressed in lines (pixel deltas use 40 px per line).
    pub fn lines_y(self) -> f32 {
        match self {
            MouseWheelDelta::Line { y, .. } => y,
            MouseWheelDelta::Pixel { y, .. } => y / 40.0,
        }
    }
}

/// Lifecycle of a pinch gesture.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum PinchPhase {
    Began,
    Changed,
    Ended,
}

/// Pinch gesture sample.
///
/// `scale` is absolute since the gesture began: 1.0 at the start, > 1.0 when
/// the fingers spread apart.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PinchEvent {
    pub phase: PinchPhase,
    pub scale: f32,
}

/// Platform-agnostic input events emitted by the runtime.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    Key {
        key: Key,
        state: KeyState,
        /// True when event is a key-repeat.
        repeat: bool,
    },

    MouseWheel(MouseWheelDelta),

    Pinch(PinchEvent),

    /// Window focus change.
    Focused(bool),
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}
