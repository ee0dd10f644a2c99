use winit::dpi::PhysicalPosition;
use winit::event::{ElementState, MouseScrollDelta, TouchPhase, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::Window;

use crate::input::{
    InputEvent, InputState, Key, KeyState, MouseWheelDelta, PinchEvent, PinchPhase,
};

/// Translates a winit `WindowEvent` into an engine `InputEvent`.
///
/// Returns `None` for events not represented by the input subsystem.
pub(crate) fn translate_window_event(
    window: &Window,
    state: &InputState,
    event: &WindowEvent,
) -> Option<InputEvent> {
    match event {
        WindowEvent::Focused(f) => Some(InputEvent::Focused(*f)),

        WindowEvent::MouseWheel { delta, .. } => {
            let delta = match delta {
                MouseScrollDelta::LineDelta(x, y) => MouseWheelDelta::Line { x: *x, y: *y },
                MouseScrollDelta::PixelDelta(p) => {
                    let (x, y) = to_logical_f32(window, *p);
                    MouseWheelDelta::Pixel { x, y }
                }
            };
            Some(InputEvent::MouseWheel(delta))
        }

        WindowEvent::KeyboardInput { event, .. } => {
            let st = match event.state {
                ElementState::Pressed => KeyState::Pressed,
                ElementState::Released => KeyState::Released,
            };

            Some(InputEvent::Key {
                key: map_key(event.physical_key),
                state: st,
                repeat: event.repeat,
            })
        }

        WindowEvent::PinchGesture { delta, phase, .. } => {
            Some(InputEvent::Pinch(fold_pinch(state.pinch_scale, *delta, *phase)))
        }

        _ => None,
    }
}

/// Folds one incremental winit pinch delta into the absolute gesture scale.
///
/// `current` is the scale accumulated so far in this gesture. A new gesture
/// restarts from `1 + delta`; a cancelled one ends like a finished one.
fn fold_pinch(current: f32, delta: f64, phase: TouchPhase) -> PinchEvent {
    let step = (1.0 + delta as f32).max(f32::EPSILON);
    match phase {
        TouchPhase::Started => PinchEvent { phase: PinchPhase::Began, scale: step },
        TouchPhase::Moved => PinchEvent { phase: PinchPhase::Changed, scale: current * step },
        TouchPhase::Ended | TouchPhase::Cancelled => PinchEvent {
            phase: PinchPhase::Ended,
            scale: current,
        },
    }
}

fn to_logical_f32(window: &Window, pos: PhysicalPosition<f64>) -> (f32, f32) {
    let scale = window.scale_factor();
    let logical = pos.to_logical::<f64>(scale);
    (logical.x as f32, logical.y as f32)
}

fn map_key(pk: PhysicalKey) -> Key {
    match pk {
        PhysicalKey::Code(code) => match code {
            KeyCode::Escape => Key::Escape,
            KeyCode::KeyR => Key::R,
            KeyCode::Equal | KeyCode::NumpadAdd => Key::Equal,
            KeyCode::Minus | KeyCode::NumpadSubtract => Key::Minus,
            other => Key::Unknown(other as u32),
        },

        // winit 0.30 uses NativeKeyCode; no stable numeric is guaranteed here.
        PhysicalKey::Unidentified(_) => Key::Unknown(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::InputFrame;

    /// Runs deltas through `fold_pinch` and `InputState` as the runtime does.
    fn replay(steps: &[(f64, TouchPhase)]) -> Vec<PinchEvent> {
        let mut state = InputState::default();
        let mut frame = InputFrame::default();
        steps
            .iter()
            .map(|&(delta, phase)| {
                let ev = fold_pinch(state.pinch_scale, delta, phase);
                state.apply_event(&mut frame, InputEvent::Pinch(ev));
                ev
            })
            .collect()
    }

    #[test]
    fn pinch_deltas_accumulate_multiplicatively() {
        let events = replay(&[
            (0.0, TouchPhase::Started),
            (0.5, TouchPhase::Moved),
            (1.0, TouchPhase::Moved),
            (0.0, TouchPhase::Ended),
        ]);

        assert_eq!(events[0], PinchEvent { phase: PinchPhase::Began, scale: 1.0 });
        assert_eq!(events[1].scale, 1.5);
        assert_eq!(events[2].scale, 3.0);
        assert_eq!(events[3], PinchEvent { phase: PinchPhase::Ended, scale: 3.0 });
    }

    #[test]
    fn new_gesture_restarts_from_its_first_delta() {
        let events = replay(&[
            (0.0, TouchPhase::Started),
            (1.0, TouchPhase::Moved),
            (0.0, TouchPhase::Ended),
            (-0.5, TouchPhase::Started),
            (-0.5, TouchPhase::Moved),
        ]);

        assert_eq!(events[3].scale, 0.5);
        assert_eq!(events[4].scale, 0.25);
    }

    #[test]
    fn cancelled_gesture_ends_with_last_scale() {
        let events = replay(&[
            (0.0, TouchPhase::Started),
            (0.25, TouchPhase::Moved),
            (0.0, TouchPhase::Cancelled),
        ]);

        assert_eq!(events[2], PinchEvent { phase: PinchPhase::Ended, scale: 1.25 });
    }

    #[test]
    fn collapsing_delta_keeps_scale_positive() {
        let ev = fold_pinch(2.0, -1.5, TouchPhase::Moved);
        assert!(ev.scale > 0.0);
    }
}
