//! Turns mouse-wheel motion into pinch gestures for desktops without a
//! trackpad.

use std::time::{Duration, Instant};

use lodblur_render::GestureState;

/// Scale change per wheel line.
const STEP_PER_LINE: f32 = 1.1;

/// A synthesized gesture ends once the wheel has been idle this long.
const IDLE_END: Duration = Duration::from_millis(150);

#[derive(Debug, Default)]
pub struct WheelPinch {
    active: bool,
    scale: f32,
    last_motion: Option<Instant>,
}

impl WheelPinch {
    /// Feeds one frame's wheel motion. Scrolling up zooms in.
    pub fn feed(&mut self, lines: f32, now: Instant) -> Vec<(GestureState, f32)> {
        let mut out = Vec::new();

        if lines != 0.0 && lines.is_finite() {
            if !self.active {
                self.active = true;
                self.scale = 1.0;
                out.push((GestureState::Began, self.scale));
            }
            self.scale *= STEP_PER_LINE.powf(lines);
            self.last_motion = Some(now);
            out.push((GestureState::Changed, self.scale));
        } else if self.active
            && self
                .last_motion
                .is_some_and(|t| now.saturating_duration_since(t) >= IDLE_END)
        {
            self.active = false;
            out.push((GestureState::Ended, self.scale));
        }

        out
    }

    pub fn is_active(&self) -> bool {
        self.active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wheel_notch_begins_and_changes() {
        let mut wheel = WheelPinch::default();
        let events = wheel.feed(1.0, Instant::now());
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], (GestureState::Began, 1.0));
        assert_eq!(events[1].0, GestureState::Changed);
        assert!((events[1].1 - 1.1).abs() < 1e-6);
    }

    #[test]
    fn scale_accumulates_within_a_gesture() {
        let mut wheel = WheelPinch::default();
        let t0 = Instant::now();
        wheel.feed(1.0, t0);
        let events = wheel.feed(-2.0, t0 + Duration::from_millis(16));
        assert_eq!(events.len(), 1);
        assert!((events[0].1 - 1.1f32.powf(-1.0)).abs() < 1e-5);
    }

    #[test]
    fn idle_wheel_ends_the_gesture() {
        let mut wheel = WheelPinch::default();
        let t0 = Instant::now();
        wheel.feed(1.0, t0);
        assert!(wheel.feed(0.0, t0 + Duration::from_millis(50)).is_empty());

        let events = wheel.feed(0.0, t0 + Duration::from_millis(200));
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].0, GestureState::Ended);
        assert!(!wheel.is_active());
    }

    #[test]
    fn no_motion_no_events() {
        let mut wheel = WheelPinch::default();
        assert!(wheel.feed(0.0, Instant::now()).is_empty());
    }
}
