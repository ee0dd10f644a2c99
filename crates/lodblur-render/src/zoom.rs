//! Pinch gesture to zoom factor.
//!
//! The zoom is `base * pinch`. A gesture in progress only touches `pinch`;
//! ending it folds `pinch` into `base`. After every update the product is
//! clamped to `[min, max]` by re-deriving `pinch`, so `base` only changes
//! when a gesture ends.

/// Lifecycle of a pinch gesture.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum GestureState {
    Began,
    Changed,
    Ended,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomConfig {
    pub min: f32,
    pub max: f32,
    pub initial_base: f32,
}

impl Default for ZoomConfig {
    fn default() -> Self {
        Self {
            min: 1.0,
            max: 100.0,
            initial_base: 2.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ZoomController {
    config: ZoomConfig,
    base: f32,
    pinch: f32,
}

impl ZoomController {
    pub fn new(config: ZoomConfig) -> Self {
        let mut zoom = Self {
            config,
            base: config.initial_base,
            pinch: 1.0,
        };
        zoom.constrain();
        zoom
    }

    /// Feeds one gesture update.
    ///
    /// `scale` is the gesture's absolute scale since it began. Changed sets
    /// `pinch = 1 / scale`; non-finite or non-positive scales are ignored.
    pub fn apply_pinch(&mut self, state: GestureState, scale: f32) {
        match state {
            GestureState::Began => {}
            GestureState::Changed => {
                if scale.is_finite() && scale > 0.0 {
                    self.pinch = 1.0 / scale;
                }
            }
            GestureState::Ended => {
                self.base *= self.pinch;
                self.pinch = 1.0;
            }
        }
        self.constrain();
    }

    fn constrain(&mut self) {
        let constrained = (self.base * self.pinch).clamp(self.config.min, self.config.max);
        self.pinch = constrained / self.base;
    }

    /// Current clamped zoom, used as the camera distance.
    pub fn zoom(&self) -> f32 {
        self.base * self.pinch
    }

    pub fn base(&self) -> f32 {
        self.base
    }

    pub fn pinch(&self) -> f32 {
        self.pinch
    }

    pub fn config(&self) -> ZoomConfig {
        self.config
    }

    /// Zoom mapped logarithmically onto `[0, 1]`: `min` is 0 and `max` is 1.
    pub fn normalized_detail(&self) -> f32 {
        let ZoomConfig { min, max, .. } = self.config;
        if max <= min {
            return 0.0;
        }
        ((self.zoom() / min).ln() / (max / min).ln()).clamp(0.0, 1.0)
    }

    pub fn reset(&mut self) {
        self.base = self.config.initial_base;
        self.pinch = 1.0;
        self.constrain();
    }
}

impl Default for ZoomController {
    fn default() -> Self {
        Self::new(ZoomConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() <= 1e-3 * a.abs().max(b.abs()).max(1.0)
    }

    #[test]
    fn pinch_within_bounds_is_unchanged() {
        let mut zoom = ZoomController::default();
        zoom.apply_pinch(GestureState::Changed, 0.5);
        assert_eq!(zoom.base(), 2.0);
        assert!(close(zoom.pinch(), 2.0));
        assert!(close(zoom.zoom(), 4.0));
    }

    #[test]
    fn pinch_past_max_is_clamped_without_touching_base() {
        let mut zoom = ZoomController::new(ZoomConfig {
            initial_base: 60.0,
            ..ZoomConfig::default()
        });
        zoom.apply_pinch(GestureState::Changed, 0.1);
        assert_eq!(zoom.base(), 60.0);
        assert!(close(zoom.pinch(), 100.0 / 60.0));
        assert!(close(zoom.zoom(), 100.0));
    }

    #[test]
    fn ending_folds_pinch_into_base() {
        let mut zoom = ZoomController::default();
        zoom.apply_pinch(GestureState::Began, 1.0);
        zoom.apply_pinch(GestureState::Changed, 0.25);
        zoom.apply_pinch(GestureState::Ended, 0.25);
        assert!(close(zoom.base(), 8.0));
        assert_eq!(zoom.pinch(), 1.0);
    }

    #[test]
    fn pinch_below_min_clamps_to_one() {
        let mut zoom = ZoomController::default();
        zoom.apply_pinch(GestureState::Changed, 10.0);
        assert!(close(zoom.zoom(), 1.0));
        zoom.apply_pinch(GestureState::Ended, 10.0);
        assert!(close(zoom.base(), 1.0));
    }

    #[test]
    fn degenerate_scales_are_ignored() {
        let mut zoom = ZoomController::default();
        zoom.apply_pinch(GestureState::Changed, 0.0);
        zoom.apply_pinch(GestureState::Changed, f32::NAN);
        zoom.apply_pinch(GestureState::Changed, -2.0);
        assert!(close(zoom.zoom(), 2.0));
    }

    #[test]
    fn normalized_detail_spans_unit_range() {
        let mut zoom = ZoomController::default();
        zoom.apply_pinch(GestureState::Changed, 100.0);
        assert_eq!(zoom.normalized_detail(), 0.0);
        zoom.apply_pinch(GestureState::Changed, 0.001);
        assert!(close(zoom.normalized_detail(), 1.0));
    }

    #[test]
    fn reset_restores_initial_zoom() {
        let mut zoom = ZoomController::default();
        zoom.apply_pinch(GestureState::Changed, 0.2);
        zoom.apply_pinch(GestureState::Ended, 0.2);
        zoom.reset();
        assert_eq!(zoom.zoom(), 2.0);
    }

    fn gesture() -> impl Strategy<Value = (GestureState, f32)> {
        (
            prop_oneof![
                Just(GestureState::Began),
                Just(GestureState::Changed),
                Just(GestureState::Ended),
            ],
            0.01f32..20.0,
        )
    }

    proptest! {
        #[test]
        fn zoom_stays_within_bounds(steps in prop::collection::vec(gesture(), 1..64)) {
            let mut zoom = ZoomController::default();
            for (state, scale) in steps {
                zoom.apply_pinch(state, scale);
                let z = zoom.zoom();
                prop_assert!((1.0 - 1e-3..=100.0 + 1e-2).contains(&z), "zoom {z}");
            }
        }

        #[test]
        fn ended_gesture_matches_clamped_product(base in 1.0f32..100.0, scale in 0.01f32..20.0) {
            let mut zoom = ZoomController::new(ZoomConfig { initial_base: base, ..ZoomConfig::default() });
            zoom.apply_pinch(GestureState::Changed, scale);
            zoom.apply_pinch(GestureState::Ended, scale);
            let expected = (base / scale).clamp(1.0, 100.0);
            prop_assert!(close(zoom.zoom(), expected));
            prop_assert!(close(zoom.pinch(), 1.0));
        }
    }
}
