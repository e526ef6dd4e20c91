//! Input normalizer: wheel and two-axis drag fused into one signed delta
//! on the carousel's target position.

/// Tunables for [`InputNormalizer`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InputConfig {
    /// Target units per wheel px.
    pub wheel_sensitivity: f64,
    /// Target units per dragged px.
    pub touch_sensitivity: f64,
    /// Displacement (either axis) after which a drag counts as a scroll
    /// gesture and suppresses tap handling on release.
    pub gesture_threshold_px: f64,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            wheel_sensitivity: 0.01,
            touch_sensitivity: 0.02,
            gesture_threshold_px: 5.0,
        }
    }
}

/// What a finished drag looked like.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DragRelease {
    /// The pointer moved past the gesture threshold at some point.
    pub was_gesture: bool,
}

#[derive(Debug, Clone, Copy)]
struct DragTrack {
    start: (f64, f64),
    last: (f64, f64),
    gesture: bool,
}

/// Stateful normalizer for one pointer.
#[derive(Debug, Clone, Default)]
pub struct InputNormalizer {
    config: InputConfig,
    drag: Option<DragTrack>,
}

impl InputNormalizer {
    pub fn new(config: InputConfig) -> Self {
        Self { config, drag: None }
    }

    /// Target delta for one wheel event.  Positive `delta_y` (wheel down)
    /// moves the target backwards.
    pub fn wheel(&self, delta_y: f64) -> f64 {
        if !delta_y.is_finite() {
            return 0.0;
        }
        -delta_y * self.config.wheel_sensitivity
    }

    /// Start tracking a drag at `(x, y)` px.  Replaces any drag in flight.
    pub fn begin(&mut self, x: f64, y: f64) {
        self.drag = Some(DragTrack {
            start: (x, y),
            last: (x, y),
            gesture: false,
        });
    }

    /// Feed a move.  Returns the target delta for this move (0 when no drag
    /// is in flight).  Upward and rightward movement both push the target the
    /// same way.
    pub fn move_to(&mut self, x: f64, y: f64) -> f64 {
        if !x.is_finite() || !y.is_finite() {
            return 0.0;
        }
        let threshold = self.config.gesture_threshold_px;
        let Some(drag) = self.drag.as_mut() else {
            return 0.0;
        };
        let dx = x - drag.last.0;
        let dy = y - drag.last.1;
        drag.last = (x, y);
        if (x - drag.start.0).abs() > threshold || (y - drag.start.1).abs() > threshold {
            drag.gesture = true;
        }
        (dy - dx) * self.config.touch_sensitivity
    }

    /// Finish the drag in flight.
    pub fn end(&mut self) -> DragRelease {
        DragRelease {
            was_gesture: self.drag.take().is_some_and(|d| d.gesture),
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Has the drag in flight crossed the gesture threshold?
    pub fn is_gesture(&self) -> bool {
        self.drag.is_some_and(|d| d.gesture)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wheel_down_moves_target_back() {
        let n = InputNormalizer::default();
        assert_eq!(n.wheel(100.0), -1.0);
        assert_eq!(n.wheel(-50.0), 0.5);
        assert_eq!(n.wheel(f64::NAN), 0.0);
    }

    #[test]
    fn upward_and_rightward_drag_agree() {
        let mut n = InputNormalizer::default();
        n.begin(0.0, 0.0);
        let up = n.move_to(0.0, -10.0);
        n.begin(0.0, 0.0);
        let right = n.move_to(10.0, 0.0);
        assert!(up < 0.0);
        assert_eq!(up, right);
        assert!((up + 0.2).abs() < 1e-12);
    }

    #[test]
    fn small_jitter_is_still_a_tap() {
        let mut n = InputNormalizer::default();
        n.begin(100.0, 100.0);
        n.move_to(103.0, 98.0);
        n.move_to(105.0, 100.0);
        assert!(!n.is_gesture());
        assert_eq!(n.end(), DragRelease { was_gesture: false });
    }

    #[test]
    fn crossing_threshold_flags_gesture_even_if_returning() {
        let mut n = InputNormalizer::default();
        n.begin(0.0, 0.0);
        n.move_to(0.0, 6.0);
        n.move_to(0.0, 0.0);
        assert!(n.end().was_gesture);
        assert!(!n.is_dragging());
    }

    #[test]
    fn move_without_drag_is_ignored() {
        let mut n = InputNormalizer::default();
        assert_eq!(n.move_to(10.0, 10.0), 0.0);
        assert!(!n.end().was_gesture);
    }
}
