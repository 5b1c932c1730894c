/// Orbit gestures longer than this are drags, not clicks.
pub const CLICK_MAX_GESTURE_S: f64 = 0.2;

/// Decides whether a `click` event that follows an orbit gesture selects a
/// point on the globe.
///
/// The browser delivers `click` after `pointerup`, so the gate remembers the
/// duration of the last finished gesture until the next one ends.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ClickGate {
    max_gesture_s: f64,
    dragged: bool,
}

impl Default for ClickGate {
    fn default() -> Self {
        Self::new(CLICK_MAX_GESTURE_S)
    }
}

impl ClickGate {
    pub fn new(max_gesture_s: f64) -> Self {
        Self {
            max_gesture_s,
            dragged: false,
        }
    }

    pub fn on_gesture_end(&mut self, duration_s: f64) {
        self.dragged = duration_s > self.max_gesture_s;
    }

    pub fn is_click_confirmed(&self) -> bool {
        !self.dragged
    }
}
