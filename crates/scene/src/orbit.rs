//! Orbit camera around the globe: fixed polar angle, auto-rotation, damped
//! horizontal drag. No zoom, no pan.

use std::f64::consts::PI;

use foundation::math::{OrthoCamera, Vec3};
use foundation::time::Time;

/// Orbit behavior; defaults reproduce the stock globe.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct OrbitConfig {
    /// Camera distance from the globe center.
    pub radius: f64,
    /// Angle from +Y, radians.
    pub polar_angle: f64,
    pub initial_azimuth: f64,
    /// Fraction of the pending rotation applied (and removed) per 60 Hz frame.
    pub damping: f64,
    /// Auto-rotation speed; 2.0 is one turn every 30 s.
    pub auto_rotate_speed: f64,
    pub auto_rotate: bool,
    pub rotate_speed: f64,
}

impl Default for OrbitConfig {
    fn default() -> Self {
        Self {
            radius: 1.1,
            polar_angle: 0.4 * PI,
            initial_azimuth: 0.0,
            damping: 0.05,
            auto_rotate_speed: 2.0,
            auto_rotate: true,
            rotate_speed: 1.0,
        }
    }
}

/// A finished pointer gesture on the orbit surface.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Gesture {
    pub duration_s: f64,
}

#[derive(Debug, Copy, Clone)]
struct Drag {
    started_at: Time,
    last_px: [f64; 2],
}

#[derive(Debug, Clone)]
pub struct OrbitController {
    config: OrbitConfig,
    azimuth: f64,
    /// Rotation still to be applied, radians.
    pending: f64,
    canvas_height: f64,
    drag: Option<Drag>,
}

impl Default for OrbitController {
    fn default() -> Self {
        Self::new(OrbitConfig::default())
    }
}

impl OrbitController {
    pub fn new(config: OrbitConfig) -> Self {
        Self {
            config,
            azimuth: config.initial_azimuth,
            pending: 0.0,
            canvas_height: 1.0,
            drag: None,
        }
    }

    pub fn config(&self) -> &OrbitConfig {
        &self.config
    }

    pub fn set_canvas_height(&mut self, height: f64) {
        self.canvas_height = height.max(1.0);
    }

    pub fn azimuth(&self) -> f64 {
        self.azimuth
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn on_pointer_down(&mut self, pos_px: [f64; 2], now: Time) {
        self.drag = Some(Drag {
            started_at: now,
            last_px: pos_px,
        });
    }

    pub fn on_pointer_move(&mut self, pos_px: [f64; 2]) {
        let Some(drag) = self.drag.as_mut() else {
            return;
        };
        let dx = pos_px[0] - drag.last_px[0];
        drag.last_px = pos_px;
        self.pending -= 2.0 * PI * dx / self.canvas_height * self.config.rotate_speed;
    }

    /// Ends the current drag, if any.
    pub fn on_pointer_up(&mut self, now: Time) -> Option<Gesture> {
        let drag = self.drag.take()?;
        Some(Gesture {
            duration_s: now.since(drag.started_at).max(0.0),
        })
    }

    /// Advances auto-rotation and damping by `dt` seconds.
    pub fn update(&mut self, dt: f64) {
        let frames = (dt * 60.0).max(0.0);
        if self.config.auto_rotate && self.drag.is_none() {
            let per_frame = 2.0 * PI / 60.0 / 60.0 * self.config.auto_rotate_speed;
            self.pending -= per_frame * frames;
        }
        let keep = (1.0 - self.config.damping).clamp(0.0, 1.0).powf(frames);
        self.azimuth += self.pending * (1.0 - keep);
        self.pending *= keep;
        self.azimuth = self.azimuth.rem_euclid(2.0 * PI);
    }

    pub fn eye(&self) -> Vec3 {
        let r = self.config.radius;
        let phi = self.config.polar_angle;
        let theta = self.azimuth;
        Vec3::new(
            r * phi.sin() * theta.sin(),
            r * phi.cos(),
            r * phi.sin() * theta.cos(),
        )
    }

    pub fn camera(&self) -> OrthoCamera {
        OrthoCamera::looking_at(self.eye(), Vec3::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::{OrbitConfig, OrbitController};
    use foundation::time::Time;
    use std::f64::consts::PI;

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    fn still() -> OrbitConfig {
        OrbitConfig {
            auto_rotate: false,
            ..OrbitConfig::default()
        }
    }

    #[test]
    fn eye_keeps_radius_and_polar_angle() {
        let orbit = OrbitController::default();
        let eye = orbit.eye();
        assert_close(eye.length(), 1.1, 1e-12);
        assert_close((eye.y / 1.1).acos(), 0.4 * PI, 1e-12);
    }

    #[test]
    fn auto_rotation_turns_once_in_thirty_seconds() {
        let mut orbit = OrbitController::default();
        let mut travelled = 0.0;
        let mut last = orbit.azimuth();
        for _ in 0..(60 * 30 + 600) {
            orbit.update(1.0 / 60.0);
            let a = orbit.azimuth();
            let mut step = last - a;
            if step < 0.0 {
                step += 2.0 * PI;
            }
            travelled += step;
            last = a;
        }
        // Damping delays the start; steady state is one turn per 30 s.
        assert!(travelled > 2.0 * PI * 1.0 && travelled < 2.0 * PI * 1.4);
    }

    #[test]
    fn drag_rotation_is_fully_applied_after_damping() {
        let mut orbit = OrbitController::new(still());
        orbit.set_canvas_height(500.0);
        orbit.on_pointer_down([100.0, 100.0], Time(0.0));
        orbit.on_pointer_move([225.0, 180.0]);
        orbit.on_pointer_up(Time(0.1));
        for _ in 0..2000 {
            orbit.update(1.0 / 60.0);
        }
        // dx = 125 px on a 500 px canvas is a quarter turn.
        assert_close(orbit.azimuth(), 1.5 * PI, 1e-6);
    }

    #[test]
    fn pointer_up_reports_gesture() {
        let mut orbit = OrbitController::new(still());
        assert!(orbit.on_pointer_up(Time(1.0)).is_none());
        orbit.on_pointer_down([0.0, 0.0], Time(1.0));
        assert!(orbit.is_dragging());
        orbit.on_pointer_move([3.0, 4.0]);
        let g = orbit.on_pointer_up(Time(1.25)).expect("gesture");
        assert_close(g.duration_s, 0.25, 1e-12);
        assert!(!orbit.is_dragging());
    }

    #[test]
    fn move_without_press_is_ignored() {
        let mut orbit = OrbitController::new(still());
        orbit.on_pointer_move([400.0, 0.0]);
        orbit.update(1.0);
        assert_eq!(orbit.azimuth(), 0.0);
    }
}
