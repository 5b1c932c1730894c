/// Seconds on some monotonic timebase.
#[derive(Copy, Clone, Debug, PartialEq, PartialOrd, Default)]
pub struct Time(pub f64);

impl Time {
    pub fn since(self, earlier: Time) -> f64 {
        self.0 - earlier.0
    }
}

/// Easing curves used by the popup and pointer animations.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum Easing {
    Linear,
    /// `1 - (1-t)^2`
    #[default]
    Power1Out,
    /// `1 - (1-t)^4`
    Power3Out,
}

impl Easing {
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::Power1Out => 1.0 - (1.0 - t).powi(2),
            Easing::Power3Out => 1.0 - (1.0 - t).powi(4),
        }
    }
}

/// One scalar animated from `from` to `to`, starting `delay` seconds into a
/// timeline and lasting `duration` seconds.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Tween {
    pub from: f64,
    pub to: f64,
    pub delay: f64,
    pub duration: f64,
    pub easing: Easing,
}

impl Tween {
    pub fn new(from: f64, to: f64, delay: f64, duration: f64) -> Self {
        Self {
            from,
            to,
            delay,
            duration,
            easing: Easing::default(),
        }
    }

    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    pub fn end(&self) -> f64 {
        self.delay + self.duration
    }

    /// Value at `elapsed` seconds into the timeline. Holds `from` before the
    /// delay and `to` after the end.
    pub fn value_at(&self, elapsed: f64) -> f64 {
        if elapsed <= self.delay {
            return self.from;
        }
        if self.duration <= 0.0 || elapsed >= self.end() {
            return self.to;
        }
        let t = self.easing.apply((elapsed - self.delay) / self.duration);
        self.from + (self.to - self.from) * t
    }
}

#[cfg(test)]
mod tests {
    use super::{Easing, Time, Tween};

    #[test]
    fn easings_hit_endpoints() {
        for easing in [Easing::Linear, Easing::Power1Out, Easing::Power3Out] {
            assert_eq!(easing.apply(0.0), 0.0);
            assert_eq!(easing.apply(1.0), 1.0);
            assert_eq!(easing.apply(2.0), 1.0);
        }
    }

    #[test]
    fn power3_out_front_loads() {
        assert!(Easing::Power3Out.apply(0.25) > Easing::Power1Out.apply(0.25));
        assert!(Easing::Power1Out.apply(0.25) > Easing::Linear.apply(0.25));
    }

    #[test]
    fn tween_holds_outside_its_window() {
        let t = Tween::new(0.0, 1.0, 0.15, 0.3);
        assert_eq!(t.value_at(0.0), 0.0);
        assert_eq!(t.value_at(0.15), 0.0);
        assert_eq!(t.value_at(0.45), 1.0);
        assert_eq!(t.value_at(10.0), 1.0);
        let mid = t.with_easing(Easing::Linear).value_at(0.3);
        assert!((mid - 0.5).abs() < 1e-12);
    }

    #[test]
    fn zero_duration_jumps() {
        let t = Tween::new(0.2, 0.7, 0.0, 0.0);
        assert_eq!(t.value_at(0.01), 0.7);
    }

    #[test]
    fn time_since() {
        assert_eq!(Time(2.5).since(Time(1.0)), 1.5);
    }
}
