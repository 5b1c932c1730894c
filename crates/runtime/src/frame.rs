use foundation::time::Time;

/// Largest step handed to animations after a stall (tab in background, debugger).
pub const MAX_FRAME_DT_S: f64 = 0.1;

/// Per-frame timing handed to every system updated from the render loop.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Frame {
    /// 0-based frame index.
    pub index: u64,
    /// Seconds since the previous frame, clamped to `[0, MAX_FRAME_DT_S]`.
    pub dt_s: f64,
    /// Wall-clock time at the start of the frame.
    pub time: Time,
}

/// Turns the timestamps `requestAnimationFrame` hands out into [`Frame`]s.
#[derive(Debug, Default)]
pub struct FrameClock {
    next_index: u64,
    last: Option<Time>,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tick(&mut self, now_ms: f64) -> Frame {
        let time = Time(now_ms / 1000.0);
        let dt_s = match self.last {
            Some(prev) => time.since(prev).clamp(0.0, MAX_FRAME_DT_S),
            None => 0.0,
        };
        self.last = Some(time);
        let index = self.next_index;
        self.next_index = self.next_index.wrapping_add(1);
        Frame { index, dt_s, time }
    }
}

#[cfg(test)]
mod tests {
    use super::{FrameClock, MAX_FRAME_DT_S};
    use foundation::time::Time;

    #[test]
    fn first_frame_has_zero_dt() {
        let mut clock = FrameClock::new();
        let f = clock.tick(1000.0);
        assert_eq!(f.index, 0);
        assert_eq!(f.dt_s, 0.0);
        assert_eq!(f.time, Time(1.0));
    }

    #[test]
    fn dt_follows_timestamps() {
        let mut clock = FrameClock::new();
        clock.tick(0.0);
        let f = clock.tick(16.0);
        assert_eq!(f.index, 1);
        assert!((f.dt_s - 0.016).abs() < 1e-12);
    }

    #[test]
    fn stalls_and_clock_skew_are_clamped() {
        let mut clock = FrameClock::new();
        clock.tick(0.0);
        assert_eq!(clock.tick(5_000.0).dt_s, MAX_FRAME_DT_S);
        assert_eq!(clock.tick(4_000.0).dt_s, 0.0);
    }
}
