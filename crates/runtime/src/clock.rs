use foundation::time::Time;

/// Seconds elapsed since the last `restart`; feeds the ripple shader uniform.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ElapsedClock {
    started: Time,
}

impl ElapsedClock {
    pub fn starting_at(now: Time) -> Self {
        Self { started: now }
    }

    pub fn restart(&mut self, now: Time) {
        self.started = now;
    }

    pub fn elapsed(&self, now: Time) -> f64 {
        now.since(self.started).max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::ElapsedClock;
    use foundation::time::Time;

    #[test]
    fn restart_resets_elapsed() {
        let mut clock = ElapsedClock::starting_at(Time(1.0));
        assert_eq!(clock.elapsed(Time(3.0)), 2.0);
        clock.restart(Time(3.0));
        assert_eq!(clock.elapsed(Time(3.5)), 0.5);
        assert_eq!(clock.elapsed(Time(2.0)), 0.0);
    }
}
