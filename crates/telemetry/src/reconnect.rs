use std::time::Duration;

use serde::{Deserialize, Serialize};

/// What to do after the feed connection drops or fails to open.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ReconnectPolicy {
    /// Stay disconnected.
    Never,
    /// Retry after `initial_ms`, multiplying the delay by `factor` per failed
    /// attempt up to `max_ms`. `max_attempts: None` retries forever.
    Backoff {
        initial_ms: u64,
        max_ms: u64,
        factor: f64,
        max_attempts: Option<u32>,
    },
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        ReconnectPolicy::Backoff {
            initial_ms: 1_000,
            max_ms: 30_000,
            factor: 2.0,
            max_attempts: None,
        }
    }
}

impl ReconnectPolicy {
    /// Delay before retry number `attempt` (0-based), or `None` to give up.
    pub fn delay_for(&self, attempt: u32) -> Option<Duration> {
        match *self {
            ReconnectPolicy::Never => None,
            ReconnectPolicy::Backoff {
                initial_ms,
                max_ms,
                factor,
                max_attempts,
            } => {
                if max_attempts.is_some_and(|max| attempt >= max) {
                    return None;
                }
                let factor = if factor.is_finite() { factor.max(1.0) } else { 1.0 };
                let exponent = attempt.min(64) as i32;
                let ms = (initial_ms as f64 * factor.powi(exponent)).min(max_ms as f64);
                Some(Duration::from_millis(ms.max(0.0) as u64))
            }
        }
    }
}

/// Counts consecutive failed attempts against a [`ReconnectPolicy`].
#[derive(Debug, Clone, PartialEq)]
pub struct Backoff {
    policy: ReconnectPolicy,
    attempt: u32,
}

impl Backoff {
    pub fn new(policy: ReconnectPolicy) -> Self {
        Self { policy, attempt: 0 }
    }

    pub fn policy(&self) -> &ReconnectPolicy {
        &self.policy
    }

    pub fn attempts(&self) -> u32 {
        self.attempt
    }

    /// Delay before the next attempt; consumes one attempt.
    pub fn next_delay(&mut self) -> Option<Duration> {
        let delay = self.policy.delay_for(self.attempt)?;
        self.attempt = self.attempt.saturating_add(1);
        Some(delay)
    }

    /// Called once a connection opens.
    pub fn reset(&mut self) {
        self.attempt = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::{Backoff, ReconnectPolicy};
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn ms(v: u64) -> Option<Duration> {
        Some(Duration::from_millis(v))
    }

    #[test]
    fn default_doubles_up_to_the_cap() {
        let mut backoff = Backoff::new(ReconnectPolicy::default());
        let delays: Vec<_> = (0..7).map(|_| backoff.next_delay()).collect();
        assert_eq!(
            delays,
            vec![ms(1_000), ms(2_000), ms(4_000), ms(8_000), ms(16_000), ms(30_000), ms(30_000)]
        );
    }

    #[test]
    fn never_gives_up_immediately() {
        let mut backoff = Backoff::new(ReconnectPolicy::Never);
        assert_eq!(backoff.next_delay(), None);
    }

    #[test]
    fn attempt_limit_is_honored() {
        let mut backoff = Backoff::new(ReconnectPolicy::Backoff {
            initial_ms: 100,
            max_ms: 1_000,
            factor: 3.0,
            max_attempts: Some(2),
        });
        assert_eq!(backoff.next_delay(), ms(100));
        assert_eq!(backoff.next_delay(), ms(300));
        assert_eq!(backoff.next_delay(), None);
        assert_eq!(backoff.attempts(), 2);
    }

    #[test]
    fn reset_after_success_starts_over() {
        let mut backoff = Backoff::new(ReconnectPolicy::default());
        backoff.next_delay();
        backoff.next_delay();
        backoff.reset();
        assert_eq!(backoff.next_delay(), ms(1_000));
    }

    #[test]
    fn huge_attempt_counts_stay_capped() {
        let policy = ReconnectPolicy::default();
        assert_eq!(policy.delay_for(10_000), ms(30_000));
    }

    #[test]
    fn policy_serializes_with_a_mode_tag() {
        let json = serde_json::to_string(&ReconnectPolicy::default()).expect("json");
        assert_eq!(
            json,
            r#"{"mode":"backoff","initial_ms":1000,"max_ms":30000,"factor":2.0,"max_attempts":null}"#
        );
    }
}
