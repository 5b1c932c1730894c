use std::time::Duration;

use tracing::{debug, info, warn};

use crate::{Backoff, FeedConfig, FeedFrame, Location, extract_locations};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    /// Not connected yet.
    Idle,
    Connecting,
    Open,
    /// Disconnected, waiting out a reconnect delay.
    Waiting,
    /// Disconnected for good.
    Stopped,
}

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct FeedStats {
    pub frames: u64,
    pub dropped_frames: u64,
    pub locations: u64,
    pub connections: u64,
}

/// Connection lifecycle and message handling for the telemetry feed.
///
/// The owner performs the I/O and reports each event; the listener answers
/// with what to send, which locations to plot and when to reconnect.
#[derive(Debug, Clone)]
pub struct FeedListener {
    config: FeedConfig,
    state: ConnectionState,
    backoff: Backoff,
    stats: FeedStats,
}

impl FeedListener {
    pub fn new(config: FeedConfig) -> Self {
        let backoff = Backoff::new(config.reconnect);
        Self {
            config,
            state: ConnectionState::Idle,
            backoff,
            stats: FeedStats::default(),
        }
    }

    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn stats(&self) -> FeedStats {
        self.stats
    }

    /// Marks a dial attempt and returns the endpoint to dial, unless the
    /// listener is already connected or stopped.
    pub fn begin_connect(&mut self) -> Option<&str> {
        match self.state {
            ConnectionState::Idle | ConnectionState::Waiting => {
                self.state = ConnectionState::Connecting;
                debug!("connecting to {}", self.config.endpoint);
                Some(&self.config.endpoint)
            }
            ConnectionState::Connecting | ConnectionState::Open | ConnectionState::Stopped => None,
        }
    }

    /// The socket opened; returns the subscription commands to send.
    pub fn on_open(&mut self) -> [String; 2] {
        self.state = ConnectionState::Open;
        self.backoff.reset();
        self.stats.connections += 1;
        info!("telemetry feed connected: {}", self.config.endpoint);
        self.config.subscription_commands()
    }

    /// Decodes one inbound frame. Undecodable frames are logged and dropped;
    /// the connection stays open.
    pub fn on_frame(&mut self, frame: FeedFrame) -> Vec<Location> {
        self.stats.frames += 1;
        match frame.decode() {
            Ok(message) => {
                let locations = extract_locations(&message);
                self.stats.locations += locations.len() as u64;
                locations
            }
            Err(err) => {
                self.stats.dropped_frames += 1;
                warn!("dropping feed message: {err}");
                Vec::new()
            }
        }
    }

    /// The socket closed or failed to open. Returns the delay before the next
    /// `begin_connect`, or `None` when the listener has stopped.
    pub fn on_close(&mut self) -> Option<Duration> {
        if self.state == ConnectionState::Stopped {
            return None;
        }
        match self.backoff.next_delay() {
            Some(delay) => {
                self.state = ConnectionState::Waiting;
                info!(
                    "telemetry feed disconnected; retry {} in {:?}",
                    self.backoff.attempts(),
                    delay
                );
                Some(delay)
            }
            None => {
                self.state = ConnectionState::Stopped;
                warn!("telemetry feed disconnected; not reconnecting");
                None
            }
        }
    }

    pub fn stop(&mut self) {
        self.state = ConnectionState::Stopped;
    }
}

#[cfg(test)]
mod tests {
    use super::{ConnectionState, FeedListener, FeedStats};
    use crate::{FeedConfig, FeedFrame, ReconnectPolicy};
    use foundation::math::GeoPoint;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn listener(policy: ReconnectPolicy) -> FeedListener {
        FeedListener::new(FeedConfig {
            reconnect: policy,
            ..FeedConfig::default()
        })
    }

    #[test]
    fn open_sends_both_subscriptions() {
        let mut l = listener(ReconnectPolicy::Never);
        assert_eq!(l.begin_connect(), Some("wss://feed.telemetry.polkadot.io/feed"));
        assert_eq!(l.begin_connect(), None);
        let commands = l.on_open();
        assert!(commands[0].starts_with("subscribe:0x05d5"));
        assert!(commands[1].starts_with("send-finality:0x05d5"));
        assert_eq!(l.state(), ConnectionState::Open);
    }

    #[test]
    fn frames_yield_locations_and_bad_frames_are_dropped() {
        let mut l = listener(ReconnectPolicy::Never);
        l.begin_connect();
        l.on_open();

        let text = r#"[0,1,2,3,4,[0,1,2,3,4,5,[51.5,-0.12]]]"#;
        let found = l.on_frame(FeedFrame::Binary(text.as_bytes().to_vec()));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].point, GeoPoint::new(51.5, -0.12).expect("valid"));

        assert!(l.on_frame(FeedFrame::Text("not json".to_string())).is_empty());
        assert_eq!(l.state(), ConnectionState::Open);
        assert_eq!(
            l.stats(),
            FeedStats {
                frames: 2,
                dropped_frames: 1,
                locations: 1,
                connections: 1,
            }
        );
    }

    #[test]
    fn never_policy_stops_after_close() {
        let mut l = listener(ReconnectPolicy::Never);
        l.begin_connect();
        l.on_open();
        assert_eq!(l.on_close(), None);
        assert_eq!(l.state(), ConnectionState::Stopped);
        assert_eq!(l.begin_connect(), None);
    }

    #[test]
    fn backoff_grows_until_a_connection_succeeds() {
        let mut l = listener(ReconnectPolicy::default());
        l.begin_connect();
        assert_eq!(l.on_close(), Some(Duration::from_secs(1)));
        assert_eq!(l.state(), ConnectionState::Waiting);
        assert!(l.begin_connect().is_some());
        assert_eq!(l.on_close(), Some(Duration::from_secs(2)));
        l.begin_connect();
        l.on_open();
        assert_eq!(l.on_close(), Some(Duration::from_secs(1)));
    }

    #[test]
    fn stop_is_final() {
        let mut l = listener(ReconnectPolicy::default());
        l.stop();
        assert_eq!(l.on_close(), None);
        assert_eq!(l.begin_connect(), None);
    }
}
