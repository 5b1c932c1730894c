use serde::{Deserialize, Serialize};

use crate::ReconnectPolicy;

pub const DEFAULT_FEED_ENDPOINT: &str = "wss://feed.telemetry.polkadot.io/feed";

/// Genesis hash of the chain whose nodes are plotted by default.
pub const DEFAULT_GENESIS_HASH: &str =
    "0x05d5279c52c484cc80396535a316add7d47b1c5b9e0398dd1f584149341460c5";

/// Where to connect and what to subscribe to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub endpoint: String,
    pub genesis_hash: String,
    pub reconnect: ReconnectPolicy,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_FEED_ENDPOINT.to_string(),
            genesis_hash: DEFAULT_GENESIS_HASH.to_string(),
            reconnect: ReconnectPolicy::default(),
        }
    }
}

impl FeedConfig {
    /// Text commands sent, in order, as soon as the socket opens.
    pub fn subscription_commands(&self) -> [String; 2] {
        [
            format!("subscribe:{}", self.genesis_hash),
            format!("send-finality:{}", self.genesis_hash),
        ]
    }
}
