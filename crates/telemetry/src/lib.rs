//! Client side of the public node telemetry feed.
//!
//! This crate is transport-agnostic: the browser drives it from a `web_sys`
//! WebSocket and the recorder binary from `tokio-tungstenite`. It defines:
//! - Feed configuration and the subscription commands sent on open
//! - Frame decoding (text, or binary carrying UTF-8 JSON)
//! - The node-location extraction policy
//! - The reconnect policy and the listener's connection state machine

pub mod config;
pub mod extract;
pub mod frame;
pub mod listener;
pub mod reconnect;

pub use config::*;
pub use extract::*;
pub use frame::*;
pub use listener::*;
pub use reconnect::*;
