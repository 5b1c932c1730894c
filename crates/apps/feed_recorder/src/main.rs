//! Records telemetry feed node locations into a marker file.
//!
//! The file uses the same JSON list the globe keeps in local storage, so a
//! recording can seed a page's markers.

mod recorder;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use futures_util::{SinkExt, StreamExt};
use markers::FileMarkerStore;
use recorder::{Progress, Recorder};
use telemetry::{
    DEFAULT_FEED_ENDPOINT, DEFAULT_GENESIS_HASH, FeedConfig, FeedFrame, ReconnectPolicy,
};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Record telemetry feed node locations to a marker file")]
struct RecorderArgs {
    /// Feed WebSocket endpoint.
    #[arg(long, default_value = DEFAULT_FEED_ENDPOINT)]
    endpoint: String,

    /// Genesis hash of the chain to subscribe to.
    #[arg(long, default_value = DEFAULT_GENESIS_HASH)]
    chain: String,

    /// Marker file; created on the first location.
    #[arg(long, default_value = "markers.json")]
    store: PathBuf,

    /// Stop after recording this many locations.
    #[arg(long)]
    max_locations: Option<u64>,

    /// Exit when the connection drops instead of dialling again.
    #[arg(long, default_value_t = false)]
    no_reconnect: bool,

    /// First reconnect delay in milliseconds.
    #[arg(long, default_value_t = 1000)]
    backoff_initial_ms: u64,

    /// Upper bound on the reconnect delay in milliseconds.
    #[arg(long, default_value_t = 30_000)]
    backoff_max_ms: u64,
}

impl RecorderArgs {
    fn feed_config(&self) -> Result<FeedConfig, String> {
        if self.endpoint.is_empty() {
            return Err("endpoint must not be empty".to_string());
        }
        if self.chain.is_empty() {
            return Err("chain must not be empty".to_string());
        }
        if self.backoff_initial_ms > self.backoff_max_ms {
            return Err(format!(
                "backoff-initial-ms ({}) exceeds backoff-max-ms ({})",
                self.backoff_initial_ms, self.backoff_max_ms
            ));
        }

        let reconnect = if self.no_reconnect {
            ReconnectPolicy::Never
        } else {
            ReconnectPolicy::Backoff {
                initial_ms: self.backoff_initial_ms,
                max_ms: self.backoff_max_ms,
                factor: 2.0,
                max_attempts: None,
            }
        };
        Ok(FeedConfig {
            endpoint: self.endpoint.clone(),
            genesis_hash: self.chain.clone(),
            reconnect,
        })
    }
}

enum SessionEnd {
    Closed,
    LimitReached,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = RecorderArgs::parse();
    let config = match args.feed_config() {
        Ok(config) => config,
        Err(err) => {
            error!("invalid arguments: {err}");
            return ExitCode::FAILURE;
        }
    };
    if args.store.is_dir() {
        error!("store path {} is a directory", args.store.display());
        return ExitCode::FAILURE;
    }

    let mut recorder = Recorder::new(
        config,
        FileMarkerStore::new(&args.store),
        args.max_locations,
    );
    info!(
        "recording node locations of chain {} to {}",
        args.chain,
        args.store.display()
    );

    tokio::select! {
        _ = run(&mut recorder) => {}
        _ = tokio::signal::ctrl_c() => info!("interrupted"),
    }

    let stats = recorder.listener_mut().stats();
    info!(
        recorded = recorder.recorded(),
        frames = stats.frames,
        dropped_frames = stats.dropped_frames,
        connections = stats.connections,
        "recorder stopped"
    );
    ExitCode::SUCCESS
}

async fn run(recorder: &mut Recorder<FileMarkerStore>) {
    loop {
        let Some(endpoint) = recorder.listener_mut().begin_connect().map(str::to_string) else {
            return;
        };

        match session(&endpoint, recorder).await {
            Ok(SessionEnd::LimitReached) => {
                recorder.listener_mut().stop();
                return;
            }
            Ok(SessionEnd::Closed) => info!("feed closed"),
            Err(err) => warn!("feed connection failed: {err}"),
        }

        match recorder.listener_mut().on_close() {
            Some(delay) => {
                info!("reconnecting in {delay:?}");
                tokio::time::sleep(delay).await;
            }
            None => return,
        }
    }
}

async fn session(
    endpoint: &str,
    recorder: &mut Recorder<FileMarkerStore>,
) -> Result<SessionEnd, tokio_tungstenite::tungstenite::Error> {
    let (ws_stream, _) = connect_async(endpoint).await?;
    info!("connected to {endpoint}");
    let (mut write, mut read) = ws_stream.split();

    for command in recorder.listener_mut().on_open() {
        write.send(Message::Text(command.into())).await?;
    }

    while let Some(msg) = read.next().await {
        let frame = match msg? {
            Message::Text(text) => FeedFrame::Text(text.to_string()),
            Message::Binary(bytes) => FeedFrame::Binary(bytes.to_vec()),
            Message::Close(_) => break,
            _ => continue,
        };
        if recorder.on_frame(frame) == Progress::Done {
            let _ = write.close().await;
            return Ok(SessionEnd::LimitReached);
        }
    }
    Ok(SessionEnd::Closed)
}

#[cfg(test)]
mod tests {
    use super::RecorderArgs;
    use clap::Parser;
    use pretty_assertions::assert_eq;
    use telemetry::{DEFAULT_FEED_ENDPOINT, DEFAULT_GENESIS_HASH, ReconnectPolicy};

    #[test]
    fn defaults_map_to_the_public_feed_with_backoff() {
        let args = RecorderArgs::try_parse_from(["feed-recorder"]).expect("parse");
        let config = args.feed_config().expect("config");
        assert_eq!(config.endpoint, DEFAULT_FEED_ENDPOINT);
        assert_eq!(config.genesis_hash, DEFAULT_GENESIS_HASH);
        assert_eq!(config.reconnect, ReconnectPolicy::default());
        assert_eq!(args.store.to_str(), Some("markers.json"));
        assert_eq!(args.max_locations, None);
    }

    #[test]
    fn no_reconnect_disables_the_policy() {
        let args = RecorderArgs::try_parse_from([
            "feed-recorder",
            "--no-reconnect",
            "--chain",
            "0xabc",
            "--max-locations",
            "10",
        ])
        .expect("parse");
        let config = args.feed_config().expect("config");
        assert_eq!(config.reconnect, ReconnectPolicy::Never);
        assert_eq!(config.genesis_hash, "0xabc");
        assert_eq!(args.max_locations, Some(10));
    }

    #[test]
    fn backoff_bounds_are_passed_through() {
        let args = RecorderArgs::try_parse_from([
            "feed-recorder",
            "--backoff-initial-ms",
            "250",
            "--backoff-max-ms",
            "4000",
        ])
        .expect("parse");
        assert_eq!(
            args.feed_config().expect("config").reconnect,
            ReconnectPolicy::Backoff {
                initial_ms: 250,
                max_ms: 4000,
                factor: 2.0,
                max_attempts: None,
            }
        );
    }

    #[test]
    fn inverted_backoff_bounds_are_rejected() {
        let args = RecorderArgs::try_parse_from([
            "feed-recorder",
            "--backoff-initial-ms",
            "5000",
            "--backoff-max-ms",
            "100",
        ])
        .expect("parse");
        assert!(args.feed_config().is_err());
    }
}
