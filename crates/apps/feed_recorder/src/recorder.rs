use markers::MarkerStore;
use telemetry::{FeedConfig, FeedFrame, FeedListener};
use tracing::{info, warn};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Progress {
    Continue,
    /// The location limit was reached.
    Done,
}

/// Feed listener plus the file it records locations into.
pub struct Recorder<S: MarkerStore> {
    listener: FeedListener,
    store: S,
    max_locations: Option<u64>,
    recorded: u64,
}

impl<S: MarkerStore> Recorder<S> {
    pub fn new(config: FeedConfig, store: S, max_locations: Option<u64>) -> Self {
        Self {
            listener: FeedListener::new(config),
            store,
            max_locations,
            recorded: 0,
        }
    }

    pub fn listener_mut(&mut self) -> &mut FeedListener {
        &mut self.listener
    }

    pub fn recorded(&self) -> u64 {
        self.recorded
    }

    fn is_done(&self) -> bool {
        self.max_locations.is_some_and(|max| self.recorded >= max)
    }

    /// Records every location in `frame`, up to the limit.
    pub fn on_frame(&mut self, frame: FeedFrame) -> Progress {
        for location in self.listener.on_frame(frame) {
            if self.is_done() {
                break;
            }
            info!(
                latitude = location.point.latitude(),
                longitude = location.point.longitude(),
                name = location.name.as_deref().unwrap_or("-"),
                "node located at {}",
                location.point
            );
            match self.store.append(location.point) {
                Ok(()) => self.recorded += 1,
                Err(err) => warn!("failed to persist location: {err}"),
            }
        }
        if self.is_done() {
            Progress::Done
        } else {
            Progress::Continue
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Progress, Recorder};
    use markers::{FileMarkerStore, MarkerStore};
    use pretty_assertions::assert_eq;
    use telemetry::{FeedConfig, FeedFrame};

    const TWO_NODES: &str = r#"[
        1, [7, "a", "b", "c", "d", "e", [51.5, -0.12, "London"]],
        5, [8, 35.68, 139.69, "Tokyo"]
    ]"#;

    fn coords(store: &FileMarkerStore) -> Vec<(f64, f64)> {
        store
            .load_all()
            .into_iter()
            .map(|p| (p.latitude(), p.longitude()))
            .collect()
    }

    #[test]
    fn records_locations_into_the_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("markers.json");
        let mut recorder = Recorder::new(FeedConfig::default(), FileMarkerStore::new(&path), None);

        let progress = recorder.on_frame(FeedFrame::Text(TWO_NODES.to_string()));

        assert_eq!(progress, Progress::Continue);
        assert_eq!(recorder.recorded(), 2);
        assert_eq!(
            coords(&FileMarkerStore::new(&path)),
            vec![(51.5, -0.12), (35.68, 139.69)]
        );
    }

    #[test]
    fn stops_at_the_location_limit() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("markers.json");
        let mut recorder =
            Recorder::new(FeedConfig::default(), FileMarkerStore::new(&path), Some(1));

        let progress = recorder.on_frame(FeedFrame::Text(TWO_NODES.to_string()));

        assert_eq!(progress, Progress::Done);
        assert_eq!(coords(&FileMarkerStore::new(&path)), vec![(51.5, -0.12)]);
    }

    #[test]
    fn failed_writes_are_not_counted() {
        let dir = tempfile::tempdir().expect("tempdir");
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "").expect("write");
        let store = FileMarkerStore::new(blocker.join("markers.json"));
        let mut recorder = Recorder::new(FeedConfig::default(), store, Some(1));

        let progress = recorder.on_frame(FeedFrame::Text(TWO_NODES.to_string()));

        assert_eq!(progress, Progress::Continue);
        assert_eq!(recorder.recorded(), 0);
    }

    #[test]
    fn undecodable_frames_record_nothing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("markers.json");
        let mut recorder = Recorder::new(FeedConfig::default(), FileMarkerStore::new(&path), None);

        let progress = recorder.on_frame(FeedFrame::Binary(vec![0xff, 0xfe]));

        assert_eq!(progress, Progress::Continue);
        assert_eq!(recorder.recorded(), 0);
        assert!(!path.exists());
    }
}
