//! Append-only list of globe markers persisted as one JSON array under one key.

use foundation::math::GeoPoint;
use tracing::warn;

mod file;

pub use file::FileMarkerStore;

/// Storage key (or file stem) holding the marker list.
pub const DEFAULT_MARKERS_KEY: &str = "markers";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkerStoreError {
    StorageUnavailable,
    Corrupt(String),
    Io(String),
}

impl std::fmt::Display for MarkerStoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MarkerStoreError::StorageUnavailable => write!(f, "marker storage unavailable"),
            MarkerStoreError::Corrupt(msg) => write!(f, "marker storage corrupt: {msg}"),
            MarkerStoreError::Io(msg) => write!(f, "marker storage error: {msg}"),
        }
    }
}

impl std::error::Error for MarkerStoreError {}

/// Result of decoding a stored marker list.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct MarkerList {
    pub points: Vec<GeoPoint>,
    /// Entries that were not `{latitude, longitude}` objects in range.
    pub skipped: usize,
}

/// Decodes a stored list. Blank input is an empty list; anything that is not
/// a JSON array is `Corrupt`; bad entries are skipped and counted.
pub fn parse_marker_list(raw: &str) -> Result<MarkerList, MarkerStoreError> {
    if raw.trim().is_empty() {
        return Ok(MarkerList::default());
    }
    let entries: Vec<serde_json::Value> =
        serde_json::from_str(raw).map_err(|e| MarkerStoreError::Corrupt(e.to_string()))?;

    let mut list = MarkerList::default();
    for entry in entries {
        match serde_json::from_value::<GeoPoint>(entry) {
            Ok(point) => list.points.push(point),
            Err(_) => list.skipped += 1,
        }
    }
    Ok(list)
}

pub fn encode_marker_list(points: &[GeoPoint]) -> Result<String, MarkerStoreError> {
    serde_json::to_string(points).map_err(|e| MarkerStoreError::Io(e.to_string()))
}

/// Key-value persistence for the marker list.
///
/// Backends implement the raw string operations; the list operations are
/// shared. Concurrent writers are not coordinated: the last write wins.
pub trait MarkerStore {
    /// Stored text, or `None` when nothing has been written yet.
    fn read_raw(&self) -> Result<Option<String>, MarkerStoreError>;
    fn write_raw(&mut self, raw: &str) -> Result<(), MarkerStoreError>;

    fn read(&self) -> Result<MarkerList, MarkerStoreError> {
        match self.read_raw()? {
            Some(raw) => parse_marker_list(&raw),
            None => Ok(MarkerList::default()),
        }
    }

    fn write(&mut self, points: &[GeoPoint]) -> Result<(), MarkerStoreError> {
        let raw = encode_marker_list(points)?;
        self.write_raw(&raw)
    }

    /// Every stored marker in insertion order. Never fails: unreadable or
    /// corrupt storage is logged and reads as empty.
    fn load_all(&self) -> Vec<GeoPoint> {
        match self.read() {
            Ok(list) => {
                if list.skipped > 0 {
                    warn!("skipped {} malformed stored markers", list.skipped);
                }
                list.points
            }
            Err(err) => {
                warn!("treating stored markers as empty: {err}");
                Vec::new()
            }
        }
    }

    /// Reads the current list, pushes `point` and writes the whole list back.
    ///
    /// Corrupt storage is replaced by a fresh list. Backend read errors are
    /// returned without writing, so stored markers survive a failed read.
    fn append(&mut self, point: GeoPoint) -> Result<(), MarkerStoreError> {
        let mut points = match self.read() {
            Ok(list) => {
                if list.skipped > 0 {
                    warn!("dropping {} malformed stored markers", list.skipped);
                }
                list.points
            }
            Err(MarkerStoreError::Corrupt(msg)) => {
                warn!("replacing corrupt stored markers: {msg}");
                Vec::new()
            }
            Err(err) => return Err(err),
        };
        points.push(point);
        self.write(&points)
    }
}

#[derive(Debug, Default)]
pub struct InMemoryMarkerStore {
    raw: Option<String>,
}

impl InMemoryMarkerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with `raw`, as if another session had written it.
    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self {
            raw: Some(raw.into()),
        }
    }
}

impl MarkerStore for InMemoryMarkerStore {
    fn read_raw(&self) -> Result<Option<String>, MarkerStoreError> {
        Ok(self.raw.clone())
    }

    fn write_raw(&mut self, raw: &str) -> Result<(), MarkerStoreError> {
        self.raw = Some(raw.to_string());
        Ok(())
    }
}

#[cfg(target_arch = "wasm32")]
mod wasm_storage {
    use super::{MarkerStore, MarkerStoreError};

    /// `window.localStorage[key]`.
    #[derive(Debug)]
    pub struct LocalStorageMarkerStore {
        key: String,
    }

    impl LocalStorageMarkerStore {
        pub fn new(key: impl Into<String>) -> Result<Self, MarkerStoreError> {
            // Fail early when storage is disabled (private mode, sandboxed iframe).
            window_local_storage()?;
            Ok(Self { key: key.into() })
        }

        pub fn key(&self) -> &str {
            &self.key
        }
    }

    impl MarkerStore for LocalStorageMarkerStore {
        fn read_raw(&self) -> Result<Option<String>, MarkerStoreError> {
            let storage = window_local_storage()?;
            storage
                .get_item(&self.key)
                .map_err(|e| MarkerStoreError::Io(format!("get_item({}) failed: {:?}", self.key, e)))
        }

        fn write_raw(&mut self, raw: &str) -> Result<(), MarkerStoreError> {
            let storage = window_local_storage()?;
            storage
                .set_item(&self.key, raw)
                .map_err(|e| MarkerStoreError::Io(format!("set_item({}) failed: {:?}", self.key, e)))
        }
    }

    fn window_local_storage() -> Result<web_sys::Storage, MarkerStoreError> {
        let win = web_sys::window().ok_or(MarkerStoreError::StorageUnavailable)?;
        win.local_storage()
            .map_err(|e| MarkerStoreError::Io(format!("localStorage error: {:?}", e)))?
            .ok_or(MarkerStoreError::StorageUnavailable)
    }
}

#[cfg(target_arch = "wasm32")]
pub use wasm_storage::LocalStorageMarkerStore;

#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug)]
pub struct LocalStorageMarkerStore;

#[cfg(not(target_arch = "wasm32"))]
impl LocalStorageMarkerStore {
    pub fn new(_key: impl Into<String>) -> Result<Self, MarkerStoreError> {
        Err(MarkerStoreError::StorageUnavailable)
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl MarkerStore for LocalStorageMarkerStore {
    fn read_raw(&self) -> Result<Option<String>, MarkerStoreError> {
        Err(MarkerStoreError::StorageUnavailable)
    }

    fn write_raw(&mut self, _raw: &str) -> Result<(), MarkerStoreError> {
        Err(MarkerStoreError::StorageUnavailable)
    }
}
