use std::path::{Path, PathBuf};

use crate::{MarkerStore, MarkerStoreError};

/// Marker list in a JSON file, replaced atomically on every write.
#[derive(Debug, Clone)]
pub struct FileMarkerStore {
    path: PathBuf,
}

impl FileMarkerStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl MarkerStore for FileMarkerStore {
    fn read_raw(&self) -> Result<Option<String>, MarkerStoreError> {
        match std::fs::read_to_string(&self.path) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(MarkerStoreError::Io(format!("{}: {e}", self.path.display()))),
        }
    }

    fn write_raw(&mut self, raw: &str) -> Result<(), MarkerStoreError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| MarkerStoreError::Io(e.to_string()))?;
        }

        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, raw).map_err(|e| MarkerStoreError::Io(e.to_string()))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| MarkerStoreError::Io(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::FileMarkerStore;
    use crate::MarkerStore;
    use foundation::math::GeoPoint;
    use pretty_assertions::assert_eq;

    #[test]
    fn missing_file_reads_as_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileMarkerStore::new(dir.path().join("markers.json"));
        assert_eq!(store.read_raw().expect("read"), None);
        assert!(store.load_all().is_empty());
    }

    #[test]
    fn appends_survive_reopening() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("markers.json");

        let mut store = FileMarkerStore::new(&path);
        let a = GeoPoint::new(12.34, 56.78).expect("valid");
        let b = GeoPoint::new(-8.0, 115.2).expect("valid");
        store.append(a).expect("append");
        store.append(b).expect("append");

        let reopened = FileMarkerStore::new(&path);
        assert_eq!(reopened.load_all(), vec![a, b]);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn corrupt_file_loads_as_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("markers.json");
        std::fs::write(&path, "[{").expect("write");
        assert!(FileMarkerStore::new(&path).load_all().is_empty());
    }
}
