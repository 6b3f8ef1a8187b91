//! Local persistence: a string key-value store and `.json` map files.
use crate::error::MapError;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Browser-local-storage style persistence.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, MapError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), MapError>;
}

/// In-memory store, lost with the process.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, MapError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), MapError> {
        self.entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}

/// One `<key>.json` file per key inside a directory.
#[derive(Debug, Clone)]
pub struct DirStore {
    dir: PathBuf,
}

impl DirStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        DirStore { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let safe: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
            .collect();
        self.dir.join(format!("{safe}.json"))
    }
}

impl KeyValueStore for DirStore {
    fn get(&self, key: &str) -> Result<Option<String>, MapError> {
        let path = self.path_for(key);
        match std::fs::read_to_string(&path) {
            Ok(txt) => Ok(Some(txt)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(MapError::Io { path, source }),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), MapError> {
        std::fs::create_dir_all(&self.dir).map_err(|source| MapError::Io {
            path: self.dir.clone(),
            source,
        })?;
        let path = self.path_for(key);
        std::fs::write(&path, value).map_err(|source| MapError::Io { path, source })
    }
}

fn require_json(path: &Path) -> Result<(), MapError> {
    if path.extension().and_then(|e| e.to_str()) != Some("json") {
        return Err(MapError::UnsupportedFormat(path.display().to_string()));
    }
    Ok(())
}

/// Writes an exported snapshot to a `.json` file.
pub fn write_map_file(path: &Path, json: &str) -> Result<(), MapError> {
    require_json(path)?;
    std::fs::write(path, json).map_err(|source| MapError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads a snapshot from a `.json` file.
pub fn read_map_file(path: &Path) -> Result<String, MapError> {
    require_json(path)?;
    std::fs::read_to_string(path).map_err(|source| MapError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_dir() -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock went backwards")
            .as_nanos();
        std::env::temp_dir().join(format!("remnant_store_{nanos}"))
    }

    #[test]
    fn memory_store_round_trips() {
        let mut s = MemoryStore::new();
        assert_eq!(s.get("k").unwrap(), None);
        s.set("k", "v").unwrap();
        assert_eq!(s.get("k").unwrap().as_deref(), Some("v"));
    }

    #[test]
    fn dir_store_creates_dir_and_sanitizes_keys() {
        let dir = temp_dir();
        let mut s = DirStore::new(&dir);
        assert_eq!(s.get("maps/one").unwrap(), None);
        s.set("maps/one", "{}").unwrap();
        assert_eq!(s.get("maps/one").unwrap().as_deref(), Some("{}"));
        assert!(dir.join("maps_one.json").exists());
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn map_files_must_be_json() {
        let err = read_map_file(Path::new("map.tmx")).unwrap_err();
        assert!(matches!(err, MapError::UnsupportedFormat(ext) if ext == "map.tmx"));
        let err = write_map_file(Path::new("map"), "{}").unwrap_err();
        assert!(matches!(err, MapError::UnsupportedFormat(_)));
    }

    #[test]
    fn missing_map_file_is_io_error() {
        let path = temp_dir().join("absent.json");
        assert!(matches!(read_map_file(&path), Err(MapError::Io { .. })));
    }
}
