use crate::spatial::TileId;
use std::fmt;
use std::io;
use std::path::PathBuf;

/// Errors surfaced by catalog loading, snapshot import and file persistence.
#[derive(Debug)]
pub enum MapError {
    /// JSON parse error
    Json {
        /// Underlying serde error
        source: serde_json::Error,
    },
    /// File I/O error
    Io {
        /// File that failed
        path: PathBuf,
        /// Underlying I/O error
        source: io::Error,
    },
    /// Structurally invalid document (missing arrays, bad values, ...)
    InvalidMap(String),
    /// Imported grid dimensions do not match the session grid
    SizeMismatch {
        /// Session grid (cols, rows)
        expected: (u32, u32),
        /// Document grid (cols, rows)
        found: (u32, u32),
    },
    /// Id not present in the catalog where a known id is required
    UnknownTile(TileId),
    /// Biome key not present in the catalog
    UnknownBiome(String),
    /// Unsupported file format (non-JSON)
    UnsupportedFormat(String),
    /// The atlas could not be loaded
    AtlasUnavailable(String),
}

impl From<serde_json::Error> for MapError {
    fn from(source: serde_json::Error) -> Self {
        MapError::Json { source }
    }
}

impl fmt::Display for MapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapError::Json { source } => write!(f, "JSON parse error: {}", source),
            MapError::Io { path, source } => {
                write!(f, "I/O error on {}: {}", path.display(), source)
            }
            MapError::InvalidMap(msg) => write!(f, "Invalid map: {}", msg),
            MapError::SizeMismatch { expected, found } => write!(
                f,
                "Map size mismatch: this editor uses {}x{}, document is {}x{}",
                expected.0, expected.1, found.0, found.1
            ),
            MapError::UnknownTile(id) => write!(f, "Tile {} is not in the catalog", id),
            MapError::UnknownBiome(key) => write!(f, "Unknown biome '{}'", key),
            MapError::UnsupportedFormat(ext) => write!(f, "Unsupported file format: {}", ext),
            MapError::AtlasUnavailable(msg) => write!(f, "Tileset unavailable: {}", msg),
        }
    }
}

impl std::error::Error for MapError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MapError::Json { source } => Some(source),
            MapError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}
