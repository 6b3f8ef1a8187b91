//! Tile-map model, paint engine, CPU renderer and JSON snapshots for the
//! Guardians' Remnant map editor.

pub mod catalog;
pub mod clipboard;
pub mod config;
pub mod editor;
mod error;
pub mod grid;
pub mod input;
/// Catalog document loading.
pub mod loader {
    pub mod catalog_json;
}
pub mod paint;
pub mod render;
pub mod snapshot;
pub mod spatial;
pub mod storage;

pub use catalog::{AtlasGeometry, Biome, Catalog, Stamp, TileKind};
pub use config::EditorConfig;
pub use editor::Editor;
pub use error::MapError;
pub use grid::{GridStore, PlacedObject};
pub use paint::{Edit, Layer, Mode, PaintEngine, Selection};
pub use render::{Atlas, AtlasState, Renderer};
pub use snapshot::{MapDocument, ObjectRecord};
pub use spatial::{Cell, Footprint, TileId};
