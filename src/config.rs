//! Editor configuration.
//!
//! The defaults mirror the foundation build of the editor: a fixed 28 x 18
//! grid drawn with 32 px cells from a 32 px, 8 column tileset atlas.
use crate::catalog::Biome;
use crate::error::MapError;
use serde::Deserialize;
use std::collections::BTreeMap;

/// Number of columns in the map grid.
pub const GRID_COLS: u32 = 28;

/// Number of rows in the map grid.
pub const GRID_ROWS: u32 = 18;

/// Size in pixels of one map cell in the rendered frame.
pub const CELL_PX: u32 = 32;

/// Size in pixels of one tile in the atlas image.
pub const ATLAS_TILE_PX: u32 = 32;

/// Number of tile columns in the atlas image.
pub const ATLAS_COLUMNS: u32 = 8;

/// Key under which the map is kept in local storage.
pub const STORAGE_KEY: &str = "guardians_remnant_map";

/// Version written into exported snapshots.
pub const FORMAT_VERSION: u32 = 2;

/// Tileset used by biomes without their own entry in `tilesets`.
pub const TILESET_PATH: &str = "assets/tileset.png";

fn default_tilesets() -> BTreeMap<Biome, String> {
    BTreeMap::from([
        (Biome::Overworld, TILESET_PATH.to_owned()),
        (Biome::Ancient, "assets/tileset_ancient.png".to_owned()),
        (Biome::Modern, "assets/tileset_modern.png".to_owned()),
    ])
}

/// Runtime configuration, every field optional when read from JSON.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub cols: u32,
    pub rows: u32,
    pub cell_px: u32,
    pub atlas_tile_px: u32,
    pub atlas_columns: u32,
    pub default_biome: Biome,
    pub storage_key: String,
    pub format_version: u32,
    /// Atlas image per biome. A map given in JSON replaces the defaults.
    pub tilesets: BTreeMap<Biome, String>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        EditorConfig {
            cols: GRID_COLS,
            rows: GRID_ROWS,
            cell_px: CELL_PX,
            atlas_tile_px: ATLAS_TILE_PX,
            atlas_columns: ATLAS_COLUMNS,
            default_biome: Biome::Overworld,
            storage_key: STORAGE_KEY.to_owned(),
            format_version: FORMAT_VERSION,
            tilesets: default_tilesets(),
        }
    }
}

impl EditorConfig {
    /// Grid of `cols` x `rows` with every other setting at its default.
    pub fn with_grid(cols: u32, rows: u32) -> Self {
        EditorConfig {
            cols,
            rows,
            ..Default::default()
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, MapError> {
        let cfg: EditorConfig = serde_json::from_str(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Rejects an empty grid and zero pixel sizes.
    pub fn validate(&self) -> Result<(), MapError> {
        if self.cols == 0 || self.rows == 0 {
            return Err(MapError::InvalidMap(format!(
                "grid must not be empty ({}x{})",
                self.cols, self.rows
            )));
        }
        if self.cell_px == 0 || self.atlas_tile_px == 0 || self.atlas_columns == 0 {
            return Err(MapError::InvalidMap(
                "cell size, atlas tile size and atlas columns must be positive".into(),
            ));
        }
        Ok(())
    }

    pub fn tileset_path(&self, biome: Biome) -> &str {
        self.tilesets
            .get(&biome)
            .map(String::as_str)
            .unwrap_or(TILESET_PATH)
    }

    /// Native framebuffer size in pixels.
    #[inline]
    pub fn frame_size(&self) -> (u32, u32) {
        (self.cols * self.cell_px, self.rows * self.cell_px)
    }
}
