//! Editor session: everything a host shell needs to drive the map.
use crate::catalog::{Biome, Catalog, PaletteGroup};
use crate::clipboard::{self, Clipboard, ExportOutcome};
use crate::config::EditorConfig;
use crate::error::MapError;
use crate::grid::GridStore;
use crate::input::PointerMapper;
use crate::paint::{Edit, Mode, PaintEngine, Selection};
use crate::render::{Atlas, AtlasState, Renderer};
use crate::snapshot::{Importer, MapDocument};
use crate::spatial::{Cell, TileId};
use crate::storage::{self, KeyValueStore};
use anyhow::Context;
use macroquad::math::{Rect, Vec2};
use macroquad::texture::Image;
use std::collections::BTreeMap;
use std::path::Path;

pub struct Editor {
    config: EditorConfig,
    catalog: Catalog,
    grid: GridStore,
    paint: PaintEngine,
    renderer: Renderer,
    mapper: PointerMapper,
    highlight: Option<Cell>,
    /// Sliced tilesets by path, so switching back to a biome needs no reload.
    atlases: BTreeMap<String, Atlas>,
    /// Path of the atlas the renderer currently draws with.
    shown_tileset: Option<String>,
}

impl Editor {
    /// Fails when the config describes an empty grid or zero pixel sizes.
    pub fn new(config: EditorConfig, catalog: Catalog) -> Result<Self, MapError> {
        config.validate()?;
        Ok(Editor::build(config, catalog))
    }

    fn build(config: EditorConfig, catalog: Catalog) -> Self {
        let biome = config.default_biome;
        let grid = GridStore::new(config.cols, config.rows, catalog.default_terrain(biome));
        let paint = PaintEngine::new(&catalog, biome);
        Editor {
            renderer: Renderer::new(config.cell_px),
            mapper: PointerMapper::new(config.cols, config.rows, config.cell_px),
            config,
            catalog,
            grid,
            paint,
            highlight: None,
            atlases: BTreeMap::new(),
            shown_tileset: None,
        }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn grid(&self) -> &GridStore {
        &self.grid
    }

    pub fn selection(&self) -> &Selection {
        self.paint.selection()
    }

    pub fn highlight(&self) -> Option<Cell> {
        self.highlight
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut Renderer {
        &mut self.renderer
    }

    pub fn select_mode(&mut self, mode: Mode) {
        self.paint.select_mode(mode);
    }

    /// Switches the painting biome and its tileset. Until the tileset is
    /// available the renderer falls back to placeholders.
    pub fn select_biome(&mut self, biome: Biome) {
        self.paint.set_biome(&self.catalog, biome);
        self.sync_tileset();
    }

    pub fn select_terrain(&mut self, id: TileId) -> Result<(), MapError> {
        self.paint.select_terrain(&self.catalog, id)
    }

    pub fn select_object(&mut self, id: TileId) -> Result<(), MapError> {
        self.paint.select_object(&self.catalog, id)
    }

    /// Applies the current tool to one cell, outside any drag.
    pub fn paint_cell(&mut self, cell: Cell) -> Option<Edit> {
        self.highlight = Some(cell);
        self.paint.apply(&mut self.grid, &self.catalog, cell)
    }

    /// Returns whether the frame needs redrawing.
    pub fn pointer_down(&mut self, point: Vec2, shown: Rect) -> bool {
        let cell = self.mapper.cell_at(point, shown);
        self.highlight = Some(cell);
        if let Some(edit) = self.paint.pointer_down(&mut self.grid, &self.catalog, cell) {
            log::debug!("{:?}", edit);
        }
        true
    }

    pub fn pointer_move(&mut self, point: Vec2, shown: Rect) -> bool {
        if !self.paint.is_painting() {
            return false;
        }
        let cell = self.mapper.cell_at(point, shown);
        let moved = self.highlight != Some(cell);
        self.highlight = Some(cell);
        let edit = self.paint.pointer_move(&mut self.grid, &self.catalog, cell);
        if let Some(edit) = &edit {
            log::debug!("{:?}", edit);
        }
        moved || edit.is_some()
    }

    pub fn pointer_up(&mut self) {
        self.paint.pointer_up();
    }

    pub fn pointer_cancel(&mut self) {
        self.paint.pointer_cancel();
    }

    /// Fills the map with the current biome's default terrain and drops all
    /// objects.
    pub fn clear(&mut self) {
        let fill = self.catalog.default_terrain(self.selection().biome);
        self.grid.clear(fill);
        self.highlight = None;
        log::info!("map cleared to {}", self.catalog.name(fill));
    }

    pub fn snapshot(&self) -> MapDocument {
        MapDocument::capture(&self.grid, self.selection().biome, self.config.format_version)
    }

    pub fn export_json(&self) -> Result<String, MapError> {
        self.snapshot().to_json()
    }

    pub fn export_to_clipboard(&self, clipboard: &mut dyn Clipboard) -> Result<ExportOutcome, MapError> {
        Ok(clipboard::export_to_clipboard(clipboard, self.export_json()?))
    }

    /// Replaces the whole map with a snapshot. On error nothing changes.
    pub fn import_json(&mut self, txt: &str) -> Result<(), MapError> {
        let importer = Importer::new(&self.grid, &self.catalog, self.config.default_biome);
        let restored = importer.decode(txt).map_err(|e| {
            log::warn!("import rejected: {}", e);
            e
        })?;
        let objects = restored.objects.len();
        let biome = restored.apply_to(&mut self.grid);
        self.paint.reset_for_biome(&self.catalog, biome);
        self.sync_tileset();
        self.highlight = None;
        log::info!("imported {} map with {} objects", biome, objects);
        Ok(())
    }

    pub fn save_local(&self, store: &mut dyn KeyValueStore) -> Result<(), MapError> {
        let json = self.export_json()?;
        store.set(&self.config.storage_key, &json)?;
        log::info!("saved map under '{}'", self.config.storage_key);
        Ok(())
    }

    /// `Ok(false)` when nothing was saved yet.
    pub fn load_local(&mut self, store: &dyn KeyValueStore) -> Result<bool, MapError> {
        match store.get(&self.config.storage_key)? {
            Some(txt) => self.import_json(&txt).map(|()| true),
            None => Ok(false),
        }
    }

    pub fn export_file(&self, path: &Path) -> Result<(), MapError> {
        storage::write_map_file(path, &self.export_json()?)
    }

    pub fn import_file(&mut self, path: &Path) -> Result<(), MapError> {
        let txt = storage::read_map_file(path)?;
        self.import_json(&txt)
    }

    /// Tileset image the current biome draws from.
    pub fn tileset_path(&self) -> &str {
        self.config.tileset_path(self.selection().biome)
    }

    /// Whether the host should load the current biome's tileset.
    pub fn needs_tileset(&self) -> bool {
        !matches!(self.renderer.atlas_state(), AtlasState::Failed(_))
            && !self.atlases.contains_key(self.tileset_path())
    }

    /// Atlas columns and tile size: the catalog's own layout when it has
    /// one, the config's otherwise.
    fn atlas_layout(&self) -> (u32, u32) {
        match self.catalog.atlas_geometry() {
            Some(g) => (g.columns, g.tile_px),
            None => (self.config.atlas_columns, self.config.atlas_tile_px),
        }
    }

    /// Raw atlas ids per catalog zone.
    pub fn zone_tiles(&self) -> Vec<PaletteGroup> {
        self.catalog.zone_tiles(self.atlas_layout().0)
    }

    fn sync_tileset(&mut self) {
        let path = self.tileset_path().to_owned();
        if self.shown_tileset.as_deref() == Some(path.as_str()) {
            return;
        }
        match self.atlases.get(&path) {
            Some(atlas) => {
                log::debug!("switching to cached tileset {}", path);
                self.renderer.set_atlas(atlas.clone());
                self.shown_tileset = Some(path);
            }
            None => {
                log::debug!("tileset {} not loaded yet", path);
                self.renderer.mark_loading();
                self.shown_tileset = None;
            }
        }
    }

    /// Hands the decoded tileset image of the current biome to the renderer.
    pub fn set_atlas_image(&mut self, image: Image) -> Result<(), MapError> {
        let (columns, tile_px) = self.atlas_layout();
        match Atlas::new(image, tile_px, columns) {
            Ok(atlas) => {
                let path = self.tileset_path().to_owned();
                self.atlases.insert(path.clone(), atlas.clone());
                self.renderer.set_atlas(atlas);
                self.shown_tileset = Some(path);
                Ok(())
            }
            Err(e) => {
                self.renderer.set_atlas_failed(e.to_string());
                Err(e)
            }
        }
    }

    /// Loads the current biome's tileset from disk through macroquad.
    pub async fn load_tileset(&mut self) -> anyhow::Result<()> {
        let path = self.tileset_path().to_owned();
        self.renderer.mark_loading();
        let image = match macroquad::texture::load_image(&path).await {
            Ok(image) => image,
            Err(e) => {
                self.renderer.set_atlas_failed(format!("{path}: {e:?}"));
                anyhow::bail!("Loading tileset {}: {:?}", path, e);
            }
        };
        self.set_atlas_image(image)
            .with_context(|| format!("Slicing tileset {}", path))
    }

    pub fn render(&self) -> Image {
        self.renderer.render(&self.grid, &self.catalog, self.highlight)
    }

    pub fn thumbnail(&self, id: TileId, size: u16) -> Image {
        self.renderer.thumbnail(id, size)
    }
}

impl Default for Editor {
    fn default() -> Self {
        Editor::build(EditorConfig::default(), Catalog::builtin())
    }
}
