//! Paint engine: turns (mode, selection, cell) into one grid mutation and
//! de-duplicates drag strokes.
use crate::catalog::{Biome, Catalog};
use crate::error::MapError;
use crate::grid::{GridStore, PlacedObject};
use crate::spatial::{Cell, TileId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Mode {
    #[default]
    Terrain,
    Object,
    Eraser,
}

/// The layer the eraser works on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Layer {
    #[default]
    Terrain,
    Object,
}

/// Current tool and palette choices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub mode: Mode,
    /// Last non-eraser layer; eraser mode leaves it alone.
    pub last_active: Layer,
    pub biome: Biome,
    pub terrain: TileId,
    /// `None` when the biome offers no objects.
    pub object: Option<TileId>,
}

impl Selection {
    pub fn new(catalog: &Catalog, biome: Biome) -> Self {
        Selection {
            mode: Mode::Terrain,
            last_active: Layer::Terrain,
            biome,
            terrain: catalog.default_terrain(biome),
            object: catalog.object_ids(biome).first().copied(),
        }
    }

    /// Id a paint in the current mode would use.
    pub fn active_id(&self) -> Option<TileId> {
        match self.mode {
            Mode::Terrain => Some(self.terrain),
            Mode::Object => self.object,
            Mode::Eraser => None,
        }
    }
}

/// A single applied mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edit {
    Terrain { cell: Cell, from: TileId, to: TileId },
    Placed(PlacedObject),
    Removed(PlacedObject),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct StrokeKey {
    mode: Mode,
    layer: Layer,
    biome: Biome,
    cell: Cell,
    id: Option<TileId>,
}

#[derive(Debug, Default)]
struct DragState {
    painting: bool,
    last: Option<StrokeKey>,
}

/// Owns the selection and applies it to a [`GridStore`].
#[derive(Debug)]
pub struct PaintEngine {
    selection: Selection,
    drag: DragState,
}

impl PaintEngine {
    pub fn new(catalog: &Catalog, biome: Biome) -> Self {
        PaintEngine {
            selection: Selection::new(catalog, biome),
            drag: DragState::default(),
        }
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn is_painting(&self) -> bool {
        self.drag.painting
    }

    pub fn select_mode(&mut self, mode: Mode) {
        self.selection.mode = mode;
        match mode {
            Mode::Terrain => self.selection.last_active = Layer::Terrain,
            Mode::Object => self.selection.last_active = Layer::Object,
            Mode::Eraser => {}
        }
    }

    /// Switches biome; painted tiles are untouched. Selections the new biome
    /// doesn't offer fall back to its defaults.
    pub fn set_biome(&mut self, catalog: &Catalog, biome: Biome) {
        let sel = &mut self.selection;
        sel.biome = biome;
        if !catalog.terrain_ids(biome).contains(&sel.terrain) {
            sel.terrain = catalog.default_terrain(biome);
        }
        let objects = catalog.object_ids(biome);
        if !sel.object.is_some_and(|id| objects.contains(&id)) {
            sel.object = objects.first().copied();
        }
    }

    pub fn select_terrain(&mut self, catalog: &Catalog, id: TileId) -> Result<(), MapError> {
        if !catalog.is_terrain(id) {
            return Err(MapError::UnknownTile(id));
        }
        self.selection.terrain = id;
        Ok(())
    }

    pub fn select_object(&mut self, catalog: &Catalog, id: TileId) -> Result<(), MapError> {
        if !catalog.is_object(id) {
            return Err(MapError::UnknownTile(id));
        }
        self.selection.object = Some(id);
        Ok(())
    }

    /// Re-derives the selection after a snapshot replaced the grid.
    pub(crate) fn reset_for_biome(&mut self, catalog: &Catalog, biome: Biome) {
        self.set_biome(catalog, biome);
        self.selection.terrain = catalog.default_terrain(biome);
        self.pointer_cancel();
    }

    /// Applies the current tool at `cell`. `None` when nothing changed.
    pub fn apply(&self, grid: &mut GridStore, catalog: &Catalog, cell: Cell) -> Option<Edit> {
        let sel = &self.selection;
        match (sel.mode, sel.last_active) {
            (Mode::Terrain, _) => set_terrain(grid, cell, sel.terrain),
            (Mode::Object, _) => {
                let id = sel.object?;
                Some(Edit::Placed(grid.place_object(catalog, id, cell)))
            }
            (Mode::Eraser, Layer::Terrain) => {
                set_terrain(grid, cell, catalog.default_terrain(sel.biome))
            }
            (Mode::Eraser, Layer::Object) => grid.remove_top_object_at(cell).map(Edit::Removed),
        }
    }

    fn stroke_key(&self, cell: Cell) -> StrokeKey {
        StrokeKey {
            mode: self.selection.mode,
            layer: self.selection.last_active,
            biome: self.selection.biome,
            cell,
            id: self.selection.active_id(),
        }
    }

    pub fn pointer_down(&mut self, grid: &mut GridStore, catalog: &Catalog, cell: Cell) -> Option<Edit> {
        self.drag.painting = true;
        self.drag.last = Some(self.stroke_key(cell));
        self.apply(grid, catalog, cell)
    }

    /// Paints while the pointer is held, skipping a repeat of the previous
    /// event's key.
    pub fn pointer_move(&mut self, grid: &mut GridStore, catalog: &Catalog, cell: Cell) -> Option<Edit> {
        if !self.drag.painting {
            return None;
        }
        let key = self.stroke_key(cell);
        if self.drag.last == Some(key) {
            return None;
        }
        self.drag.last = Some(key);
        self.apply(grid, catalog, cell)
    }

    pub fn pointer_up(&mut self) {
        self.drag = DragState::default();
    }

    /// Interrupted gesture; already applied edits stay.
    pub fn pointer_cancel(&mut self) {
        self.drag = DragState::default();
    }
}

fn set_terrain(grid: &mut GridStore, cell: Cell, to: TileId) -> Option<Edit> {
    let from = grid.terrain_at(cell);
    grid.set_terrain(cell, to).then_some(Edit::Terrain { cell, from, to })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (PaintEngine, GridStore, Catalog) {
        let c = Catalog::builtin();
        (
            PaintEngine::new(&c, Biome::Overworld),
            GridStore::new(4, 4, c.default_terrain(Biome::Overworld)),
            c,
        )
    }

    #[test]
    fn initial_state_is_terrain() {
        let (p, _, _) = setup();
        assert_eq!(p.selection().mode, Mode::Terrain);
        assert_eq!(p.selection().last_active, Layer::Terrain);
        assert_eq!(p.selection().terrain, TileId(0));
    }

    #[test]
    fn eraser_keeps_last_active_layer() {
        let (mut p, _, _) = setup();
        p.select_mode(Mode::Object);
        p.select_mode(Mode::Eraser);
        assert_eq!(p.selection().last_active, Layer::Object);
        p.select_mode(Mode::Terrain);
        p.select_mode(Mode::Eraser);
        assert_eq!(p.selection().last_active, Layer::Terrain);
    }

    #[test]
    fn eraser_resets_terrain_to_current_biome_default() {
        let (mut p, mut g, c) = setup();
        p.select_terrain(&c, TileId(2)).unwrap();
        p.apply(&mut g, &c, Cell::new(1, 1));
        p.set_biome(&c, Biome::Modern);
        p.select_mode(Mode::Eraser);
        let edit = p.apply(&mut g, &c, Cell::new(1, 1));
        assert_eq!(
            edit,
            Some(Edit::Terrain {
                cell: Cell::new(1, 1),
                from: TileId(2),
                to: TileId(17)
            })
        );
    }

    #[test]
    fn eraser_on_objects_removes_top_only() {
        let (mut p, mut g, c) = setup();
        p.select_mode(Mode::Object);
        p.select_object(&c, TileId(96)).unwrap();
        p.apply(&mut g, &c, Cell::new(0, 0));
        p.select_object(&c, TileId(100)).unwrap();
        p.apply(&mut g, &c, Cell::new(1, 1));
        p.select_mode(Mode::Eraser);
        let edit = p.apply(&mut g, &c, Cell::new(2, 2));
        assert!(matches!(edit, Some(Edit::Removed(o)) if o.id == TileId(100)));
        assert_eq!(g.objects().len(), 1);
        assert_eq!(g.terrain_at(Cell::new(2, 2)), TileId(0));
    }

    #[test]
    fn drag_over_same_cell_applies_once() {
        let (mut p, mut g, c) = setup();
        p.select_mode(Mode::Object);
        p.select_object(&c, TileId(96)).unwrap();
        assert!(p.pointer_down(&mut g, &c, Cell::new(0, 0)).is_some());
        assert!(p.pointer_move(&mut g, &c, Cell::new(0, 0)).is_none());
        assert!(p.pointer_move(&mut g, &c, Cell::new(0, 0)).is_none());
        assert_eq!(g.objects().len(), 1);

        assert!(p.pointer_move(&mut g, &c, Cell::new(1, 0)).is_some());
        // coming back re-places the rock over the old one
        assert!(p.pointer_move(&mut g, &c, Cell::new(0, 0)).is_some());
        assert_eq!(g.objects().len(), 2);
    }

    #[test]
    fn move_without_press_does_nothing() {
        let (mut p, mut g, c) = setup();
        p.select_terrain(&c, TileId(3)).unwrap();
        assert!(p.pointer_move(&mut g, &c, Cell::new(0, 0)).is_none());
        p.pointer_down(&mut g, &c, Cell::new(0, 0));
        p.pointer_cancel();
        assert!(!p.is_painting());
        assert!(p.pointer_move(&mut g, &c, Cell::new(1, 0)).is_none());
        assert_eq!(g.terrain_at(Cell::new(0, 0)), TileId(3));
    }

    #[test]
    fn biome_switch_rederives_missing_selection() {
        let (mut p, _, c) = setup();
        p.select_object(&c, TileId(100)).unwrap();
        p.select_terrain(&c, TileId(2)).unwrap();
        p.set_biome(&c, Biome::Modern);
        // stone is shared, the cottage isn't
        assert_eq!(p.selection().terrain, TileId(2));
        assert_eq!(p.selection().object, Some(TileId(96)));
    }

    #[test]
    fn selecting_wrong_kind_is_rejected() {
        let (mut p, _, c) = setup();
        assert!(matches!(p.select_terrain(&c, TileId(100)), Err(MapError::UnknownTile(_))));
        assert!(matches!(p.select_object(&c, TileId(0)), Err(MapError::UnknownTile(_))));
    }
}
