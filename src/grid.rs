//! Terrain layer plus placed object instances over a fixed grid.
use crate::catalog::Catalog;
use crate::spatial::{Cell, Footprint, TileId};

/// An object stamped onto the grid, anchored at its top-left cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacedObject {
    pub id: TileId,
    pub anchor: Cell,
    pub footprint: Footprint,
}

impl PlacedObject {
    #[inline]
    pub fn covers(&self, cell: Cell) -> bool {
        self.footprint.covers(self.anchor, cell)
    }
}

/// Dense terrain layer and an ordered object list (oldest first).
#[derive(Debug, Clone, PartialEq)]
pub struct GridStore {
    cols: u32,
    rows: u32,
    terrain: Vec<TileId>,
    objects: Vec<PlacedObject>,
}

impl GridStore {
    pub fn new(cols: u32, rows: u32, fill: TileId) -> Self {
        GridStore {
            cols,
            rows,
            terrain: vec![fill; (cols * rows) as usize],
            objects: Vec::new(),
        }
    }

    #[inline]
    pub fn cols(&self) -> u32 {
        self.cols
    }

    #[inline]
    pub fn rows(&self) -> u32 {
        self.rows
    }

    #[inline]
    pub fn contains(&self, cell: Cell) -> bool {
        cell.x < self.cols && cell.y < self.rows
    }

    #[track_caller]
    fn index(&self, cell: Cell) -> usize {
        assert!(
            self.contains(cell),
            "cell ({}, {}) outside {}x{} grid",
            cell.x,
            cell.y,
            self.cols,
            self.rows
        );
        cell.index(self.cols)
    }

    #[track_caller]
    pub fn terrain_at(&self, cell: Cell) -> TileId {
        self.terrain[self.index(cell)]
    }

    /// Returns whether the cell changed.
    #[track_caller]
    pub fn set_terrain(&mut self, cell: Cell, id: TileId) -> bool {
        let i = self.index(cell);
        let changed = self.terrain[i] != id;
        self.terrain[i] = id;
        changed
    }

    /// Row-major terrain ids.
    pub fn terrain(&self) -> &[TileId] {
        &self.terrain
    }

    /// Instances in placement order.
    pub fn objects(&self) -> &[PlacedObject] {
        &self.objects
    }

    /// Instances covering `cell`, oldest first; the last one is on top.
    #[track_caller]
    pub fn objects_overlapping(&self, cell: Cell) -> Vec<&PlacedObject> {
        self.index(cell);
        self.objects.iter().filter(|o| o.covers(cell)).collect()
    }

    /// Clamps the anchor so the footprint fits, removes the topmost instance
    /// covering the clamped anchor, then appends the new instance.
    #[track_caller]
    pub fn place_object(&mut self, catalog: &Catalog, id: TileId, cell: Cell) -> PlacedObject {
        self.index(cell);
        let footprint = catalog.footprint(id);
        let anchor = footprint.clamp_anchor(cell, self.cols, self.rows);
        if let Some(removed) = self.remove_top_object_at(anchor) {
            log::debug!(
                "replaced {} at ({}, {}) with {}",
                removed.id,
                removed.anchor.x,
                removed.anchor.y,
                id
            );
        }
        let placed = PlacedObject {
            id,
            anchor,
            footprint,
        };
        self.objects.push(placed);
        placed
    }

    /// Removes the most recently placed instance covering `cell`.
    #[track_caller]
    pub fn remove_top_object_at(&mut self, cell: Cell) -> Option<PlacedObject> {
        self.index(cell);
        let pos = self.objects.iter().rposition(|o| o.covers(cell))?;
        Some(self.objects.remove(pos))
    }

    pub fn clear(&mut self, fill: TileId) {
        self.terrain.fill(fill);
        self.objects.clear();
    }

    /// Swaps in new layers wholesale; both must already match this grid.
    pub(crate) fn replace(&mut self, terrain: Vec<TileId>, objects: Vec<PlacedObject>) {
        debug_assert_eq!(terrain.len(), (self.cols * self.rows) as usize);
        self.terrain = terrain;
        self.objects = objects;
    }
}
