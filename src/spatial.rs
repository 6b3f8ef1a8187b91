use serde::{Deserialize, Serialize};
use std::fmt;

/// Atlas tile identifier. Whether an id is terrain or an object is decided by
/// the [`Catalog`](crate::Catalog), never by its numeric range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TileId(pub u32);

impl TileId {
    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }

    /// Column and row of this tile inside an atlas `columns` wide.
    #[inline]
    pub fn atlas_cell(self, columns: u32) -> (u32, u32) {
        (self.0 % columns, self.0 / columns)
    }
}

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:03}", self.0)
    }
}

/// A grid cell, `x` is the column and `y` the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Cell {
    pub x: u32,
    pub y: u32,
}

impl Cell {
    #[inline]
    pub const fn new(x: u32, y: u32) -> Self {
        Cell { x, y }
    }

    /// Row-major index in a grid `cols` wide.
    #[inline]
    pub fn index(self, cols: u32) -> usize {
        (self.y * cols + self.x) as usize
    }
}

/// Width and height of an object in cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Footprint {
    pub w: u32,
    pub h: u32,
}

impl Footprint {
    pub const SINGLE: Footprint = Footprint { w: 1, h: 1 };

    /// Does a footprint anchored at `anchor` cover `cell`?
    #[inline]
    pub fn covers(self, anchor: Cell, cell: Cell) -> bool {
        cell.x >= anchor.x
            && cell.x < anchor.x + self.w
            && cell.y >= anchor.y
            && cell.y < anchor.y + self.h
    }

    /// Moves `cell` up/left until the whole footprint fits in `cols` x `rows`.
    /// A footprint larger than the grid is pinned at 0 on that axis.
    #[inline]
    pub fn clamp_anchor(self, cell: Cell, cols: u32, rows: u32) -> Cell {
        Cell {
            x: cell.x.min(cols.saturating_sub(self.w)),
            y: cell.y.min(rows.saturating_sub(self.h)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atlas_cell_wraps_by_columns() {
        assert_eq!(TileId(0).atlas_cell(8), (0, 0));
        assert_eq!(TileId(9).atlas_cell(8), (1, 1));
        assert_eq!(TileId(100).atlas_cell(8), (4, 12));
    }

    #[test]
    fn clamp_anchor_keeps_footprint_inside() {
        let fp = Footprint { w: 2, h: 3 };
        assert_eq!(fp.clamp_anchor(Cell::new(3, 3), 4, 4), Cell::new(2, 1));
        assert_eq!(fp.clamp_anchor(Cell::new(1, 0), 4, 4), Cell::new(1, 0));
    }

    #[test]
    fn covers_is_half_open() {
        let fp = Footprint { w: 2, h: 2 };
        let a = Cell::new(1, 1);
        assert!(fp.covers(a, Cell::new(2, 2)));
        assert!(!fp.covers(a, Cell::new(3, 2)));
        assert!(!fp.covers(a, Cell::new(0, 1)));
    }
}
