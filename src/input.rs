use crate::spatial::Cell;
use macroquad::math::{Rect, Vec2};

/// Maps pointer positions on the displayed frame to grid cells.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerMapper {
    /// Native framebuffer size in pixels.
    pub native: Vec2,
    pub cell_px: f32,
    pub cols: u32,
    pub rows: u32,
}

impl PointerMapper {
    pub fn new(cols: u32, rows: u32, cell_px: u32) -> Self {
        PointerMapper {
            native: Vec2::new((cols * cell_px) as f32, (rows * cell_px) as f32),
            cell_px: cell_px as f32,
            cols,
            rows,
        }
    }

    /// Cell under `point` for a frame shown at `displayed`. Positions off the
    /// frame clamp to the nearest edge cell so a drag past the border still
    /// paints the border. A degenerate `displayed` rect maps to the origin.
    pub fn cell_at(&self, point: Vec2, displayed: Rect) -> Cell {
        if displayed.w <= 0.0 || displayed.h <= 0.0 || !point.is_finite() {
            return Cell::default();
        }
        let scale = self.native / Vec2::new(displayed.w, displayed.h);
        let px = (point - displayed.point()) * scale;
        let cx = (px.x / self.cell_px).floor();
        let cy = (px.y / self.cell_px).floor();
        Cell {
            x: clamp_axis(cx, self.cols),
            y: clamp_axis(cy, self.rows),
        }
    }
}

#[inline]
fn clamp_axis(v: f32, len: u32) -> u32 {
    let max = len.saturating_sub(1);
    if v <= 0.0 {
        0
    } else {
        (v as u32).min(max)
    }
}
