//! CPU compositor for the map frame and palette thumbnails.
//!
//! Frames are plain [`Image`]s so they can be uploaded with
//! `Texture2D::from_image`/`update` by the host, or inspected in tests.
use crate::catalog::Catalog;
use crate::error::MapError;
use crate::grid::GridStore;
use crate::spatial::{Cell, TileId};
use macroquad::color::Color;
use macroquad::math::Rect;
use macroquad::texture::Image;
use std::fmt;

type Rgba = [u8; 4];

const BACKGROUND: Rgba = [7, 10, 15, 255];
const PLACEHOLDER: Rgba = [10, 13, 18, 255];
const GOLD: Rgba = [215, 179, 90, 255];
const GRID_ALPHA_EVEN: u8 = 64; // ~.25
const GRID_ALPHA_ODD: u8 = 31; // ~.12
const HIGHLIGHT_OUTER: Rgba = [0, 0, 0, 200];
const HIGHLIGHT_INNER: Rgba = [255, 230, 150, 255];

/// Flat colours used for tiles while no atlas is available.
const PLACEHOLDER_TINTS: [Rgba; 6] = [
    [46, 74, 44, 255],
    [92, 70, 48, 255],
    [88, 90, 96, 255],
    [36, 62, 104, 255],
    [150, 132, 90, 255],
    [70, 52, 80, 255],
];

/// Tileset image cut into `tile_px` squares, `columns` per row.
#[derive(Clone)]
pub struct Atlas {
    image: Image,
    tile_px: u32,
    columns: u32,
}

impl fmt::Debug for Atlas {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Atlas")
            .field("width", &self.image.width)
            .field("height", &self.image.height)
            .field("tile_px", &self.tile_px)
            .field("columns", &self.columns)
            .finish()
    }
}

impl Atlas {
    pub fn new(image: Image, tile_px: u32, columns: u32) -> Result<Self, MapError> {
        if tile_px == 0 || columns == 0 {
            return Err(MapError::AtlasUnavailable(
                "tile size and column count must be positive".into(),
            ));
        }
        let needed = tile_px.checked_mul(columns).unwrap_or(u32::MAX);
        if (image.width as u32) < needed {
            return Err(MapError::AtlasUnavailable(format!(
                "image is {} px wide, {} columns of {} px need {}",
                image.width, columns, tile_px, needed
            )));
        }
        Ok(Atlas {
            image,
            tile_px,
            columns,
        })
    }

    pub fn tile_px(&self) -> u32 {
        self.tile_px
    }

    pub fn columns(&self) -> u32 {
        self.columns
    }

    /// Source rectangle of `id` in atlas pixels, `None` if the tile lies
    /// outside the image.
    pub fn src_rect(&self, id: TileId) -> Option<Rect> {
        let (sx, sy) = self.origin(id)?;
        let tp = self.tile_px as f32;
        Some(Rect::new(sx as f32, sy as f32, tp, tp))
    }

    /// Top-left pixel of `id`, `None` if the tile lies outside the image.
    fn origin(&self, id: TileId) -> Option<(u32, u32)> {
        let (col, row) = id.atlas_cell(self.columns);
        let sx = col.checked_mul(self.tile_px)?;
        let sy = row.checked_mul(self.tile_px)?;
        let fits = sx.checked_add(self.tile_px)? <= self.image.width as u32
            && sy.checked_add(self.tile_px)? <= self.image.height as u32;
        fits.then_some((sx, sy))
    }

    #[inline]
    fn texel(&self, x: u32, y: u32) -> Rgba {
        let i = ((y * self.image.width as u32 + x) * 4) as usize;
        let b = &self.image.bytes[i..i + 4];
        [b[0], b[1], b[2], b[3]]
    }
}

/// Where the tileset is in its lifecycle.
#[derive(Debug, Clone)]
pub enum AtlasState {
    Loading,
    Ready(Atlas),
    /// Terminal for the session; frames use placeholders from now on.
    Failed(String),
}

#[derive(Debug)]
pub struct Renderer {
    cell_px: u32,
    atlas: AtlasState,
    failure_report: Option<String>,
}

impl Renderer {
    pub fn new(cell_px: u32) -> Self {
        Renderer {
            cell_px: cell_px.max(1),
            atlas: AtlasState::Loading,
            failure_report: None,
        }
    }

    pub fn atlas_state(&self) -> &AtlasState {
        &self.atlas
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.atlas, AtlasState::Ready(_))
    }

    /// Starts (re)loading; ignored once loading has failed.
    pub fn mark_loading(&mut self) {
        if !matches!(self.atlas, AtlasState::Failed(_)) {
            self.atlas = AtlasState::Loading;
        }
    }

    pub fn set_atlas(&mut self, atlas: Atlas) {
        if let AtlasState::Failed(_) = self.atlas {
            log::debug!("atlas arrived after a load failure, keeping placeholders");
            return;
        }
        log::debug!(
            "atlas ready: {} columns of {} px",
            atlas.columns(),
            atlas.tile_px()
        );
        self.atlas = AtlasState::Ready(atlas);
    }

    /// Records a load failure. Only the first one is reported.
    pub fn set_atlas_failed(&mut self, reason: impl Into<String>) {
        if let AtlasState::Failed(_) = self.atlas {
            return;
        }
        let reason = reason.into();
        log::warn!("tileset failed to load: {}", reason);
        self.failure_report = Some(reason.clone());
        self.atlas = AtlasState::Failed(reason);
    }

    /// Pending failure message for the status surface, handed out once.
    pub fn take_failure_report(&mut self) -> Option<String> {
        self.failure_report.take()
    }

    /// Native frame size for a grid.
    pub fn frame_size(&self, grid: &GridStore) -> (u16, u16) {
        let px = |cells: u32| u16::try_from(cells.saturating_mul(self.cell_px)).unwrap_or(u16::MAX);
        (px(grid.cols()), px(grid.rows()))
    }

    /// Background, terrain, object stamps, grid lines, then the highlight.
    pub fn render(&self, grid: &GridStore, catalog: &Catalog, highlight: Option<Cell>) -> Image {
        let (w, h) = self.frame_size(grid);
        let mut frame = Frame::new(w, h, BACKGROUND);
        let cp = self.cell_px;

        for y in 0..grid.rows() {
            for x in 0..grid.cols() {
                let id = grid.terrain_at(Cell::new(x, y));
                self.draw_tile(&mut frame, id, x * cp, y * cp, cp, false);
            }
        }

        for obj in grid.objects() {
            let stamp = catalog.stamp(obj.id);
            for (dx, dy, tile) in stamp.opaque_cells() {
                let (cx, cy) = (obj.anchor.x.saturating_add(dx), obj.anchor.y.saturating_add(dy));
                if cx >= grid.cols() || cy >= grid.rows() {
                    continue;
                }
                self.draw_tile(&mut frame, tile, cx * cp, cy * cp, cp, true);
            }
        }

        for i in 0..=grid.cols() {
            let x = (i * cp).min(frame.w.saturating_sub(1));
            frame.vline(x, with_alpha(GOLD, band_alpha(i)));
        }
        for i in 0..=grid.rows() {
            let y = (i * cp).min(frame.h.saturating_sub(1));
            frame.hline(y, with_alpha(GOLD, band_alpha(i)));
        }

        if let Some(cell) = highlight.filter(|c| grid.contains(*c)) {
            let (x0, y0) = (cell.x * cp, cell.y * cp);
            frame.outline(x0 + 1, y0 + 1, cp.saturating_sub(2), HIGHLIGHT_OUTER);
            frame.outline(x0 + 2, y0 + 2, cp.saturating_sub(4), HIGHLIGHT_INNER);
        }

        frame.into_image()
    }

    /// Palette thumbnail for a tile, `size` px square.
    pub fn thumbnail(&self, id: TileId, size: u16) -> Image {
        let mut frame = Frame::new(size, size, PLACEHOLDER);
        match &self.atlas {
            AtlasState::Ready(atlas) if atlas.origin(id).is_some() => {
                blit_scaled(&mut frame, atlas, id, 0, 0, size as u32);
            }
            _ => {
                for y in 0..3.min(size as u32) {
                    frame.hline(y, with_alpha(GOLD, 140));
                }
            }
        }
        frame.into_image()
    }

    fn draw_tile(&self, frame: &mut Frame, id: TileId, x: u32, y: u32, size: u32, object: bool) {
        if let AtlasState::Ready(atlas) = &self.atlas {
            if atlas.origin(id).is_some() {
                blit_scaled(frame, atlas, id, x, y, size);
                return;
            }
        }
        let tint = PLACEHOLDER_TINTS[id.raw() as usize % PLACEHOLDER_TINTS.len()];
        if object {
            let inset = size / 4;
            frame.fill_rect(x + inset, y + inset, size - 2 * inset, size - 2 * inset, tint);
        } else {
            frame.fill_rect(x, y, size, size, tint);
        }
    }
}

fn band_alpha(line: u32) -> u8 {
    if line % 2 == 0 {
        GRID_ALPHA_EVEN
    } else {
        GRID_ALPHA_ODD
    }
}

#[inline]
fn with_alpha(c: Rgba, a: u8) -> Rgba {
    [c[0], c[1], c[2], a]
}

/// Nearest-neighbour copy of one atlas tile into a `size` square at (x, y).
fn blit_scaled(frame: &mut Frame, atlas: &Atlas, id: TileId, x: u32, y: u32, size: u32) {
    let Some((sx, sy)) = atlas.origin(id) else {
        return;
    };
    let tp = atlas.tile_px;
    for py in 0..size {
        let ty = sy + py * tp / size;
        for px in 0..size {
            let tx = sx + px * tp / size;
            frame.blend(x + px, y + py, atlas.texel(tx, ty));
        }
    }
}

/// RGBA8 scratch buffer with clipped drawing primitives.
struct Frame {
    w: u32,
    h: u32,
    image: Image,
}

impl Frame {
    fn new(w: u16, h: u16, fill: Rgba) -> Self {
        let color = Color::from_rgba(fill[0], fill[1], fill[2], fill[3]);
        Frame {
            w: w as u32,
            h: h as u32,
            image: Image::gen_image_color(w, h, color),
        }
    }

    /// Source-over blend, clipped to the frame.
    #[inline]
    fn blend(&mut self, x: u32, y: u32, src: Rgba) {
        if x >= self.w || y >= self.h || src[3] == 0 {
            return;
        }
        let i = ((y * self.w + x) * 4) as usize;
        let dst = &mut self.image.bytes[i..i + 4];
        let a = src[3] as u32;
        if a == 255 {
            dst.copy_from_slice(&src);
            return;
        }
        for c in 0..3 {
            dst[c] = ((src[c] as u32 * a + dst[c] as u32 * (255 - a) + 127) / 255) as u8;
        }
        dst[3] = (a + (dst[3] as u32 * (255 - a) + 127) / 255).min(255) as u8;
    }

    fn fill_rect(&mut self, x: u32, y: u32, w: u32, h: u32, c: Rgba) {
        for py in y..y.saturating_add(h) {
            for px in x..x.saturating_add(w) {
                self.blend(px, py, c);
            }
        }
    }

    fn hline(&mut self, y: u32, c: Rgba) {
        self.fill_rect(0, y, self.w, 1, c);
    }

    fn vline(&mut self, x: u32, c: Rgba) {
        self.fill_rect(x, 0, 1, self.h, c);
    }

    /// 1 px square outline of side `size` at (x, y).
    fn outline(&mut self, x: u32, y: u32, size: u32, c: Rgba) {
        if size == 0 {
            return;
        }
        let far = size - 1;
        self.fill_rect(x, y, size, 1, c);
        if far > 0 {
            self.fill_rect(x, y + far, size, 1, c);
        }
        self.fill_rect(x, y + 1, 1, far.saturating_sub(1), c);
        if far > 0 {
            self.fill_rect(x + far, y + 1, 1, far.saturating_sub(1), c);
        }
    }

    fn into_image(self) -> Image {
        self.image
    }
}
