// tests/map_tests.rs

use remnant_tilemap::{Biome, Catalog, Cell, EditorConfig, Editor, Footprint, GridStore, Mode, TileId};

fn editor_4x4() -> Editor {
    Editor::new(EditorConfig::with_grid(4, 4), Catalog::builtin()).expect("editor")
}

#[test]
fn set_terrain_then_read_back_for_every_palette_id() {
    let catalog = Catalog::builtin();
    let mut grid = GridStore::new(4, 4, catalog.default_terrain(Biome::Ancient));
    for &t in catalog.terrain_ids(Biome::Ancient) {
        for (x, y) in [(0, 0), (3, 0), (2, 3), (3, 3)] {
            grid.set_terrain(Cell::new(x, y), t);
            assert_eq!(grid.terrain_at(Cell::new(x, y)), t);
        }
    }
}

#[test]
fn oversized_placement_is_clamped_flush_to_the_edge() {
    let catalog = Catalog::builtin();
    let mut grid = GridStore::new(4, 4, TileId(0));
    for id in [TileId(100), TileId(116), TileId(118), TileId(98)] {
        let fp: Footprint = catalog.footprint(id);
        let placed = grid.place_object(&catalog, id, Cell::new(3, 3));
        assert_eq!(placed.anchor.x + fp.w, 4, "{id}");
        assert_eq!(placed.anchor.y + fp.h, 4, "{id}");
    }
}

#[test]
fn placing_over_an_anchor_removes_only_that_instance() {
    let catalog = Catalog::builtin();
    let mut grid = GridStore::new(4, 4, TileId(0));
    grid.place_object(&catalog, TileId(96), Cell::new(1, 1)); // B
    grid.place_object(&catalog, TileId(97), Cell::new(2, 2)); // also under A's footprint
    grid.place_object(&catalog, TileId(100), Cell::new(1, 1)); // A
    let ids: Vec<_> = grid.objects().iter().map(|o| o.id).collect();
    assert_eq!(ids, [TileId(97), TileId(100)]);
}

#[test]
fn export_then_import_restores_state_and_order() {
    let mut ed = editor_4x4();
    ed.select_terrain(TileId(3)).unwrap();
    ed.paint_cell(Cell::new(0, 1));
    ed.select_mode(Mode::Object);
    for (id, x, y) in [(98, 3, 3), (96, 0, 0), (100, 1, 1), (97, 0, 3)] {
        ed.select_object(TileId(id)).unwrap();
        ed.paint_cell(Cell::new(x, y));
    }
    ed.select_mode(Mode::Eraser);
    ed.paint_cell(Cell::new(0, 0));

    let json = ed.export_json().unwrap();
    let mut other = editor_4x4();
    other.import_json(&json).unwrap();
    assert_eq!(other.grid(), ed.grid());
    assert_eq!(other.export_json().unwrap(), json);
}

#[test]
fn eraser_uses_current_biome_default_after_switch() {
    let mut ed = editor_4x4();
    ed.select_terrain(TileId(2)).unwrap();
    ed.paint_cell(Cell::new(2, 1));
    ed.select_biome(Biome::Ancient);
    ed.select_mode(Mode::Eraser);
    ed.paint_cell(Cell::new(2, 1));
    assert_eq!(ed.grid().terrain_at(Cell::new(2, 1)), TileId(1));
    assert_ne!(ed.grid().terrain_at(Cell::new(2, 1)), TileId(0));
}

#[test]
fn drag_over_same_cell_mutates_once() {
    use macroquad::math::{Rect, Vec2};
    let shown = Rect::new(0.0, 0.0, 128.0, 128.0);
    let mut ed = editor_4x4();
    ed.select_mode(Mode::Object);
    ed.select_object(TileId(96)).unwrap();
    ed.pointer_down(Vec2::new(40.0, 40.0), shown);
    ed.pointer_move(Vec2::new(45.0, 41.0), shown);
    ed.pointer_move(Vec2::new(50.0, 60.0), shown);
    ed.pointer_up();
    assert_eq!(ed.grid().objects().len(), 1);
}
