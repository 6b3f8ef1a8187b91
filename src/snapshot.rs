//! JSON snapshots of the grid for save/load and export/import.
//!
//! Current documents look like
//! `{version, cols, rows, biome, terrain: [..], objects: [{id, x, y}, ..]}`.
//! The first prototype's `{v, meta: {cols, rows}, world, terrain, objects}`
//! layout, with `-1` for empty cells and one object id per cell, is still
//! accepted on import.
use crate::catalog::{Biome, Catalog};
use crate::error::MapError;
use crate::grid::{GridStore, PlacedObject};
use crate::spatial::{Cell, TileId};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// One placed object in a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectRecord {
    pub id: u32,
    pub x: u32,
    pub y: u32,
}

/// Serialized form of the grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapDocument {
    pub version: u32,
    pub cols: u32,
    pub rows: u32,
    pub biome: String,
    /// Row-major, `cols * rows` entries.
    pub terrain: Vec<u32>,
    /// Placement order, oldest first.
    pub objects: Vec<ObjectRecord>,
}

impl MapDocument {
    pub fn capture(grid: &GridStore, biome: Biome, version: u32) -> Self {
        MapDocument {
            version,
            cols: grid.cols(),
            rows: grid.rows(),
            biome: biome.key().to_owned(),
            terrain: grid.terrain().iter().map(|t| t.raw()).collect(),
            objects: grid
                .objects()
                .iter()
                .map(|o| ObjectRecord {
                    id: o.id.raw(),
                    x: o.anchor.x,
                    y: o.anchor.y,
                })
                .collect(),
        }
    }

    pub fn to_json(&self) -> Result<String, MapError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Validated layers ready to replace the grid.
#[derive(Debug, Clone, PartialEq)]
pub struct Restored {
    pub biome: Biome,
    pub terrain: Vec<TileId>,
    pub objects: Vec<PlacedObject>,
}

impl Restored {
    pub fn apply_to(self, grid: &mut GridStore) -> Biome {
        grid.replace(self.terrain, self.objects);
        self.biome
    }
}

// Loose mirror of MapDocument so missing arrays and negative ids can be
// reported instead of failing inside serde.
#[derive(Deserialize)]
struct JsonSnapshot {
    #[serde(default)]
    version: Option<u32>,
    cols: u32,
    rows: u32,
    #[serde(default)]
    biome: Option<String>,
    terrain: Option<Vec<Option<i64>>>,
    objects: Option<Vec<JsonObject>>,
}

#[derive(Deserialize)]
struct JsonObject {
    id: i64,
    #[serde(default)]
    x: i64,
    #[serde(default)]
    y: i64,
}

#[derive(Deserialize)]
struct LegacyMeta {
    cols: u32,
    rows: u32,
}

#[derive(Deserialize)]
struct LegacySnapshot {
    #[serde(default)]
    v: Option<u32>,
    meta: LegacyMeta,
    #[serde(default)]
    world: Option<String>,
    terrain: Option<Vec<Option<i64>>>,
    objects: Option<Vec<Option<i64>>>,
}

/// Import context: the fixed grid, the catalog and the biome used when a
/// document names one the catalog doesn't know.
pub struct Importer<'a> {
    pub cols: u32,
    pub rows: u32,
    pub catalog: &'a Catalog,
    pub fallback_biome: Biome,
}

impl<'a> Importer<'a> {
    pub fn new(grid: &GridStore, catalog: &'a Catalog, fallback_biome: Biome) -> Self {
        Importer {
            cols: grid.cols(),
            rows: grid.rows(),
            catalog,
            fallback_biome,
        }
    }

    /// Parses and validates a snapshot without touching any grid.
    pub fn decode(&self, txt: &str) -> Result<Restored, MapError> {
        let value: JsonValue = serde_json::from_str(txt)?;
        if !value.is_object() {
            return Err(MapError::InvalidMap("snapshot must be a JSON object".into()));
        }
        if value.get("meta").is_some() {
            let legacy: LegacySnapshot = serde_json::from_value(value)?;
            log::debug!("importing legacy snapshot v{}", legacy.v.unwrap_or(1));
            return self.decode_legacy(legacy);
        }

        let j: JsonSnapshot = serde_json::from_value(value)?;
        log::debug!("importing snapshot v{}", j.version.unwrap_or(0));
        self.check_size(j.cols, j.rows)?;
        let terrain = j
            .terrain
            .ok_or_else(|| MapError::InvalidMap("missing terrain array".into()))?;
        let objects = j
            .objects
            .ok_or_else(|| MapError::InvalidMap("missing objects array".into()))?;

        let biome = self.resolve_biome(j.biome.as_deref());
        let terrain = self.terrain_layer(&terrain, None)?;

        let mut placed = Vec::with_capacity(objects.len());
        for o in objects {
            let id = tile_id(o.id)?;
            let cell = Cell::new(clamp_coord(o.x), clamp_coord(o.y));
            placed.push(self.instance(id, cell));
        }
        self.warn_unknown(&terrain, &placed);

        Ok(Restored {
            biome,
            terrain,
            objects: placed,
        })
    }

    fn decode_legacy(&self, j: LegacySnapshot) -> Result<Restored, MapError> {
        self.check_size(j.meta.cols, j.meta.rows)?;
        let terrain = j
            .terrain
            .ok_or_else(|| MapError::InvalidMap("missing terrain array".into()))?;
        let objects = j
            .objects
            .ok_or_else(|| MapError::InvalidMap("missing objects array".into()))?;
        if objects.len() != (self.cols * self.rows) as usize {
            return Err(MapError::InvalidMap(format!(
                "objects array has {} cells, expected {}",
                objects.len(),
                self.cols * self.rows
            )));
        }

        let biome = self.resolve_biome(j.world.as_deref());
        let terrain = self.terrain_layer(&terrain, Some(self.catalog.default_terrain(biome)))?;

        let mut placed = Vec::new();
        for (i, raw) in objects.into_iter().enumerate() {
            let Some(raw) = raw.filter(|r| *r != LEGACY_EMPTY) else {
                continue;
            };
            let i = i as u32;
            placed.push(self.instance(tile_id(raw)?, Cell::new(i % self.cols, i / self.cols)));
        }
        self.warn_unknown(&terrain, &placed);

        Ok(Restored {
            biome,
            terrain,
            objects: placed,
        })
    }

    fn check_size(&self, cols: u32, rows: u32) -> Result<(), MapError> {
        if (cols, rows) != (self.cols, self.rows) {
            return Err(MapError::SizeMismatch {
                expected: (self.cols, self.rows),
                found: (cols, rows),
            });
        }
        Ok(())
    }

    fn resolve_biome(&self, key: Option<&str>) -> Biome {
        match key.and_then(Biome::from_key) {
            Some(b) if self.catalog.has_biome(b) => b,
            _ => {
                log::warn!(
                    "unknown biome {:?} in snapshot, using {}",
                    key,
                    self.fallback_biome.key()
                );
                self.fallback_biome
            }
        }
    }

    /// `empty` is what legacy `-1`/`null` cells become; current documents have
    /// no empty cells and reject them.
    fn terrain_layer(&self, raw: &[Option<i64>], empty: Option<TileId>) -> Result<Vec<TileId>, MapError> {
        let expected = (self.cols * self.rows) as usize;
        if raw.len() != expected {
            return Err(MapError::InvalidMap(format!(
                "terrain array has {} cells, expected {}",
                raw.len(),
                expected
            )));
        }
        raw.iter()
            .enumerate()
            .map(|(i, t)| match (*t, empty) {
                (None, Some(fill)) | (Some(LEGACY_EMPTY), Some(fill)) => Ok(fill),
                (Some(v), _) => tile_id(v),
                (None, None) => Err(MapError::InvalidMap(format!("terrain cell {} is empty", i))),
            })
            .collect()
    }

    fn instance(&self, id: TileId, cell: Cell) -> PlacedObject {
        let footprint = self.catalog.footprint(id);
        let cell = Cell::new(
            cell.x.min(self.cols.saturating_sub(1)),
            cell.y.min(self.rows.saturating_sub(1)),
        );
        PlacedObject {
            id,
            anchor: footprint.clamp_anchor(cell, self.cols, self.rows),
            footprint,
        }
    }

    fn warn_unknown(&self, terrain: &[TileId], objects: &[PlacedObject]) {
        let bad_terrain = terrain.iter().filter(|t| !self.catalog.is_terrain(**t)).count();
        let bad_objects = objects.iter().filter(|o| !self.catalog.is_object(o.id)).count();
        if bad_terrain + bad_objects > 0 {
            log::warn!(
                "snapshot references {} terrain and {} object ids outside the catalog",
                bad_terrain,
                bad_objects
            );
        }
    }
}

/// Empty cell marker of the first snapshot layout.
const LEGACY_EMPTY: i64 = -1;

fn tile_id(raw: i64) -> Result<TileId, MapError> {
    u32::try_from(raw)
        .map(TileId)
        .map_err(|_| MapError::InvalidMap(format!("invalid tile id {}", raw)))
}

fn clamp_coord(v: i64) -> u32 {
    v.clamp(0, u32::MAX as i64) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (GridStore, Catalog) {
        (GridStore::new(4, 4, TileId(0)), Catalog::builtin())
    }

    #[test]
    fn capture_projects_grid() {
        let (mut g, c) = setup();
        g.set_terrain(Cell::new(1, 1), TileId(2));
        g.place_object(&c, TileId(100), Cell::new(3, 3));
        let doc = MapDocument::capture(&g, Biome::Overworld, 2);
        assert_eq!(doc.terrain[5], 2);
        assert_eq!(doc.objects, [ObjectRecord { id: 100, x: 2, y: 2 }]);
        assert_eq!(doc.biome, "overworld");
    }

    #[test]
    fn decode_clamps_objects_into_bounds() {
        let (g, c) = setup();
        let txt = r#"{"version":2,"cols":4,"rows":4,"biome":"ancient",
            "terrain":[0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0],
            "objects":[{"id":102,"x":9,"y":-3},{"id":96,"x":3,"y":3}]}"#;
        let r = Importer::new(&g, &c, Biome::Overworld).decode(txt).expect("decode");
        assert_eq!(r.biome, Biome::Ancient);
        assert_eq!(r.objects[0].anchor, Cell::new(2, 0));
        assert_eq!(r.objects[1].anchor, Cell::new(3, 3));
    }

    #[test]
    fn unknown_biome_falls_back() {
        let (g, c) = setup();
        let txt = r#"{"cols":4,"rows":4,"biome":"lunar","terrain":[0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0],"objects":[]}"#;
        let r = Importer::new(&g, &c, Biome::Modern).decode(txt).expect("decode");
        assert_eq!(r.biome, Biome::Modern);
    }

    #[test]
    fn missing_arrays_are_rejected() {
        let (g, c) = setup();
        let imp = Importer::new(&g, &c, Biome::Overworld);
        let no_objects = r#"{"cols":4,"rows":4,"biome":"overworld","terrain":[0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0]}"#;
        assert!(matches!(imp.decode(no_objects), Err(MapError::InvalidMap(_))));
        let no_terrain = r#"{"cols":4,"rows":4,"biome":"overworld","objects":[]}"#;
        assert!(matches!(imp.decode(no_terrain), Err(MapError::InvalidMap(_))));
        let short = r#"{"cols":4,"rows":4,"terrain":[0,0],"objects":[]}"#;
        assert!(matches!(imp.decode(short), Err(MapError::InvalidMap(_))));
    }

    #[test]
    fn size_mismatch_is_typed() {
        let (g, c) = setup();
        let txt = r#"{"cols":4,"rows":5,"biome":"overworld","terrain":[],"objects":[]}"#;
        let err = Importer::new(&g, &c, Biome::Overworld).decode(txt).unwrap_err();
        assert!(matches!(
            err,
            MapError::SizeMismatch {
                expected: (4, 4),
                found: (4, 5)
            }
        ));
    }

    #[test]
    fn negative_object_id_is_rejected() {
        let (g, c) = setup();
        let txt = r#"{"cols":4,"rows":4,"terrain":[0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0],"objects":[{"id":-4,"x":0,"y":0}]}"#;
        let err = Importer::new(&g, &c, Biome::Overworld).decode(txt).unwrap_err();
        assert!(matches!(err, MapError::InvalidMap(_)));
    }

    #[test]
    fn negative_or_empty_terrain_is_rejected() {
        let (g, c) = setup();
        let imp = Importer::new(&g, &c, Biome::Overworld);
        let negative = r#"{"cols":4,"rows":4,"biome":"ancient","terrain":[-7,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0],"objects":[]}"#;
        assert!(matches!(imp.decode(negative), Err(MapError::InvalidMap(_))));
        let sentinel = negative.replace("-7", "-1");
        assert!(matches!(imp.decode(&sentinel), Err(MapError::InvalidMap(_))));
        let null = negative.replace("-7", "null");
        assert!(matches!(imp.decode(&null), Err(MapError::InvalidMap(_))));
    }

    #[test]
    fn legacy_rejects_negative_ids_other_than_empty() {
        let (g, c) = setup();
        let imp = Importer::new(&g, &c, Biome::Overworld);
        let txt = r#"{"meta":{"cols":4,"rows":4},"world":"ancient",
            "terrain":[-7,-1,-1,-1,-1,-1,-1,-1,-1,-1,-1,-1,-1,-1,-1,-1],
            "objects":[-1,-1,-1,-1,-1,-1,-1,-1,-1,-1,-1,-1,-1,-1,-1,-1]}"#;
        assert!(matches!(imp.decode(txt), Err(MapError::InvalidMap(_))));
        let txt = txt.replacen("-7", "null", 1).replacen("[-1,-1", "[-3,-1", 1);
        assert!(matches!(imp.decode(&txt), Err(MapError::InvalidMap(_))));
    }

    #[test]
    fn legacy_documents_become_single_cell_instances() {
        let (g, c) = setup();
        let txt = r#"{"v":1,"meta":{"cols":4,"rows":4},"world":"ancient",
            "terrain":[2,-1,-1,-1,-1,-1,-1,-1,-1,-1,-1,-1,-1,-1,-1,3],
            "objects":[-1,96,-1,-1,-1,-1,-1,-1,-1,-1,-1,-1,-1,-1,113,-1]}"#;
        let r = Importer::new(&g, &c, Biome::Overworld).decode(txt).expect("legacy");
        assert_eq!(r.biome, Biome::Ancient);
        assert_eq!(r.terrain[0], TileId(2));
        assert_eq!(r.terrain[1], TileId(1));
        assert_eq!(r.terrain[15], TileId(3));
        let anchors: Vec<_> = r.objects.iter().map(|o| (o.id, o.anchor)).collect();
        assert_eq!(
            anchors,
            [(TileId(96), Cell::new(1, 0)), (TileId(113), Cell::new(2, 3))]
        );
    }

    #[test]
    fn not_json_is_a_parse_error() {
        let (g, c) = setup();
        let err = Importer::new(&g, &c, Biome::Overworld).decode("{oops").unwrap_err();
        assert!(matches!(err, MapError::Json { .. }));
        let err = Importer::new(&g, &c, Biome::Overworld).decode("[1,2]").unwrap_err();
        assert!(matches!(err, MapError::InvalidMap(_)));
    }
}
