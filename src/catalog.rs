//! Static tile catalog: which ids are terrain, which are objects, what each
//! biome may paint with and how multi-cell objects are stamped.
use crate::error::MapError;
use crate::spatial::{Footprint, TileId};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

/// World theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Biome {
    #[default]
    Overworld,
    Ancient,
    Modern,
}

impl Biome {
    pub const ALL: [Biome; 3] = [Biome::Overworld, Biome::Ancient, Biome::Modern];

    /// Key used in snapshots and catalog documents.
    pub fn key(self) -> &'static str {
        match self {
            Biome::Overworld => "overworld",
            Biome::Ancient => "ancient",
            Biome::Modern => "modern",
        }
    }

    pub fn from_key(key: &str) -> Option<Biome> {
        Biome::ALL.into_iter().find(|b| b.key() == key)
    }

    pub fn label(self) -> &'static str {
        match self {
            Biome::Overworld => "Overworld",
            Biome::Ancient => "Ancient",
            Biome::Modern => "Modern",
        }
    }
}

impl fmt::Display for Biome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Which layer an id belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TileKind {
    Terrain,
    Object,
}

/// Per-cell atlas indices for an object, row-major; `None` is transparent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stamp {
    pub footprint: Footprint,
    cells: Vec<Option<TileId>>,
}

impl Stamp {
    pub fn new(footprint: Footprint, cells: Vec<Option<TileId>>) -> Result<Self, MapError> {
        if footprint.w == 0 || footprint.h == 0 {
            return Err(MapError::InvalidMap("stamp footprint must not be empty".into()));
        }
        if cells.len() != (footprint.w * footprint.h) as usize {
            return Err(MapError::InvalidMap(format!(
                "stamp has {} cells, footprint {}x{} needs {}",
                cells.len(),
                footprint.w,
                footprint.h,
                footprint.w * footprint.h
            )));
        }
        Ok(Stamp { footprint, cells })
    }

    /// 1x1 stamp drawing the id's own atlas tile.
    pub fn identity(id: TileId) -> Self {
        Stamp {
            footprint: Footprint::SINGLE,
            cells: vec![Some(id)],
        }
    }

    #[inline]
    pub fn get(&self, dx: u32, dy: u32) -> Option<TileId> {
        if dx >= self.footprint.w || dy >= self.footprint.h {
            return None;
        }
        self.cells[(dy * self.footprint.w + dx) as usize]
    }

    /// `(dx, dy, atlas id)` for every opaque cell.
    pub fn opaque_cells(&self) -> impl Iterator<Item = (u32, u32, TileId)> + '_ {
        let w = self.footprint.w;
        self.cells
            .iter()
            .enumerate()
            .filter_map(move |(i, c)| c.map(|id| (i as u32 % w, i as u32 / w, id)))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectSpec {
    pub category: String,
    /// `None` falls back to [`Stamp::identity`].
    pub stamp: Option<Stamp>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EntryKind {
    Terrain,
    Object(ObjectSpec),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    pub name: String,
    pub kind: EntryKind,
}

impl CatalogEntry {
    pub fn tile_kind(&self) -> TileKind {
        match self.kind {
            EntryKind::Terrain => TileKind::Terrain,
            EntryKind::Object(_) => TileKind::Object,
        }
    }
}

/// What a biome may paint with.
#[derive(Debug, Clone, PartialEq)]
pub struct BiomePalette {
    pub default_terrain: TileId,
    pub terrain: Vec<TileId>,
    pub objects: Vec<TileId>,
}

/// A band of atlas rows shown in the raw "all tiles" palette.
#[derive(Debug, Clone, PartialEq)]
pub struct Zone {
    pub name: String,
    pub start_row: u32,
    pub end_row: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PaletteItem {
    pub id: TileId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PaletteGroup {
    pub title: String,
    pub items: Vec<PaletteItem>,
}

/// Atlas layout a catalog document was authored against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AtlasGeometry {
    pub columns: u32,
    pub tile_px: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    entries: BTreeMap<TileId, CatalogEntry>,
    biomes: BTreeMap<Biome, BiomePalette>,
    zones: Vec<Zone>,
    geometry: Option<AtlasGeometry>,
}

impl Catalog {
    pub(crate) fn empty() -> Self {
        Catalog {
            entries: BTreeMap::new(),
            biomes: BTreeMap::new(),
            zones: Vec::new(),
            geometry: None,
        }
    }

    pub(crate) fn set_geometry(&mut self, geometry: AtlasGeometry) {
        self.geometry = Some(geometry);
    }

    /// `None` when the catalog leaves the atlas layout to the editor config.
    pub fn atlas_geometry(&self) -> Option<AtlasGeometry> {
        self.geometry
    }

    pub(crate) fn insert_entry(&mut self, id: TileId, entry: CatalogEntry) -> Result<(), MapError> {
        if let Some(prev) = self.entries.get(&id) {
            return Err(MapError::InvalidMap(format!(
                "tile {} declared twice ('{}' and '{}')",
                id, prev.name, entry.name
            )));
        }
        self.entries.insert(id, entry);
        Ok(())
    }

    pub(crate) fn insert_biome(&mut self, biome: Biome, palette: BiomePalette) {
        self.biomes.insert(biome, palette);
    }

    pub(crate) fn push_zone(&mut self, zone: Zone) {
        self.zones.push(zone);
    }

    /// Every biome present, palettes reference ids of the right kind.
    pub(crate) fn validate(&self) -> Result<(), MapError> {
        for biome in Biome::ALL {
            let Some(pal) = self.biomes.get(&biome) else {
                return Err(MapError::UnknownBiome(biome.key().to_owned()));
            };
            if self.kind(pal.default_terrain) != Some(TileKind::Terrain) {
                return Err(MapError::InvalidMap(format!(
                    "default terrain {} of biome '{}' is not a terrain tile",
                    pal.default_terrain,
                    biome.key()
                )));
            }
            for (ids, want) in [(&pal.terrain, TileKind::Terrain), (&pal.objects, TileKind::Object)] {
                for &id in ids {
                    match self.kind(id) {
                        Some(k) if k == want => {}
                        Some(_) => {
                            return Err(MapError::InvalidMap(format!(
                                "tile {} listed under the wrong layer in biome '{}'",
                                id,
                                biome.key()
                            )))
                        }
                        None => return Err(MapError::UnknownTile(id)),
                    }
                }
            }
        }
        Ok(())
    }

    pub fn entry(&self, id: TileId) -> Option<&CatalogEntry> {
        self.entries.get(&id)
    }

    pub fn kind(&self, id: TileId) -> Option<TileKind> {
        self.entries.get(&id).map(CatalogEntry::tile_kind)
    }

    pub fn is_terrain(&self, id: TileId) -> bool {
        self.kind(id) == Some(TileKind::Terrain)
    }

    pub fn is_object(&self, id: TileId) -> bool {
        self.kind(id) == Some(TileKind::Object)
    }

    /// Display name, `Tile 007` for ids the catalog doesn't name.
    pub fn name(&self, id: TileId) -> Cow<'_, str> {
        match self.entries.get(&id) {
            Some(e) => Cow::Borrowed(e.name.as_str()),
            None => Cow::Owned(format!("Tile {:03}", id.raw())),
        }
    }

    pub fn object(&self, id: TileId) -> Result<&ObjectSpec, MapError> {
        match self.entries.get(&id).map(|e| &e.kind) {
            Some(EntryKind::Object(obj)) => Ok(obj),
            _ => Err(MapError::UnknownTile(id)),
        }
    }

    fn palette_of(&self, biome: Biome) -> &BiomePalette {
        // validate() guarantees every biome has a palette
        &self.biomes[&biome]
    }

    pub fn has_biome(&self, biome: Biome) -> bool {
        self.biomes.contains_key(&biome)
    }

    pub fn terrain_ids(&self, biome: Biome) -> &[TileId] {
        &self.palette_of(biome).terrain
    }

    pub fn object_ids(&self, biome: Biome) -> &[TileId] {
        &self.palette_of(biome).objects
    }

    pub fn default_terrain(&self, biome: Biome) -> TileId {
        self.palette_of(biome).default_terrain
    }

    /// Footprint of an object id; 1x1 for anything without a stamp.
    pub fn footprint(&self, id: TileId) -> Footprint {
        match self.object(id) {
            Ok(ObjectSpec {
                stamp: Some(stamp), ..
            }) => stamp.footprint,
            _ => Footprint::SINGLE,
        }
    }

    /// Stamp of an object id; ids with no multi-cell entry (including ids the
    /// catalog doesn't know) draw as their own atlas tile.
    pub fn stamp(&self, id: TileId) -> Cow<'_, Stamp> {
        match self.object(id) {
            Ok(ObjectSpec {
                stamp: Some(stamp), ..
            }) => Cow::Borrowed(stamp),
            _ => Cow::Owned(Stamp::identity(id)),
        }
    }

    /// Named palette for a biome: terrain first, then objects by category in
    /// declaration order.
    pub fn palette(&self, biome: Biome) -> Vec<PaletteGroup> {
        let pal = self.palette_of(biome);
        let item = |id: TileId| PaletteItem {
            id,
            name: self.name(id).into_owned(),
        };

        let mut groups = vec![PaletteGroup {
            title: "Terrain".to_owned(),
            items: pal.terrain.iter().copied().map(item).collect(),
        }];
        for &id in &pal.objects {
            let category = match self.object(id) {
                Ok(obj) => format!("{} {}", biome.label(), obj.category),
                Err(_) => continue,
            };
            match groups.iter_mut().find(|g| g.title == category) {
                Some(g) => g.items.push(item(id)),
                None => groups.push(PaletteGroup {
                    title: category,
                    items: vec![item(id)],
                }),
            }
        }
        groups
    }

    /// Raw atlas ids per zone for an atlas `columns` wide; `reserved` zones
    /// are skipped.
    pub fn zone_tiles(&self, columns: u32) -> Vec<PaletteGroup> {
        self.zones
            .iter()
            .filter(|z| z.name != "reserved")
            .map(|z| PaletteGroup {
                title: z.name.clone(),
                items: (z.start_row.saturating_mul(columns)..z.end_row.saturating_mul(columns))
                    .map(|raw| PaletteItem {
                        id: TileId(raw),
                        name: format!("Tile {:03}", raw),
                    })
                    .collect(),
            })
            .collect()
    }

    /// Catalog from a JSON document, see [`crate::loader::catalog_json`].
    pub fn from_json_str(txt: &str) -> Result<Self, MapError> {
        crate::loader::catalog_json::decode_catalog_str(txt)
    }

    pub fn from_file(path: &std::path::Path) -> Result<Self, MapError> {
        crate::loader::catalog_json::decode_catalog_file(path)
    }

    /// The catalog compiled into the editor.
    pub fn builtin() -> Self {
        let mut c = Catalog::empty();

        let terrain: [(u32, &str); 9] = [
            (0, "Grass"),
            (1, "Dirt"),
            (2, "Stone"),
            (3, "Water"),
            (4, "Sand"),
            (8, "Cobblestone"),
            (9, "Moss"),
            (16, "Asphalt"),
            (17, "Concrete"),
        ];
        for (id, name) in terrain {
            c.entries.insert(
                TileId(id),
                CatalogEntry {
                    name: name.to_owned(),
                    kind: EntryKind::Terrain,
                },
            );
        }

        let t = |ids: &[Option<u32>]| ids.iter().map(|i| i.map(TileId)).collect::<Vec<_>>();
        // (id, name, category, w, h, stamp); an empty stamp means 1x1 identity
        let objects: [(u32, &str, &str, u32, u32, Vec<Option<TileId>>); 11] = [
            (96, "Rock", "Objects", 1, 1, vec![]),
            (97, "Bush", "Objects", 1, 1, vec![]),
            (98, "Tree", "Objects", 1, 2, t(&[Some(98), Some(106)])),
            (100, "Cottage", "Structures", 2, 2, t(&[Some(100), Some(101), Some(108), Some(109)])),
            (102, "Shrine", "Structures", 2, 2, t(&[Some(102), Some(103), Some(110), Some(111)])),
            (112, "Pillar", "Structures", 1, 2, t(&[Some(112), Some(120)])),
            (113, "Campfire", "Objects", 1, 1, vec![]),
            (114, "Cart", "Transport", 2, 1, t(&[Some(114), Some(115)])),
            (
                116,
                "Tower",
                "Structures",
                2,
                3,
                t(&[Some(116), None, Some(124), Some(125), Some(132), Some(133)]),
            ),
            (118, "Car", "Vehicles", 2, 1, t(&[Some(118), Some(119)])),
            (121, "Lamp Post", "Objects", 1, 1, vec![]),
        ];
        for (id, name, category, w, h, cells) in objects {
            let stamp = if cells.is_empty() {
                None
            } else {
                Some(Stamp {
                    footprint: Footprint { w, h },
                    cells,
                })
            };
            c.entries.insert(
                TileId(id),
                CatalogEntry {
                    name: name.to_owned(),
                    kind: EntryKind::Object(ObjectSpec {
                        category: category.to_owned(),
                        stamp,
                    }),
                },
            );
        }

        let ids = |raw: &[u32]| raw.iter().copied().map(TileId).collect::<Vec<_>>();
        let shared = [0, 1, 2, 3, 4];
        c.insert_biome(
            Biome::Overworld,
            BiomePalette {
                default_terrain: TileId(0),
                terrain: ids(&shared),
                objects: ids(&[96, 97, 98, 100]),
            },
        );
        c.insert_biome(
            Biome::Ancient,
            BiomePalette {
                default_terrain: TileId(1),
                terrain: ids(&[0, 1, 2, 3, 4, 8, 9]),
                objects: ids(&[96, 98, 102, 112, 113, 114]),
            },
        );
        c.insert_biome(
            Biome::Modern,
            BiomePalette {
                default_terrain: TileId(17),
                terrain: ids(&[0, 1, 2, 3, 4, 16, 17]),
                objects: ids(&[96, 97, 116, 118, 121]),
            },
        );

        c.push_zone(Zone {
            name: "Terrain".into(),
            start_row: 0,
            end_row: 12,
        });
        c.push_zone(Zone {
            name: "Objects".into(),
            start_row: 12,
            end_row: 17,
        });
        c.push_zone(Zone {
            name: "reserved".into(),
            start_row: 17,
            end_row: 18,
        });
        c
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Catalog::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_is_consistent() {
        Catalog::builtin().validate().expect("builtin catalog");
    }

    #[test]
    fn ids_are_tagged_not_ranged() {
        let c = Catalog::builtin();
        assert!(c.is_terrain(TileId(2)));
        assert!(c.is_object(TileId(100)));
        assert_eq!(c.kind(TileId(50)), None);
        assert!(matches!(c.object(TileId(2)), Err(MapError::UnknownTile(TileId(2)))));
    }

    #[test]
    fn stamp_falls_back_to_identity() {
        let c = Catalog::builtin();
        assert_eq!(c.footprint(TileId(96)), Footprint::SINGLE);
        assert_eq!(c.stamp(TileId(96)).get(0, 0), Some(TileId(96)));
        // unknown ids too
        assert_eq!(c.stamp(TileId(4000)).into_owned(), Stamp::identity(TileId(4000)));
        assert_eq!(c.footprint(TileId(100)), Footprint { w: 2, h: 2 });
        assert_eq!(c.stamp(TileId(100)).get(1, 1), Some(TileId(109)));
    }

    #[test]
    fn tower_has_transparent_cell() {
        let c = Catalog::builtin();
        let stamp = c.stamp(TileId(116));
        assert_eq!(stamp.get(1, 0), None);
        assert_eq!(stamp.opaque_cells().count(), 5);
    }

    #[test]
    fn biome_defaults_differ() {
        let c = Catalog::builtin();
        assert_eq!(c.default_terrain(Biome::Overworld), TileId(0));
        assert_eq!(c.default_terrain(Biome::Ancient), TileId(1));
        assert_eq!(c.default_terrain(Biome::Modern), TileId(17));
    }

    #[test]
    fn palette_groups_by_category() {
        let c = Catalog::builtin();
        let groups = c.palette(Biome::Ancient);
        let titles: Vec<_> = groups.iter().map(|g| g.title.as_str()).collect();
        assert_eq!(
            titles,
            ["Terrain", "Ancient Objects", "Ancient Structures", "Ancient Transport"]
        );
        assert_eq!(groups[0].items[0].name, "Grass");
    }

    #[test]
    fn zone_tiles_skip_reserved() {
        let groups = Catalog::builtin().zone_tiles(8);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].items.len(), 96);
        assert_eq!(groups[1].items[0].name, "Tile 096");
    }

    #[test]
    fn biome_keys_round_trip() {
        for b in Biome::ALL {
            assert_eq!(Biome::from_key(b.key()), Some(b));
        }
        assert_eq!(Biome::from_key("lunar"), None);
    }
}
