// src/loader/catalog_json.rs
use crate::catalog::*;
use crate::error::MapError;
use crate::spatial::{Footprint, TileId};
use serde::Deserialize;
use std::path::Path;

#[derive(Deserialize)]
struct JsonTerrain {
    id: u32,
    #[serde(default)]
    name: String,
}

#[derive(Deserialize)]
struct JsonObject {
    id: u32,
    #[serde(default)]
    name: String,
    #[serde(default = "default_category")]
    category: String,
    /// `[w, h]`, 1x1 when absent
    #[serde(default)]
    size: Option<[u32; 2]>,
    /// row-major atlas ids, `null` is transparent
    #[serde(default)]
    stamp: Vec<Option<u32>>,
}

fn default_category() -> String {
    "Objects".to_owned()
}

#[derive(Deserialize)]
struct JsonBiome {
    key: String,
    default_terrain: u32,
    #[serde(default)]
    terrain: Vec<u32>,
    #[serde(default)]
    objects: Vec<u32>,
}

#[derive(Deserialize)]
struct JsonZone {
    name: String,
    start_row: u32,
    end_row: u32,
}

/// Atlas layout; `cols`/`tileSize` are the older spellings.
#[derive(Deserialize)]
struct JsonMeta {
    #[serde(alias = "cols")]
    columns: u32,
    #[serde(alias = "tileSize")]
    tile_size: u32,
}

#[derive(Deserialize)]
struct JsonCatalog {
    #[serde(default)]
    meta: Option<JsonMeta>,
    terrain: Vec<JsonTerrain>,
    objects: Vec<JsonObject>,
    biomes: Vec<JsonBiome>,
    #[serde(default)]
    zones: Vec<JsonZone>,
}

fn object_to_entry(obj: JsonObject) -> Result<CatalogEntry, MapError> {
    let stamp = match (obj.size, obj.stamp.is_empty()) {
        (None, true) | (Some([1, 1]), true) => None,
        (Some([w, h]), false) => Some(Stamp::new(
            Footprint { w, h },
            obj.stamp.into_iter().map(|c| c.map(TileId)).collect(),
        )?),
        (None, false) => Some(Stamp::new(
            Footprint::SINGLE,
            obj.stamp.into_iter().map(|c| c.map(TileId)).collect(),
        )?),
        (Some([w, h]), true) => {
            return Err(MapError::InvalidMap(format!(
                "object {} is {}x{} but has no stamp",
                obj.id, w, h
            )))
        }
    };

    Ok(CatalogEntry {
        name: obj.name,
        kind: EntryKind::Object(ObjectSpec {
            category: obj.category,
            stamp,
        }),
    })
}

pub fn decode_catalog_str(txt: &str) -> Result<Catalog, MapError> {
    let j: JsonCatalog = serde_json::from_str(txt)?;
    let mut catalog = Catalog::empty();

    if let Some(meta) = j.meta {
        if meta.columns == 0 || meta.tile_size == 0 {
            return Err(MapError::InvalidMap(format!(
                "atlas meta must be positive, got {} columns of {} px",
                meta.columns, meta.tile_size
            )));
        }
        catalog.set_geometry(AtlasGeometry {
            columns: meta.columns,
            tile_px: meta.tile_size,
        });
    }

    for t in j.terrain {
        catalog.insert_entry(
            TileId(t.id),
            CatalogEntry {
                name: t.name,
                kind: EntryKind::Terrain,
            },
        )?;
    }
    for o in j.objects {
        let id = TileId(o.id);
        catalog.insert_entry(id, object_to_entry(o)?)?;
    }

    for b in j.biomes {
        let biome = Biome::from_key(&b.key).ok_or_else(|| MapError::UnknownBiome(b.key.clone()))?;
        catalog.insert_biome(
            biome,
            BiomePalette {
                default_terrain: TileId(b.default_terrain),
                terrain: b.terrain.into_iter().map(TileId).collect(),
                objects: b.objects.into_iter().map(TileId).collect(),
            },
        );
    }

    for z in j.zones {
        if z.end_row < z.start_row {
            return Err(MapError::InvalidMap(format!(
                "zone '{}' ends before it starts",
                z.name
            )));
        }
        catalog.push_zone(Zone {
            name: z.name,
            start_row: z.start_row,
            end_row: z.end_row,
        });
    }

    catalog.validate()?;
    log::debug!("catalog decoded");
    Ok(catalog)
}

pub fn decode_catalog_file(path: &Path) -> Result<Catalog, MapError> {
    if path.extension().and_then(|e| e.to_str()) != Some("json") {
        return Err(MapError::UnsupportedFormat(path.display().to_string()));
    }
    let txt = std::fs::read_to_string(path).map_err(|source| MapError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    decode_catalog_str(&txt)
}
