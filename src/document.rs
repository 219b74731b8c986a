//! Moving map data between the codec and the host document
//!
//! Export walks a [`MapDocument`] into a [`MapData`]: cells and objects are
//! reduced to tile ids plus the external ids those tiles carry. Import goes the
//! other way, resolving external ids (or legacy numeric ids) back to tiles in
//! the supplied tilesets. Content that cannot be resolved on import is logged
//! and skipped; on export every cell and object must resolve.

use ahash::AHashMap;
use mapdoc::{MapDocument, MapObject, ObjectLayer, Tile, TileLayer, TileRef, Tileset};

use crate::codec::{
    coerce_properties, CoordinateTransform, GroupKind, InternTable, ObjectGroup, ObjectRecord,
    TileGrid, DOUBLE_HEIGHT, MAP_CHIP_TILESET, RESERVED_ID_KEY, TILE_SIZE,
};
use crate::error::{Error, Result};
use crate::format::legacy::LegacyMap;
use crate::format::MapData;

/// Name of the layer holding the terrain grid
pub const TILES_LAYER: &str = "Tiles";

/// Per-call memo of tile lookups against one tileset collection
struct TileCache<'a> {
    tilesets: &'a [Tileset],
    by_external_id: AHashMap<(&'a str, String), Option<TileRef>>,
    by_legacy_id: AHashMap<(&'a str, u32), Option<TileRef>>,
}

impl<'a> TileCache<'a> {
    fn new(tilesets: &'a [Tileset]) -> Self {
        Self {
            tilesets,
            by_external_id: AHashMap::new(),
            by_legacy_id: AHashMap::new(),
        }
    }

    fn tile(&self, tile_ref: TileRef) -> Option<&'a Tile> {
        self.tilesets.get(tile_ref.tileset)?.tile(tile_ref.id)
    }

    /// Look in `tileset` if it is loaded, otherwise in every tileset
    fn by_external_id(&mut self, tileset: &'a str, external_id: &str) -> Option<TileRef> {
        let tilesets = self.tilesets;
        *self
            .by_external_id
            .entry((tileset, external_id.to_string()))
            .or_insert_with(|| {
                let candidates: Vec<usize> = match tilesets.iter().position(|t| t.name == tileset) {
                    Some(index) => vec![index],
                    None => (0..tilesets.len()).collect(),
                };
                candidates.into_iter().find_map(|index| {
                    tilesets[index]
                        .find_by_external_id(external_id)
                        .map(|tile| TileRef::new(index, tile.id))
                })
            })
    }

    fn by_legacy_id(&mut self, tileset: &'a str, legacy_id: u32) -> Option<TileRef> {
        let tilesets = self.tilesets;
        *self.by_legacy_id.entry((tileset, legacy_id)).or_insert_with(|| {
            let index = tilesets.iter().position(|t| t.name == tileset)?;
            tilesets[index]
                .find_by_legacy_id(legacy_id)
                .map(|tile| TileRef::new(index, tile.id))
        })
    }
}

// ---------------------------------------------------------------------------
// Export
// ---------------------------------------------------------------------------

/// Reduce `doc` to codec records, converting object pixels with `transform`
pub fn collect(doc: &MapDocument, transform: CoordinateTransform) -> Result<MapData> {
    let layer = doc.tile_layer(TILES_LAYER).ok_or_else(|| {
        Error::MissingRequiredEntity(format!("No layer named \"{TILES_LAYER}\" found."))
    })?;
    let mut map = MapData::new(collect_grid(doc, layer)?);
    map.properties = coerce_properties(&doc.properties);

    for kind in GroupKind::ALL {
        let layer = doc.object_layer(kind.layer_name()).ok_or_else(|| {
            Error::MissingRequiredEntity(format!(
                "No object group named \"{}\" found.",
                kind.layer_name()
            ))
        })?;
        *map.group_mut(kind) = collect_group(doc, kind, layer, transform)?;
    }
    Ok(map)
}

fn external_id(doc: &MapDocument, tile: &Tile, tile_ref: TileRef) -> Result<String> {
    tile.external_id().ok_or_else(|| {
        let tileset = doc.tilesets.get(tile_ref.tileset).map_or("?", |t| t.name.as_str());
        Error::MissingRequiredEntity(format!(
            "tile {} of tileset \"{tileset}\" has no \"{RESERVED_ID_KEY}\" property",
            tile_ref.id
        ))
    })
}

fn resolve_tile(doc: &MapDocument, tile_ref: TileRef) -> Result<&Tile> {
    doc.tile(tile_ref).ok_or_else(|| {
        Error::MissingRequiredEntity(format!(
            "no tile {} in tileset #{}",
            tile_ref.id, tile_ref.tileset
        ))
    })
}

/// Register `id` → `name`, warning when two tilesets reuse the same id
fn intern_tile(table: &mut InternTable, id: u32, name: String) {
    match table.get(id) {
        Some(existing) if existing != name => {
            tracing::warn!(id, kept = existing, dropped = %name, "tile id shared by two tiles");
        }
        Some(_) => {}
        None => table.insert(id, name),
    }
}

fn collect_grid(doc: &MapDocument, layer: &TileLayer) -> Result<TileGrid> {
    let mut cells = Vec::with_capacity(layer.cells.len());
    let mut table = InternTable::new();
    for y in 0..layer.height {
        for x in 0..layer.width {
            let tile_ref = layer.cell(x, y).ok_or(Error::EmptyCell { x, y })?;
            let tile = resolve_tile(doc, tile_ref)?;
            intern_tile(&mut table, tile_ref.id, external_id(doc, tile, tile_ref)?);
            cells.push(tile_ref.id);
        }
    }
    Ok(TileGrid::new(layer.width, layer.height, cells, table))
}

fn collect_group(
    doc: &MapDocument,
    kind: GroupKind,
    layer: &ObjectLayer,
    transform: CoordinateTransform,
) -> Result<ObjectGroup> {
    let mut group = ObjectGroup::new(kind);
    for object in &layer.objects {
        let tile_ref = object.tile.ok_or_else(|| {
            Error::MissingRequiredEntity(format!(
                "object at ({}, {}) in layer \"{}\" has no tile",
                object.x,
                object.y,
                kind.layer_name()
            ))
        })?;
        let tile = resolve_tile(doc, tile_ref)?;
        let name = external_id(doc, tile, tile_ref)?;
        intern_tile(&mut group.tiles, tile_ref.id, name);

        let (x, y) = transform.to_tile(object.x, object.y, object.height);
        group.records.push(ObjectRecord {
            id: tile_ref.id,
            x,
            y,
            properties: coerce_properties(&object.properties),
        });
    }
    Ok(group)
}

// ---------------------------------------------------------------------------
// Import
// ---------------------------------------------------------------------------

fn empty_document(width: u32, height: u32, tilesets: &[Tileset]) -> MapDocument {
    let mut doc = MapDocument::new(width, height, TILE_SIZE, TILE_SIZE);
    for tileset in tilesets {
        doc.add_tileset(tileset.clone());
    }
    doc
}

/// Layers in the order the editor expects them, terrain first
fn add_layers(
    doc: &mut MapDocument,
    tiles: TileLayer,
    mut objects: AHashMap<GroupKind, ObjectLayer>,
) {
    doc.add_layer(tiles);
    for kind in [GroupKind::Feature, GroupKind::Item, GroupKind::Character] {
        let layer = objects
            .remove(&kind)
            .unwrap_or_else(|| ObjectLayer::new(kind.layer_name()));
        doc.add_layer(layer);
    }
}

fn placed(tile_ref: TileRef, tile: &Tile, x: f64, y: f64, width: f64, height: f64) -> MapObject {
    let mut object = MapObject::new(x, y, width, height).with_tile(tile_ref);
    if let Some(id) = tile.external_id() {
        object.set_property(RESERVED_ID_KEY, id);
    }
    object
}

/// Build a document from decoded container data
pub fn install(map: &MapData, tilesets: &[Tileset]) -> MapDocument {
    let mut cache = TileCache::new(tilesets);
    let mut doc = empty_document(map.grid.width, map.grid.height, tilesets);
    for (key, value) in &map.properties {
        doc.set_property(key.clone(), value.to_property());
    }

    let mut tiles = TileLayer::new(TILES_LAYER, map.grid.width, map.grid.height);
    let mut unresolved = 0usize;
    for y in 0..map.grid.height {
        for x in 0..map.grid.width {
            let resolved = map
                .grid
                .name_at(x, y)
                .and_then(|name| cache.by_external_id(MAP_CHIP_TILESET, name));
            match resolved {
                Some(tile_ref) => tiles.set_cell(x, y, Some(tile_ref)),
                None => unresolved += 1,
            }
        }
    }
    if unresolved > 0 {
        tracing::warn!(unresolved, "cells reference tiles missing from \"{MAP_CHIP_TILESET}\"; left empty");
    }

    let size = TILE_SIZE as f64;
    let mut layers = AHashMap::new();
    for group in &map.groups {
        let mut layer = ObjectLayer::new(group.kind.layer_name());
        for record in &group.records {
            let Some(name) = group.tiles.get(record.id) else {
                continue;
            };
            let found = cache
                .by_external_id(group.kind.tileset_name(), name)
                .and_then(|tile_ref| Some((tile_ref, cache.tile(tile_ref)?)));
            let Some((tile_ref, tile)) = found else {
                tracing::warn!(kind = group.kind.name(), tile = name, x = record.x, y = record.y, "unknown tile, skipping object");
                continue;
            };

            let x = record.x as f64 * size;
            let y = record.y as f64 * size;
            let mut object = match group.kind {
                GroupKind::Feature => placed(tile_ref, tile, x, y, size, size),
                _ => {
                    let offset = if tile.height == DOUBLE_HEIGHT { size } else { 0.0 };
                    placed(tile_ref, tile, x, y - offset, tile.width as f64, tile.height as f64)
                }
            };
            for (key, value) in &record.properties {
                object.set_property(key.clone(), value.to_property());
            }
            layer.add_object(object);
        }
        layers.insert(group.kind, layer);
    }

    add_layers(&mut doc, tiles, layers);
    doc
}

/// Build a document from a legacy save, resolving ids through `legacy_id`
pub fn install_legacy(legacy: &LegacyMap, tilesets: &[Tileset]) -> MapDocument {
    let header = &legacy.header;
    let mut cache = TileCache::new(tilesets);
    let mut doc = empty_document(header.width, header.height, tilesets);
    doc.set_property("atlas", header.atlas);
    doc.set_property("next_regenerate_date", header.regenerate_date);
    doc.set_property("stair_up_pos", header.stair_up_pos);

    let mut tiles = TileLayer::new(TILES_LAYER, header.width, header.height);
    let mut unresolved = 0usize;
    for (i, &legacy_id) in legacy.tiles.iter().enumerate() {
        let (x, y) = ((i % header.width as usize) as u32, (i / header.width as usize) as u32);
        match cache.by_legacy_id(MAP_CHIP_TILESET, legacy_id) {
            Some(tile_ref) => tiles.set_cell(x, y, Some(tile_ref)),
            None => unresolved += 1,
        }
    }
    if unresolved > 0 {
        tracing::warn!(unresolved, "legacy cells have no matching \"legacy_id\"; left empty");
    }

    let size = TILE_SIZE as f64;
    // legacy saves anchor objects one row below their tile
    let at = |x: u32, y: u32| (x as f64 * size, y as f64 * size + size);
    let mut lookup = |kind: GroupKind, legacy_id: u32| {
        let found = cache
            .by_legacy_id(kind.tileset_name(), legacy_id)
            .and_then(|tile_ref| Some((tile_ref, cache.tile(tile_ref)?)));
        if found.is_none() {
            tracing::warn!(kind = kind.name(), legacy_id, "unknown legacy tile, skipping object");
        }
        found
    };

    let mut features = ObjectLayer::new(GroupKind::Feature.layer_name());
    for feature in &legacy.features {
        if let Some((tile_ref, tile)) = lookup(GroupKind::Feature, feature.legacy_id) {
            let (x, y) = at(feature.x, feature.y);
            let mut object = placed(tile_ref, tile, x, y, size, size);
            object.set_property("param1", feature.param1);
            object.set_property("param2", feature.param2);
            object.set_property("param3", feature.param3);
            features.add_object(object);
        }
    }

    let mut items = ObjectLayer::new(GroupKind::Item.layer_name());
    for item in &legacy.items {
        if let Some((tile_ref, tile)) = lookup(GroupKind::Item, item.legacy_id) {
            let (x, y) = at(item.x, item.y);
            let mut object = placed(tile_ref, tile, x, y, tile.width as f64, tile.height as f64);
            object.set_property("own_state", item.own_state);
            items.add_object(object);
        }
    }

    let mut characters = ObjectLayer::new(GroupKind::Character.layer_name());
    for chara in &legacy.characters {
        if let Some((tile_ref, tile)) = lookup(GroupKind::Character, chara.legacy_id) {
            let (x, y) = at(chara.x, chara.y);
            characters.add_object(placed(tile_ref, tile, x, y, tile.width as f64, tile.height as f64));
        }
    }

    let layers = AHashMap::from_iter([
        (GroupKind::Feature, features),
        (GroupKind::Item, items),
        (GroupKind::Character, characters),
    ]);
    add_layers(&mut doc, tiles, layers);
    doc
}
