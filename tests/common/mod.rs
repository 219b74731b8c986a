#![allow(dead_code)]

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use flate2::write::GzEncoder;
use flate2::Compression;
use mapsave::mapdoc::{MapDocument, MapObject, ObjectLayer, Tile, TileLayer, TileRef, Tileset};

pub const MAP_CHIP: usize = 0;
pub const ITEM: usize = 1;
pub const CHARA: usize = 2;

/// A fresh, empty directory under the system temp dir
pub fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("mapsave-{name}-{}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

pub fn write_gzip(path: &Path, data: &[u8]) {
    let mut encoder = GzEncoder::new(fs::File::create(path).unwrap(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap();
}

pub fn u32_bytes(values: &[u32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

pub fn tilesets() -> Vec<Tileset> {
    let mut chips = Tileset::new("core.map_chip", 48, 48);
    for (id, name, legacy) in [
        (0, "core.dirt", 0),
        (1, "core.grass", 5),
        (2, "core.wall", 6),
        (3, "core.water", 7),
        (4, "core.stairs_up", 232),
        (5, "core.door", 726),
    ] {
        chips.add_tile(
            Tile::new(id, 48, 48)
                .with_property("id", name)
                .with_property("legacy_id", legacy),
        );
    }

    let mut items = Tileset::new("core.item", 48, 48);
    items.add_tile(Tile::new(0, 48, 48).with_property("id", "core.bread").with_property("legacy_id", 12));
    items.add_tile(Tile::new(1, 48, 48).with_property("id", "core.potion").with_property("legacy_id", 13));

    let mut charas = Tileset::new("core.chara", 48, 96);
    charas.add_tile(Tile::new(0, 48, 48).with_property("id", "core.putit").with_property("legacy_id", 3));
    charas.add_tile(Tile::new(1, 48, 96).with_property("id", "core.shopkeeper").with_property("legacy_id", 1));
    vec![chips, items, charas]
}

/// A `width` x `height` document whose cells are `cells` (map chip ids) and whose
/// object layers are empty
pub fn document(width: u32, height: u32, cells: &[u32]) -> MapDocument {
    let mut doc = MapDocument::new(width, height, 48, 48);
    for tileset in tilesets() {
        doc.add_tileset(tileset);
    }
    let mut tiles = TileLayer::new("Tiles", width, height);
    for (i, &id) in cells.iter().enumerate() {
        tiles.set_cell(i as u32 % width, i as u32 / width, Some(TileRef::new(MAP_CHIP, id)));
    }
    doc.add_layer(tiles);
    for name in ["Map Objects", "Items", "Characters"] {
        doc.add_layer(ObjectLayer::new(name));
    }
    doc
}

pub fn place(doc: &mut MapDocument, layer: &str, object: MapObject) {
    doc.object_layer_mut(layer).unwrap().add_object(object);
}

pub fn item(x: f64, y: f64, id: u32) -> MapObject {
    MapObject::new(x, y, 48.0, 48.0).with_tile(TileRef::new(ITEM, id))
}
