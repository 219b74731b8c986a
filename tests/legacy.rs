mod common;

use std::fs;
use std::path::Path;

use common::*;
use mapsave::mapdoc::{Property, TileRef};
use mapsave::{Config, Error, FormatKind, MapCodec};

/// Write a 3x2 legacy save named `base` into `dir`
fn write_save(dir: &Path, base: &str, events: &[[u32; 5]]) {
    write_gzip(&dir.join(format!("{base}.idx")), &u32_bytes(&[3, 2, 1, 20240101, 1002]));
    write_gzip(&dir.join(format!("{base}.map")), &u32_bytes(&[5, 5, 6, 7, 0, 999]));
    if !events.is_empty() {
        let flat: Vec<u32> = events.iter().flatten().copied().collect();
        write_gzip(&dir.join(format!("{base}.obj")), &u32_bytes(&flat));
    }
}

#[test]
fn import_legacy_save() {
    let dir = scratch_dir("legacy-import");
    write_save(
        &dir,
        "north",
        &[
            [12, 0, 0, 3, 0],    // bread
            [0, 2, 1, 0, 1],     // empty slot
            [1, 2, 0, 0, 1],     // shopkeeper
            [5, 1, 1, 2003, 2],  // stairs up
            [42, 0, 1, 0, 2],    // not in the feature table
        ],
    );
    let codec = MapCodec::new(Config::default(), tilesets());
    let path = dir.join("north.idx");
    assert_eq!(FormatKind::detect(&path).unwrap(), FormatKind::Legacy);

    let doc = codec.import(&path).unwrap();
    assert_eq!((doc.width, doc.height), (3, 2));
    assert_eq!(doc.property("atlas"), Some(&Property::Int(1)));
    assert_eq!(doc.property("next_regenerate_date"), Some(&Property::Int(20240101)));
    assert_eq!(doc.property("stair_up_pos"), Some(&Property::Int(1002)));

    let tiles = doc.tile_layer("Tiles").unwrap();
    assert_eq!(tiles.cell(0, 0), Some(TileRef::new(MAP_CHIP, 1)));
    assert_eq!(tiles.cell(2, 0), Some(TileRef::new(MAP_CHIP, 2)));
    assert_eq!(tiles.cell(1, 1), Some(TileRef::new(MAP_CHIP, 0)));
    // legacy id 999 has no tile
    assert_eq!(tiles.cell(2, 1), None);

    let bread = &doc.object_layer("Items").unwrap().objects[0];
    assert_eq!((bread.x, bread.y), (0.0, 48.0));
    assert_eq!(bread.properties["own_state"], Property::Int(3));
    assert_eq!(bread.properties["id"], Property::from("core.bread"));

    let characters = doc.object_layer("Characters").unwrap();
    assert_eq!(characters.object_count(), 1);
    assert_eq!(characters.objects[0].height, 96.0);

    let features = doc.object_layer("Map Objects").unwrap();
    assert_eq!(features.object_count(), 1);
    let stairs = &features.objects[0];
    assert_eq!((stairs.x, stairs.y), (48.0, 96.0));
    assert_eq!(stairs.properties["param1"], Property::Int(10));
    assert_eq!(stairs.properties["param2"], Property::Int(3));
    assert_eq!(stairs.properties["param3"], Property::Int(2));

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn sibling_idx_selects_legacy() {
    let dir = scratch_dir("legacy-sibling");
    write_save(&dir, "south", &[]);
    let codec = MapCodec::new(Config::default(), tilesets());

    // pointing at the tile file still finds the header next to it
    let doc = codec.import(&dir.join("south.map")).unwrap();
    assert_eq!(doc.object_layer("Items").unwrap().object_count(), 0);
    assert_eq!(doc.layers.len(), 4);

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn event_capacity_from_config() {
    let dir = scratch_dir("legacy-capacity");
    write_save(&dir, "old", &[[3, 0, 0, 0, 1], [3, 1, 0, 0, 1], [3, 2, 0, 0, 1]]);
    let config = Config { legacy_event_capacity: 2, ..Config::default() };
    let codec = MapCodec::new(config, tilesets());

    let doc = codec.import(&dir.join("old.idx")).unwrap();
    assert_eq!(doc.object_layer("Characters").unwrap().object_count(), 2);

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn partial_event_record_is_truncated() {
    let dir = scratch_dir("legacy-partial");
    write_save(&dir, "bad", &[]);
    write_gzip(&dir.join("bad.obj"), &[1, 0, 0, 0, 0, 0]);
    let codec = MapCodec::new(Config::default(), tilesets());
    assert!(matches!(codec.import(&dir.join("bad.idx")), Err(Error::Truncated { .. })));

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn legacy_import_converts_to_container() {
    let dir = scratch_dir("legacy-convert");
    write_save(&dir, "town", &[[12, 1, 0, 0, 0]]);
    let codec = MapCodec::new(Config::default(), tilesets());
    let mut doc = codec.import(&dir.join("town.idx")).unwrap();

    // one cell could not be resolved; containers refuse holes
    let target = dir.join("town.fmp");
    assert!(matches!(codec.export(&doc, &target), Err(Error::EmptyCell { x: 2, y: 1 })));

    doc.tile_layer_mut("Tiles").unwrap().set_cell(2, 1, Some(TileRef::new(MAP_CHIP, 0)));
    codec.export(&doc, &target).unwrap();
    let back = codec.import(&target).unwrap();
    assert_eq!(back.tile_layer("Tiles"), doc.tile_layer("Tiles"));
    assert_eq!(back.property("stair_up_pos"), Some(&Property::Int(1002)));
    assert!(matches!(
        codec.export_as(&doc, &dir.join("x.idx"), FormatKind::Legacy),
        Err(Error::UnsupportedOperation { .. })
    ));

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn container_next_to_idx_is_read_by_magic() {
    let dir = scratch_dir("legacy-neighbour");
    write_gzip(&dir.join("cave.idx"), &u32_bytes(&[2, 1, 1, 0, 0]));
    let codec = MapCodec::new(Config::default(), tilesets());

    let doc = document(2, 1, &[1, 2]);
    let target = dir.join("cave.map");
    codec.export(&doc, &target).unwrap();

    assert_eq!(FormatKind::detect(&target).unwrap(), FormatKind::ContainerB);
    let back = codec.import(&target).unwrap();
    assert_eq!(back.tile_layer("Tiles"), doc.tile_layer("Tiles"));

    // the header itself carries no magic and still reads as legacy
    assert_eq!(FormatKind::detect(&dir.join("cave.idx")).unwrap(), FormatKind::Legacy);

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn convert_refuses_to_overwrite_legacy_files() {
    let dir = scratch_dir("legacy-overwrite");
    write_save(&dir, "port", &[[12, 1, 0, 0, 0]]);
    write_gzip(&dir.join("port.map"), &u32_bytes(&[5, 5, 6, 7, 0, 0]));
    let codec = MapCodec::new(Config::default(), tilesets());
    let tile_file = fs::read(dir.join("port.map")).unwrap();

    for output in ["port.map", "port.obj", "port.idx"] {
        assert!(matches!(
            codec.convert(&dir.join("port.idx"), &dir.join(output), Some(FormatKind::ContainerB)),
            Err(Error::UnsupportedOperation { format: "legacy", .. })
        ));
    }
    assert_eq!(fs::read(dir.join("port.map")).unwrap(), tile_file);

    // a container next to the triad is fine and reads back by magic
    codec.convert(&dir.join("port.idx"), &dir.join("port.fmp"), None).unwrap();
    assert_eq!(FormatKind::detect(&dir.join("port.fmp")).unwrap(), FormatKind::ContainerA);
    let back = codec.import(&dir.join("port.fmp")).unwrap();
    assert_eq!(back.tile_layer("Tiles").unwrap().cell(1, 1), Some(TileRef::new(MAP_CHIP, 0)));
    assert_eq!(back.object_layer("Items").unwrap().object_count(), 1);

    // the legacy save itself is untouched
    let legacy = codec.import(&dir.join("port.idx")).unwrap();
    assert_eq!(legacy.tile_layer("Tiles"), back.tile_layer("Tiles"));

    fs::remove_dir_all(&dir).unwrap();
}
