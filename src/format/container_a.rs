//! Container A: tagged property values
//!
//! ```text
//! header        magic "FMP ", version, mods
//! properties    u32 count, then (key CString, tagged value)[count]
//! tile table    InternTable
//! width, height u32, u32
//! tiles         u32[width * height]
//! groups        u32 count, then object groups (characters, items, features)
//! ```

use crate::codec::{
    BinaryReader, BinaryWriter, CoordinateTransform, InternTable, PropertyMap, TileGrid,
    ValueEncoding,
};
use crate::error::Result;
use super::header::ContainerHeader;
use super::{read_groups, write_groups, MapData};

pub const MAGIC: &[u8; 4] = b"FMP ";

/// Pixel → tile conversion used when exporting objects to this format
pub const TRANSFORM: CoordinateTransform = CoordinateTransform::Floor;

pub fn encode(map: &MapData) -> Result<Vec<u8>> {
    map.grid.validate()?;
    let mut writer = BinaryWriter::with_capacity(64 + map.grid.cells.len() * 4);
    map.header.write(&mut writer, MAGIC)?;

    writer.write_u32_le(map.properties.len() as u32);
    for (key, value) in &map.properties {
        writer.write_cstring(key)?;
        writer.write_tagged_value(value)?;
    }

    map.grid.table.write(&mut writer)?;
    writer.write_u32_le(map.grid.width);
    writer.write_u32_le(map.grid.height);
    map.grid.write_cells(&mut writer);

    write_groups(&mut writer, map, ValueEncoding::Tagged)?;
    Ok(writer.into_vec())
}

pub fn decode(data: &[u8]) -> Result<MapData> {
    let mut reader = BinaryReader::new(data);
    let header = ContainerHeader::read(&mut reader, MAGIC)?;

    let count = reader.read_u32_le()? as usize;
    let mut properties = PropertyMap::with_capacity(reader.capacity_hint(count, 6));
    for _ in 0..count {
        let key = reader.read_cstring()?;
        let value = reader.read_tagged_value()?;
        properties.insert(key, value);
    }

    let table = InternTable::read(&mut reader)?;
    let width = reader.read_u32_le()?;
    let height = reader.read_u32_le()?;
    let cells = TileGrid::read_cells(&mut reader, width, height)?;
    let grid = TileGrid::new(width, height, cells, table);
    grid.validate()?;
    tracing::debug!(width, height, tiles = grid.table.len(), properties = properties.len(), "read container A body");

    let groups = read_groups(&mut reader, ValueEncoding::Tagged)?;
    Ok(MapData { header, properties, grid, groups })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{GroupKind, ObjectRecord, PropertyValue, MAX_ITEMS};
    use crate::error::Error;

    fn sample() -> MapData {
        let table: InternTable = [(1, "core.grass"), (2, "core.wall"), (3, "core.water")]
            .into_iter()
            .map(|(id, name)| (id, name.to_string()))
            .collect();
        let mut map = MapData::new(TileGrid::new(2, 2, vec![1, 1, 2, 3], table));
        map.properties.insert("atlas".into(), PropertyValue::Integer(1));
        map.properties.insert("name".into(), PropertyValue::Text("vernis".into()));
        map.group_mut(GroupKind::Character).push(
            ObjectRecord::new(4, 1, 1).with_property("level", 3u32),
            || "core.putit".into(),
        );
        map
    }

    #[test]
    fn test_roundtrip() {
        let map = sample();
        let data = encode(&map).unwrap();
        assert_eq!(&data[..4], MAGIC);

        let back = decode(&data).unwrap();
        assert_eq!(back, map);
        assert_eq!(back.grid.cells, [1, 1, 2, 3]);
        assert_eq!(back.grid.table.ids().collect::<Vec<_>>(), [1, 2, 3]);
    }

    #[test]
    fn test_body_order() {
        let map = sample();
        let data = encode(&map).unwrap();
        // header (4 + 4 + 4 + "core\0") then property count
        let mut reader = BinaryReader::new(&data[17..]);
        assert_eq!(reader.read_u32_le().unwrap(), 2);
        assert_eq!(reader.read_cstring().unwrap(), "atlas");
        assert_eq!(reader.read_tagged_value().unwrap(), PropertyValue::Integer(1));
        assert_eq!(reader.read_cstring().unwrap(), "name");
        reader.read_tagged_value().unwrap();
        // tile table comes before the dimensions
        assert_eq!(InternTable::read(&mut reader).unwrap().len(), 3);
        assert_eq!(reader.read_u32_le().unwrap(), 2);
        assert_eq!(reader.read_u32_le().unwrap(), 2);
    }

    #[test]
    fn test_item_capacity() {
        let mut map = sample();
        let items = map.group_mut(GroupKind::Item);
        for i in 0..=MAX_ITEMS {
            items.push(ObjectRecord::new(7, i as i32 % 2, 0), || "core.bread".into());
        }
        assert!(matches!(encode(&map), Err(Error::CapacityExceeded { .. })));
    }

    #[test]
    fn test_decode_truncated() {
        let data = encode(&sample()).unwrap();
        for len in [0, 3, 10, data.len() / 2, data.len() - 1] {
            assert!(decode(&data[..len]).is_err(), "prefix of {len} bytes decoded");
        }
    }

    #[test]
    fn test_missing_groups_fail() {
        let mut map = sample();
        map.groups.retain(|g| g.kind != GroupKind::Feature);
        match encode(&map) {
            Err(Error::MissingRequiredEntity(msg)) => {
                assert_eq!(msg, "No object group named \"Map Objects\" found.")
            }
            other => panic!("expected MissingRequiredEntity, got {other:?}"),
        }
    }
}
