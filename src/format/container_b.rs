//! Container B: plain integer property values
//!
//! ```text
//! header        magic "FMB ", version, mods
//! width, height u32, u32
//! tile table    InternTable
//! tiles         u32[width * height]
//! properties    u32 count, then (key CString, u32 value)[count]
//! groups        u32 count, then object groups with untagged values
//! ```
//!
//! String properties cannot be stored; encoding one is an error rather than a
//! silent conversion.

use crate::codec::{
    BinaryReader, BinaryWriter, CoordinateTransform, PropertyMap, PropertyValue, TileGrid,
    ValueEncoding,
};
use crate::error::{Error, Result};
use super::header::ContainerHeader;
use super::{read_groups, write_groups, MapData};

pub const MAGIC: &[u8; 4] = b"FMB ";

/// Pixel → tile conversion used when exporting objects to this format
pub const TRANSFORM: CoordinateTransform = CoordinateTransform::TruncateTowardZero;

pub fn encode(map: &MapData) -> Result<Vec<u8>> {
    let mut properties = Vec::with_capacity(map.properties.len());
    for (key, value) in &map.properties {
        match value {
            PropertyValue::Integer(v) => properties.push((key, *v)),
            PropertyValue::Text(text) => {
                return Err(Error::UnsupportedPropertyType {
                    key: key.clone(),
                    value: text.clone(),
                })
            }
        }
    }

    let mut writer = BinaryWriter::with_capacity(64 + map.grid.cells.len() * 4);
    map.header.write(&mut writer, MAGIC)?;
    map.grid.write(&mut writer)?;

    writer.write_u32_le(properties.len() as u32);
    for (key, value) in properties {
        writer.write_cstring(key)?;
        writer.write_u32_le(value);
    }

    write_groups(&mut writer, map, ValueEncoding::Untagged)?;
    Ok(writer.into_vec())
}

pub fn decode(data: &[u8]) -> Result<MapData> {
    let mut reader = BinaryReader::new(data);
    let header = ContainerHeader::read(&mut reader, MAGIC)?;
    let grid = TileGrid::read(&mut reader)?;

    let count = reader.read_u32_le()? as usize;
    let mut properties = PropertyMap::with_capacity(reader.capacity_hint(count, 5));
    for _ in 0..count {
        let key = reader.read_cstring()?;
        let value = reader.read_u32_le()?;
        properties.insert(key, PropertyValue::Integer(value));
    }
    tracing::debug!(
        width = grid.width,
        height = grid.height,
        tiles = grid.table.len(),
        properties = properties.len(),
        "read container B body"
    );

    let groups = read_groups(&mut reader, ValueEncoding::Untagged)?;
    Ok(MapData { header, properties, grid, groups })
}
