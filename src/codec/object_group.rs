//! Bounded groups of placed objects
//!
//! # Wire format
//!
//! ```text
//! kind               CString   ("core.chara" | "core.item" | "core.feat")
//! tile table         InternTable (tile id -> external id)
//! property names     InternTable (dense index -> property key)
//! record count       u32
//! records[count]:
//!   tile id          u32
//!   x, y             u32, u32  (tile units, two's complement)
//!   property count   u32
//!   properties[n]:
//!     name index     u32
//!     value          tagged value, or bare u32 for untagged formats
//! ```
//!
//! The `"id"` key never travels as a generic property: a record's identity is
//! its tile id, and importers re-derive the `"id"` property from the tileset.

use crate::error::{Error, Result};
use super::intern::{InternTable, Interner};
use super::value::{PropertyMap, PropertyValue};
use super::{BinaryReader, BinaryWriter, DOUBLE_HEIGHT, TILE_SIZE};

/// Property key reserved for the record's external id
pub const RESERVED_ID_KEY: &str = "id";

pub const MAX_CHARACTERS: usize = 188;
pub const MAX_ITEMS: usize = 400;

/// The closed set of object group kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupKind {
    Character,
    Item,
    Feature,
}

impl GroupKind {
    /// Containers store groups in this order
    pub const ALL: [GroupKind; 3] = [GroupKind::Character, GroupKind::Item, GroupKind::Feature];

    /// Kind name written into the stream
    pub fn name(self) -> &'static str {
        match self {
            GroupKind::Character => "core.chara",
            GroupKind::Item => "core.item",
            GroupKind::Feature => "core.feat",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }

    /// Name of the document object layer holding this group
    pub fn layer_name(self) -> &'static str {
        match self {
            GroupKind::Character => "Characters",
            GroupKind::Item => "Items",
            GroupKind::Feature => "Map Objects",
        }
    }

    /// Tileset the group's tile ids refer to
    pub fn tileset_name(self) -> &'static str {
        match self {
            GroupKind::Character => "core.chara",
            GroupKind::Item => "core.item",
            GroupKind::Feature => super::MAP_CHIP_TILESET,
        }
    }

    /// Maximum record count for a map of the given size
    pub fn capacity(self, width: u32, height: u32) -> usize {
        match self {
            GroupKind::Character => MAX_CHARACTERS,
            GroupKind::Item => MAX_ITEMS,
            GroupKind::Feature => width as usize * height as usize,
        }
    }
}

/// How property values are stored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueEncoding {
    /// Tag byte + integer or string
    Tagged,
    /// Bare `u32`; string values cannot be stored
    Untagged,
}

/// Pixel → tile conversion applied when exporting objects
///
/// Each format pins its own formula. Double-height (96px) sprites are anchored
/// one tile below their logical placement, hence the `+1` row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinateTransform {
    /// `floor(p / 48)`, `+1` row for double height
    Floor,
    /// Truncating division instead of floor, `+1` row for double height
    TruncateTowardZero,
    /// `floor(p / 48)` with the row lowered by one, then `+1` for double height
    FloorMinusOne,
}

impl CoordinateTransform {
    pub fn to_tile(self, px: f64, py: f64, height: f64) -> (i32, i32) {
        let size = TILE_SIZE as f64;
        let tall = height == DOUBLE_HEIGHT as f64;
        let (x, mut y) = match self {
            CoordinateTransform::Floor => ((px / size).floor(), (py / size).floor()),
            CoordinateTransform::TruncateTowardZero => ((px / size).trunc(), (py / size).trunc()),
            CoordinateTransform::FloorMinusOne => ((px / size).floor(), (py / size).floor() - 1.0),
        };
        if tall {
            y += 1.0;
        }
        (x as i32, y as i32)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectRecord {
    /// Tile id, resolved through the group's tile table
    pub id: u32,
    pub x: i32,
    pub y: i32,
    pub properties: PropertyMap,
}

impl ObjectRecord {
    pub fn new(id: u32, x: i32, y: i32) -> Self {
        Self { id, x, y, properties: PropertyMap::new() }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    fn wire_properties(&self) -> impl Iterator<Item = (&String, &PropertyValue)> {
        self.properties.iter().filter(|(k, _)| k.as_str() != RESERVED_ID_KEY)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectGroup {
    pub kind: GroupKind,
    /// Tile id → external id for every tile the records use, in encounter order
    pub tiles: InternTable,
    pub records: Vec<ObjectRecord>,
}

impl ObjectGroup {
    pub fn new(kind: GroupKind) -> Self {
        Self { kind, tiles: InternTable::new(), records: Vec::new() }
    }

    /// Append a record, registering its tile's external id on first use
    pub fn push(&mut self, record: ObjectRecord, tile_name: impl FnOnce() -> String) {
        self.tiles.insert_if_absent(record.id, tile_name);
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Property keys in first-use order, `"id"` excluded
    pub fn property_names(&self) -> Interner {
        let mut names = Interner::new();
        for record in &self.records {
            for (key, _) in record.wire_properties() {
                names.intern(key);
            }
        }
        names
    }

    /// Everything that can reject the group, checked before a byte is emitted
    fn validate(&self, capacity: usize, encoding: ValueEncoding) -> Result<()> {
        if self.records.len() > capacity {
            return Err(Error::CapacityExceeded {
                group: self.kind.layer_name().to_string(),
                count: self.records.len(),
                capacity,
            });
        }
        for record in &self.records {
            self.tiles.resolve("object tile", record.id)?;
            if encoding == ValueEncoding::Untagged {
                for (key, value) in record.wire_properties() {
                    if let PropertyValue::Text(text) = value {
                        return Err(Error::UnsupportedPropertyType {
                            key: key.clone(),
                            value: text.clone(),
                        });
                    }
                }
            }
        }
        Ok(())
    }

    pub fn write(&self, writer: &mut BinaryWriter, capacity: usize, encoding: ValueEncoding) -> Result<()> {
        self.validate(capacity, encoding)?;
        let names = self.property_names();

        writer.write_cstring(self.kind.name())?;
        self.tiles.write(writer)?;
        names.to_table().write(writer)?;
        writer.write_u32_le(self.records.len() as u32);

        for record in &self.records {
            writer.write_u32_le(record.id);
            writer.write_i32_le(record.x);
            writer.write_i32_le(record.y);

            writer.write_u32_le(record.wire_properties().count() as u32);
            for (key, value) in record.wire_properties() {
                // every key was interned by property_names()
                let index = names.index_of(key).unwrap_or_default();
                writer.write_u32_le(index);
                match (encoding, value) {
                    (ValueEncoding::Tagged, value) => writer.write_tagged_value(value)?,
                    (ValueEncoding::Untagged, PropertyValue::Integer(v)) => writer.write_u32_le(*v),
                    (ValueEncoding::Untagged, PropertyValue::Text(text)) => {
                        return Err(Error::UnsupportedPropertyType {
                            key: key.clone(),
                            value: text.clone(),
                        })
                    }
                }
            }
        }
        Ok(())
    }

    pub fn read(reader: &mut BinaryReader, encoding: ValueEncoding) -> Result<Self> {
        let kind_name = reader.read_cstring()?;
        let kind = GroupKind::from_name(&kind_name).ok_or(Error::UnknownGroupKind(kind_name))?;
        let tiles = InternTable::read(reader)?;
        let names = InternTable::read(reader)?;
        let count = reader.read_u32_le()? as usize;
        tracing::debug!(
            kind = kind.name(),
            tiles = tiles.len(),
            properties = names.len(),
            count,
            "reading object group"
        );

        let mut records = Vec::with_capacity(reader.capacity_hint(count, 16));
        for _ in 0..count {
            let id = reader.read_u32_le()?;
            tiles.resolve("object tile", id)?;
            let x = reader.read_i32_le()?;
            let y = reader.read_i32_le()?;

            let prop_count = reader.read_u32_le()? as usize;
            let mut properties = PropertyMap::with_capacity(reader.capacity_hint(prop_count, 8));
            for _ in 0..prop_count {
                let index = reader.read_u32_le()?;
                let key = names.resolve("property name", index)?.to_string();
                let value = match encoding {
                    ValueEncoding::Tagged => reader.read_tagged_value()?,
                    ValueEncoding::Untagged => PropertyValue::Integer(reader.read_u32_le()?),
                };
                properties.insert(key, value);
            }
            records.push(ObjectRecord { id, x, y, properties });
        }

        Ok(Self { kind, tiles, records })
    }
}
