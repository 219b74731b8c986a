pub mod reader;
pub mod writer;
pub mod value;
pub mod intern;
pub mod object_group;
pub mod tile_grid;
pub mod base64;

pub use reader::BinaryReader;
pub use writer::BinaryWriter;
pub use value::{PropertyMap, PropertyValue, coerce_properties};
pub use intern::{InternTable, Interner};
pub use object_group::{
    CoordinateTransform, GroupKind, ObjectGroup, ObjectRecord, ValueEncoding,
    MAX_CHARACTERS, MAX_ITEMS, RESERVED_ID_KEY,
};
pub use tile_grid::{CompressedTiles, TileGrid};

/// Edge length of a map tile in pixels
pub const TILE_SIZE: u32 = 48;

/// Rendered height of double-height sprites, which sit one row lower than their tile
pub const DOUBLE_HEIGHT: u32 = 96;

/// Tileset holding terrain tiles and static map features
pub const MAP_CHIP_TILESET: &str = "core.map_chip";
