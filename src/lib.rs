//! Map save codec
//!
//! Reads and writes game map saves against an in-memory [`mapdoc::MapDocument`]:
//! the legacy split-file format (import only), two gzip'd binary containers,
//! and a Lua table literal (export only).

pub mod codec;
pub mod config;
pub mod document;
pub mod error;
pub mod format;
pub mod text_table;

pub use mapdoc;

pub use error::{Error, Result};
pub use config::Config;
pub use codec::{
    BinaryReader, BinaryWriter,
    PropertyValue, PropertyMap,
    InternTable, Interner,
    GroupKind, ObjectGroup, ObjectRecord, CoordinateTransform,
    TileGrid, CompressedTiles,
};
pub use format::{FormatKind, MapCodec, MapData};
