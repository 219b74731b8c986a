#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unexpected end of data: need {need} bytes, have {have}")]
    Truncated { need: usize, have: usize },

    #[error("invalid string encoding: {0}")]
    InvalidEncoding(String),

    #[error("unknown value type tag: {0}")]
    UnknownValueType(u8),

    #[error("{table} table has no entry for index {index}")]
    UnknownMappingIndex { table: &'static str, index: u32 },

    #[error("{0}")]
    MissingRequiredEntity(String),

    #[error("You can only place {capacity} items in layer {group} (found {count}).")]
    CapacityExceeded { group: String, count: usize, capacity: usize },

    #[error("property {key:?} has non-integer value {value:?}, which this format cannot store")]
    UnsupportedPropertyType { key: String, value: String },

    #[error("unrecognized magic bytes: {0:02x?}")]
    BadMagic([u8; 4]),

    #[error("unknown object group kind: {0:?}")]
    UnknownGroupKind(String),

    #[error("cell ({x}, {y}) of layer \"Tiles\" has no tile")]
    EmptyCell { x: u32, y: u32 },

    #[error("{format} does not support {operation}")]
    UnsupportedOperation { format: &'static str, operation: &'static str },

    #[error("config error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
