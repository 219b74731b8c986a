use std::fmt;

use indexmap::IndexMap;
use mapdoc::Property;

/// Ordered property set carried by map headers and object records
pub type PropertyMap = IndexMap<String, PropertyValue>;

/// A property value as it travels on the wire
///
/// Encoding a document narrows its properties: any value whose text parses as a
/// `u32` becomes [`PropertyValue::Integer`], everything else stays
/// [`PropertyValue::Text`]. The source spelling is not kept, so `"007"`
/// comes back as `7`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PropertyValue {
    Integer(u32),
    Text(String),
}

impl PropertyValue {
    pub fn coerce(s: &str) -> Self {
        match s.parse::<u32>() {
            Ok(v) => PropertyValue::Integer(v),
            Err(_) => PropertyValue::Text(s.to_string()),
        }
    }

    pub fn from_property(property: &Property) -> Self {
        match property {
            Property::Int(v) => match u32::try_from(*v) {
                Ok(v) => PropertyValue::Integer(v),
                Err(_) => PropertyValue::Text(v.to_string()),
            },
            Property::Str(s) => Self::coerce(s),
        }
    }

    pub fn to_property(&self) -> Property {
        match self {
            PropertyValue::Integer(v) => Property::Int(*v as i64),
            PropertyValue::Text(s) => Property::Str(s.clone()),
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Integer(v) => write!(f, "{v}"),
            PropertyValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<u32> for PropertyValue {
    fn from(v: u32) -> Self {
        PropertyValue::Integer(v)
    }
}

impl From<&str> for PropertyValue {
    fn from(v: &str) -> Self {
        PropertyValue::Text(v.to_string())
    }
}

/// Narrow a document property bag into wire values, preserving order
pub fn coerce_properties(properties: &mapdoc::Properties) -> PropertyMap {
    properties
        .iter()
        .map(|(k, v)| (k.clone(), PropertyValue::from_property(v)))
        .collect()
}
