use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Insertion-ordered property bag
pub type Properties = IndexMap<String, Property>;

/// A property value as stored by the document
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Property {
    Int(i64),
    Str(String),
}

impl Property {
    /// The value rendered as text, the way an editor would display it
    pub fn as_string(&self) -> String {
        self.to_string()
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Property::Int(v) => Some(*v),
            Property::Str(s) => s.trim().parse().ok(),
        }
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Property::Int(v) => write!(f, "{v}"),
            Property::Str(s) => f.write_str(s),
        }
    }
}

impl From<i64> for Property {
    fn from(v: i64) -> Self {
        Property::Int(v)
    }
}

impl From<i32> for Property {
    fn from(v: i32) -> Self {
        Property::Int(v as i64)
    }
}

impl From<u32> for Property {
    fn from(v: u32) -> Self {
        Property::Int(v as i64)
    }
}

impl From<&str> for Property {
    fn from(v: &str) -> Self {
        Property::Str(v.to_string())
    }
}

impl From<String> for Property {
    fn from(v: String) -> Self {
        Property::Str(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_as_int() {
        assert_eq!(Property::Int(-3).as_int(), Some(-3));
        assert_eq!(Property::from("42").as_int(), Some(42));
        assert_eq!(Property::from("core.putit").as_int(), None);
    }

    #[test]
    fn test_untagged_json() {
        let props: Properties = serde_json::from_str(r#"{"level": 5, "id": "core.putit"}"#).unwrap();
        assert_eq!(props["level"], Property::Int(5));
        assert_eq!(props["id"], Property::from("core.putit"));
        assert_eq!(props.get_index(0).unwrap().0, "level");
    }
}
