//! Lua table literal export
//!
//! ```lua
//! return {
//!   width = 2,
//!   height = 2,
//!   mapping = {
//!     [0] = "core.grass",
//!   },
//!   tiles = "eJxjYGBgAAAABAAB",
//!   props = {
//!     atlas = 1,
//!   },
//!   objects = {
//!     ["core.chara"] = {
//!       { id = "core.putit", x = 1, y = 0 },
//!     },
//!   },
//! }
//! ```
//!
//! `tiles` holds the grid re-keyed to the dense `mapping` indices, deflated
//! and base64'd. The format is write-only.

use std::io::Write;

use crate::codec::{CoordinateTransform, GroupKind, PropertyMap, PropertyValue, RESERVED_ID_KEY};
use crate::error::{Error, Result};
use crate::format::MapData;

/// Pixel → tile conversion used when exporting objects to this format
pub const TRANSFORM: CoordinateTransform = CoordinateTransform::FloorMinusOne;

const INDENT: &[u8] = b"  ";

const KEYWORDS: [&str; 22] = [
    "and", "break", "do", "else", "elseif", "end", "false", "for", "function", "goto", "if", "in",
    "local", "nil", "not", "or", "repeat", "return", "then", "true", "until", "while",
];

/// Table key as it appears left of `=`
#[derive(Debug, Clone, Copy)]
enum Key<'a> {
    Name(&'a str),
    Index(u32),
}

/// Pretty-printing writer for nested Lua tables
struct LuaWriter<W> {
    writer: W,
    depth: usize,
}

impl<W: Write> LuaWriter<W> {
    fn new(writer: W) -> Self {
        Self { writer, depth: 0 }
    }

    fn into_inner(self) -> W {
        self.writer
    }

    fn indent(&mut self) -> Result<()> {
        for _ in 0..self.depth {
            self.writer.write_all(INDENT)?;
        }
        Ok(())
    }

    fn write_key(&mut self, key: Key<'_>) -> Result<()> {
        match key {
            Key::Name(name) if is_identifier(name) => write!(self.writer, "{name} = ")?,
            Key::Name(name) => {
                self.writer.write_all(b"[")?;
                self.write_quoted(name)?;
                self.writer.write_all(b"] = ")?;
            }
            Key::Index(i) => write!(self.writer, "[{i}] = ")?,
        }
        Ok(())
    }

    fn write_quoted(&mut self, data: &str) -> Result<()> {
        self.writer.write_all(b"\"")?;
        self.writer.write_all(escape(data).as_bytes())?;
        self.writer.write_all(b"\"")?;
        Ok(())
    }

    fn write_value(&mut self, value: &PropertyValue) -> Result<()> {
        match value {
            PropertyValue::Integer(v) => write!(self.writer, "{v}")?,
            PropertyValue::Text(s) => self.write_quoted(s)?,
        }
        Ok(())
    }

    /// `key = value,` on its own line
    fn field(&mut self, key: Key<'_>, value: &PropertyValue) -> Result<()> {
        self.indent()?;
        self.write_key(key)?;
        self.write_value(value)?;
        self.writer.write_all(b",\n")?;
        Ok(())
    }

    fn begin_table(&mut self, key: Option<Key<'_>>) -> Result<()> {
        self.indent()?;
        if let Some(key) = key {
            self.write_key(key)?;
        }
        self.writer.write_all(b"{\n")?;
        self.depth += 1;
        Ok(())
    }

    fn end_table(&mut self) -> Result<()> {
        self.depth = self.depth.saturating_sub(1);
        self.indent()?;
        if self.depth == 0 {
            self.writer.write_all(b"}\n")?;
        } else {
            self.writer.write_all(b"},\n")?;
        }
        Ok(())
    }

    /// `{ k = v, k = v }` without line breaks
    fn inline_table<'a>(
        &mut self,
        fields: impl IntoIterator<Item = (Key<'a>, &'a PropertyValue)>,
    ) -> Result<()> {
        self.writer.write_all(b"{")?;
        let mut first = true;
        for (key, value) in fields {
            let separator: &[u8] = if first { b" " } else { b", " };
            self.writer.write_all(separator)?;
            self.write_key(key)?;
            self.write_value(value)?;
            first = false;
        }
        let close: &[u8] = if first { b"}" } else { b" }" };
        self.writer.write_all(close)?;
        Ok(())
    }

    fn properties(&mut self, name: &str, properties: &PropertyMap) -> Result<()> {
        self.begin_table(Some(Key::Name(name)))?;
        for (key, value) in properties {
            self.field(Key::Name(key), value)?;
        }
        self.end_table()
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !KEYWORDS.contains(&s)
}

fn escape(data: &str) -> String {
    let mut out = String::with_capacity(data.len());
    for c in data.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_ascii_control() => out.push_str(&format!("\\{:03}", c as u32)),
            c => out.push(c),
        }
    }
    out
}

/// Write `map` as a Lua chunk returning one table
pub fn write<W: Write>(map: &MapData, writer: W) -> Result<W> {
    let tiles = map.grid.encode_compressed()?;
    let mut lua = LuaWriter::new(writer);

    lua.writer.write_all(b"return ")?;
    lua.begin_table(None)?;
    lua.field(Key::Name("width"), &PropertyValue::Integer(map.grid.width))?;
    lua.field(Key::Name("height"), &PropertyValue::Integer(map.grid.height))?;

    lua.begin_table(Some(Key::Name("mapping")))?;
    for (index, name) in tiles.mapping.iter() {
        lua.field(Key::Index(index), &PropertyValue::Text(name.to_string()))?;
    }
    lua.end_table()?;

    lua.field(Key::Name("tiles"), &PropertyValue::Text(tiles.data))?;
    lua.properties("props", &map.properties)?;

    lua.begin_table(Some(Key::Name("objects")))?;
    for kind in GroupKind::ALL {
        let Some(group) = map.group(kind) else {
            continue;
        };
        lua.begin_table(Some(Key::Name(kind.name())))?;
        for record in &group.records {
            let id = PropertyValue::Text(group.tiles.resolve("object tile", record.id)?.to_string());
            lua.indent()?;
            lua.writer.write_all(b"{ ")?;
            lua.write_key(Key::Name("id"))?;
            lua.write_value(&id)?;
            write!(lua.writer, ", x = {}, y = {}", record.x, record.y)?;

            let mut props = record
                .properties
                .iter()
                .filter(|(k, _)| k.as_str() != RESERVED_ID_KEY)
                .peekable();
            if props.peek().is_some() {
                lua.writer.write_all(b", ")?;
                lua.write_key(Key::Name("props"))?;
                lua.inline_table(props.map(|(k, v)| (Key::Name(k), v)))?;
            }
            lua.writer.write_all(b" },\n")?;
        }
        lua.end_table()?;
    }
    lua.end_table()?;
    lua.end_table()?;
    Ok(lua.into_inner())
}

/// Render `map` as a Lua source string
pub fn render(map: &MapData) -> Result<String> {
    let out = write(map, Vec::new())?;
    String::from_utf8(out).map_err(|e| Error::InvalidEncoding(e.to_string()))
}
