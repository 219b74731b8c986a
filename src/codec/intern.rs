//! Id ↔ name dictionaries sent once per stream
//!
//! Both layouts share one wire form: a `u32` entry count, then per entry a
//! `u32` id followed by a NUL-terminated name. Tile tables key entries by the
//! tile's numeric id; property-name tables key them by a dense index handed
//! out in first-use order (see [`Interner`]).

use indexmap::{IndexMap, IndexSet};

use crate::error::{Error, Result};
use super::{BinaryReader, BinaryWriter};

/// Ordered id → name table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InternTable {
    entries: IndexMap<u32, String>,
}

impl InternTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Record `id` on first sight; later sightings keep the first name
    pub fn insert_if_absent(&mut self, id: u32, name: impl FnOnce() -> String) -> bool {
        if self.entries.contains_key(&id) {
            return false;
        }
        self.entries.insert(id, name());
        true
    }

    pub fn insert(&mut self, id: u32, name: impl Into<String>) {
        self.entries.insert(id, name.into());
    }

    pub fn get(&self, id: u32) -> Option<&str> {
        self.entries.get(&id).map(String::as_str)
    }

    /// Look up `id`, failing if the stream never registered it
    pub fn resolve(&self, table: &'static str, id: u32) -> Result<&str> {
        self.get(id)
            .ok_or(Error::UnknownMappingIndex { table, index: id })
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &str)> + '_ {
        self.entries.iter().map(|(id, name)| (*id, name.as_str()))
    }

    pub fn ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.entries.keys().copied()
    }

    pub fn read(reader: &mut BinaryReader) -> Result<Self> {
        let count = reader.read_u32_le()? as usize;
        // smallest entry: u32 id + empty string terminator
        let mut entries = IndexMap::with_capacity(reader.capacity_hint(count, 5));
        for _ in 0..count {
            let id = reader.read_u32_le()?;
            let name = reader.read_cstring()?;
            entries.insert(id, name);
        }
        Ok(Self { entries })
    }

    pub fn write(&self, writer: &mut BinaryWriter) -> Result<()> {
        writer.write_u32_le(self.entries.len() as u32);
        for (id, name) in &self.entries {
            writer.write_u32_le(*id);
            writer.write_cstring(name)?;
        }
        Ok(())
    }
}

impl FromIterator<(u32, String)> for InternTable {
    fn from_iter<I: IntoIterator<Item = (u32, String)>>(iter: I) -> Self {
        let mut table = InternTable::new();
        for (id, name) in iter {
            table.insert_if_absent(id, || name);
        }
        table
    }
}

/// Hands out dense indices `0..n` to names in the order they are first seen
#[derive(Debug, Clone, Default)]
pub struct Interner {
    names: IndexSet<String>,
}

impl Interner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&mut self, name: &str) -> u32 {
        if let Some(index) = self.names.get_index_of(name) {
            return index as u32;
        }
        self.names.insert_full(name.to_string()).0 as u32
    }

    pub fn index_of(&self, name: &str) -> Option<u32> {
        self.names.get_index_of(name).map(|i| i as u32)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn to_table(&self) -> InternTable {
        self.names
            .iter()
            .enumerate()
            .map(|(i, name)| (i as u32, name.clone()))
            .collect()
    }
}
