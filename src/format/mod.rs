//! Format drivers and the import/export entry point
//!
//! [`MapCodec`] is the only surface hosts need: `import(path)` yields a
//! [`MapDocument`], `export(document, path)` writes one. Everything below it is
//! pure: drivers turn bytes into [`MapData`] and back, [`crate::document`]
//! moves `MapData` in and out of the host model.

pub mod container_a;
pub mod container_b;
pub mod header;
pub mod legacy;
pub mod stream;

use std::fmt;
use std::path::Path;

use mapdoc::{MapDocument, Tileset};

use crate::codec::{
    BinaryReader, BinaryWriter, CoordinateTransform, GroupKind, ObjectGroup, PropertyMap,
    TileGrid, ValueEncoding,
};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::{document, text_table};
use header::ContainerHeader;

/// The closed set of supported save formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatKind {
    /// Split `.idx`/`.map`/`.obj` files, import only
    Legacy,
    /// Tagged-value container, magic `"FMP "`
    ContainerA,
    /// Integer-only container, magic `"FMB "`
    ContainerB,
    /// Lua table literal, export only
    TextTable,
}

impl FormatKind {
    pub fn name(self) -> &'static str {
        match self {
            FormatKind::Legacy => "legacy",
            FormatKind::ContainerA => "container-a",
            FormatKind::ContainerB => "container-b",
            FormatKind::TextTable => "text-table",
        }
    }

    pub fn from_magic(magic: &[u8]) -> Option<Self> {
        if magic.starts_with(container_a::MAGIC) {
            Some(FormatKind::ContainerA)
        } else if magic.starts_with(container_b::MAGIC) {
            Some(FormatKind::ContainerB)
        } else {
            None
        }
    }

    /// Identify a decompressed container stream by its first four bytes
    pub fn sniff(data: &[u8]) -> Result<Self> {
        Self::from_magic(data).ok_or_else(|| bad_magic(data))
    }

    /// Format an export to `path` should use, chosen by extension
    pub fn for_export_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "fmp" => Some(FormatKind::ContainerA),
            "map" => Some(FormatKind::ContainerB),
            "lua" => Some(FormatKind::TextTable),
            _ => None,
        }
    }

    /// Sniff the format of an existing save on disk
    pub fn detect(path: &Path) -> Result<Self> {
        Ok(Source::open(path)?.kind())
    }

    /// Pixel → tile conversion pinned to this format's exporter
    pub fn transform(self) -> Option<CoordinateTransform> {
        match self {
            FormatKind::ContainerA => Some(container_a::TRANSFORM),
            FormatKind::ContainerB => Some(container_b::TRANSFORM),
            FormatKind::TextTable => Some(text_table::TRANSFORM),
            FormatKind::Legacy => None,
        }
    }

    pub fn can_import(self) -> bool {
        !matches!(self, FormatKind::TextTable)
    }

    pub fn can_export(self) -> bool {
        !matches!(self, FormatKind::Legacy)
    }
}

impl fmt::Display for FormatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn bad_magic(data: &[u8]) -> Error {
    let mut bad = [0u8; 4];
    let n = data.len().min(4);
    bad[..n].copy_from_slice(&data[..n]);
    Error::BadMagic(bad)
}

/// A save on disk, resolved to the driver that reads it
enum Source {
    Container(FormatKind, Vec<u8>),
    Legacy,
}

impl Source {
    /// Container magic wins. Only a stream without it falls back to the
    /// legacy reader, and only when `path` is or sits next to an `.idx` file.
    fn open(path: &Path) -> Result<Self> {
        let legacy = legacy::LegacyPaths::detect(path);
        match stream::read_gzip(path) {
            Ok(data) => match FormatKind::from_magic(&data) {
                Some(kind) => Ok(Source::Container(kind, data)),
                None if legacy => Ok(Source::Legacy),
                None => Err(bad_magic(&data)),
            },
            // the legacy reader reports which of the split files is unusable
            Err(_) if legacy => Ok(Source::Legacy),
            Err(e) => Err(e),
        }
    }

    fn kind(&self) -> FormatKind {
        match self {
            Source::Container(kind, _) => *kind,
            Source::Legacy => FormatKind::Legacy,
        }
    }
}

/// Everything a container stream carries, in codec terms
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapData {
    pub header: ContainerHeader,
    pub properties: PropertyMap,
    pub grid: TileGrid,
    /// One group per [`GroupKind`], in [`GroupKind::ALL`] order
    pub groups: Vec<ObjectGroup>,
}

impl MapData {
    /// A map around `grid` with empty object groups
    pub fn new(grid: TileGrid) -> Self {
        Self {
            header: ContainerHeader::default(),
            properties: PropertyMap::new(),
            grid,
            groups: GroupKind::ALL.into_iter().map(ObjectGroup::new).collect(),
        }
    }

    pub fn group(&self, kind: GroupKind) -> Option<&ObjectGroup> {
        self.groups.iter().find(|g| g.kind == kind)
    }

    /// The group of `kind`, created empty if absent
    pub fn group_mut(&mut self, kind: GroupKind) -> &mut ObjectGroup {
        let index = match self.groups.iter().position(|g| g.kind == kind) {
            Some(index) => index,
            None => {
                self.groups.push(ObjectGroup::new(kind));
                self.groups.len() - 1
            }
        };
        &mut self.groups[index]
    }

    fn required_group(&self, kind: GroupKind) -> Result<&ObjectGroup> {
        self.group(kind).ok_or_else(|| {
            Error::MissingRequiredEntity(format!(
                "No object group named \"{}\" found.",
                kind.layer_name()
            ))
        })
    }
}

/// Group count, then every group in [`GroupKind::ALL`] order
pub(crate) fn write_groups(writer: &mut BinaryWriter, map: &MapData, encoding: ValueEncoding) -> Result<()> {
    let groups = GroupKind::ALL
        .into_iter()
        .map(|kind| map.required_group(kind))
        .collect::<Result<Vec<_>>>()?;

    writer.write_u32_le(groups.len() as u32);
    for group in groups {
        group.write(writer, group.kind.capacity(map.grid.width, map.grid.height), encoding)?;
    }
    Ok(())
}

pub(crate) fn read_groups(reader: &mut BinaryReader, encoding: ValueEncoding) -> Result<Vec<ObjectGroup>> {
    let count = reader.read_u32_le()? as usize;
    let mut found: Vec<ObjectGroup> = Vec::with_capacity(reader.capacity_hint(count, 17));
    for _ in 0..count {
        let group = ObjectGroup::read(reader, encoding)?;
        if found.iter().any(|g| g.kind == group.kind) {
            tracing::warn!(kind = group.kind.name(), "duplicate object group, keeping the first");
            continue;
        }
        found.push(group);
    }
    if !reader.is_empty() {
        tracing::debug!(trailing = reader.remaining(), "ignoring bytes after the last object group");
    }

    Ok(GroupKind::ALL
        .into_iter()
        .map(|kind| match found.iter().position(|g| g.kind == kind) {
            Some(i) => found.swap_remove(i),
            None => ObjectGroup::new(kind),
        })
        .collect())
}

/// Import/export entry point bound to a configuration and tileset collection
#[derive(Debug, Clone, Default)]
pub struct MapCodec {
    config: Config,
    tilesets: Vec<Tileset>,
}

impl MapCodec {
    pub fn new(config: Config, tilesets: Vec<Tileset>) -> Self {
        Self { config, tilesets }
    }

    /// Build a codec whose tilesets are loaded from the files `config` lists
    pub fn from_config(config: Config) -> Result<Self> {
        let tilesets = config.load_tilesets()?;
        Ok(Self::new(config, tilesets))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn tilesets(&self) -> &[Tileset] {
        &self.tilesets
    }

    pub fn add_tileset(&mut self, tileset: Tileset) {
        self.tilesets.push(tileset);
    }

    pub fn import(&self, path: &Path) -> Result<MapDocument> {
        self.import_from(path, Source::open(path)?)
    }

    fn import_from(&self, path: &Path, source: Source) -> Result<MapDocument> {
        let (kind, document) = match source {
            Source::Container(kind, data) => (kind, self.decode(&data)?),
            Source::Legacy => {
                let legacy = legacy::read(path, self.config.legacy_event_capacity)?;
                (FormatKind::Legacy, document::install_legacy(&legacy, &self.tilesets))
            }
        };
        tracing::info!(
            path = %path.display(),
            format = %kind,
            width = document.width,
            height = document.height,
            "imported map"
        );
        Ok(document)
    }

    /// Decode a decompressed container stream into a document
    pub fn decode(&self, data: &[u8]) -> Result<MapDocument> {
        let map = match FormatKind::sniff(data)? {
            FormatKind::ContainerA => container_a::decode(data)?,
            FormatKind::ContainerB => container_b::decode(data)?,
            kind => {
                return Err(Error::UnsupportedOperation { format: kind.name(), operation: "decode" })
            }
        };
        Ok(document::install(&map, &self.tilesets))
    }

    /// Import `input` and export it to `output`, in `kind` or the format the
    /// output extension implies. A legacy save is never written over one of
    /// its own split files.
    pub fn convert(&self, input: &Path, output: &Path, kind: Option<FormatKind>) -> Result<()> {
        let source = Source::open(input)?;
        if matches!(source, Source::Legacy) && legacy::LegacyPaths::new(input).contains(output) {
            return Err(Error::UnsupportedOperation {
                format: FormatKind::Legacy.name(),
                operation: "overwriting one of its own files",
            });
        }
        let document = self.import_from(input, source)?;
        match kind {
            Some(kind) => self.export_as(&document, output, kind),
            None => self.export(&document, output),
        }
    }

    /// Export with the format implied by the target's extension
    pub fn export(&self, document: &MapDocument, path: &Path) -> Result<()> {
        let kind = FormatKind::for_export_path(path).ok_or(Error::UnsupportedOperation {
            format: "unknown",
            operation: "export to this file extension",
        })?;
        self.export_as(document, path, kind)
    }

    pub fn export_as(&self, document: &MapDocument, path: &Path, kind: FormatKind) -> Result<()> {
        let bytes = self.encode(document, kind)?;
        match kind {
            FormatKind::TextTable => stream::write_atomic(path, &bytes)?,
            _ => stream::write_gzip_atomic(path, &bytes)?,
        }
        tracing::info!(path = %path.display(), format = %kind, bytes = bytes.len(), "exported map");
        Ok(())
    }

    /// Encode `document` in memory, before any gzip framing
    pub fn encode(&self, document: &MapDocument, kind: FormatKind) -> Result<Vec<u8>> {
        let Some(transform) = kind.transform() else {
            return Err(Error::UnsupportedOperation { format: kind.name(), operation: "export" });
        };
        let mut map = document::collect(document, transform)?;
        map.header = ContainerHeader::new(self.config.version, self.config.mods.clone());
        match kind {
            FormatKind::ContainerA => container_a::encode(&map),
            FormatKind::ContainerB => container_b::encode(&map),
            FormatKind::TextTable => Ok(text_table::render(&map)?.into_bytes()),
            FormatKind::Legacy => Err(Error::UnsupportedOperation { format: kind.name(), operation: "export" }),
        }
    }
}
