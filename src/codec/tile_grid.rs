use std::io::{Read, Write};

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use indexmap::IndexSet;

use crate::error::{Error, Result};
use super::intern::InternTable;
use super::{base64, BinaryReader, BinaryWriter};

/// Row-major grid of tile ids plus the names those ids stand for
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TileGrid {
    pub width: u32,
    pub height: u32,
    pub cells: Vec<u32>,
    /// Tile id → external id, in row-major first-encounter order
    pub table: InternTable,
}

/// Grid re-keyed to dense indices, deflated and base64'd for text export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressedTiles {
    /// Dense index → external id
    pub mapping: InternTable,
    pub data: String,
}

impl TileGrid {
    pub fn new(width: u32, height: u32, cells: Vec<u32>, table: InternTable) -> Self {
        Self { width, height, cells, table }
    }

    pub fn cell_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn get(&self, x: u32, y: u32) -> Option<u32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.cells.get(y as usize * self.width as usize + x as usize).copied()
    }

    pub fn name_at(&self, x: u32, y: u32) -> Option<&str> {
        self.get(x, y).and_then(|id| self.table.get(id))
    }

    /// Every cell resolves in the table and the cell count matches the dimensions
    pub fn validate(&self) -> Result<()> {
        if self.cells.len() != self.cell_count() {
            return Err(Error::Truncated { need: self.cell_count(), have: self.cells.len() });
        }
        for &id in &self.cells {
            self.table.resolve("tile", id)?;
        }
        Ok(())
    }

    pub fn write_cells(&self, writer: &mut BinaryWriter) {
        writer.write_u32_array(&self.cells);
    }

    pub fn read_cells(reader: &mut BinaryReader, width: u32, height: u32) -> Result<Vec<u32>> {
        let count = (width as usize)
            .checked_mul(height as usize)
            .ok_or(Error::Truncated { need: usize::MAX, have: reader.remaining() })?;
        reader.read_u32_array(count)
    }

    /// Dimensions, tile table, then the raw cells
    pub fn write(&self, writer: &mut BinaryWriter) -> Result<()> {
        self.validate()?;
        writer.write_u32_le(self.width);
        writer.write_u32_le(self.height);
        self.table.write(writer)?;
        self.write_cells(writer);
        Ok(())
    }

    pub fn read(reader: &mut BinaryReader) -> Result<Self> {
        let width = reader.read_u32_le()?;
        let height = reader.read_u32_le()?;
        let table = InternTable::read(reader)?;
        let cells = Self::read_cells(reader, width, height)?;
        let grid = Self::new(width, height, cells, table);
        grid.validate()?;
        Ok(grid)
    }

    /// Re-key cells to dense indices `0..n` in first-encounter order, then
    /// zlib + base64 the little-endian `u32` array
    pub fn encode_compressed(&self) -> Result<CompressedTiles> {
        self.validate()?;
        // keyed by tile id so two ids sharing a name stay distinct
        let mut dense = IndexSet::new();
        let mut mapping = InternTable::new();
        let mut indices = Vec::with_capacity(self.cells.len());
        for &id in &self.cells {
            let name = self.table.resolve("tile", id)?;
            let index = dense.insert_full(id).0 as u32;
            mapping.insert_if_absent(index, || name.to_string());
            indices.push(index);
        }

        let mut raw = BinaryWriter::with_capacity(indices.len() * 4);
        raw.write_u32_array(&indices);

        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(raw.as_slice())?;
        let compressed = encoder.finish()?;

        Ok(CompressedTiles { mapping, data: base64::encode(&compressed) })
    }
}

impl CompressedTiles {
    /// Undo [`TileGrid::encode_compressed`], yielding the dense index per cell
    pub fn decode_indices(&self) -> Result<Vec<u32>> {
        let compressed = base64::decode(&self.data)?;
        let mut raw = Vec::new();
        ZlibDecoder::new(compressed.as_slice())
            .read_to_end(&mut raw)
            .map_err(|e| Error::InvalidEncoding(format!("zlib error: {e}")))?;
        if raw.len() % 4 != 0 {
            return Err(Error::Truncated { need: raw.len().next_multiple_of(4), have: raw.len() });
        }
        BinaryReader::new(&raw).read_u32_array(raw.len() / 4)
    }
}
