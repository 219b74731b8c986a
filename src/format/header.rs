use crate::codec::{BinaryReader, BinaryWriter};
use crate::error::{Error, Result};

/// Leading fields shared by both container formats
///
/// ```text
/// magic      4 bytes
/// version    u32
/// mod count  u32
/// mods       CString[mod count]
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerHeader {
    pub version: u32,
    pub mods: Vec<String>,
}

impl ContainerHeader {
    pub fn new(version: u32, mods: Vec<String>) -> Self {
        Self { version, mods }
    }

    pub fn read(reader: &mut BinaryReader, magic: &[u8; 4]) -> Result<Self> {
        let found = reader.read_bytes(4)?;
        if found != magic {
            let mut bad = [0u8; 4];
            bad.copy_from_slice(found);
            return Err(Error::BadMagic(bad));
        }
        let version = reader.read_u32_le()?;
        let count = reader.read_u32_le()? as usize;
        let mut mods = Vec::with_capacity(reader.capacity_hint(count, 1));
        for _ in 0..count {
            mods.push(reader.read_cstring()?);
        }
        tracing::debug!(version, mods = ?mods, "read container header");
        Ok(Self { version, mods })
    }

    pub fn write(&self, writer: &mut BinaryWriter, magic: &[u8; 4]) -> Result<()> {
        writer.write_bytes(magic);
        writer.write_u32_le(self.version);
        writer.write_u32_le(self.mods.len() as u32);
        for name in &self.mods {
            writer.write_cstring(name)?;
        }
        Ok(())
    }
}

impl Default for ContainerHeader {
    fn default() -> Self {
        Self::new(1, vec!["core".to_string()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_layout() {
        let mut writer = BinaryWriter::new();
        ContainerHeader::default().write(&mut writer, b"FMP ").unwrap();
        assert_eq!(
            writer.as_slice(),
            b"FMP \x01\x00\x00\x00\x01\x00\x00\x00core\x00"
        );

        let data = writer.into_vec();
        let header = ContainerHeader::read(&mut BinaryReader::new(&data), b"FMP ").unwrap();
        assert_eq!(header, ContainerHeader::default());
    }

    #[test]
    fn test_wrong_magic() {
        let data = b"FMB \x01\x00\x00\x00\x00\x00\x00\x00";
        assert!(matches!(
            ContainerHeader::read(&mut BinaryReader::new(data), b"FMP "),
            Err(Error::BadMagic(m)) if &m == b"FMB "
        ));
    }
}
