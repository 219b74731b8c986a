use byteorder::{ByteOrder, LittleEndian};

use crate::error::{Error, Result};
use super::value::PropertyValue;

/// Binary reader for map save data
pub struct BinaryReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> BinaryReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.remaining() < n {
            return Err(Error::Truncated { need: n, have: self.remaining() });
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_bytes(1)?[0])
    }

    pub fn read_u32_le(&mut self) -> Result<u32> {
        Ok(LittleEndian::read_u32(self.read_bytes(4)?))
    }

    /// Signed coordinates travel as the bit pattern of a `u32`
    pub fn read_i32_le(&mut self) -> Result<i32> {
        Ok(self.read_u32_le()? as i32)
    }

    /// Read `count` consecutive `u32`s, checking the whole run is present before allocating
    pub fn read_u32_array(&mut self, count: usize) -> Result<Vec<u32>> {
        let len = count.checked_mul(4).ok_or(Error::Truncated {
            need: usize::MAX,
            have: self.remaining(),
        })?;
        let bytes = self.read_bytes(len)?;
        let mut out = vec![0u32; count];
        LittleEndian::read_u32_into(bytes, &mut out);
        Ok(out)
    }

    /// Read a NUL-terminated ASCII string; the terminator is consumed
    pub fn read_cstring(&mut self) -> Result<String> {
        let rest = &self.data[self.pos.min(self.data.len())..];
        let len = rest.iter().position(|&b| b == 0).ok_or(Error::Truncated {
            need: rest.len() + 1,
            have: rest.len(),
        })?;
        let bytes = &rest[..len];
        if let Some(bad) = bytes.iter().find(|b| !b.is_ascii()) {
            return Err(Error::InvalidEncoding(format!(
                "non-ASCII byte {bad:#04x} at offset {}",
                self.pos
            )));
        }
        self.pos += len + 1;
        // ASCII is valid UTF-8
        Ok(bytes.iter().map(|&b| b as char).collect())
    }

    /// Read a tag byte followed by its payload: `0` integer, `1` string
    pub fn read_tagged_value(&mut self) -> Result<PropertyValue> {
        match self.read_u8()? {
            0 => Ok(PropertyValue::Integer(self.read_u32_le()?)),
            1 => Ok(PropertyValue::Text(self.read_cstring()?)),
            tag => Err(Error::UnknownValueType(tag)),
        }
    }

    /// Bound a count read from the stream by what could possibly follow it
    pub fn capacity_hint(&self, count: usize, min_item_size: usize) -> usize {
        count.min(self.remaining() / min_item_size.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::BinaryWriter;
    use quickcheck_macros::quickcheck;

    #[test]
    fn test_read_primitives() {
        let data = [0x01, 0x04, 0x03, 0x02, 0x01, 0xFF, 0xFF, 0xFF, 0xFF];
        let mut reader = BinaryReader::new(&data);

        assert_eq!(reader.read_u8().unwrap(), 0x01);
        assert_eq!(reader.read_u32_le().unwrap(), 0x01020304);
        assert_eq!(reader.read_i32_le().unwrap(), -1);
        assert!(reader.is_empty());
    }

    #[test]
    fn test_truncated_u32() {
        let data = [0x01, 0x02, 0x03];
        let mut reader = BinaryReader::new(&data);
        match reader.read_u32_le() {
            Err(Error::Truncated { need: 4, have: 3 }) => {}
            other => panic!("expected Truncated, got {other:?}"),
        }
    }

    #[test]
    fn test_read_cstring() {
        let data = b"core\0feat\0";
        let mut reader = BinaryReader::new(data);
        assert_eq!(reader.read_cstring().unwrap(), "core");
        assert_eq!(reader.position(), 5);
        assert_eq!(reader.read_cstring().unwrap(), "feat");
        assert!(reader.is_empty());
    }

    #[test]
    fn test_cstring_requires_terminator() {
        let mut reader = BinaryReader::new(b"core");
        assert!(matches!(reader.read_cstring(), Err(Error::Truncated { .. })));
        // nothing consumed on failure
        assert_eq!(reader.position(), 0);
    }

    #[test]
    fn test_cstring_rejects_non_ascii() {
        let data = [b'a', 0xE6, 0x89, 0x89, 0x00];
        let mut reader = BinaryReader::new(&data);
        assert!(matches!(reader.read_cstring(), Err(Error::InvalidEncoding(_))));
    }

    #[test]
    fn test_read_tagged_value() {
        let data = [0x00, 0x07, 0x00, 0x00, 0x00, 0x01, b'h', b'i', 0x00];
        let mut reader = BinaryReader::new(&data);
        assert_eq!(reader.read_tagged_value().unwrap(), PropertyValue::Integer(7));
        assert_eq!(reader.read_tagged_value().unwrap(), PropertyValue::Text("hi".into()));
    }

    #[test]
    fn test_unknown_tag() {
        let data = [0x02, 0x00, 0x00, 0x00, 0x00];
        let mut reader = BinaryReader::new(&data);
        assert!(matches!(reader.read_tagged_value(), Err(Error::UnknownValueType(2))));
    }

    #[test]
    fn test_read_u32_array_checks_length_first() {
        let data = [0u8; 7];
        let mut reader = BinaryReader::new(&data);
        assert!(matches!(reader.read_u32_array(2), Err(Error::Truncated { need: 8, have: 7 })));
        assert!(matches!(reader.read_u32_array(usize::MAX), Err(Error::Truncated { .. })));
        assert_eq!(reader.read_u32_array(1).unwrap(), vec![0]);
    }

    #[quickcheck]
    fn tagged_value_roundtrip(number: u32, text: String) -> bool {
        let text: String = text.chars().filter(|c| c.is_ascii() && *c != '\0').collect();
        let values = [PropertyValue::Integer(number), PropertyValue::Text(text)];

        let mut writer = BinaryWriter::new();
        for value in &values {
            writer.write_tagged_value(value).unwrap();
        }
        let data = writer.into_vec();
        let mut reader = BinaryReader::new(&data);
        values.iter().all(|v| reader.read_tagged_value().unwrap() == *v) && reader.is_empty()
    }

    #[quickcheck]
    fn only_tags_zero_and_one_are_known(tag: u8, payload: Vec<u8>) -> bool {
        let mut data = vec![tag];
        data.extend(payload);
        match BinaryReader::new(&data).read_tagged_value() {
            Err(Error::UnknownValueType(found)) => tag > 1 && found == tag,
            _ => tag <= 1,
        }
    }
}
