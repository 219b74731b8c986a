use byteorder::{ByteOrder, LittleEndian};

use crate::error::{Error, Result};
use super::value::PropertyValue;

/// Binary writer for map save data
pub struct BinaryWriter {
    data: Vec<u8>,
}

impl BinaryWriter {
    pub fn new() -> Self {
        Self { data: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { data: Vec::with_capacity(capacity) }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }

    pub fn write_u8(&mut self, v: u8) {
        self.data.push(v);
    }

    pub fn write_u32_le(&mut self, v: u32) {
        let mut buf = [0u8; 4];
        LittleEndian::write_u32(&mut buf, v);
        self.data.extend_from_slice(&buf);
    }

    pub fn write_i32_le(&mut self, v: i32) {
        self.write_u32_le(v as u32);
    }

    pub fn write_u32_array(&mut self, values: &[u32]) {
        let start = self.data.len();
        self.data.resize(start + values.len() * 4, 0);
        LittleEndian::write_u32_into(values, &mut self.data[start..]);
    }

    /// Write a string followed by a NUL terminator
    ///
    /// Only ASCII without interior NULs can be represented.
    pub fn write_cstring(&mut self, s: &str) -> Result<()> {
        if let Some(bad) = s.chars().find(|c| !c.is_ascii() || *c == '\0') {
            return Err(Error::InvalidEncoding(format!(
                "cannot store {bad:?} in string {s:?}"
            )));
        }
        self.write_bytes(s.as_bytes());
        self.write_u8(0);
        Ok(())
    }

    pub fn write_tagged_value(&mut self, value: &PropertyValue) -> Result<()> {
        match value {
            PropertyValue::Integer(v) => {
                self.write_u8(0);
                self.write_u32_le(*v);
            }
            PropertyValue::Text(s) => {
                self.write_u8(1);
                self.write_cstring(s)?;
            }
        }
        Ok(())
    }
}

impl Default for BinaryWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl From<BinaryWriter> for Vec<u8> {
    fn from(writer: BinaryWriter) -> Self {
        writer.into_vec()
    }
}
