//! Growable output buffer for encoding DNS messages.

use crate::error::WireError;

const MAX_LABEL_LEN: usize = 63;

type Result<T> = std::result::Result<T, WireError>;

/// Append-only message writer. Names are always written uncompressed.
pub struct PacketWriter {
    buf: Vec<u8>,
}

impl PacketWriter {
    pub fn new() -> Self {
        Self {
            buf: Vec::with_capacity(512),
        }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn write_u8(&mut self, val: u8) {
        self.buf.push(val);
    }

    pub fn write_u16(&mut self, val: u16) {
        self.buf.extend_from_slice(&val.to_be_bytes());
    }

    pub fn write_u32(&mut self, val: u32) {
        self.buf.extend_from_slice(&val.to_be_bytes());
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Overwrite two bytes at `pos`, used to back-fill record data lengths.
    pub fn set_u16(&mut self, pos: usize, val: u16) {
        self.buf[pos..pos + 2].copy_from_slice(&val.to_be_bytes());
    }

    /// Write a name as full length-prefixed labels. Empty labels (a trailing
    /// dot, or the root name itself) are skipped.
    pub fn write_name(&mut self, name: &str) -> Result<()> {
        for label in name.split('.').filter(|l| !l.is_empty()) {
            if label.len() > MAX_LABEL_LEN {
                return Err(WireError::format(format!(
                    "label '{}' exceeds {} bytes",
                    label, MAX_LABEL_LEN
                )));
            }
            self.buf.push(label.len() as u8);
            self.buf.extend_from_slice(label.as_bytes());
        }
        self.buf.push(0);
        Ok(())
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

impl Default for PacketWriter {
    fn default() -> Self {
        Self::new()
    }
}
