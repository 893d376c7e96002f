//! Bounds-checked cursor over a DNS message.

use crate::error::WireError;

/// Upper bound on labels plus pointer jumps followed while reading one name.
const MAX_NAME_STEPS: usize = 128;

type Result<T> = std::result::Result<T, WireError>;

/// Read cursor over a complete message buffer.
///
/// Every read is checked against the end of the buffer, so a lying count or
/// length field surfaces as [`WireError::Format`] instead of a panic.
pub struct PacketReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> PacketReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len().saturating_sub(self.pos)
    }

    /// Move the cursor to an absolute offset (at most the end of the buffer).
    pub fn seek(&mut self, pos: usize) -> Result<()> {
        if pos > self.buf.len() {
            return Err(WireError::format(format!(
                "seek to {} past end of {}-byte message",
                pos,
                self.buf.len()
            )));
        }
        self.pos = pos;
        Ok(())
    }

    fn byte_at(&self, pos: usize) -> Result<u8> {
        self.buf
            .get(pos)
            .copied()
            .ok_or_else(|| WireError::format(format!("read at offset {} past end", pos)))
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        let b = self.byte_at(self.pos)?;
        self.pos += 1;
        Ok(b)
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        let bytes = self.read_bytes(2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        let bytes = self.read_bytes(4)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.buf.len())
            .ok_or_else(|| {
                WireError::format(format!(
                    "{} bytes at offset {} run past end of {}-byte message",
                    len,
                    self.pos,
                    self.buf.len()
                ))
            })?;
        let bytes = &self.buf[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    /// Read a possibly compressed domain name.
    ///
    /// After a compression pointer the cursor ends up just past the first
    /// pointer (two bytes), no matter how many further jumps were taken.
    pub fn read_name(&mut self) -> Result<String> {
        let start = self.pos;
        let mut pos = self.pos;
        let mut resume_at = None;
        let mut labels: Vec<String> = Vec::new();

        for _ in 0..MAX_NAME_STEPS {
            let len = self.byte_at(pos)?;

            match len & 0xC0 {
                0xC0 => {
                    let low = self.byte_at(pos + 1)?;
                    if resume_at.is_none() {
                        resume_at = Some(pos + 2);
                    }
                    pos = (((len & 0x3F) as usize) << 8) | low as usize;
                }
                0x00 if len == 0 => {
                    self.pos = resume_at.unwrap_or(pos + 1);
                    return Ok(labels.join("."));
                }
                0x00 => {
                    let len = len as usize;
                    let label = self.buf.get(pos + 1..pos + 1 + len).ok_or_else(|| {
                        WireError::format(format!("label at offset {} runs past end", pos))
                    })?;
                    labels.push(String::from_utf8_lossy(label).into_owned());
                    pos += 1 + len;
                }
                _ => {
                    return Err(WireError::format(format!(
                        "reserved label type {:#04x} at offset {}",
                        len, pos
                    )));
                }
            }
        }

        Err(WireError::NameLoop(start))
    }
}
