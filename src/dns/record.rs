//! Resource records and their typed payloads.

use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

use super::reader::PacketReader;
use super::writer::PacketWriter;
use crate::error::WireError;

type Result<T> = std::result::Result<T, WireError>;

/// Maximum length of a single TXT character-string.
const MAX_TXT_CHUNK: usize = 255;

/// `RecordType` is the numeric type of a question or record.
///
/// Codes without a named variant are kept in `Unknown` so they survive a
/// decode/encode cycle untouched.
#[derive(PartialEq, Eq, Debug, Clone, Copy, Hash)]
pub enum RecordType {
    Unknown(u16),
    A,     // 1
    Ns,    // 2
    Cname, // 5
    Soa,   // 6
    Ptr,   // 12
    Mx,    // 15
    Txt,   // 16
    Aaaa,  // 28
    Srv,   // 33
    Any,   // 255
}

impl RecordType {
    pub fn to_num(self) -> u16 {
        match self {
            RecordType::Unknown(x) => x,
            RecordType::A => 1,
            RecordType::Ns => 2,
            RecordType::Cname => 5,
            RecordType::Soa => 6,
            RecordType::Ptr => 12,
            RecordType::Mx => 15,
            RecordType::Txt => 16,
            RecordType::Aaaa => 28,
            RecordType::Srv => 33,
            RecordType::Any => 255,
        }
    }

    pub fn from_num(num: u16) -> RecordType {
        match num {
            1 => RecordType::A,
            2 => RecordType::Ns,
            5 => RecordType::Cname,
            6 => RecordType::Soa,
            12 => RecordType::Ptr,
            15 => RecordType::Mx,
            16 => RecordType::Txt,
            28 => RecordType::Aaaa,
            33 => RecordType::Srv,
            255 => RecordType::Any,
            _ => RecordType::Unknown(num),
        }
    }
}

impl From<u16> for RecordType {
    fn from(num: u16) -> Self {
        RecordType::from_num(num)
    }
}

/// Mnemonic used in logs and matched against custom record types; unknown
/// codes print as their number.
impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordType::Unknown(x) => write!(f, "{}", x),
            RecordType::A => f.write_str("A"),
            RecordType::Ns => f.write_str("NS"),
            RecordType::Cname => f.write_str("CNAME"),
            RecordType::Soa => f.write_str("SOA"),
            RecordType::Ptr => f.write_str("PTR"),
            RecordType::Mx => f.write_str("MX"),
            RecordType::Txt => f.write_str("TXT"),
            RecordType::Aaaa => f.write_str("AAAA"),
            RecordType::Srv => f.write_str("SRV"),
            RecordType::Any => f.write_str("ANY"),
        }
    }
}

/// Parses the mnemonics produced by `Display` (exact case) or a bare number.
impl FromStr for RecordType {
    type Err = WireError;

    fn from_str(s: &str) -> Result<Self> {
        let rtype = match s {
            "A" => RecordType::A,
            "NS" => RecordType::Ns,
            "CNAME" => RecordType::Cname,
            "SOA" => RecordType::Soa,
            "PTR" => RecordType::Ptr,
            "MX" => RecordType::Mx,
            "TXT" => RecordType::Txt,
            "AAAA" => RecordType::Aaaa,
            "SRV" => RecordType::Srv,
            "ANY" => RecordType::Any,
            other => other
                .parse::<u16>()
                .map(RecordType::from_num)
                .map_err(|_| WireError::UnsupportedRecordType(other.to_string()))?,
        };
        Ok(rtype)
    }
}

/// Typed record payload. The variant determines the record's type code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordData {
    A(Ipv4Addr),
    Aaaa(Ipv6Addr),
    Cname(String),
    Ns(String),
    Ptr(String),
    Mx {
        priority: u16,
        exchange: String,
    },
    /// All character-strings of the record, concatenated.
    Txt(String),
    Soa {
        mname: String,
        rname: String,
        serial: u32,
        refresh: u32,
        retry: u32,
        expire: u32,
        minimum: u32,
    },
    /// Any other type, carried as raw rdata.
    Opaque {
        rtype: u16,
        data: Vec<u8>,
    },
}

impl RecordData {
    pub fn rtype(&self) -> RecordType {
        match self {
            RecordData::A(_) => RecordType::A,
            RecordData::Aaaa(_) => RecordType::Aaaa,
            RecordData::Cname(_) => RecordType::Cname,
            RecordData::Ns(_) => RecordType::Ns,
            RecordData::Ptr(_) => RecordType::Ptr,
            RecordData::Mx { .. } => RecordType::Mx,
            RecordData::Txt(_) => RecordType::Txt,
            RecordData::Soa { .. } => RecordType::Soa,
            RecordData::Opaque { rtype, .. } => RecordType::from_num(*rtype),
        }
    }

    /// Build a payload from its textual form, as found in custom records.
    pub fn from_text(rtype: RecordType, text: &str) -> Result<RecordData> {
        let invalid = |what: &str| WireError::format(format!("'{}' is not {}", text, what));

        match rtype {
            RecordType::A => text
                .parse()
                .map(RecordData::A)
                .map_err(|_| invalid("an IPv4 address")),
            RecordType::Aaaa => text
                .parse()
                .map(RecordData::Aaaa)
                .map_err(|_| invalid("an IPv6 address")),
            RecordType::Cname => Ok(RecordData::Cname(text.to_string())),
            RecordType::Ns => Ok(RecordData::Ns(text.to_string())),
            RecordType::Ptr => Ok(RecordData::Ptr(text.to_string())),
            RecordType::Txt => Ok(RecordData::Txt(text.to_string())),
            other => Err(WireError::UnsupportedRecordType(other.to_string())),
        }
    }

    /// Decode `len` bytes of rdata starting at the reader's position.
    ///
    /// Name-bearing payloads may follow compression pointers anywhere in the
    /// message, so the caller re-positions the reader after this returns.
    fn read(reader: &mut PacketReader<'_>, rtype: RecordType, len: usize) -> Result<RecordData> {
        let data = match rtype {
            RecordType::A => {
                let octets = fixed_rdata::<4>(reader, len, "A")?;
                RecordData::A(Ipv4Addr::from(octets))
            }
            RecordType::Aaaa => {
                let octets = fixed_rdata::<16>(reader, len, "AAAA")?;
                RecordData::Aaaa(Ipv6Addr::from(octets))
            }
            RecordType::Cname => RecordData::Cname(reader.read_name()?),
            RecordType::Ns => RecordData::Ns(reader.read_name()?),
            RecordType::Ptr => RecordData::Ptr(reader.read_name()?),
            RecordType::Mx => RecordData::Mx {
                priority: reader.read_u16()?,
                exchange: reader.read_name()?,
            },
            RecordType::Txt => {
                let rdata = reader.read_bytes(len)?;
                let mut text = String::new();
                let mut pos = 0;
                while pos < rdata.len() {
                    let chunk_len = rdata[pos] as usize;
                    let chunk = rdata.get(pos + 1..pos + 1 + chunk_len).ok_or_else(|| {
                        WireError::format("TXT character-string runs past rdata")
                    })?;
                    text.push_str(&String::from_utf8_lossy(chunk));
                    pos += 1 + chunk_len;
                }
                RecordData::Txt(text)
            }
            RecordType::Soa => RecordData::Soa {
                mname: reader.read_name()?,
                rname: reader.read_name()?,
                serial: reader.read_u32()?,
                refresh: reader.read_u32()?,
                retry: reader.read_u32()?,
                expire: reader.read_u32()?,
                minimum: reader.read_u32()?,
            },
            other => RecordData::Opaque {
                rtype: other.to_num(),
                data: reader.read_bytes(len)?.to_vec(),
            },
        };

        Ok(data)
    }

    fn write(&self, writer: &mut PacketWriter) -> Result<()> {
        match self {
            RecordData::A(addr) => writer.write_bytes(&addr.octets()),
            RecordData::Aaaa(addr) => writer.write_bytes(&addr.octets()),
            RecordData::Cname(host) | RecordData::Ns(host) | RecordData::Ptr(host) => {
                writer.write_name(host)?
            }
            RecordData::Mx { priority, exchange } => {
                writer.write_u16(*priority);
                writer.write_name(exchange)?;
            }
            RecordData::Txt(text) => {
                if text.is_empty() {
                    writer.write_u8(0);
                }
                for chunk in text.as_bytes().chunks(MAX_TXT_CHUNK) {
                    writer.write_u8(chunk.len() as u8);
                    writer.write_bytes(chunk);
                }
            }
            RecordData::Soa {
                mname,
                rname,
                serial,
                refresh,
                retry,
                expire,
                minimum,
            } => {
                writer.write_name(mname)?;
                writer.write_name(rname)?;
                for val in [serial, refresh, retry, expire, minimum] {
                    writer.write_u32(*val);
                }
            }
            RecordData::Opaque { data, .. } => writer.write_bytes(data),
        }

        Ok(())
    }
}

fn fixed_rdata<const N: usize>(
    reader: &mut PacketReader<'_>,
    len: usize,
    kind: &str,
) -> Result<[u8; N]> {
    if len != N {
        return Err(WireError::format(format!(
            "{} record with {} bytes of rdata",
            kind, len
        )));
    }
    let mut octets = [0u8; N];
    octets.copy_from_slice(reader.read_bytes(N)?);
    Ok(octets)
}

/// A resource record from the answer, authority or additional section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRecord {
    pub name: String,
    pub class: u16,
    pub ttl: u32,
    pub data: RecordData,
}

impl ResourceRecord {
    pub fn rtype(&self) -> RecordType {
        self.data.rtype()
    }

    pub fn read(reader: &mut PacketReader<'_>) -> Result<ResourceRecord> {
        let name = reader.read_name()?;
        let rtype = RecordType::from_num(reader.read_u16()?);
        let class = reader.read_u16()?;
        let ttl = reader.read_u32()?;
        let len = reader.read_u16()? as usize;

        let start = reader.pos();
        if len > reader.remaining() {
            return Err(WireError::format(format!(
                "rdata of {} bytes at offset {} runs past end",
                len, start
            )));
        }

        let data = RecordData::read(reader, rtype, len)?;
        reader.seek(start + len)?;

        Ok(ResourceRecord {
            name,
            class,
            ttl,
            data,
        })
    }

    pub fn write(&self, writer: &mut PacketWriter) -> Result<()> {
        writer.write_name(&self.name)?;
        writer.write_u16(self.rtype().to_num());
        writer.write_u16(self.class);
        writer.write_u32(self.ttl);

        let len_pos = writer.len();
        writer.write_u16(0);
        self.data.write(writer)?;

        let len = writer.len() - len_pos - 2;
        let len = u16::try_from(len)
            .map_err(|_| WireError::format(format!("rdata of {} bytes is too long", len)))?;
        writer.set_u16(len_pos, len);

        Ok(())
    }
}
