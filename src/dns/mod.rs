//! DNS message parsing and construction.
//!
//! Decoding accepts compressed names anywhere in the message; encoding always
//! writes names in full.

mod message;
mod reader;
mod record;
mod writer;

pub use message::{HEADER_LEN, Header, Message, Question, ResponseCode, set_message_id};
pub use reader::PacketReader;
pub use record::{RecordData, RecordType, ResourceRecord};
pub use writer::PacketWriter;

/// Port upstream servers are contacted on unless configured otherwise.
pub const DNS_PORT: u16 = 53;

/// The Internet class.
pub const CLASS_IN: u16 = 1;
