//! DNS message header, questions and the complete message.

use super::reader::PacketReader;
use super::record::{RecordType, ResourceRecord};
use super::writer::PacketWriter;
use crate::error::WireError;

type Result<T> = std::result::Result<T, WireError>;

pub const HEADER_LEN: usize = 12;

/// Response code carried in the low four bits of the flags word.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum ResponseCode {
    #[default]
    NoError,
    FormErr,
    ServFail,
    NxDomain,
    NotImp,
    Refused,
    Other(u8),
}

impl ResponseCode {
    pub fn from_num(num: u8) -> ResponseCode {
        match num {
            0 => ResponseCode::NoError,
            1 => ResponseCode::FormErr,
            2 => ResponseCode::ServFail,
            3 => ResponseCode::NxDomain,
            4 => ResponseCode::NotImp,
            5 => ResponseCode::Refused,
            n => ResponseCode::Other(n & 0x0F),
        }
    }

    pub fn to_num(self) -> u8 {
        match self {
            ResponseCode::NoError => 0,
            ResponseCode::FormErr => 1,
            ResponseCode::ServFail => 2,
            ResponseCode::NxDomain => 3,
            ResponseCode::NotImp => 4,
            ResponseCode::Refused => 5,
            ResponseCode::Other(n) => n & 0x0F,
        }
    }
}

/// Representation of a DNS header
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Header {
    pub id: u16,

    pub response: bool,            // 1 bit
    pub opcode: u8,                // 4 bits
    pub authoritative: bool,       // 1 bit
    pub truncated: bool,           // 1 bit
    pub recursion_desired: bool,   // 1 bit
    pub recursion_available: bool, // 1 bit
    pub z: u8,                     // 3 bits
    pub rcode: ResponseCode,       // 4 bits

    pub question_count: u16,
    pub answer_count: u16,
    pub authority_count: u16,
    pub additional_count: u16,
}

impl Header {
    fn flags(&self) -> u16 {
        ((self.response as u16) << 15)
            | (((self.opcode & 0x0F) as u16) << 11)
            | ((self.authoritative as u16) << 10)
            | ((self.truncated as u16) << 9)
            | ((self.recursion_desired as u16) << 8)
            | ((self.recursion_available as u16) << 7)
            | (((self.z & 0x07) as u16) << 4)
            | self.rcode.to_num() as u16
    }

    pub fn read(reader: &mut PacketReader<'_>) -> Result<Header> {
        if reader.remaining() < HEADER_LEN {
            return Err(WireError::format(format!(
                "{} bytes is shorter than a header",
                reader.remaining()
            )));
        }

        let id = reader.read_u16()?;
        let flags = reader.read_u16()?;

        Ok(Header {
            id,
            response: (flags >> 15) & 1 == 1,
            opcode: ((flags >> 11) & 0x0F) as u8,
            authoritative: (flags >> 10) & 1 == 1,
            truncated: (flags >> 9) & 1 == 1,
            recursion_desired: (flags >> 8) & 1 == 1,
            recursion_available: (flags >> 7) & 1 == 1,
            z: ((flags >> 4) & 0x07) as u8,
            rcode: ResponseCode::from_num((flags & 0x0F) as u8),
            question_count: reader.read_u16()?,
            answer_count: reader.read_u16()?,
            authority_count: reader.read_u16()?,
            additional_count: reader.read_u16()?,
        })
    }

    pub fn write(&self, writer: &mut PacketWriter) {
        writer.write_u16(self.id);
        writer.write_u16(self.flags());
        writer.write_u16(self.question_count);
        writer.write_u16(self.answer_count);
        writer.write_u16(self.authority_count);
        writer.write_u16(self.additional_count);
    }
}

/// Representation of a DNS question
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub name: String,
    pub qtype: RecordType,
    pub class: u16,
}

impl Question {
    pub fn new(name: impl Into<String>, qtype: RecordType) -> Question {
        Question {
            name: name.into(),
            qtype,
            class: super::CLASS_IN,
        }
    }

    pub fn read(reader: &mut PacketReader<'_>) -> Result<Question> {
        Ok(Question {
            name: reader.read_name()?,
            qtype: RecordType::from_num(reader.read_u16()?),
            class: reader.read_u16()?,
        })
    }

    pub fn write(&self, writer: &mut PacketWriter) -> Result<()> {
        writer.write_name(&self.name)?;
        writer.write_u16(self.qtype.to_num());
        writer.write_u16(self.class);
        Ok(())
    }

    /// Key under which responses to this question are cached. The name
    /// keeps its spelling, since a cached reply repeats the question section.
    pub fn cache_key(&self) -> String {
        format!("{}:{}", self.name, self.qtype.to_num())
    }
}

/// A complete DNS message.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Message {
    pub header: Header,
    pub questions: Vec<Question>,
    pub answers: Vec<ResourceRecord>,
    pub authorities: Vec<ResourceRecord>,
    pub additionals: Vec<ResourceRecord>,
}

impl Message {
    /// Decode a message. The header counts decide how many entries each
    /// section holds.
    pub fn decode(bytes: &[u8]) -> Result<Message> {
        let mut reader = PacketReader::new(bytes);
        let header = Header::read(&mut reader)?;

        let questions = (0..header.question_count)
            .map(|_| Question::read(&mut reader))
            .collect::<Result<Vec<_>>>()?;
        let answers = read_records(&mut reader, header.answer_count)?;
        let authorities = read_records(&mut reader, header.authority_count)?;
        let additionals = read_records(&mut reader, header.additional_count)?;

        Ok(Message {
            header,
            questions,
            answers,
            authorities,
            additionals,
        })
    }

    /// Encode the message without name compression. Section counts are taken
    /// from the sections themselves, not from the header.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut header = self.header.clone();
        header.question_count = section_len(self.questions.len(), "question")?;
        header.answer_count = section_len(self.answers.len(), "answer")?;
        header.authority_count = section_len(self.authorities.len(), "authority")?;
        header.additional_count = section_len(self.additionals.len(), "additional")?;

        let mut writer = PacketWriter::new();
        header.write(&mut writer);

        for question in &self.questions {
            question.write(&mut writer)?;
        }
        for record in self
            .answers
            .iter()
            .chain(&self.authorities)
            .chain(&self.additionals)
        {
            record.write(&mut writer)?;
        }

        Ok(writer.into_bytes())
    }

    /// Skeleton reply to `request`: same id, opcode, recursion-desired flag
    /// and questions, `NOERROR` and no records.
    pub fn response_to(request: &Message) -> Message {
        Message {
            header: Header {
                id: request.header.id,
                response: true,
                opcode: request.header.opcode,
                recursion_desired: request.header.recursion_desired,
                recursion_available: true,
                rcode: ResponseCode::NoError,
                question_count: request.questions.len() as u16,
                ..Header::default()
            },
            questions: request.questions.clone(),
            answers: Vec::new(),
            authorities: Vec::new(),
            additionals: Vec::new(),
        }
    }

    /// Build a standard recursive query for a single question.
    pub fn query(id: u16, question: Question) -> Message {
        Message {
            header: Header {
                id,
                recursion_desired: true,
                question_count: 1,
                ..Header::default()
            },
            questions: vec![question],
            ..Message::default()
        }
    }
}

fn read_records(reader: &mut PacketReader<'_>, count: u16) -> Result<Vec<ResourceRecord>> {
    (0..count).map(|_| ResourceRecord::read(reader)).collect()
}

fn section_len(len: usize, section: &str) -> Result<u16> {
    u16::try_from(len)
        .map_err(|_| WireError::format(format!("{} {} entries do not fit a count", len, section)))
}

/// Replace the id of an already encoded message.
pub fn set_message_id(message: &mut [u8], id: u16) {
    if message.len() >= 2 {
        message[..2].copy_from_slice(&id.to_be_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dns::RecordData;
    use std::net::Ipv4Addr;

    fn a_record(name: &str, addr: [u8; 4], ttl: u32) -> ResourceRecord {
        ResourceRecord {
            name: name.to_string(),
            class: 1,
            ttl,
            data: RecordData::A(Ipv4Addr::from(addr)),
        }
    }

    #[test]
    fn header_flags_pack_per_rfc1035() {
        let header = Header {
            id: 0xBEEF,
            response: true,
            opcode: 2,
            authoritative: true,
            truncated: false,
            recursion_desired: true,
            recursion_available: true,
            z: 5,
            rcode: ResponseCode::NxDomain,
            ..Header::default()
        };

        let mut writer = PacketWriter::new();
        header.write(&mut writer);
        let bytes = writer.into_bytes();

        // 1 0010 1 0 1 | 1 101 0011
        assert_eq!(&bytes[..4], &[0xBE, 0xEF, 0x95, 0xD3]);

        let mut reader = PacketReader::new(&bytes);
        assert_eq!(Header::read(&mut reader).unwrap(), header);
    }

    #[test]
    fn decode_rejects_short_buffer() {
        assert!(matches!(
            Message::decode(&[0u8; 11]),
            Err(WireError::Format(_))
        ));
    }

    #[test]
    fn decode_rejects_lying_counts() {
        let mut bytes = Message::query(7, Question::new("example.com", RecordType::A))
            .encode()
            .unwrap();
        // claim three answers that are not there
        bytes[7] = 3;

        assert!(matches!(Message::decode(&bytes), Err(WireError::Format(_))));
    }

    #[test]
    fn a_only_message_round_trips() {
        let request = Message::query(0x1234, Question::new("www.example.com", RecordType::A));
        let mut response = Message::response_to(&request);
        response.answers.push(a_record("www.example.com", [93, 184, 216, 34], 300));
        response.answers.push(a_record("www.example.com", [93, 184, 216, 35], 120));
        response.additionals.push(a_record("ns.example.com", [10, 0, 0, 53], 60));

        let decoded = Message::decode(&response.encode().unwrap()).unwrap();

        assert_eq!(decoded.header.question_count, 1);
        assert_eq!(decoded.header.answer_count, 2);
        assert_eq!(decoded.header.authority_count, 0);
        assert_eq!(decoded.header.additional_count, 1);
        assert_eq!(decoded.questions, response.questions);
        assert_eq!(decoded.answers, response.answers);
        assert_eq!(decoded.additionals, response.additionals);
        assert_eq!(decoded.header.id, 0x1234);
        assert!(decoded.header.response);
    }

    #[test]
    fn encode_derives_counts_from_sections() {
        let mut message = Message::query(1, Question::new("example.com", RecordType::A));
        message.header.answer_count = 9;

        let bytes = message.encode().unwrap();

        assert_eq!(&bytes[4..12], &[0, 1, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn compressed_answer_matches_expanded_name() {
        // Upstream-style response: answer name is a pointer to the question,
        // and the CNAME target compresses against it as well.
        let mut bytes = vec![
            0xAB, 0xCD, 0x81, 0x80, 0, 1, 0, 2, 0, 0, 0, 0, // header
        ];
        bytes.extend_from_slice(b"\x03www\x07example\x03com\x00");
        bytes.extend_from_slice(&[0, 5, 0, 1]);
        // answer 1: www.example.com CNAME web.example.com
        bytes.extend_from_slice(&[0xC0, 12, 0, 5, 0, 1, 0, 0, 0, 60, 0, 6]);
        let rdata_start = bytes.len();
        bytes.extend_from_slice(&[3, b'w', b'e', b'b', 0xC0, 16]);
        let after_first = bytes.len();
        assert_eq!(after_first, rdata_start + 6);
        // answer 2: web.example.com A 10.1.2.3, name points into the rdata above
        bytes.extend_from_slice(&[0xC0, rdata_start as u8, 0, 1, 0, 1, 0, 0, 0, 60, 0, 4]);
        bytes.extend_from_slice(&[10, 1, 2, 3]);

        let message = Message::decode(&bytes).unwrap();

        assert_eq!(message.questions[0].name, "www.example.com");
        assert_eq!(message.answers[0].name, "www.example.com");
        assert_eq!(
            message.answers[0].data,
            RecordData::Cname("web.example.com".to_string())
        );
        assert_eq!(message.answers[1].name, "web.example.com");
        assert_eq!(
            message.answers[1].data,
            RecordData::A(Ipv4Addr::new(10, 1, 2, 3))
        );

        // re-encoding expands every pointer
        let expanded = Message::decode(&message.encode().unwrap()).unwrap();
        assert_eq!(expanded, message);
    }

    #[test]
    fn cursor_lands_after_rdata_for_mx_with_pointer() {
        let mut bytes = vec![0, 1, 0x81, 0x80, 0, 1, 0, 1, 0, 0, 0, 0];
        bytes.extend_from_slice(b"\x07example\x03com\x00");
        bytes.extend_from_slice(&[0, 15, 0, 1]);
        bytes.extend_from_slice(&[0xC0, 12, 0, 15, 0, 1, 0, 0, 1, 0, 0, 9]);
        bytes.extend_from_slice(&[0, 10, 4, b'm', b'a', b'i', b'l', 0xC0, 12]);

        let mut reader = PacketReader::new(&bytes);
        Header::read(&mut reader).unwrap();
        Question::read(&mut reader).unwrap();
        let record_start = reader.pos();
        let record = ResourceRecord::read(&mut reader).unwrap();

        assert_eq!(reader.pos(), record_start + 2 + 10 + 9);
        assert_eq!(reader.pos(), bytes.len());
        assert_eq!(
            record.data,
            RecordData::Mx {
                priority: 10,
                exchange: "mail.example.com".to_string()
            }
        );
    }

    #[test]
    fn response_to_echoes_request() {
        let mut request = Message::query(0x4242, Question::new("Local.PNS", RecordType::A));
        request.header.opcode = 0;
        request.header.recursion_desired = false;
        request.answers.push(a_record("junk", [1, 1, 1, 1], 1));

        let response = Message::response_to(&request);

        assert_eq!(response.header.id, 0x4242);
        assert!(response.header.response);
        assert!(response.header.recursion_available);
        assert!(!response.header.recursion_desired);
        assert_eq!(response.header.rcode, ResponseCode::NoError);
        assert_eq!(response.questions, request.questions);
        assert!(response.answers.is_empty());
        assert!(response.authorities.is_empty());
        assert!(response.additionals.is_empty());
    }

    #[test]
    fn cache_key_keeps_name_spelling() {
        let question = Question::new("WWW.Example.com", RecordType::Aaaa);

        assert_eq!(question.cache_key(), "WWW.Example.com:28");
        assert_ne!(
            question.cache_key(),
            Question::new("www.example.com", RecordType::Aaaa).cache_key()
        );
    }

    #[test]
    fn set_message_id_rewrites_first_two_bytes() {
        let mut bytes = vec![0, 0, 0x81, 0x80];
        set_message_id(&mut bytes, 0xCAFE);

        assert_eq!(bytes, vec![0xCA, 0xFE, 0x81, 0x80]);
    }
}
