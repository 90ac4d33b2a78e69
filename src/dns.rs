//! DNS wire format: message encoding and decoding.
//!
//! This module implements the parts of RFC 1035 §4 that an iterative resolver needs:
//! building a single-question query, and decoding the header, the echoed question and
//! the resource records of a response, including compressed domain names.
//!
//! Decoding never keeps state between calls. Every decode routine takes the complete
//! message buffer together with an absolute offset and returns what it decoded plus
//! where the next field starts, so compression pointers always resolve against the
//! whole message.
//!
//! # Core Types
//!
//! - [`DnsHeader`] - the fixed 12-byte message header
//! - [`DnsQuestion`] - the name, type and class being asked about
//! - [`ResourceRecord`] - one record from the answer, authority or additional section
//! - [`DnsMessage`] - a header, its question and the three record sections
//!
//! # Examples
//!
//! ```rust
//! use iterative_resolver::dns::{decode_name, encode_query, DnsHeader, QueryType, CLASS_IN};
//!
//! let query = encode_query(22, 0, "example.com", QueryType::A as u16, CLASS_IN)?;
//! let header = DnsHeader::from_bytes(&query)?;
//! assert_eq!(header.id, 22);
//! assert_eq!(header.question_count, 1);
//!
//! // The question name starts right after the header.
//! let (name, consumed) = decode_name(&query, 12)?;
//! assert_eq!(name, "example.com");
//! assert_eq!(consumed, 13);
//! # Ok::<(), iterative_resolver::error::DnsError>(())
//! ```
//!
//! # Wire Format Compatibility
//!
//! All multi-byte integers are big-endian. Names are written uncompressed; on the
//! decode side a length byte whose top two bits are `11` starts a 14-bit pointer to an
//! absolute offset in the message.

use core::fmt;
use std::net::Ipv4Addr;

use crate::error::{DnsError, Result};

/// Size of the fixed message header.
pub const HEADER_SIZE: usize = 12;

/// The Internet class.
pub const CLASS_IN: u16 = 1;

const MAX_LABEL_LEN: usize = 63;
const MAX_NAME_LEN: usize = 255;
const POINTER_MASK: u8 = 0b1100_0000;

/// Record types the resolver knows by name.
///
/// Any other type code is still decoded, its rdata is kept as opaque bytes and it
/// displays as `TYPE<n>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum QueryType {
    /// IPv4 host address.
    A = 1,
    /// Authoritative name server.
    NS = 2,
    /// Canonical name for an alias.
    CNAME = 5,
    /// Start of a zone of authority.
    SOA = 6,
    /// IPv6 host address.
    AAAA = 28,
}

impl fmt::Display for QueryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryType::A => write!(f, "A"),
            QueryType::NS => write!(f, "NS"),
            QueryType::CNAME => write!(f, "CNAME"),
            QueryType::SOA => write!(f, "SOA"),
            QueryType::AAAA => write!(f, "AAAA"),
        }
    }
}

impl TryFrom<u16> for QueryType {
    type Error = String;

    fn try_from(value: u16) -> std::result::Result<Self, Self::Error> {
        match value {
            1 => Ok(QueryType::A),
            2 => Ok(QueryType::NS),
            5 => Ok(QueryType::CNAME),
            6 => Ok(QueryType::SOA),
            28 => Ok(QueryType::AAAA),
            _ => Err(format!("Unknown query type code: {}", value)),
        }
    }
}

/// Response codes carried in the low four bits of the header flags.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ResponseCode {
    NoError = 0,
    FormatError = 1,
    ServerFailure = 2,
    NameError = 3,
    NotImplemented = 4,
    Refused = 5,
}

/// The fixed 12-byte header at the start of every DNS message.
///
/// The same layout is used for queries and responses; a response echoes the query's
/// `id` and fills in the section counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DnsHeader {
    /// Transaction id matching a response to its query.
    pub id: u16,
    /// QR, opcode, AA, TC, RD, RA, Z and RCODE bits.
    pub flags: u16,
    /// Entries in the question section.
    pub question_count: u16,
    /// Records in the answer section.
    pub answer_count: u16,
    /// Records in the authority section.
    pub authority_count: u16,
    /// Records in the additional section.
    pub additional_count: u16,
}

impl DnsHeader {
    /// An all-zero header.
    pub fn new() -> Self {
        DnsHeader::default()
    }

    /// Appends the 12-byte wire form of the header to `buffer`.
    pub fn pack(&self, buffer: &mut Vec<u8>) {
        buffer.extend_from_slice(&self.id.to_be_bytes());
        buffer.extend_from_slice(&self.flags.to_be_bytes());
        buffer.extend_from_slice(&self.question_count.to_be_bytes());
        buffer.extend_from_slice(&self.answer_count.to_be_bytes());
        buffer.extend_from_slice(&self.authority_count.to_be_bytes());
        buffer.extend_from_slice(&self.additional_count.to_be_bytes());
    }

    /// Decodes the header from the first 12 bytes of `buffer`.
    ///
    /// # Errors
    ///
    /// Returns [`DnsError::MalformedMessage`] if `buffer` is shorter than 12 bytes.
    pub fn from_bytes(buffer: &[u8]) -> Result<Self> {
        if buffer.len() < HEADER_SIZE {
            return Err(DnsError::malformed(
                buffer.len(),
                format!("header needs {} bytes, got {}", HEADER_SIZE, buffer.len()),
            ));
        }

        Ok(DnsHeader {
            id: read_u16(buffer, 0)?,
            flags: read_u16(buffer, 2)?,
            question_count: read_u16(buffer, 4)?,
            answer_count: read_u16(buffer, 6)?,
            authority_count: read_u16(buffer, 8)?,
            additional_count: read_u16(buffer, 10)?,
        })
    }

    /// The RCODE from the flags. Reserved codes are reported as `ServerFailure`.
    pub fn response_code(&self) -> ResponseCode {
        match self.flags & 0x000F {
            0 => ResponseCode::NoError,
            1 => ResponseCode::FormatError,
            2 => ResponseCode::ServerFailure,
            3 => ResponseCode::NameError,
            4 => ResponseCode::NotImplemented,
            5 => ResponseCode::Refused,
            _ => ResponseCode::ServerFailure,
        }
    }

    /// Whether the TC bit is set, i.e. the server cut the response short.
    pub fn is_truncated(&self) -> bool {
        self.flags & 0x0200 != 0
    }

    /// Total number of resource records across answer, authority and additional.
    pub fn record_count(&self) -> u32 {
        u32::from(self.answer_count)
            + u32::from(self.authority_count)
            + u32::from(self.additional_count)
    }
}

/// The question section entry: what is being asked about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsQuestion {
    /// Dot-joined domain name, without a trailing dot.
    pub name: String,
    pub qtype: u16,
    pub qclass: u16,
}

impl DnsQuestion {
    pub fn pack(&self, buffer: &mut Vec<u8>) -> Result<()> {
        pack_domain_name(buffer, &self.name)?;
        buffer.extend_from_slice(&self.qtype.to_be_bytes());
        buffer.extend_from_slice(&self.qclass.to_be_bytes());
        Ok(())
    }

    /// Decodes a question starting at `offset`, returning it and the offset just past it.
    pub fn from_bytes(buffer: &[u8], offset: usize) -> Result<(Self, usize)> {
        let (name, consumed) = decode_name(buffer, offset)?;
        let pos = offset + consumed;
        let qtype = read_u16(buffer, pos)?;
        let qclass = read_u16(buffer, pos + 2)?;

        Ok((
            DnsQuestion {
                name,
                qtype,
                qclass,
            },
            pos + 4,
        ))
    }
}

/// Record data, interpreted according to the record's type and class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RData {
    /// An `A`/`IN` record: exactly four address bytes.
    A(Ipv4Addr),
    /// An `NS`/`IN` record: the name server's domain name.
    NS(String),
    /// Anything else, kept as the raw rdata bytes.
    Other(Vec<u8>),
}

impl fmt::Display for RData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RData::A(addr) => write!(f, "{}", addr),
            RData::NS(host) => write!(f, "{}", host),
            // RFC 3597 generic form.
            RData::Other(bytes) => {
                write!(f, "\\# {}", bytes.len())?;
                if !bytes.is_empty() {
                    write!(f, " ")?;
                    for byte in bytes {
                        write!(f, "{:02x}", byte)?;
                    }
                }
                Ok(())
            }
        }
    }
}

/// One resource record from a response section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRecord {
    /// Owner name, with any compression pointers already followed.
    pub name: String,
    pub rtype: u16,
    pub rclass: u16,
    pub ttl: u32,
    /// Rdata length as stated on the wire.
    pub rdlength: u16,
    pub data: RData,
}

impl fmt::Display for ResourceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let class = match self.rclass {
            CLASS_IN => "IN".to_string(),
            other => format!("CLASS{}", other),
        };
        let rtype = match QueryType::try_from(self.rtype) {
            Ok(known) => known.to_string(),
            Err(_) => format!("TYPE{}", self.rtype),
        };
        write!(
            f,
            "{:<30} {:<10} {:<4} {:<6} {}",
            self.name, self.ttl, class, rtype, self.data
        )
    }
}

impl ResourceRecord {
    /// The address carried by an `A`/`IN` record.
    pub fn ipv4(&self) -> Option<Ipv4Addr> {
        match &self.data {
            RData::A(addr) => Some(*addr),
            _ => None,
        }
    }

    /// The target of an `NS`/`IN` record.
    pub fn nameserver(&self) -> Option<&str> {
        match &self.data {
            RData::NS(host) => Some(host),
            _ => None,
        }
    }

    /// Appends the record with an uncompressed owner name. `rdlength` is recomputed
    /// from `data`.
    pub fn pack(&self, buffer: &mut Vec<u8>) -> Result<()> {
        pack_domain_name(buffer, &self.name)?;
        buffer.extend_from_slice(&self.rtype.to_be_bytes());
        buffer.extend_from_slice(&self.rclass.to_be_bytes());
        buffer.extend_from_slice(&self.ttl.to_be_bytes());

        let mut rdata = Vec::new();
        match &self.data {
            RData::A(addr) => rdata.extend_from_slice(&addr.octets()),
            RData::NS(host) => pack_domain_name(&mut rdata, host)?,
            RData::Other(bytes) => rdata.extend_from_slice(bytes),
        }
        let rdlength = u16::try_from(rdata.len())
            .map_err(|_| DnsError::malformed(buffer.len(), "rdata longer than 65535 bytes"))?;
        buffer.extend_from_slice(&rdlength.to_be_bytes());
        buffer.extend_from_slice(&rdata);
        Ok(())
    }

    /// Decodes a record starting at `offset`, returning it and the offset just past
    /// its rdata.
    ///
    /// `NS` rdata is decoded as a name at its absolute position in `buffer`, so
    /// pointers inside it resolve against the whole message.
    ///
    /// # Errors
    ///
    /// - [`DnsError::MalformedMessage`] if any field or the rdata runs past the
    ///   buffer, an `A`/`IN` record's rdata is not 4 bytes, or an `NS` name spills
    ///   outside its rdata
    /// - [`DnsError::PointerLoop`] if a name's compression pointers cycle
    pub fn from_bytes(buffer: &[u8], offset: usize) -> Result<(Self, usize)> {
        let (name, consumed) = decode_name(buffer, offset)?;
        let pos = offset + consumed;

        let rtype = read_u16(buffer, pos)?;
        let rclass = read_u16(buffer, pos + 2)?;
        let ttl = read_u32(buffer, pos + 4)?;
        let rdlength = read_u16(buffer, pos + 8)?;

        let rdata_start = pos + 10;
        let rdata_end = rdata_start + rdlength as usize;
        let rdata = buffer.get(rdata_start..rdata_end).ok_or_else(|| {
            DnsError::malformed(
                rdata_start,
                format!("rdata of {} bytes runs past end of buffer", rdlength),
            )
        })?;

        let data = match (QueryType::try_from(rtype), rclass) {
            (Ok(QueryType::A), CLASS_IN) => {
                let octets: [u8; 4] = rdata.try_into().map_err(|_| {
                    DnsError::malformed(
                        rdata_start,
                        format!("A record rdata is {} bytes, expected 4", rdlength),
                    )
                })?;
                RData::A(Ipv4Addr::from(octets))
            }
            (Ok(QueryType::NS), CLASS_IN) => {
                let (host, used) = decode_name(buffer, rdata_start)?;
                if used > rdata.len() {
                    return Err(DnsError::malformed(
                        rdata_start,
                        format!("NS name uses {} bytes, rdata is {}", used, rdlength),
                    ));
                }
                RData::NS(host)
            }
            _ => RData::Other(rdata.to_vec()),
        };

        Ok((
            ResourceRecord {
                name,
                rtype,
                rclass,
                ttl,
                rdlength,
                data,
            },
            rdata_end,
        ))
    }
}

/// A single-question DNS message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsMessage {
    pub header: DnsHeader,
    pub question: DnsQuestion,
    pub answers: Vec<ResourceRecord>,
    pub authorities: Vec<ResourceRecord>,
    pub additionals: Vec<ResourceRecord>,
}

impl DnsMessage {
    /// A query with one question and empty record sections.
    pub fn query(id: u16, flags: u16, name: &str, qtype: u16, qclass: u16) -> Self {
        DnsMessage {
            header: DnsHeader {
                id,
                flags,
                question_count: 1,
                ..DnsHeader::default()
            },
            question: DnsQuestion {
                name: name.to_string(),
                qtype,
                qclass,
            },
            answers: Vec::new(),
            authorities: Vec::new(),
            additionals: Vec::new(),
        }
    }

    /// Appends the message's wire form to `buffer`.
    ///
    /// The header is written as stored; callers building responses are expected to
    /// keep the counts in step with the sections.
    pub fn pack(&self, buffer: &mut Vec<u8>) -> Result<()> {
        self.header.pack(buffer);
        self.question.pack(buffer)?;
        for record in self
            .answers
            .iter()
            .chain(&self.authorities)
            .chain(&self.additionals)
        {
            record.pack(buffer)?;
        }
        Ok(())
    }

    /// Parses a whole message positionally from start to end.
    pub fn from_bytes(buffer: &[u8]) -> Result<Self> {
        let header = DnsHeader::from_bytes(buffer)?;
        if header.question_count != 1 {
            return Err(DnsError::malformed(
                4,
                format!(
                    "expected exactly one question, got {}",
                    header.question_count
                ),
            ));
        }

        let (question, offset) = DnsQuestion::from_bytes(buffer, HEADER_SIZE)?;
        let (answers, offset) = decode_records(buffer, offset, header.answer_count)?;
        let (authorities, offset) = decode_records(buffer, offset, header.authority_count)?;
        let (additionals, _) = decode_records(buffer, offset, header.additional_count)?;

        Ok(DnsMessage {
            header,
            question,
            answers,
            authorities,
            additionals,
        })
    }
}

/// Encodes a single-question query: header followed by the question section.
///
/// # Errors
///
/// Returns [`DnsError::LabelTooLong`], [`DnsError::EmptyLabel`] or
/// [`DnsError::NameTooLong`] if `name` cannot be written as a domain name.
pub fn encode_query(id: u16, flags: u16, name: &str, qtype: u16, qclass: u16) -> Result<Vec<u8>> {
    let mut buffer = Vec::with_capacity(HEADER_SIZE + name.len() + 6);
    DnsMessage::query(id, flags, name, qtype, qclass).pack(&mut buffer)?;
    Ok(buffer)
}

/// Decodes `count` consecutive records starting at `offset`.
pub fn decode_records(
    buffer: &[u8],
    offset: usize,
    count: u16,
) -> Result<(Vec<ResourceRecord>, usize)> {
    // Counts come off the wire; don't trust them for the allocation.
    let mut records = Vec::with_capacity((count as usize).min(16));
    let mut offset = offset;
    for _ in 0..count {
        let (record, next) = ResourceRecord::from_bytes(buffer, offset)?;
        records.push(record);
        offset = next;
    }
    Ok((records, offset))
}

/// Writes `domain` as length-prefixed labels ending in a zero byte.
///
/// One trailing dot is accepted and ignored; an empty name (or `.`) is the root and
/// encodes as a single zero byte.
pub fn pack_domain_name(buffer: &mut Vec<u8>, domain: &str) -> Result<()> {
    let trimmed = domain.strip_suffix('.').unwrap_or(domain);
    let mut encoded = Vec::with_capacity(trimmed.len() + 2);

    if !trimmed.is_empty() {
        for label in trimmed.split('.') {
            let len = label.len();
            if len == 0 {
                return Err(DnsError::EmptyLabel {
                    name: domain.to_string(),
                });
            }
            if len > MAX_LABEL_LEN {
                return Err(DnsError::LabelTooLong {
                    label: label.to_string(),
                    length: len,
                });
            }

            encoded.push(len as u8);
            encoded.extend_from_slice(label.as_bytes());
        }
    }
    encoded.push(0);

    if encoded.len() > MAX_NAME_LEN {
        return Err(DnsError::NameTooLong {
            name: domain.to_string(),
            length: encoded.len(),
        });
    }

    buffer.extend_from_slice(&encoded);
    Ok(())
}

/// Decodes a domain name starting at `offset` in `buffer`.
///
/// Returns the dot-joined name and the number of bytes the name occupies at
/// `offset`. Once a compression pointer is met the name ends there as far as the
/// caller is concerned: the pointer accounts for exactly two bytes, however long the
/// name it refers to.
///
/// # Errors
///
/// - [`DnsError::MalformedMessage`] if a length byte, label or pointer target falls
///   outside `buffer`, or a length byte uses the reserved `01`/`10` prefixes
/// - [`DnsError::PointerLoop`] if a pointer leads back to an offset already jumped
///   to while decoding this name
pub fn decode_name(buffer: &[u8], offset: usize) -> Result<(String, usize)> {
    let mut labels: Vec<String> = Vec::new();
    let mut pos = offset;
    let mut consumed = None;
    let mut jumped_to: Vec<usize> = Vec::new();

    loop {
        let len = *buffer
            .get(pos)
            .ok_or_else(|| DnsError::malformed(pos, "name runs past end of buffer"))?;

        if len & POINTER_MASK == POINTER_MASK {
            let low = *buffer
                .get(pos + 1)
                .ok_or_else(|| DnsError::malformed(pos, "truncated compression pointer"))?;
            let target = (((len & !POINTER_MASK) as usize) << 8) | low as usize;

            if consumed.is_none() {
                consumed = Some(pos + 2 - offset);
            }
            if jumped_to.contains(&target) {
                return Err(DnsError::PointerLoop { offset: target });
            }
            if target >= buffer.len() {
                return Err(DnsError::malformed(
                    pos,
                    format!("compression pointer to {} is outside the message", target),
                ));
            }

            jumped_to.push(target);
            pos = target;
            continue;
        }

        if len & POINTER_MASK != 0 {
            return Err(DnsError::malformed(
                pos,
                format!("unsupported label type 0x{:02x}", len),
            ));
        }

        if len == 0 {
            pos += 1;
            break;
        }

        let start = pos + 1;
        let end = start + len as usize;
        let label = buffer
            .get(start..end)
            .ok_or_else(|| DnsError::malformed(pos, "label runs past end of buffer"))?;
        labels.push(String::from_utf8_lossy(label).into_owned());
        pos = end;
    }

    Ok((labels.join("."), consumed.unwrap_or(pos - offset)))
}

fn read_u16(buffer: &[u8], offset: usize) -> Result<u16> {
    buffer
        .get(offset..offset + 2)
        .map(|bytes| u16::from_be_bytes([bytes[0], bytes[1]]))
        .ok_or_else(|| DnsError::malformed(offset, "16-bit field runs past end of buffer"))
}

fn read_u32(buffer: &[u8], offset: usize) -> Result<u32> {
    buffer
        .get(offset..offset + 4)
        .map(|bytes| u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
        .ok_or_else(|| DnsError::malformed(offset, "32-bit field runs past end of buffer"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_domain_name() {
        let mut buffer = Vec::new();
        pack_domain_name(&mut buffer, "www.google.com").unwrap();
        assert_eq!(
            buffer,
            vec![
                3, b'w', b'w', b'w', 6, b'g', b'o', b'o', b'g', b'l', b'e', 3, b'c', b'o', b'm', 0
            ]
        );
    }

    #[test]
    fn test_pack_domain_name_trailing_dot_and_root() {
        let mut with_dot = Vec::new();
        pack_domain_name(&mut with_dot, "example.com.").unwrap();
        let mut without = Vec::new();
        pack_domain_name(&mut without, "example.com").unwrap();
        assert_eq!(with_dot, without);

        let mut root = Vec::new();
        pack_domain_name(&mut root, ".").unwrap();
        assert_eq!(root, vec![0]);
    }

    #[test]
    fn test_pack_rejects_bad_labels() {
        let long_label = "a".repeat(64);
        let mut buffer = Vec::new();
        match pack_domain_name(&mut buffer, &format!("{}.com", long_label)) {
            Err(DnsError::LabelTooLong { length, .. }) => assert_eq!(length, 64),
            other => panic!("expected LabelTooLong, got {:?}", other),
        }
        assert!(buffer.is_empty());

        assert!(matches!(
            pack_domain_name(&mut buffer, "a..b"),
            Err(DnsError::EmptyLabel { .. })
        ));

        let sixty_three = "b".repeat(63);
        let too_long = [sixty_three.as_str(); 4].join(".");
        assert!(matches!(
            pack_domain_name(&mut buffer, &too_long),
            Err(DnsError::NameTooLong { length: 257, .. })
        ));
    }

    #[test]
    fn test_max_length_label_round_trips() {
        let label = "m".repeat(63);
        let name = format!("{}.example.com", label);
        let query = encode_query(1, 0, &name, QueryType::A as u16, CLASS_IN).unwrap();

        let (decoded, consumed) = decode_name(&query, HEADER_SIZE).unwrap();
        assert_eq!(decoded, name);
        // (63 + 7 + 3) label bytes, 3 length bytes, 1 terminator
        assert_eq!(consumed, 73 + 3 + 1);
        assert_eq!(query.len(), HEADER_SIZE + consumed + 4);
    }

    #[test]
    fn test_encode_query_layout() {
        let query = encode_query(0xBEEF, 0, "example.com", QueryType::A as u16, CLASS_IN).unwrap();
        assert_eq!(&query[..HEADER_SIZE], &[0xBE, 0xEF, 0, 0, 0, 1, 0, 0, 0, 0, 0, 0]);
        assert_eq!(
            &query[HEADER_SIZE..],
            &[
                7, b'e', b'x', b'a', b'm', b'p', b'l', b'e', 3, b'c', b'o', b'm', 0, 0, 1, 0, 1
            ]
        );
    }

    #[test]
    fn test_header_round_trip() {
        let header = DnsHeader {
            id: 0xABCD,
            flags: 0x8180,
            question_count: 1,
            answer_count: 2,
            authority_count: 13,
            additional_count: 0xFFFF,
        };
        let mut buffer = Vec::new();
        header.pack(&mut buffer);
        assert_eq!(buffer.len(), HEADER_SIZE);
        assert_eq!(DnsHeader::from_bytes(&buffer).unwrap(), header);
        assert_eq!(header.record_count(), 2 + 13 + 0xFFFF);
    }

    #[test]
    fn test_header_too_short() {
        let err = DnsHeader::from_bytes(&[0u8; 11]).unwrap_err();
        assert!(matches!(err, DnsError::MalformedMessage { offset: 11, .. }));
    }

    #[test]
    fn test_header_flags() {
        let header = DnsHeader {
            flags: 0x8383,
            ..DnsHeader::default()
        };
        assert_eq!(header.response_code(), ResponseCode::NameError);
        assert!(header.is_truncated());
        assert!(!DnsHeader::new().is_truncated());
    }

    #[test]
    fn test_unpack_simple_domain_name() {
        let data = vec![
            3, b'w', b'w', b'w', 6, b'g', b'o', b'o', b'g', b'l', b'e', 3, b'c', b'o', b'm', 0,
        ];
        let (name, consumed) = decode_name(&data, 0).unwrap();
        assert_eq!(name, "www.google.com");
        // 3 + 6 + 3 label bytes, 3 length bytes, 1 terminator
        assert_eq!(consumed, 16);
    }

    #[test]
    fn test_unpack_root_name() {
        assert_eq!(decode_name(&[0], 0).unwrap(), (String::new(), 1));
    }

    #[test]
    fn test_unpack_compressed_domain_name() {
        let data = vec![
            0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0a, 0x0b, // 12 bytes
            // "example.com" at offset 12
            7, b'e', b'x', b'a', b'm', b'p', b'l', b'e', 3, b'c', b'o', b'm', 0, // 13 bytes
            0xDE, 0xAD, 0xBE, 0xEF, // pointer to offset 12 at offset 29
            0xc0, 0x0c,
        ];
        let (spelled, spelled_len) = decode_name(&data, 12).unwrap();
        let (pointed, pointer_len) = decode_name(&data, 29).unwrap();
        assert_eq!(spelled, "example.com");
        assert_eq!(spelled_len, 13);
        assert_eq!(pointed, spelled);
        assert_eq!(pointer_len, 2);
    }

    #[test]
    fn test_unpack_complex_compression() {
        // F.EXAMPLE.COM, where the suffix is a pointer to EXAMPLE.COM
        let data = vec![
            0x01, b'f', // "f"
            0x07, b'e', b'x', b'a', b'm', b'p', b'l', b'e', // "example"
            0x03, b'c', b'o', b'm', // "com"
            0x00, // null terminator for example.com
            0x01, b'f', 0xc0, 0x02, // "f" then pointer to offset 2
        ];
        let (name, consumed) = decode_name(&data, 15).unwrap();
        assert_eq!(name, "f.example.com");
        assert_eq!(consumed, 4);
    }

    #[test]
    fn test_chained_pointers() {
        // "com" at 0, "example" + ptr(0) at 5, ptr(5) at 15
        let data = vec![
            3, b'c', b'o', b'm', 0, // 0..5
            7, b'e', b'x', b'a', b'm', b'p', b'l', b'e', 0xc0, 0x00, // 5..15
            0xc0, 0x05, // 15..17
        ];
        assert_eq!(
            decode_name(&data, 15).unwrap(),
            ("example.com".to_string(), 2)
        );
    }

    #[test]
    fn test_self_referencing_pointer_is_a_loop() {
        let data = vec![0u8, 0, 0xc0, 0x02];
        assert!(matches!(
            decode_name(&data, 2),
            Err(DnsError::PointerLoop { offset: 2 })
        ));
    }

    #[test]
    fn test_two_pointer_cycle_is_a_loop() {
        // label "a" then pointer to 4; at 4 label "b" then pointer back to 0
        let data = vec![1, b'a', 0xc0, 0x04, 1, b'b', 0xc0, 0x00];
        assert!(matches!(
            decode_name(&data, 0),
            Err(DnsError::PointerLoop { .. })
        ));
    }

    #[test]
    fn test_name_out_of_bounds() {
        // label claims 5 bytes, only 2 present
        assert!(matches!(
            decode_name(&[5, b'a', b'b'], 0),
            Err(DnsError::MalformedMessage { .. })
        ));
        // missing terminator
        assert!(matches!(
            decode_name(&[1, b'a'], 0),
            Err(DnsError::MalformedMessage { .. })
        ));
        // pointer past the end
        assert!(matches!(
            decode_name(&[0xc0, 0x40], 0),
            Err(DnsError::MalformedMessage { .. })
        ));
        // offset itself past the end
        assert!(matches!(
            decode_name(&[0], 3),
            Err(DnsError::MalformedMessage { offset: 3, .. })
        ));
    }

    #[test]
    fn test_reserved_label_type() {
        assert!(matches!(
            decode_name(&[0x41, 0x00], 0),
            Err(DnsError::MalformedMessage { .. })
        ));
    }

    #[test]
    fn test_decode_question() {
        let query = encode_query(1, 0, "example.com", QueryType::A as u16, CLASS_IN).unwrap();
        let (question, next) = DnsQuestion::from_bytes(&query, HEADER_SIZE).unwrap();
        assert_eq!(question.name, "example.com");
        assert_eq!(question.qtype, 1);
        assert_eq!(question.qclass, CLASS_IN);
        assert_eq!(next, query.len());
    }

    #[test]
    fn test_parse_a_record() {
        // A record for "goo.com" -> 142.250.187.206, owner name via pointer
        let data = vec![
            0xc0, 0x0c, // pointer to offset 12
            0x00, 0x01, // type A
            0x00, 0x01, // class IN
            0x00, 0x00, 0x00, 0x3c, // TTL 60
            0x00, 0x04, // rdlength 4
            142, 250, 187, 206,
        ];
        let full_packet = [
            &[0; 12][..],
            &[3, b'g', b'o', b'o', 3, b'c', b'o', b'm', 0][..],
            &data[..],
        ]
        .concat();

        let (record, next) = ResourceRecord::from_bytes(&full_packet, 12 + 9).unwrap();
        assert_eq!(record.name, "goo.com");
        assert_eq!(record.rtype, QueryType::A as u16);
        assert_eq!(record.ttl, 60);
        assert_eq!(record.rdlength, 4);
        assert_eq!(record.ipv4(), Some(Ipv4Addr::new(142, 250, 187, 206)));
        assert_eq!(next, full_packet.len());
    }

    #[test]
    fn test_a_record_with_wrong_rdlength() {
        let data = vec![
            0x00, // root owner
            0x00, 0x01, 0x00, 0x01, // A IN
            0x00, 0x00, 0x00, 0x3c, // TTL
            0x00, 0x05, // rdlength 5
            1, 2, 3, 4, 5,
        ];
        assert!(matches!(
            ResourceRecord::from_bytes(&data, 0),
            Err(DnsError::MalformedMessage { offset: 11, .. })
        ));
    }

    #[test]
    fn test_rdata_past_end() {
        let data = vec![
            0x00, 0x00, 0x10, 0x00, 0x01, // TXT IN
            0x00, 0x00, 0x00, 0x3c, 0x00, 0x08, // rdlength 8
            1, 2, 3,
        ];
        assert!(matches!(
            ResourceRecord::from_bytes(&data, 0),
            Err(DnsError::MalformedMessage { .. })
        ));
    }

    #[test]
    fn test_ns_rdata_pointer_resolves_against_message() {
        let mut packet = vec![0u8; 12];
        // "tld-server.net" at offset 12
        pack_domain_name(&mut packet, "tld-server.net").unwrap();
        let record_start = packet.len();
        packet.extend_from_slice(&[0x00]); // owner: root
        packet.extend_from_slice(&[0x00, 0x02, 0x00, 0x01]); // NS IN
        packet.extend_from_slice(&[0x00, 0x02, 0xa3, 0x00]); // TTL 172800
        packet.extend_from_slice(&[0x00, 0x06]); // rdlength 6
        packet.extend_from_slice(&[3, b'n', b's', b'1', 0xc0, 0x0c]);

        let (record, next) = ResourceRecord::from_bytes(&packet, record_start).unwrap();
        assert_eq!(record.nameserver(), Some("ns1.tld-server.net"));
        assert_eq!(record.ttl, 172_800);
        assert_eq!(next, packet.len());
    }

    #[test]
    fn test_ns_name_longer_than_rdata() {
        let mut packet = vec![0x00, 0x00, 0x02, 0x00, 0x01, 0, 0, 0, 60, 0x00, 0x02];
        packet.extend_from_slice(&[3, b'n', b's', b'1', 0]);
        assert!(matches!(
            ResourceRecord::from_bytes(&packet, 0),
            Err(DnsError::MalformedMessage { .. })
        ));
    }

    #[test]
    fn test_unknown_type_kept_opaque() {
        let data = vec![
            0x00, 0x00, 0x06, 0x00, 0x01, // SOA IN
            0x00, 0x00, 0x0e, 0x10, 0x00, 0x03, // TTL 3600, rdlength 3
            0xaa, 0xbb, 0xcc,
        ];
        let (record, _) = ResourceRecord::from_bytes(&data, 0).unwrap();
        assert_eq!(record.data, RData::Other(vec![0xaa, 0xbb, 0xcc]));
        assert_eq!(record.ipv4(), None);
        assert_eq!(record.nameserver(), None);
        assert!(record.to_string().ends_with("SOA    \\# 3 aabbcc"));
    }

    #[test]
    fn test_a_record_outside_in_class_is_opaque() {
        let data = vec![
            0x00, 0x00, 0x01, 0x00, 0x03, // A CH
            0x00, 0x00, 0x00, 0x00, 0x00, 0x02, 0x12, 0x34,
        ];
        let (record, _) = ResourceRecord::from_bytes(&data, 0).unwrap();
        assert_eq!(record.data, RData::Other(vec![0x12, 0x34]));
        assert!(record.to_string().contains("CLASS3"));
    }

    #[test]
    fn test_message_from_bytes() {
        let mut message =
            DnsMessage::query(7, 0x8000, "example.com", QueryType::A as u16, CLASS_IN);
        message.header.authority_count = 1;
        message.header.additional_count = 1;
        message.authorities.push(ResourceRecord {
            name: "com".into(),
            rtype: QueryType::NS as u16,
            rclass: CLASS_IN,
            ttl: 172_800,
            rdlength: 0,
            data: RData::NS("a.gtld-servers.net".into()),
        });
        message.additionals.push(ResourceRecord {
            name: "a.gtld-servers.net".into(),
            rtype: QueryType::A as u16,
            rclass: CLASS_IN,
            ttl: 172_800,
            rdlength: 0,
            data: RData::A(Ipv4Addr::new(192, 5, 6, 30)),
        });

        let mut buffer = Vec::new();
        message.pack(&mut buffer).unwrap();
        let parsed = DnsMessage::from_bytes(&buffer).unwrap();

        assert_eq!(parsed.header, message.header);
        assert_eq!(parsed.question.name, "example.com");
        assert!(parsed.answers.is_empty());
        assert_eq!(parsed.authorities[0].nameserver(), Some("a.gtld-servers.net"));
        assert_eq!(parsed.authorities[0].rdlength, 20);
        assert_eq!(parsed.additionals[0].ipv4(), Some(Ipv4Addr::new(192, 5, 6, 30)));
    }

    #[test]
    fn test_message_rejects_multiple_questions() {
        let mut buffer = encode_query(1, 0, "example.com", 1, 1).unwrap();
        buffer[5] = 2;
        assert!(matches!(
            DnsMessage::from_bytes(&buffer),
            Err(DnsError::MalformedMessage { offset: 4, .. })
        ));
    }

    #[test]
    fn test_query_type_conversions() {
        assert_eq!(QueryType::try_from(28).unwrap(), QueryType::AAAA);
        assert!(QueryType::try_from(99).is_err());
        assert_eq!(QueryType::CNAME.to_string(), "CNAME");
    }
}
