//! DNS wire format parser and serializer (RFC 1035), with name compression
//! on the build side.

use std::collections::HashMap;
use std::net::{Ipv4Addr, Ipv6Addr};
use thiserror::Error;

use crate::records::{DnsRecord, RData, RecordClass, RecordType};

const MAX_POINTER_HOPS: usize = 128;
// Wire-octet budget for a name: label length octets + label bytes, plus the
// one-octet terminator (RFC 1035 §2.3.4's 255-octet limit on the whole
// encoded name, not on the dotted presentation form).
const MAX_NAME_WIRE_LEN: usize = 255;
const MAX_COMPRESSION_OFFSET: usize = 0x3FFF;

#[derive(Error, Debug)]
pub enum DnsParseError {
    #[error("packet too short: {0} bytes")]
    ShortPacket(usize),
    #[error("name truncated at offset {0}")]
    Truncated(usize),
    #[error("bad compression pointer at offset {0}")]
    BadPointer(usize),
    #[error("label overflows packet at offset {0}")]
    LabelOverflow(usize),
    #[error("name exceeds 255 wire octets")]
    NameTooLong,
    #[error("more than {MAX_POINTER_HOPS} compression pointer hops")]
    PointerLoop,
    #[error("label longer than 63 octets: {0}")]
    BadLabel(usize),
    #[error("non-UTF-8 label at offset {0}")]
    InvalidUtf8(usize),
    #[error("malformed RDATA for type {0}")]
    BadRData(u16),
    #[error("record count does not match announced section count")]
    CountMismatch,
    #[error("type {0} cannot carry a compressed name in the builder")]
    UnsupportedType(u16),
}

/// DNS message header, fields decomposed rather than kept as a packed flags
/// word — matches the wire diagram directly and is simple to construct in
/// tests and in the response builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DnsHeader {
    pub id: u16,
    pub qr: bool,
    pub opcode: u8,
    pub aa: bool,
    pub tc: bool,
    pub rd: bool,
    pub ra: bool,
    pub z: u8,
    pub rcode: u8,
    pub qdcount: u16,
    pub ancount: u16,
    pub nscount: u16,
    pub arcount: u16,
}

impl DnsHeader {
    pub fn parse(buf: &[u8]) -> Result<Self, DnsParseError> {
        if buf.len() < 12 {
            return Err(DnsParseError::ShortPacket(buf.len()));
        }
        let flags = u16::from_be_bytes([buf[2], buf[3]]);
        Ok(Self {
            id: u16::from_be_bytes([buf[0], buf[1]]),
            qr: flags & 0x8000 != 0,
            opcode: ((flags >> 11) & 0xF) as u8,
            aa: flags & 0x0400 != 0,
            tc: flags & 0x0200 != 0,
            rd: flags & 0x0100 != 0,
            ra: flags & 0x0080 != 0,
            z: ((flags >> 4) & 0x7) as u8,
            rcode: (flags & 0xF) as u8,
            qdcount: u16::from_be_bytes([buf[4], buf[5]]),
            ancount: u16::from_be_bytes([buf[6], buf[7]]),
            nscount: u16::from_be_bytes([buf[8], buf[9]]),
            arcount: u16::from_be_bytes([buf[10], buf[11]]),
        })
    }

    pub fn write(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.id.to_be_bytes());
        let flags: u16 = (self.qr as u16) << 15
            | ((self.opcode as u16) & 0xF) << 11
            | (self.aa as u16) << 10
            | (self.tc as u16) << 9
            | (self.rd as u16) << 8
            | (self.ra as u16) << 7
            // reserved Z field is always emitted zero, regardless of self.z
            | (self.rcode as u16 & 0xF);
        buf.extend_from_slice(&flags.to_be_bytes());
        buf.extend_from_slice(&self.qdcount.to_be_bytes());
        buf.extend_from_slice(&self.ancount.to_be_bytes());
        buf.extend_from_slice(&self.nscount.to_be_bytes());
        buf.extend_from_slice(&self.arcount.to_be_bytes());
    }

    /// Overwrite the transaction ID in an already-built buffer.
    pub fn rewrite_id(buf: &mut [u8], id: u16) {
        if buf.len() >= 2 {
            buf[0..2].copy_from_slice(&id.to_be_bytes());
        }
    }

    pub fn read_id(buf: &[u8]) -> Option<u16> {
        if buf.len() >= 2 {
            Some(u16::from_be_bytes([buf[0], buf[1]]))
        } else {
            None
        }
    }
}

#[derive(Debug, Clone)]
pub struct DnsQuestion {
    pub name: String,
    pub qtype: RecordType,
    pub qclass: RecordClass,
}

#[derive(Debug, Clone)]
pub struct DnsQuery {
    pub header: DnsHeader,
    pub questions: Vec<DnsQuestion>,
    pub raw_question_bytes: Vec<u8>,
}

/// Parse a DNS name from the wire with pointer-compression support. Returns
/// (dotted name, offset just past the name as it appears in the containing
/// record — i.e. past the pointer pair if one was followed).
pub fn parse_name(buf: &[u8], mut offset: usize) -> Result<(String, usize), DnsParseError> {
    let mut labels: Vec<&str> = Vec::new();
    let mut total_len = 0usize;
    let mut jumped = false;
    let mut end_offset = 0usize;
    let mut hops = 0usize;

    loop {
        if offset >= buf.len() {
            return Err(DnsParseError::Truncated(offset));
        }
        let len = buf[offset] as usize;

        if len & 0xC0 == 0xC0 {
            if offset + 1 >= buf.len() {
                return Err(DnsParseError::Truncated(offset));
            }
            if !jumped {
                end_offset = offset + 2;
            }
            let target = ((len & 0x3F) << 8) | (buf[offset + 1] as usize);
            if target >= offset {
                return Err(DnsParseError::BadPointer(offset));
            }
            offset = target;
            jumped = true;
            hops += 1;
            if hops > MAX_POINTER_HOPS {
                return Err(DnsParseError::PointerLoop);
            }
            continue;
        }

        if len == 0 {
            if !jumped {
                end_offset = offset + 1;
            }
            break;
        }

        if len > 63 {
            return Err(DnsParseError::BadLabel(len));
        }

        let label_start = offset + 1;
        let label_end = label_start + len;
        if label_end > buf.len() {
            return Err(DnsParseError::LabelOverflow(offset));
        }

        let label = std::str::from_utf8(&buf[label_start..label_end])
            .map_err(|_| DnsParseError::InvalidUtf8(offset))?;
        total_len += len + 1;
        if total_len + 1 > MAX_NAME_WIRE_LEN {
            return Err(DnsParseError::NameTooLong);
        }
        labels.push(label);
        offset = label_end;
    }

    Ok((labels.join("."), end_offset))
}

/// Append a name to `buf`, compressing against previously-written suffixes
/// recorded in `offsets` (suffix -> absolute offset where it starts). Walks
/// candidate suffixes from most-specific to least, emits a pointer to the
/// first match, and records the offsets of any labels written literally.
pub fn write_name(
    name: &str,
    buf: &mut Vec<u8>,
    offsets: &mut HashMap<String, u16>,
) -> Result<(), DnsParseError> {
    let trimmed = name.trim_end_matches('.');
    if trimmed.is_empty() {
        buf.push(0);
        return Ok(());
    }

    let labels: Vec<&str> = trimmed.split('.').collect();
    for label in &labels {
        if label.len() > 63 {
            return Err(DnsParseError::BadLabel(label.len()));
        }
    }

    for i in 0..labels.len() {
        let suffix = labels[i..].join(".").to_lowercase();
        if let Some(&target) = offsets.get(&suffix) {
            for label in &labels[..i] {
                buf.push(label.len() as u8);
                buf.extend_from_slice(label.as_bytes());
            }
            let pointer: u16 = 0xC000 | target;
            buf.extend_from_slice(&pointer.to_be_bytes());
            return Ok(());
        }
    }

    // no suffix matched: write every label literally, recording offsets
    // for each position as we go (most-specific first).
    for i in 0..labels.len() {
        let start = buf.len();
        if start <= MAX_COMPRESSION_OFFSET {
            let suffix = labels[i..].join(".").to_lowercase();
            offsets.entry(suffix).or_insert(start as u16);
        }
        let label = labels[i];
        buf.push(label.len() as u8);
        buf.extend_from_slice(label.as_bytes());
    }
    buf.push(0);
    Ok(())
}

pub fn parse_query(buf: &[u8]) -> Result<DnsQuery, DnsParseError> {
    let header = DnsHeader::parse(buf)?;
    let mut offset = 12;
    let question_start = offset;
    let mut questions = Vec::with_capacity(header.qdcount as usize);

    for _ in 0..header.qdcount {
        let (name, new_offset) = parse_name(buf, offset)?;
        offset = new_offset;
        if offset + 4 > buf.len() {
            return Err(DnsParseError::Truncated(offset));
        }
        let qtype = RecordType::from_u16(u16::from_be_bytes([buf[offset], buf[offset + 1]]));
        let qclass =
            RecordClass::from_u16(u16::from_be_bytes([buf[offset + 2], buf[offset + 3]]));
        offset += 4;
        questions.push(DnsQuestion {
            name: name.to_lowercase(),
            qtype,
            qclass,
        });
    }

    Ok(DnsQuery {
        header,
        questions,
        raw_question_bytes: buf[question_start..offset].to_vec(),
    })
}

/// A fully parsed response, sections kept separate. Authority/additional are
/// parsed (so the walk can find the end of the message) but the forwarder
/// only caches and re-emits the answer section.
pub struct ParsedMessage {
    pub header: DnsHeader,
    pub answers: Vec<DnsRecord>,
    pub authority: Vec<DnsRecord>,
    pub additional: Vec<DnsRecord>,
}

pub fn parse_message(buf: &[u8]) -> Result<ParsedMessage, DnsParseError> {
    let header = DnsHeader::parse(buf)?;
    let mut offset = 12;

    for _ in 0..header.qdcount {
        let (_, new_offset) = parse_name(buf, offset)?;
        offset = new_offset + 4;
    }

    let mut answers = Vec::new();
    let mut authority = Vec::new();
    let mut additional = Vec::new();

    for (count, bucket) in [
        (header.ancount as usize, 0u8),
        (header.nscount as usize, 1u8),
        (header.arcount as usize, 2u8),
    ] {
        for _ in 0..count {
            if offset >= buf.len() {
                return Err(DnsParseError::CountMismatch);
            }
            let (record, new_offset) = parse_record(buf, offset)?;
            offset = new_offset;
            match bucket {
                0 => answers.push(record),
                1 => authority.push(record),
                _ => additional.push(record),
            }
        }
    }

    Ok(ParsedMessage {
        header,
        answers,
        authority,
        additional,
    })
}

fn parse_record(buf: &[u8], offset: usize) -> Result<(DnsRecord, usize), DnsParseError> {
    let (name, mut offset) = parse_name(buf, offset)?;
    if offset + 10 > buf.len() {
        return Err(DnsParseError::Truncated(offset));
    }
    let rtype_raw = u16::from_be_bytes([buf[offset], buf[offset + 1]]);
    let rtype = RecordType::from_u16(rtype_raw);
    let class = RecordClass::from_u16(u16::from_be_bytes([buf[offset + 2], buf[offset + 3]]));
    let ttl = u32::from_be_bytes([
        buf[offset + 4],
        buf[offset + 5],
        buf[offset + 6],
        buf[offset + 7],
    ]);
    let rdlength = u16::from_be_bytes([buf[offset + 8], buf[offset + 9]]) as usize;
    offset += 10;
    if offset + rdlength > buf.len() {
        return Err(DnsParseError::Truncated(offset));
    }
    let rdata = parse_rdata(buf, offset, rdlength, rtype_raw)?;
    offset += rdlength;

    Ok((
        DnsRecord {
            name: name.to_lowercase(),
            rtype,
            class,
            ttl,
            rdata,
        },
        offset,
    ))
}

fn parse_rdata(
    buf: &[u8],
    offset: usize,
    rdlength: usize,
    rtype_raw: u16,
) -> Result<RData, DnsParseError> {
    let raw = || RData::Raw(buf[offset..offset + rdlength].to_vec());
    match rtype_raw {
        1 => {
            if rdlength != 4 {
                return Err(DnsParseError::BadRData(rtype_raw));
            }
            Ok(RData::A(Ipv4Addr::new(
                buf[offset],
                buf[offset + 1],
                buf[offset + 2],
                buf[offset + 3],
            )))
        }
        28 => {
            if rdlength != 16 {
                return Err(DnsParseError::BadRData(rtype_raw));
            }
            let mut octets = [0u8; 16];
            octets.copy_from_slice(&buf[offset..offset + 16]);
            Ok(RData::AAAA(Ipv6Addr::from(octets)))
        }
        2 | 5 | 12 => {
            let (name, _) = parse_name(buf, offset)?;
            Ok(match rtype_raw {
                2 => RData::NS(name),
                5 => RData::CNAME(name),
                _ => RData::PTR(name),
            })
        }
        15 => {
            if rdlength < 3 {
                return Err(DnsParseError::BadRData(rtype_raw));
            }
            let preference = u16::from_be_bytes([buf[offset], buf[offset + 1]]);
            let (exchange, _) = parse_name(buf, offset + 2)?;
            Ok(RData::MX {
                preference,
                exchange,
            })
        }
        16 => {
            let mut strings = Vec::new();
            let mut pos = offset;
            let end = offset + rdlength;
            while pos < end {
                let len = buf[pos] as usize;
                pos += 1;
                if pos + len > end {
                    return Err(DnsParseError::BadRData(rtype_raw));
                }
                strings.push(buf[pos..pos + len].to_vec());
                pos += len;
            }
            Ok(RData::TXT(strings))
        }
        6 => {
            let (mname, next) = parse_name(buf, offset)?;
            let (rname, next) = parse_name(buf, next)?;
            if next + 20 > buf.len() {
                return Err(DnsParseError::BadRData(rtype_raw));
            }
            let o = next;
            Ok(RData::SOA {
                mname,
                rname,
                serial: u32::from_be_bytes([buf[o], buf[o + 1], buf[o + 2], buf[o + 3]]),
                refresh: u32::from_be_bytes([buf[o + 4], buf[o + 5], buf[o + 6], buf[o + 7]]),
                retry: u32::from_be_bytes([buf[o + 8], buf[o + 9], buf[o + 10], buf[o + 11]]),
                expire: u32::from_be_bytes([buf[o + 12], buf[o + 13], buf[o + 14], buf[o + 15]]),
                minimum: u32::from_be_bytes([buf[o + 16], buf[o + 17], buf[o + 18], buf[o + 19]]),
            })
        }
        33 => {
            if rdlength < 7 {
                return Err(DnsParseError::BadRData(rtype_raw));
            }
            let priority = u16::from_be_bytes([buf[offset], buf[offset + 1]]);
            let weight = u16::from_be_bytes([buf[offset + 2], buf[offset + 3]]);
            let port = u16::from_be_bytes([buf[offset + 4], buf[offset + 5]]);
            let (target, _) = parse_name(buf, offset + 6)?;
            Ok(RData::SRV {
                priority,
                weight,
                port,
                target,
            })
        }
        // SVCB, HTTPS, CAA and anything else: opaque passthrough.
        _ => Ok(raw()),
    }
}

/// Build a response message: header with final counts computed from what
/// actually encodes, the original question section copied verbatim, then
/// answer records. Records whose type carries a name we cannot build
/// (currently: none of the supported types fail, but SVCB/HTTPS/CAA are
/// rejected if ever handed in with rdata needing compression) are skipped
/// and ANCOUNT decremented rather than failing the whole packet.
pub fn build_response(query: &DnsQuery, answers: &[DnsRecord], rcode: u8) -> Vec<u8> {
    let mut buf = Vec::with_capacity(512);
    let mut offsets: HashMap<String, u16> = HashMap::new();

    let header = DnsHeader {
        id: query.header.id,
        qr: true,
        opcode: query.header.opcode,
        aa: false,
        tc: false,
        rd: query.header.rd,
        ra: true,
        z: 0,
        rcode,
        qdcount: query.header.qdcount,
        ancount: 0, // patched below
        nscount: 0,
        arcount: 0,
    };
    header.write(&mut buf);
    buf.extend_from_slice(&query.raw_question_bytes);

    // Seed the offset map with the question name we just copied, so answers
    // pointing back at it can compress against it. Only the first question
    // is seeded: the forwarder only ever builds responses for the
    // single-question queries it accepted at ingress.
    if let Some(q) = query.questions.first() {
        seed_name_offsets(&q.name, 12, &mut offsets);
    }

    // Every name is written straight into `buf` (never a scratch buffer) so
    // that offsets recorded in `offsets` are always absolute message
    // positions — compressing a name inside RDATA against one written
    // earlier only works if both live in the same coordinate space.
    let mut written = 0u16;
    for record in answers {
        let record_start = buf.len();
        if write_name(&record.name, &mut buf, &mut offsets).is_err() {
            buf.truncate(record_start);
            continue;
        }
        buf.extend_from_slice(&record.rtype.to_u16().to_be_bytes());
        buf.extend_from_slice(&record.class.to_u16().to_be_bytes());
        buf.extend_from_slice(&record.ttl.to_be_bytes());
        let rdlen_at = buf.len();
        buf.extend_from_slice(&0u16.to_be_bytes()); // placeholder, patched below
        let rdata_start = buf.len();
        if encode_rdata(&record.rdata, &mut buf, &mut offsets).is_err() {
            buf.truncate(record_start);
            continue;
        }
        let rdlen = (buf.len() - rdata_start) as u16;
        buf[rdlen_at..rdlen_at + 2].copy_from_slice(&rdlen.to_be_bytes());
        written += 1;
    }

    buf[6..8].copy_from_slice(&written.to_be_bytes());
    buf
}

pub fn build_error_response(query: &DnsQuery, rcode: u8) -> Vec<u8> {
    build_response(query, &[], rcode)
}

fn seed_name_offsets(name: &str, start: u16, offsets: &mut HashMap<String, u16>) {
    let trimmed = name.trim_end_matches('.');
    if trimmed.is_empty() {
        return;
    }
    let labels: Vec<&str> = trimmed.split('.').collect();
    let mut cursor = start as usize;
    for i in 0..labels.len() {
        if cursor > MAX_COMPRESSION_OFFSET {
            break;
        }
        let suffix = labels[i..].join(".").to_lowercase();
        offsets.entry(suffix).or_insert(cursor as u16);
        cursor += labels[i].len() + 1;
    }
}

fn encode_rdata(
    rdata: &RData,
    buf: &mut Vec<u8>,
    offsets: &mut HashMap<String, u16>,
) -> Result<(), DnsParseError> {
    match rdata {
        RData::A(ip) => buf.extend_from_slice(&ip.octets()),
        RData::AAAA(ip) => buf.extend_from_slice(&ip.octets()),
        RData::CNAME(name) | RData::PTR(name) | RData::NS(name) => {
            write_name(name, buf, offsets)?;
        }
        RData::MX {
            preference,
            exchange,
        } => {
            buf.extend_from_slice(&preference.to_be_bytes());
            write_name(exchange, buf, offsets)?;
        }
        RData::TXT(strings) => {
            for s in strings {
                if s.is_empty() {
                    buf.push(0);
                    continue;
                }
                for chunk in s.chunks(255) {
                    buf.push(chunk.len() as u8);
                    buf.extend_from_slice(chunk);
                }
            }
        }
        RData::SOA {
            mname,
            rname,
            serial,
            refresh,
            retry,
            expire,
            minimum,
        } => {
            write_name(mname, buf, offsets)?;
            write_name(rname, buf, offsets)?;
            buf.extend_from_slice(&serial.to_be_bytes());
            buf.extend_from_slice(&refresh.to_be_bytes());
            buf.extend_from_slice(&retry.to_be_bytes());
            buf.extend_from_slice(&expire.to_be_bytes());
            buf.extend_from_slice(&minimum.to_be_bytes());
        }
        RData::SRV {
            priority,
            weight,
            port,
            target,
        } => {
            buf.extend_from_slice(&priority.to_be_bytes());
            buf.extend_from_slice(&weight.to_be_bytes());
            buf.extend_from_slice(&port.to_be_bytes());
            write_name(target, buf, offsets)?;
        }
        RData::Raw(data) => buf.extend_from_slice(data),
    }
    Ok(())
}

/// Truncate a response to fit a UDP datagram, setting TC and zeroing counts
/// for the sections we can no longer vouch for.
pub fn truncate_for_udp(response: &mut Vec<u8>, max_size: usize) {
    if response.len() <= max_size {
        return;
    }
    if response.len() >= 3 {
        response[2] |= 0x02;
    }
    response.truncate(max_size);
    if response.len() >= 12 {
        response[6] = 0;
        response[7] = 0;
        response[8] = 0;
        response[9] = 0;
        response[10] = 0;
        response[11] = 0;
    }
}

pub const RCODE_NOERROR: u8 = 0;
pub const RCODE_FORMERR: u8 = 1;
pub const RCODE_SERVFAIL: u8 = 2;
pub const RCODE_NXDOMAIN: u8 = 3;
pub const RCODE_NOTIMP: u8 = 4;
pub const RCODE_REFUSED: u8 = 5;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_uncompressed_name() {
        let buf = b"\x03www\x06google\x03com\x00";
        let (name, end) = parse_name(buf, 0).unwrap();
        assert_eq!(name, "www.google.com");
        assert_eq!(end, 16);
    }

    #[test]
    fn parse_compressed_name_pointer() {
        let mut buf = b"\x03www\x06google\x03com\x00".to_vec();
        buf.push(0xC0);
        buf.push(0x00);
        let (name, end) = parse_name(&buf, 16).unwrap();
        assert_eq!(name, "www.google.com");
        assert_eq!(end, 18);
    }

    #[test]
    fn write_name_compresses_against_suffix() {
        let mut offsets = HashMap::new();
        offsets.insert("google.com".to_string(), 12u16);
        let mut buf = Vec::new();
        write_name("mail.google.com", &mut buf, &mut offsets).unwrap();
        assert_eq!(buf, b"\x04mail\xC0\x0C");
    }

    #[test]
    fn write_name_root_is_single_zero() {
        let mut offsets = HashMap::new();
        let mut buf = Vec::new();
        write_name("", &mut buf, &mut offsets).unwrap();
        assert_eq!(buf, b"\x00");
    }

    #[test]
    fn header_round_trip_flags_word() {
        let header = DnsHeader {
            id: 0x1337,
            qr: true,
            opcode: 0,
            aa: true,
            tc: false,
            rd: true,
            ra: true,
            z: 0,
            rcode: 3,
            qdcount: 1,
            ancount: 2,
            nscount: 0,
            arcount: 0,
        };
        let mut buf = Vec::new();
        header.write(&mut buf);
        let flags = u16::from_be_bytes([buf[2], buf[3]]);
        assert_eq!(flags, 0x8583);
        let parsed = DnsHeader::parse(&buf).unwrap();
        assert_eq!(parsed, header);
    }

    #[test]
    fn bad_pointer_forward_reference_rejected() {
        let mut buf = vec![0u8; 4];
        buf[0] = 0xC0;
        buf[1] = 0x02; // points at itself/forward
        let err = parse_name(&buf, 0).unwrap_err();
        assert!(matches!(err, DnsParseError::BadPointer(_)));
    }

    #[test]
    fn query_and_response_round_trip() {
        let mut query_buf = vec![0x12, 0x34, 0x01, 0x00, 0, 1, 0, 0, 0, 0, 0, 0];
        query_buf.extend_from_slice(b"\x07example\x03com\x00");
        query_buf.extend_from_slice(&[0, 1, 0, 1]);

        let query = parse_query(&query_buf).unwrap();
        assert_eq!(query.header.id, 0x1234);
        assert!(query.header.rd);
        assert_eq!(query.questions[0].name, "example.com");

        let answers = vec![DnsRecord::a(
            "example.com",
            Ipv4Addr::new(93, 184, 216, 34),
            300,
        )];
        let response = build_response(&query, &answers, RCODE_NOERROR);
        let parsed = parse_message(&response).unwrap();
        assert!(parsed.header.qr);
        assert_eq!(parsed.header.rcode, RCODE_NOERROR);
        assert_eq!(parsed.answers.len(), 1);
        assert_eq!(parsed.answers[0].name, "example.com");
        match &parsed.answers[0].rdata {
            RData::A(ip) => assert_eq!(*ip, Ipv4Addr::new(93, 184, 216, 34)),
            other => panic!("expected A record, got {other:?}"),
        }
    }

    #[test]
    fn truncate_sets_tc_and_zeroes_counts() {
        let mut buf = vec![0u8; 600];
        buf[6] = 0;
        buf[7] = 5;
        truncate_for_udp(&mut buf, 512);
        assert_eq!(buf.len(), 512);
        assert_eq!(buf[2] & 0x02, 0x02);
        assert_eq!(buf[7], 0);
    }

    #[test]
    fn non_utf8_label_is_rejected() {
        let mut buf = vec![3u8, 0xFF, 0xFE, 0xFD];
        buf.push(0);
        let err = parse_name(&buf, 0).unwrap_err();
        assert!(matches!(err, DnsParseError::InvalidUtf8(_)));
    }

    #[test]
    fn maximal_255_octet_name_is_accepted() {
        // 4 labels of 63 octets (4 * 64 = 256) would overshoot; use 3 labels
        // of 63 plus one of 60, giving 3*64 + 61 + 1 = 254... build directly
        // to hit exactly 255 wire octets: three 63-octet labels, one
        // 61-octet label, plus the terminator.
        let mut buf = Vec::new();
        for _ in 0..3 {
            buf.push(63u8);
            buf.extend(std::iter::repeat(b'a').take(63));
        }
        buf.push(61u8);
        buf.extend(std::iter::repeat(b'b').take(61));
        buf.push(0);
        assert_eq!(buf.len(), 255);
        let (name, end) = parse_name(&buf, 0).unwrap();
        assert_eq!(end, buf.len());
        assert_eq!(name.split('.').count(), 4);
    }

    #[test]
    fn txt_empty_string_round_trips_to_single_zero_octet() {
        let mut offsets = HashMap::new();
        let mut buf = Vec::new();
        encode_rdata(&RData::TXT(vec![Vec::new()]), &mut buf, &mut offsets).unwrap();
        assert_eq!(buf, vec![0u8]);

        let parsed = parse_rdata(&buf, 0, buf.len(), 16).unwrap();
        match parsed {
            RData::TXT(strings) => assert_eq!(strings, vec![Vec::<u8>::new()]),
            other => panic!("expected TXT, got {other:?}"),
        }
    }

    #[test]
    fn txt_no_strings_encodes_to_zero_bytes() {
        let mut offsets = HashMap::new();
        let mut buf = Vec::new();
        encode_rdata(&RData::TXT(Vec::new()), &mut buf, &mut offsets).unwrap();
        assert!(buf.is_empty());
    }
}
