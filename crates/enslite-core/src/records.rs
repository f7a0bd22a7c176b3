//! DNS record model and wire codec
//!
//! Resolvers hand back record sets in uncompressed RFC 1035 wire format.
//! Only address records are interpreted; any other type is kept as raw
//! RDATA so it can still be listed.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::time::Duration;

/// DNS class IN
const CLASS_IN: u16 = 1;

/// DNS record type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordType {
    /// A record (IPv4)
    A,
    /// AAAA record (IPv6)
    Aaaa,
    /// Any other type, by number
    Other(u16),
}

impl RecordType {
    pub fn code(&self) -> u16 {
        match self {
            RecordType::A => 1,
            RecordType::Aaaa => 28,
            RecordType::Other(code) => *code,
        }
    }

    pub fn from_code(code: u16) -> Self {
        match code {
            1 => RecordType::A,
            28 => RecordType::Aaaa,
            other => RecordType::Other(other),
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordType::A => write!(f, "A"),
            RecordType::Aaaa => write!(f, "AAAA"),
            RecordType::Other(code) => write!(f, "TYPE{}", code),
        }
    }
}

/// Record payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordData {
    A(Ipv4Addr),
    Aaaa(Ipv6Addr),
    Raw(Vec<u8>),
}

/// A single resource record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsRecord {
    /// Owner name, without the trailing root dot
    pub name: String,
    /// Record type
    pub rtype: RecordType,
    /// Time-to-live in seconds
    pub ttl: u32,
    /// Payload
    pub data: RecordData,
}

impl DnsRecord {
    /// Create an A record
    pub fn a(name: impl Into<String>, ttl: u32, addr: Ipv4Addr) -> Self {
        Self {
            name: name.into(),
            rtype: RecordType::A,
            ttl,
            data: RecordData::A(addr),
        }
    }

    /// Create an AAAA record
    pub fn aaaa(name: impl Into<String>, ttl: u32, addr: Ipv6Addr) -> Self {
        Self {
            name: name.into(),
            rtype: RecordType::Aaaa,
            ttl,
            data: RecordData::Aaaa(addr),
        }
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_secs(u64::from(self.ttl))
    }
}

/// Zone-file style rendering: `alice.eth.\t300\tIN\tA\t1.2.3.4`
impl fmt::Display for DnsRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.\t{}\tIN\t{}\t", self.name, self.ttl, self.rtype)?;
        match &self.data {
            RecordData::A(addr) => write!(f, "{}", addr),
            RecordData::Aaaa(addr) => write!(f, "{}", addr),
            RecordData::Raw(bytes) => write!(f, "\\# {} {}", bytes.len(), hex::encode(bytes)),
        }
    }
}

/// First A record's address, if any
pub fn primary_ipv4(records: &[DnsRecord]) -> Option<Ipv4Addr> {
    records.iter().find_map(|record| match record.data {
        RecordData::A(addr) => Some(addr),
        _ => None,
    })
}

/// Encode a dotted name in DNS wire format (`\x05alice\x03eth\x00`)
pub fn encode_name(name: &str) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(name.len() + 2);
    for label in name.split('.').filter(|label| !label.is_empty()) {
        if label.len() > 63 {
            return Err(Error::malformed(format!("label too long: '{}'", label)));
        }
        out.push(label.len() as u8);
        out.extend_from_slice(label.as_bytes());
    }
    out.push(0);
    Ok(out)
}

/// Encode a record set in uncompressed wire format
pub fn encode_records(records: &[DnsRecord]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    for record in records {
        let rdata = match &record.data {
            RecordData::A(addr) => addr.octets().to_vec(),
            RecordData::Aaaa(addr) => addr.octets().to_vec(),
            RecordData::Raw(bytes) => bytes.clone(),
        };
        let rdlength = u16::try_from(rdata.len())
            .map_err(|_| Error::malformed("record data exceeds 65535 bytes"))?;

        out.extend_from_slice(&encode_name(&record.name)?);
        out.extend_from_slice(&record.rtype.code().to_be_bytes());
        out.extend_from_slice(&CLASS_IN.to_be_bytes());
        out.extend_from_slice(&record.ttl.to_be_bytes());
        out.extend_from_slice(&rdlength.to_be_bytes());
        out.extend_from_slice(&rdata);
    }
    Ok(out)
}

/// Decode a concatenated, uncompressed record set
///
/// An empty input decodes to an empty set.
pub fn decode_records(bytes: &[u8]) -> Result<Vec<DnsRecord>> {
    let mut reader = WireReader { bytes, pos: 0 };
    let mut records = Vec::new();

    while !reader.is_empty() {
        let name = reader.name()?;
        let rtype = RecordType::from_code(reader.u16()?);
        let _class = reader.u16()?;
        let ttl = reader.u32()?;
        let rdlength = reader.u16()? as usize;
        let rdata = reader.take(rdlength)?;

        let data = match rtype {
            RecordType::A => {
                let octets: [u8; 4] = rdata
                    .try_into()
                    .map_err(|_| Error::decode(format!("A record with {} bytes", rdata.len())))?;
                RecordData::A(Ipv4Addr::from(octets))
            }
            RecordType::Aaaa => {
                let octets: [u8; 16] = rdata.try_into().map_err(|_| {
                    Error::decode(format!("AAAA record with {} bytes", rdata.len()))
                })?;
                RecordData::Aaaa(Ipv6Addr::from(octets))
            }
            RecordType::Other(_) => RecordData::Raw(rdata.to_vec()),
        };

        records.push(DnsRecord {
            name,
            rtype,
            ttl,
            data,
        });
    }

    Ok(records)
}

struct WireReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> WireReader<'a> {
    fn is_empty(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.bytes.len())
            .ok_or_else(|| Error::decode(format!("truncated record at offset {}", self.pos)))?;
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn u16(&mut self) -> Result<u16> {
        let b = self.take(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    fn u32(&mut self) -> Result<u32> {
        let b = self.take(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn name(&mut self) -> Result<String> {
        let mut labels = Vec::new();
        loop {
            let len = self.take(1)?[0];
            if len == 0 {
                break;
            }
            if len & 0xC0 != 0 {
                return Err(Error::decode("compressed names are not supported"));
            }
            let label = self.take(len as usize)?;
            labels.push(String::from_utf8_lossy(label).into_owned());
        }
        Ok(labels.join("."))
    }
}
