//! Typed RDATA decoding.
//!
//! The shape of a resource record's RDATA is determined by its TYPE.
//! Names inside RDATA (NS, CNAME, SOA, MX) may contain compression
//! pointers, which are message-relative per RFC 1035 — so all RDATA
//! decoding runs over a cursor into the *full message* buffer, never an
//! isolated RDATA slice.

use std::net::Ipv4Addr;

use super::{Cursor, DecodeError, name::decode_name, rtype};

/// Decoded RDATA payload, tagged by record type.
///
/// Record types outside the supported set fall back to [`RData::Raw`]
/// with the untouched RDATA bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RData {
    A(Ipv4Addr),
    Ns(String),
    Cname(String),
    Soa(SoaData),
    Mx { preference: u16, exchange: String },
    Txt(Vec<String>),
    Opt(OptData),
    Raw(Vec<u8>),
}

/// SOA record fields (RFC 1035, section 3.3.13).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoaData {
    pub mname: String,
    pub rname: String,
    pub serial: u32,
    pub refresh: u32,
    pub retry: u32,
    pub expire: u32,
    pub minimum: u32,
}

/// EDNS(0) fields carried by an OPT pseudo-record (RFC 6891).
///
/// OPT reinterprets the fixed record fields: CLASS holds the requestor's
/// UDP payload size and TTL holds extended-RCODE, version and flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptData {
    pub udp_payload_size: u16,
    pub extended_rcode: u8,
    pub version: u8,
    pub dnssec_ok: bool,
    pub options: Vec<EdnsOption>,
}

/// A single {code, data} pair from an OPT record's RDATA.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdnsOption {
    pub code: u16,
    pub data: Vec<u8>,
}

/// Decode the RDATA section of one resource record.
///
/// `cursor` must sit at the start of the RDATA within the full message,
/// with at least `rdlength` bytes remaining (the record parser validates
/// that before dispatching here). `class` and `ttl` are needed because
/// OPT records smuggle payload size and EDNS fields through them.
pub fn decode_rdata(
    cursor: &mut Cursor<'_>,
    record_type: u16,
    class: u16,
    ttl: u32,
    rdlength: u16,
) -> Result<RData, DecodeError> {
    let rdata_end = cursor.position() + rdlength as usize;

    match record_type {
        rtype::A => {
            if rdlength != 4 {
                return Err(DecodeError::InvalidRdataLength {
                    rtype: rtype::A,
                    expected: 4,
                    found: rdlength,
                });
            }
            let octets = cursor.take(4)?;
            Ok(RData::A(Ipv4Addr::new(
                octets[0], octets[1], octets[2], octets[3],
            )))
        }
        rtype::NS => Ok(RData::Ns(decode_name(cursor)?)),
        rtype::CNAME => Ok(RData::Cname(decode_name(cursor)?)),
        rtype::SOA => {
            let mname = decode_name(cursor)?;
            let rname = decode_name(cursor)?;
            Ok(RData::Soa(SoaData {
                mname,
                rname,
                serial: cursor.read_u32()?,
                refresh: cursor.read_u32()?,
                retry: cursor.read_u32()?,
                expire: cursor.read_u32()?,
                minimum: cursor.read_u32()?,
            }))
        }
        rtype::MX => {
            let preference = cursor.read_u16()?;
            let exchange = decode_name(cursor)?;
            Ok(RData::Mx {
                preference,
                exchange,
            })
        }
        rtype::TXT => {
            let mut strings = Vec::new();
            while cursor.position() < rdata_end {
                strings.push(decode_character_string(cursor, rdata_end)?);
            }
            Ok(RData::Txt(strings))
        }
        rtype::OPT => {
            let extended_rcode = (ttl >> 24) as u8;
            let version = (ttl >> 16) as u8;
            if version != 0 {
                return Err(DecodeError::UnsupportedEdnsVersion(version));
            }
            let dnssec_ok = ttl & 0x8000 != 0;

            let mut options = Vec::new();
            while cursor.position() < rdata_end {
                // Option header and data must fit inside RDLENGTH, not
                // just inside the message.
                if cursor.position() + 4 > rdata_end {
                    return Err(DecodeError::TruncatedMessage);
                }
                let code = cursor.read_u16()?;
                let len = cursor.read_u16()? as usize;
                if cursor.position() + len > rdata_end {
                    return Err(DecodeError::TruncatedMessage);
                }
                options.push(EdnsOption {
                    code,
                    data: cursor.take(len)?.to_vec(),
                });
            }

            Ok(RData::Opt(OptData {
                udp_payload_size: class,
                extended_rcode,
                version,
                dnssec_ok,
                options,
            }))
        }
        _ => Ok(RData::Raw(cursor.take(rdlength as usize)?.to_vec())),
    }
}

/// One length-prefixed character-string (RFC 1035, section 3.3), bounded
/// by the enclosing RDATA region rather than the message end.
fn decode_character_string(cursor: &mut Cursor<'_>, limit: usize) -> Result<String, DecodeError> {
    let len = cursor.read_u8()? as usize;
    if cursor.position() + len > limit {
        return Err(DecodeError::TruncatedMessage);
    }
    let raw = cursor.take(len)?;
    Ok(raw.iter().map(|&b| b as char).collect())
}
