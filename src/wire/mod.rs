//! DNS wire-format decoding.
//!
//! Implements the read side of RFC 1035 (header, questions, resource
//! records, name compression) plus the EDNS(0) OPT pseudo-record from
//! RFC 6891. Only decoding is provided; Horizon never constructs
//! wire-format messages itself, it forwards client queries verbatim.
//!
//! Every decoder in this module is total over arbitrary input: malformed
//! bytes produce a [`DecodeError`], never a panic or an unbounded loop.

pub mod cursor;
pub mod message;
pub mod name;
pub mod rdata;

pub use cursor::Cursor;
pub use message::{Header, Message, Question, ResourceRecord};
pub use rdata::{EdnsOption, OptData, RData, SoaData};

/// DNS response codes understood by Horizon.
pub mod rcode {
    pub const NOERROR: u16 = 0;
    pub const FORMERR: u16 = 1;
    pub const SERVFAIL: u16 = 2;
    pub const NXDOMAIN: u16 = 3;
    pub const NOTIMP: u16 = 4;
    pub const REFUSED: u16 = 5;
    /// EDNS(0) extended code: unsupported EDNS version.
    pub const BADVERS: u16 = 16;
}

/// Resource record TYPE values for the record kinds Horizon decodes.
pub mod rtype {
    pub const A: u16 = 1;
    pub const NS: u16 = 2;
    pub const CNAME: u16 = 5;
    pub const SOA: u16 = 6;
    pub const MX: u16 = 15;
    pub const TXT: u16 = 16;
    pub const OPT: u16 = 41;
}

/// Resource record CLASS values.
pub mod rclass {
    pub const IN: u16 = 1;
}

/// Failure while decoding a DNS message.
///
/// All variants are local to the message being decoded; the caller's own
/// state is unaffected and the same decoder may be reused afterwards.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// A read or an RDLENGTH would run past the end of the buffer.
    #[error("message truncated")]
    TruncatedMessage,

    /// A compression pointer chain revisited an offset.
    #[error("compression pointer loop")]
    PointerLoop,

    /// A name's uncompressed form exceeded the 255-octet limit.
    #[error("domain name too long")]
    NameTooLong,

    /// An OPT record carried an EDNS version other than 0.
    #[error("unsupported EDNS version {0}")]
    UnsupportedEdnsVersion(u8),

    /// A fixed-size RDATA section had the wrong RDLENGTH.
    #[error("rdata length {found} invalid for record type {rtype} (expected {expected})")]
    InvalidRdataLength { rtype: u16, expected: u16, found: u16 },
}

impl DecodeError {
    /// The DNS response code a server should answer with for this failure.
    pub fn response_code(&self) -> u16 {
        match self {
            DecodeError::TruncatedMessage
            | DecodeError::PointerLoop
            | DecodeError::NameTooLong
            | DecodeError::InvalidRdataLength { .. } => rcode::FORMERR,
            DecodeError::UnsupportedEdnsVersion(_) => rcode::BADVERS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_errors_map_to_response_codes() {
        assert_eq!(DecodeError::TruncatedMessage.response_code(), rcode::FORMERR);
        assert_eq!(DecodeError::PointerLoop.response_code(), rcode::FORMERR);
        assert_eq!(DecodeError::NameTooLong.response_code(), rcode::FORMERR);
        assert_eq!(
            DecodeError::InvalidRdataLength {
                rtype: rtype::A,
                expected: 4,
                found: 5
            }
            .response_code(),
            rcode::FORMERR
        );
        assert_eq!(
            DecodeError::UnsupportedEdnsVersion(1).response_code(),
            rcode::BADVERS
        );
    }
}
