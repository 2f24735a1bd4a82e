//! Full DNS message decoding.
//!
//! A single forward pass over the buffer: 12-byte header, then questions,
//! then the three resource record sections. Parsing is fail-fast — after
//! a corrupt length field the remaining offsets are meaningless, so the
//! first structural error aborts the whole decode.

use super::{Cursor, DecodeError, RData, name::decode_name, rdata::decode_rdata, rtype};

const HEADER_LEN: usize = 12;

/// The 12-byte DNS message header (RFC 1035, section 4.1.1).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub id: u16,
    /// QR bit, inverted: on the wire 0 means query.
    pub is_query: bool,
    pub op_code: u8,
    pub is_authoritative: bool,
    pub is_truncated: bool,
    pub is_recursion_desired: bool,
    pub is_recursion_available: bool,
    /// Reserved, must be zero.
    pub z: u8,
    /// 4 bits on the wire; widened to 12 bits when an OPT record supplies
    /// an extended RCODE.
    pub response_code: u16,
    pub question_count: u16,
    pub answer_count: u16,
    pub authority_count: u16,
    pub additional_count: u16,
}

/// One question section entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub name: String,
    pub record_type: u16,
    pub class: u16,
}

/// One resource record from the answer, authority or additional section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRecord {
    pub name: String,
    pub record_type: u16,
    /// For OPT records this is the requestor's UDP payload size.
    pub class: u16,
    /// For OPT records this packs extended-RCODE, version and flags.
    pub ttl: u32,
    pub rdlength: u16,
    pub rdata: RData,
}

/// A decoded DNS message. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub header: Header,
    pub questions: Vec<Question>,
    pub answers: Vec<ResourceRecord>,
    pub authority: Vec<ResourceRecord>,
    pub additional: Vec<ResourceRecord>,
}

impl Message {
    /// Decode a message from raw wire bytes.
    ///
    /// The returned header carries the *final* response code: if the
    /// additional section holds an OPT record, its extended RCODE is
    /// shifted in above the header's base 4 bits.
    pub fn decode(buf: &[u8]) -> Result<Message, DecodeError> {
        let mut cursor = Cursor::new(buf);

        let mut header = decode_header(&mut cursor)?;

        let mut questions = Vec::with_capacity(header.question_count.min(16) as usize);
        for _ in 0..header.question_count {
            questions.push(decode_question(&mut cursor)?);
        }

        let answers = decode_record_section(&mut cursor, header.answer_count)?;
        let authority = decode_record_section(&mut cursor, header.authority_count)?;
        let additional = decode_record_section(&mut cursor, header.additional_count)?;

        if let Some(RData::Opt(opt)) = additional
            .iter()
            .find(|record| record.record_type == rtype::OPT)
            .map(|record| &record.rdata)
        {
            header.response_code =
                (opt.extended_rcode as u16) << 4 | (header.response_code & 0x0F);
        }

        Ok(Message {
            header,
            questions,
            answers,
            authority,
            additional,
        })
    }
}

fn decode_header(cursor: &mut Cursor<'_>) -> Result<Header, DecodeError> {
    if cursor.remaining() < HEADER_LEN {
        return Err(DecodeError::TruncatedMessage);
    }

    let id = cursor.read_u16()?;
    let flags = cursor.read_u16()?;

    let qr = (flags & 0b1000_0000_0000_0000) >> 15;
    let op_code = (flags & 0b0111_1000_0000_0000) >> 11;
    let aa = (flags & 0b0000_0100_0000_0000) >> 10;
    let tc = (flags & 0b0000_0010_0000_0000) >> 9;
    let rd = (flags & 0b0000_0001_0000_0000) >> 8;
    let ra = (flags & 0b0000_0000_1000_0000) >> 7;
    let z = (flags & 0b0000_0000_0111_0000) >> 4;
    let response_code = flags & 0b0000_0000_0000_1111;

    Ok(Header {
        id,
        is_query: qr == 0,
        op_code: op_code as u8,
        is_authoritative: aa != 0,
        is_truncated: tc != 0,
        is_recursion_desired: rd != 0,
        is_recursion_available: ra != 0,
        z: z as u8,
        response_code,
        question_count: cursor.read_u16()?,
        answer_count: cursor.read_u16()?,
        authority_count: cursor.read_u16()?,
        additional_count: cursor.read_u16()?,
    })
}

fn decode_question(cursor: &mut Cursor<'_>) -> Result<Question, DecodeError> {
    Ok(Question {
        name: decode_name(cursor)?,
        record_type: cursor.read_u16()?,
        class: cursor.read_u16()?,
    })
}

fn decode_record_section(
    cursor: &mut Cursor<'_>,
    count: u16,
) -> Result<Vec<ResourceRecord>, DecodeError> {
    let mut records = Vec::with_capacity(count.min(16) as usize);
    for _ in 0..count {
        records.push(decode_record(cursor)?);
    }
    Ok(records)
}

fn decode_record(cursor: &mut Cursor<'_>) -> Result<ResourceRecord, DecodeError> {
    let name = decode_name(cursor)?;
    let record_type = cursor.read_u16()?;
    let class = cursor.read_u16()?;
    let ttl = cursor.read_u32()?;
    let rdlength = cursor.read_u16()?;

    if cursor.remaining() < rdlength as usize {
        return Err(DecodeError::TruncatedMessage);
    }

    let rdata_end = cursor.position() + rdlength as usize;
    let rdata = decode_rdata(cursor, record_type, class, ttl, rdlength)?;

    // RDATA decoding may legitimately stop short of RDLENGTH (names with
    // compression pointers); the next record starts at the declared end.
    cursor.seek(rdata_end)?;

    Ok(ResourceRecord {
        name,
        record_type,
        class,
        ttl,
        rdlength,
        rdata,
    })
}
