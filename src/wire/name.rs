//! Domain name decoding with compression support.
//!
//! Names are stored on the wire as a sequence of length-prefixed labels
//! terminated by a zero octet. Any label position may instead hold a
//! 2-byte compression pointer (top two bits `11`) referring back to an
//! absolute offset in the message, and a pointer ends the current chain.
//!
//! Pointers are attacker-controlled, so every followed offset is recorded
//! in a visited set; revisiting one fails with [`DecodeError::PointerLoop`]
//! instead of looping forever.

use rustc_hash::FxHashSet;

use super::{Cursor, DecodeError};

/// ASCII-Compatible Encoding prefix marking a Punycode label (RFC 5890).
const ACE_PREFIX: &[u8] = b"xn--";

/// Maximum wire length of a name, length octets and terminator included
/// (RFC 1035, section 2.3.4).
const MAX_NAME_LEN: usize = 255;

/// Decode a domain name starting at the cursor's position.
///
/// On success the cursor is left just past the name as it appears in
/// place: past the zero terminator, or past the 2-byte pointer if the
/// name is compressed. Labels are joined with `.` in presentation form;
/// the root name decodes to the empty string.
///
/// The uncompressed form of the name must fit in [`MAX_NAME_LEN`] octets;
/// longer names (including pointer chains that only exist to inflate the
/// name) fail with [`DecodeError::NameTooLong`].
pub fn decode_name(cursor: &mut Cursor<'_>) -> Result<String, DecodeError> {
    let mut labels: Vec<String> = Vec::new();
    let mut visited: FxHashSet<u16> = FxHashSet::default();
    // Wire length of the uncompressed name; starts at 1 for the
    // terminating zero octet.
    let mut name_len: usize = 1;

    // Labels are read through `active`, which detaches from the primary
    // cursor at the first pointer. The primary cursor only ever ends up
    // just past the in-place bytes of the name.
    let mut active = *cursor;
    let mut jumped = false;

    loop {
        let octet = active.read_u8()?;

        if octet & 0xC0 == 0xC0 {
            let low = active.read_u8()?;
            let offset = u16::from_be_bytes([octet & 0x3F, low]);

            if !jumped {
                *cursor = active;
                jumped = true;
            }
            if !visited.insert(offset) {
                return Err(DecodeError::PointerLoop);
            }

            active = active.fork(offset as usize);
            continue;
        }

        if octet == 0 {
            if !jumped {
                *cursor = active;
            }
            break;
        }

        name_len += octet as usize + 1;
        if name_len > MAX_NAME_LEN {
            return Err(DecodeError::NameTooLong);
        }

        let raw = active.take(octet as usize)?;
        labels.push(decode_label(raw));
    }

    Ok(labels.join("."))
}

/// A single label in presentation form: ASCII as-is, ACE-prefixed labels
/// decoded to Unicode. A label that carries the prefix but is not valid
/// Punycode is kept verbatim.
fn decode_label(raw: &[u8]) -> String {
    // Octets outside ASCII map to their Latin-1 code points, so a label
    // never fails to decode; it just looks odd in logs.
    let text: String = raw.iter().map(|&b| b as char).collect();

    if raw.len() >= ACE_PREFIX.len() && raw[..ACE_PREFIX.len()].eq_ignore_ascii_case(ACE_PREFIX) {
        // The prefix is ASCII, so byte offset 4 is a char boundary.
        if let Some(unicode) = punycode_decode(&text[ACE_PREFIX.len()..]) {
            return unicode;
        }
    }

    text
}

/// Punycode decoding per RFC 3492, section 6.2.
///
/// Returns `None` on any malformed input (bad digit, overflow, invalid
/// code point). Implemented in-tree; labels are at most 63 octets so the
/// quadratic insertion cost is irrelevant.
fn punycode_decode(input: &str) -> Option<String> {
    let (mut output, encoded): (Vec<char>, &str) = match input.rfind('-') {
        Some(idx) => (input[..idx].chars().collect(), &input[idx + 1..]),
        None => (Vec::new(), input),
    };

    if output.iter().any(|c| !c.is_ascii()) {
        return None;
    }

    let mut n: u32 = 128;
    let mut i: u32 = 0;
    let mut bias: u32 = 72;
    let mut first = true;

    let mut digits = encoded.bytes().peekable();
    while digits.peek().is_some() {
        let old_i = i;
        let mut weight: u32 = 1;
        let mut k: u32 = 36;

        loop {
            let digit = digit_value(digits.next()?)?;
            i = i.checked_add(digit.checked_mul(weight)?)?;

            let threshold = if k <= bias {
                1
            } else {
                (k - bias).min(26)
            };
            if digit < threshold {
                break;
            }

            weight = weight.checked_mul(36 - threshold)?;
            k += 36;
        }

        let len = output.len() as u32 + 1;
        bias = adapt(i - old_i, len, first);
        first = false;

        n = n.checked_add(i / len)?;
        i %= len;

        output.insert(i as usize, char::from_u32(n)?);
        i += 1;
    }

    Some(output.into_iter().collect())
}

/// Base-36 digit value: `A-Z`/`a-z` map to 0-25, `0-9` to 26-35.
fn digit_value(byte: u8) -> Option<u32> {
    match byte {
        b'A'..=b'Z' => Some((byte - b'A') as u32),
        b'a'..=b'z' => Some((byte - b'a') as u32),
        b'0'..=b'9' => Some((byte - b'0') as u32 + 26),
        _ => None,
    }
}

/// Bias adaptation (RFC 3492, section 6.1).
fn adapt(mut delta: u32, num_points: u32, first: bool) -> u32 {
    delta /= if first { 700 } else { 2 };
    delta += delta / num_points;

    let mut k = 0;
    while delta > 455 {
        delta /= 35;
        k += 36;
    }

    k + (36 * delta) / (38 + delta)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(buf: &[u8]) -> Result<String, DecodeError> {
        let mut cursor = Cursor::new(buf);
        decode_name(&mut cursor)
    }

    #[test]
    fn plain_labels_join_with_dots() {
        let buf = [
            7, b'e', b'x', b'a', b'm', b'p', b'l', b'e', 3, b'c', b'o', b'm', 0,
        ];
        assert_eq!(decode(&buf).unwrap(), "example.com");
    }

    #[test]
    fn root_name_is_empty() {
        assert_eq!(decode(&[0]).unwrap(), "");
    }

    #[test]
    fn cursor_lands_past_terminator() {
        let buf = [3, b'f', b'o', b'o', 0, 0xFF];
        let mut cursor = Cursor::new(&buf);
        decode_name(&mut cursor).unwrap();
        assert_eq!(cursor.position(), 5);
    }

    #[test]
    fn compression_pointer_resolves_suffix() {
        // Offset 0: "example.com", offset 13: "www" + pointer to 0.
        let mut buf = vec![
            7, b'e', b'x', b'a', b'm', b'p', b'l', b'e', 3, b'c', b'o', b'm', 0,
        ];
        buf.extend_from_slice(&[3, b'w', b'w', b'w', 0xC0, 0x00]);

        let mut cursor = Cursor::new(&buf);
        cursor.seek(13).unwrap();
        assert_eq!(decode_name(&mut cursor).unwrap(), "www.example.com");
        // Pointer ends the in-place name: 2 bytes past its start.
        assert_eq!(cursor.position(), 19);
    }

    #[test]
    fn self_pointer_is_a_loop() {
        // Pointer at offset 0 pointing to offset 0.
        assert_eq!(decode(&[0xC0, 0x00]), Err(DecodeError::PointerLoop));
    }

    #[test]
    fn two_step_cycle_is_a_loop() {
        // Offset 0 points to 2, offset 2 points back to 0.
        let buf = [0xC0, 0x02, 0xC0, 0x00];
        assert_eq!(decode(&buf), Err(DecodeError::PointerLoop));
    }

    #[test]
    fn label_running_past_buffer_is_truncated() {
        let buf = [5, b'a', b'b'];
        assert_eq!(decode(&buf), Err(DecodeError::TruncatedMessage));
    }

    #[test]
    fn missing_terminator_is_truncated() {
        let buf = [3, b'f', b'o', b'o'];
        assert_eq!(decode(&buf), Err(DecodeError::TruncatedMessage));
    }

    #[test]
    fn name_over_255_octets_is_rejected() {
        // Five 63-octet labels: 5 * 64 + 1 = 321 octets on the wire.
        let mut buf = Vec::new();
        for _ in 0..5 {
            buf.push(63);
            buf.extend_from_slice(&[b'a'; 63]);
        }
        buf.push(0);
        assert_eq!(decode(&buf), Err(DecodeError::NameTooLong));
    }

    #[test]
    fn name_of_exactly_255_octets_is_accepted() {
        // Three 63-octet labels plus one 61-octet label: 3 * 64 + 62 + 1 = 255.
        let mut buf = Vec::new();
        for _ in 0..3 {
            buf.push(63);
            buf.extend_from_slice(&[b'a'; 63]);
        }
        buf.push(61);
        buf.extend_from_slice(&[b'a'; 61]);
        buf.push(0);
        // 250 label characters joined by 3 dots.
        assert_eq!(decode(&buf).unwrap().len(), 253);
    }

    #[test]
    fn pointer_chain_cannot_inflate_name_past_limit() {
        // Each segment holds a 63-octet label and points at the previous
        // one; the chain never revisits an offset, so only the length
        // bound stops it.
        let mut buf = vec![63];
        buf.extend_from_slice(&[b'a'; 63]);
        buf.push(0);
        let mut start = 0usize;
        for _ in 0..8 {
            let next = buf.len();
            buf.push(63);
            buf.extend_from_slice(&[b'b'; 63]);
            buf.extend_from_slice(&[0xC0 | (start >> 8) as u8, start as u8]);
            start = next;
        }

        let mut cursor = Cursor::new(&buf);
        cursor.seek(start).unwrap();
        assert_eq!(decode_name(&mut cursor), Err(DecodeError::NameTooLong));
    }

    #[test]
    fn ace_labels_decode_to_unicode() {
        let mut buf = vec![13];
        buf.extend_from_slice(b"xn--bcher-kva");
        buf.extend_from_slice(&[2, b'd', b'e', 0]);
        assert_eq!(decode(&buf).unwrap(), "b\u{fc}cher.de");
    }

    #[test]
    fn malformed_ace_label_is_kept_verbatim() {
        // '!' is not a Punycode digit.
        let mut buf = vec![7];
        buf.extend_from_slice(b"xn--a!b");
        buf.push(0);
        assert_eq!(decode(&buf).unwrap(), "xn--a!b");
    }

    #[test]
    fn punycode_rfc_samples() {
        // RFC 3492 section 7.1 (L) plus well-known IDN labels.
        assert_eq!(
            punycode_decode("3B-ww4c5e180e575a65lsy2b").as_deref(),
            Some("3\u{5e74}B\u{7d44}\u{91d1}\u{516b}\u{5148}\u{751f}")
        );
        assert_eq!(punycode_decode("mnchen-3ya").as_deref(), Some("m\u{fc}nchen"));
        assert_eq!(punycode_decode("bcher-kva").as_deref(), Some("b\u{fc}cher"));
    }
}
