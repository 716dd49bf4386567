//! Message encoding: header + TLV payload + optional CRC32 trailer.

use types::{Message, MessageHeader};

use crate::checksum::calculate_crc32;

/// Encode `message` to wire bytes.
///
/// `payloadLen` and the error flag are always recomputed from `message`'s
/// current state before encoding, so callers never have to keep them in
/// sync by hand. If `message.header.has_checksum()` is set, a CRC32 of
/// (header ∥ payload) is appended as a 4-byte big-endian trailer; the
/// header's `payloadLen` reflects the payload only, never the trailer.
pub fn encode(message: &Message) -> Vec<u8> {
    let payload_bytes = message.payload.encode();

    let mut header = message.header;
    header.payload_len = payload_bytes.len() as u32;
    header.set_checksum_flag(message.header.has_checksum());
    // Error-flag law: hasError(flags) <=> status != 0.
    if header.status != 0 {
        header.flags |= types::header::FLAG_ERROR;
    } else {
        header.flags &= !types::header::FLAG_ERROR;
    }

    let mut out = Vec::with_capacity(MessageHeader::SIZE + payload_bytes.len() + 4);
    out.extend_from_slice(&header.to_bytes());
    out.extend_from_slice(&payload_bytes);

    if header.has_checksum() {
        let crc = calculate_crc32(&out);
        out.extend_from_slice(&crc.to_be_bytes());
    }

    out
}
