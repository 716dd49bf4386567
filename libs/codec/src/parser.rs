//! Message decoding with full framing and checksum validation.

use types::header::FLAG_CHECKSUM;
use types::{Message, MessageHeader, OpCode, ProtocolError, ProtocolResult, Status, TlvMap};

use crate::checksum::calculate_crc32;

/// Decode and fully validate a wire message.
///
/// Validates, in order: minimum length, header fields (magic/version/
/// headerLen/msgType/semantics/reserved flags/error-flag law, all inside
/// `MessageHeader::from_bytes`), that `opCode` and `status` are recognised,
/// that `payloadLen` does not exceed the remaining buffer, that the TLV scan
/// consumes the payload exactly, and — if the checksum flag is set — that
/// the trailing 4 bytes match the CRC32 of (header ∥ payload).
pub fn decode(data: &[u8]) -> ProtocolResult<Message> {
    let header = MessageHeader::from_bytes(data)?;
    OpCode::from_u16(header.op_code)?;
    Status::from_u16(header.status)?;

    let after_header = &data[MessageHeader::SIZE..];
    let trailer_len = if header.has_checksum() { 4 } else { 0 };

    if after_header.len() < trailer_len {
        return Err(ProtocolError::MessageTooSmall {
            need: MessageHeader::SIZE + trailer_len,
            got: data.len(),
            context: "checksum trailer",
        });
    }
    let payload_region_len = after_header.len() - trailer_len;

    let declared = header.payload_len as usize;
    if declared > payload_region_len {
        return Err(ProtocolError::PayloadLenExceedsBuffer {
            declared,
            remaining: payload_region_len,
        });
    }
    if declared != payload_region_len {
        // The payload must exhaust exactly what's left before the trailer.
        return Err(ProtocolError::TlvScanMismatch {
            consumed: declared,
            declared: payload_region_len,
        });
    }

    let payload_bytes = &after_header[..declared];

    if header.has_checksum() {
        let trailer = &after_header[declared..declared + 4];
        let expected = u32::from_be_bytes([trailer[0], trailer[1], trailer[2], trailer[3]]);
        let header_and_payload = &data[..MessageHeader::SIZE + declared];
        let calculated = calculate_crc32(header_and_payload);
        if expected != calculated {
            return Err(ProtocolError::ChecksumMismatch {
                expected,
                calculated,
            });
        }
    }

    let payload = TlvMap::decode(payload_bytes)?;

    Ok(Message::new(header, payload))
}

/// Peek the checksum flag without fully decoding — used by callers that
/// only need `has_checksum` ahead of a `decode`. Exposed for symmetry with
/// `types::header::FLAG_CHECKSUM`.
pub fn has_checksum_flag(flags: u8) -> bool {
    flags & FLAG_CHECKSUM != 0
}
