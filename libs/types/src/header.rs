//! Fixed 32-byte message header.
//!
//! ```text
//! ┌──────┬──────────────────────────────────────────────────┐
//! │ Header (32 bytes, big-endian)  │ TLV payload (variable)  │
//! └──────┴──────────────────────────────────────────────────┘
//! ```
//!
//! Offsets are contractual (see module-level table in the crate docs) and
//! deliberately do not match Rust's natural struct layout, so the header is
//! hand-packed rather than cast via a `#[repr(C)]` struct.

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::io::Cursor;

use crate::constants::{HEADER_LEN, MESSAGE_MAGIC, PROTOCOL_VERSION};
use crate::error::{ProtocolError, ProtocolResult};

/// Bit 0 of `flags`: a CRC32 checksum trailer follows the payload.
pub const FLAG_CHECKSUM: u8 = 0b0000_0001;
/// Bit 1 of `flags`: the reply carries a non-zero status.
pub const FLAG_ERROR: u8 = 0b0000_0010;
const FLAG_RESERVED_MASK: u8 = !(FLAG_CHECKSUM | FLAG_ERROR);

/// Message kind, carried in the `msgType` header field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MsgType {
    Req = 0,
    Rep = 1,
    Cbk = 2,
}

impl MsgType {
    pub fn from_u8(v: u8) -> ProtocolResult<Self> {
        match v {
            0 => Ok(MsgType::Req),
            1 => Ok(MsgType::Rep),
            2 => Ok(MsgType::Cbk),
            other => Err(ProtocolError::UnknownMsgType(other)),
        }
    }
}

/// Delivery contract, carried in the `semantics` header field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Semantics {
    AtLeastOnce = 0,
    AtMostOnce = 1,
}

impl Semantics {
    pub fn from_u8(v: u8) -> ProtocolResult<Self> {
        match v {
            0 => Ok(Semantics::AtLeastOnce),
            1 => Ok(Semantics::AtMostOnce),
            other => Err(ProtocolError::UnknownStatus(other as u16)),
        }
    }
}

/// The fixed 32-byte message header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageHeader {
    pub msg_type: MsgType,
    pub op_code: u16,
    pub semantics: Semantics,
    pub flags: u8,
    pub status: u16,
    pub request_id: u64,
    pub client_id: u32,
    pub seq_no: u32,
    pub payload_len: u32,
}

impl MessageHeader {
    pub const SIZE: usize = HEADER_LEN as usize;

    /// Build a header for a freshly constructed request.
    ///
    /// `request_id` is derived from `client_id`/`seq_no` per the protocol
    /// invariant; callers do not set it independently.
    pub fn new_request(client_id: u32, seq_no: u32, op_code: u16, semantics: Semantics) -> Self {
        Self {
            msg_type: MsgType::Req,
            op_code,
            semantics,
            flags: 0,
            status: 0,
            request_id: request_id_of(client_id, seq_no),
            client_id,
            seq_no,
            payload_len: 0,
        }
    }

    /// Build a reply header that copies routing fields from `req`.
    pub fn new_reply(req: &MessageHeader, status: u16) -> Self {
        Self {
            msg_type: MsgType::Rep,
            op_code: req.op_code,
            semantics: req.semantics,
            flags: if status != 0 { FLAG_ERROR } else { 0 },
            status,
            request_id: req.request_id,
            client_id: req.client_id,
            seq_no: req.seq_no,
            payload_len: 0,
        }
    }

    /// Build a server-initiated callback header.
    pub fn new_callback(op_code: u16, client_id: u32, seq_no: u32) -> Self {
        Self {
            msg_type: MsgType::Cbk,
            op_code,
            semantics: Semantics::AtLeastOnce,
            flags: 0,
            status: 0,
            request_id: request_id_of(client_id, seq_no),
            client_id,
            seq_no,
            payload_len: 0,
        }
    }

    pub fn has_checksum(&self) -> bool {
        self.flags & FLAG_CHECKSUM != 0
    }

    pub fn has_error(&self) -> bool {
        self.flags & FLAG_ERROR != 0
    }

    pub fn set_checksum_flag(&mut self, present: bool) {
        if present {
            self.flags |= FLAG_CHECKSUM;
        } else {
            self.flags &= !FLAG_CHECKSUM;
        }
    }

    /// Serialize the header to exactly `MessageHeader::SIZE` big-endian bytes.
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut buf = [0u8; Self::SIZE];
        {
            let mut cursor = Cursor::new(&mut buf[..]);
            cursor.write_u16::<BigEndian>(MESSAGE_MAGIC).unwrap();
            cursor.write_u8(PROTOCOL_VERSION).unwrap();
            cursor.write_u8(self.msg_type as u8).unwrap();
            cursor.write_u16::<BigEndian>(HEADER_LEN).unwrap();
            cursor.write_u16::<BigEndian>(self.op_code).unwrap();
            cursor.write_u8(self.semantics as u8).unwrap();
            cursor.write_u8(self.flags).unwrap();
            cursor.write_u16::<BigEndian>(self.status).unwrap();
            cursor.write_u64::<BigEndian>(self.request_id).unwrap();
            cursor.write_u32::<BigEndian>(self.client_id).unwrap();
            cursor.write_u32::<BigEndian>(self.seq_no).unwrap();
            cursor.write_u32::<BigEndian>(self.payload_len).unwrap();
        }
        buf
    }

    /// Parse and validate a header from the first `MessageHeader::SIZE` bytes
    /// of `data`. Does not look at anything beyond the header.
    pub fn from_bytes(data: &[u8]) -> ProtocolResult<Self> {
        if data.len() < Self::SIZE {
            return Err(ProtocolError::MessageTooSmall {
                need: Self::SIZE,
                got: data.len(),
                context: "header",
            });
        }

        let mut cursor = Cursor::new(&data[..Self::SIZE]);
        let magic = cursor.read_u16::<BigEndian>().unwrap();
        if magic != MESSAGE_MAGIC {
            return Err(ProtocolError::InvalidMagic {
                expected: MESSAGE_MAGIC,
                actual: magic,
            });
        }

        let version = cursor.read_u8().unwrap();
        if version != PROTOCOL_VERSION {
            return Err(ProtocolError::InvalidVersion {
                expected: PROTOCOL_VERSION,
                actual: version,
            });
        }

        let msg_type_raw = cursor.read_u8().unwrap();
        let msg_type = MsgType::from_u8(msg_type_raw)?;

        let header_len = cursor.read_u16::<BigEndian>().unwrap();
        if header_len != HEADER_LEN {
            return Err(ProtocolError::InvalidHeaderLen {
                expected: HEADER_LEN,
                actual: header_len,
            });
        }

        let op_code = cursor.read_u16::<BigEndian>().unwrap();

        let semantics_raw = cursor.read_u8().unwrap();
        let semantics = Semantics::from_u8(semantics_raw)?;

        let flags = cursor.read_u8().unwrap();
        if flags & FLAG_RESERVED_MASK != 0 {
            return Err(ProtocolError::ReservedFlagsSet(flags & FLAG_RESERVED_MASK));
        }

        let status = cursor.read_u16::<BigEndian>().unwrap();
        if matches!(msg_type, MsgType::Req | MsgType::Cbk) && status != 0 {
            let which = if matches!(msg_type, MsgType::Req) {
                "REQ"
            } else {
                "CBK"
            };
            return Err(ProtocolError::StatusMustBeZero(status, which));
        }
        if (flags & FLAG_ERROR != 0) != (status != 0) {
            return Err(ProtocolError::StatusMustBeZero(status, "error-flag law"));
        }

        let request_id = cursor.read_u64::<BigEndian>().unwrap();
        let client_id = cursor.read_u32::<BigEndian>().unwrap();
        let seq_no = cursor.read_u32::<BigEndian>().unwrap();
        let payload_len = cursor.read_u32::<BigEndian>().unwrap();

        Ok(Self {
            msg_type,
            op_code,
            semantics,
            flags,
            status,
            request_id,
            client_id,
            seq_no,
            payload_len,
        })
    }
}

/// requestId = (clientId << 32) | (seqNo & 0xFFFFFFFF).
pub fn request_id_of(client_id: u32, seq_no: u32) -> u64 {
    ((client_id as u64) << 32) | (seq_no as u64)
}

/// Split a requestId back into (clientId, seqNo).
pub fn split_request_id(request_id: u64) -> (u32, u32) {
    ((request_id >> 32) as u32, (request_id & 0xFFFF_FFFF) as u32)
}
