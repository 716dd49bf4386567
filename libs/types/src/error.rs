//! Protocol-level errors for message framing and TLV processing.
//!
//! Mirrors the diagnostic style used throughout the wire layer: each variant
//! carries enough context to explain *why* a message was rejected, not just
//! that it was.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("message too small: need at least {need} bytes, got {got} ({context})")]
    MessageTooSmall {
        need: usize,
        got: usize,
        context: &'static str,
    },

    #[error("invalid magic: expected {expected:#06x}, got {actual:#06x}")]
    InvalidMagic { expected: u16, actual: u16 },

    #[error("invalid version: expected {expected}, got {actual}")]
    InvalidVersion { expected: u8, actual: u8 },

    #[error("invalid headerLen: expected {expected}, got {actual}")]
    InvalidHeaderLen { expected: u16, actual: u16 },

    #[error("unknown msgType {0}")]
    UnknownMsgType(u8),

    #[error("unknown opCode {0:#06x}")]
    UnknownOpCode(u16),

    #[error("unknown status {0}")]
    UnknownStatus(u16),

    #[error("reserved flag bits set: {0:#04x}")]
    ReservedFlagsSet(u8),

    #[error("non-zero status {0} on a {1} message")]
    StatusMustBeZero(u16, &'static str),

    #[error(
        "payloadLen {declared} exceeds remaining buffer ({remaining} bytes after header/trailer)"
    )]
    PayloadLenExceedsBuffer { declared: usize, remaining: usize },

    #[error("TLV scan did not consume payload exactly: consumed {consumed}, declared {declared}")]
    TlvScanMismatch { consumed: usize, declared: usize },

    #[error("truncated TLV: need {need} more bytes at offset {offset}, only {have} remain")]
    TruncatedTlv {
        need: usize,
        have: usize,
        offset: usize,
    },

    #[error("TLV type {tlv_type:#06x} has fixed width {expected}, got length {got}")]
    TlvLengthMismatch {
        tlv_type: u16,
        expected: usize,
        got: usize,
    },

    #[error("checksum mismatch: header declared {expected:#010x}, calculated {calculated:#010x}")]
    ChecksumMismatch { expected: u32, calculated: u32 },

    #[error("message missing required TLV {0:?} for opCode {1:#06x}")]
    MissingRequiredTlv(&'static str, u16),

    #[error("TLV value for {0:?} is not valid UTF-8")]
    InvalidUtf8(&'static str),

    #[error("unknown currency code {0}")]
    UnknownCurrency(u8),
}

pub type ProtocolResult<T> = std::result::Result<T, ProtocolError>;
