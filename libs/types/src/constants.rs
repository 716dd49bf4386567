//! Protocol-level constants for the banking wire protocol.
//!
//! This module contains immutable protocol constants that are part of the
//! wire format specification. These values MUST remain consistent across
//! all implementations for protocol compatibility.

/// Protocol magic number for message headers.
///
/// MUST be the first two bytes of every message header for validation.
pub const MESSAGE_MAGIC: u16 = 0xD5D5;

/// Current protocol version.
pub const PROTOCOL_VERSION: u8 = 1;

/// Fixed header length in bytes. Contractual, appears on the wire.
pub const HEADER_LEN: u16 = 32;

/// Maximum payload size per message (bytes), per the wire protocol contract.
pub const MAX_PAYLOAD_SIZE: usize = 65_000;

/// Default UDP port for the banking service.
pub const DEFAULT_PORT: u16 = 8888;

/// Default AMO cache entry TTL.
pub const DEFAULT_AMO_TTL_SECS: u64 = 300;

/// Default client retry policy: initial timeout.
pub const DEFAULT_INITIAL_TIMEOUT_MS: u64 = 500;

/// Default client retry policy: maximum number of retries after the first attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 5;
