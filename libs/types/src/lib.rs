//! Core wire types for the banking protocol.
//!
//! This crate is the "pure data" layer: the fixed header, TLV field
//! definitions, operation/status enums, and the `Message` value type. It has
//! no knowledge of sockets, checksums-as-policy, or retry behaviour — those
//! live in `codec` and `network` respectively.

pub mod constants;
pub mod error;
pub mod header;
pub mod message;
pub mod opcode;
pub mod status;
pub mod tlv;

pub use constants::*;
pub use error::{ProtocolError, ProtocolResult};
pub use header::{request_id_of, split_request_id, MessageHeader, MsgType, Semantics};
pub use message::Message;
pub use opcode::OpCode;
pub use status::Status;
pub use tlv::{Currency, TlvMap, TlvType, TlvValue};
