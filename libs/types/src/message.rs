//! The in-memory `Message` value: a header plus its decoded TLV payload.
//!
//! Pure data — encoding rules (checksum placement, required-field
//! validation) live in the `codec` crate, matching the split documented in
//! `codec`'s crate docs: `types` is pure structures, `codec` is the rules
//! layer on top of them.

use crate::header::MessageHeader;
use crate::tlv::TlvMap;

#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub header: MessageHeader,
    pub payload: TlvMap,
}

impl Message {
    pub fn new(header: MessageHeader, payload: TlvMap) -> Self {
        Self { header, payload }
    }
}
