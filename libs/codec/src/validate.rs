//! Required-TLV validation per opCode.

use types::{OpCode, ProtocolError, ProtocolResult, TlvMap};

/// Fail with `MissingRequiredTlv` if any TLV required by `op_code` is absent
/// from `payload`.
pub fn validate_required(op_code: OpCode, payload: &TlvMap) -> ProtocolResult<()> {
    for &required in op_code.required_tlvs() {
        if !payload.contains(required) {
            return Err(ProtocolError::MissingRequiredTlv(
                required.name(),
                op_code as u16,
            ));
        }
    }
    Ok(())
}
