//! Operation codes and their idempotency classification.

use crate::error::{ProtocolError, ProtocolResult};
use crate::tlv::TlvType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum OpCode {
    OpenAccount = 0x0001,
    CloseAccount = 0x0002,
    Deposit = 0x0003,
    Withdraw = 0x0004,
    RegisterCallback = 0x0005,
    UnregisterCallback = 0x0006,
    QueryBalance = 0x0101,
    Transfer = 0x0102,
    AccountUpdate = 0x8001,
}

impl OpCode {
    pub fn from_u16(v: u16) -> ProtocolResult<Self> {
        match v {
            0x0001 => Ok(OpCode::OpenAccount),
            0x0002 => Ok(OpCode::CloseAccount),
            0x0003 => Ok(OpCode::Deposit),
            0x0004 => Ok(OpCode::Withdraw),
            0x0005 => Ok(OpCode::RegisterCallback),
            0x0006 => Ok(OpCode::UnregisterCallback),
            0x0101 => Ok(OpCode::QueryBalance),
            0x0102 => Ok(OpCode::Transfer),
            0x8001 => Ok(OpCode::AccountUpdate),
            other => Err(ProtocolError::UnknownOpCode(other)),
        }
    }

    /// Whether re-executing this operation is safe without deduplication.
    pub fn is_idempotent(self) -> bool {
        matches!(
            self,
            OpCode::RegisterCallback | OpCode::UnregisterCallback | OpCode::QueryBalance
        )
    }

    /// TLV fields a REQ for this opCode must carry.
    pub fn required_tlvs(self) -> &'static [TlvType] {
        use TlvType::*;
        match self {
            OpCode::OpenAccount => &[Username, Password, Currency],
            OpCode::CloseAccount => &[Username, Password, AccountNo],
            OpCode::Deposit => &[Username, Password, AccountNo, AmountCents],
            OpCode::Withdraw => &[Username, Password, AccountNo, AmountCents],
            OpCode::RegisterCallback => &[TtlSeconds],
            OpCode::UnregisterCallback => &[],
            OpCode::QueryBalance => &[Username, Password, AccountNo],
            OpCode::Transfer => &[Username, Password, AccountNo, ToAccountNo, AmountCents],
            OpCode::AccountUpdate => &[AccountNo, AmountCents],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idempotency_classification() {
        assert!(OpCode::QueryBalance.is_idempotent());
        assert!(OpCode::RegisterCallback.is_idempotent());
        assert!(!OpCode::Transfer.is_idempotent());
        assert!(!OpCode::Deposit.is_idempotent());
    }

    #[test]
    fn unknown_opcode_rejected() {
        assert!(matches!(
            OpCode::from_u16(0x9999),
            Err(ProtocolError::UnknownOpCode(0x9999))
        ));
    }
}
