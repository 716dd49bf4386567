//! Reply status codes.

use crate::error::{ProtocolError, ProtocolResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum Status {
    Ok = 0,
    BadRequest = 1,
    AuthFail = 2,
    NotFound = 3,
    InsufficientFunds = 4,
    CurrencyMismatch = 5,
    AlreadyExists = 6,
    InternalError = 7,
}

impl Status {
    pub fn from_u16(v: u16) -> ProtocolResult<Self> {
        match v {
            0 => Ok(Status::Ok),
            1 => Ok(Status::BadRequest),
            2 => Ok(Status::AuthFail),
            3 => Ok(Status::NotFound),
            4 => Ok(Status::InsufficientFunds),
            5 => Ok(Status::CurrencyMismatch),
            6 => Ok(Status::AlreadyExists),
            7 => Ok(Status::InternalError),
            other => Err(ProtocolError::UnknownStatus(other)),
        }
    }

    pub fn is_ok(self) -> bool {
        matches!(self, Status::Ok)
    }
}
