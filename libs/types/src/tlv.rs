//! TLV (type, length, value) field definits for the payload section.
//!
//! A payload is a flat sequence of TLVs; type and length are 16-bit
//! big-endian, matching the header's endianness. Encoding always visits TLVs
//! in ascending type-code order so that two encodes of the same logical
//! field set produce byte-identical output (load-bearing for retry
//! stability: the client builds the buffer once, but tests and the codec
//! round-trip property rely on determinism too).

use std::collections::BTreeMap;
use std::convert::TryFrom;

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::io::Cursor;

use crate::error::{ProtocolError, ProtocolResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u16)]
pub enum TlvType {
    Username = 0x0001,
    Password = 0x0002,
    AccountNo = 0x0003,
    Currency = 0x0004,
    AmountCents = 0x0005,
    ToAccountNo = 0x0006,
    TtlSeconds = 0x0007,
    Note = 0x0008,
}

impl TlvType {
    pub fn code(self) -> u16 {
        self as u16
    }

    pub fn from_code(v: u16) -> Option<Self> {
        match v {
            0x0001 => Some(TlvType::Username),
            0x0002 => Some(TlvType::Password),
            0x0003 => Some(TlvType::AccountNo),
            0x0004 => Some(TlvType::Currency),
            0x0005 => Some(TlvType::AmountCents),
            0x0006 => Some(TlvType::ToAccountNo),
            0x0007 => Some(TlvType::TtlSeconds),
            0x0008 => Some(TlvType::Note),
            _ => None,
        }
    }

    /// Fixed width in bytes for fixed-width kinds, `None` for UTF-8 strings.
    pub fn fixed_width(self) -> Option<usize> {
        match self {
            TlvType::Currency => Some(1),
            TlvType::AmountCents => Some(8),
            TlvType::TtlSeconds => Some(4),
            TlvType::Username
            | TlvType::Password
            | TlvType::AccountNo
            | TlvType::ToAccountNo
            | TlvType::Note => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            TlvType::Username => "username",
            TlvType::Password => "password",
            TlvType::AccountNo => "accountNo",
            TlvType::Currency => "currency",
            TlvType::AmountCents => "amountCents",
            TlvType::ToAccountNo => "toAccountNo",
            TlvType::TtlSeconds => "ttlSeconds",
            TlvType::Note => "note",
        }
    }
}

/// Currency enum carried by the `Currency` TLV.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Currency {
    Sgd = 0,
    Usd = 1,
    Eur = 2,
    Gbp = 3,
    Jpy = 4,
    Cny = 5,
}

impl TryFrom<u8> for Currency {
    type Error = ProtocolError;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            0 => Ok(Currency::Sgd),
            1 => Ok(Currency::Usd),
            2 => Ok(Currency::Eur),
            3 => Ok(Currency::Gbp),
            4 => Ok(Currency::Jpy),
            5 => Ok(Currency::Cny),
            other => Err(ProtocolError::UnknownCurrency(other)),
        }
    }
}

/// A decoded TLV value, tagged by its kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TlvValue {
    Text(String),
    Currency(Currency),
    AmountCents(i64),
    TtlSeconds(u32),
}

impl TlvValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            TlvValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_amount_cents(&self) -> Option<i64> {
        match self {
            TlvValue::AmountCents(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_currency(&self) -> Option<Currency> {
        match self {
            TlvValue::Currency(c) => Some(*c),
            _ => None,
        }
    }

    pub fn as_ttl_seconds(&self) -> Option<u32> {
        match self {
            TlvValue::TtlSeconds(v) => Some(*v),
            _ => None,
        }
    }
}

/// A payload's TLV fields, keyed by type code. `BTreeMap` so encode order is
/// deterministic (ascending code) and "later replaces earlier" on decode
/// falls out of a plain `insert`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TlvMap(BTreeMap<u16, TlvValue>);

impl TlvMap {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn insert_text(&mut self, t: TlvType, v: impl Into<String>) -> &mut Self {
        self.0.insert(t.code(), TlvValue::Text(v.into()));
        self
    }

    pub fn insert_amount_cents(&mut self, t: TlvType, v: i64) -> &mut Self {
        self.0.insert(t.code(), TlvValue::AmountCents(v));
        self
    }

    pub fn insert_currency(&mut self, t: TlvType, v: Currency) -> &mut Self {
        self.0.insert(t.code(), TlvValue::Currency(v));
        self
    }

    pub fn insert_ttl_seconds(&mut self, t: TlvType, v: u32) -> &mut Self {
        self.0.insert(t.code(), TlvValue::TtlSeconds(v));
        self
    }

    pub fn get(&self, t: TlvType) -> Option<&TlvValue> {
        self.0.get(&t.code())
    }

    pub fn contains(&self, t: TlvType) -> bool {
        self.0.contains_key(&t.code())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Encode all fields, in ascending type-code order, as `type(2) len(2) value`.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for (&code, value) in self.0.iter() {
            let bytes = encode_value(value);
            out.write_u16::<BigEndian>(code).unwrap();
            out.write_u16::<BigEndian>(bytes.len() as u16).unwrap();
            out.extend_from_slice(&bytes);
        }
        out
    }

    /// Decode a payload, consuming it exactly; any leftover or truncated TLV
    /// is a hard error per the wire contract ("consumed until payloadLen is
    /// exhausted exactly").
    pub fn decode(payload: &[u8]) -> ProtocolResult<Self> {
        let mut map = BTreeMap::new();
        let mut offset = 0usize;
        while offset < payload.len() {
            if payload.len() - offset < 4 {
                return Err(ProtocolError::TruncatedTlv {
                    need: 4,
                    have: payload.len() - offset,
                    offset,
                });
            }
            let mut cursor = Cursor::new(&payload[offset..offset + 4]);
            let tlv_type = cursor.read_u16::<BigEndian>().unwrap();
            let len = cursor.read_u16::<BigEndian>().unwrap() as usize;
            offset += 4;

            if payload.len() - offset < len {
                return Err(ProtocolError::TruncatedTlv {
                    need: len,
                    have: payload.len() - offset,
                    offset,
                });
            }
            let raw = &payload[offset..offset + len];
            offset += len;

            if let Some(known) = TlvType::from_code(tlv_type) {
                if let Some(expected) = known.fixed_width() {
                    if len != expected {
                        return Err(ProtocolError::TlvLengthMismatch {
                            tlv_type,
                            expected,
                            got: len,
                        });
                    }
                }
                let value = decode_value(known, raw)?;
                map.insert(tlv_type, value);
            }
            // Unrecognised TLV codes are silently skipped: extensibility (§9)
            // reserves 0x0009+ for future types that old decoders must not choke on.
        }

        if offset != payload.len() {
            return Err(ProtocolError::TlvScanMismatch {
                consumed: offset,
                declared: payload.len(),
            });
        }

        Ok(Self(map))
    }
}

fn encode_value(value: &TlvValue) -> Vec<u8> {
    match value {
        TlvValue::Text(s) => s.as_bytes().to_vec(),
        TlvValue::Currency(c) => vec![*c as u8],
        TlvValue::AmountCents(v) => v.to_be_bytes().to_vec(),
        TlvValue::TtlSeconds(v) => v.to_be_bytes().to_vec(),
    }
}

fn decode_value(t: TlvType, raw: &[u8]) -> ProtocolResult<TlvValue> {
    match t {
        TlvType::Username
        | TlvType::Password
        | TlvType::AccountNo
        | TlvType::ToAccountNo
        | TlvType::Note => {
            let s = std::str::from_utf8(raw)
                .map_err(|_| ProtocolError::InvalidUtf8(t.name()))?
                .to_owned();
            Ok(TlvValue::Text(s))
        }
        TlvType::Currency => {
            let c = Currency::try_from(raw[0])?;
            Ok(TlvValue::Currency(c))
        }
        TlvType::AmountCents => {
            let mut cursor = Cursor::new(raw);
            Ok(TlvValue::AmountCents(
                cursor.read_i64::<BigEndian>().unwrap(),
            ))
        }
        TlvType::TtlSeconds => {
            let mut cursor = Cursor::new(raw);
            Ok(TlvValue::TtlSeconds(cursor.read_u32::<BigEndian>().unwrap()))
        }
    }
}
