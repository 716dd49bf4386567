//! Codec round-trip property (§8 invariant 1) over arbitrary well-formed
//! messages: varying header routing fields, semantics, checksum presence,
//! and payload contents.

use proptest::prelude::*;
use types::{Currency, Message, MessageHeader, OpCode, Semantics, TlvMap, TlvType};

fn arb_currency() -> impl Strategy<Value = Currency> {
    prop_oneof![
        Just(Currency::Sgd),
        Just(Currency::Usd),
        Just(Currency::Eur),
        Just(Currency::Gbp),
        Just(Currency::Jpy),
        Just(Currency::Cny),
    ]
}

fn arb_semantics() -> impl Strategy<Value = Semantics> {
    prop_oneof![Just(Semantics::AtLeastOnce), Just(Semantics::AtMostOnce)]
}

fn arb_message(
    client_id: u32,
    seq_no: u32,
    username: String,
    password: String,
    account_no: String,
    amount_cents: i64,
    currency: Currency,
    semantics: Semantics,
    checksum: bool,
) -> Message {
    let mut header = MessageHeader::new_request(
        client_id,
        seq_no,
        OpCode::Deposit as u16,
        semantics,
    );
    header.set_checksum_flag(checksum);

    let mut payload = TlvMap::new();
    payload.insert_text(TlvType::Username, username);
    payload.insert_text(TlvType::Password, password);
    payload.insert_text(TlvType::AccountNo, account_no);
    payload.insert_amount_cents(TlvType::AmountCents, amount_cents);
    payload.insert_currency(TlvType::Currency, currency);

    Message::new(header, payload)
}

proptest! {
    #[test]
    fn decode_of_encode_round_trips_field_wise(
        client_id in any::<u32>(),
        seq_no in any::<u32>(),
        username in "[a-zA-Z0-9]{1,16}",
        password in "[a-zA-Z0-9]{1,16}",
        account_no in "ACC[0-9]{6}",
        amount_cents in any::<i64>(),
        currency in arb_currency(),
        semantics in arb_semantics(),
        checksum in any::<bool>(),
    ) {
        let message = arb_message(
            client_id, seq_no, username, password, account_no,
            amount_cents, currency, semantics, checksum,
        );

        let bytes = codec::encode(&message);
        let decoded = codec::decode(&bytes).unwrap();
        prop_assert_eq!(decoded.clone(), message);

        let reencoded = codec::encode(&decoded);
        prop_assert_eq!(reencoded, bytes);
    }

    #[test]
    fn request_id_formula_holds(client_id in any::<u32>(), seq_no in any::<u32>()) {
        let header = MessageHeader::new_request(client_id, seq_no, OpCode::QueryBalance as u16, Semantics::AtMostOnce);
        prop_assert_eq!(header.request_id >> 32, client_id as u64);
        prop_assert_eq!(header.request_id & 0xFFFF_FFFF, seq_no as u64);
    }
}
