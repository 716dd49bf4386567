//! Ties the AMO cache, callback registry, and banking service together.
//!
//! Invoked by the server transport with a decoded REQ and the peer's
//! address; returns the reply bytes to transmit and any ACCOUNT_UPDATE
//! callback datagrams to fan out to registered monitors.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};
use types::header::FLAG_CHECKSUM;
use types::{Currency, Message, MessageHeader, OpCode, Semantics, Status, TlvMap, TlvType};

use crate::amo::AmoCache;
use crate::banking::BankingService;
use crate::callback::CallbackRegistry;

/// What the server transport should do after a dispatch.
pub struct DispatchResult {
    /// Encoded reply datagram, addressed back to the requester.
    pub reply_bytes: Vec<u8>,
    /// Encoded ACCOUNT_UPDATE datagrams, each addressed to a monitor.
    pub callbacks: Vec<(Vec<u8>, SocketAddr)>,
}

pub struct Dispatcher {
    amo_cache: AmoCache,
    callbacks: CallbackRegistry,
    banking: Arc<dyn BankingService>,
    callback_seq: AtomicU32,
}

impl Dispatcher {
    pub fn new(amo_ttl: Duration, banking: Arc<dyn BankingService>) -> Self {
        Self {
            amo_cache: AmoCache::new(amo_ttl),
            callbacks: CallbackRegistry::new(),
            banking,
            callback_seq: AtomicU32::new(0),
        }
    }

    pub fn amo_cache(&self) -> &AmoCache {
        &self.amo_cache
    }

    pub fn callback_registry(&self) -> &CallbackRegistry {
        &self.callbacks
    }

    pub fn handle_request(&self, request: &Message, peer: SocketAddr) -> DispatchResult {
        let client_id = request.header.client_id;
        let request_id = request.header.request_id;

        if request.header.semantics == Semantics::AtMostOnce {
            if let Some(cached) = self.amo_cache.lookup(client_id, request_id) {
                debug!(client_id, request_id, "AMO cache hit, replaying cached reply");
                return DispatchResult {
                    reply_bytes: cached,
                    callbacks: Vec::new(),
                };
            }
        }

        let (status, reply_payload, effect) = self.execute(request, peer);

        let mut reply_header = MessageHeader::new_reply(&request.header, status as u16);
        reply_header.set_checksum_flag(request.header.flags & FLAG_CHECKSUM != 0);
        let reply = Message::new(reply_header, reply_payload);
        let reply_bytes = codec::encode(&reply);

        if request.header.semantics == Semantics::AtMostOnce {
            self.amo_cache.store(client_id, request_id, reply_bytes.clone());
        }

        let callbacks = if status == Status::Ok {
            self.build_callbacks(client_id, effect)
        } else {
            Vec::new()
        };

        DispatchResult {
            reply_bytes,
            callbacks,
        }
    }

    /// Dispatch on opCode. Returns the reply status, reply payload, and any
    /// account-balance effects that should trigger ACCOUNT_UPDATE callbacks.
    fn execute(&self, request: &Message, peer: SocketAddr) -> (Status, TlvMap, Vec<AccountEffect>) {
        let op_code = match OpCode::from_u16(request.header.op_code) {
            Ok(op) => op,
            Err(_) => return (Status::BadRequest, TlvMap::new(), Vec::new()),
        };

        if codec::validate_required(op_code, &request.payload).is_err() {
            return (Status::BadRequest, TlvMap::new(), Vec::new());
        }

        match op_code {
            OpCode::OpenAccount => self.open_account(request),
            OpCode::CloseAccount => self.close_account(request),
            OpCode::Deposit => self.deposit(request),
            OpCode::Withdraw => self.withdraw(request),
            OpCode::RegisterCallback => self.register_callback(request, peer),
            OpCode::UnregisterCallback => self.unregister_callback(request),
            OpCode::QueryBalance => self.query_balance(request),
            OpCode::Transfer => self.transfer(request),
            OpCode::AccountUpdate => {
                warn!("client sent server-only opCode AccountUpdate; rejecting");
                (Status::BadRequest, TlvMap::new(), Vec::new())
            }
        }
    }

    fn open_account(&self, request: &Message) -> (Status, TlvMap, Vec<AccountEffect>) {
        let username = text(&request.payload, TlvType::Username);
        let password = text(&request.payload, TlvType::Password);
        let currency = currency(&request.payload, TlvType::Currency);
        let initial_balance_cents = amount_or(&request.payload, TlvType::AmountCents, 0);

        if initial_balance_cents < 0 {
            return (Status::BadRequest, TlvMap::new(), Vec::new());
        }

        match self
            .banking
            .open_account(username, password, currency, initial_balance_cents)
        {
            Ok(result) => {
                let mut payload = TlvMap::new();
                payload.insert_text(TlvType::AccountNo, result.account_no.clone());
                payload.insert_amount_cents(TlvType::AmountCents, result.balance_cents);
                let effect = AccountEffect {
                    account_no: result.account_no,
                    new_balance_cents: result.balance_cents,
                };
                (Status::Ok, payload, vec![effect])
            }
            Err(status) => (status, TlvMap::new(), Vec::new()),
        }
    }

    fn close_account(&self, request: &Message) -> (Status, TlvMap, Vec<AccountEffect>) {
        let username = text(&request.payload, TlvType::Username);
        let password = text(&request.payload, TlvType::Password);
        let account_no = text(&request.payload, TlvType::AccountNo);

        match self.banking.close_account(username, password, account_no) {
            Ok(result) => {
                let mut payload = TlvMap::new();
                payload.insert_amount_cents(TlvType::AmountCents, result.final_balance_cents);
                let effect = AccountEffect {
                    account_no: account_no.to_string(),
                    new_balance_cents: result.final_balance_cents,
                };
                (Status::Ok, payload, vec![effect])
            }
            Err(status) => (status, TlvMap::new(), Vec::new()),
        }
    }

    fn deposit(&self, request: &Message) -> (Status, TlvMap, Vec<AccountEffect>) {
        let username = text(&request.payload, TlvType::Username);
        let password = text(&request.payload, TlvType::Password);
        let account_no = text(&request.payload, TlvType::AccountNo);
        let amount_cents = amount(&request.payload, TlvType::AmountCents);

        if amount_cents <= 0 {
            return (Status::BadRequest, TlvMap::new(), Vec::new());
        }

        match self.banking.deposit(username, password, account_no, amount_cents) {
            Ok(result) => {
                let mut payload = TlvMap::new();
                payload.insert_amount_cents(TlvType::AmountCents, result.new_balance_cents);
                let effect = AccountEffect {
                    account_no: account_no.to_string(),
                    new_balance_cents: result.new_balance_cents,
                };
                (Status::Ok, payload, vec![effect])
            }
            Err(status) => (status, TlvMap::new(), Vec::new()),
        }
    }

    fn withdraw(&self, request: &Message) -> (Status, TlvMap, Vec<AccountEffect>) {
        let username = text(&request.payload, TlvType::Username);
        let password = text(&request.payload, TlvType::Password);
        let account_no = text(&request.payload, TlvType::AccountNo);
        let amount_cents = amount(&request.payload, TlvType::AmountCents);

        if amount_cents <= 0 {
            return (Status::BadRequest, TlvMap::new(), Vec::new());
        }

        match self.banking.withdraw(username, password, account_no, amount_cents) {
            Ok(result) => {
                let mut payload = TlvMap::new();
                payload.insert_amount_cents(TlvType::AmountCents, result.new_balance_cents);
                let effect = AccountEffect {
                    account_no: account_no.to_string(),
                    new_balance_cents: result.new_balance_cents,
                };
                (Status::Ok, payload, vec![effect])
            }
            Err(status) => (status, TlvMap::new(), Vec::new()),
        }
    }

    fn query_balance(&self, request: &Message) -> (Status, TlvMap, Vec<AccountEffect>) {
        let username = text(&request.payload, TlvType::Username);
        let password = text(&request.payload, TlvType::Password);
        let account_no = text(&request.payload, TlvType::AccountNo);

        match self.banking.query_balance(username, password, account_no) {
            Ok(result) => {
                let mut payload = TlvMap::new();
                payload.insert_amount_cents(TlvType::AmountCents, result.balance_cents);
                payload.insert_currency(TlvType::Currency, result.currency);
                (Status::Ok, payload, Vec::new())
            }
            Err(status) => (status, TlvMap::new(), Vec::new()),
        }
    }

    fn transfer(&self, request: &Message) -> (Status, TlvMap, Vec<AccountEffect>) {
        let username = text(&request.payload, TlvType::Username);
        let password = text(&request.payload, TlvType::Password);
        let from_account = text(&request.payload, TlvType::AccountNo);
        let to_account = text(&request.payload, TlvType::ToAccountNo);
        let amount_cents = amount(&request.payload, TlvType::AmountCents);

        if amount_cents <= 0 {
            return (Status::BadRequest, TlvMap::new(), Vec::new());
        }

        match self
            .banking
            .transfer(username, password, from_account, to_account, amount_cents)
        {
            Ok(result) => {
                let mut payload = TlvMap::new();
                payload.insert_amount_cents(TlvType::AmountCents, result.new_source_balance_cents);
                let effects = vec![
                    AccountEffect {
                        account_no: from_account.to_string(),
                        new_balance_cents: result.new_source_balance_cents,
                    },
                    AccountEffect {
                        account_no: to_account.to_string(),
                        new_balance_cents: result.new_dest_balance_cents,
                    },
                ];
                (Status::Ok, payload, effects)
            }
            Err(status) => (status, TlvMap::new(), Vec::new()),
        }
    }

    fn register_callback(&self, request: &Message, peer: SocketAddr) -> (Status, TlvMap, Vec<AccountEffect>) {
        let ttl_seconds = match request.payload.get(TlvType::TtlSeconds).and_then(|v| v.as_ttl_seconds()) {
            Some(v) if v > 0 => v,
            _ => return (Status::BadRequest, TlvMap::new(), Vec::new()),
        };
        self.callbacks
            .register(request.header.client_id, peer, Duration::from_secs(ttl_seconds as u64));
        (Status::Ok, TlvMap::new(), Vec::new())
    }

    fn unregister_callback(&self, request: &Message) -> (Status, TlvMap, Vec<AccountEffect>) {
        self.callbacks.unregister(request.header.client_id);
        (Status::Ok, TlvMap::new(), Vec::new())
    }

    fn build_callbacks(&self, originator: u32, effects: Vec<AccountEffect>) -> Vec<(Vec<u8>, SocketAddr)> {
        if effects.is_empty() {
            return Vec::new();
        }
        let monitors = self.callbacks.addresses(originator);
        if monitors.is_empty() {
            return Vec::new();
        }

        let mut out = Vec::with_capacity(effects.len() * monitors.len());
        for effect in &effects {
            let seq = self.callback_seq.fetch_add(1, Ordering::Relaxed);
            let header = MessageHeader::new_callback(OpCode::AccountUpdate as u16, originator, seq);
            let mut payload = TlvMap::new();
            payload.insert_text(TlvType::AccountNo, effect.account_no.clone());
            payload.insert_amount_cents(TlvType::AmountCents, effect.new_balance_cents);
            let message = Message::new(header, payload);
            let bytes = codec::encode(&message);
            for &addr in &monitors {
                out.push((bytes.clone(), addr));
            }
        }
        out
    }
}

struct AccountEffect {
    account_no: String,
    new_balance_cents: i64,
}

fn text<'a>(payload: &'a TlvMap, t: TlvType) -> &'a str {
    payload
        .get(t)
        .and_then(|v| v.as_text())
        .expect("validate_required guarantees presence")
}

fn amount(payload: &TlvMap, t: TlvType) -> i64 {
    payload
        .get(t)
        .and_then(|v| v.as_amount_cents())
        .expect("validate_required guarantees presence")
}

fn amount_or(payload: &TlvMap, t: TlvType, default: i64) -> i64 {
    payload.get(t).and_then(|v| v.as_amount_cents()).unwrap_or(default)
}

fn currency(payload: &TlvMap, t: TlvType) -> Currency {
    payload
        .get(t)
        .and_then(|v| v.as_currency())
        .expect("validate_required guarantees presence")
}
