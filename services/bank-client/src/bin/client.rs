//! Minimal single-request CLI front end over [`ClientTransport`]. An
//! interactive shell and launcher are explicitly out of scope (see §1 of
//! the banking protocol spec this crate implements).

use std::net::SocketAddr;

use clap::{Parser, Subcommand};
use tracing::info;
use types::{Currency, OpCode, Semantics, TlvMap, TlvType};

use bank_client::ClientTransport;
use config::RetryPolicy;

#[derive(Parser, Debug)]
#[command(name = "bank-client", about = "Issue a single banking request over UDP")]
struct Cli {
    server_addr: SocketAddr,
    client_id: u32,

    #[arg(long, default_value_t = RetryPolicy::default().initial_timeout_ms)]
    initial_timeout_ms: u64,
    #[arg(long, default_value_t = RetryPolicy::default().max_retries)]
    max_retries: u32,
    #[arg(long, value_enum, default_value = "at-most-once")]
    semantics: SemanticsArg,

    #[command(subcommand)]
    op: Op,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum SemanticsArg {
    AtLeastOnce,
    AtMostOnce,
}

impl From<SemanticsArg> for Semantics {
    fn from(v: SemanticsArg) -> Self {
        match v {
            SemanticsArg::AtLeastOnce => Semantics::AtLeastOnce,
            SemanticsArg::AtMostOnce => Semantics::AtMostOnce,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Op {
    OpenAccount {
        username: String,
        password: String,
        #[arg(value_enum)]
        currency: CurrencyArg,
        #[arg(default_value_t = 0)]
        initial_balance_cents: i64,
    },
    Deposit {
        username: String,
        password: String,
        account_no: String,
        amount_cents: i64,
    },
    Withdraw {
        username: String,
        password: String,
        account_no: String,
        amount_cents: i64,
    },
    QueryBalance {
        username: String,
        password: String,
        account_no: String,
    },
    Transfer {
        username: String,
        password: String,
        account_no: String,
        to_account_no: String,
        amount_cents: i64,
    },
    RegisterCallback {
        ttl_seconds: u32,
    },
    UnregisterCallback,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum CurrencyArg {
    Sgd,
    Usd,
    Eur,
    Gbp,
    Jpy,
    Cny,
}

impl From<CurrencyArg> for Currency {
    fn from(v: CurrencyArg) -> Self {
        match v {
            CurrencyArg::Sgd => Currency::Sgd,
            CurrencyArg::Usd => Currency::Usd,
            CurrencyArg::Eur => Currency::Eur,
            CurrencyArg::Gbp => Currency::Gbp,
            CurrencyArg::Jpy => Currency::Jpy,
            CurrencyArg::Cny => Currency::Cny,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let retry_policy = RetryPolicy {
        initial_timeout_ms: cli.initial_timeout_ms,
        max_retries: cli.max_retries,
    };
    let transport = ClientTransport::connect(cli.server_addr, cli.client_id, retry_policy).await?;

    let (op_code, payload) = build_request(cli.op);
    let semantics: Semantics = cli.semantics.into();

    match transport.send_request(op_code, payload, semantics).await {
        Some(reply) => {
            info!(status = reply.header.status, "reply received");
            println!("status={} payload={:?}", reply.header.status, reply.payload);
        }
        None => {
            eprintln!("request timed out after retries");
            std::process::exit(1);
        }
    }

    Ok(())
}

fn build_request(op: Op) -> (OpCode, TlvMap) {
    let mut payload = TlvMap::new();
    let op_code = match op {
        Op::OpenAccount {
            username,
            password,
            currency,
            initial_balance_cents,
        } => {
            payload.insert_text(TlvType::Username, username);
            payload.insert_text(TlvType::Password, password);
            payload.insert_currency(TlvType::Currency, currency.into());
            payload.insert_amount_cents(TlvType::AmountCents, initial_balance_cents);
            OpCode::OpenAccount
        }
        Op::Deposit {
            username,
            password,
            account_no,
            amount_cents,
        } => {
            payload.insert_text(TlvType::Username, username);
            payload.insert_text(TlvType::Password, password);
            payload.insert_text(TlvType::AccountNo, account_no);
            payload.insert_amount_cents(TlvType::AmountCents, amount_cents);
            OpCode::Deposit
        }
        Op::Withdraw {
            username,
            password,
            account_no,
            amount_cents,
        } => {
            payload.insert_text(TlvType::Username, username);
            payload.insert_text(TlvType::Password, password);
            payload.insert_text(TlvType::AccountNo, account_no);
            payload.insert_amount_cents(TlvType::AmountCents, amount_cents);
            OpCode::Withdraw
        }
        Op::QueryBalance {
            username,
            password,
            account_no,
        } => {
            payload.insert_text(TlvType::Username, username);
            payload.insert_text(TlvType::Password, password);
            payload.insert_text(TlvType::AccountNo, account_no);
            OpCode::QueryBalance
        }
        Op::Transfer {
            username,
            password,
            account_no,
            to_account_no,
            amount_cents,
        } => {
            payload.insert_text(TlvType::Username, username);
            payload.insert_text(TlvType::Password, password);
            payload.insert_text(TlvType::AccountNo, account_no);
            payload.insert_text(TlvType::ToAccountNo, to_account_no);
            payload.insert_amount_cents(TlvType::AmountCents, amount_cents);
            OpCode::Transfer
        }
        Op::RegisterCallback { ttl_seconds } => {
            payload.insert_ttl_seconds(TlvType::TtlSeconds, ttl_seconds);
            OpCode::RegisterCallback
        }
        Op::UnregisterCallback => OpCode::UnregisterCallback,
    };
    (op_code, payload)
}
