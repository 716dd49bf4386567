//! `bank-server <port> [requestLoss%] [replyLoss%]`

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::info;

use bank_core::{Dispatcher, InMemoryBank};
use bank_server::{spawn_amo_sweeper, ServerTransport};
use config::ServerConfig;
use network::{LossSimulator, UdpEndpoint};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cfg = match ServerConfig::try_parse() {
        Ok(cfg) => cfg,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };

    if let Err(err) = cfg.validate() {
        eprintln!("invalid configuration: {err}");
        std::process::exit(1);
    }

    if let Err(err) = run(cfg).await {
        eprintln!("bank-server failed: {err:#}");
        std::process::exit(1);
    }
}

async fn run(cfg: ServerConfig) -> anyhow::Result<()> {
    let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), cfg.port);
    let endpoint = UdpEndpoint::bind(addr).await?;
    let loss = LossSimulator::new(cfg.request_loss_probability(), cfg.reply_loss_probability());

    let amo_ttl = Duration::from_secs(cfg.amo_cache_config().ttl_secs);
    let dispatcher = Arc::new(Dispatcher::new(amo_ttl, Arc::new(InMemoryBank::new())));

    let _sweeper = spawn_amo_sweeper(dispatcher.clone(), Duration::from_secs(30));

    let transport = ServerTransport::new(endpoint, loss, dispatcher);

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        let _ = shutdown_tx.send(());
    });

    info!(port = cfg.port, "bank-server starting");
    transport.run(shutdown_rx).await
}
