//! Client CLI configuration.

use std::net::SocketAddr;

use clap::Parser;

use crate::retry::RetryPolicy;

#[derive(Parser, Debug, Clone)]
#[command(name = "bank-client", about = "UDP banking request/reply client")]
pub struct ClientConfig {
    /// Address of the bank server to talk to.
    pub server_addr: SocketAddr,

    /// This client's numeric identifier, carried in every request header.
    pub client_id: u32,

    /// Initial retransmission timeout in milliseconds, doubled on each retry.
    #[arg(long, default_value_t = RetryPolicy::default().initial_timeout_ms)]
    pub initial_timeout_ms: u64,

    /// Maximum number of retransmits before giving up on a request.
    #[arg(long, default_value_t = RetryPolicy::default().max_retries)]
    pub max_retries: u32,
}

impl ClientConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            initial_timeout_ms: self.initial_timeout_ms,
            max_retries: self.max_retries,
        }
    }
}
