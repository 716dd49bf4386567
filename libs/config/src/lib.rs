//! CLI configuration surfaces for the bank server and client binaries, plus
//! the shared tunables (`RetryPolicy`, `AmoCacheConfig`) that drive them.

pub mod amo;
pub mod client;
pub mod error;
pub mod retry;
pub mod server;

pub use amo::AmoCacheConfig;
pub use client::ClientConfig;
pub use error::{ConfigError, Result};
pub use retry::RetryPolicy;
pub use server::ServerConfig;
