//! The bank server's library surface: the receive-loop transport plus a
//! background AMO-cache sweep task. `src/bin/server.rs` is the thin CLI
//! shell around these.

pub mod transport;

pub use transport::ServerTransport;

use std::sync::Arc;
use std::time::Duration;

use bank_core::Dispatcher;

/// Spawn a background task that periodically sweeps expired AMO cache
/// entries, so a long-running server doesn't grow the cache unboundedly
/// between lazy-eviction lookups (§10.5).
pub fn spawn_amo_sweeper(dispatcher: Arc<Dispatcher>, interval: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            dispatcher.amo_cache().sweep();
        }
    })
}
