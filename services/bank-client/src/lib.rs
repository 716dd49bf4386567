//! The bank client's library surface: the send-wait-retry transport.
//! An interactive shell is out of scope (§1); `src/bin/client.rs` is a
//! minimal, single-request CLI front end over [`ClientTransport`].

pub mod transport;

pub use transport::{CallbackHandler, ClientTransport};
