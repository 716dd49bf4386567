//! Server-side state and logic: the AMO cache, the callback registry, the
//! banking service contract (plus an in-memory reference implementation),
//! and the dispatcher that ties them to one inbound request.

pub mod amo;
pub mod banking;
pub mod callback;
pub mod dispatcher;

pub use amo::AmoCache;
pub use banking::{BankingService, InMemoryBank};
pub use callback::CallbackRegistry;
pub use dispatcher::{DispatchResult, Dispatcher};
