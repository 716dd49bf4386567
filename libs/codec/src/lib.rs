//! # Banking Protocol Codec
//!
//! The "rules" layer on top of `types`'s pure data structures: message
//! construction, parsing, checksum validation, and required-field checks.
//!
//! ```text
//! types → [codec] → network
//!   ↑        ↓          ↓
//! Pure    Protocol   Transport
//! Data     Rules     Connections
//! ```
//!
//! `codec` has no knowledge of sockets or retries; those live in `network`.

pub mod builder;
pub mod checksum;
pub mod parser;
pub mod validate;

pub use builder::encode;
pub use checksum::calculate_crc32;
pub use parser::decode;
pub use validate::validate_required;
