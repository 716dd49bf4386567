//! At-Most-Once reply cache: (clientId, requestId) -> encoded reply bytes.
//!
//! Stores the encoded reply, not the semantic result, so a cache hit is a
//! byte-identical retransmit of the original reply.

use std::time::{Duration, Instant};

use dashmap::DashMap;

#[derive(Clone)]
struct Entry {
    reply_bytes: Vec<u8>,
    inserted_at: Instant,
}

pub struct AmoCache {
    entries: DashMap<(u32, u64), Entry>,
    ttl: Duration,
}

impl AmoCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    /// Return the cached reply bytes for `(client_id, request_id)` if present
    /// and not yet expired, removing it first if it has expired.
    pub fn lookup(&self, client_id: u32, request_id: u64) -> Option<Vec<u8>> {
        let key = (client_id, request_id);
        let expired = match self.entries.get(&key) {
            Some(entry) => entry.inserted_at.elapsed() > self.ttl,
            None => return None,
        };
        if expired {
            self.entries.remove(&key);
            return None;
        }
        self.entries.get(&key).map(|e| e.reply_bytes.clone())
    }

    /// Insert or overwrite the cached reply for `(client_id, request_id)`.
    pub fn store(&self, client_id: u32, request_id: u64, reply_bytes: Vec<u8>) {
        self.entries.insert(
            (client_id, request_id),
            Entry {
                reply_bytes,
                inserted_at: Instant::now(),
            },
        );
    }

    /// Remove every expired entry. Safe to call on a timer; lookups already
    /// evict lazily so this is purely a memory-bound.
    pub fn sweep(&self) {
        self.entries
            .retain(|_, entry| entry.inserted_at.elapsed() <= self.ttl);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
