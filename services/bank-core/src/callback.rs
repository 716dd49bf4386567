//! Monitor subscription registry: clientId -> (address, expiry).

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use dashmap::DashMap;

struct Registration {
    address: SocketAddr,
    expires_at: Instant,
}

#[derive(Default)]
pub struct CallbackRegistry {
    registrations: DashMap<u32, Registration>,
}

impl CallbackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or refresh a monitor's subscription.
    pub fn register(&self, client_id: u32, address: SocketAddr, ttl: Duration) {
        self.registrations.insert(
            client_id,
            Registration {
                address,
                expires_at: Instant::now() + ttl,
            },
        );
    }

    /// Remove a monitor's subscription. Returns whether one existed.
    pub fn unregister(&self, client_id: u32) -> bool {
        self.registrations.remove(&client_id).is_some()
    }

    /// Addresses of all non-expired registrants other than `exclude`,
    /// pruning expired entries encountered along the way.
    pub fn addresses(&self, exclude: u32) -> Vec<SocketAddr> {
        let now = Instant::now();
        let expired: Vec<u32> = self
            .registrations
            .iter()
            .filter(|entry| entry.expires_at <= now)
            .map(|entry| *entry.key())
            .collect();
        for client_id in expired {
            self.registrations.remove(&client_id);
        }

        self.registrations
            .iter()
            .filter(|entry| *entry.key() != exclude)
            .map(|entry| entry.address)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }
}
