//! Probabilistic (or, in tests, scripted) packet loss simulation.
//!
//! Decisions are independent Bernoulli draws: a draw below the configured
//! probability drops the datagram, silently (no ICMP, no error to peer).
//! Counters are purely observational and never feed back into correctness.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use rand::Rng;

enum DropSource {
    /// Draw from the process RNG; used in production.
    Random(rand::rngs::ThreadRng),
    /// A fixed, literal sequence of drop decisions; used in deterministic
    /// tests (e.g. "drop exactly the first reply"). Once exhausted, further
    /// draws never drop.
    Scripted(VecDeque<bool>),
}

impl DropSource {
    fn next_is_drop(&mut self, probability: f64) -> bool {
        match self {
            DropSource::Random(rng) => rng.gen::<f64>() < probability,
            DropSource::Scripted(queue) => queue.pop_front().unwrap_or(false),
        }
    }
}

/// Direction-specific counters: total decisions made vs. how many dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectionStats {
    pub received: u64,
    pub dropped: u64,
}

struct Counters {
    req_received: AtomicU64,
    req_dropped: AtomicU64,
    rep_received: AtomicU64,
    rep_dropped: AtomicU64,
}

impl Default for Counters {
    fn default() -> Self {
        Self {
            req_received: AtomicU64::new(0),
            req_dropped: AtomicU64::new(0),
            rep_received: AtomicU64::new(0),
            rep_dropped: AtomicU64::new(0),
        }
    }
}

pub struct LossSimulator {
    p_req: f64,
    p_rep: f64,
    req_source: Mutex<DropSource>,
    rep_source: Mutex<DropSource>,
    counters: Counters,
}

impl LossSimulator {
    /// Create a simulator drawing from the process RNG with the given
    /// inbound (`p_req`) and outbound (`p_rep`) drop probabilities, each in
    /// `[0, 1]`.
    pub fn new(p_req: f64, p_rep: f64) -> Self {
        Self {
            p_req,
            p_rep,
            req_source: Mutex::new(DropSource::Random(rand::thread_rng())),
            rep_source: Mutex::new(DropSource::Random(rand::thread_rng())),
            counters: Counters::default(),
        }
    }

    /// No loss at all: every request and reply is delivered.
    pub fn disabled() -> Self {
        Self::new(0.0, 0.0)
    }

    /// Create a simulator whose inbound/outbound decisions replay the given
    /// literal sequences (`true` = drop). Used by deterministic tests.
    pub fn scripted(request_drops: Vec<bool>, reply_drops: Vec<bool>) -> Self {
        Self {
            p_req: 1.0,
            p_rep: 1.0,
            req_source: Mutex::new(DropSource::Scripted(request_drops.into())),
            rep_source: Mutex::new(DropSource::Scripted(reply_drops.into())),
            counters: Counters::default(),
        }
    }

    /// Decide whether an inbound request should be dropped.
    pub fn should_drop_request(&self) -> bool {
        self.counters.req_received.fetch_add(1, Ordering::Relaxed);
        let drop = self.req_source.lock().next_is_drop(self.p_req);
        if drop {
            self.counters.req_dropped.fetch_add(1, Ordering::Relaxed);
        }
        drop
    }

    /// Decide whether an outbound reply should be dropped.
    pub fn should_drop_reply(&self) -> bool {
        self.counters.rep_received.fetch_add(1, Ordering::Relaxed);
        let drop = self.rep_source.lock().next_is_drop(self.p_rep);
        if drop {
            self.counters.rep_dropped.fetch_add(1, Ordering::Relaxed);
        }
        drop
    }

    pub fn request_stats(&self) -> DirectionStats {
        DirectionStats {
            received: self.counters.req_received.load(Ordering::Relaxed),
            dropped: self.counters.req_dropped.load(Ordering::Relaxed),
        }
    }

    pub fn reply_stats(&self) -> DirectionStats {
        DirectionStats {
            received: self.counters.rep_received.load(Ordering::Relaxed),
            dropped: self.counters.rep_dropped.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_never_drops() {
        let sim = LossSimulator::disabled();
        for _ in 0..50 {
            assert!(!sim.should_drop_request());
            assert!(!sim.should_drop_reply());
        }
    }

    #[test]
    fn scripted_replays_exact_sequence() {
        let sim = LossSimulator::scripted(vec![true, false, false], vec![false, true]);
        assert!(sim.should_drop_request());
        assert!(!sim.should_drop_request());
        assert!(!sim.should_drop_request());
        // exhausted: defaults to "deliver"
        assert!(!sim.should_drop_request());

        assert!(!sim.should_drop_reply());
        assert!(sim.should_drop_reply());
    }

    #[test]
    fn counters_track_both_directions() {
        let sim = LossSimulator::scripted(vec![true, false], vec![true]);
        sim.should_drop_request();
        sim.should_drop_request();
        sim.should_drop_reply();

        let req_stats = sim.request_stats();
        assert_eq!(req_stats.received, 2);
        assert_eq!(req_stats.dropped, 1);

        let rep_stats = sim.reply_stats();
        assert_eq!(rep_stats.received, 1);
        assert_eq!(rep_stats.dropped, 1);
    }
}
