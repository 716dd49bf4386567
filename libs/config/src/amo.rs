//! At-Most-Once reply cache tuning.

use types::DEFAULT_AMO_TTL_SECS;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmoCacheConfig {
    /// How long a cached reply stays eligible for replay after last use.
    pub ttl_secs: u64,
}

impl Default for AmoCacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: DEFAULT_AMO_TTL_SECS,
        }
    }
}
