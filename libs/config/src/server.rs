//! Server CLI configuration: `bank-server <port> [requestLoss%] [replyLoss%]`.

use clap::Parser;

use crate::amo::AmoCacheConfig;
use crate::error::{ConfigError, Result};

#[derive(Parser, Debug, Clone)]
#[command(name = "bank-server", about = "UDP banking request/reply server")]
pub struct ServerConfig {
    /// UDP port to listen on.
    #[arg(default_value_t = types::DEFAULT_PORT)]
    pub port: u16,

    /// Percentage chance (0-100) of silently dropping an inbound request.
    #[arg(default_value_t = 0.0)]
    pub request_loss_pct: f64,

    /// Percentage chance (0-100) of silently dropping an outbound reply.
    #[arg(default_value_t = 0.0)]
    pub reply_loss_pct: f64,

    /// Seconds an AMO-cached reply remains eligible for replay.
    #[arg(long, default_value_t = AmoCacheConfig::default().ttl_secs)]
    pub amo_ttl_secs: u64,
}

impl ServerConfig {
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("requestLoss%", self.request_loss_pct),
            ("replyLoss%", self.reply_loss_pct),
        ] {
            if !(0.0..=100.0).contains(&value) {
                return Err(ConfigError::LossPercentOutOfRange { field, value });
            }
        }
        Ok(())
    }

    pub fn request_loss_probability(&self) -> f64 {
        self.request_loss_pct / 100.0
    }

    pub fn reply_loss_probability(&self) -> f64 {
        self.reply_loss_pct / 100.0
    }

    pub fn amo_cache_config(&self) -> AmoCacheConfig {
        AmoCacheConfig {
            ttl_secs: self.amo_ttl_secs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_out_of_range_loss_percent() {
        let mut cfg = ServerConfig::parse_from(["bank-server", "9000"]);
        cfg.request_loss_pct = 150.0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn accepts_default_config() {
        let cfg = ServerConfig::parse_from(["bank-server", "9000"]);
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.request_loss_probability(), 0.0);
    }
}
