//! Configuration validation errors.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{field} must be within [0, 100], got {value}")]
    LossPercentOutOfRange { field: &'static str, value: f64 },

    #[error("port {port} is not a valid listen port")]
    InvalidPort { port: u16 },
}

pub type Result<T> = std::result::Result<T, ConfigError>;
