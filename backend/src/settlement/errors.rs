use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SettlementError {
    #[error("invalid recipient address: {0:?}")]
    InvalidRecipient(String),

    #[error("settlement not configured: {0}")]
    NotConfigured(&'static str),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("payout rejected by relay: {0}")]
    Rejected(String),

    #[error("payout timed out after {0:?}")]
    Timeout(Duration),
}

impl SettlementError {
    /// Missing configuration is fatal for the real path but still falls back.
    pub fn is_configuration(&self) -> bool {
        matches!(self, SettlementError::NotConfigured(_))
    }
}
