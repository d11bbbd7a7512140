use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::feeds::errors::FeedError;

/// Assets quoted by the FTSO price oracle contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Asset {
    Btc,
    Xrp,
}

impl Asset {
    pub fn symbol(&self) -> &'static str {
        match self {
            Asset::Btc => "BTC",
            Asset::Xrp => "XRP",
        }
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Asset {
    type Err = FeedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BTC" => Ok(Asset::Btc),
            "XRP" => Ok(Asset::Xrp),
            other => Err(FeedError::UnsupportedAsset(other.to_string())),
        }
    }
}

/// A single USD price observation. Immutable once returned by a feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceReading {
    pub asset: Asset,
    pub price: Decimal,
    /// Oracle observation time (unix seconds).
    pub observed_at: u64,
}

impl PriceReading {
    /// Seconds since observation. Timestamps ahead of `now_secs` count as fresh.
    pub fn age_secs(&self, now_secs: u64) -> u64 {
        now_secs.saturating_sub(self.observed_at)
    }
}

/// Raw carbon-intensity attestation as read from the attestation contract.
///
/// `round_id == 0` means no voting round has been processed yet and
/// `intensity == 0` means the round carries no intensity data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttestationReading {
    pub round_id: u64,
    /// gCO2/kWh
    pub intensity: u64,
    pub verified: bool,
}
