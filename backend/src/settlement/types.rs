use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Which payout collaborator the dispatcher talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettlementMode {
    Plasma,
    Mock,
}

impl FromStr for SettlementMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "plasma" => Ok(SettlementMode::Plasma),
            "mock" => Ok(SettlementMode::Mock),
            other => Err(format!("expected plasma or mock, got {other}")),
        }
    }
}

/// Whether repeated EXECUTE_BUY verdicts for the same attestation round pay again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DedupPolicy {
    None,
    PerRound,
}

impl FromStr for DedupPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(DedupPolicy::None),
            "per_round" | "per-round" => Ok(DedupPolicy::PerRound),
            other => Err(format!("expected none or per_round, got {other}")),
        }
    }
}

/// Successful response from a payout collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentReceipt {
    /// Transaction hash when the collaborator reports one.
    pub tx_ref: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SettlementStatus {
    /// The configured collaborator accepted the payout.
    Completed,
    /// The collaborator failed; a synthetic result was substituted.
    Degraded,
    /// Validation failed before any collaborator was called.
    Rejected,
}

impl fmt::Display for SettlementStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SettlementStatus::Completed => "COMPLETED",
            SettlementStatus::Degraded => "DEGRADED",
            SettlementStatus::Rejected => "REJECTED",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementResult {
    pub executed: bool,
    pub tx_ref: Option<String>,
    /// Original failure cause for degraded and rejected results.
    pub error: Option<String>,
    pub recipient: String,
    pub amount: Decimal,
    pub memo: String,
    pub fallback: bool,
    pub status: SettlementStatus,
    pub network: String,
    /// Unix seconds.
    pub timestamp: u64,
}
