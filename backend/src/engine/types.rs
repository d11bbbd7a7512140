use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::feeds::types::Asset;

/// Threshold rules applied by the verification gate and the decision engine.
///
/// Values are injected from configuration; the engine never hardcodes them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thresholds {
    /// Maximum accepted price age before the oracle is considered stale.
    pub oracle_timeout_secs: u64,

    /// Buy only while the asset trades strictly below this USD price.
    pub target_price: Decimal,

    /// Intensity strictly below this is low-carbon (gCO2/kWh).
    pub green_threshold: u64,

    /// Intensity at or above this halts activity (gCO2/kWh).
    pub amber_threshold: u64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            oracle_timeout_secs: 180,
            target_price: Decimal::new(110, 2),
            green_threshold: 50,
            amber_threshold: 150,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerificationStatus {
    Unverified,
    Verified,
    GreenVerified,
    Error,
}

impl VerificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationStatus::Unverified => "UNVERIFIED",
            VerificationStatus::Verified => "VERIFIED",
            VerificationStatus::GreenVerified => "GREEN_VERIFIED",
            VerificationStatus::Error => "ERROR",
        }
    }

    /// Whether the carbon reading may be acted upon at all.
    pub fn is_trusted(&self) -> bool {
        matches!(
            self,
            VerificationStatus::Verified | VerificationStatus::GreenVerified
        )
    }
}

impl fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output of the verification gate.
///
/// `round_id` and `intensity` are carried for transparency; both are `None`
/// when the attestation feed failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verification {
    pub status: VerificationStatus,
    pub round_id: Option<u64>,
    pub intensity: Option<u64>,
    pub detail: String,
}

/// Informational intensity band shown to observers. Not used for decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CarbonBand {
    Green,
    Amber,
    Red,
    Unknown,
}

impl CarbonBand {
    pub fn classify(intensity: Option<u64>, thresholds: &Thresholds) -> Self {
        match intensity {
            None | Some(0) => CarbonBand::Unknown,
            Some(i) if i < thresholds.green_threshold => CarbonBand::Green,
            Some(i) if i < thresholds.amber_threshold => CarbonBand::Amber,
            Some(_) => CarbonBand::Red,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    ExecuteBuy,
    Wait,
    HaltActivity,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::ExecuteBuy => "EXECUTE_BUY",
            Verdict::Wait => "WAIT",
            Verdict::HaltActivity => "HALT_ACTIVITY",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inputs a decision was computed from, frozen alongside the verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputSnapshot {
    pub asset: Option<Asset>,
    pub price: Option<Decimal>,
    pub price_age_secs: Option<u64>,
    pub price_error: Option<String>,
    pub status: VerificationStatus,
    pub round_id: Option<u64>,
    pub intensity: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub verdict: Verdict,
    pub reason: String,
    pub inputs: InputSnapshot,
    /// Evaluation time (unix seconds) the price age was measured against.
    pub decided_at: u64,
}
