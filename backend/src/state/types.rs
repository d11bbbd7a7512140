use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::engine::{CarbonBand, Decision, Verification};
use crate::feeds::{PriceReading, ReferenceReading};
use crate::settlement::SettlementResult;

/// One line of the human-readable agent log.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Local wall clock, `HH:MM:SS`.
    pub timestamp: String,
    pub agent: String,
    pub message: String,
}

impl LogEntry {
    pub fn now(agent: &str, message: impl Into<String>) -> Self {
        Self {
            timestamp: Local::now().format("%H:%M:%S").to_string(),
            agent: agent.to_string(),
            message: message.into(),
        }
    }
}

/// Carbon context shown to observers.
///
/// `reference` is filled only when no attestation was trusted and is labelled
/// as unverified; nothing here feeds back into decisions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarbonView {
    pub verified_intensity: Option<u64>,
    pub reference: Option<ReferenceReading>,
    pub data_source: String,
    pub is_fdc_verified: bool,
    pub green_threshold: u64,
    pub amber_threshold: u64,
}

/// Everything one cycle produced, published in a single write.
#[derive(Clone, Debug)]
pub struct CycleReport {
    pub price: Option<PriceReading>,
    pub verification: Verification,
    pub decision: Decision,
    /// `None` when the cycle did not settle; the previous settlement stays visible.
    pub settlement: Option<SettlementResult>,
    pub carbon_band: CarbonBand,
    pub carbon: CarbonView,
}

/// Immutable copy of the shared state handed to observers.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Snapshot {
    pub price: Option<PriceReading>,
    pub verification: Option<Verification>,
    pub decision: Option<Decision>,
    pub settlement: Option<SettlementResult>,
    pub carbon_band: CarbonBand,
    pub carbon: Option<CarbonView>,
    pub logs: Vec<LogEntry>,
    pub agents_running: bool,
    pub cycle_count: u64,
    /// Unix seconds of the last publish; 0 before the first cycle.
    pub last_update: u64,
}

/// Result of a start/stop request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControlOutcome {
    Started,
    AlreadyRunning,
    Stopped,
    AlreadyStopped,
}

impl ControlOutcome {
    /// Whether the request changed the running flag.
    pub fn changed(&self) -> bool {
        matches!(self, ControlOutcome::Started | ControlOutcome::Stopped)
    }
}
