//! Durable record of decisions and settlements.

pub mod journal_sqlx;

use async_trait::async_trait;
use serde::Serialize;

use crate::engine::Decision;
use crate::settlement::SettlementResult;

/// Row returned when reading the journal back.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct JournalEntry {
    pub cycle_id: String,
    pub decided_at: u64,
    pub verdict: String,
    pub reason: String,
    pub status: String,
    pub round_id: Option<u64>,
    pub intensity: Option<u64>,
    /// Decimal rendered as text; `None` when the price feed failed.
    pub price: Option<String>,
}

/// Append-only decision journal.
///
/// Implementations must be cheap to call once per cycle. Callers log write
/// failures and carry on; the journal never fails a cycle.
#[async_trait]
pub trait DecisionJournal: Send + Sync {
    async fn record_decision(&self, cycle_id: &str, decision: &Decision) -> anyhow::Result<()>;

    async fn record_settlement(
        &self,
        cycle_id: &str,
        result: &SettlementResult,
        round_id: Option<u64>,
    ) -> anyhow::Result<()>;

    /// Newest first.
    async fn recent_decisions(&self, limit: usize) -> anyhow::Result<Vec<JournalEntry>>;

    /// Highest attestation round that produced a completed (non-fallback) payout.
    async fn last_settled_round(&self) -> anyhow::Result<Option<u64>>;
}

/// Journal used when `DATABASE_URL` is unset.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopJournal;

#[async_trait]
impl DecisionJournal for NoopJournal {
    async fn record_decision(&self, _: &str, _: &Decision) -> anyhow::Result<()> {
        Ok(())
    }

    async fn record_settlement(
        &self,
        _: &str,
        _: &SettlementResult,
        _: Option<u64>,
    ) -> anyhow::Result<()> {
        Ok(())
    }

    async fn recent_decisions(&self, _: usize) -> anyhow::Result<Vec<JournalEntry>> {
        Ok(Vec::new())
    }

    async fn last_settled_round(&self) -> anyhow::Result<Option<u64>> {
        Ok(None)
    }
}
