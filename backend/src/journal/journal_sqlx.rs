use anyhow::Context;
use async_trait::async_trait;
use sqlx::{AnyPool, Row};
use uuid::Uuid;

use crate::engine::Decision;
use crate::journal::{DecisionJournal, JournalEntry};
use crate::settlement::SettlementResult;

/// SQLx-backed implementation of DecisionJournal.
///
/// Absent values are stored as sentinels (`0` round, `-1` intensity/age,
/// empty strings) so every column stays NOT NULL across Any backends.
pub struct SqlxDecisionJournal {
    pool: AnyPool,
}

impl SqlxDecisionJournal {
    pub fn new(pool: AnyPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DecisionJournal for SqlxDecisionJournal {
    async fn record_decision(&self, cycle_id: &str, d: &Decision) -> anyhow::Result<()> {
        sqlx::query(
            r#"
INSERT INTO decisions (
  cycle_id, decided_at, verdict, reason, status,
  round_id, intensity, price, price_age_secs, price_error
) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?);
"#,
        )
        .bind(cycle_id)
        .bind(d.decided_at as i64)
        .bind(d.verdict.as_str())
        .bind(d.reason.as_str())
        .bind(d.inputs.status.as_str())
        .bind(d.inputs.round_id.unwrap_or(0) as i64)
        .bind(d.inputs.intensity.map_or(-1, |i| i as i64))
        .bind(d.inputs.price.map(|p| p.to_string()).unwrap_or_default())
        .bind(d.inputs.price_age_secs.map_or(-1, |a| a as i64))
        .bind(d.inputs.price_error.clone().unwrap_or_default())
        .execute(&self.pool)
        .await
        .context("insert decision")?;

        Ok(())
    }

    async fn record_settlement(
        &self,
        cycle_id: &str,
        r: &SettlementResult,
        round_id: Option<u64>,
    ) -> anyhow::Result<()> {
        sqlx::query(
            r#"
INSERT INTO settlements (
  settlement_id, cycle_id, round_id, status, executed, fallback,
  tx_ref, error, recipient, amount, memo, network, created_s
) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?);
"#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(cycle_id)
        .bind(round_id.unwrap_or(0) as i64)
        .bind(r.status.to_string())
        .bind(r.executed as i64)
        .bind(r.fallback as i64)
        .bind(r.tx_ref.clone().unwrap_or_default())
        .bind(r.error.clone().unwrap_or_default())
        .bind(r.recipient.as_str())
        .bind(r.amount.to_string())
        .bind(r.memo.as_str())
        .bind(r.network.as_str())
        .bind(r.timestamp as i64)
        .execute(&self.pool)
        .await
        .context("insert settlement")?;

        Ok(())
    }

    async fn recent_decisions(&self, limit: usize) -> anyhow::Result<Vec<JournalEntry>> {
        let rows = sqlx::query(
            r#"
SELECT cycle_id, decided_at, verdict, reason, status, round_id, intensity, price
FROM decisions
ORDER BY decided_at DESC, rowid DESC
LIMIT ?;
"#,
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        let mut out = Vec::with_capacity(rows.len());
        for r in rows {
            let round_id: i64 = r.try_get("round_id")?;
            let intensity: i64 = r.try_get("intensity")?;
            let price: String = r.try_get("price")?;
            let decided_at: i64 = r.try_get("decided_at")?;

            out.push(JournalEntry {
                cycle_id: r.try_get("cycle_id")?,
                decided_at: decided_at.max(0) as u64,
                verdict: r.try_get("verdict")?,
                reason: r.try_get("reason")?,
                status: r.try_get("status")?,
                round_id: (round_id > 0).then_some(round_id as u64),
                intensity: (intensity >= 0).then_some(intensity as u64),
                price: (!price.is_empty()).then_some(price),
            });
        }

        Ok(out)
    }

    async fn last_settled_round(&self) -> anyhow::Result<Option<u64>> {
        let row = sqlx::query(
            r#"
SELECT COALESCE(MAX(round_id), 0) AS last_round
FROM settlements
WHERE status = 'COMPLETED' AND round_id > 0;
"#,
        )
        .fetch_one(&self.pool)
        .await?;

        let last: i64 = row.try_get("last_round")?;
        Ok((last > 0).then_some(last as u64))
    }
}
