use sqlx::AnyPool;

pub async fn migrate(pool: &AnyPool) -> anyhow::Result<()> {
    // Decisions
    sqlx::query(
        r#"
CREATE TABLE IF NOT EXISTS decisions (
  cycle_id TEXT PRIMARY KEY,
  decided_at BIGINT NOT NULL,
  verdict TEXT NOT NULL,
  reason TEXT NOT NULL,
  status TEXT NOT NULL,
  round_id BIGINT NOT NULL,
  intensity BIGINT NOT NULL,
  price TEXT NOT NULL,
  price_age_secs BIGINT NOT NULL,
  price_error TEXT NOT NULL
);
"#,
    )
    .execute(pool)
    .await?;

    // Settlements
    sqlx::query(
        r#"
CREATE TABLE IF NOT EXISTS settlements (
  settlement_id TEXT PRIMARY KEY,
  cycle_id TEXT NOT NULL,
  round_id BIGINT NOT NULL,
  status TEXT NOT NULL,
  executed INTEGER NOT NULL CHECK (executed IN (0,1)),
  fallback INTEGER NOT NULL CHECK (fallback IN (0,1)),
  tx_ref TEXT NOT NULL,
  error TEXT NOT NULL,
  recipient TEXT NOT NULL,
  amount TEXT NOT NULL,
  memo TEXT NOT NULL,
  network TEXT NOT NULL,
  created_s BIGINT NOT NULL
);
"#,
    )
    .execute(pool)
    .await?;

    sqlx::query(r#"CREATE INDEX IF NOT EXISTS idx_decisions_time ON decisions(decided_at);"#)
        .execute(pool)
        .await?;

    sqlx::query(r#"CREATE INDEX IF NOT EXISTS idx_settlements_round ON settlements(round_id);"#)
        .execute(pool)
        .await?;

    Ok(())
}
