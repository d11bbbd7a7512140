use std::sync::Arc;

use anyhow::Context;
use green_treasury::{
    api::{self, AppState, HealthInfo},
    app::build_orchestrator,
    config::AppConfig,
    db::Db,
    journal::{DecisionJournal, NoopJournal},
    logger::init_tracing,
    metrics::counters::Counters,
    state::StateStore,
};

/// Opens the journal when `DATABASE_URL` is set; otherwise decisions live only
/// in memory.
async fn init_journal(cfg: &AppConfig) -> anyhow::Result<Arc<dyn DecisionJournal>> {
    let Some(url) = cfg.database_url.as_deref() else {
        tracing::info!("DATABASE_URL not set; decision journal disabled");
        return Ok(Arc::new(NoopJournal));
    };

    let db = Db::connect(url).await.context("connect journal database")?;
    db.migrate().await.context("migrate journal schema")?;

    Ok(Arc::new(db.journal()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = AppConfig::from_env().context("load configuration")?;
    init_tracing(cfg.json_logs);

    tracing::info!("Starting green treasury service...");

    let store = StateStore::new(cfg.log_capacity);
    let counters = Counters::default();
    let journal = init_journal(&cfg).await?;

    let orchestrator = build_orchestrator(&cfg, store.clone(), counters.clone(), journal.clone())
        .context("build pipeline")?;
    orchestrator.restore_settlement_marker().await;

    store.log_agent("System", "Green treasury initialized");
    if cfg.autostart {
        store.start();
    }
    tokio::spawn(orchestrator.run());

    let app = api::router(AppState {
        store,
        counters,
        journal,
        health: HealthInfo {
            rpc_url: cfg.rpc_url.clone(),
            price_oracle_configured: cfg.price_oracle_address.is_some(),
            attestation_configured: cfg.attestation_address.is_some(),
        },
    });

    let listener = tokio::net::TcpListener::bind(cfg.http_bind)
        .await
        .with_context(|| format!("bind {}", cfg.http_bind))?;
    tracing::info!(addr = %cfg.http_bind, "observer API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown signal received");
        })
        .await?;

    Ok(())
}
