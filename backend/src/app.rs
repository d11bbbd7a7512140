//! Service wiring shared by the binary and integration tests.

use std::sync::Arc;

use tracing::{info, warn};

use crate::config::AppConfig;
use crate::error::AppError;
use crate::feeds::{FdcAttestationFeed, FtsoPriceFeed, NationalGridFeed, RpcClient};
use crate::journal::DecisionJournal;
use crate::metrics::counters::Counters;
use crate::orchestrator::{Orchestrator, OrchestratorConfig};
use crate::settlement::{SettlementDispatcher, build_payout_client, is_valid_address};
use crate::state::StateStore;

pub type LiveOrchestrator = Orchestrator<FtsoPriceFeed, FdcAttestationFeed>;

/// Builds the on-chain feeds, the payout path and the orchestrator.
pub fn build_orchestrator(
    cfg: &AppConfig,
    store: StateStore,
    counters: Counters,
    journal: Arc<dyn DecisionJournal>,
) -> Result<Arc<LiveOrchestrator>, AppError> {
    let rpc = RpcClient::new(cfg.rpc_url.clone(), cfg.feed_timeout)?;
    let price_feed = FtsoPriceFeed::new(rpc.clone(), cfg.price_oracle_address.clone());
    let attestation_feed = FdcAttestationFeed::new(rpc, cfg.attestation_address.clone());

    if !price_feed.is_configured() {
        warn!(component = "config", "PRICE_ORACLE_ADDRESS not set; every cycle will halt");
    }
    if !attestation_feed.is_configured() {
        warn!(component = "config", "VERIDIFI_CORE_ADDRESS not set; carbon data stays unverified");
    }

    let s = &cfg.settlement;
    match s.recipient.as_deref() {
        None => warn!(component = "config", "PLASMA_RECIPIENT_ADDRESS not set; payouts will be rejected"),
        Some(r) if !is_valid_address(r) => {
            warn!(component = "config", recipient = %r, "PLASMA_RECIPIENT_ADDRESS is malformed; payouts will be rejected")
        }
        Some(_) => {}
    }

    let client = build_payout_client(s.mode, s.relay_url.clone(), s.reward_contract.clone(), s.timeout)?;
    let dispatcher = SettlementDispatcher::new(client, s.timeout);

    info!(
        component = "config",
        asset = %cfg.asset,
        mode = ?s.mode,
        dedup = ?s.dedup,
        interval_ms = cfg.poll_interval.as_millis() as u64,
        "pipeline configured"
    );

    let orchestrator = Orchestrator::new(
        Arc::new(price_feed),
        Arc::new(attestation_feed),
        dispatcher,
        store,
        journal,
        counters,
        OrchestratorConfig {
            asset: cfg.asset,
            thresholds: cfg.thresholds.clone(),
            interval: cfg.poll_interval,
            recipient: s.recipient.clone(),
            amount: s.amount,
            dedup: s.dedup,
        },
    );

    Ok(Arc::new(match &cfg.reference_url {
        Some(url) => {
            let feed = NationalGridFeed::new(url.clone(), cfg.reference_region.clone(), cfg.feed_timeout)?;
            orchestrator.with_reference_feed(Arc::new(feed))
        }
        None => orchestrator,
    }))
}
