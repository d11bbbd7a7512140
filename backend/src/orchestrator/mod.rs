//! Fixed-cadence pipeline: fetch → verify → decide → settle → publish.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use rust_decimal::Decimal;
use tokio::time::MissedTickBehavior;
use tracing::{Instrument, debug, info, warn};

use crate::engine::{CarbonBand, Decision, Thresholds, Verdict, Verification, decide, verify};
use crate::feeds::{Asset, AttestationFeed, PriceFeed, ReferenceFeed, ReferenceReading};
use crate::journal::DecisionJournal;
use crate::logger::{CycleId, annotate_round, annotate_verdict, cycle_span};
use crate::metrics::counters::Counters;
use crate::settlement::{DedupPolicy, SettlementDispatcher, SettlementResult, SettlementStatus};
use crate::state::StateStore;
use crate::state::types::{CarbonView, CycleReport};
use crate::time::now_secs;

#[derive(Clone, Debug)]
pub struct OrchestratorConfig {
    pub asset: Asset,
    pub thresholds: Thresholds,
    pub interval: Duration,
    /// Payout recipient; an unset recipient is rejected per attempt.
    pub recipient: Option<String>,
    pub amount: Decimal,
    pub dedup: DedupPolicy,
}

pub struct Orchestrator<P, A> {
    price_feed: Arc<P>,
    attestation_feed: Arc<A>,
    /// Untrusted context for observers; never an input to `verify`/`decide`.
    reference_feed: Option<Arc<dyn ReferenceFeed>>,
    dispatcher: SettlementDispatcher,
    store: StateStore,
    journal: Arc<dyn DecisionJournal>,
    counters: Counters,
    cfg: OrchestratorConfig,
    in_cycle: AtomicBool,
    last_settled_round: Mutex<Option<u64>>,
}

/// Clears the in-cycle flag however the cycle ends.
struct CycleGuard<'a>(&'a AtomicBool);

impl Drop for CycleGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<P: PriceFeed, A: AttestationFeed> Orchestrator<P, A> {
    pub fn new(
        price_feed: Arc<P>,
        attestation_feed: Arc<A>,
        dispatcher: SettlementDispatcher,
        store: StateStore,
        journal: Arc<dyn DecisionJournal>,
        counters: Counters,
        cfg: OrchestratorConfig,
    ) -> Self {
        Self {
            price_feed,
            attestation_feed,
            reference_feed: None,
            dispatcher,
            store,
            journal,
            counters,
            cfg,
            in_cycle: AtomicBool::new(false),
            last_settled_round: Mutex::new(None),
        }
    }

    pub fn with_reference_feed(mut self, feed: Arc<dyn ReferenceFeed>) -> Self {
        self.reference_feed = Some(feed);
        self
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    /// Reloads the per-round dedup marker so a restart does not pay a round twice.
    pub async fn restore_settlement_marker(&self) {
        match self.journal.last_settled_round().await {
            Ok(round) => {
                *self.last_settled_round.lock() = round;
                if let Some(r) = round {
                    info!(component = "orchestrator", round_id = r, "restored last settled round");
                }
            }
            Err(e) => warn!(component = "orchestrator", error = ?e, "could not read last settled round"),
        }
    }

    /// Ticks forever; cycles run only while the store's running flag is set.
    ///
    /// A stop takes effect at the next tick. Cycles are awaited inline, so a
    /// slow cycle delays (and skips) ticks instead of overlapping them.
    pub async fn run(self: Arc<Self>) {
        let mut ticker = tokio::time::interval(self.cfg.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;

            if !self.store.is_running() {
                continue;
            }

            self.run_cycle().await;
        }
    }

    /// Runs one full cycle, or returns `None` if another cycle is in flight.
    pub async fn run_cycle(&self) -> Option<Decision> {
        if self.in_cycle.swap(true, Ordering::AcqRel) {
            Counters::incr(&self.counters.cycles_skipped);
            warn!(component = "orchestrator", "cycle already in flight; skipping");
            return None;
        }
        let _guard = CycleGuard(&self.in_cycle);

        let cycle_id = CycleId::new();
        let span = cycle_span(&cycle_id, self.cfg.asset.symbol());

        Some(self.cycle(&cycle_id).instrument(span).await)
    }

    async fn cycle(&self, cycle_id: &CycleId) -> Decision {
        let asset = self.cfg.asset;
        let t = &self.cfg.thresholds;

        self.store
            .log_agent("Scout", format!("Fetching {asset} price and carbon attestation"));

        let (price, attestation) = tokio::join!(
            self.price_feed.price_reading(asset),
            self.attestation_feed.attestation_reading()
        );

        match &price {
            Ok(p) => self.store.log_agent(
                "Scout",
                format!("{} price ${} ({}s old)", p.asset, p.price, p.age_secs(now_secs())),
            ),
            Err(e) => {
                Counters::incr(&self.counters.feed_failures);
                warn!(component = "feeds", feed = "price", error = %e, "price read failed");
                self.store.log_agent("Scout", format!("Price feed failed: {e}"));
            }
        }
        if let Err(e) = &attestation {
            Counters::incr(&self.counters.feed_failures);
            warn!(component = "feeds", feed = "attestation", error = %e, "attestation read failed");
        }

        let verification = verify(attestation.as_ref(), t.green_threshold);
        annotate_round(verification.round_id);
        self.store.log_agent(
            "Auditor",
            format!("{}: {}", verification.status, verification.detail),
        );

        let reference = if verification.status.is_trusted() {
            None
        } else {
            self.reference_reading().await
        };

        let decision = decide(price.as_ref(), &verification, t, now_secs());
        annotate_verdict(decision.verdict.as_str());
        self.store
            .log_agent("Manager", format!("{}: {}", decision.verdict, decision.reason));

        match decision.verdict {
            Verdict::ExecuteBuy => Counters::incr(&self.counters.buys),
            Verdict::Wait => Counters::incr(&self.counters.waits),
            Verdict::HaltActivity => Counters::incr(&self.counters.halts),
        }

        if let Err(e) = self.journal.record_decision(&cycle_id.to_string(), &decision).await {
            warn!(component = "journal", error = ?e, "failed to record decision");
        }

        let settlement = match decision.verdict {
            Verdict::ExecuteBuy => self.settle(cycle_id, verification.round_id).await,
            _ => None,
        };

        let carbon_band = CarbonBand::classify(verification.intensity, t);
        let carbon = carbon_view(&verification, reference, t);

        self.store.publish(CycleReport {
            price: price.ok(),
            verification,
            decision: decision.clone(),
            settlement,
            carbon_band,
            carbon,
        });
        Counters::incr(&self.counters.cycles);

        debug!(component = "orchestrator", verdict = %decision.verdict, "cycle published");

        decision
    }

    async fn reference_reading(&self) -> Option<ReferenceReading> {
        let feed = self.reference_feed.as_ref()?;

        self.store.log_agent(
            "Auditor",
            "No trusted attestation; fetching reference intensity for context",
        );

        match feed.reference_reading().await {
            Ok(r) => {
                self.store.log_agent(
                    "Auditor",
                    format!(
                        "Unverified reference data: {} gCO2/kWh from {} ({}), NOT trusted",
                        r.intensity, r.source, r.region
                    ),
                );
                Some(r)
            }
            Err(e) => {
                warn!(component = "feeds", feed = "reference", error = %e, "reference read failed");
                self.store
                    .log_agent("Auditor", format!("Reference intensity fetch failed: {e}"));
                None
            }
        }
    }

    async fn settle(&self, cycle_id: &CycleId, round_id: Option<u64>) -> Option<SettlementResult> {
        if self.cfg.dedup == DedupPolicy::PerRound {
            if let Some(r) = round_id {
                let already = matches!(*self.last_settled_round.lock(), Some(prev) if prev >= r);
                if already {
                    Counters::incr(&self.counters.settlements_deduped);
                    self.store.log_agent(
                        "Settlement",
                        format!("Round {r} already settled; skipping payout"),
                    );
                    return None;
                }
            }
        }

        let recipient = self.cfg.recipient.as_deref().unwrap_or("");
        let memo = match round_id {
            Some(r) => format!("Green treasury buy, attestation round {r}"),
            None => "Green treasury buy".to_string(),
        };

        self.store.log_agent(
            "Settlement",
            format!(
                "Initiating payout of {} USDT to {} via {}",
                self.cfg.amount,
                recipient,
                self.dispatcher.network()
            ),
        );

        let result = self
            .dispatcher
            .execute_payout(recipient, self.cfg.amount, &memo)
            .await;

        let tx = result.tx_ref.as_deref().unwrap_or("-");
        let cause = result.error.as_deref().unwrap_or("unknown");
        match result.status {
            SettlementStatus::Completed => {
                Counters::incr(&self.counters.settlements);
                self.store
                    .log_agent("Settlement", format!("Payout completed: tx {tx}"));
            }
            SettlementStatus::Degraded => {
                Counters::incr(&self.counters.settlements);
                Counters::incr(&self.counters.settlement_fallbacks);
                self.store.log_agent(
                    "Settlement",
                    format!("Payout failed ({cause}); recorded mock tx {tx}"),
                );
            }
            SettlementStatus::Rejected => {
                Counters::incr(&self.counters.settlement_rejections);
                self.store
                    .log_agent("Settlement", format!("Payout rejected: {cause}"));
            }
        }

        // Only a real payout settles a round; a degraded one stays retryable.
        if result.status == SettlementStatus::Completed && round_id.is_some() {
            *self.last_settled_round.lock() = round_id;
        }

        if let Err(e) = self
            .journal
            .record_settlement(&cycle_id.to_string(), &result, round_id)
            .await
        {
            warn!(component = "journal", error = ?e, "failed to record settlement");
        }

        Some(result)
    }
}

fn carbon_view(
    verification: &Verification,
    reference: Option<ReferenceReading>,
    t: &Thresholds,
) -> CarbonView {
    let is_fdc_verified = verification.status.is_trusted();
    let data_source = match (&reference, is_fdc_verified) {
        (_, true) => "FDC Verified (Flare Consensus)".to_string(),
        (Some(r), false) => format!("{} (UNVERIFIED - no FDC proof)", r.source),
        (None, false) => "Unavailable".to_string(),
    };

    CarbonView {
        verified_intensity: if is_fdc_verified {
            verification.intensity
        } else {
            None
        },
        reference,
        data_source,
        is_fdc_verified,
        green_threshold: t.green_threshold,
        amber_threshold: t.amber_threshold,
    }
}
