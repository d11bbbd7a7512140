pub mod types;

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::info;

use crate::engine::CarbonBand;
use crate::state::types::{ControlOutcome, CycleReport, LogEntry, Snapshot};
use crate::time::now_secs;

/// Number of log lines observers see by default.
pub const OBSERVER_LOG_LINES: usize = 20;

#[derive(Default)]
struct Inner {
    report: Option<CycleReport>,
    last_settlement: Option<crate::settlement::SettlementResult>,
    logs: VecDeque<LogEntry>,
    running: bool,
    cycle_count: u64,
    last_update: u64,
}

/// Shared state written by the orchestrator and read by observers.
///
/// The orchestrator is the only writer of cycle results; observers only get
/// owned `Snapshot` copies. Start/stop are the one observer-side mutation.
#[derive(Clone)]
pub struct StateStore {
    inner: Arc<RwLock<Inner>>,
    log_capacity: usize,
}

impl StateStore {
    pub fn new(log_capacity: usize) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner::default())),
            log_capacity: log_capacity.max(1),
        }
    }

    /// Appends to the bounded agent log, evicting the oldest line when full.
    pub fn log_agent(&self, agent: &str, message: impl Into<String>) {
        let entry = LogEntry::now(agent, message);
        info!(component = "agent_log", agent = %entry.agent, "{}", entry.message);

        let mut g = self.inner.write();
        while g.logs.len() >= self.log_capacity {
            g.logs.pop_front();
        }
        g.logs.push_back(entry);
    }

    /// Publishes one cycle's results atomically.
    pub fn publish(&self, report: CycleReport) {
        let mut g = self.inner.write();
        if let Some(s) = report.settlement.clone() {
            g.last_settlement = Some(s);
        }
        g.report = Some(report);
        g.cycle_count += 1;
        g.last_update = now_secs();
    }

    /// Copy of the current state with at most `log_lines` of the newest log entries.
    pub fn snapshot(&self, log_lines: Option<usize>) -> Snapshot {
        let g = self.inner.read();
        let n = log_lines.unwrap_or(g.logs.len()).min(g.logs.len());
        let logs = g.logs.iter().skip(g.logs.len() - n).cloned().collect();

        let report = g.report.as_ref();
        Snapshot {
            price: report.and_then(|r| r.price.clone()),
            verification: report.map(|r| r.verification.clone()),
            decision: report.map(|r| r.decision.clone()),
            settlement: g.last_settlement.clone(),
            carbon_band: report.map_or(CarbonBand::Unknown, |r| r.carbon_band),
            carbon: report.map(|r| r.carbon.clone()),
            logs,
            agents_running: g.running,
            cycle_count: g.cycle_count,
            last_update: g.last_update,
        }
    }

    pub fn is_running(&self) -> bool {
        self.inner.read().running
    }

    pub fn start(&self) -> ControlOutcome {
        let outcome = {
            let mut g = self.inner.write();
            if g.running {
                ControlOutcome::AlreadyRunning
            } else {
                g.running = true;
                ControlOutcome::Started
            }
        };
        if outcome.changed() {
            self.log_agent("System", "Agents started");
        }
        outcome
    }

    pub fn stop(&self) -> ControlOutcome {
        let outcome = {
            let mut g = self.inner.write();
            if !g.running {
                ControlOutcome::AlreadyStopped
            } else {
                g.running = false;
                ControlOutcome::Stopped
            }
        };
        if outcome.changed() {
            self.log_agent("System", "Agents stopped");
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Decision, InputSnapshot, Verdict, Verification, VerificationStatus};
    use crate::state::types::CarbonView;

    fn report(verdict: Verdict) -> CycleReport {
        CycleReport {
            price: None,
            verification: Verification {
                status: VerificationStatus::Unverified,
                round_id: None,
                intensity: None,
                detail: "no attestation processed yet".into(),
            },
            decision: Decision {
                verdict,
                reason: "test".into(),
                inputs: InputSnapshot {
                    asset: None,
                    price: None,
                    price_age_secs: None,
                    price_error: None,
                    status: VerificationStatus::Unverified,
                    round_id: None,
                    intensity: None,
                },
                decided_at: 0,
            },
            settlement: None,
            carbon_band: CarbonBand::Unknown,
            carbon: CarbonView {
                verified_intensity: None,
                reference: None,
                data_source: "Unavailable".into(),
                is_fdc_verified: false,
                green_threshold: 50,
                amber_threshold: 150,
            },
        }
    }

    #[test]
    fn log_is_bounded_fifo() {
        let store = StateStore::new(5);
        for i in 0..8 {
            store.log_agent("Scout", format!("line {i}"));
        }

        let snap = store.snapshot(None);
        let msgs: Vec<_> = snap.logs.iter().map(|l| l.message.as_str()).collect();
        assert_eq!(msgs, vec!["line 3", "line 4", "line 5", "line 6", "line 7"]);
    }

    #[test]
    fn snapshot_returns_newest_lines() {
        let store = StateStore::new(100);
        for i in 0..30 {
            store.log_agent("Scout", format!("line {i}"));
        }

        let snap = store.snapshot(Some(OBSERVER_LOG_LINES));
        assert_eq!(snap.logs.len(), 20);
        assert_eq!(snap.logs[0].message, "line 10");
        assert_eq!(snap.logs[19].message, "line 29");
        assert_eq!(snap.logs[0].timestamp.len(), 8);
    }

    #[test]
    fn start_and_stop_are_idempotent() {
        let store = StateStore::new(10);

        assert_eq!(store.stop(), ControlOutcome::AlreadyStopped);
        assert_eq!(store.start(), ControlOutcome::Started);
        assert_eq!(store.start(), ControlOutcome::AlreadyRunning);
        assert!(store.is_running());
        assert_eq!(store.stop(), ControlOutcome::Stopped);
        assert_eq!(store.stop(), ControlOutcome::AlreadyStopped);
        assert!(!store.is_running());

        // only real transitions are logged
        assert_eq!(store.snapshot(None).logs.len(), 2);
    }

    #[test]
    fn publish_replaces_cycle_fields_and_counts() {
        let store = StateStore::new(10);
        assert!(store.snapshot(None).decision.is_none());

        store.publish(report(Verdict::Wait));
        store.publish(report(Verdict::HaltActivity));

        let snap = store.snapshot(None);
        assert_eq!(snap.cycle_count, 2);
        assert_eq!(snap.decision.map(|d| d.verdict), Some(Verdict::HaltActivity));
        assert!(snap.last_update > 0);
    }

    #[test]
    fn snapshot_is_a_copy() {
        let store = StateStore::new(10);
        store.log_agent("System", "before");
        let snap = store.snapshot(None);
        store.log_agent("System", "after");

        assert_eq!(snap.logs.len(), 1);
    }
}
