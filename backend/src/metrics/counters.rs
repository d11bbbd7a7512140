use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Minimal counters for operational visibility.
#[derive(Clone, Default)]
pub struct Counters {
    pub cycles: Arc<AtomicU64>,
    /// Ticks that found a cycle already in flight.
    pub cycles_skipped: Arc<AtomicU64>,
    pub feed_failures: Arc<AtomicU64>,

    // verdicts
    pub halts: Arc<AtomicU64>,
    pub waits: Arc<AtomicU64>,
    pub buys: Arc<AtomicU64>,

    // settlement outcomes
    pub settlements: Arc<AtomicU64>,
    pub settlement_fallbacks: Arc<AtomicU64>,
    pub settlement_rejections: Arc<AtomicU64>,
    pub settlements_deduped: Arc<AtomicU64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CountersSnapshot {
    pub cycles: u64,
    pub cycles_skipped: u64,
    pub feed_failures: u64,
    pub halts: u64,
    pub waits: u64,
    pub buys: u64,
    pub settlements: u64,
    pub settlement_fallbacks: u64,
    pub settlement_rejections: u64,
    pub settlements_deduped: u64,
}

impl Counters {
    pub fn incr(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> CountersSnapshot {
        let get = |c: &AtomicU64| c.load(Ordering::Relaxed);
        CountersSnapshot {
            cycles: get(&self.cycles),
            cycles_skipped: get(&self.cycles_skipped),
            feed_failures: get(&self.feed_failures),
            halts: get(&self.halts),
            waits: get(&self.waits),
            buys: get(&self.buys),
            settlements: get(&self.settlements),
            settlement_fallbacks: get(&self.settlement_fallbacks),
            settlement_rejections: get(&self.settlement_rejections),
            settlements_deduped: get(&self.settlements_deduped),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_same_cells() {
        let c = Counters::default();
        let other = c.clone();

        Counters::incr(&other.buys);
        Counters::incr(&other.buys);
        Counters::incr(&c.halts);

        let s = c.snapshot();
        assert_eq!(s.buys, 2);
        assert_eq!(s.halts, 1);
        assert_eq!(s.cycles, 0);
    }
}
