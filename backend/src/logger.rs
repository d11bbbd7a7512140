use std::fmt;
use std::time::Duration;

use tracing::{Span, field};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt as tfmt};
use uuid::Uuid;

/// Correlation id for one orchestrator cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CycleId(Uuid);

impl CycleId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CycleId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CycleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

pub fn init_tracing(json: bool) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let base = tfmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .with_file(true)
        // Includes timing when the span closes
        .with_span_events(tfmt::format::FmtSpan::CLOSE);

    if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(base.json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(base.pretty())
            .init();
    }
}

/// Span wrapping one fetch → verify → decide → settle pass.
///
/// `round_id` and `verdict` are filled in as the cycle progresses.
pub fn cycle_span(cycle_id: &CycleId, asset: &str) -> Span {
    tracing::info_span!(
        "cycle",
        cycle_id = %cycle_id,
        asset = %asset,
        round_id = field::Empty,
        verdict = field::Empty
    )
}

pub fn annotate_round(round_id: Option<u64>) {
    if let Some(round) = round_id {
        Span::current().record("round_id", round);
    }
}

pub fn annotate_verdict(verdict: &str) {
    Span::current().record("verdict", field::display(verdict));
}

pub async fn warn_if_slow<F, T>(label: &'static str, max: Duration, fut: F) -> T
where
    F: std::future::Future<Output = T>,
{
    let start = std::time::Instant::now();
    let out = fut.await;
    let elapsed = start.elapsed();
    if elapsed > max {
        tracing::warn!(
            target: "performance",
            label = label,
            elapsed_ms = elapsed.as_millis() as u64,
            "slow operation detected"
        );
    }
    out
}
