//! Settlement dispatcher.
//!
//! Invoked once per EXECUTE_BUY decision. The dispatcher never returns an
//! error to its caller:
//! - malformed recipient        → REJECTED, `executed = false`, no collaborator call
//! - collaborator success       → COMPLETED, `executed = true`
//! - any collaborator failure   → DEGRADED, `executed = true`, synthetic tx hash,
//!   `fallback = true`, original cause kept in `error`
//!
//! Fail-open keeps the pipeline completing cycles while payouts are down;
//! observers must check `fallback` before trusting `tx_ref`.

use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use tracing::{error, info, instrument, warn};

use crate::logger::warn_if_slow;
use crate::settlement::errors::SettlementError;
use crate::settlement::mock::MockPayoutClient;
use crate::settlement::types::{SettlementResult, SettlementStatus};
use crate::settlement::PayoutClient;
use crate::time::now_secs;

const SLOW_PAYOUT: Duration = Duration::from_secs(10);

pub struct SettlementDispatcher {
    client: Arc<dyn PayoutClient>,
    timeout: Duration,
}

impl SettlementDispatcher {
    pub fn new(client: Arc<dyn PayoutClient>, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    pub fn network(&self) -> &'static str {
        self.client.network()
    }

    #[instrument(skip(self, reason), fields(network = self.client.network()))]
    pub async fn execute_payout(
        &self,
        recipient: &str,
        amount: Decimal,
        reason: &str,
    ) -> SettlementResult {
        if !is_valid_address(recipient) {
            let e = SettlementError::InvalidRecipient(recipient.to_string());
            warn!(component = "settlement", error = %e, "payout rejected before dispatch");
            return SettlementResult {
                executed: false,
                tx_ref: None,
                error: Some(e.to_string()),
                recipient: recipient.to_string(),
                amount,
                memo: reason.to_string(),
                fallback: false,
                status: SettlementStatus::Rejected,
                network: self.client.network().to_string(),
                timestamp: now_secs(),
            };
        }

        let attempt = tokio::time::timeout(
            self.timeout,
            warn_if_slow(
                "send_payment",
                SLOW_PAYOUT,
                self.client.send_payment(recipient, amount, reason),
            ),
        )
        .await
        .unwrap_or(Err(SettlementError::Timeout(self.timeout)));

        match attempt {
            Ok(receipt) => {
                info!(
                    component = "settlement",
                    event = "payout_completed",
                    tx_ref = ?receipt.tx_ref,
                    "payout executed"
                );
                SettlementResult {
                    executed: true,
                    tx_ref: receipt.tx_ref,
                    error: None,
                    recipient: recipient.to_string(),
                    amount,
                    memo: reason.to_string(),
                    fallback: false,
                    status: SettlementStatus::Completed,
                    network: self.client.network().to_string(),
                    timestamp: now_secs(),
                }
            }
            Err(e) => self.fallback(recipient, amount, reason, e),
        }
    }

    fn fallback(
        &self,
        recipient: &str,
        amount: Decimal,
        reason: &str,
        cause: SettlementError,
    ) -> SettlementResult {
        if cause.is_configuration() {
            error!(
                component = "settlement",
                event = "payout_not_configured",
                error = %cause,
                "payout collaborator misconfigured; using mock result"
            );
        } else {
            warn!(
                component = "settlement",
                event = "payout_failed",
                error = %cause,
                "payout failed; using mock result"
            );
        }

        SettlementResult {
            executed: true,
            tx_ref: Some(MockPayoutClient::synthetic_tx_hash()),
            error: Some(cause.to_string()),
            recipient: recipient.to_string(),
            amount,
            memo: reason.to_string(),
            fallback: true,
            status: SettlementStatus::Degraded,
            network: "mock".to_string(),
            timestamp: now_secs(),
        }
    }
}

/// Matches `^0x[0-9a-fA-F]{40}$`.
pub fn is_valid_address(addr: &str) -> bool {
    addr.len() == 42
        && addr.starts_with("0x")
        && addr[2..].bytes().all(|b| b.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use tracing_test::traced_test;

    use crate::settlement::types::PaymentReceipt;

    const RECIPIENT: &str = "0x742d35Cc6634C0532925a3b844Bc9e7595f0bEb1";

    enum Behaviour {
        Succeed,
        Fail,
        Unconfigured,
        Hang,
    }

    struct ScriptedClient {
        calls: AtomicUsize,
        behaviour: Behaviour,
    }

    impl ScriptedClient {
        fn new(behaviour: Behaviour) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                behaviour,
            })
        }
    }

    #[async_trait]
    impl PayoutClient for ScriptedClient {
        async fn send_payment(
            &self,
            _: &str,
            _: Decimal,
            _: &str,
        ) -> Result<PaymentReceipt, SettlementError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.behaviour {
                Behaviour::Succeed => Ok(PaymentReceipt {
                    tx_ref: Some("0xabc".into()),
                }),
                Behaviour::Fail => Err(SettlementError::Rejected("insufficient balance".into())),
                Behaviour::Unconfigured => Err(SettlementError::NotConfigured("PLASMA_RELAY_URL")),
                Behaviour::Hang => {
                    tokio::time::sleep(Duration::from_secs(3_600)).await;
                    unreachable!("timeout must fire first")
                }
            }
        }

        fn network(&self) -> &'static str {
            "scripted"
        }
    }

    fn dispatcher(client: Arc<ScriptedClient>) -> SettlementDispatcher {
        SettlementDispatcher::new(client, Duration::from_secs(120))
    }

    #[test]
    fn address_validation() {
        assert!(is_valid_address(RECIPIENT));
        assert!(!is_valid_address("0x742d35Cc6634C0532925a3b844Bc9e7595f0bEb"));
        assert!(!is_valid_address("742d35Cc6634C0532925a3b844Bc9e7595f0bEb1ab"));
        assert!(!is_valid_address("0xZZ2d35Cc6634C0532925a3b844Bc9e7595f0bEb1"));
        assert!(!is_valid_address(""));
    }

    #[tokio::test]
    async fn success_returns_real_result() {
        let client = ScriptedClient::new(Behaviour::Succeed);
        let r = dispatcher(client.clone())
            .execute_payout(RECIPIENT, dec!(1.0), "EXECUTE_BUY")
            .await;

        assert!(r.executed);
        assert!(!r.fallback);
        assert_eq!(r.status, SettlementStatus::Completed);
        assert_eq!(r.tx_ref.as_deref(), Some("0xabc"));
        assert_eq!(r.network, "scripted");
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    #[traced_test]
    async fn transport_failure_degrades_to_marked_mock() {
        let client = ScriptedClient::new(Behaviour::Fail);
        let r = dispatcher(client)
            .execute_payout(RECIPIENT, dec!(1.0), "EXECUTE_BUY")
            .await;

        assert!(r.executed);
        assert!(r.fallback);
        assert_eq!(r.status, SettlementStatus::Degraded);
        assert_eq!(r.tx_ref.as_ref().map(String::len), Some(66));
        assert!(r.error.unwrap().contains("insufficient balance"));
        assert!(logs_contain("payout failed; using mock result"));
    }

    #[tokio::test]
    #[traced_test]
    async fn missing_configuration_is_reported_and_degraded() {
        let client = ScriptedClient::new(Behaviour::Unconfigured);
        let d = dispatcher(client.clone());

        for _ in 0..2 {
            let r = d.execute_payout(RECIPIENT, dec!(1.0), "EXECUTE_BUY").await;
            assert!(r.executed && r.fallback);
            assert!(r.error.unwrap().contains("PLASMA_RELAY_URL"));
        }

        assert_eq!(client.calls.load(Ordering::SeqCst), 2, "reported per attempt");
        assert!(logs_contain("payout collaborator misconfigured"));
    }

    #[tokio::test(start_paused = true)]
    async fn hung_collaborator_times_out_into_fallback() {
        let client = ScriptedClient::new(Behaviour::Hang);
        let r = dispatcher(client)
            .execute_payout(RECIPIENT, dec!(1.0), "EXECUTE_BUY")
            .await;

        assert!(r.fallback);
        assert!(r.error.unwrap().contains("timed out"));
    }

    #[tokio::test]
    async fn malformed_recipient_never_reaches_collaborator() {
        let client = ScriptedClient::new(Behaviour::Succeed);
        let r = dispatcher(client.clone())
            .execute_payout("0xnot-an-address", dec!(1.0), "EXECUTE_BUY")
            .await;

        assert!(!r.executed);
        assert!(!r.fallback);
        assert_eq!(r.status, SettlementStatus::Rejected);
        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
    }
}
