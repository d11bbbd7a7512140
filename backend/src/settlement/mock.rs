use async_trait::async_trait;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::settlement::errors::SettlementError;
use crate::settlement::types::PaymentReceipt;
use crate::settlement::PayoutClient;

/// Payout collaborator that never touches a network.
///
/// Used when `SETTLEMENT_MODE=mock` and as the dispatcher's fail-open fallback.
#[derive(Debug, Clone, Default)]
pub struct MockPayoutClient;

impl MockPayoutClient {
    /// Synthetic 32-byte transaction hash, `0x` + 64 hex chars.
    pub fn synthetic_tx_hash() -> String {
        format!("0x{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
    }
}

#[async_trait]
impl PayoutClient for MockPayoutClient {
    async fn send_payment(
        &self,
        _recipient: &str,
        _amount: Decimal,
        _memo: &str,
    ) -> Result<PaymentReceipt, SettlementError> {
        Ok(PaymentReceipt {
            tx_ref: Some(Self::synthetic_tx_hash()),
        })
    }

    fn network(&self) -> &'static str {
        "mock"
    }
}
