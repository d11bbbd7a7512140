//! Payout capability and the fail-open dispatcher in front of it.

pub mod dispatcher;
pub mod errors;
pub mod mock;
pub mod plasma;
pub mod types;

pub use dispatcher::{SettlementDispatcher, is_valid_address};
pub use errors::SettlementError;
pub use mock::MockPayoutClient;
pub use plasma::PlasmaRelayClient;
pub use types::*;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;

/// Capability: "can send a payout".
///
/// Implementations return collaborator failures as `SettlementError`; the
/// dispatcher decides how they surface.
#[async_trait]
pub trait PayoutClient: Send + Sync + 'static {
    async fn send_payment(
        &self,
        recipient: &str,
        amount: Decimal,
        memo: &str,
    ) -> Result<PaymentReceipt, SettlementError>;

    /// Label recorded on results produced by this client.
    fn network(&self) -> &'static str;
}

/// Selects the payout collaborator from configuration.
pub fn build_payout_client(
    mode: SettlementMode,
    relay_url: Option<String>,
    reward_contract: Option<String>,
    timeout: Duration,
) -> Result<Arc<dyn PayoutClient>, SettlementError> {
    Ok(match mode {
        SettlementMode::Plasma => Arc::new(PlasmaRelayClient::new(relay_url, reward_contract, timeout)?),
        SettlementMode::Mock => Arc::new(MockPayoutClient),
    })
}
