use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::settlement::errors::SettlementError;
use crate::settlement::types::PaymentReceipt;
use crate::settlement::PayoutClient;

/// Gasless USDT payout through a Plasma paymaster relay.
///
/// The relay owns signing and submission; this client only posts the payout
/// request and maps the relay's answer. Both the relay URL and the reward
/// contract are required, and their absence is reported on every attempt.
#[derive(Clone)]
pub struct PlasmaRelayClient {
    http: Client,
    relay_url: Option<String>,
    reward_contract: Option<String>,
}

#[derive(Debug, Serialize)]
struct PayoutRequest<'a> {
    recipient: &'a str,
    amount: String,
    memo: &'a str,
    reward_contract: &'a str,
}

#[derive(Debug, Deserialize)]
struct PayoutResponse {
    success: bool,
    tx_hash: Option<String>,
    error: Option<String>,
}

impl PlasmaRelayClient {
    pub fn new(
        relay_url: Option<String>,
        reward_contract: Option<String>,
        timeout: Duration,
    ) -> Result<Self, SettlementError> {
        let http = Client::builder()
            .timeout(timeout)
            .pool_idle_timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http,
            relay_url,
            reward_contract,
        })
    }
}

#[async_trait]
impl PayoutClient for PlasmaRelayClient {
    #[instrument(skip(self, memo), fields(recipient = %recipient, amount = %amount))]
    async fn send_payment(
        &self,
        recipient: &str,
        amount: Decimal,
        memo: &str,
    ) -> Result<PaymentReceipt, SettlementError> {
        let relay_url = self
            .relay_url
            .as_deref()
            .ok_or(SettlementError::NotConfigured("PLASMA_RELAY_URL"))?;
        let reward_contract = self
            .reward_contract
            .as_deref()
            .ok_or(SettlementError::NotConfigured("GREEN_REWARD_CONTRACT_ADDRESS"))?;

        let body = PayoutRequest {
            recipient,
            amount: amount.to_string(),
            memo,
            reward_contract,
        };

        let resp: PayoutResponse = self
            .http
            .post(relay_url)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if !resp.success {
            return Err(SettlementError::Rejected(
                resp.error.unwrap_or_else(|| "unknown relay error".into()),
            ));
        }

        debug!(tx_hash = ?resp.tx_hash, "plasma payout accepted");

        Ok(PaymentReceipt {
            tx_ref: resp.tx_hash,
        })
    }

    fn network(&self) -> &'static str {
        "plasma-testnet"
    }
}
