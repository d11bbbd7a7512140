use async_trait::async_trait;
use tracing::{debug, instrument};

use crate::feeds::errors::FeedError;
use crate::feeds::rpc::{RpcClient, encode_call, word, word_to_u64};
use crate::feeds::types::AttestationReading;
use crate::feeds::AttestationFeed;

const LATEST_ROUND: &str = "latestRoundId()";
const INTENSITY_FOR_ROUND: &str = "getCarbonIntensity(uint256)";

/// Attestation adapter over the contract that stores FDC-verified carbon data.
#[derive(Clone)]
pub struct FdcAttestationFeed {
    rpc: RpcClient,
    address: Option<String>,
}

impl FdcAttestationFeed {
    pub fn new(rpc: RpcClient, address: Option<String>) -> Self {
        Self { rpc, address }
    }

    pub fn is_configured(&self) -> bool {
        self.address.is_some()
    }

    fn address(&self) -> Result<&str, FeedError> {
        self.address
            .as_deref()
            .ok_or(FeedError::NotConfigured("attestation"))
    }

    /// Latest voting round processed by the contract; 0 when none.
    #[instrument(skip(self), level = "debug")]
    pub async fn latest_round(&self) -> Result<u64, FeedError> {
        let data = self
            .rpc
            .eth_call(self.address()?, &encode_call(LATEST_ROUND, &[]))
            .await?;
        word_to_u64(word(&data, 0)?)
    }

    /// Attested intensity (gCO2/kWh) for `round_id`; 0 when the round has no data.
    #[instrument(skip(self), level = "debug")]
    pub async fn intensity_for_round(&self, round_id: u64) -> Result<u64, FeedError> {
        let data = self
            .rpc
            .eth_call(self.address()?, &encode_call(INTENSITY_FOR_ROUND, &[round_id]))
            .await?;
        word_to_u64(word(&data, 0)?)
    }
}

#[async_trait]
impl AttestationFeed for FdcAttestationFeed {
    async fn attestation_reading(&self) -> Result<AttestationReading, FeedError> {
        let round_id = self.latest_round().await?;

        if round_id == 0 {
            debug!("no voting round processed yet");
            return Ok(AttestationReading {
                round_id: 0,
                intensity: 0,
                verified: false,
            });
        }

        let intensity = self.intensity_for_round(round_id).await?;

        debug!(round_id, intensity, "attestation fetched");

        Ok(AttestationReading {
            round_id,
            intensity,
            verified: intensity > 0,
        })
    }
}
