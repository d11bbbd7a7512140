//! Feed adapters for the two on-chain data sources, plus an untrusted
//! reference intensity read for observers.
//!
//! Adapters perform exactly one external read per call and return either a
//! typed reading or a `FeedError`. They never retry and never substitute
//! defaults; fallback policy belongs to the orchestrator.

pub mod errors;
pub mod fdc;
pub mod ftso;
pub mod reference;
pub mod rpc;
pub mod types;

pub use errors::FeedError;
pub use fdc::FdcAttestationFeed;
pub use ftso::FtsoPriceFeed;
pub use reference::{NATIONAL_GRID_URL, NationalGridFeed, ReferenceFeed, ReferenceReading};
pub use rpc::RpcClient;
pub use types::*;

use async_trait::async_trait;

/// Source of USD price readings (FTSO-style oracle).
#[async_trait]
pub trait PriceFeed: Send + Sync + 'static {
    async fn price_reading(&self, asset: Asset) -> Result<PriceReading, FeedError>;
}

/// Source of carbon-intensity attestations (FDC-style consensus).
#[async_trait]
pub trait AttestationFeed: Send + Sync + 'static {
    async fn attestation_reading(&self) -> Result<AttestationReading, FeedError>;
}
