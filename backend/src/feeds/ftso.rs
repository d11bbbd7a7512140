use async_trait::async_trait;
use rust_decimal::Decimal;
use tracing::{debug, instrument};

use crate::feeds::errors::FeedError;
use crate::feeds::rpc::{RpcClient, encode_call, word, word_to_u64, word_to_u128};
use crate::feeds::types::{Asset, PriceReading};
use crate::feeds::PriceFeed;

const GET_LATEST_PRICES: &str = "getLatestPrices()";

/// FTSO prices are published as 18-decimal fixed point.
const PRICE_DECIMALS: u32 = 18;

/// Decoded `getLatestPrices()` return tuple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LatestPrices {
    pub btc_price: Decimal,
    pub xrp_price: Decimal,
    pub btc_timestamp: u64,
    pub xrp_timestamp: u64,
}

impl LatestPrices {
    pub fn reading(&self, asset: Asset) -> PriceReading {
        let (price, observed_at) = match asset {
            Asset::Btc => (self.btc_price, self.btc_timestamp),
            Asset::Xrp => (self.xrp_price, self.xrp_timestamp),
        };
        PriceReading {
            asset,
            price,
            observed_at,
        }
    }
}

/// Price oracle adapter over the on-chain PriceOracle contract.
#[derive(Clone)]
pub struct FtsoPriceFeed {
    rpc: RpcClient,
    address: Option<String>,
}

impl FtsoPriceFeed {
    pub fn new(rpc: RpcClient, address: Option<String>) -> Self {
        Self { rpc, address }
    }

    pub fn is_configured(&self) -> bool {
        self.address.is_some()
    }

    #[instrument(skip(self), level = "debug")]
    pub async fn latest_prices(&self) -> Result<LatestPrices, FeedError> {
        let address = self
            .address
            .as_deref()
            .ok_or(FeedError::NotConfigured("price oracle"))?;

        let data = self
            .rpc
            .eth_call(address, &encode_call(GET_LATEST_PRICES, &[]))
            .await?;

        let prices = decode_latest_prices(&data)?;

        debug!(
            btc = %prices.btc_price,
            xrp = %prices.xrp_price,
            "ftso prices fetched"
        );

        Ok(prices)
    }
}

#[async_trait]
impl PriceFeed for FtsoPriceFeed {
    async fn price_reading(&self, asset: Asset) -> Result<PriceReading, FeedError> {
        Ok(self.latest_prices().await?.reading(asset))
    }
}

pub(crate) fn decode_latest_prices(data: &[u8]) -> Result<LatestPrices, FeedError> {
    Ok(LatestPrices {
        btc_price: from_fixed_point(word_to_u128(word(data, 0)?)?)?,
        xrp_price: from_fixed_point(word_to_u128(word(data, 1)?)?)?,
        btc_timestamp: word_to_u64(word(data, 2)?)?,
        xrp_timestamp: word_to_u64(word(data, 3)?)?,
    })
}

fn from_fixed_point(raw: u128) -> Result<Decimal, FeedError> {
    let mantissa = i128::try_from(raw)
        .map_err(|_| FeedError::InvalidResponse(format!("price {raw} out of range")))?;

    Decimal::try_from_i128_with_scale(mantissa, PRICE_DECIMALS)
        .map(|d| d.normalize())
        .map_err(|e| FeedError::InvalidResponse(format!("price {raw}: {e}")))
}
