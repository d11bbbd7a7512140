//! Unattested grid intensity, shown to observers for context only.
//!
//! Readings from here are never trusted: they do not reach the verification
//! gate or the decision engine, and a failed read yields no value at all.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::feeds::errors::FeedError;
use crate::time::now_secs;

pub const NATIONAL_GRID_URL: &str = "https://api.carbonintensity.org.uk/intensity";

/// An untrusted intensity observation from a public API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceReading {
    pub intensity: u64,
    /// Provider's own band label (`low`, `moderate`, ...), when given.
    pub index: Option<String>,
    pub source: String,
    pub region: String,
    pub fetched_at: u64,
}

#[async_trait]
pub trait ReferenceFeed: Send + Sync + 'static {
    async fn reference_reading(&self) -> Result<ReferenceReading, FeedError>;
}

#[derive(Debug, Deserialize)]
struct IntensityEnvelope {
    data: Vec<IntensityPeriod>,
}

#[derive(Debug, Deserialize)]
struct IntensityPeriod {
    intensity: IntensityValues,
}

#[derive(Debug, Deserialize)]
struct IntensityValues {
    actual: Option<u64>,
    index: Option<String>,
}

/// Client for the National Grid carbon intensity API.
#[derive(Clone)]
pub struct NationalGridFeed {
    http: Client,
    url: String,
    region: String,
}

impl NationalGridFeed {
    pub fn new(url: String, region: String, timeout: Duration) -> Result<Self, FeedError> {
        let http = Client::builder()
            .timeout(timeout)
            .pool_idle_timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self { http, url, region })
    }
}

#[async_trait]
impl ReferenceFeed for NationalGridFeed {
    #[instrument(skip(self), fields(url = %self.url), level = "debug")]
    async fn reference_reading(&self) -> Result<ReferenceReading, FeedError> {
        let body: IntensityEnvelope = self
            .http
            .get(&self.url)
            .header("Accept", "application/json")
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let (intensity, index) = actual_intensity(body)?;
        debug!(intensity, "reference intensity fetched");

        Ok(ReferenceReading {
            intensity,
            index,
            source: "National Grid API".to_string(),
            region: self.region.clone(),
            fetched_at: now_secs(),
        })
    }
}

fn actual_intensity(body: IntensityEnvelope) -> Result<(u64, Option<String>), FeedError> {
    let period = body
        .data
        .into_iter()
        .next()
        .ok_or_else(|| FeedError::InvalidResponse("no intensity periods".into()))?;

    let actual = period
        .intensity
        .actual
        .ok_or_else(|| FeedError::InvalidResponse("no actual intensity reported".into()))?;

    Ok((actual, period.intensity.index))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> Result<(u64, Option<String>), FeedError> {
        actual_intensity(serde_json::from_str(raw).unwrap())
    }

    #[test]
    fn reads_actual_value_of_first_period() {
        let raw = r#"{"data":[{"from":"2024-01-01T10:00Z","to":"2024-01-01T10:30Z",
            "intensity":{"forecast":120,"actual":118,"index":"moderate"}}]}"#;

        assert_eq!(parse(raw).unwrap(), (118, Some("moderate".into())));
    }

    #[test]
    fn missing_actual_is_an_error_not_a_default() {
        let raw = r#"{"data":[{"intensity":{"forecast":120,"actual":null,"index":"moderate"}}]}"#;
        assert!(matches!(parse(raw), Err(FeedError::InvalidResponse(_))));
    }

    #[test]
    fn empty_period_list_is_an_error() {
        assert!(parse(r#"{"data":[]}"#).is_err());
    }
}
