//! Minimal Ethereum JSON-RPC client for read-only contract calls.
//!
//! Only `eth_call` against the latest block is supported. Arguments and return
//! values are restricted to static 32-byte words, which covers every view
//! function the feeds read.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use sha3::{Digest, Keccak256};
use tracing::{debug, instrument};

use crate::feeds::errors::FeedError;

const WORD: usize = 32;

#[derive(Clone)]
pub struct RpcClient {
    http: Client,
    url: String,
    next_id: Arc<AtomicU64>,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    result: Option<String>,
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

impl RpcClient {
    pub fn new(url: String, timeout: Duration) -> Result<Self, FeedError> {
        let http = Client::builder()
            .timeout(timeout)
            .pool_idle_timeout(Duration::from_secs(30))
            .tcp_keepalive(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http,
            url,
            next_id: Arc::new(AtomicU64::new(1)),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Executes a read-only call and returns the raw ABI-encoded result bytes.
    #[instrument(skip(self, data), fields(to = %to), level = "debug")]
    pub async fn eth_call(&self, to: &str, data: &str) -> Result<Vec<u8>, FeedError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": "eth_call",
            "params": [{ "to": to, "data": data }, "latest"],
        });

        let resp = self
            .http
            .post(&self.url)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;

        let envelope: RpcResponse = resp.json().await?;

        if let Some(err) = envelope.error {
            return Err(FeedError::Rpc {
                code: err.code,
                message: err.message,
            });
        }

        let raw = envelope
            .result
            .ok_or_else(|| FeedError::InvalidResponse("rpc response without result".into()))?;

        let bytes = decode_hex(&raw)?;
        debug!(len = bytes.len(), "eth_call returned");
        Ok(bytes)
    }
}

/// First four bytes of keccak256(signature), e.g. `getLatestPrices()`.
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = Keccak256::digest(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

/// Hex calldata for `signature` with static uint arguments.
pub fn encode_call(signature: &str, args: &[u64]) -> String {
    let mut data = Vec::with_capacity(4 + args.len() * WORD);
    data.extend_from_slice(&selector(signature));
    for arg in args {
        let mut word = [0u8; WORD];
        word[WORD - 8..].copy_from_slice(&arg.to_be_bytes());
        data.extend_from_slice(&word);
    }
    format!("0x{}", hex::encode(data))
}

pub fn decode_hex(raw: &str) -> Result<Vec<u8>, FeedError> {
    let trimmed = raw.strip_prefix("0x").unwrap_or(raw);
    hex::decode(trimmed).map_err(|e| FeedError::InvalidResponse(format!("bad hex: {e}")))
}

/// Returns the `index`-th 32-byte word of an ABI-encoded return value.
pub fn word(data: &[u8], index: usize) -> Result<&[u8], FeedError> {
    let start = index * WORD;
    data.get(start..start + WORD).ok_or_else(|| {
        FeedError::InvalidResponse(format!(
            "return data too short: {} bytes, need word {}",
            data.len(),
            index
        ))
    })
}

pub fn word_to_u128(word: &[u8]) -> Result<u128, FeedError> {
    let (high, low) = word.split_at(WORD - 16);
    if high.iter().any(|b| *b != 0) {
        return Err(FeedError::InvalidResponse("uint256 overflows u128".into()));
    }
    let mut buf = [0u8; 16];
    buf.copy_from_slice(low);
    Ok(u128::from_be_bytes(buf))
}

pub fn word_to_u64(word: &[u8]) -> Result<u64, FeedError> {
    let v = word_to_u128(word)?;
    u64::try_from(v).map_err(|_| FeedError::InvalidResponse(format!("{v} overflows u64")))
}
