use std::fmt::Display;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use rust_decimal::Decimal;

use crate::engine::Thresholds;
use crate::error::ConfigError;
use crate::feeds::{Asset, NATIONAL_GRID_URL};
use crate::settlement::{DedupPolicy, SettlementMode};

pub const DEFAULT_RPC_URL: &str = "https://coston2-api.flare.network/ext/C/rpc";

#[derive(Clone, Debug)]
pub struct AppConfig {
    // =========================
    // Feeds
    // =========================
    /// JSON-RPC endpoint both feeds read from.
    pub rpc_url: String,

    /// FTSO price oracle contract. Unset ⇒ every price read fails and the
    /// engine halts.
    pub price_oracle_address: Option<String>,

    /// FDC attestation contract. Unset ⇒ every verification is ERROR.
    pub attestation_address: Option<String>,

    pub asset: Asset,

    /// Per-call timeout for RPC reads.
    pub feed_timeout: Duration,

    /// Grid-intensity endpoint read when no attestation is trusted. Shown to
    /// observers only. `None` when `REFERENCE_INTENSITY_ENABLED=false`.
    pub reference_url: Option<String>,

    pub reference_region: String,

    // =========================
    // Loop and engine
    // =========================
    /// Sleep between cycles.
    pub poll_interval: Duration,

    pub thresholds: Thresholds,

    /// Agent log lines retained in memory.
    pub log_capacity: usize,

    pub settlement: SettlementConfig,

    // =========================
    // Ambient
    // =========================
    /// Journal database. Unset ⇒ journal disabled.
    ///
    /// SQLite only: the journal's queries use `?` placeholders and `rowid`
    /// ordering, so other schemes are refused at load time.
    pub database_url: Option<String>,

    pub http_bind: SocketAddr,

    /// Whether the loop starts running at boot without an explicit start.
    pub autostart: bool,

    /// JSON log output (`APP_ENV=production`).
    pub json_logs: bool,
}

#[derive(Clone, Debug)]
pub struct SettlementConfig {
    pub mode: SettlementMode,
    pub relay_url: Option<String>,
    pub reward_contract: Option<String>,
    /// Payout recipient. Unset ⇒ each payout is rejected by validation.
    pub recipient: Option<String>,
    pub amount: Decimal,
    pub timeout: Duration,
    pub dedup: DedupPolicy,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let thresholds = Thresholds {
            oracle_timeout_secs: positive(parse(&get, "ORACLE_TIMEOUT_SECONDS", 180u64)?, "ORACLE_TIMEOUT_SECONDS")?,
            target_price: parse(&get, "XRP_TARGET_PRICE", Decimal::new(110, 2))?,
            green_threshold: positive(parse(&get, "GREEN_ENERGY_THRESHOLD", 50u64)?, "GREEN_ENERGY_THRESHOLD")?,
            amber_threshold: positive(parse(&get, "AMBER_THRESHOLD", 150u64)?, "AMBER_THRESHOLD")?,
        };
        if thresholds.amber_threshold < thresholds.green_threshold {
            return Err(ConfigError::ThresholdOrder {
                green: thresholds.green_threshold,
                amber: thresholds.amber_threshold,
            });
        }
        if thresholds.target_price <= Decimal::ZERO {
            return Err(ConfigError::NotPositive {
                key: "XRP_TARGET_PRICE",
            });
        }

        let amount: Decimal = parse(&get, "PAYOUT_AMOUNT_USDT", Decimal::ONE)?;
        if amount <= Decimal::ZERO {
            return Err(ConfigError::NotPositive {
                key: "PAYOUT_AMOUNT_USDT",
            });
        }

        let settlement = SettlementConfig {
            mode: parse(&get, "SETTLEMENT_MODE", SettlementMode::Mock)?,
            relay_url: get("PLASMA_RELAY_URL"),
            reward_contract: get("GREEN_REWARD_CONTRACT_ADDRESS"),
            recipient: get("PLASMA_RECIPIENT_ADDRESS"),
            amount,
            timeout: Duration::from_secs(positive(
                parse(&get, "SETTLEMENT_TIMEOUT_SECS", 120u64)?,
                "SETTLEMENT_TIMEOUT_SECS",
            )?),
            dedup: parse(&get, "SETTLEMENT_DEDUP", DedupPolicy::None)?,
        };

        Ok(Self {
            rpc_url: get("RPC_URL").unwrap_or_else(|| DEFAULT_RPC_URL.to_string()),
            price_oracle_address: get("PRICE_ORACLE_ADDRESS"),
            attestation_address: get("VERIDIFI_CORE_ADDRESS"),
            asset: parse(&get, "PRICE_ASSET", Asset::Xrp)?,
            feed_timeout: Duration::from_secs(positive(
                parse(&get, "FEED_TIMEOUT_SECS", 5u64)?,
                "FEED_TIMEOUT_SECS",
            )?),
            poll_interval: Duration::from_millis(positive(
                parse(&get, "POLL_INTERVAL_MS", 1_800u64)?,
                "POLL_INTERVAL_MS",
            )?),
            reference_url: parse(&get, "REFERENCE_INTENSITY_ENABLED", true)?.then(|| {
                get("REFERENCE_INTENSITY_URL").unwrap_or_else(|| NATIONAL_GRID_URL.to_string())
            }),
            reference_region: get("REFERENCE_REGION").unwrap_or_else(|| "GB".to_string()),
            thresholds,
            log_capacity: positive(parse(&get, "LOG_CAPACITY", 100usize)?, "LOG_CAPACITY")?,
            settlement,
            database_url: sqlite_url(get("DATABASE_URL"))?,
            http_bind: parse(&get, "HTTP_BIND", SocketAddr::from(([0, 0, 0, 0], 3000)))?,
            autostart: parse(&get, "AGENTS_AUTOSTART", true)?,
            json_logs: get("APP_ENV").as_deref() == Some("production"),
        })
    }
}

fn parse<T, G>(get: &G, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            key,
            value: raw.clone(),
            reason: e.to_string(),
        }),
    }
}

fn sqlite_url(url: Option<String>) -> Result<Option<String>, ConfigError> {
    match url {
        Some(u) if !u.starts_with("sqlite:") => Err(ConfigError::InvalidValue {
            key: "DATABASE_URL",
            value: u,
            reason: "the decision journal supports sqlite: URLs only".into(),
        }),
        other => Ok(other),
    }
}

fn positive<T>(v: T, key: &'static str) -> Result<T, ConfigError>
where
    T: PartialOrd + Default,
{
    if v > T::default() {
        Ok(v)
    } else {
        Err(ConfigError::NotPositive { key })
    }
}
