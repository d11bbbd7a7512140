//! Feeds and a full cycle against a local JSON-RPC and grid-intensity stub.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use rust_decimal_macros::dec;
use serde_json::{Value, json};

use green_treasury::app::build_orchestrator;
use green_treasury::config::AppConfig;
use green_treasury::engine::{CarbonBand, Verdict, VerificationStatus};
use green_treasury::feeds::rpc::selector;
use green_treasury::feeds::{
    Asset, AttestationFeed, FdcAttestationFeed, FeedError, FtsoPriceFeed, NationalGridFeed,
    PriceFeed, ReferenceFeed, RpcClient,
};
use green_treasury::journal::NoopJournal;
use green_treasury::metrics::counters::Counters;
use green_treasury::settlement::SettlementStatus;
use green_treasury::state::StateStore;
use green_treasury::time::now_secs;

const ORACLE: &str = "0x1000000000000000000000000000000000000001";
const CORE: &str = "0x2000000000000000000000000000000000000002";
const RECIPIENT: &str = "0x742d35Cc6634C0532925a3b844Bc9e7595f0bEb1";

#[derive(Clone)]
struct Chain {
    xrp_price_wei: u128,
    round_id: u64,
    intensity: u64,
}

fn word(v: u128) -> String {
    format!("{v:064x}")
}

fn sel(sig: &str) -> String {
    format!("0x{}", hex::encode(selector(sig)))
}

async fn rpc(State(chain): State<Arc<Chain>>, Json(req): Json<Value>) -> Json<Value> {
    let id = req["id"].clone();
    let data = req["params"][0]["data"].as_str().unwrap_or_default().to_string();
    let now = now_secs() as u128;

    let result = if data.starts_with(&sel("getLatestPrices()")) {
        Some(format!(
            "0x{}{}{}{}",
            word(65_000 * 10u128.pow(18)),
            word(chain.xrp_price_wei),
            word(now),
            word(now - 10)
        ))
    } else if data.starts_with(&sel("latestRoundId()")) {
        Some(format!("0x{}", word(chain.round_id as u128)))
    } else if data.starts_with(&sel("getCarbonIntensity(uint256)")) {
        Some(format!("0x{}", word(chain.intensity as u128)))
    } else {
        None
    };

    Json(match result {
        Some(r) => json!({ "jsonrpc": "2.0", "id": id, "result": r }),
        None => json!({
            "jsonrpc": "2.0",
            "id": id,
            "error": { "code": -32000, "message": "execution reverted" }
        }),
    })
}

async fn grid_intensity() -> Json<Value> {
    Json(json!({
        "data": [{
            "from": "2026-10-18T12:00Z",
            "to": "2026-10-18T12:30Z",
            "intensity": { "forecast": 20, "actual": 12, "index": "very low" }
        }]
    }))
}

async fn spawn_chain(chain: Chain) -> SocketAddr {
    let app = Router::new()
        .route("/", post(rpc))
        .route("/intensity", get(grid_intensity))
        .with_state(Arc::new(chain));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn client(addr: SocketAddr) -> RpcClient {
    RpcClient::new(format!("http://{addr}/"), Duration::from_secs(5)).unwrap()
}

fn green_chain() -> Chain {
    Chain {
        xrp_price_wei: 1_050_000_000_000_000_000,
        round_id: 7,
        intensity: 30,
    }
}

#[tokio::test]
async fn price_feed_reads_and_scales_xrp() {
    let addr = spawn_chain(green_chain()).await;
    let feed = FtsoPriceFeed::new(client(addr), Some(ORACLE.into()));

    let reading = feed.price_reading(Asset::Xrp).await.unwrap();
    assert_eq!(reading.asset, Asset::Xrp);
    assert_eq!(reading.price, dec!(1.05));
    assert!(reading.age_secs(now_secs()) <= 15);

    let btc = feed.price_reading(Asset::Btc).await.unwrap();
    assert_eq!(btc.price, dec!(65000));
}

#[tokio::test]
async fn attestation_feed_reads_round_and_intensity() {
    let addr = spawn_chain(green_chain()).await;
    let feed = FdcAttestationFeed::new(client(addr), Some(CORE.into()));

    let reading = feed.attestation_reading().await.unwrap();
    assert_eq!(reading.round_id, 7);
    assert_eq!(reading.intensity, 30);
    assert!(reading.verified);
}

#[tokio::test]
async fn rpc_error_surfaces_as_feed_error() {
    let addr = spawn_chain(green_chain()).await;
    let rpc = client(addr);

    let err = rpc.eth_call(ORACLE, "0xdeadbeef").await.unwrap_err();
    assert!(matches!(err, FeedError::Rpc { code: -32000, .. }));
}

#[tokio::test]
async fn unreachable_endpoint_is_a_feed_failure() {
    let feed = FtsoPriceFeed::new(
        RpcClient::new("http://127.0.0.1:1/".into(), Duration::from_secs(1)).unwrap(),
        Some(ORACLE.into()),
    );

    assert!(matches!(
        feed.price_reading(Asset::Xrp).await,
        Err(FeedError::Http(_))
    ));
}

#[tokio::test]
async fn reference_feed_reads_actual_grid_intensity() {
    let addr = spawn_chain(green_chain()).await;
    let feed = NationalGridFeed::new(
        format!("http://{addr}/intensity"),
        "GB".into(),
        Duration::from_secs(5),
    )
    .unwrap();

    let reading = feed.reference_reading().await.unwrap();
    assert_eq!(reading.intensity, 12);
    assert_eq!(reading.index.as_deref(), Some("very low"));
    assert_eq!(reading.region, "GB");
}

fn config(addr: SocketAddr) -> AppConfig {
    let rpc_url = format!("http://{addr}/");
    let reference_url = format!("http://{addr}/intensity");
    AppConfig::from_lookup(|key| match key {
        "RPC_URL" => Some(rpc_url.clone()),
        "REFERENCE_INTENSITY_URL" => Some(reference_url.clone()),
        "PRICE_ORACLE_ADDRESS" => Some(ORACLE.into()),
        "VERIDIFI_CORE_ADDRESS" => Some(CORE.into()),
        "PLASMA_RECIPIENT_ADDRESS" => Some(RECIPIENT.into()),
        _ => None,
    })
    .unwrap()
}

#[tokio::test]
async fn full_cycle_buys_and_settles_through_mock() {
    let addr = spawn_chain(green_chain()).await;
    let store = StateStore::new(100);
    let counters = Counters::default();

    let o = build_orchestrator(&config(addr), store.clone(), counters.clone(), Arc::new(NoopJournal))
        .unwrap();

    let decision = o.run_cycle().await.unwrap();
    assert_eq!(decision.verdict, Verdict::ExecuteBuy);

    let snap = store.snapshot(None);
    assert_eq!(snap.carbon_band, CarbonBand::Green);
    assert_eq!(
        snap.verification.map(|v| v.status),
        Some(VerificationStatus::GreenVerified)
    );

    let settlement = snap.settlement.unwrap();
    assert_eq!(settlement.status, SettlementStatus::Completed);
    assert_eq!(settlement.network, "mock");
    assert_eq!(settlement.recipient, RECIPIENT);
    assert!(!settlement.fallback);

    let agents: Vec<_> = snap.logs.iter().map(|l| l.agent.as_str()).collect();
    for agent in ["Scout", "Auditor", "Manager", "Settlement"] {
        assert!(agents.contains(&agent), "missing {agent} log line");
    }
    assert_eq!(counters.snapshot().buys, 1);
}

#[tokio::test]
async fn full_cycle_with_high_carbon_halts() {
    let addr = spawn_chain(Chain {
        intensity: 160,
        ..green_chain()
    })
    .await;
    let store = StateStore::new(100);

    let o = build_orchestrator(&config(addr), store.clone(), Counters::default(), Arc::new(NoopJournal))
        .unwrap();

    let decision = o.run_cycle().await.unwrap();
    assert_eq!(decision.verdict, Verdict::HaltActivity);
    assert!(decision.reason.contains("High carbon"));
    assert_eq!(store.snapshot(None).carbon_band, CarbonBand::Red);
    assert!(store.snapshot(None).settlement.is_none());
}

#[tokio::test]
async fn round_zero_waits_without_reading_intensity() {
    let addr = spawn_chain(Chain {
        round_id: 0,
        ..green_chain()
    })
    .await;
    let store = StateStore::new(100);

    let o = build_orchestrator(&config(addr), store.clone(), Counters::default(), Arc::new(NoopJournal))
        .unwrap();

    let decision = o.run_cycle().await.unwrap();
    assert_eq!(decision.verdict, Verdict::Wait);
    assert!(decision.reason.contains("unverified"));

    // A very green grid reading is shown but does not unlock a buy.
    let carbon = store.snapshot(None).carbon.unwrap();
    assert!(!carbon.is_fdc_verified);
    assert_eq!(carbon.reference.map(|r| r.intensity), Some(12));
    assert!(carbon.data_source.starts_with("National Grid API"));
}
