pub mod cli;

use anyhow::Context;
use clap::Parser;
use serde_json::{Value, json};

use cli::*;
use green_treasury::time::now_secs;

async fn get(url: &str) -> anyhow::Result<Value> {
    let resp = reqwest::get(url).await.with_context(|| format!("GET {url}"))?;
    Ok(resp.error_for_status()?.json().await?)
}

async fn post(url: &str) -> anyhow::Result<Value> {
    let resp = reqwest::Client::new()
        .post(url)
        .send()
        .await
        .with_context(|| format!("POST {url}"))?;
    Ok(resp.error_for_status()?.json().await?)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let base = cli.url.trim_end_matches('/');

    let out = match &cli.command {
        Command::Evaluate(args) => {
            let (verification, decision) = evaluate(args, now_secs());
            json!({ "verification": verification, "decision": decision })
        }
        Command::Status => get(&format!("{base}/api/agents/status")).await?,
        Command::Start => post(&format!("{base}/api/agents/start")).await?,
        Command::Stop => post(&format!("{base}/api/agents/stop")).await?,
        Command::Snapshot => get(&format!("{base}/api/data")).await?,
        Command::Journal { limit } => get(&format!("{base}/api/journal?limit={limit}")).await?,
    };

    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}
