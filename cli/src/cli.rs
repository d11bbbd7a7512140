use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;

use green_treasury::engine::{Decision, Thresholds, Verification, decide, verify};
use green_treasury::feeds::{Asset, AttestationReading, FeedError, PriceReading};

#[derive(Debug, Parser)]
#[clap(name = "treasury", version)]
pub struct Cli {
    /// Base URL of a running service
    #[clap(long, global = true, default_value = "http://localhost:3000")]
    pub url: String,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the verification gate and decision engine on synthetic inputs
    Evaluate(EvaluateArgs),
    /// Show whether the agents are running
    Status,
    /// Start the agents
    Start,
    /// Stop the agents (the service keeps serving)
    Stop,
    /// Print the current snapshot
    Snapshot,
    /// Print recent journaled decisions
    Journal {
        #[clap(long, default_value = "20")]
        limit: usize,
    },
}

#[derive(Debug, Clone, Args)]
pub struct EvaluateArgs {
    #[clap(long, default_value = "XRP")]
    pub asset: Asset,

    /// USD price; omit to simulate a failed price feed
    #[clap(long)]
    pub price: Option<Decimal>,

    /// Price age in seconds
    #[clap(long, default_value = "0")]
    pub age: u64,

    /// Attestation round id (0 = nothing attested)
    #[clap(long, default_value = "0")]
    pub round: u64,

    /// Carbon intensity in gCO2/kWh (0 = no data)
    #[clap(long, default_value = "0")]
    pub intensity: u64,

    /// Simulate a failed attestation feed
    #[clap(long)]
    pub attestation_error: bool,

    #[clap(long, default_value = "1.10")]
    pub target_price: Decimal,

    #[clap(long, default_value = "50")]
    pub green_threshold: u64,

    #[clap(long, default_value = "150")]
    pub amber_threshold: u64,

    #[clap(long, default_value = "180")]
    pub oracle_timeout: u64,
}

impl EvaluateArgs {
    pub fn thresholds(&self) -> Thresholds {
        Thresholds {
            oracle_timeout_secs: self.oracle_timeout,
            target_price: self.target_price,
            green_threshold: self.green_threshold,
            amber_threshold: self.amber_threshold,
        }
    }
}

/// Evaluates one synthetic cycle at `now_secs`.
pub fn evaluate(args: &EvaluateArgs, now_secs: u64) -> (Verification, Decision) {
    let thresholds = args.thresholds();

    let price = args
        .price
        .map(|price| PriceReading {
            asset: args.asset,
            price,
            observed_at: now_secs.saturating_sub(args.age),
        })
        .ok_or(FeedError::NotConfigured("price oracle"));

    let attestation = if args.attestation_error {
        Err(FeedError::InvalidResponse("simulated attestation failure".into()))
    } else {
        Ok(AttestationReading {
            round_id: args.round,
            intensity: args.intensity,
            verified: args.round > 0 && args.intensity > 0,
        })
    };

    let verification = verify(attestation.as_ref(), thresholds.green_threshold);
    let decision = decide(price.as_ref(), &verification, &thresholds, now_secs);

    (verification, decision)
}
