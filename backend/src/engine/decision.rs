//! Decision engine.
//!
//! A pure function of (price reading, verification, thresholds, now). Rules are
//! evaluated in order and the first match wins:
//!
//! 1. price feed failed, or price older than the oracle timeout → HALT_ACTIVITY
//! 2. verification ERROR or UNVERIFIED                           → WAIT
//! 3. VERIFIED and intensity >= amber threshold                  → HALT_ACTIVITY
//! 4. GREEN_VERIFIED and price < target price                    → EXECUTE_BUY
//! 5. otherwise                                                  → WAIT
//!
//! Staleness is checked before anything else, so a stale oracle halts even when
//! carbon is green and the price is attractive.

use tracing::{debug, instrument};

use crate::engine::types::{
    Decision, InputSnapshot, Thresholds, Verdict, Verification, VerificationStatus,
};
use crate::feeds::{FeedError, PriceReading};

#[instrument(
    target = "engine",
    skip_all,
    fields(status = %verification.status, now_secs = now_secs)
)]
pub fn decide(
    price: Result<&PriceReading, &FeedError>,
    verification: &Verification,
    thresholds: &Thresholds,
    now_secs: u64,
) -> Decision {
    let inputs = InputSnapshot {
        asset: price.as_ref().ok().map(|p| p.asset),
        price: price.as_ref().ok().map(|p| p.price),
        price_age_secs: price.as_ref().ok().map(|p| p.age_secs(now_secs)),
        price_error: price.as_ref().err().map(|e| e.to_string()),
        status: verification.status,
        round_id: verification.round_id,
        intensity: verification.intensity,
    };

    let (verdict, reason) = evaluate(price, verification, thresholds, now_secs);

    debug!(verdict = %verdict, %reason, "decision evaluated");

    Decision {
        verdict,
        reason,
        inputs,
        decided_at: now_secs,
    }
}

fn evaluate(
    price: Result<&PriceReading, &FeedError>,
    verification: &Verification,
    t: &Thresholds,
    now_secs: u64,
) -> (Verdict, String) {
    // Rule 1: oracle availability and freshness.
    let reading = match price {
        Ok(r) => r,
        Err(e) => {
            return (
                Verdict::HaltActivity,
                format!("Oracle unavailable: price feed failed ({e}). Halting for safety."),
            );
        }
    };

    let age = reading.age_secs(now_secs);
    if age > t.oracle_timeout_secs {
        return (
            Verdict::HaltActivity,
            format!(
                "Oracle timeout: {} price is {age}s old (max {}s). Halting for safety.",
                reading.asset, t.oracle_timeout_secs
            ),
        );
    }

    // Rule 2: untrusted carbon data is never acted on.
    match verification.status {
        VerificationStatus::Error => {
            return (
                Verdict::Wait,
                format!(
                    "Carbon data unverified: attestation check failed ({}). Waiting for consensus.",
                    verification.detail
                ),
            );
        }
        VerificationStatus::Unverified => {
            return (
                Verdict::Wait,
                format!(
                    "Carbon data unverified: {}. Waiting for consensus.",
                    verification.detail
                ),
            );
        }
        VerificationStatus::Verified | VerificationStatus::GreenVerified => {}
    }

    let intensity = verification.intensity.unwrap_or_default();

    // Rule 3: attested high carbon.
    if verification.status == VerificationStatus::Verified && intensity >= t.amber_threshold {
        return (
            Verdict::HaltActivity,
            format!(
                "High carbon: {intensity} gCO2/kWh >= amber threshold {}. Halting activity.",
                t.amber_threshold
            ),
        );
    }

    // Rule 4: verified green and cheap.
    if verification.status == VerificationStatus::GreenVerified && reading.price < t.target_price
    {
        return (
            Verdict::ExecuteBuy,
            format!(
                "Green verified ({}) and {} price ${} below target ${}.",
                verification.detail, reading.asset, reading.price, t.target_price
            ),
        );
    }

    // Rule 5: name the condition that failed. Carbon wording comes from the
    // gate's detail so the threshold quoted is the one that set the status.
    if verification.status == VerificationStatus::GreenVerified {
        (
            Verdict::Wait,
            format!(
                "{} price ${} is at or above target ${}. Waiting for better entry.",
                reading.asset, reading.price, t.target_price
            ),
        )
    } else {
        (
            Verdict::Wait,
            format!(
                "Carbon not green: {}. Waiting for green energy.",
                verification.detail
            ),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::verification::verify;
    use crate::feeds::{Asset, AttestationReading};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    const NOW: u64 = 1_700_000_000;

    fn price(p: Decimal, age: u64) -> PriceReading {
        PriceReading {
            asset: Asset::Xrp,
            price: p,
            observed_at: NOW - age,
        }
    }

    fn attested(round_id: u64, intensity: u64) -> Verification {
        verify(
            Ok(&AttestationReading {
                round_id,
                intensity,
                verified: true,
            }),
            Thresholds::default().green_threshold,
        )
    }

    fn run(p: &PriceReading, v: &Verification) -> Decision {
        decide(Ok(p), v, &Thresholds::default(), NOW)
    }

    #[test]
    fn scenario_green_and_cheap_executes_buy() {
        let d = run(&price(dec!(1.05), 10), &attested(7, 30));
        assert_eq!(d.verdict, Verdict::ExecuteBuy);
        assert_eq!(d.inputs.round_id, Some(7));
        assert_eq!(d.inputs.price_age_secs, Some(10));
    }

    #[test]
    fn scenario_round_zero_waits_unverified() {
        let d = run(&price(dec!(1.05), 10), &attested(0, 0));
        assert_eq!(d.verdict, Verdict::Wait);
        assert!(d.reason.to_lowercase().contains("unverified"));
    }

    #[test]
    fn scenario_price_above_target_waits() {
        let d = run(&price(dec!(1.20), 10), &attested(7, 30));
        assert_eq!(d.verdict, Verdict::Wait);
        assert!(d.reason.contains("above target"));
    }

    #[test]
    fn scenario_stale_price_halts() {
        let d = run(&price(dec!(1.05), 200), &attested(7, 30));
        assert_eq!(d.verdict, Verdict::HaltActivity);
        assert!(d.reason.to_lowercase().contains("oracle timeout"));
    }

    #[test]
    fn scenario_high_carbon_halts() {
        let d = run(&price(dec!(1.05), 10), &attested(7, 160));
        assert_eq!(d.verdict, Verdict::HaltActivity);
        assert!(d.reason.to_lowercase().contains("high carbon"));
    }

    #[test]
    fn price_equal_to_target_is_not_a_buy() {
        let d = run(&price(dec!(1.10), 10), &attested(7, 30));
        assert_eq!(d.verdict, Verdict::Wait);
    }

    #[test]
    fn age_exactly_at_timeout_is_still_fresh() {
        let d = run(&price(dec!(1.05), 180), &attested(7, 30));
        assert_eq!(d.verdict, Verdict::ExecuteBuy);
    }

    #[test]
    fn amber_band_waits_for_green() {
        let d = run(&price(dec!(1.05), 10), &attested(7, 100));
        assert_eq!(d.verdict, Verdict::Wait);
        assert!(d.reason.contains("not green"));
    }

    #[test]
    fn price_feed_failure_halts() {
        let err = FeedError::NotConfigured("price oracle");
        let d = decide(Err(&err), &attested(7, 30), &Thresholds::default(), NOW);

        assert_eq!(d.verdict, Verdict::HaltActivity);
        assert!(d.reason.contains("Oracle unavailable"));
        assert_eq!(d.inputs.price, None);
        assert!(d.inputs.price_error.is_some());
    }

    #[test]
    fn attestation_error_waits() {
        let err = FeedError::InvalidResponse("bad".into());
        let v = verify(Err(&err), 50);
        let d = run(&price(dec!(1.05), 10), &v);

        assert_eq!(d.verdict, Verdict::Wait);
        assert!(d.reason.contains("unverified"));
    }

    #[test]
    fn stale_price_wins_over_green_and_cheap() {
        let d = run(&price(dec!(0.50), 181), &attested(7, 5));
        assert_eq!(d.verdict, Verdict::HaltActivity);
    }

    #[test]
    fn future_timestamp_counts_as_fresh() {
        let p = PriceReading {
            asset: Asset::Xrp,
            price: dec!(1.0),
            observed_at: NOW + 30,
        };
        let d = run(&p, &attested(7, 30));
        assert_eq!(d.inputs.price_age_secs, Some(0));
        assert_eq!(d.verdict, Verdict::ExecuteBuy);
    }

    #[test]
    fn thresholds_come_from_configuration() {
        let t = Thresholds {
            oracle_timeout_secs: 5,
            target_price: dec!(2.00),
            green_threshold: 100,
            amber_threshold: 300,
        };

        let v = verify(
            Ok(&AttestationReading {
                round_id: 7,
                intensity: 80,
                verified: true,
            }),
            t.green_threshold,
        );

        let d = decide(Ok(&price(dec!(1.50), 10)), &v, &t, NOW);
        assert_eq!(d.verdict, Verdict::HaltActivity, "10s exceeds the 5s timeout");

        let d = decide(Ok(&price(dec!(1.50), 1)), &v, &t, NOW);
        assert_eq!(d.verdict, Verdict::ExecuteBuy, "80 is green under a 100 gate");
        assert!(d.reason.contains("80 < 100"));
    }

    #[test]
    fn not_green_reason_quotes_the_gate_threshold() {
        // gate at 50, engine configured with 100: the reason must not claim 80 >= 100
        let t = Thresholds {
            green_threshold: 100,
            ..Thresholds::default()
        };
        let d = decide(Ok(&price(dec!(1.05), 10)), &attested(7, 80), &t, NOW);

        assert_eq!(d.verdict, Verdict::Wait);
        assert!(d.reason.contains("80 >= 50"), "{}", d.reason);
        assert!(!d.reason.contains("100"), "{}", d.reason);
    }
}
