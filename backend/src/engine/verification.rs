//! Verification gate: raw attestation read → trust status.
//!
//! Rules are evaluated in order and the first match wins:
//! 1. feed failure                 → ERROR
//! 2. round id == 0                → UNVERIFIED (nothing attested yet)
//! 3. intensity == 0               → UNVERIFIED (round without data)
//! 4. intensity < green threshold  → GREEN_VERIFIED
//! 5. otherwise                    → VERIFIED
//!
//! Rule 3 must precede rule 4: a round can exist with zero intensity and that
//! is never read as low carbon.

use crate::engine::types::{Verification, VerificationStatus};
use crate::feeds::{AttestationReading, FeedError};

pub fn verify(
    reading: Result<&AttestationReading, &FeedError>,
    green_threshold: u64,
) -> Verification {
    let reading = match reading {
        Ok(r) => r,
        Err(e) => {
            return Verification {
                status: VerificationStatus::Error,
                round_id: None,
                intensity: None,
                detail: format!("attestation feed failed: {e}"),
            };
        }
    };

    let round = reading.round_id;
    let intensity = reading.intensity;

    let (status, detail) = if round == 0 {
        (
            VerificationStatus::Unverified,
            "no attestation processed yet".to_string(),
        )
    } else if intensity == 0 {
        (
            VerificationStatus::Unverified,
            format!("round {round} found, no intensity data"),
        )
    } else if intensity < green_threshold {
        (
            VerificationStatus::GreenVerified,
            format!("round {round} attested low carbon ({intensity} < {green_threshold} gCO2/kWh)"),
        )
    } else {
        (
            VerificationStatus::Verified,
            format!("round {round} attested, not green ({intensity} >= {green_threshold} gCO2/kWh)"),
        )
    };

    Verification {
        status,
        round_id: (round > 0).then_some(round),
        intensity: (round > 0).then_some(intensity),
        detail,
    }
}
