use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Biometric evidence accompanying a check-in. The moire energy comes
/// from the mobile collaborator's FFT pass over the camera frame; high
/// energy means periodic screen-pixel noise, i.e. a photo of a screen.
#[derive(Debug, Clone, Deserialize)]
pub struct LivenessEvidence {
    pub moire_energy: f64,
    /// Whether the optional active challenge (blink/turn prompt) was
    /// completed. None when no challenge was issued.
    pub challenge_passed: Option<bool>,
}

/// One check-in to verify: a claimed location plus liveness evidence.
#[derive(Debug, Clone)]
pub struct CheckIn {
    pub employee_id: String,
    pub lat: f64,
    pub lon: f64,
    pub evidence: LivenessEvidence,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    Verified,
    LocationFailed,
    LivenessFailed,
    SpoofSuspected,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Verified => "VERIFIED",
            Self::LocationFailed => "LOCATION_FAILED",
            Self::LivenessFailed => "LIVENESS_FAILED",
            Self::SpoofSuspected => "SPOOF_SUSPECTED",
        }
    }
}

/// A finalized verification attempt. Immutable once the state machine
/// reaches a terminal state; retries produce new attempts.
#[derive(Debug, Clone, Serialize)]
pub struct VerificationAttempt {
    pub employee_id: String,
    pub claimed_lat: f64,
    pub claimed_lon: f64,
    pub registered_station: String,
    pub distance_km: f64,
    pub moire_energy: f64,
    pub liveness_verified: bool,
    pub verdict: Verdict,
    /// Confidence in [0, 1] that the attempt is genuine. Computed once,
    /// at the terminal state.
    pub trust_score: f64,
    pub attempted_at: DateTime<Utc>,
}
