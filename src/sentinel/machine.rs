use chrono::Utc;

use crate::config::{SentinelConfig, StationConfig};

use super::geo;
use super::types::{CheckIn, LivenessEvidence, Verdict, VerificationAttempt};

/// Flow states for one verification attempt. All four verdicts are
/// terminal; there is no retry loop inside the machine.
#[derive(Debug)]
enum State {
    Initiated,
    LocationCheck,
    LivenessCheck { distance_km: f64 },
    Terminal(Outcome),
}

#[derive(Debug)]
struct Outcome {
    verdict: Verdict,
    distance_km: f64,
    liveness_confidence: f64,
}

/// Presence verification: geofence first, then liveness. Holds only
/// configuration, so attempts are independent and can run concurrently.
pub struct Sentinel {
    config: SentinelConfig,
}

impl Sentinel {
    pub fn new(config: SentinelConfig) -> Self {
        Self { config }
    }

    /// Drive one check-in attempt to a terminal verdict. Each transition
    /// moves strictly forward, so the loop is bounded.
    pub fn verify(&self, check_in: &CheckIn, station: &StationConfig) -> VerificationAttempt {
        let mut state = State::Initiated;

        let outcome = loop {
            state = match state {
                State::Initiated => State::LocationCheck,
                State::LocationCheck => {
                    let distance_km =
                        geo::haversine_km(check_in.lat, check_in.lon, station.lat, station.lon);
                    if distance_km > station.radius_km {
                        State::Terminal(Outcome {
                            verdict: Verdict::LocationFailed,
                            distance_km,
                            liveness_confidence: 0.0,
                        })
                    } else {
                        State::LivenessCheck { distance_km }
                    }
                }
                State::LivenessCheck { distance_km } => {
                    let (verdict, confidence) = self.evaluate_liveness(&check_in.evidence);
                    State::Terminal(Outcome {
                        verdict,
                        distance_km,
                        liveness_confidence: confidence,
                    })
                }
                State::Terminal(outcome) => break outcome,
            };
        };

        // Trust is only meaningful at the terminal state: liveness
        // confidence shrunk by how close to the fence the claim was.
        let distance_margin = (1.0 - outcome.distance_km / station.radius_km).clamp(0.0, 1.0);
        let trust_score = (outcome.liveness_confidence * distance_margin).clamp(0.0, 1.0);

        let attempt = VerificationAttempt {
            employee_id: check_in.employee_id.clone(),
            claimed_lat: check_in.lat,
            claimed_lon: check_in.lon,
            registered_station: station.name.clone(),
            distance_km: outcome.distance_km,
            moire_energy: check_in.evidence.moire_energy,
            liveness_verified: outcome.verdict == Verdict::Verified,
            verdict: outcome.verdict,
            trust_score,
            attempted_at: Utc::now(),
        };

        tracing::info!(
            employee_id = %attempt.employee_id,
            verdict = attempt.verdict.as_str(),
            distance_km = format!("{:.3}", attempt.distance_km),
            trust_score = format!("{:.2}", attempt.trust_score),
            "Verification attempt finalized"
        );
        attempt
    }

    /// Evaluate liveness evidence. Energy above the spoof threshold means
    /// a screen-replay artifact; evidence below the confidence threshold
    /// is inconclusive rather than fraudulent. A failed active challenge
    /// is always inconclusive.
    fn evaluate_liveness(&self, evidence: &LivenessEvidence) -> (Verdict, f64) {
        if evidence.moire_energy > self.config.spoof_energy_threshold {
            return (Verdict::SpoofSuspected, 0.0);
        }

        let mut confidence =
            (1.0 - evidence.moire_energy / self.config.spoof_energy_threshold).clamp(0.0, 1.0);

        match evidence.challenge_passed {
            Some(false) => return (Verdict::LivenessFailed, confidence),
            Some(true) => {
                confidence = (confidence + self.config.active_challenge_bonus).min(1.0);
            }
            None => {}
        }

        if confidence < self.config.liveness_confidence_threshold {
            (Verdict::LivenessFailed, confidence)
        } else {
            (Verdict::Verified, confidence)
        }
    }
}
