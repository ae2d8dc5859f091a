use crate::config::ScoringConfig;
use crate::graph::types::BatchGraph;
use crate::ingest::types::Employee;
use crate::sentinel::types::VerificationAttempt;

use super::types::{AnomalyScore, RiskScore, RiskTier, SignalContribution};

pub const SIGNAL_SALARY_DEVIATION: &str = "salary_deviation";
pub const SIGNAL_SHARED_ACCOUNT: &str = "shared_account";
pub const SIGNAL_VERIFICATION: &str = "verification";

/// Merge the anomaly score, shared-account connectivity, and the latest
/// verification attempt into one composite risk score. Pure function of
/// its inputs; the graph is only read.
///
/// Each signal is normalized into [0, 100] before weighting, so the
/// clamped weighted sum is monotone non-decreasing in every raw signal.
pub fn aggregate(
    employee: &Employee,
    anomaly: &AnomalyScore,
    graph: &BatchGraph,
    verification: Option<&VerificationAttempt>,
    config: &ScoringConfig,
) -> RiskScore {
    let salary_signal = (anomaly.z_score.abs() * config.z_score_scale).min(100.0);

    let peers = graph.shared_account_peers(&employee.bank_account_id) as f64;
    let account_signal = (peers * config.shared_peer_scale).min(100.0);

    let verification_signal = verification
        .map(|attempt| (1.0 - attempt.trust_score) * 100.0)
        .unwrap_or(0.0);

    let contributing_signals = vec![
        SignalContribution {
            name: SIGNAL_SALARY_DEVIATION,
            weight: config.salary_deviation_weight,
            raw_value: salary_signal,
        },
        SignalContribution {
            name: SIGNAL_SHARED_ACCOUNT,
            weight: config.shared_account_weight,
            raw_value: account_signal,
        },
        SignalContribution {
            name: SIGNAL_VERIFICATION,
            weight: config.verification_weight,
            raw_value: verification_signal,
        },
    ];

    let value = contributing_signals
        .iter()
        .map(|s| s.weight * s.raw_value)
        .sum::<f64>()
        .clamp(0.0, 100.0);

    RiskScore {
        employee_id: employee.id.clone(),
        value,
        tier: RiskTier::from_value(value, config),
        contributing_signals,
    }
}
