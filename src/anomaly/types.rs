use std::str::FromStr;

use serde::Serialize;

use crate::config::ScoringConfig;

/// Per-employee salary deviation within its job group.
#[derive(Debug, Clone, Serialize)]
pub struct AnomalyScore {
    pub employee_id: String,
    pub job_group: String,
    /// (gross_salary − group_mean) / group_stddev, with the stddev floored
    /// at a small epsilon.
    pub z_score: f64,
    pub group_mean: f64,
    pub group_stddev: f64,
    /// Set for single-member job groups: z is 0 because there is no basis
    /// for deviation, not because the salary looks normal.
    pub insufficient_peers: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskTier {
    Low,
    Moderate,
    High,
    Critical,
}

impl RiskTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Moderate => "MODERATE",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        }
    }

    pub fn from_value(value: f64, config: &ScoringConfig) -> Self {
        if value >= config.critical_threshold {
            Self::Critical
        } else if value >= config.high_threshold {
            Self::High
        } else if value >= config.moderate_threshold {
            Self::Moderate
        } else {
            Self::Low
        }
    }
}

impl FromStr for RiskTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "LOW" => Ok(Self::Low),
            "MODERATE" => Ok(Self::Moderate),
            "HIGH" => Ok(Self::High),
            "CRITICAL" => Ok(Self::Critical),
            other => Err(format!("unknown risk tier '{}'", other)),
        }
    }
}

/// One weighted input to a composite risk score, kept for explainability.
#[derive(Debug, Clone, Serialize)]
pub struct SignalContribution {
    pub name: &'static str,
    pub weight: f64,
    pub raw_value: f64,
}

/// Composite, tiered risk for one employee. Never mutated in place; a
/// recomputation produces a fresh score that supersedes this one.
#[derive(Debug, Clone, Serialize)]
pub struct RiskScore {
    pub employee_id: String,
    pub value: f64,
    pub tier: RiskTier,
    pub contributing_signals: Vec<SignalContribution>,
}
