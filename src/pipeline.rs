use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::anomaly::aggregator;
use crate::anomaly::scorer;
use crate::anomaly::types::{AnomalyScore, RiskScore, RiskTier};
use crate::config::ScoringConfig;
use crate::graph::builder;
use crate::graph::ring::{self, FraudRing};
use crate::graph::types::BatchGraph;
use crate::ingest::normalizer;
use crate::ingest::types::{Employee, RawRow, RowRejection};
use crate::sentinel::types::VerificationAttempt;

/// Cap on the suspects list, so a poisoned batch cannot flood the
/// dashboard.
const MAX_SUSPECTS: usize = 50;

/// One employee on the suspects list of a batch audit.
#[derive(Debug, Clone, Serialize)]
pub struct Suspect {
    pub employee_id: String,
    pub name: String,
    pub risk_score: f64,
    pub tier: RiskTier,
}

/// Headline counters for one audited batch.
#[derive(Debug, Clone, Serialize)]
pub struct AuditSummary {
    pub records_loaded: usize,
    pub records_rejected: usize,
    /// Bank accounts receiving salaries from more than one employee.
    pub ghost_families_detected: usize,
    /// National ids attached to more than one distinct name.
    pub identity_theft_detected: usize,
    /// Deceased or retired employees still drawing a salary.
    pub living_dead_detected: usize,
    pub total_flags: usize,
    /// Sum of gross salary over HIGH and CRITICAL employees.
    pub at_risk_amount: f64,
    pub suspects: Vec<Suspect>,
}

/// Immutable result of auditing one payroll batch. The batch owns every
/// entity derived from it; a new batch replaces the whole snapshot.
#[derive(Debug)]
pub struct BatchAudit {
    pub audited_at: DateTime<Utc>,
    pub employees: Vec<Employee>,
    pub rejections: Vec<RowRejection>,
    pub graph: BatchGraph,
    pub anomaly_scores: HashMap<String, AnomalyScore>,
    pub risk_scores: HashMap<String, RiskScore>,
    pub summary: AuditSummary,
}

impl BatchAudit {
    /// Read-only accessor for the assistant collaborator.
    pub fn risk_for(&self, employee_id: &str) -> Option<&RiskScore> {
        self.risk_scores.get(employee_id)
    }

    /// Extract the fraud ring seeded by all employees at or above the
    /// given tier. Runs against this snapshot only.
    pub fn ring_at_tier(&self, min_tier: RiskTier) -> FraudRing {
        let seeds = ring::seeds_at_or_above(&self.risk_scores, min_tier);
        ring::extract(&self.graph, &seeds)
    }
}

/// Orchestrates the audit stages over one batch:
/// 1. Row normalization
/// 2. Entity graph construction
/// 3. Per-group anomaly scoring
/// 4. Risk aggregation (folding in verification attempts)
/// 5. Summary counters
pub struct AuditEngine {
    scoring: ScoringConfig,
}

impl AuditEngine {
    pub fn new(scoring: ScoringConfig) -> Self {
        Self { scoring }
    }

    pub fn run_batch(
        &self,
        rows: &[RawRow],
        attempts: &HashMap<String, VerificationAttempt>,
    ) -> BatchAudit {
        let (employees, rejections) = normalizer::normalize_batch(rows);

        let graph = builder::build(&employees);

        let group_stats = scorer::group_stats(&employees, self.scoring.stddev_epsilon);
        let anomaly_scores: HashMap<String, AnomalyScore> =
            scorer::score_employees(&employees, &group_stats)
                .map(|score| (score.employee_id.clone(), score))
                .collect();

        let mut risk_scores: HashMap<String, RiskScore> = HashMap::new();
        for employee in &employees {
            let Some(anomaly) = anomaly_scores.get(&employee.id) else {
                continue;
            };
            let risk = aggregator::aggregate(
                employee,
                anomaly,
                &graph,
                attempts.get(&employee.id),
                &self.scoring,
            );
            if risk.tier == RiskTier::Critical {
                tracing::warn!(
                    employee_id = %employee.id,
                    risk_score = format!("{:.1}", risk.value),
                    "CRITICAL risk employee"
                );
            }
            risk_scores.insert(employee.id.clone(), risk);
        }

        let summary = summarize(&employees, &rejections, &graph, &risk_scores);
        tracing::info!(
            records = summary.records_loaded,
            rejected = summary.records_rejected,
            ghost_families = summary.ghost_families_detected,
            identity_theft = summary.identity_theft_detected,
            living_dead = summary.living_dead_detected,
            at_risk_amount = summary.at_risk_amount,
            "Batch audit complete"
        );

        BatchAudit {
            audited_at: Utc::now(),
            employees,
            rejections,
            graph,
            anomaly_scores,
            risk_scores,
            summary,
        }
    }
}

fn summarize(
    employees: &[Employee],
    rejections: &[RowRejection],
    graph: &BatchGraph,
    risk_scores: &HashMap<String, RiskScore>,
) -> AuditSummary {
    let ghost_families_detected = graph
        .depositors_by_account
        .values()
        .filter(|depositors| depositors.len() > 1)
        .count();

    let mut names_by_national_id: HashMap<&str, HashSet<&str>> = HashMap::new();
    for employee in employees {
        names_by_national_id
            .entry(employee.national_id.as_str())
            .or_default()
            .insert(employee.name.as_str());
    }
    let identity_theft_detected = names_by_national_id
        .values()
        .filter(|names| names.len() > 1)
        .count();

    let living_dead_detected = employees
        .iter()
        .filter(|e| {
            let name = e.name.to_uppercase();
            name.contains("DECEASED") || name.contains("RETIRED")
        })
        .count();

    let mut seen: HashSet<&str> = HashSet::new();
    let mut at_risk_amount = 0.0;
    let mut suspects: Vec<Suspect> = Vec::new();
    for employee in employees {
        if !seen.insert(employee.id.as_str()) {
            continue;
        }
        let Some(risk) = risk_scores.get(&employee.id) else {
            continue;
        };
        if risk.tier >= RiskTier::High {
            at_risk_amount += employee.gross_salary;
        }
        if risk.value > 0.0 {
            suspects.push(Suspect {
                employee_id: employee.id.clone(),
                name: employee.name.clone(),
                risk_score: risk.value,
                tier: risk.tier,
            });
        }
    }
    suspects.sort_by(|a, b| {
        b.risk_score
            .partial_cmp(&a.risk_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.employee_id.cmp(&b.employee_id))
    });
    suspects.truncate(MAX_SUSPECTS);

    AuditSummary {
        records_loaded: employees.len(),
        records_rejected: rejections.len(),
        ghost_families_detected,
        identity_theft_detected,
        living_dead_detected,
        total_flags: ghost_families_detected + identity_theft_detected + living_dead_detected,
        at_risk_amount,
        suspects,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sentinel::types::Verdict;

    fn raw_row(id: &str, name: &str, job_group: &str, salary: &str, account: &str) -> RawRow {
        let mut row = RawRow::new();
        row.insert("employee_id".to_string(), id.to_string());
        row.insert("name".to_string(), name.to_string());
        row.insert("national_id".to_string(), format!("NID-{}", id));
        row.insert("job_group".to_string(), job_group.to_string());
        row.insert("department".to_string(), "Health".to_string());
        row.insert("gross_salary".to_string(), salary.to_string());
        row.insert("bank_account_id".to_string(), account.to_string());
        row
    }

    fn no_attempts() -> HashMap<String, VerificationAttempt> {
        HashMap::new()
    }

    #[test]
    fn test_salary_outlier_leads_suspects() {
        let rows = vec![
            raw_row("E1", "A", "G1", "30000", "ACC1"),
            raw_row("E2", "B", "G1", "31000", "ACC2"),
            raw_row("E3", "C", "G1", "29500", "ACC3"),
            raw_row("E4", "D", "G1", "30500", "ACC4"),
            raw_row("E5", "E", "G1", "95000", "ACC5"),
        ];
        let audit = AuditEngine::new(ScoringConfig::default()).run_batch(&rows, &no_attempts());

        // Only the 95000 salary deviates upward.
        let outlier = &audit.anomaly_scores["E5"];
        assert!(outlier.z_score > 1.5);
        for id in ["E1", "E2", "E3", "E4"] {
            assert!(audit.anomaly_scores[id].z_score < 0.0);
        }

        assert_eq!(audit.summary.suspects[0].employee_id, "E5");
    }

    #[test]
    fn test_ghost_family_counter() {
        let rows = vec![
            raw_row("E1", "A", "G1", "30000", "SHARED"),
            raw_row("E2", "B", "G1", "31000", "SHARED"),
            raw_row("E3", "C", "G1", "29500", "SHARED"),
            raw_row("E4", "D", "G1", "30500", "OWN"),
        ];
        let audit = AuditEngine::new(ScoringConfig::default()).run_batch(&rows, &no_attempts());
        assert_eq!(audit.summary.ghost_families_detected, 1);
    }

    #[test]
    fn test_identity_theft_counter() {
        let mut stolen = raw_row("E2", "Different Name", "G1", "31000", "ACC2");
        stolen.insert("national_id".to_string(), "NID-E1".to_string());
        let rows = vec![raw_row("E1", "Original Name", "G1", "30000", "ACC1"), stolen];
        let audit = AuditEngine::new(ScoringConfig::default()).run_batch(&rows, &no_attempts());
        assert_eq!(audit.summary.identity_theft_detected, 1);
    }

    #[test]
    fn test_living_dead_counter() {
        let rows = vec![
            raw_row("E1", "John Doe (DECEASED)", "G1", "30000", "ACC1"),
            raw_row("E2", "Mary Atieno", "G1", "31000", "ACC2"),
        ];
        let audit = AuditEngine::new(ScoringConfig::default()).run_batch(&rows, &no_attempts());
        assert_eq!(audit.summary.living_dead_detected, 1);
        assert_eq!(audit.summary.total_flags, 1);
    }

    #[test]
    fn test_rejections_are_reported_not_dropped() {
        let mut bad = raw_row("E2", "B", "G1", "oops", "ACC2");
        bad.insert("gross_salary".to_string(), "oops".to_string());
        let rows = vec![raw_row("E1", "A", "G1", "30000", "ACC1"), bad];
        let audit = AuditEngine::new(ScoringConfig::default()).run_batch(&rows, &no_attempts());
        assert_eq!(audit.summary.records_loaded, 1);
        assert_eq!(audit.summary.records_rejected, 1);
        assert_eq!(audit.rejections[0].row_index, 1);
    }

    #[test]
    fn test_at_risk_amount_sums_high_and_critical() {
        // Salary-only weighting with a steep scale pushes the outlier
        // into CRITICAL.
        let scoring = ScoringConfig {
            salary_deviation_weight: 1.0,
            shared_account_weight: 0.0,
            verification_weight: 0.0,
            z_score_scale: 60.0,
            ..ScoringConfig::default()
        };
        let rows = vec![
            raw_row("E1", "A", "G1", "30000", "ACC1"),
            raw_row("E2", "B", "G1", "31000", "ACC2"),
            raw_row("E3", "C", "G1", "29500", "ACC3"),
            raw_row("E4", "D", "G1", "30500", "ACC4"),
            raw_row("E5", "E", "G1", "95000", "ACC5"),
        ];
        let audit = AuditEngine::new(scoring).run_batch(&rows, &no_attempts());
        assert_eq!(audit.risk_scores["E5"].tier, RiskTier::Critical);
        assert_eq!(audit.summary.at_risk_amount, 95000.0);
    }

    #[test]
    fn test_verification_attempt_folds_into_risk() {
        let rows = vec![
            raw_row("E1", "A", "G1", "30000", "ACC1"),
            raw_row("E2", "B", "G1", "30000", "ACC2"),
        ];
        let mut attempts = HashMap::new();
        attempts.insert(
            "E1".to_string(),
            VerificationAttempt {
                employee_id: "E1".to_string(),
                claimed_lat: 0.0,
                claimed_lon: 0.0,
                registered_station: "KICC, Nairobi".to_string(),
                distance_km: 510.0,
                moire_energy: 0.0,
                liveness_verified: false,
                verdict: Verdict::LocationFailed,
                trust_score: 0.0,
                attempted_at: Utc::now(),
            },
        );
        let audit = AuditEngine::new(ScoringConfig::default()).run_batch(&rows, &attempts);
        // (1 - 0.0) * 100 * 0.2 weight.
        assert_eq!(audit.risk_scores["E1"].value, 20.0);
        assert_eq!(audit.risk_scores["E2"].value, 0.0);
    }

    #[test]
    fn test_ring_at_tier_covers_shared_account() {
        let scoring = ScoringConfig {
            salary_deviation_weight: 1.0,
            shared_account_weight: 0.0,
            verification_weight: 0.0,
            z_score_scale: 60.0,
            ..ScoringConfig::default()
        };
        // E5 is HIGH by salary alone and shares an account with E1, E2.
        let rows = vec![
            raw_row("E1", "A", "G1", "30000", "SHARED"),
            raw_row("E2", "B", "G1", "31000", "SHARED"),
            raw_row("E3", "C", "G1", "29500", "ACC3"),
            raw_row("E4", "D", "G1", "30500", "ACC4"),
            raw_row("E5", "E", "G1", "95000", "SHARED"),
        ];
        let audit = AuditEngine::new(scoring).run_batch(&rows, &no_attempts());
        assert!(audit.risk_scores["E5"].tier >= RiskTier::High);

        let ring = audit.ring_at_tier(RiskTier::High);
        assert_eq!(ring.employee_ids, vec!["E1", "E2", "E5"]);
        assert_eq!(ring.hub_ids.len(), 1);
    }

    #[test]
    fn test_ring_monotone_in_tier_threshold() {
        let rows = vec![
            raw_row("E1", "A", "G1", "30000", "SHARED"),
            raw_row("E2", "B", "G1", "31000", "SHARED"),
            raw_row("E5", "E", "G1", "95000", "ACC5"),
        ];
        let audit = AuditEngine::new(ScoringConfig::default()).run_batch(&rows, &no_attempts());
        let strict = audit.ring_at_tier(RiskTier::High);
        let loose = audit.ring_at_tier(RiskTier::Low);
        for id in &strict.employee_ids {
            assert!(loose.employee_ids.contains(id));
        }
        assert!(loose.employee_ids.len() >= strict.employee_ids.len());
    }
}
