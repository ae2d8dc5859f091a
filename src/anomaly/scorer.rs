use std::collections::HashMap;

use crate::ingest::types::Employee;

use super::types::AnomalyScore;

/// Salary distribution of one job group, fully materialized before any
/// member's z-score can be computed.
#[derive(Debug, Clone)]
pub struct GroupStats {
    pub count: usize,
    pub mean: f64,
    pub stddev: f64,
}

/// Per-job-group salary mean and population standard deviation.
/// The stddev is floored at `epsilon` for groups of two or more so a
/// zero-variance group cannot blow up the division.
pub fn group_stats(employees: &[Employee], epsilon: f64) -> HashMap<String, GroupStats> {
    let mut salaries: HashMap<&str, Vec<f64>> = HashMap::new();
    for employee in employees {
        salaries
            .entry(employee.job_group.as_str())
            .or_default()
            .push(employee.gross_salary);
    }

    salaries
        .into_iter()
        .map(|(group, values)| {
            let n = values.len() as f64;
            let mean = values.iter().sum::<f64>() / n;
            let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
            let stddev = if values.len() >= 2 {
                variance.sqrt().max(epsilon)
            } else {
                0.0
            };
            (
                group.to_string(),
                GroupStats {
                    count: values.len(),
                    mean,
                    stddev,
                },
            )
        })
        .collect()
}

/// Lazy, restartable scoring pass: one `AnomalyScore` per employee, in
/// input order, no side effects. Single-member groups get z = 0 and the
/// insufficient-peers flag instead of being treated as anomalous.
pub fn score_employees<'a>(
    employees: &'a [Employee],
    stats: &'a HashMap<String, GroupStats>,
) -> impl Iterator<Item = AnomalyScore> + 'a {
    employees.iter().map(move |employee| {
        // Stats are derived from the same employee slice, so a miss can
        // only mean a foreign stats map; treat it like a peerless group.
        let group = match stats.get(&employee.job_group) {
            Some(group) => group,
            None => {
                return AnomalyScore {
                    employee_id: employee.id.clone(),
                    job_group: employee.job_group.clone(),
                    z_score: 0.0,
                    group_mean: employee.gross_salary,
                    group_stddev: 0.0,
                    insufficient_peers: true,
                }
            }
        };
        if group.count < 2 {
            return AnomalyScore {
                employee_id: employee.id.clone(),
                job_group: employee.job_group.clone(),
                z_score: 0.0,
                group_mean: group.mean,
                group_stddev: 0.0,
                insufficient_peers: true,
            };
        }
        AnomalyScore {
            employee_id: employee.id.clone(),
            job_group: employee.job_group.clone(),
            z_score: (employee.gross_salary - group.mean) / group.stddev,
            group_mean: group.mean,
            group_stddev: group.stddev,
            insufficient_peers: false,
        }
    })
}

/// Convenience pass for presentation: scores for the whole batch, sorted
/// by |z| descending.
pub fn score_batch(employees: &[Employee], epsilon: f64) -> Vec<AnomalyScore> {
    let stats = group_stats(employees, epsilon);
    let mut scores: Vec<AnomalyScore> = score_employees(employees, &stats).collect();
    scores.sort_by(|a, b| {
        b.z_score
            .abs()
            .partial_cmp(&a.z_score.abs())
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    scores
}
