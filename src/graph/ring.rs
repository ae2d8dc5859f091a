use std::collections::{HashMap, HashSet, VecDeque};

use serde::Serialize;

use crate::anomaly::types::{RiskScore, RiskTier};

use super::types::{BatchGraph, Edge, NodeKind};

/// A connected cluster of employees and the shared infrastructure linking
/// them, tagged with the seeds that triggered its extraction. Ephemeral:
/// recomputed on demand from a batch snapshot, never stored.
#[derive(Debug, Clone, Serialize)]
pub struct FraudRing {
    pub seed_ids: Vec<String>,
    pub employee_ids: Vec<String>,
    pub hub_ids: Vec<String>,
    pub edges: Vec<Edge>,
}

impl FraudRing {
    pub fn is_empty(&self) -> bool {
        self.employee_ids.is_empty()
    }
}

/// Employees whose risk tier is at or above `min_tier`, sorted by id.
pub fn seeds_at_or_above(
    risk_scores: &HashMap<String, RiskScore>,
    min_tier: RiskTier,
) -> Vec<String> {
    let mut seeds: Vec<String> = risk_scores
        .values()
        .filter(|score| score.tier >= min_tier)
        .map(|score| score.employee_id.clone())
        .collect();
    seeds.sort();
    seeds
}

/// Extract the minimal connected subgraph implicating the seed employees.
///
/// Breadth-first traversal from every seed simultaneously, stepping only
/// through hub nodes: a bank account or device shared by more than one
/// employee. Low-degree incidental nodes and departments are never
/// traversed, so the ring cannot absorb the whole employee graph. BFS
/// reachability is order-independent; output lists are sorted by id so
/// results are reproducible. An empty seed set yields an empty ring.
pub fn extract(graph: &BatchGraph, seeds: &[String]) -> FraudRing {
    let mut employees: HashSet<String> = HashSet::new();
    let mut hubs: HashSet<String> = HashSet::new();
    let mut queue: VecDeque<String> = VecDeque::new();

    for seed in seeds {
        let is_employee = graph
            .nodes
            .get(seed)
            .map(|n| n.kind == NodeKind::Employee)
            .unwrap_or(false);
        if is_employee && employees.insert(seed.clone()) {
            queue.push_back(seed.clone());
        }
    }

    while let Some(employee_id) = queue.pop_front() {
        for neighbor in graph.neighbors(&employee_id) {
            if !graph.is_hub(neighbor) || !hubs.insert(neighbor.clone()) {
                continue;
            }
            for member in graph.hub_members(neighbor) {
                if employees.insert(member.clone()) {
                    queue.push_back(member.clone());
                }
            }
        }
    }

    // Induced edge set: every batch edge whose endpoints both landed in
    // the ring.
    let mut edges: Vec<Edge> = graph
        .edges
        .iter()
        .filter(|e| employees.contains(&e.source) && hubs.contains(&e.target))
        .cloned()
        .collect();
    edges.sort_by(|a, b| a.source.cmp(&b.source).then_with(|| a.target.cmp(&b.target)));

    let mut employee_ids: Vec<String> = employees.into_iter().collect();
    employee_ids.sort();
    let mut hub_ids: Vec<String> = hubs.into_iter().collect();
    hub_ids.sort();

    let mut seed_ids = seeds.to_vec();
    seed_ids.sort();
    seed_ids.dedup();

    FraudRing {
        seed_ids,
        employee_ids,
        hub_ids,
        edges,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::builder::{self, tests::employee};
    use crate::graph::types::account_node_id;

    fn three_on_one_account() -> BatchGraph {
        builder::build(&[
            employee("E1", "G1", 30000.0, "ACC1", None),
            employee("E2", "G1", 31000.0, "ACC1", None),
            employee("E3", "G1", 95000.0, "ACC1", None),
            employee("E4", "G1", 29000.0, "ACC2", None),
        ])
    }

    #[test]
    fn test_empty_seed_set_yields_empty_ring() {
        let graph = three_on_one_account();
        let ring = extract(&graph, &[]);
        assert!(ring.is_empty());
        assert!(ring.hub_ids.is_empty());
        assert!(ring.edges.is_empty());
    }

    #[test]
    fn test_shared_account_pulls_in_all_depositors() {
        let graph = three_on_one_account();
        let ring = extract(&graph, &["E3".to_string()]);
        assert_eq!(ring.employee_ids, vec!["E1", "E2", "E3"]);
        assert_eq!(ring.hub_ids, vec![account_node_id("ACC1")]);
        assert_eq!(ring.edges.len(), 3);
    }

    #[test]
    fn test_singleton_account_is_not_traversed() {
        let graph = three_on_one_account();
        let ring = extract(&graph, &["E4".to_string()]);
        // E4 banks alone; the ring is just the seed with no hubs.
        assert_eq!(ring.employee_ids, vec!["E4"]);
        assert!(ring.hub_ids.is_empty());
    }

    #[test]
    fn test_department_never_bridges() {
        // All four share one department; only the account may connect them.
        let graph = three_on_one_account();
        let ring = extract(&graph, &["E4".to_string()]);
        assert!(!ring.employee_ids.contains(&"E1".to_string()));
    }

    #[test]
    fn test_transitive_hub_chain() {
        // E1-E2 share an account, E2-E3 share a device: one connected ring.
        let graph = builder::build(&[
            employee("E1", "G1", 30000.0, "ACC1", None),
            employee("E2", "G1", 31000.0, "ACC1", Some("DEV1")),
            employee("E3", "G1", 29000.0, "ACC2", Some("DEV1")),
        ]);
        let ring = extract(&graph, &["E1".to_string()]);
        assert_eq!(ring.employee_ids, vec!["E1", "E2", "E3"]);
        assert_eq!(ring.hub_ids.len(), 2);
    }

    #[test]
    fn test_idempotent() {
        let graph = three_on_one_account();
        let seeds = vec!["E3".to_string()];
        let first = extract(&graph, &seeds);
        let second = extract(&graph, &seeds);
        assert_eq!(first.employee_ids, second.employee_ids);
        assert_eq!(first.hub_ids, second.hub_ids);
        assert_eq!(first.edges.len(), second.edges.len());
    }

    #[test]
    fn test_monotone_in_seed_set() {
        let graph = three_on_one_account();
        let small = extract(&graph, &["E3".to_string()]);
        let large = extract(&graph, &["E3".to_string(), "E4".to_string()]);
        for id in &small.employee_ids {
            assert!(large.employee_ids.contains(id));
        }
        for id in &small.hub_ids {
            assert!(large.hub_ids.contains(id));
        }
    }

    #[test]
    fn test_unknown_seed_is_ignored() {
        let graph = three_on_one_account();
        let ring = extract(&graph, &["GHOST".to_string()]);
        assert!(ring.is_empty());
    }
}
