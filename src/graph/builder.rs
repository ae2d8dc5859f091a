use crate::ingest::types::Employee;

use super::types::{
    account_node_id, department_node_id, device_node_id, BatchGraph, EdgeKind, NodeKind,
};

/// Build the entity graph for one batch in a single pass over the
/// normalized employees. Cannot fail: an unknown account or device simply
/// creates a fresh singleton node. Every edge endpoint exists as a node.
pub fn build(employees: &[Employee]) -> BatchGraph {
    let mut graph = BatchGraph::default();

    for employee in employees {
        graph.add_node(
            employee.id.clone(),
            NodeKind::Employee,
            employee.name.clone(),
        );

        let dept_id = department_node_id(&employee.department_id);
        graph.add_node(
            dept_id.clone(),
            NodeKind::Department,
            employee.department_id.clone(),
        );
        graph.add_edge(employee.id.clone(), dept_id, EdgeKind::WorksAt);

        let account_id = account_node_id(&employee.bank_account_id);
        graph.add_node(
            account_id.clone(),
            NodeKind::BankAccount,
            mask_account(&employee.bank_account_id),
        );
        graph.add_edge(employee.id.clone(), account_id.clone(), EdgeKind::DepositsTo);
        // Guard against duplicate rows for the same employee id: the
        // reverse index counts distinct employees, not rows.
        let depositors = graph.depositors_by_account.entry(account_id).or_default();
        if !depositors.contains(&employee.id) {
            depositors.push(employee.id.clone());
        }

        if let Some(device) = &employee.device_id {
            let device_id = device_node_id(device);
            graph.add_node(device_id.clone(), NodeKind::Device, device.clone());
            graph.add_edge(employee.id.clone(), device_id.clone(), EdgeKind::UsesDevice);
            let users = graph.users_by_device.entry(device_id).or_default();
            if !users.contains(&employee.id) {
                users.push(employee.id.clone());
            }
        }
    }

    let stats = graph.stats();
    tracing::info!(
        nodes = stats.nodes,
        edges = stats.edges,
        employees = stats.employees,
        bank_accounts = stats.bank_accounts,
        devices = stats.devices,
        "Batch graph built"
    );
    graph
}

/// Display label showing only the tail of the account number.
fn mask_account(account_id: &str) -> String {
    let tail: String = account_id
        .chars()
        .rev()
        .take(4)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    format!("****{}", tail)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn employee(
        id: &str,
        job_group: &str,
        salary: f64,
        account: &str,
        device: Option<&str>,
    ) -> Employee {
        Employee {
            id: id.to_string(),
            name: format!("Employee {}", id),
            national_id: format!("NID-{}", id),
            job_group: job_group.to_string(),
            department_id: "Health".to_string(),
            gross_salary: salary,
            bank_account_id: account.to_string(),
            device_id: device.map(str::to_string),
        }
    }

    #[test]
    fn test_single_pass_build() {
        let employees = vec![
            employee("E1", "G1", 30000.0, "ACC1", Some("DEV1")),
            employee("E2", "G1", 31000.0, "ACC1", None),
        ];
        let graph = build(&employees);

        let stats = graph.stats();
        assert_eq!(stats.employees, 2);
        assert_eq!(stats.bank_accounts, 1);
        assert_eq!(stats.devices, 1);
        assert_eq!(stats.departments, 1);
        // WORKS_AT + DEPOSITS_TO per employee, one USES_DEVICE.
        assert_eq!(stats.edges, 5);
    }

    #[test]
    fn test_every_edge_endpoint_is_a_node() {
        let employees = vec![
            employee("E1", "G1", 30000.0, "ACC1", Some("DEV1")),
            employee("E2", "G2", 31000.0, "ACC2", Some("DEV1")),
        ];
        let graph = build(&employees);
        for edge in &graph.edges {
            assert!(graph.nodes.contains_key(&edge.source));
            assert!(graph.nodes.contains_key(&edge.target));
        }
    }

    #[test]
    fn test_reverse_indices() {
        let employees = vec![
            employee("E1", "G1", 30000.0, "ACC1", Some("DEV1")),
            employee("E2", "G1", 31000.0, "ACC1", Some("DEV1")),
            employee("E3", "G1", 29000.0, "ACC2", None),
        ];
        let graph = build(&employees);

        assert_eq!(graph.shared_account_peers("ACC1"), 1);
        assert_eq!(graph.shared_account_peers("ACC2"), 0);
        assert_eq!(graph.shared_account_peers("UNKNOWN"), 0);

        let shared = graph.shared_devices();
        assert_eq!(shared.len(), 1);
        assert_eq!(shared[0].device_id, "DEV1");
        assert_eq!(shared[0].employee_ids, vec!["E1", "E2"]);
    }

    #[test]
    fn test_hub_detection() {
        let employees = vec![
            employee("E1", "G1", 30000.0, "ACC1", None),
            employee("E2", "G1", 31000.0, "ACC1", None),
            employee("E3", "G1", 29000.0, "ACC2", None),
        ];
        let graph = build(&employees);
        assert!(graph.is_hub(&account_node_id("ACC1")));
        assert!(!graph.is_hub(&account_node_id("ACC2")));
        // Departments are shared by everyone but never count as hubs.
        assert!(!graph.is_hub(&department_node_id("Health")));
    }
}
