use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Employee,
    BankAccount,
    Device,
    Department,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Employee => "employee",
            Self::BankAccount => "bank_account",
            Self::Device => "device",
            Self::Department => "department",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum EdgeKind {
    DepositsTo,
    UsesDevice,
    WorksAt,
}

impl EdgeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DepositsTo => "DEPOSITS_TO",
            Self::UsesDevice => "USES_DEVICE",
            Self::WorksAt => "WORKS_AT",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Node {
    pub id: String,
    pub kind: NodeKind,
    pub label: String,
}

/// Edges carry a semantic direction (employee → target) for display, but
/// traversal treats the graph as undirected.
#[derive(Debug, Clone, Serialize)]
pub struct Edge {
    pub source: String,
    pub target: String,
    pub kind: EdgeKind,
}

/// Namespaced node ids so employee ids can never collide with account or
/// device identifiers.
pub fn account_node_id(account_id: &str) -> String {
    format!("account:{}", account_id)
}

pub fn device_node_id(device_id: &str) -> String {
    format!("device:{}", device_id)
}

pub fn department_node_id(name: &str) -> String {
    format!("dept:{}", name)
}

/// The entity graph for one payroll batch. Owned exclusively by the batch
/// that derived it; read-only once built.
#[derive(Debug, Default)]
pub struct BatchGraph {
    pub nodes: BTreeMap<String, Node>,
    pub edges: Vec<Edge>,
    /// Reverse index: bank account node id → depositing employee ids.
    pub depositors_by_account: HashMap<String, Vec<String>>,
    /// Reverse index: device node id → employee ids checking in with it.
    pub users_by_device: HashMap<String, Vec<String>>,
    adjacency: HashMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GraphStats {
    pub nodes: usize,
    pub edges: usize,
    pub employees: usize,
    pub bank_accounts: usize,
    pub devices: usize,
    pub departments: usize,
}

/// A device used by more than one employee for check-ins.
#[derive(Debug, Clone, Serialize)]
pub struct SharedDevice {
    pub device_id: String,
    pub share_count: usize,
    pub employee_ids: Vec<String>,
}

impl BatchGraph {
    pub(crate) fn add_node(&mut self, id: String, kind: NodeKind, label: String) {
        self.nodes
            .entry(id.clone())
            .or_insert_with(|| Node { id, kind, label });
    }

    pub(crate) fn add_edge(&mut self, source: String, target: String, kind: EdgeKind) {
        self.adjacency
            .entry(source.clone())
            .or_default()
            .push(target.clone());
        self.adjacency
            .entry(target.clone())
            .or_default()
            .push(source.clone());
        self.edges.push(Edge {
            source,
            target,
            kind,
        });
    }

    /// Undirected neighbors of a node.
    pub fn neighbors(&self, id: &str) -> &[String] {
        self.adjacency.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// A hub is a bank account or device shared by more than one employee.
    /// Departments never act as hubs; nearly everyone shares one.
    pub fn is_hub(&self, id: &str) -> bool {
        self.depositors_by_account
            .get(id)
            .map(|d| d.len() > 1)
            .unwrap_or(false)
            || self
                .users_by_device
                .get(id)
                .map(|u| u.len() > 1)
                .unwrap_or(false)
    }

    /// Employees on the same hub, in insertion order.
    pub fn hub_members(&self, id: &str) -> &[String] {
        if let Some(depositors) = self.depositors_by_account.get(id) {
            return depositors;
        }
        self.users_by_device
            .get(id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// How many other employees deposit into the given bank account.
    pub fn shared_account_peers(&self, account_id: &str) -> usize {
        self.depositors_by_account
            .get(&account_node_id(account_id))
            .map(|d| d.len().saturating_sub(1))
            .unwrap_or(0)
    }

    /// Devices with more than one user, sorted by share count descending
    /// then device id for stable output.
    pub fn shared_devices(&self) -> Vec<SharedDevice> {
        let mut shared: Vec<SharedDevice> = self
            .users_by_device
            .iter()
            .filter(|(_, users)| users.len() > 1)
            .map(|(node_id, users)| {
                let mut employee_ids = users.clone();
                employee_ids.sort();
                SharedDevice {
                    device_id: node_id
                        .strip_prefix("device:")
                        .unwrap_or(node_id)
                        .to_string(),
                    share_count: employee_ids.len(),
                    employee_ids,
                }
            })
            .collect();
        shared.sort_by(|a, b| {
            b.share_count
                .cmp(&a.share_count)
                .then_with(|| a.device_id.cmp(&b.device_id))
        });
        shared
    }

    pub fn stats(&self) -> GraphStats {
        let count = |kind: NodeKind| self.nodes.values().filter(|n| n.kind == kind).count();
        GraphStats {
            nodes: self.nodes.len(),
            edges: self.edges.len(),
            employees: count(NodeKind::Employee),
            bank_accounts: count(NodeKind::BankAccount),
            devices: count(NodeKind::Device),
            departments: count(NodeKind::Department),
        }
    }
}
