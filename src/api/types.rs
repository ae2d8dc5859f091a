use serde::{Deserialize, Serialize};

use crate::anomaly::types::RiskScore;
use crate::graph::ring::FraudRing;
use crate::graph::types::{BatchGraph, GraphStats};
use crate::ingest::types::RowRejection;
use crate::pipeline::{AuditSummary, BatchAudit};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

// ============================================================
// Query params
// ============================================================

#[derive(Debug, Deserialize)]
pub struct RingParams {
    /// Minimum risk tier for ring seeds; defaults to HIGH.
    pub min_tier: Option<String>,
}

// ============================================================
// Response types
// ============================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub batch_loaded: bool,
    pub records_loaded: usize,
    pub verification_attempts: usize,
}

#[derive(Debug, Serialize)]
pub struct AuditRunResponse {
    pub status: String,
    pub audited_at: DateTime<Utc>,
    #[serde(flatten)]
    pub summary: AuditSummary,
    pub rejections: Vec<RowRejection>,
}

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub audited_at: DateTime<Utc>,
    #[serde(flatten)]
    pub summary: AuditSummary,
    pub graph: GraphStats,
}

#[derive(Debug, Serialize)]
pub struct SharedDevicesResponse {
    pub devices: Vec<crate::graph::types::SharedDevice>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

// ============================================================
// Graph export (react-force-graph shape)
// ============================================================

#[derive(Debug, Serialize)]
pub struct GraphExport {
    pub nodes: Vec<GraphNodeEntry>,
    pub links: Vec<GraphLinkEntry>,
}

#[derive(Debug, Serialize)]
pub struct GraphNodeEntry {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: &'static str,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_score: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct GraphLinkEntry {
    pub source: String,
    pub target: String,
    #[serde(rename = "type")]
    pub link_type: &'static str,
}

impl GraphExport {
    /// Serialize the full batch graph, annotating employee nodes with
    /// their composite risk score.
    pub fn from_graph(graph: &BatchGraph, risk_scores: &HashMap<String, RiskScore>) -> Self {
        let nodes = graph
            .nodes
            .values()
            .map(|node| GraphNodeEntry {
                id: node.id.clone(),
                node_type: node.kind.as_str(),
                label: node.label.clone(),
                risk_score: risk_scores.get(&node.id).map(|r| r.value),
            })
            .collect();
        let links = graph
            .edges
            .iter()
            .map(|edge| GraphLinkEntry {
                source: edge.source.clone(),
                target: edge.target.clone(),
                link_type: edge.kind.as_str(),
            })
            .collect();
        Self { nodes, links }
    }

    /// Serialize just the ring's induced subgraph.
    pub fn from_ring(ring: &FraudRing, audit: &BatchAudit) -> Self {
        let node_ids = ring.employee_ids.iter().chain(ring.hub_ids.iter());
        let nodes = node_ids
            .filter_map(|id| audit.graph.nodes.get(id))
            .map(|node| GraphNodeEntry {
                id: node.id.clone(),
                node_type: node.kind.as_str(),
                label: node.label.clone(),
                risk_score: audit.risk_scores.get(&node.id).map(|r| r.value),
            })
            .collect();
        let links = ring
            .edges
            .iter()
            .map(|edge| GraphLinkEntry {
                source: edge.source.clone(),
                target: edge.target.clone(),
                link_type: edge.kind.as_str(),
            })
            .collect();
        Self { nodes, links }
    }
}

#[derive(Debug, Serialize)]
pub struct RingResponse {
    pub min_tier: &'static str,
    pub seed_ids: Vec<String>,
    pub employee_ids: Vec<String>,
    pub hub_ids: Vec<String>,
    pub graph: GraphExport,
}

// ============================================================
// Verification endpoint
// ============================================================

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub employee_id: String,
    pub lat: f64,
    pub lon: f64,
    /// High-frequency FFT energy extracted from the camera frame by the
    /// mobile collaborator.
    pub moire_energy: f64,
    #[serde(default)]
    pub challenge_passed: Option<bool>,
    /// Station override; the configured default station is used when
    /// absent.
    #[serde(default)]
    pub station: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub employee_id: String,
    pub status: &'static str,
    pub trust_score: f64,
    pub distance_from_station_km: f64,
    pub liveness_verified: bool,
    pub registered_station: String,
}
