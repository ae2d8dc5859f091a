use std::str::FromStr;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;

use crate::anomaly::types::{RiskScore, RiskTier};
use crate::ingest::loader;
use crate::ingest::types::RawRow;
use crate::sentinel::types::{CheckIn, LivenessEvidence};

use super::types::*;
use super::AppState;

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ErrorResponse>)>;

fn api_error(status: StatusCode, msg: impl Into<String>) -> (StatusCode, Json<ErrorResponse>) {
    (
        status,
        Json(ErrorResponse { error: msg.into() }),
    )
}

fn no_batch() -> (StatusCode, Json<ErrorResponse>) {
    api_error(StatusCode::NOT_FOUND, "No completed audit batch")
}

// ============================================================
// Health
// ============================================================

pub async fn health(State(state): State<Arc<AppState>>) -> ApiResult<HealthResponse> {
    let audit = state.audit.read().await;
    let attempts = state.attempts.read().await;
    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        batch_loaded: audit.is_some(),
        records_loaded: audit
            .as_ref()
            .map(|a| a.summary.records_loaded)
            .unwrap_or(0),
        verification_attempts: attempts.len(),
    }))
}

// ============================================================
// Audit
// ============================================================

/// Run a full audit over the posted rows. The completed audit replaces
/// the current snapshot atomically.
pub async fn run_audit(
    State(state): State<Arc<AppState>>,
    Json(rows): Json<Vec<RawRow>>,
) -> ApiResult<AuditRunResponse> {
    audit_rows(&state, &rows).await
}

/// Re-audit the dataset configured under `[ingest]`.
pub async fn run_dataset_audit(
    State(state): State<Arc<AppState>>,
) -> ApiResult<AuditRunResponse> {
    let path = state.config.ingest.dataset_path.as_ref().ok_or_else(|| {
        api_error(
            StatusCode::BAD_REQUEST,
            "No ingest.dataset_path configured",
        )
    })?;
    let rows = loader::read_csv_rows(path)
        .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    audit_rows(&state, &rows).await
}

async fn audit_rows(state: &AppState, rows: &[RawRow]) -> ApiResult<AuditRunResponse> {
    let attempts = state.attempts.read().await.clone();
    let audit = Arc::new(state.engine.run_batch(rows, &attempts));

    let response = AuditRunResponse {
        status: "success".to_string(),
        audited_at: audit.audited_at,
        summary: audit.summary.clone(),
        rejections: audit.rejections.clone(),
    };

    *state.audit.write().await = Some(audit);
    Ok(Json(response))
}

pub async fn summary(State(state): State<Arc<AppState>>) -> ApiResult<SummaryResponse> {
    let audit = state.audit.read().await.clone().ok_or_else(no_batch)?;
    Ok(Json(SummaryResponse {
        audited_at: audit.audited_at,
        summary: audit.summary.clone(),
        graph: audit.graph.stats(),
    }))
}

pub async fn risk_by_employee(
    State(state): State<Arc<AppState>>,
    Path(employee_id): Path<String>,
) -> ApiResult<RiskScore> {
    let audit = state.audit.read().await.clone().ok_or_else(no_batch)?;
    audit
        .risk_for(&employee_id)
        .cloned()
        .map(Json)
        .ok_or_else(|| {
            api_error(
                StatusCode::NOT_FOUND,
                format!("No risk score for employee '{}'", employee_id),
            )
        })
}

// ============================================================
// Graph & rings
// ============================================================

pub async fn full_graph(State(state): State<Arc<AppState>>) -> ApiResult<GraphExport> {
    let audit = state.audit.read().await.clone().ok_or_else(no_batch)?;
    Ok(Json(GraphExport::from_graph(
        &audit.graph,
        &audit.risk_scores,
    )))
}

pub async fn rings(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RingParams>,
) -> ApiResult<RingResponse> {
    let min_tier = match params.min_tier {
        Some(raw) => RiskTier::from_str(&raw)
            .map_err(|e| api_error(StatusCode::BAD_REQUEST, e))?,
        None => RiskTier::High,
    };

    let audit = state.audit.read().await.clone().ok_or_else(no_batch)?;
    let ring = audit.ring_at_tier(min_tier);
    let graph = GraphExport::from_ring(&ring, &audit);
    Ok(Json(RingResponse {
        min_tier: min_tier.as_str(),
        seed_ids: ring.seed_ids,
        employee_ids: ring.employee_ids,
        hub_ids: ring.hub_ids,
        graph,
    }))
}

pub async fn shared_devices(
    State(state): State<Arc<AppState>>,
) -> ApiResult<SharedDevicesResponse> {
    let audit = state.audit.read().await.clone().ok_or_else(no_batch)?;
    let devices = audit.graph.shared_devices();
    let total = devices.len();
    Ok(Json(SharedDevicesResponse { devices, total }))
}

// ============================================================
// Verification
// ============================================================

/// Verify one check-in attempt and record it as the employee's latest.
/// Attempts are independent per employee; the next audit run folds the
/// latest one into the risk score.
pub async fn verify(
    State(state): State<Arc<AppState>>,
    Json(request): Json<VerifyRequest>,
) -> ApiResult<VerifyResponse> {
    let station_name = request
        .station
        .as_deref()
        .unwrap_or(&state.config.sentinel.default_station);
    let station = state.config.station(station_name).ok_or_else(|| {
        api_error(
            StatusCode::BAD_REQUEST,
            format!("Unknown duty station '{}'", station_name),
        )
    })?;

    let check_in = CheckIn {
        employee_id: request.employee_id.clone(),
        lat: request.lat,
        lon: request.lon,
        evidence: LivenessEvidence {
            moire_energy: request.moire_energy,
            challenge_passed: request.challenge_passed,
        },
    };
    let attempt = state.sentinel.verify(&check_in, station);

    let response = VerifyResponse {
        employee_id: attempt.employee_id.clone(),
        status: attempt.verdict.as_str(),
        trust_score: attempt.trust_score,
        distance_from_station_km: attempt.distance_km,
        liveness_verified: attempt.liveness_verified,
        registered_station: attempt.registered_station.clone(),
    };

    state
        .attempts
        .write()
        .await
        .insert(attempt.employee_id.clone(), attempt);
    Ok(Json(response))
}
