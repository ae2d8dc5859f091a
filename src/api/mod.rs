pub mod handlers;
pub mod types;

use std::collections::HashMap;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::pipeline::{AuditEngine, BatchAudit};
use crate::sentinel::machine::Sentinel;
use crate::sentinel::types::VerificationAttempt;

pub struct AppState {
    pub config: Config,
    pub engine: AuditEngine,
    pub sentinel: Sentinel,
    /// The last completed batch. Replaced whole, never mutated, so any
    /// number of readers can hold the previous snapshot while a new
    /// batch is being audited.
    pub audit: RwLock<Option<Arc<BatchAudit>>>,
    /// Latest verification attempt per employee.
    pub attempts: RwLock<HashMap<String, VerificationAttempt>>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let engine = AuditEngine::new(config.scoring.clone());
        let sentinel = Sentinel::new(config.sentinel.clone());
        Self {
            config,
            engine,
            sentinel,
            audit: RwLock::new(None),
            attempts: RwLock::new(HashMap::new()),
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/v1/health", get(handlers::health))
        .route("/api/v1/audit/run", post(handlers::run_audit))
        .route("/api/v1/audit/run-dataset", post(handlers::run_dataset_audit))
        .route("/api/v1/audit/summary", get(handlers::summary))
        .route("/api/v1/risk/{employee_id}", get(handlers::risk_by_employee))
        .route("/api/v1/graph", get(handlers::full_graph))
        .route("/api/v1/rings", get(handlers::rings))
        .route("/api/v1/devices/shared", get(handlers::shared_devices))
        .route("/api/v1/verify", post(handlers::verify))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

pub async fn serve(state: Arc<AppState>, host: &str, port: u16) -> eyre::Result<()> {
    let app = router(state);
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "API server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;
    Ok(())
}
