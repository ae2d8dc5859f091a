use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use ghostwatch_engine::api::{self, AppState};
use ghostwatch_engine::config::Config;
use ghostwatch_engine::ingest::loader;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    color_eyre::install()?;

    // Initialize structured logging (set RUST_LOG=info for output)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    tracing::info!("GhostWatch Engine starting");

    // Load configuration; invalid weights or thresholds are fatal here,
    // never silently defaulted mid-run.
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());
    let config = match std::fs::metadata(&config_path) {
        Ok(_) => Config::load(&config_path)?,
        Err(_) => {
            tracing::info!("No config file at '{}', using defaults", config_path);
            let config = Config::default();
            config.validate()?;
            config
        }
    };
    tracing::info!(
        stations = config.sentinel.stations.len(),
        "Configuration loaded"
    );

    let state = Arc::new(AppState::new(config.clone()));

    // Audit the configured dataset up front so the dashboard has a batch
    // to read before the first upload arrives.
    if let Some(path) = &config.ingest.dataset_path {
        match loader::read_csv_rows(path) {
            Ok(rows) => {
                let attempts = state.attempts.read().await.clone();
                let audit = state.engine.run_batch(&rows, &attempts);
                tracing::info!(
                    records = audit.summary.records_loaded,
                    total_flags = audit.summary.total_flags,
                    "Initial batch audited"
                );
                *state.audit.write().await = Some(Arc::new(audit));
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load configured dataset, continuing without");
            }
        }
    }

    if config.api.enabled {
        api::serve(state, &config.api.host, config.api.port).await?;
    } else {
        tracing::info!("API disabled; nothing to serve. Press Ctrl+C to stop.");
        tokio::signal::ctrl_c().await?;
    }

    tracing::info!("GhostWatch Engine stopped gracefully");
    Ok(())
}
