pub mod anomaly;
pub mod api;
pub mod config;
pub mod graph;
pub mod ingest;
pub mod pipeline;
pub mod sentinel;
