pub mod aggregator;
pub mod scorer;
pub mod types;
