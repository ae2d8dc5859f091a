pub mod loader;
pub mod normalizer;
pub mod types;
