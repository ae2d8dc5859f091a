pub mod geo;
pub mod machine;
pub mod types;
